use arch::isa::{self, Format, InstDef};
use arch::reg::Reg;

use crate::error::AsmError;
use crate::symbol::Symbols;

/// Encode one base instruction into its 32-bit word. `pc` is the address
/// of the instruction itself, used for B/J relative offsets.
pub fn encode(mnem: &str, ops: &[String], pc: u32, syms: &Symbols) -> Result<u32, AsmError> {
    let def = isa::lookup(mnem).ok_or_else(|| AsmError::UnknownMnemonic(mnem.to_string()))?;
    check_arity(mnem, def, ops)?;
    match def.format {
        Format::R => encode_r(def, ops),
        Format::I => encode_i(mnem, def, ops, pc, syms),
        Format::S => encode_s(mnem, def, ops, pc, syms),
        Format::B => encode_b(mnem, def, ops, pc, syms),
        Format::U => encode_u(mnem, def, ops, pc, syms),
        Format::J => encode_j(mnem, def, ops, pc, syms),
        Format::System => Ok(encode_system(mnem, def)),
    }
}

fn check_arity(mnem: &str, def: &InstDef, ops: &[String]) -> Result<(), AsmError> {
    let expected = match def.format {
        Format::R | Format::B => 3,
        Format::I if def.opcode == isa::OPC_LOAD => 2,
        Format::I => 3,
        Format::S | Format::U | Format::J => 2,
        Format::System => 0,
    };
    if ops.len() != expected {
        return Err(AsmError::OperandCount(mnem.to_string(), expected, ops.len()));
    }
    Ok(())
}

fn reg(op: &str) -> Result<u32, AsmError> {
    Reg::parse(op)
        .map(Reg::num)
        .map_err(|_| AsmError::InvalidRegister(op.to_string()))
}

/// Split an `offset(register)` memory operand.
fn mem_operand(op: &str) -> Result<(&str, &str), AsmError> {
    let err = || AsmError::MemOperand(op.to_string());
    let (offset, rest) = op.split_once('(').ok_or_else(err)?;
    let base = rest.strip_suffix(')').ok_or_else(err)?;
    if offset.is_empty() || base.is_empty() {
        return Err(err());
    }
    Ok((offset, base))
}

fn check_imm12(mnem: &str, imm: i64) -> Result<(), AsmError> {
    if (-2048..=2047).contains(&imm) {
        Ok(())
    } else {
        Err(AsmError::ImmRange(mnem.to_string(), imm, "-2048 to 2047"))
    }
}

fn encode_r(def: &InstDef, ops: &[String]) -> Result<u32, AsmError> {
    let rd = reg(&ops[0])?;
    let rs1 = reg(&ops[1])?;
    let rs2 = reg(&ops[2])?;
    Ok(def.funct7 << 25
        | rs2 << 20
        | rs1 << 15
        | def.funct3 << 12
        | rd << 7
        | def.opcode)
}

fn encode_i(
    mnem: &str,
    def: &InstDef,
    ops: &[String],
    pc: u32,
    syms: &Symbols,
) -> Result<u32, AsmError> {
    let rd = reg(&ops[0])?;

    // loads take the rd, offset(rs1) shape
    if def.opcode == isa::OPC_LOAD {
        let (offset, base) = mem_operand(&ops[1])?;
        let rs1 = reg(base)?;
        let imm = syms.resolve(offset, pc, false)?;
        check_imm12(mnem, imm)?;
        return Ok((imm as u32 & 0xFFF) << 20
            | rs1 << 15
            | def.funct3 << 12
            | rd << 7
            | def.opcode);
    }

    let rs1 = reg(&ops[1])?;

    // shift immediates carry funct7 and a 5-bit shamt in the immediate field
    if matches!(mnem, "slli" | "srli" | "srai") {
        let shamt = syms.resolve(&ops[2], pc, false)?;
        if !(0..=31).contains(&shamt) {
            return Err(AsmError::ImmRange(mnem.to_string(), shamt, "0 to 31"));
        }
        return Ok(def.funct7 << 25
            | (shamt as u32) << 20
            | rs1 << 15
            | def.funct3 << 12
            | rd << 7
            | def.opcode);
    }

    let imm = syms.resolve(&ops[2], pc, false)?;
    check_imm12(mnem, imm)?;
    Ok((imm as u32 & 0xFFF) << 20 | rs1 << 15 | def.funct3 << 12 | rd << 7 | def.opcode)
}

fn encode_s(
    mnem: &str,
    def: &InstDef,
    ops: &[String],
    pc: u32,
    syms: &Symbols,
) -> Result<u32, AsmError> {
    let rs2 = reg(&ops[0])?;
    let (offset, base) = mem_operand(&ops[1])?;
    let rs1 = reg(base)?;
    let imm = syms.resolve(offset, pc, false)?;
    check_imm12(mnem, imm)?;
    let imm = imm as u32;
    Ok(((imm >> 5) & 0x7F) << 25
        | rs2 << 20
        | rs1 << 15
        | def.funct3 << 12
        | (imm & 0x1F) << 7
        | def.opcode)
}

fn encode_b(
    mnem: &str,
    def: &InstDef,
    ops: &[String],
    pc: u32,
    syms: &Symbols,
) -> Result<u32, AsmError> {
    let rs1 = reg(&ops[0])?;
    let rs2 = reg(&ops[1])?;
    let offset = syms.resolve(&ops[2], pc, true)?;
    if offset % 2 != 0 || !(-4096..=4094).contains(&offset) {
        return Err(AsmError::BranchRange(mnem.to_string(), offset));
    }
    let imm = offset as u32;
    Ok(((imm >> 12) & 0x1) << 31
        | ((imm >> 5) & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | def.funct3 << 12
        | ((imm >> 1) & 0xF) << 8
        | ((imm >> 11) & 0x1) << 7
        | def.opcode)
}

fn encode_u(
    mnem: &str,
    def: &InstDef,
    ops: &[String],
    pc: u32,
    syms: &Symbols,
) -> Result<u32, AsmError> {
    let rd = reg(&ops[0])?;
    let imm = syms.resolve(&ops[1], pc, false)?;
    // wide enough for both signed immediates and %hi of high addresses
    if !(-524_288..=1_048_575).contains(&imm) {
        return Err(AsmError::ImmRange(mnem.to_string(), imm, "-524288 to 1048575"));
    }
    Ok((imm as u32 & 0xFFFFF) << 12 | rd << 7 | def.opcode)
}

fn encode_j(
    mnem: &str,
    def: &InstDef,
    ops: &[String],
    pc: u32,
    syms: &Symbols,
) -> Result<u32, AsmError> {
    let rd = reg(&ops[0])?;
    let offset = syms.resolve(&ops[1], pc, true)?;
    if offset % 2 != 0 || !(-1_048_576..=1_048_574).contains(&offset) {
        return Err(AsmError::BranchRange(mnem.to_string(), offset));
    }
    let imm = offset as u32;
    Ok(((imm >> 20) & 0x1) << 31
        | ((imm >> 1) & 0x3FF) << 21
        | ((imm >> 11) & 0x1) << 20
        | ((imm >> 12) & 0xFF) << 12
        | rd << 7
        | def.opcode)
}

fn encode_system(mnem: &str, def: &InstDef) -> u32 {
    let imm = u32::from(mnem == "ebreak");
    imm << 20 | def.funct3 << 12 | def.opcode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::segment::SegKind;

    fn ops(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn enc(mnem: &str, list: &[&str]) -> u32 {
        encode(mnem, &ops(list), 0, &Symbols::new()).unwrap()
    }

    #[test]
    fn r_type() {
        assert_eq!(enc("add", &["x1", "x2", "x3"]), 0x003100B3);
        assert_eq!(enc("sub", &["x1", "x2", "x3"]), 0x403100B3);
        assert_eq!(enc("and", &["t0", "t1", "t2"]), 0x007372B3);
    }

    #[test]
    fn i_type_arithmetic() {
        assert_eq!(enc("addi", &["x1", "x0", "5"]), 0x00500093);
        assert_eq!(enc("addi", &["x1", "x1", "-1"]), 0xFFF08093);
        assert_eq!(enc("sltiu", &["x1", "x2", "1"]), 0x00113093);
    }

    #[test]
    fn i_type_range() {
        let err = encode("addi", &ops(&["x1", "x0", "2048"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(encode("addi", &ops(&["x1", "x0", "2047"]), 0, &Symbols::new()).is_ok());
        assert!(encode("addi", &ops(&["x1", "x0", "-2048"]), 0, &Symbols::new()).is_ok());
    }

    #[test]
    fn shift_immediates() {
        assert_eq!(enc("slli", &["x1", "x2", "3"]), 0x00311093);
        assert_eq!(enc("srai", &["x1", "x2", "3"]), 0x40315093);
        assert_eq!(enc("srli", &["x1", "x2", "31"]), 0x01F15093);
        let err = encode("slli", &ops(&["x1", "x2", "32"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn loads_and_stores() {
        assert_eq!(enc("lw", &["t0", "8(x2)"]), 0x00812283);
        assert_eq!(enc("lbu", &["t0", "0(a0)"]), 0x00054283);
        assert_eq!(enc("sw", &["t0", "12(x2)"]), 0x00512623);
        // negative store offset splits across the two immediate fields
        assert_eq!(enc("sw", &["t0", "-4(s0)"]), 0xFE542E23);
    }

    #[test]
    fn load_requires_memory_operand() {
        let err = encode("lw", &ops(&["t0", "8"]), 0, &Symbols::new()).unwrap_err();
        assert!(matches!(err, AsmError::MemOperand(_)));
    }

    #[test]
    fn jalr_uses_its_own_opcode() {
        assert_eq!(enc("jalr", &["x1", "x2", "4"]), 0x004100E7);
        assert_eq!(enc("jalr", &["x0", "ra", "0"]), 0x00008067);
    }

    #[test]
    fn system_instructions() {
        assert_eq!(enc("ecall", &[]), 0x00000073);
        assert_eq!(enc("ebreak", &[]), 0x00100073);
        let err = encode("ecall", &ops(&["x1"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err, AsmError::OperandCount("ecall".to_string(), 0, 1));
    }

    #[test]
    fn b_type_with_label() {
        let mut syms = Symbols::new();
        syms.insert("done", 16, SegKind::Text, 1).unwrap();
        assert_eq!(encode("beq", &ops(&["x1", "x0", "done"]), 4, &syms).unwrap(), 0x00008663);
        // backward branch
        syms.insert("loop", 0, SegKind::Text, 2).unwrap();
        assert_eq!(encode("bne", &ops(&["x1", "x0", "loop"]), 8, &syms).unwrap(), 0xFE009CE3);
    }

    #[test]
    fn b_type_boundaries() {
        let syms = Symbols::new();
        assert!(encode("beq", &ops(&["x0", "x0", "4094"]), 0, &syms).is_ok());
        assert!(encode("beq", &ops(&["x0", "x0", "-4096"]), 0, &syms).is_ok());
        for target in ["4096", "-4098", "3"] {
            let err = encode("beq", &ops(&["x0", "x0", target]), 0, &syms).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range, "{target}");
        }
    }

    #[test]
    fn u_type() {
        assert_eq!(enc("lui", &["x1", "1"]), 0x000010B7);
        assert_eq!(enc("lui", &["t0", "-1"]), 0xFFFFF2B7);
        assert_eq!(enc("auipc", &["x1", "1"]), 0x00001097);
        let err = encode("lui", &ops(&["x1", "1048576"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn j_type() {
        assert_eq!(enc("jal", &["x0", "8"]), 0x0080006F);
        // jal x0, -8 from pc 8 lands on 0
        let syms = Symbols::new();
        assert_eq!(encode("jal", &ops(&["x0", "0"]), 8, &syms).unwrap(), 0xFF9FF06F);
        let err = encode("jal", &ops(&["x0", "3"]), 0, &syms).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(encode("jal", &ops(&["x0", "1048574"]), 0, &syms).is_ok());
        assert!(encode("jal", &ops(&["x0", "-1048576"]), 0, &syms).is_ok());
    }

    #[test]
    fn operand_kinds_are_checked() {
        let err = encode("add", &ops(&["x1", "x2", "7"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err, AsmError::InvalidRegister("7".to_string()));
        let err = encode("add", &ops(&["x1", "x2"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err, AsmError::OperandCount("add".to_string(), 3, 2));
        let err = encode("mul", &ops(&["x1", "x2", "x3"]), 0, &Symbols::new()).unwrap_err();
        assert_eq!(err, AsmError::UnknownMnemonic("mul".to_string()));
    }
}
