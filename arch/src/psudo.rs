use crate::num::{parse_int, sign_extend};

/// One pseudo instruction expands to an ordered list of base instructions.
pub type Expansion = Vec<(String, Vec<String>)>;

pub fn is_pseudo(mnem: &str) -> bool {
    matches!(
        mnem,
        "nop" | "li" | "mv" | "not" | "neg"
            | "seqz" | "snez" | "sltz" | "sgtz"
            | "beqz" | "bnez" | "bltz" | "bgez" | "blez" | "bgtz"
            | "bgt" | "ble" | "bgtu" | "bleu"
            | "j" | "jal" | "jr" | "jalr" | "ret"
    )
}

fn inst(mnem: &str, ops: &[&str]) -> (String, Vec<String>) {
    (mnem.to_string(), ops.iter().map(|s| s.to_string()).collect())
}

/// Expand a pseudo instruction into base instructions. Mnemonics outside the
/// pseudo set pass through unchanged as a single-element list. The expansion
/// never consults the symbol table: a `li` with an unparseable immediate is
/// rewritten to `auipc %hi` + `addi %lo` and resolved later.
pub fn expand(mnem: &str, ops: &[String]) -> Result<Expansion, String> {
    if !is_pseudo(mnem) {
        return Ok(vec![(mnem.to_string(), ops.to_vec())]);
    }

    let arg = |i: usize| -> Result<&str, String> {
        ops.get(i)
            .map(String::as_str)
            .ok_or_else(|| format!("`{mnem}` is missing operand {}", i + 1))
    };

    match mnem {
        "nop" => Ok(vec![inst("addi", &["x0", "x0", "0"])]),
        "mv" => Ok(vec![inst("addi", &[arg(0)?, arg(1)?, "0"])]),
        "not" => Ok(vec![inst("xori", &[arg(0)?, arg(1)?, "-1"])]),
        "neg" => Ok(vec![inst("sub", &[arg(0)?, "x0", arg(1)?])]),

        "seqz" => Ok(vec![inst("sltiu", &[arg(0)?, arg(1)?, "1"])]),
        "snez" => Ok(vec![inst("sltu", &[arg(0)?, "x0", arg(1)?])]),
        "sltz" => Ok(vec![inst("slt", &[arg(0)?, arg(1)?, "x0"])]),
        "sgtz" => Ok(vec![inst("slt", &[arg(0)?, "x0", arg(1)?])]),

        "beqz" => Ok(vec![inst("beq", &[arg(0)?, "x0", arg(1)?])]),
        "bnez" => Ok(vec![inst("bne", &[arg(0)?, "x0", arg(1)?])]),
        "bltz" => Ok(vec![inst("blt", &[arg(0)?, "x0", arg(1)?])]),
        "bgez" => Ok(vec![inst("bge", &[arg(0)?, "x0", arg(1)?])]),
        // operand order swaps around x0
        "blez" => Ok(vec![inst("bge", &["x0", arg(0)?, arg(1)?])]),
        "bgtz" => Ok(vec![inst("blt", &["x0", arg(0)?, arg(1)?])]),

        // rs/rt swapped onto the reverse comparison
        "bgt" => Ok(vec![inst("blt", &[arg(1)?, arg(0)?, arg(2)?])]),
        "ble" => Ok(vec![inst("bge", &[arg(1)?, arg(0)?, arg(2)?])]),
        "bgtu" => Ok(vec![inst("bltu", &[arg(1)?, arg(0)?, arg(2)?])]),
        "bleu" => Ok(vec![inst("bgeu", &[arg(1)?, arg(0)?, arg(2)?])]),

        "j" => Ok(vec![inst("jal", &["x0", arg(0)?])]),
        "jal" if ops.len() == 1 => Ok(vec![inst("jal", &["ra", arg(0)?])]),
        "jr" => Ok(vec![inst("jalr", &["x0", arg(0)?, "0"])]),
        "jalr" if ops.len() == 1 => Ok(vec![inst("jalr", &["ra", arg(0)?, "0"])]),
        "ret" => Ok(vec![inst("jalr", &["x0", "ra", "0"])]),

        // multi-operand jal/jalr are real instructions
        "jal" | "jalr" => Ok(vec![(mnem.to_string(), ops.to_vec())]),

        "li" => expand_li(arg(0)?, arg(1)?),

        _ => unreachable!("pseudo set and expansion table out of sync"),
    }
}

fn expand_li(rd: &str, imm: &str) -> Result<Expansion, String> {
    if imm.trim().is_empty() {
        return Err("`li` requires an immediate or label".to_string());
    }
    match parse_int(imm) {
        Ok(value) => {
            if !(-0x8000_0000..=0xFFFF_FFFF).contains(&value) {
                return Err(format!("`li` immediate out of 32-bit range: {imm}"));
            }
            // unsigned spellings of negative values fold to their signed form
            let value = if value > 0x7FFF_FFFF {
                value - 0x1_0000_0000
            } else {
                value
            };
            if (-2048..=2047).contains(&value) {
                return Ok(vec![inst("addi", &[rd, "x0", &value.to_string()])]);
            }
            let upper = (value + 0x800) >> 12;
            // low 12 bits as the signed addend that addi will apply
            let lower = sign_extend(value & 0xFFF, 12);
            let mut out = vec![inst("lui", &[rd, &upper.to_string()])];
            if lower != 0 {
                out.push(inst("addi", &[rd, rd, &lower.to_string()]));
            }
            Ok(out)
        }
        Err(_) => Ok(vec![
            inst("auipc", &[rd, &format!("%hi({imm})")]),
            inst("addi", &[rd, rd, &format!("%lo({imm})")]),
        ]),
    }
}
