use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Instruction formats of the RV32I base set. SYSTEM covers the
/// zero-operand environment instructions (`ecall`/`ebreak`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
    System,
}

#[derive(Debug, Clone, Copy)]
pub struct InstDef {
    pub format: Format,
    pub opcode: u32,
    pub funct3: u32,
    pub funct7: u32,
}

pub const OPC_LOAD: u32 = 0b0000011;

// mnemonic, format, opcode, funct3, funct7
#[rustfmt::skip]
static TABLE: &[(&str, Format, u32, u32, u32)] = &[
    ("add",    Format::R,      0b0110011, 0b000, 0b0000000),
    ("sub",    Format::R,      0b0110011, 0b000, 0b0100000),
    ("sll",    Format::R,      0b0110011, 0b001, 0b0000000),
    ("slt",    Format::R,      0b0110011, 0b010, 0b0000000),
    ("sltu",   Format::R,      0b0110011, 0b011, 0b0000000),
    ("xor",    Format::R,      0b0110011, 0b100, 0b0000000),
    ("srl",    Format::R,      0b0110011, 0b101, 0b0000000),
    ("sra",    Format::R,      0b0110011, 0b101, 0b0100000),
    ("or",     Format::R,      0b0110011, 0b110, 0b0000000),
    ("and",    Format::R,      0b0110011, 0b111, 0b0000000),

    ("addi",   Format::I,      0b0010011, 0b000, 0b0000000),
    ("slli",   Format::I,      0b0010011, 0b001, 0b0000000),
    ("slti",   Format::I,      0b0010011, 0b010, 0b0000000),
    ("sltiu",  Format::I,      0b0010011, 0b011, 0b0000000),
    ("xori",   Format::I,      0b0010011, 0b100, 0b0000000),
    ("srli",   Format::I,      0b0010011, 0b101, 0b0000000),
    ("srai",   Format::I,      0b0010011, 0b101, 0b0100000),
    ("ori",    Format::I,      0b0010011, 0b110, 0b0000000),
    ("andi",   Format::I,      0b0010011, 0b111, 0b0000000),

    ("lb",     Format::I,      OPC_LOAD,  0b000, 0b0000000),
    ("lh",     Format::I,      OPC_LOAD,  0b001, 0b0000000),
    ("lw",     Format::I,      OPC_LOAD,  0b010, 0b0000000),
    ("lbu",    Format::I,      OPC_LOAD,  0b100, 0b0000000),
    ("lhu",    Format::I,      OPC_LOAD,  0b101, 0b0000000),

    ("jalr",   Format::I,      0b1100111, 0b000, 0b0000000),

    ("sb",     Format::S,      0b0100011, 0b000, 0b0000000),
    ("sh",     Format::S,      0b0100011, 0b001, 0b0000000),
    ("sw",     Format::S,      0b0100011, 0b010, 0b0000000),

    ("beq",    Format::B,      0b1100011, 0b000, 0b0000000),
    ("bne",    Format::B,      0b1100011, 0b001, 0b0000000),
    ("blt",    Format::B,      0b1100011, 0b100, 0b0000000),
    ("bge",    Format::B,      0b1100011, 0b101, 0b0000000),
    ("bltu",   Format::B,      0b1100011, 0b110, 0b0000000),
    ("bgeu",   Format::B,      0b1100011, 0b111, 0b0000000),

    ("lui",    Format::U,      0b0110111, 0b000, 0b0000000),
    ("auipc",  Format::U,      0b0010111, 0b000, 0b0000000),

    ("jal",    Format::J,      0b1101111, 0b000, 0b0000000),

    ("ecall",  Format::System, 0b1110011, 0b000, 0b0000000),
    ("ebreak", Format::System, 0b1110011, 0b000, 0b0000000),
];

static INSTS: Lazy<HashMap<&'static str, InstDef>> = Lazy::new(|| {
    TABLE
        .iter()
        .map(|&(mnem, format, opcode, funct3, funct7)| {
            (
                mnem,
                InstDef {
                    format,
                    opcode,
                    funct3,
                    funct7,
                },
            )
        })
        .collect()
});

pub fn lookup(mnem: &str) -> Option<&'static InstDef> {
    INSTS.get(mnem)
}
