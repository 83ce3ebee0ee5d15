use thiserror::Error;

/// Coarse classification used by the reporting layer and by tests; each
/// `AsmError` variant belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Range,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    // ---- syntax ----
    #[error("invalid characters in line: `{0}`")]
    InvalidChars(String),

    #[error("multiple consecutive spaces are not allowed")]
    DoubleSpace,

    #[error("multiple consecutive commas are not allowed")]
    DoubleComma,

    #[error("invalid mnemonic `{0}`: must start with a letter followed by letters or digits")]
    InvalidMnemonic(String),

    #[error("operand list cannot start or end with a comma")]
    CommaEdge,

    #[error("unbalanced parentheses in operands")]
    Parens,

    #[error("operand {0} `{1}`: {2}")]
    InvalidOperand(usize, String, String),

    #[error("unrecognized directive: `{0}`")]
    UnknownDirective(String),

    // ---- semantic ----
    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),

    #[error("label `{0}` is already defined at line {1}")]
    DuplicateLabel(String, usize),

    #[error("undefined symbol `{0}`")]
    UndefinedSymbol(String),

    #[error("`{0}` expects {1} operands, but {2} were given")]
    OperandCount(String, usize, usize),

    #[error("invalid register `{0}`")]
    InvalidRegister(String),

    #[error("invalid memory operand `{0}`: expected offset(register)")]
    MemOperand(String),

    #[error("directive {0} is only valid in the data segment")]
    DirectiveSegment(&'static str),

    #[error("directive {0} requires at least one value")]
    DirectiveEmpty(&'static str),

    #[error("invalid value for {0}: `{1}`")]
    DirectiveValue(&'static str, String),

    #[error("invalid base address `{0}`")]
    BadBaseAddress(String),

    #[error(".bin only accepts strings of 0s and 1s")]
    BinDigits,

    #[error(".bin requires a multiple of 8 bits, found {0}")]
    BinWidth(usize),

    #[error("{0}")]
    Pseudo(String),

    // ---- range ----
    #[error("value out of range for {0} ({2}): `{1}`")]
    DirectiveRange(&'static str, String, &'static str),

    #[error("immediate {1} out of range for `{0}` ({2})")]
    ImmRange(String, i64, &'static str),

    #[error("branch or jump target {1} out of range or misaligned for `{0}`")]
    BranchRange(String, i64),
}

impl AsmError {
    pub fn kind(&self) -> ErrorKind {
        use AsmError::*;
        match self {
            InvalidChars(_) | DoubleSpace | DoubleComma | InvalidMnemonic(_) | CommaEdge
            | Parens | InvalidOperand(..) | UnknownDirective(_) => ErrorKind::Syntax,
            UnknownMnemonic(_) | DuplicateLabel(..) | UndefinedSymbol(_) | OperandCount(..)
            | InvalidRegister(_) | MemOperand(_) | DirectiveSegment(_) | DirectiveEmpty(_)
            | DirectiveValue(..) | BadBaseAddress(_) | BinDigits | BinWidth(_) | Pseudo(_) => {
                ErrorKind::Semantic
            }
            DirectiveRange(..) | ImmRange(..) | BranchRange(..) => ErrorKind::Range,
        }
    }
}
