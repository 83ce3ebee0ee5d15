use arch::num::parse_int;
use arch::reg::Reg;

use crate::error::AsmError;

// ----------------------------------------------------------------------------
// Line

/// One source line with its comment stripped. Both passes re-tokenize from
/// `code`, so no parse state survives from pass 1 into pass 2.
#[derive(Debug, Clone)]
pub struct Line {
    idx: usize,
    raw: String,
    code: String,
}

impl Line {
    pub fn new(idx: usize, raw: &str) -> Self {
        let code = raw.split('#').next().unwrap_or_default().trim().to_string();
        Self {
            idx,
            raw: raw.to_string(),
            code,
        }
    }

    pub fn no(&self) -> usize {
        self.idx + 1
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

// ----------------------------------------------------------------------------
// Label

/// Split an optional `name:` prefix off a statement.
pub fn take_label(code: &str) -> (Option<&str>, &str) {
    if let Some((head, rest)) = code.split_once(':') {
        if !head.is_empty() && head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return (Some(head), rest.trim_start());
        }
    }
    (None, code)
}

/// Split a statement into a lowercased mnemonic and trimmed operands.
pub fn split_stmt(code: &str) -> (String, Vec<String>) {
    match code.split_once(char::is_whitespace) {
        Some((mnem, rest)) if !rest.trim().is_empty() => (
            mnem.to_ascii_lowercase(),
            rest.split(',').map(|op| op.trim().to_string()).collect(),
        ),
        _ => (code.to_ascii_lowercase(), vec![]),
    }
}

// ----------------------------------------------------------------------------
// Syntax validation

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ",()._-+%:@".contains(c)
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_reloc(s: &str) -> bool {
    s.strip_prefix("%hi(")
        .or_else(|| s.strip_prefix("%lo("))
        .and_then(|rest| rest.strip_suffix(')'))
        .is_some_and(is_ident)
}

/// Validate one instruction line (label and comment already removed).
/// Purely lexical: no symbol or mnemonic lookup happens here.
pub fn check_syntax(code: &str) -> Result<(), AsmError> {
    let mut bad = String::new();
    for c in code.chars() {
        if !is_allowed(c) && !bad.contains(c) {
            bad.push(c);
        }
    }
    if !bad.is_empty() {
        return Err(AsmError::InvalidChars(bad));
    }
    if code.contains("  ") {
        return Err(AsmError::DoubleSpace);
    }
    if code.contains(",,") {
        return Err(AsmError::DoubleComma);
    }

    let (mnem, rest) = match code.split_once(char::is_whitespace) {
        Some((mnem, rest)) => (mnem, rest.trim()),
        None => (code, ""),
    };
    let mut chars = mnem.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic());
    if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(AsmError::InvalidMnemonic(mnem.to_string()));
    }

    if rest.is_empty() {
        return Ok(());
    }
    if rest.starts_with(',') || rest.ends_with(',') {
        return Err(AsmError::CommaEdge);
    }
    if rest.matches('(').count() != rest.matches(')').count() {
        return Err(AsmError::Parens);
    }
    for (i, op) in rest.split(',').enumerate() {
        let op = op.trim();
        if op.is_empty() {
            return Err(AsmError::InvalidOperand(
                i + 1,
                op.to_string(),
                "operand is empty".to_string(),
            ));
        }
        check_operand(op)
            .map_err(|why| AsmError::InvalidOperand(i + 1, op.to_string(), why))?;
    }
    Ok(())
}

/// Accepted operand shapes: `%hi`/`%lo` relocation, register, integer
/// literal, `offset(register)`, or bare identifier.
fn check_operand(op: &str) -> Result<(), String> {
    if is_reloc(op) {
        return Ok(());
    }

    // numeric register names get a dedicated range message, and never fall
    // through to the label shape
    let lower = op.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix('x') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return match digits.parse::<u32>() {
                Ok(n) if n <= 31 => Ok(()),
                _ => Err("register number out of range (0-31)".to_string()),
            };
        }
    }
    if Reg::parse(&lower).is_ok() {
        return Ok(());
    }

    if parse_int(op).is_ok() {
        return Ok(());
    }

    // offset(register) memory operand
    if let Some((offset, rest)) = op.split_once('(') {
        let Some(base) = rest.strip_suffix(')') else {
            return Err("unrecognized operand format".to_string());
        };
        if Reg::parse(base).is_err() {
            return Err(format!("invalid base register `{base}`"));
        }
        if parse_int(offset).is_err() && !is_ident(offset) {
            return Err("offset must be a number or a valid label".to_string());
        }
        return Ok(());
    }

    if is_ident(op) {
        return Ok(());
    }
    Err("unrecognized operand format".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn comments_are_stripped() {
        let line = Line::new(0, "  addi x1, x0, 5  # five");
        assert_eq!(line.code(), "addi x1, x0, 5");
        assert_eq!(line.no(), 1);
        assert_eq!(Line::new(3, "# only a comment").code(), "");
    }

    #[test]
    fn label_extraction() {
        assert_eq!(take_label("main: addi x1, x0, 5"), (Some("main"), "addi x1, x0, 5"));
        assert_eq!(take_label("main:"), (Some("main"), ""));
        assert_eq!(take_label("addi x1, x0, 5"), (None, "addi x1, x0, 5"));
        // a colon without a leading identifier is not a label
        assert_eq!(take_label("add x1 : x2"), (None, "add x1 : x2"));
    }

    #[test]
    fn statement_split_lowercases_mnemonic() {
        let (mnem, ops) = split_stmt("ADDI x1, x0, 5");
        assert_eq!(mnem, "addi");
        assert_eq!(ops, vec!["x1", "x0", "5"]);
        let (mnem, ops) = split_stmt("ecall");
        assert_eq!(mnem, "ecall");
        assert!(ops.is_empty());
    }

    #[test]
    fn valid_lines_pass() {
        for line in [
            "addi x1, x0, -2048",
            "lw t0, 8(sp)",
            "sw t0, -4(s0)",
            "lui a0, %hi(table)",
            "beq x1, x0, done",
            "ecall",
            "slli x1, x2, 0x1F",
            "lw t0, var(sp)",
        ] {
            assert!(check_syntax(line).is_ok(), "{line}");
        }
    }

    #[test]
    fn character_set_is_enforced() {
        let err = check_syntax("addi x1, x0, $5").unwrap_err();
        assert_eq!(err, AsmError::InvalidChars("$".to_string()));
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn spacing_and_commas() {
        assert_eq!(check_syntax("addi x1,  x0, 5").unwrap_err(), AsmError::DoubleSpace);
        assert_eq!(check_syntax("addi x1,, x0").unwrap_err(), AsmError::DoubleComma);
        assert_eq!(check_syntax("addi ,x1, x0, 5").unwrap_err(), AsmError::CommaEdge);
        assert_eq!(check_syntax("addi x1, x0, 5,").unwrap_err(), AsmError::CommaEdge);
    }

    #[test]
    fn mnemonic_shape() {
        assert!(matches!(
            check_syntax("1add x1, x2, x3").unwrap_err(),
            AsmError::InvalidMnemonic(_)
        ));
    }

    #[test]
    fn unbalanced_parens() {
        assert_eq!(check_syntax("lw t0, 8(sp").unwrap_err(), AsmError::Parens);
    }

    #[test]
    fn operand_shapes() {
        // x32 is rejected with a range message even though it could be a label
        assert!(matches!(
            check_syntax("addi x32, x0, 5").unwrap_err(),
            AsmError::InvalidOperand(1, _, _)
        ));
        assert!(matches!(
            check_syntax("lw t0, 8(notareg)").unwrap_err(),
            AsmError::InvalidOperand(2, _, _)
        ));
        assert!(check_syntax("beq x1, x0, some_label").is_ok());
    }
}
