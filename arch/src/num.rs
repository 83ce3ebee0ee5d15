use std::num::ParseIntError;

/// Parse an integer literal with an optional sign and `0x`/`0o`/`0b` prefix.
pub fn parse_int(s: &str) -> Result<i64, ParseIntError> {
    let s = s.trim();
    let (neg, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let val = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)?
    } else if let Some(oct) = body.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)?
    } else if let Some(bin) = body.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)?
    } else {
        body.parse::<i64>()?
    };
    Ok(if neg { -val } else { val })
}

/// Sign-extend the low `bits` bits of `v`.
pub fn sign_extend(v: i64, bits: u32) -> i64 {
    let shift = 64 - bits;
    (v << shift) >> shift
}
