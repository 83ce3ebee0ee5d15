use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// RV32I integer registers. Discriminants are the hardware register
/// numbers, so `x5` and `t0` both parse to the same variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
    Eq,
)]
#[repr(u8)]
pub enum Reg {
    #[default]
    #[strum(to_string = "zero", serialize = "x0")]
    Zero,
    #[strum(to_string = "ra", serialize = "x1")]
    Ra,
    #[strum(to_string = "sp", serialize = "x2")]
    Sp,
    #[strum(to_string = "gp", serialize = "x3")]
    Gp,
    #[strum(to_string = "tp", serialize = "x4")]
    Tp,
    #[strum(to_string = "t0", serialize = "x5")]
    T0,
    #[strum(to_string = "t1", serialize = "x6")]
    T1,
    #[strum(to_string = "t2", serialize = "x7")]
    T2,
    #[strum(to_string = "s0", serialize = "fp", serialize = "x8")]
    S0,
    #[strum(to_string = "s1", serialize = "x9")]
    S1,
    #[strum(to_string = "a0", serialize = "x10")]
    A0,
    #[strum(to_string = "a1", serialize = "x11")]
    A1,
    #[strum(to_string = "a2", serialize = "x12")]
    A2,
    #[strum(to_string = "a3", serialize = "x13")]
    A3,
    #[strum(to_string = "a4", serialize = "x14")]
    A4,
    #[strum(to_string = "a5", serialize = "x15")]
    A5,
    #[strum(to_string = "a6", serialize = "x16")]
    A6,
    #[strum(to_string = "a7", serialize = "x17")]
    A7,
    #[strum(to_string = "s2", serialize = "x18")]
    S2,
    #[strum(to_string = "s3", serialize = "x19")]
    S3,
    #[strum(to_string = "s4", serialize = "x20")]
    S4,
    #[strum(to_string = "s5", serialize = "x21")]
    S5,
    #[strum(to_string = "s6", serialize = "x22")]
    S6,
    #[strum(to_string = "s7", serialize = "x23")]
    S7,
    #[strum(to_string = "s8", serialize = "x24")]
    S8,
    #[strum(to_string = "s9", serialize = "x25")]
    S9,
    #[strum(to_string = "s10", serialize = "x26")]
    S10,
    #[strum(to_string = "s11", serialize = "x27")]
    S11,
    #[strum(to_string = "t3", serialize = "x28")]
    T3,
    #[strum(to_string = "t4", serialize = "x29")]
    T4,
    #[strum(to_string = "t5", serialize = "x30")]
    T5,
    #[strum(to_string = "t6", serialize = "x31")]
    T6,
}

impl Reg {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().parse::<Self>() {
            Ok(r) => Ok(r),
            Err(_) => Err(format!("unknown register name: {s}")),
        }
    }

    pub fn num(self) -> u32 {
        self as u32
    }
}
