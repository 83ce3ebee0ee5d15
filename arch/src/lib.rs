pub mod isa;
pub mod num;
pub mod psudo;
pub mod reg;
