use indexmap::IndexMap;

use arch::num::{parse_int, sign_extend};

use crate::error::AsmError;
use crate::segment::SegKind;

#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    pub addr: u32,
    pub seg: SegKind,
    pub line: usize,
}

/// Label name to absolute address, insertion-ordered. TEXT and DATA labels
/// share this one namespace; a second definition of a name is an error no
/// matter which segment it lives in. Built during pass 1, read-only in
/// pass 2.
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    map: IndexMap<String, Symbol>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: &str,
        addr: u32,
        seg: SegKind,
        line: usize,
    ) -> Result<(), AsmError> {
        if let Some(prev) = self.map.get(name) {
            return Err(AsmError::DuplicateLabel(name.to_string(), prev.line));
        }
        self.map.insert(name.to_string(), Symbol { addr, seg, line });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).map(|sym| sym.addr)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolve an instruction operand to an integer. Literal parsing wins
    /// over label lookup; `%hi`/`%lo` accept labels only. With `relative`
    /// the result is an offset from `pc` (a literal is taken as an absolute
    /// target address).
    pub fn resolve(&self, operand: &str, pc: u32, relative: bool) -> Result<i64, AsmError> {
        let operand = operand.trim();

        if let Some(inner) = reloc_arg(operand, "%hi(") {
            let addr = self.lookup(inner)?;
            return Ok((addr + 0x800) >> 12);
        }
        if let Some(inner) = reloc_arg(operand, "%lo(") {
            let addr = self.lookup(inner)?;
            return Ok(sign_extend(addr & 0xFFF, 12));
        }

        if let Ok(value) = parse_int(operand) {
            return Ok(if relative { value - i64::from(pc) } else { value });
        }

        match self.get(operand) {
            Some(addr) => {
                let value = i64::from(addr);
                Ok(if relative { value - i64::from(pc) } else { value })
            }
            None => Err(AsmError::UndefinedSymbol(operand.to_string())),
        }
    }

    fn lookup(&self, name: &str) -> Result<i64, AsmError> {
        self.get(name)
            .map(i64::from)
            .ok_or_else(|| AsmError::UndefinedSymbol(name.to_string()))
    }
}

fn reloc_arg<'a>(operand: &'a str, prefix: &str) -> Option<&'a str> {
    operand.strip_prefix(prefix)?.strip_suffix(')')
}
