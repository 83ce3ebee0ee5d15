use arch::num::parse_int;

use crate::error::AsmError;

pub const TEXT_BASE: u32 = 0x0000_0000;
pub const DATA_BASE: u32 = 0x1000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegKind {
    Text,
    Data,
}

// ----------------------------------------------------------------------------
// Segment

/// One independently addressed region. `advance` is the pass-1 accounting
/// path (addresses only), `emit` the pass-2 path (bytes and address move
/// together, keeping `addr - base == bytes.len()`).
#[derive(Debug, Clone)]
pub struct Segment {
    base: u32,
    addr: u32,
    bytes: Vec<u8>,
}

impl Segment {
    fn new(base: u32) -> Self {
        Self {
            base,
            addr: base,
            bytes: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.addr = self.base;
        self.bytes.clear();
    }

    fn set_base(&mut self, base: u32) {
        self.base = base;
        self.addr = base;
    }

    fn emit(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
        self.addr += bytes.len() as u32;
    }

    fn advance(&mut self, count: u32) {
        self.addr += count;
    }
}

// ----------------------------------------------------------------------------
// Directive & segment manager

#[derive(Debug, Clone)]
pub struct Segments {
    cur: SegKind,
    text: Segment,
    data: Segment,
}

impl Segments {
    pub fn new() -> Self {
        Self {
            cur: SegKind::Text,
            text: Segment::new(TEXT_BASE),
            data: Segment::new(DATA_BASE),
        }
    }

    /// Restore both segments to their base-address, empty-buffer state for
    /// the start of a pass. Overridden bases persist; pass 2 replays the
    /// directives that set them.
    pub fn reset(&mut self) {
        self.cur = SegKind::Text;
        self.text.reset();
        self.data.reset();
    }

    pub fn kind(&self) -> SegKind {
        self.cur
    }

    pub fn in_text(&self) -> bool {
        self.cur == SegKind::Text
    }

    fn active(&mut self) -> &mut Segment {
        match self.cur {
            SegKind::Text => &mut self.text,
            SegKind::Data => &mut self.data,
        }
    }

    /// Current address of the active segment.
    pub fn addr(&self) -> u32 {
        match self.cur {
            SegKind::Text => self.text.addr,
            SegKind::Data => self.data.addr,
        }
    }

    /// Pass-1 size accounting for the active segment.
    pub fn advance(&mut self, count: u32) {
        self.active().advance(count);
    }

    /// Append one encoded instruction word, little-endian.
    pub fn emit_word(&mut self, word: u32) {
        self.active().emit(&word.to_le_bytes());
    }

    pub fn text_bytes(&self) -> &[u8] {
        &self.text.bytes
    }

    pub fn data_bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    /// Interpret a `.`-statement. `code` starts with the directive name;
    /// label and comment are already removed.
    pub fn directive(&mut self, code: &str) -> Result<(), AsmError> {
        let (name, args) = match code.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (code, ""),
        };
        match name {
            ".text" => self.switch(SegKind::Text, args),
            ".data" => self.switch(SegKind::Data, args),
            ".word" => self.data_values(".word", args, 4),
            ".half" => self.data_values(".half", args, 2),
            ".bin" => self.data_bits(args),
            _ => Err(AsmError::UnknownDirective(name.to_string())),
        }
    }

    fn switch(&mut self, kind: SegKind, args: &str) -> Result<(), AsmError> {
        if let Some(arg) = args.split_whitespace().next() {
            let base = match parse_int(arg) {
                Ok(v) if (0..=i64::from(u32::MAX)).contains(&v) => v as u32,
                _ => return Err(AsmError::BadBaseAddress(arg.to_string())),
            };
            match kind {
                SegKind::Text => self.text.set_base(base),
                SegKind::Data => self.data.set_base(base),
            }
        }
        self.cur = kind;
        Ok(())
    }

    fn data_values(&mut self, name: &'static str, args: &str, width: u32) -> Result<(), AsmError> {
        if self.cur != SegKind::Data {
            return Err(AsmError::DirectiveSegment(name));
        }
        if args.is_empty() {
            return Err(AsmError::DirectiveEmpty(name));
        }
        for value in args.split(',') {
            let value = value.trim();
            // fractional literals must not silently truncate
            if value.contains('.') {
                return Err(AsmError::DirectiveValue(name, value.to_string()));
            }
            let num = parse_int(value)
                .map_err(|_| AsmError::DirectiveValue(name, value.to_string()))?;
            match width {
                4 => {
                    if !(i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(&num) {
                        return Err(AsmError::DirectiveRange(name, value.to_string(), "32 bits"));
                    }
                    self.data.emit(&(num as i32).to_le_bytes());
                }
                _ => {
                    if !(i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&num) {
                        return Err(AsmError::DirectiveRange(name, value.to_string(), "16 bits"));
                    }
                    self.data.emit(&(num as i16).to_le_bytes());
                }
            }
        }
        Ok(())
    }

    fn data_bits(&mut self, args: &str) -> Result<(), AsmError> {
        if self.cur != SegKind::Data {
            return Err(AsmError::DirectiveSegment(".bin"));
        }
        if args.is_empty() {
            return Err(AsmError::DirectiveEmpty(".bin"));
        }
        let bits = args
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| args.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
            .unwrap_or(args);
        if !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(AsmError::BinDigits);
        }
        if bits.is_empty() || bits.len() % 8 != 0 {
            return Err(AsmError::BinWidth(bits.len()));
        }
        for group in bits.as_bytes().chunks(8) {
            // most significant bit first
            let byte = group.iter().fold(0u8, |acc, b| (acc << 1) | (b - b'0'));
            self.data.emit(&[byte]);
        }
        Ok(())
    }
}

impl Default for Segments {
    fn default() -> Self {
        Self::new()
    }
}
