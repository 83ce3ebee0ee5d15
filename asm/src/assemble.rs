use arch::psudo;

use crate::encode::encode;
use crate::error::AsmError;
use crate::msg::Diags;
use crate::parser::{self, Line};
use crate::segment::Segments;
use crate::symbol::Symbols;

/// The two output byte streams of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub text: Vec<u8>,
    pub data: Vec<u8>,
}

/// Two-pass orchestrator. Pass 1 sizes every statement and fills the symbol
/// table; if it ends clean, both segments are reset and pass 2 re-tokenizes
/// the same lines, encoding against the now-frozen table. Output is produced
/// only when the cumulative error count over both passes is zero.
pub struct Assembler {
    segs: Segments,
    symbols: Symbols,
    pub diags: Diags,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            segs: Segments::new(),
            symbols: Symbols::new(),
            diags: Diags::new(),
        }
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn assemble(&mut self, lines: &[Line]) -> Option<Output> {
        self.pass1(lines);
        if !self.diags.has_errors() {
            self.segs.reset();
            self.pass2(lines);
        }
        if self.diags.has_errors() {
            return None;
        }
        Some(Output {
            text: self.segs.text_bytes().to_vec(),
            data: self.segs.data_bytes().to_vec(),
        })
    }

    /// Address accounting and symbol collection. No bytes survive this pass.
    fn pass1(&mut self, lines: &[Line]) {
        for line in lines {
            if line.code().is_empty() {
                continue;
            }
            let (label, stmt) = parser::take_label(line.code());
            if let Some(name) = label {
                let addr = self.segs.addr();
                if let Err(err) = self.symbols.insert(name, addr, self.segs.kind(), line.no()) {
                    self.diags.push(line, err);
                }
            }
            if stmt.is_empty() {
                continue;
            }
            if stmt.starts_with('.') {
                if let Err(err) = self.segs.directive(stmt) {
                    self.diags.push(line, err);
                }
                continue;
            }
            // instruction statements only count inside the text segment
            if !self.segs.in_text() {
                continue;
            }
            if let Err(err) = parser::check_syntax(stmt) {
                self.diags.push(line, err);
                continue;
            }
            let (mnem, ops) = parser::split_stmt(stmt);
            match psudo::expand(&mnem, &ops) {
                Ok(insts) => self.segs.advance(4 * insts.len() as u32),
                Err(msg) => self.diags.push(line, AsmError::Pseudo(msg)),
            }
        }
    }

    /// Re-traverse and emit. Labels are already resolved; a failing line
    /// contributes no further bytes but never stops the pass.
    fn pass2(&mut self, lines: &[Line]) {
        for line in lines {
            if line.code().is_empty() {
                continue;
            }
            let (_, stmt) = parser::take_label(line.code());
            if stmt.is_empty() {
                continue;
            }
            if stmt.starts_with('.') {
                if let Err(err) = self.segs.directive(stmt) {
                    self.diags.push(line, err);
                }
                continue;
            }
            if !self.segs.in_text() {
                continue;
            }
            if let Err(err) = parser::check_syntax(stmt) {
                self.diags.push(line, err);
                continue;
            }
            let (mnem, ops) = parser::split_stmt(stmt);
            let insts = match psudo::expand(&mnem, &ops) {
                Ok(insts) => insts,
                Err(msg) => {
                    self.diags.push(line, AsmError::Pseudo(msg));
                    continue;
                }
            };
            // a line's words land in the segment only if every one encodes
            let mut words = Vec::with_capacity(insts.len());
            let mut pc = self.segs.addr();
            for (base_mnem, base_ops) in &insts {
                match encode(base_mnem, base_ops, pc, &self.symbols) {
                    Ok(word) => {
                        words.push(word);
                        pc += 4;
                    }
                    Err(err) => {
                        self.diags.push(line, err);
                        words.clear();
                        break;
                    }
                }
            }
            for word in words {
                self.segs.emit_word(word);
            }
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn lines(src: &str) -> Vec<Line> {
        src.lines().enumerate().map(|(i, raw)| Line::new(i, raw)).collect()
    }

    fn run(src: &str) -> (Option<Output>, Diags) {
        let mut asm = Assembler::new();
        let out = asm.assemble(&lines(src));
        (out, asm.diags)
    }

    fn words(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn small_program_end_to_end() {
        let src = "\
# count down from five
.data
vals: .word 1, 2
.text
main: addi x1, x0, 5
loop: beq x1, x0, done
addi x1, x1, -1
j loop
done: jalr x0, ra, 0\n";
        let (out, diags) = run(src);
        assert!(!diags.has_errors());
        let out = out.unwrap();
        assert_eq!(
            words(&out.text),
            vec![0x00500093, 0x00008663, 0xFFF08093, 0xFF9FF06F, 0x00008067]
        );
        assert_eq!(out.data, [1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn assembly_is_idempotent() {
        let src = "\
.data
table: .word 3, -7
.text
li t0, 0x12345678
li t1, 1
la_loop: lw a0, 0(t0)
bne a0, x0, la_loop
ecall\n";
        let (first, diags) = run(src);
        assert!(!diags.has_errors());
        let (second, _) = run(src);
        assert_eq!(first, second);
    }

    #[test]
    fn li_expansion_is_sized_in_pass1() {
        // the li occupies 8 bytes, so `after` must sit at 12
        let src = "\
li t0, 0x12345678
nop
after: nop\n";
        let mut asm = Assembler::new();
        let out = asm.assemble(&lines(src)).unwrap();
        assert_eq!(asm.symbols().get("after"), Some(12));
        assert_eq!(
            words(&out.text),
            vec![0x123452B7, 0x67828293, 0x00000013, 0x00000013]
        );
    }

    #[test]
    fn duplicate_label_suppresses_output() {
        let src = "foo: add x0, x0, x0\nfoo: nop\n";
        let (out, diags) = run(src);
        assert!(out.is_none());
        assert_eq!(diags.count(), 1);
        let err = diags.iter().next().unwrap().err().clone();
        assert_eq!(err, AsmError::DuplicateLabel("foo".to_string(), 1));
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[test]
    fn labels_on_data_directives() {
        let src = "\
.data
first: .word 1
second: .half 2, 3
.text
lui a0, %hi(second)
addi a0, a0, %lo(second)\n";
        let mut asm = Assembler::new();
        let out = asm.assemble(&lines(src)).unwrap();
        assert_eq!(asm.symbols().get("first"), Some(0x1000_0000));
        assert_eq!(asm.symbols().get("second"), Some(0x1000_0004));
        assert_eq!(out.data, [1, 0, 0, 0, 2, 0, 3, 0]);
        assert_eq!(words(&out.text), vec![0x10000537, 0x00450513]);
    }

    #[test]
    fn word_in_text_segment_is_an_error() {
        let (out, diags) = run(".word 1\n");
        assert!(out.is_none());
        // pass 2 never runs, so the error is reported once
        assert_eq!(diags.count(), 1);
        assert_eq!(
            diags.iter().next().unwrap().err(),
            &AsmError::DirectiveSegment(".word")
        );
    }

    #[test]
    fn undefined_symbol_is_reported_in_pass2() {
        let (out, diags) = run("beq x0, x0, nowhere\n");
        assert!(out.is_none());
        assert_eq!(diags.count(), 1);
        assert_eq!(
            diags.iter().next().unwrap().err(),
            &AsmError::UndefinedSymbol("nowhere".to_string())
        );
    }

    #[test]
    fn errors_do_not_abort_a_pass() {
        let src = "addi x1,, x0\nbad$line\nnop\n";
        let (out, diags) = run(src);
        assert!(out.is_none());
        assert_eq!(diags.count(), 2);
        let kinds: Vec<ErrorKind> = diags.iter().map(|d| d.err().kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::Syntax, ErrorKind::Syntax]);
    }

    #[test]
    fn failing_line_contributes_no_bytes() {
        let src = "nop\nbeq x0, x0, nowhere\nnop\n";
        let mut asm = Assembler::new();
        assert!(asm.assemble(&lines(src)).is_none());
        assert_eq!(asm.diags.count(), 1);
        // only the two surrounding nops reached the segment buffer
        assert_eq!(words(asm.segs.text_bytes()), vec![0x00000013, 0x00000013]);
    }

    #[test]
    fn instructions_in_data_segment_are_skipped() {
        let src = ".data\naddi x1, x0, 5\n.text\nnop\n";
        let (out, diags) = run(src);
        assert!(!diags.has_errors());
        assert_eq!(words(&out.unwrap().text), vec![0x00000013]);
    }

    #[test]
    fn unknown_mnemonic() {
        let (out, diags) = run("mul x1, x2, x3\n");
        assert!(out.is_none());
        assert_eq!(
            diags.iter().next().unwrap().err(),
            &AsmError::UnknownMnemonic("mul".to_string())
        );
    }
}
