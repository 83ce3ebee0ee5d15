use color_print::cprintln;

use crate::error::AsmError;
use crate::parser::Line;

/// One reported error, pinned to its source line.
#[derive(Debug, Clone)]
pub struct Diag {
    line_no: usize,
    raw: String,
    err: AsmError,
}

impl Diag {
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn err(&self) -> &AsmError {
        &self.err
    }

    fn print(&self, path: &str) {
        cprintln!("<red,bold>error</>: {}", self.err);
        cprintln!("     <blue>--></> <underline>{}:{}</>", path, self.line_no);
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", self.line_no, self.raw.trim_end());
        cprintln!("      <blue>|</>");
    }
}

/// Error accumulator for a whole assembly run. Errors never abort a pass;
/// they are collected here and gate the final output.
#[derive(Debug, Clone, Default)]
pub struct Diags {
    list: Vec<Diag>,
}

impl Diags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &Line, err: AsmError) {
        self.list.push(Diag {
            line_no: line.no(),
            raw: line.raw().to_string(),
            err,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.list.is_empty()
    }

    pub fn count(&self) -> usize {
        self.list.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diag> {
        self.list.iter()
    }

    pub fn print(&self, path: &str) {
        for diag in &self.list {
            diag.print(path);
        }
    }

    pub fn summary(&self) {
        if self.has_errors() {
            cprintln!("<red,bold>assembly failed with {} error(s)</>", self.count());
        } else {
            cprintln!("<green,bold>assembly completed successfully</>");
        }
    }
}
