use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::assemble::Output;

/// Write the hex and bin renditions of both segments next to `base`.
/// Empty segments produce no file. Returns the paths written, in order.
pub fn write(base: &str, out: &Output) -> io::Result<Vec<String>> {
    let mut written = Vec::new();
    if !out.text.is_empty() {
        written.push(write_segment(&format!("{base}.hex"), &out.text, Radix::Hex)?);
        written.push(write_segment(&format!("{base}.bin"), &out.text, Radix::Bin)?);
    }
    if !out.data.is_empty() {
        written.push(write_segment(&format!("{base}_data.hex"), &out.data, Radix::Hex)?);
        written.push(write_segment(&format!("{base}_data.bin"), &out.data, Radix::Bin)?);
    }
    Ok(written)
}

enum Radix {
    Hex,
    Bin,
}

/// One 32-bit word per line, read back out of the little-endian byte
/// stream. A trailing partial word is zero-padded in its high bytes.
fn write_segment(path: &str, bytes: &[u8], radix: Radix) -> io::Result<String> {
    let mut file = BufWriter::new(File::create(path)?);
    for chunk in bytes.chunks(4) {
        let mut quad = [0u8; 4];
        quad[..chunk.len()].copy_from_slice(chunk);
        let word = u32::from_le_bytes(quad);
        match radix {
            Radix::Hex => writeln!(file, "{word:08X}")?,
            Radix::Bin => writeln!(file, "{word:032b}")?,
        }
    }
    file.flush()?;
    Ok(path.to_string())
}
