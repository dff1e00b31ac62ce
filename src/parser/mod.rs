use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::processor::lexer::InstructionStream;

/// Read a whole source stream and keep only the command bytes.
pub fn load<R: Read>(mut reader: R) -> Result<InstructionStream> {
    let mut src = Vec::new();
    reader
        .read_to_end(&mut src)
        .with_context(|| "Reading source")?;
    Ok(load_from_bytes(&src))
}

pub fn load_from_bytes(src: &[u8]) -> InstructionStream {
    let stream = InstructionStream::filter(src);
    log::info!(
        "source: {} bytes, {} commands kept",
        src.len(),
        stream.len()
    );
    stream
}

/// `None` or `-` means stdin.
pub fn load_path(path: Option<&Path>) -> Result<InstructionStream> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = std::fs::File::open(p).with_context(|| format!("Opening {}", p.display()))?;
            load(file).with_context(|| format!("Reading {}", p.display()))
        }
        _ => load(std::io::stdin().lock()),
    }
}
