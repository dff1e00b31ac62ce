//! The functional core: filtered commands in, basic blocks out.
pub mod error;
pub mod ir;
pub mod lexer;
pub mod loop_stack;
pub mod translator;
pub mod verify;
pub mod vm;

pub use error::TranslateError;
pub use lexer::{Command, InstructionStream};
pub use translator::translate;

use crate::model::{ProgramContainer, TranslateOptions};
use anyhow::Result;

/// Translate and verify; the result is ready for writers.
pub fn run(stream: &InstructionStream, options: &TranslateOptions) -> Result<ProgramContainer> {
    let program = translate(stream, options)?;
    verify::verify(&program)?;

    log::debug!(
        "{} of {} blocks reachable from {}",
        verify::reachable(&program).len(),
        program.blocks.len(),
        program.name
    );
    Ok(program)
}
