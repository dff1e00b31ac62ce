//! Structural errors raised while pairing loop brackets.

use thiserror::Error;

use super::lexer::Token;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unmatched `]` at command {index} (line {line}, column {column})")]
    UnmatchedLoopClose {
        index: usize,
        line: usize,
        column: usize,
    },

    /// Reports the innermost loop left open at end of input.
    #[error("unclosed `[` at command {index} (line {line}, column {column}), {depth} loop(s) still open")]
    UnclosedLoop {
        index: usize,
        line: usize,
        column: usize,
        depth: usize,
    },
}

impl TranslateError {
    pub fn unmatched_close(tok: &Token) -> Self {
        TranslateError::UnmatchedLoopClose {
            index: tok.index,
            line: tok.line,
            column: tok.column,
        }
    }

    pub fn unclosed(open: &Token, depth: usize) -> Self {
        TranslateError::UnclosedLoop {
            index: open.index,
            line: open.line,
            column: open.column,
            depth,
        }
    }

    /// Position of the offending bracket in the instruction stream.
    pub fn index(&self) -> usize {
        match *self {
            TranslateError::UnmatchedLoopClose { index, .. }
            | TranslateError::UnclosedLoop { index, .. } => index,
        }
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
