//! Token filter for the eight-symbol tape language.
//!
//! Every byte that is one of `> < + - , . [ ]` becomes a `Token`; every
//! other byte is a comment and is dropped without a trace. There is no
//! error path.
//
//  Alphabet:
//
//      '>'  MoveRight      '<'  MoveLeft
//      '+'  Increment      '-'  Decrement
//      ','  Input          '.'  Output
//      '['  LoopOpen       ']'  LoopClose

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::slice::Iter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Input,
    Output,
    LoopOpen,
    LoopClose,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'>' => Some(Self::MoveRight),
            b'<' => Some(Self::MoveLeft),
            b'+' => Some(Self::Increment),
            b'-' => Some(Self::Decrement),
            b',' => Some(Self::Input),
            b'.' => Some(Self::Output),
            b'[' => Some(Self::LoopOpen),
            b']' => Some(Self::LoopClose),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::MoveRight => '>',
            Self::MoveLeft => '<',
            Self::Increment => '+',
            Self::Decrement => '-',
            Self::Input => ',',
            Self::Output => '.',
            Self::LoopOpen => '[',
            Self::LoopClose => ']',
        }
    }
}

/// A kept command plus where it came from.
///
/// `index` is the position inside the filtered stream; `line` and `column`
/// (both 1-based) point at the byte in the raw source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub command: Command,
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    bytes: Iter<'a, u8>,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            bytes: src.iter(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.bytes.next().copied()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(b) = self.next_byte() {
            let (line, column) = (self.line, self.column);
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }

            if let Some(command) = Command::from_byte(b) {
                let tok = Token {
                    command,
                    index: self.index,
                    line,
                    column,
                };
                self.index += 1;
                return Some(tok);
            }
        }
        None
    }
}

/// Ordered, filtered commands: the only thing the translator consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionStream {
    tokens: Vec<Token>,
}

impl InstructionStream {
    pub fn filter(src: &[u8]) -> Self {
        Self {
            tokens: Lexer::new(src).collect(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.tokens.iter().map(|t| t.command)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<&str> for InstructionStream {
    fn from(src: &str) -> Self {
        Self::filter(src.as_bytes())
    }
}

impl Display for InstructionStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for c in self.commands() {
            write!(f, "{}", c.as_char())?;
        }
        Ok(())
    }
}
