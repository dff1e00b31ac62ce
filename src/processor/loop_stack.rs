//! Bracket pairing state. Frames live only while their loop is open.

use super::ir::BlockId;
use super::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopFrame {
    pub entry: BlockId,
    pub body: BlockId,
    pub exit: BlockId,
    pub ordinal: usize,
    /// The `[` that opened this loop.
    pub open: Token,
}

#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopFrame>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: LoopFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<LoopFrame> {
        self.frames.pop()
    }

    pub fn innermost(&self) -> Option<&LoopFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::lexer::Command;

    fn frame(ordinal: usize) -> LoopFrame {
        let base = ordinal * 3 + 1;
        LoopFrame {
            entry: BlockId(base),
            body: BlockId(base + 1),
            exit: BlockId(base + 2),
            ordinal,
            open: Token {
                command: Command::LoopOpen,
                index: ordinal,
                line: 1,
                column: ordinal + 1,
            },
        }
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = LoopStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);

        stack.push(frame(0));
        stack.push(frame(1));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.innermost().map(|f| f.ordinal), Some(1));

        assert_eq!(stack.pop(), Some(frame(1)));
        assert_eq!(stack.pop(), Some(frame(0)));
        assert!(stack.is_empty());
    }
}
