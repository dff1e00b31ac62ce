//! Single-pass translator from the filtered command stream to basic blocks.
//!
//! The only state carried between commands is the block currently being
//! appended to, the loop ordinal used for labels and the stack of open
//! loops. All of it lives in [`Translator`] and is threaded through
//! [`Translator::step`] by `&mut`.

use crate::model::{FUNCTION_NAME, InputMode, MemoryModel, ProgramContainer, TranslateOptions};

use super::error::{TranslateError, TranslateResult};
use super::ir::{BasicBlock, BlockId, Instruction, Terminator, ValueId};
use super::lexer::{Command, InstructionStream, Token};
use super::loop_stack::{LoopFrame, LoopStack};

/// Translate a whole stream. Fails only on unbalanced brackets.
pub fn translate(
    stream: &InstructionStream,
    options: &TranslateOptions,
) -> TranslateResult<ProgramContainer> {
    let mut translator = Translator::new(*options);
    for tok in stream.tokens() {
        translator.step(tok)?;
    }
    translator.finish()
}

/// Owns the growing block list and the insertion point.
struct FunctionBuilder {
    blocks: Vec<BasicBlock>,
    current: BlockId,
    next_value: usize,
}

impl FunctionBuilder {
    fn new() -> Self {
        let entry = BasicBlock::new(BlockId(0), "entry");
        Self {
            blocks: vec![entry],
            current: BlockId(0),
            next_value: 0,
        }
    }

    fn create_block(&mut self, label: String) -> BlockId {
        let id = BlockId(self.blocks.len());
        log::trace!("created block {} ({label})", id.0);
        self.blocks.push(BasicBlock::new(id, label));
        id
    }

    fn fresh(&mut self) -> ValueId {
        let v = ValueId(self.next_value);
        self.next_value += 1;
        v
    }

    fn current_block(&mut self) -> &mut BasicBlock {
        &mut self.blocks[self.current.index()]
    }

    fn push(&mut self, inst: Instruction) {
        let block = self.current_block();
        debug_assert!(
            !block.is_sealed(),
            "append to sealed block {}",
            block.label
        );
        log::trace!("  {}: {}", block.label, inst.name());
        block.instructions.push(inst);
    }

    /// Terminate the current block. The caller must move the insertion
    /// point before appending anything else.
    fn seal(&mut self, term: Terminator) {
        let block = self.current_block();
        debug_assert!(!block.is_sealed(), "block {} sealed twice", block.label);
        block.terminator = Some(term);
    }

    fn switch_to(&mut self, id: BlockId) {
        debug_assert!(!self.blocks[id.index()].is_sealed());
        self.current = id;
    }

    fn load_pointer(&mut self) -> ValueId {
        let dest = self.fresh();
        self.push(Instruction::LoadPointer { dest });
        dest
    }

    /// Load the pointer afresh and compute the cell address from it.
    fn cell_address(&mut self) -> ValueId {
        let index = self.load_pointer();
        let dest = self.fresh();
        self.push(Instruction::ComputeCellAddress { dest, index });
        dest
    }

    fn load_cell(&mut self, address: ValueId) -> ValueId {
        let dest = self.fresh();
        self.push(Instruction::LoadCell { dest, address });
        dest
    }

    fn add_constant(&mut self, operand: ValueId, constant: i64) -> ValueId {
        let dest = self.fresh();
        self.push(Instruction::AddConstant {
            dest,
            operand,
            constant,
        });
        dest
    }

    fn sub_constant(&mut self, operand: ValueId, constant: i64) -> ValueId {
        let dest = self.fresh();
        self.push(Instruction::SubConstant {
            dest,
            operand,
            constant,
        });
        dest
    }
}

pub struct Translator {
    builder: FunctionBuilder,
    loops: LoopStack,
    loop_ordinal: usize,
    options: TranslateOptions,
}

impl Translator {
    pub fn new(options: TranslateOptions) -> Self {
        Self {
            builder: FunctionBuilder::new(),
            loops: LoopStack::new(),
            loop_ordinal: 0,
            options,
        }
    }

    /// Emit code for one command into the current block.
    pub fn step(&mut self, tok: &Token) -> TranslateResult<()> {
        let b = &mut self.builder;
        match tok.command {
            Command::MoveRight => {
                let ptr = b.load_pointer();
                let moved = b.add_constant(ptr, 1);
                b.push(Instruction::StorePointer { value: moved });
            }
            Command::MoveLeft => {
                let ptr = b.load_pointer();
                let moved = b.sub_constant(ptr, 1);
                b.push(Instruction::StorePointer { value: moved });
            }
            Command::Increment => {
                let address = b.cell_address();
                let cell = b.load_cell(address);
                let value = b.add_constant(cell, 1);
                b.push(Instruction::StoreCell { address, value });
            }
            Command::Decrement => {
                let address = b.cell_address();
                let cell = b.load_cell(address);
                let value = b.sub_constant(cell, 1);
                b.push(Instruction::StoreCell { address, value });
            }
            Command::Input => match self.options.input_mode {
                InputMode::Read => {
                    let address = b.cell_address();
                    let value = b.fresh();
                    b.push(Instruction::CallInput { dest: value });
                    b.push(Instruction::StoreCell { address, value });
                }
                InputMode::Inert => {}
            },
            Command::Output => {
                let address = b.cell_address();
                let value = b.load_cell(address);
                b.push(Instruction::CallOutput { value });
            }
            Command::LoopOpen => self.open_loop(tok),
            Command::LoopClose => self.close_loop(tok)?,
        }
        Ok(())
    }

    fn open_loop(&mut self, tok: &Token) {
        let n = self.loop_ordinal;
        let b = &mut self.builder;
        let entry = b.create_block(format!("loopentry{n}"));
        let body = b.create_block(format!("loopbody{n}"));
        let exit = b.create_block(format!("loopexit{n}"));
        self.loop_ordinal += 1;

        self.loops.push(LoopFrame {
            entry,
            body,
            exit,
            ordinal: n,
            open: *tok,
        });
        log::debug!(
            "open loop {n} at command {} (depth {})",
            tok.index,
            self.loops.depth()
        );

        b.seal(Terminator::Branch(entry));
        b.switch_to(entry);

        // pre-test: a zero cell skips the body entirely
        let address = b.cell_address();
        let cell = b.load_cell(address);
        let is_zero = b.fresh();
        b.push(Instruction::CompareEqualZero {
            dest: is_zero,
            operand: cell,
        });
        b.seal(Terminator::CondBranch {
            condition: is_zero,
            if_true: exit,
            if_false: body,
        });

        b.switch_to(body);
    }

    fn close_loop(&mut self, tok: &Token) -> TranslateResult<()> {
        let frame = self
            .loops
            .pop()
            .ok_or_else(|| TranslateError::unmatched_close(tok))?;
        log::debug!(
            "close loop {} at command {} (opened at {})",
            frame.ordinal,
            tok.index,
            frame.open.index
        );

        self.builder.seal(Terminator::Branch(frame.entry));
        self.builder.switch_to(frame.exit);
        Ok(())
    }

    /// Append the exit block and hand back the finished container.
    pub fn finish(mut self) -> TranslateResult<ProgramContainer> {
        if let Some(frame) = self.loops.innermost() {
            return Err(TranslateError::unclosed(&frame.open, self.loops.depth()));
        }

        let b = &mut self.builder;
        let exit = b.create_block("exit".to_string());
        b.seal(Terminator::Branch(exit));
        b.switch_to(exit);
        b.seal(Terminator::Return);

        log::debug!(
            "translated {} loop(s) into {} blocks, {} values",
            self.loop_ordinal,
            b.blocks.len(),
            b.next_value
        );

        Ok(ProgramContainer {
            name: FUNCTION_NAME.to_string(),
            memory: MemoryModel::new(self.options.memory_size),
            blocks: std::mem::take(&mut b.blocks),
            entry: BlockId(0),
            exit,
            value_count: b.next_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> TranslateResult<ProgramContainer> {
        translate(&InstructionStream::from(src), &TranslateOptions::default())
    }

    fn labels(program: &ProgramContainer) -> Vec<&str> {
        program.blocks.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_block_count() {
        let test_cases = vec![
            ("", 2),
            ("+++", 2),
            ("[]", 5),
            ("[-]>[-]", 8),
            ("[[[]]]", 11),
            ("++>++<[->+<]", 5),
            ("[[-]>[-<+>]<]", 11),
        ];

        for (src, expected) in test_cases {
            let program = run(src).unwrap();
            assert_eq!(program.blocks.len(), expected, "source {src:?}");
        }
    }

    #[test]
    fn test_scenario_a_layout() {
        let program = run("++>++<[->+<]").unwrap();
        assert_eq!(
            labels(&program),
            vec!["entry", "loopentry0", "loopbody0", "loopexit0", "exit"]
        );
        assert_eq!(program.entry, BlockId(0));
        assert_eq!(program.exit, BlockId(4));

        let t = |i: usize| program.blocks[i].terminator;
        assert_eq!(t(0), Some(Terminator::Branch(BlockId(1))));
        assert!(matches!(
            t(1),
            Some(Terminator::CondBranch {
                if_true: BlockId(3),
                if_false: BlockId(2),
                ..
            })
        ));
        assert_eq!(t(2), Some(Terminator::Branch(BlockId(1))));
        assert_eq!(t(3), Some(Terminator::Branch(BlockId(4))));
        assert_eq!(t(4), Some(Terminator::Return));
    }

    #[test]
    fn test_empty_program() {
        let program = run("just a comment with no commands").unwrap();
        assert_eq!(labels(&program), vec!["entry", "exit"]);
        assert!(program.blocks[0].instructions.is_empty());
        assert_eq!(
            program.blocks[0].terminator,
            Some(Terminator::Branch(BlockId(1)))
        );
        assert_eq!(program.blocks[1].terminator, Some(Terminator::Return));
        assert_eq!(program.value_count, 0);
    }

    #[test]
    fn test_increment_sequence() {
        let program = run("+").unwrap();
        assert_eq!(
            program.blocks[0].instructions,
            vec![
                Instruction::LoadPointer { dest: ValueId(0) },
                Instruction::ComputeCellAddress {
                    dest: ValueId(1),
                    index: ValueId(0)
                },
                Instruction::LoadCell {
                    dest: ValueId(2),
                    address: ValueId(1)
                },
                Instruction::AddConstant {
                    dest: ValueId(3),
                    operand: ValueId(2),
                    constant: 1
                },
                Instruction::StoreCell {
                    address: ValueId(1),
                    value: ValueId(3)
                },
            ]
        );
    }

    #[test]
    fn test_pointer_moves_touch_no_cells() {
        let program = run("><").unwrap();
        assert_eq!(
            program.blocks[0].instructions,
            vec![
                Instruction::LoadPointer { dest: ValueId(0) },
                Instruction::AddConstant {
                    dest: ValueId(1),
                    operand: ValueId(0),
                    constant: 1
                },
                Instruction::StorePointer { value: ValueId(1) },
                Instruction::LoadPointer { dest: ValueId(2) },
                Instruction::SubConstant {
                    dest: ValueId(3),
                    operand: ValueId(2),
                    constant: 1
                },
                Instruction::StorePointer { value: ValueId(3) },
            ]
        );
    }

    #[test]
    fn test_each_cell_access_reloads_pointer() {
        let program = run("+>-").unwrap();
        let insts = &program.blocks[0].instructions;
        let addr_indices: Vec<_> = insts
            .iter()
            .filter_map(|i| match i {
                Instruction::ComputeCellAddress { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(addr_indices.len(), 2);

        // every address is computed from the load right before it
        for (pos, inst) in insts.iter().enumerate() {
            if let Instruction::ComputeCellAddress { index, .. } = inst {
                assert_eq!(insts[pos - 1], Instruction::LoadPointer { dest: *index });
            }
        }
    }

    #[test]
    fn test_input_modes() {
        let stream = InstructionStream::from(",");

        let read = translate(&stream, &TranslateOptions::default()).unwrap();
        assert_eq!(
            read.blocks[0].instructions,
            vec![
                Instruction::LoadPointer { dest: ValueId(0) },
                Instruction::ComputeCellAddress {
                    dest: ValueId(1),
                    index: ValueId(0)
                },
                Instruction::CallInput { dest: ValueId(2) },
                Instruction::StoreCell {
                    address: ValueId(1),
                    value: ValueId(2)
                },
            ]
        );

        let options = TranslateOptions {
            input_mode: InputMode::Inert,
            ..TranslateOptions::default()
        };
        let inert = translate(&stream, &options).unwrap();
        assert!(inert.blocks[0].instructions.is_empty());
    }

    #[test]
    fn test_output_sequence() {
        let program = run(".").unwrap();
        assert_eq!(
            program.blocks[0].instructions.last(),
            Some(&Instruction::CallOutput { value: ValueId(2) })
        );
    }

    #[test]
    fn test_loop_entry_tests_current_cell() {
        let program = run("[-]").unwrap();
        let entry = &program.blocks[1];
        assert_eq!(entry.label, "loopentry0");
        assert!(matches!(
            entry.instructions.as_slice(),
            [
                Instruction::LoadPointer { .. },
                Instruction::ComputeCellAddress { .. },
                Instruction::LoadCell { .. },
                Instruction::CompareEqualZero { .. },
            ]
        ));
        let Some(Terminator::CondBranch { condition, .. }) = entry.terminator else {
            panic!("loop entry must end in a conditional branch");
        };
        assert_eq!(entry.instructions[3].dest(), Some(condition));

        // body decrements then jumps back to the test
        let body = &program.blocks[2];
        assert_eq!(body.instructions.len(), 5);
        assert_eq!(body.terminator, Some(Terminator::Branch(BlockId(1))));
    }

    #[test]
    fn test_nested_labels_and_targets() {
        let program = run("[>[-]<]").unwrap();
        assert_eq!(
            labels(&program),
            vec![
                "entry",
                "loopentry0",
                "loopbody0",
                "loopexit0",
                "loopentry1",
                "loopbody1",
                "loopexit1",
                "exit"
            ]
        );

        // inner exit continues the outer body, which loops back to outer entry
        assert_eq!(program.blocks[5].terminator, Some(Terminator::Branch(BlockId(4))));
        assert_eq!(program.blocks[6].terminator, Some(Terminator::Branch(BlockId(1))));
        assert_eq!(program.blocks[3].terminator, Some(Terminator::Branch(BlockId(7))));
    }

    #[test]
    fn test_unbalanced() {
        let test_cases = vec![
            (
                "]",
                TranslateError::UnmatchedLoopClose {
                    index: 0,
                    line: 1,
                    column: 1,
                },
            ),
            (
                "[",
                TranslateError::UnclosedLoop {
                    index: 0,
                    line: 1,
                    column: 1,
                    depth: 1,
                },
            ),
            (
                "+[-]]",
                TranslateError::UnmatchedLoopClose {
                    index: 4,
                    line: 1,
                    column: 5,
                },
            ),
            (
                "[\n  [ ]",
                TranslateError::UnclosedLoop {
                    index: 0,
                    line: 1,
                    column: 1,
                    depth: 1,
                },
            ),
            (
                "[[+",
                TranslateError::UnclosedLoop {
                    index: 1,
                    line: 1,
                    column: 2,
                    depth: 2,
                },
            ),
            (
                "][",
                TranslateError::UnmatchedLoopClose {
                    index: 0,
                    line: 1,
                    column: 1,
                },
            ),
        ];

        for (src, expected) in test_cases {
            assert_eq!(run(src), Err(expected), "source {src:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let src = "++[>+[>++<-]<-]>>.,[.,]";
        assert_eq!(run(src).unwrap(), run(src).unwrap());
    }

    #[test]
    fn test_memory_declaration() {
        let options = TranslateOptions {
            memory_size: 42,
            ..TranslateOptions::default()
        };
        let program = translate(&InstructionStream::from("+"), &options).unwrap();
        assert_eq!(program.memory, MemoryModel::new(42));
        assert_eq!(program.memory.pointer_init, 0);
        assert_eq!(program.name, "main");
    }
}
