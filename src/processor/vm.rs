//! Reference executor for a translated program.
//!
//! Walks the block graph directly. It plays the part of the lowering
//! collaborator for `--run` and for tests: the tape is allocated on entry,
//! output prints the low byte of a cell, input reads one byte (EOF reads as
//! -1). Where compiled code would hit undefined behaviour on an
//! out-of-range pointer, this executor stops with an error instead.

use std::io::{Read, Write};
use thiserror::Error;

use super::ir::{Instruction, Terminator, ValueId};
use crate::model::ProgramContainer;

#[derive(Error, Debug)]
pub enum VmError {
    #[error("data pointer {pointer} is outside the tape of {cells} cells")]
    OutOfBounds { pointer: i64, cells: usize },

    #[error("gave up after {0} instructions")]
    StepLimit(u64),

    #[error("block {0} has no terminator")]
    Unterminated(String),

    #[error("branch to missing block {0}")]
    MissingBlock(usize),

    #[error("value {0} read before it was defined")]
    UndefinedValue(ValueId),

    #[error("value {value} exceeds the declared value count {count}")]
    ValueOutOfRange { value: ValueId, count: usize },

    #[error("cannot allocate a tape of {cells} cells")]
    TapeAllocation { cells: usize },

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Vm<'p, R: Read, W: Write> {
    program: &'p ProgramContainer,
    memory: Vec<i64>,
    pointer: i64,
    values: Vec<Option<i64>>,
    input: R,
    output: W,
    step_limit: Option<u64>,
    steps: u64,
}

impl<'p, R: Read, W: Write> Vm<'p, R, W> {
    /// Allocates the tape up front; a tape too large to allocate is an
    /// error rather than an abort.
    pub fn new(program: &'p ProgramContainer, input: R, output: W) -> Result<Self, VmError> {
        let cells = program.memory.cells;
        let mut memory = Vec::new();
        memory
            .try_reserve_exact(cells)
            .map_err(|_| VmError::TapeAllocation { cells })?;
        memory.resize(cells, 0);

        Ok(Self {
            program,
            memory,
            pointer: program.memory.pointer_init,
            values: vec![None; program.value_count],
            input,
            output,
            step_limit: None,
            steps: 0,
        })
    }

    /// Stop with [`VmError::StepLimit`] after `limit` instructions.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn memory(&self) -> &[i64] {
        &self.memory
    }

    pub fn pointer(&self) -> i64 {
        self.pointer
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        let program = self.program;
        let mut current = program.entry;
        loop {
            let block = program
                .block(current)
                .ok_or(VmError::MissingBlock(current.0))?;

            for inst in &block.instructions {
                self.tick()?;
                self.execute(inst)?;
            }

            let term = block
                .terminator
                .ok_or_else(|| VmError::Unterminated(block.label.clone()))?;
            current = match term {
                Terminator::Branch(target) => target,
                Terminator::CondBranch {
                    condition,
                    if_true,
                    if_false,
                } => {
                    if self.value(condition)? != 0 {
                        if_true
                    } else {
                        if_false
                    }
                }
                Terminator::Return => break,
            };
        }
        self.output.flush()?;
        Ok(())
    }

    fn tick(&mut self) -> Result<(), VmError> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(VmError::StepLimit(limit)),
            _ => Ok(()),
        }
    }

    fn execute(&mut self, inst: &Instruction) -> Result<(), VmError> {
        match *inst {
            Instruction::LoadPointer { dest } => self.define(dest, self.pointer)?,
            Instruction::StorePointer { value } => self.pointer = self.value(value)?,
            Instruction::AddConstant {
                dest,
                operand,
                constant,
            } => {
                let v = self.value(operand)?.wrapping_add(constant);
                self.define(dest, v)?;
            }
            Instruction::SubConstant {
                dest,
                operand,
                constant,
            } => {
                let v = self.value(operand)?.wrapping_sub(constant);
                self.define(dest, v)?;
            }
            // addresses are plain tape indices; checked on access
            Instruction::ComputeCellAddress { dest, index } => {
                let v = self.value(index)?;
                self.define(dest, v)?;
            }
            Instruction::LoadCell { dest, address } => {
                let slot = self.slot(address)?;
                self.define(dest, self.memory[slot])?;
            }
            Instruction::StoreCell { address, value } => {
                let slot = self.slot(address)?;
                self.memory[slot] = self.value(value)?;
            }
            Instruction::CompareEqualZero { dest, operand } => {
                let v = self.value(operand)?;
                self.define(dest, i64::from(v == 0))?;
            }
            Instruction::CallOutput { value } => {
                let v = self.value(value)?;
                self.output.write_all(&[v as u8])?;
            }
            Instruction::CallInput { dest } => {
                let mut buf = [0u8; 1];
                let v = match self.input.read(&mut buf)? {
                    0 => -1,
                    _ => i64::from(buf[0]),
                };
                self.define(dest, v)?;
            }
        }
        Ok(())
    }

    fn define(&mut self, dest: ValueId, v: i64) -> Result<(), VmError> {
        let count = self.values.len();
        let slot = self
            .values
            .get_mut(dest.index())
            .ok_or(VmError::ValueOutOfRange { value: dest, count })?;
        *slot = Some(v);
        Ok(())
    }

    fn value(&self, id: ValueId) -> Result<i64, VmError> {
        self.values
            .get(id.index())
            .copied()
            .flatten()
            .ok_or(VmError::UndefinedValue(id))
    }

    fn slot(&self, address: ValueId) -> Result<usize, VmError> {
        let pointer = self.value(address)?;
        usize::try_from(pointer)
            .ok()
            .filter(|&i| i < self.memory.len())
            .ok_or(VmError::OutOfBounds {
                pointer,
                cells: self.memory.len(),
            })
    }
}

/// Convenience wrapper: run `program` against in-memory input.
pub fn execute(
    program: &ProgramContainer,
    input: &[u8],
) -> Result<(Vec<i64>, Vec<u8>), VmError> {
    let mut vm = Vm::new(program, input, Vec::new())?;
    vm.run()?;
    let memory = vm.memory().to_vec();
    Ok((memory, vm.into_output()))
}
