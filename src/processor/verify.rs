//! Structural checks run on a translated program before it is handed off.
//!
//! Values never flow between blocks: each block reloads the pointer and
//! the cell it needs, so every operand must be defined earlier in the same
//! block.
//!
//! There is no check for instructions following a terminator: a block keeps
//! its terminator apart from its instruction list, so that shape cannot be
//! built.

use std::collections::HashSet;
use thiserror::Error;

use super::ir::{BlockId, Terminator, ValueId};
use crate::model::ProgramContainer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("program has no blocks")]
    Empty,

    #[error("block at position {position} carries id {id}")]
    OutOfOrder { position: usize, id: usize },

    #[error("block {label} has no terminator")]
    Unterminated { label: String },

    #[error("block {label} branches to missing block {target}")]
    DanglingTarget { label: String, target: usize },

    #[error("exit block {label} must end in a return")]
    ExitNotReturn { label: String },

    #[error("block {label} returns but is not the exit block")]
    EarlyReturn { label: String },

    #[error("value {value} used in block {label} before it is defined there")]
    UndefinedValue { label: String, value: ValueId },

    #[error("value {value} defined twice")]
    Redefined { value: ValueId },

    #[error("value {value} exceeds the declared value count {count}")]
    ValueOutOfRange { value: ValueId, count: usize },
}

pub fn verify(program: &ProgramContainer) -> Result<(), VerifyError> {
    if program.blocks.is_empty() {
        return Err(VerifyError::Empty);
    }

    let mut seen_values = HashSet::<ValueId>::new();

    for (position, block) in program.blocks.iter().enumerate() {
        if block.id.index() != position {
            return Err(VerifyError::OutOfOrder {
                position,
                id: block.id.0,
            });
        }

        let mut local = HashSet::<ValueId>::new();
        for inst in &block.instructions {
            for operand in inst.operands() {
                if !local.contains(&operand) {
                    return Err(VerifyError::UndefinedValue {
                        label: block.label.clone(),
                        value: operand,
                    });
                }
            }
            if let Some(dest) = inst.dest() {
                if dest.0 >= program.value_count {
                    return Err(VerifyError::ValueOutOfRange {
                        value: dest,
                        count: program.value_count,
                    });
                }
                if !seen_values.insert(dest) {
                    return Err(VerifyError::Redefined { value: dest });
                }
                local.insert(dest);
            }
        }

        let term = block.terminator.ok_or_else(|| VerifyError::Unterminated {
            label: block.label.clone(),
        })?;

        if let Terminator::CondBranch { condition, .. } = term {
            if !local.contains(&condition) {
                return Err(VerifyError::UndefinedValue {
                    label: block.label.clone(),
                    value: condition,
                });
            }
        }

        for target in term.successors() {
            if program.block(target).is_none() {
                return Err(VerifyError::DanglingTarget {
                    label: block.label.clone(),
                    target: target.0,
                });
            }
        }

        let is_exit = block.id == program.exit;
        match (is_exit, term) {
            (true, Terminator::Return) | (false, Terminator::Branch(_)) => {}
            (false, Terminator::CondBranch { .. }) => {}
            (true, _) => {
                return Err(VerifyError::ExitNotReturn {
                    label: block.label.clone(),
                });
            }
            (false, Terminator::Return) => {
                return Err(VerifyError::EarlyReturn {
                    label: block.label.clone(),
                });
            }
        }
    }

    if program.block(program.exit).is_none() || program.block(program.entry).is_none() {
        return Err(VerifyError::DanglingTarget {
            label: program.name.clone(),
            target: program.exit.0.max(program.entry.0),
        });
    }

    Ok(())
}

/// Ids of the blocks reachable from the entry block.
pub fn reachable(program: &ProgramContainer) -> Vec<BlockId> {
    let mut seen = HashSet::new();
    let mut work = vec![program.entry];
    let mut order = Vec::new();
    while let Some(id) = work.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(Some(term)) = program.block(id).map(|b| b.terminator) {
            work.extend(term.successors().into_iter().rev());
        }
    }
    order.sort();
    order
}
