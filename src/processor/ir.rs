//! Basic-block representation produced by the translator.
//!
//! Instructions are in SSA form: anything that yields a value names a
//! fresh `ValueId`, and consumers refer to those ids. The pointer register
//! and the tape are the only mutable storage.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub usize);

impl ValueId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// `dest = *ptr`
    LoadPointer { dest: ValueId },
    /// `*ptr = value`
    StorePointer { value: ValueId },
    AddConstant {
        dest: ValueId,
        operand: ValueId,
        constant: i64,
    },
    SubConstant {
        dest: ValueId,
        operand: ValueId,
        constant: i64,
    },
    /// Address of `mem[index]`. Never bounds-checked.
    ComputeCellAddress { dest: ValueId, index: ValueId },
    LoadCell { dest: ValueId, address: ValueId },
    StoreCell { address: ValueId, value: ValueId },
    /// `dest = operand == 0`
    CompareEqualZero { dest: ValueId, operand: ValueId },
    /// Hand one cell value to the output collaborator.
    CallOutput { value: ValueId },
    /// Ask the input collaborator for one unit.
    CallInput { dest: ValueId },
}

impl Instruction {
    pub const fn name(&self) -> &'static str {
        match self {
            Instruction::LoadPointer { .. } => "loadptr",
            Instruction::StorePointer { .. } => "storeptr",
            Instruction::AddConstant { .. } => "add",
            Instruction::SubConstant { .. } => "sub",
            Instruction::ComputeCellAddress { .. } => "celladdr",
            Instruction::LoadCell { .. } => "load",
            Instruction::StoreCell { .. } => "store",
            Instruction::CompareEqualZero { .. } => "icmp.eq0",
            Instruction::CallOutput { .. } => "call.output",
            Instruction::CallInput { .. } => "call.input",
        }
    }

    /// The value this instruction defines, if any.
    pub fn dest(&self) -> Option<ValueId> {
        match *self {
            Instruction::LoadPointer { dest }
            | Instruction::AddConstant { dest, .. }
            | Instruction::SubConstant { dest, .. }
            | Instruction::ComputeCellAddress { dest, .. }
            | Instruction::LoadCell { dest, .. }
            | Instruction::CompareEqualZero { dest, .. }
            | Instruction::CallInput { dest } => Some(dest),
            Instruction::StorePointer { .. }
            | Instruction::StoreCell { .. }
            | Instruction::CallOutput { .. } => None,
        }
    }

    /// Values read by this instruction, in operand order.
    pub fn operands(&self) -> Vec<ValueId> {
        match *self {
            Instruction::LoadPointer { .. } | Instruction::CallInput { .. } => vec![],
            Instruction::StorePointer { value } | Instruction::CallOutput { value } => vec![value],
            Instruction::AddConstant { operand, .. }
            | Instruction::SubConstant { operand, .. }
            | Instruction::CompareEqualZero { operand, .. } => vec![operand],
            Instruction::ComputeCellAddress { index, .. } => vec![index],
            Instruction::LoadCell { address, .. } => vec![address],
            Instruction::StoreCell { address, value } => vec![address, value],
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::LoadPointer { dest } => write!(f, "{dest} = load i64, ptr %ptr"),
            Instruction::StorePointer { value } => write!(f, "store i64 {value}, ptr %ptr"),
            Instruction::AddConstant {
                dest,
                operand,
                constant,
            } => write!(f, "{dest} = add i64 {operand}, {constant}"),
            Instruction::SubConstant {
                dest,
                operand,
                constant,
            } => write!(f, "{dest} = sub i64 {operand}, {constant}"),
            Instruction::ComputeCellAddress { dest, index } => {
                write!(f, "{dest} = getelementptr i64, ptr %mem, i64 {index}")
            }
            Instruction::LoadCell { dest, address } => write!(f, "{dest} = load i64, ptr {address}"),
            Instruction::StoreCell { address, value } => {
                write!(f, "store i64 {value}, ptr {address}")
            }
            Instruction::CompareEqualZero { dest, operand } => {
                write!(f, "{dest} = icmp eq i64 {operand}, 0")
            }
            Instruction::CallOutput { value } => write!(f, "call void @output(i64 {value})"),
            Instruction::CallInput { dest } => write!(f, "{dest} = call i64 @input()"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminator {
    Branch(BlockId),
    CondBranch {
        condition: ValueId,
        if_true: BlockId,
        if_false: BlockId,
    },
    Return,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Terminator::Branch(target) => vec![target],
            Terminator::CondBranch {
                if_true, if_false, ..
            } => vec![if_true, if_false],
            Terminator::Return => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Diagnostic only; never looked up.
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.terminator.is_some()
    }
}
