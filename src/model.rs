// shape of the tape every generated function allocates
pub const MEM_SIZE: usize = 65535;
pub const CELL_BITS: u32 = 64;

/// Name of the single generated procedure.
pub const FUNCTION_NAME: &str = "main";

use crate::processor::ir::{BasicBlock, BlockId};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How the `,` command is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Read one unit of input into the current cell.
    #[default]
    Read,
    /// Emit nothing for `,`.
    Inert,
}

/// Knobs accepted by [`crate::processor::translator::translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    pub memory_size: usize,
    pub input_mode: InputMode,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            memory_size: MEM_SIZE,
            input_mode: InputMode::Read,
        }
    }
}

/// The tape and the data pointer, both local to the generated function.
///
/// The pointer is never range-checked by the translator. Whatever happens
/// when it walks off the tape is up to whoever lowers the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryModel {
    pub cells: usize,
    pub cell_bits: u32,
    pub pointer_init: i64,
}

impl MemoryModel {
    pub fn new(cells: usize) -> Self {
        Self {
            cells,
            cell_bits: CELL_BITS,
            pointer_init: 0,
        }
    }
}

/// Fully translated program handed to `writer` and the executor.
///
/// `blocks[i].id == BlockId(i)` always holds: blocks are stored in the
/// order they were created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramContainer {
    pub name: String,
    pub memory: MemoryModel,
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
    pub exit: BlockId,
    /// Number of SSA values defined across all blocks.
    pub value_count: usize,
}

impl ProgramContainer {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}
