use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::model::{InputMode, MEM_SIZE};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source file (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Write the generated representation here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format [default: text, or none with --run]
    #[arg(long, value_enum)]
    pub emit: Option<Emit>,

    /// Number of 64-bit cells on the tape
    #[arg(long, default_value_t = MEM_SIZE, value_parser = parse_memory_size)]
    pub memory_size: usize,

    /// How `,` is lowered
    #[arg(long, value_enum, default_value_t = InputMode::Read)]
    pub input_mode: InputMode,

    /// Execute the program after translating it; stdin feeds its `,`
    #[arg(long)]
    pub run: bool,
}

impl Cli {
    /// Output format once `--run` has been taken into account.
    pub fn effective_emit(&self) -> Emit {
        self.emit
            .unwrap_or(if self.run { Emit::None } else { Emit::Text })
    }

    pub fn source_is_stdin(&self) -> bool {
        match &self.input {
            Some(p) => p == Path::new("-"),
            None => true,
        }
    }

    /// Reject flag combinations that would share stdin or stdout.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.run && self.source_is_stdin() {
            bail!("--run needs a source file: stdin is the running program's input");
        }
        if self.run && self.output.is_none() && self.effective_emit() != Emit::None {
            bail!("--run writes program output to stdout: pass -o to keep the generated output");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    Text,
    Json,
    None,
}

fn parse_memory_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 {
        return Err("memory size must be at least 1".into());
    }
    Ok(n)
}
