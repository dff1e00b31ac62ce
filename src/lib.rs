pub mod cli;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::cli::{Cli, Emit};
use crate::model::TranslateOptions;

pub fn run() -> anyhow::Result<()> {
    run_with(Cli::parse())
}

pub fn run_with(args: Cli) -> anyhow::Result<()> {
    args.validate()?;

    // 1. ── Filter ─────────────────────────────────────────────────────
    let stream = parser::load_path(args.input.as_deref())?;

    // 2. ── Translate ──────────────────────────────────────────────────
    let options = TranslateOptions {
        memory_size: args.memory_size,
        input_mode: args.input_mode,
    };
    let program = processor::run(&stream, &options).with_context(|| "Translating program")?;
    log::info!(
        "translated {} commands into {} blocks ({} instructions)",
        stream.len(),
        program.blocks.len(),
        program.instruction_count()
    );

    // 3. ── Write outputs ──────────────────────────────────────────────
    let emit = args.effective_emit();
    if emit != Emit::None {
        let mut out: Box<dyn Write> = match &args.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("Creating {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        match emit {
            Emit::Text => {
                writer::text::emit(&program, &mut out).with_context(|| "Writing listing")?
            }
            Emit::Json => {
                writer::json::emit(&program, &mut out).with_context(|| "Writing JSON")?
            }
            Emit::None => {}
        }
        out.flush().with_context(|| "Flushing output")?;
    }

    // 4. ── Execute ────────────────────────────────────────────────────
    if args.run {
        let mut vm = processor::vm::Vm::new(&program, io::stdin().lock(), io::stdout().lock())
            .with_context(|| "Preparing to run program")?;
        vm.run().with_context(|| "Running program")?;
        log::info!("executed {} instructions", vm.steps());
    }

    Ok(())
}
