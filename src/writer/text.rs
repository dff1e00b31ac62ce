//! Emit a readable, LLVM-flavoured listing of the translated function.

use crate::model::ProgramContainer;
use crate::processor::ir::{BlockId, Terminator};
use std::io::{self, Write};

pub fn emit<W: Write>(program: &ProgramContainer, out: &mut W) -> io::Result<()> {
    writeln!(out, "; Auto-generated – DO NOT EDIT")?;
    writeln!(
        out,
        "; {} blocks, {} values",
        program.blocks.len(),
        program.value_count
    )?;
    writeln!(out)?;
    writeln!(out, "declare void @output(i64)")?;
    writeln!(out, "declare i64 @input()")?;
    writeln!(out)?;

    writeln!(out, "define void @{}() {{", program.name)?;
    for block in &program.blocks {
        writeln!(out, "{}:", block.label)?;

        // ---------------------------------------------------------------
        // tape and pointer live at the top of the entry block
        // ---------------------------------------------------------------
        if block.id == program.entry {
            let mem = &program.memory;
            writeln!(out, "  %mem = alloca [{} x i{}]", mem.cells, mem.cell_bits)?;
            writeln!(
                out,
                "  store [{} x i{}] zeroinitializer, ptr %mem",
                mem.cells, mem.cell_bits
            )?;
            writeln!(out, "  %ptr = alloca i64")?;
            writeln!(out, "  store i64 {}, ptr %ptr", mem.pointer_init)?;
        }

        for inst in &block.instructions {
            writeln!(out, "  {inst}")?;
        }

        match block.terminator {
            Some(term) => writeln!(out, "  {}", terminator(program, term))?,
            None => writeln!(out, "  ; <unterminated>")?,
        }
    }
    writeln!(out, "}}")?;

    Ok(())
}

fn label(program: &ProgramContainer, id: BlockId) -> &str {
    program
        .block(id)
        .map(|b| b.label.as_str())
        .unwrap_or("<missing>")
}

fn terminator(program: &ProgramContainer, term: Terminator) -> String {
    match term {
        Terminator::Branch(target) => format!("br label %{}", label(program, target)),
        Terminator::CondBranch {
            condition,
            if_true,
            if_false,
        } => format!(
            "br i1 {condition}, label %{}, label %{}",
            label(program, if_true),
            label(program, if_false)
        ),
        Terminator::Return => "ret void".to_string(),
    }
}
