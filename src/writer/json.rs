//! Serialise the whole program container as JSON.

use crate::model::ProgramContainer;
use std::io::Write;

pub fn emit<W: Write>(program: &ProgramContainer, out: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranslateOptions;
    use crate::processor::{InstructionStream, translate};

    #[test]
    fn test_json_shape() {
        let program =
            translate(&InstructionStream::from("+[-]"), &TranslateOptions::default()).unwrap();
        let mut buf = Vec::new();
        emit(&program, &mut buf).unwrap();

        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["name"], "main");
        assert_eq!(v["memory"]["cells"], 65535);
        assert_eq!(v["blocks"].as_array().unwrap().len(), 5);
        assert_eq!(v["blocks"][1]["label"], "loopentry0");
        assert_eq!(v["exit"], 4);

        let back: ProgramContainer = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back, program);
    }
}
