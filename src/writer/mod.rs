//! Output stage: everything downstream of the translated program.
pub mod json;
pub mod text;
