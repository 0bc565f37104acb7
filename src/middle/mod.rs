//! Semantic checks run over the syntax tree here before it is lowered into a
//! control flow graph of three-address instructions per function.

pub mod ir;
pub mod validate;
