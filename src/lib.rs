//! A compiler for a small subset of C: `int` scalars, functions, and structured
//! control flow, emitted as x86-64 assembly.

pub mod backend;
pub mod driver;
pub mod frontend;
pub mod index;
pub mod middle;
