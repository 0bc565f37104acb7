//! The backend turns each function's control flow graph into assembly for a
//! target and knows how to assemble and link the result. Every IR slot keeps
//! its own stack location, values pass through fixed scratch registers.

use std::{path::Path, process::Command};

use crate::middle::ir;

pub mod assembler;
mod x86_64_linux_gnu;

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Annotate the assembly with the IR instruction each sequence came from
    pub emit_comments: bool,
}

pub trait CodeGenerator {
    fn translate_to_asm(&self, module: &ir::Module, options: &CodegenOptions) -> String;
    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command;
    fn create_linker_command(&self, input_file: &Path, output_file: &Path) -> Command;
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Target {
    #[default]
    #[value(name = "x86_64-linux-gnu")]
    x86_64LinuxGnu,
}

impl Target {
    pub fn get_code_generator(self) -> impl CodeGenerator {
        match self {
            Target::x86_64LinuxGnu => x86_64_linux_gnu::CodeGeneratorX86_64LinuxGnu,
        }
    }
}
