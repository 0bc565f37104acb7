//! Runs the pipeline: parse, validate, lower, emit, and optionally assemble and
//! link through the target's toolchain commands.

use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use colored::Colorize;
use thiserror::Error;

use crate::{
    backend::{CodeGenerator, CodegenOptions, Target},
    frontend::{SourceFile, SourceFileOrigin, lexer::Span, parser::{ParseError, Parser}},
    middle::{
        ir::{self, ast_lowering::lower_translation_unit},
        validate::{SemanticError, Validator, Warning},
    },
};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not read `{}`: {source}", .path.display())]
    ReadSource { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error("could not create a temporary file: {0}")]
    TemporaryFile(io::Error),
    #[error("could not write `{}`: {source}", .path.display())]
    WriteOutput { path: PathBuf, source: io::Error },
    #[error("could not run `{command}`: {source}")]
    SpawnTool { command: String, source: io::Error },
    #[error("`{command}` failed with {status}")]
    ToolFailed { command: String, status: ExitStatus },
}

impl CompileError {
    /// Process exit code for this error. Semantic errors keep their own
    /// taxonomy, everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Semantic(error) => error.kind.exit_code(),
            _ => 1,
        }
    }

    /// Location in the source this error points at, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parse(error) => Some(error.span),
            CompileError::Semantic(error) => Some(error.span),
            _ => None,
        }
    }
}

/// A validated and lowered translation unit
#[derive(Debug)]
pub struct Compilation {
    pub module: ir::Module,
    pub warnings: Vec<Warning>,
}

pub fn read_source_file(path: &Path) -> Result<SourceFile, CompileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CompileError::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SourceFile {
        contents,
        origin: SourceFileOrigin::File(path.to_path_buf()),
    })
}

/// Parses, validates and lowers a source file. Nothing is lowered unless the
/// whole unit validates.
pub fn compile(source_file: &SourceFile) -> Result<Compilation, CompileError> {
    log::info!("parsing {}", source_file.origin);
    let unit = Parser::parse_translation_unit(source_file)?;

    log::info!("validating {} functions", unit.functions.len());
    let warnings = Validator::validate_translation_unit(&unit)?;

    log::info!("lowering to IR");
    let module = lower_translation_unit(&unit);

    Ok(Compilation { module, warnings })
}

pub fn emit_assembly(module: &ir::Module, target: Target, options: &CodegenOptions) -> String {
    log::info!("emitting assembly for {target:?}");
    target.get_code_generator().translate_to_asm(module, options)
}

/// Assembles and links `assembly` into an executable at `output_file`
pub fn build_executable(
    assembly: &str,
    target: Target,
    output_file: &Path,
) -> Result<(), CompileError> {
    let code_generator = target.get_code_generator();

    let assembly_file = mktemp::Temp::new_file().map_err(CompileError::TemporaryFile)?;
    let object_file = mktemp::Temp::new_file().map_err(CompileError::TemporaryFile)?;

    std::fs::write(assembly_file.as_path(), assembly).map_err(|source| {
        CompileError::WriteOutput {
            path: assembly_file.as_path().to_path_buf(),
            source,
        }
    })?;

    run_tool(
        code_generator.create_assembler_command(assembly_file.as_path(), object_file.as_path()),
    )?;
    run_tool(code_generator.create_linker_command(object_file.as_path(), output_file))?;

    Ok(())
}

fn run_tool(mut command: Command) -> Result<(), CompileError> {
    let description = format!("{command:?}");
    log::debug!("running {description}");

    let status = command.status().map_err(|source| CompileError::SpawnTool {
        command: description.clone(),
        source,
    })?;

    if !status.success() {
        return Err(CompileError::ToolFailed {
            command: description,
            status,
        });
    }

    Ok(())
}

pub fn report_warning(source_file: &SourceFile, warning: &Warning) {
    eprintln!(
        "{} {} ({})",
        "warning:".yellow().bold(),
        warning.kind,
        source_file.format_span_position(warning.span)
    );
    source_file.highlight_span(warning.span);
}

pub fn report_error(source_file: &SourceFile, error: &CompileError) {
    match error.span() {
        Some(span) => {
            eprintln!(
                "{} {} ({})",
                "error:".red().bold(),
                error,
                source_file.format_span_position(span)
            );
            source_file.highlight_span(span);
        }
        None => eprintln!("{} {}", "error:".red().bold(), error),
    }
}
