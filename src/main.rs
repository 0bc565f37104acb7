use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser as ClapParser, ValueEnum, error::ErrorKind};
use minicc::{
    backend::{CodegenOptions, Target},
    driver::{self, CompileError},
    middle::ir::pretty_print::pretty_print_module,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Target assembly
    Asm,
    /// Textual dump of the control flow graphs
    Ir,
    /// Assembled and linked executable
    Exe,
}

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    source_file: PathBuf,

    /// Output path (stdout for asm and ir when omitted, `a.out` for exe)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,

    #[arg(long, value_enum, default_value_t = Target::x86_64LinuxGnu)]
    target: Target,

    /// Annotate the assembly with the IR it was generated from
    #[arg(long)]
    comments: bool,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if !args.source_file.exists() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Source file '{}' does not exist!", args.source_file.display()),
            )
            .exit()
    }

    if !args.source_file.is_file() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Input path '{}' is not a file!", args.source_file.display()),
            )
            .exit()
    }

    let source_file = match driver::read_source_file(&args.source_file) {
        Ok(source_file) => source_file,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(error.exit_code());
        }
    };

    let compilation = match driver::compile(&source_file) {
        Ok(compilation) => compilation,
        Err(error) => {
            driver::report_error(&source_file, &error);
            std::process::exit(error.exit_code());
        }
    };

    for warning in &compilation.warnings {
        driver::report_warning(&source_file, warning);
    }

    let options = CodegenOptions {
        emit_comments: args.comments,
    };

    let result = match args.emit {
        Emit::Ir => write_output(args.output, &pretty_print_module(&compilation.module)),
        Emit::Asm => write_output(
            args.output,
            &driver::emit_assembly(&compilation.module, args.target, &options),
        ),
        Emit::Exe => {
            let assembly = driver::emit_assembly(&compilation.module, args.target, &options);
            let output = args.output.unwrap_or_else(|| PathBuf::from("a.out"));

            driver::build_executable(&assembly, args.target, &output)
        }
    };

    if let Err(error) = result {
        driver::report_error(&source_file, &error);
        std::process::exit(error.exit_code());
    }
}

fn write_output(path: Option<PathBuf>, contents: &str) -> Result<(), CompileError> {
    match path {
        Some(path) => std::fs::write(&path, contents)
            .map_err(|source| CompileError::WriteOutput { path, source }),
        None => {
            let mut stdout = std::io::stdout().lock();

            stdout
                .write_all(contents.as_bytes())
                .map_err(|source| CompileError::WriteOutput {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
        }
    }
}
