use std::{path::PathBuf, process::Command};

use minicc::{
    backend::{CodegenOptions, Target},
    driver::{self, CompileError},
    frontend::SourceFile,
    middle::{
        ir::Terminator,
        validate::{SemanticErrorKind, WarningKind},
    },
};

fn compile(source: &str) -> Result<driver::Compilation, CompileError> {
    driver::compile(&SourceFile::from_memory(source))
}

fn exit_code_of(source: &str) -> i32 {
    match compile(source) {
        Ok(_) => 0,
        Err(error) => error.exit_code(),
    }
}

/// Assembles, links and runs the program, returning its exit status. `None`
/// when no suitable toolchain is available on this machine.
fn run(source: &str) -> Option<i32> {
    if !cfg!(all(target_arch = "x86_64", target_os = "linux")) {
        return None;
    }

    if Command::new("cc").arg("--version").output().is_err() {
        return None;
    }

    let compilation = compile(source).unwrap();
    let assembly = driver::emit_assembly(
        &compilation.module,
        Target::x86_64LinuxGnu,
        &CodegenOptions::default(),
    );

    let executable = mktemp::Temp::new_file().unwrap();
    let executable_path: PathBuf = executable.as_path().to_path_buf();

    driver::build_executable(&assembly, Target::x86_64LinuxGnu, &executable_path).unwrap();

    let status = Command::new(&executable_path).status().unwrap();

    status.code()
}

#[test]
fn straight_line_function_is_one_block() {
    let compilation = compile("int main() { int a = 40; int b = 2; return a + b; }").unwrap();

    assert_eq!(compilation.module.functions[0].block_count(), 1);
    assert!(compilation.warnings.is_empty());

    if let Some(code) = run("int main() { int a = 40; int b = 2; return a + b; }") {
        assert_eq!(code, 42);
    }
}

#[test]
fn uninitialized_read_warns_but_compiles() {
    let compilation = compile("int main() { int x; return x; }").unwrap();

    assert_eq!(compilation.warnings.len(), 1);
    assert!(matches!(
        compilation.warnings[0].kind,
        WarningKind::UninitializedRead(name) if name.value() == "x"
    ));

    let assembly = driver::emit_assembly(
        &compilation.module,
        Target::x86_64LinuxGnu,
        &CodegenOptions::default(),
    );
    assert!(assembly.contains("mov eax, DWORD PTR [rbp-4]"));
}

#[test]
fn redeclaration_exits_with_one() {
    let source = "int main() { int x = 1; int x = 2; return x; }";

    let Err(CompileError::Semantic(error)) = compile(source) else {
        panic!("expected a semantic error");
    };
    assert!(matches!(error.kind, SemanticErrorKind::Redeclaration(_)));
    assert_eq!(exit_code_of(source), 1);
}

#[test]
fn consuming_void_result_exits_with_one() {
    assert_eq!(exit_code_of("void f() {} int main() { return f(); }"), 1);
}

#[test]
fn while_loop_shape_and_result() {
    let source = "int main() { int i = 0; while (i < 3) { i++; } return i; }";
    let compilation = compile(source).unwrap();
    let graph = &compilation.module.functions[0];

    assert_eq!(graph.block_count(), 4);
    for (_, block) in graph.blocks() {
        assert!(matches!(
            block.terminator(),
            Terminator::Return | Terminator::Jump(_) | Terminator::Branch { .. }
        ));
    }

    if let Some(code) = run(source) {
        assert_eq!(code, 3);
    }
}

#[test]
fn duplicate_function_exits_with_four() {
    assert_eq!(
        exit_code_of("int f() { return 1; } int f() { return 2; } int main() { return f(); }"),
        4
    );
}

#[test]
fn missing_main_exits_with_five() {
    assert_eq!(exit_code_of("int f() { return 1; }"), 5);
}

#[test]
fn parse_errors_exit_with_one() {
    let source = "int main() { return 1 +; }";

    assert!(matches!(compile(source), Err(CompileError::Parse(_))));
    assert_eq!(exit_code_of(source), 1);
}

#[test]
fn frame_offsets_are_unique_per_function() {
    let compilation = compile(
        "int main() { int s = 0; { int a = 1; s += a; } { int b = 2; s += b; } \
         for (int i = 0; i < 2; i++) { int c = i; s += c; } return s; }",
    )
    .unwrap();

    let graph = &compilation.module.functions[0];
    let mut offsets: Vec<_> = graph.symbols().map(|(_, entry)| entry.frame_offset).collect();
    let count = offsets.len();
    offsets.sort_unstable();
    offsets.dedup();

    assert_eq!(offsets.len(), count);
}

#[test]
fn non_ascii_comments_and_char_literals_compile() {
    let source = "// déjà vu\n/* commentaire été */\nint main() { int abc = 3; int c = 'é'; return abc + c - 233; }";
    let compilation = compile(source).unwrap();

    assert!(compilation.warnings.is_empty());
    assert_eq!(compilation.module.functions[0].block_count(), 1);

    if let Some(code) = run(source) {
        assert_eq!(code, 3);
    }
}

#[test]
fn most_negative_int_literal_is_accepted() {
    let source = "int main() { return -2147483648 == -2147483647 - 1; }";

    assert!(compile(source).is_ok());
    assert_eq!(exit_code_of("int main() { return 2147483648; }"), 1);

    if let Some(code) = run(source) {
        assert_eq!(code, 1);
    }
}

#[test]
fn validation_is_idempotent() {
    let source = "int main() { int a = 1; return a; }";

    assert!(compile(source).unwrap().warnings.is_empty());
    assert!(compile(source).unwrap().warnings.is_empty());
}

#[test]
fn executes_control_flow_and_calls() {
    let source = r#"
        #include <stdio.h>

        int sum(int a, int b, int c, int d, int e, int f, int g, int h) {
            return a + b + c + d + e + f + g + h;
        }

        int fact(int n) {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }

        int main() {
            int total = 0;
            for (int i = 0; i < 10; i++) {
                if (i % 2 == 0 && i != 4) continue;
                total += i;
            }
            int j = 0;
            do {
                j += 2;
                if (j > 6) break;
            } while (1);
            putchar('o');
            putchar('k');
            putchar('\n');
            // 1 + 3 + 4 + 5 + 7 + 9 = 29, 29 + 8 = 37
            return total + j + sum(1, 1, 1, 1, 1, 1, 1, 1) - fact(3) + (!0 || total / 0);
        }
    "#;

    let compilation = compile(source).unwrap();
    assert!(compilation.warnings.is_empty());

    // 37 + 8 - 6 + 1
    if let Some(code) = run(source) {
        assert_eq!(code, 40);
    }
}
