use std::{path::Path, process::Command};

use itertools::Itertools;

use crate::{
    backend::{
        CodeGenerator, CodegenOptions,
        assembler::{Assembler, X86FullRegister},
    },
    middle::ir::{
        self, ControlFlowGraph, Instruction, Operand, Operation, Terminator,
        cfg::REGISTER_PARAMETER_COUNT, pretty_print::display_instruction,
    },
};

pub struct CodeGeneratorX86_64LinuxGnu;

impl CodeGenerator for CodeGeneratorX86_64LinuxGnu {
    fn translate_to_asm(&self, module: &ir::Module, options: &CodegenOptions) -> String {
        let function_bodies = module
            .functions
            .iter()
            .map(|graph| codegen_function(graph, options))
            .join("\n");

        format!(
            indoc::indoc! {r#"
                .intel_syntax noprefix
                .text

            {0}
                .section .note.GNU-stack,"",@progbits
            "#
            },
            function_bodies
        )
    }

    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new("cc");

        // The input is a temporary file without a `.s` extension
        cmd.args(["-x", "assembler", "-c", "-o"])
            .arg(output_file)
            .arg(input_file);

        cmd
    }

    fn create_linker_command(&self, input_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new("cc");

        cmd.arg("-o").arg(output_file).arg(input_file);

        cmd
    }
}

/// Stack space below `rbp`, keeping `rsp` 16 byte aligned at call sites
fn stack_frame_size(graph: &ControlFlowGraph) -> u32 {
    graph.locals_size().next_multiple_of(16)
}

fn codegen_function(graph: &ControlFlowGraph, options: &CodegenOptions) -> String {
    let mut assembler = Assembler::new(graph, options.emit_comments);

    assembler.global_function(graph.name.value());
    assembler.function_prologue(stack_frame_size(graph));

    /* Spill the register arguments into their stack slots */

    for (position, parameter) in graph
        .parameters()
        .iter()
        .take(REGISTER_PARAMETER_COUNT)
        .enumerate()
    {
        assembler.store_slot(*parameter, X86FullRegister::ARGUMENTS[position]);
    }

    for (_, block) in graph.blocks() {
        log::trace!(
            "emitting {} ({} instructions)",
            block.label,
            block.instructions.len()
        );

        assembler.label(&block.label);

        for instruction in &block.instructions {
            assembler.comment(display_instruction(graph, instruction));
            codegen_instruction(&mut assembler, graph, instruction);
        }

        match block.terminator() {
            Terminator::Return => assembler.function_epilogue(),
            Terminator::Jump(target) => {
                assembler.emit(format!("jmp {}", graph.block(target).label));
            }
            Terminator::Branch {
                test,
                on_true,
                on_false,
            } => {
                assembler.emit(format!("cmp {}, 0", assembler.slot(test)));
                assembler.emit(format!("je {}", graph.block(on_false).label));
                assembler.emit(format!("jmp {}", graph.block(on_true).label));
            }
        }
    }

    assembler.into_output()
}

fn codegen_instruction(
    assembler: &mut Assembler,
    graph: &ControlFlowGraph,
    instruction: &Instruction,
) {
    let operands = &instruction.operands;

    match instruction.operation {
        Operation::LoadConstant => {
            let Operand::Literal(value) = operands[1] else {
                panic!("internal compiler error: ldconst expects a literal");
            };

            assembler.emit(format!("mov {}, {value}", assembler.slot(operands[0].as_slot())));
        }
        Operation::CopyVariable => {
            assembler.load_slot(X86FullRegister::Rax, operands[1].as_slot());
            assembler.store_slot(operands[0].as_slot(), X86FullRegister::Rax);
        }
        Operation::Add
        | Operation::Subtract
        | Operation::Multiply
        | Operation::BitwiseAnd
        | Operation::BitwiseOr
        | Operation::BitwiseXor => {
            let mnemonic = match instruction.operation {
                Operation::Add => "add",
                Operation::Subtract => "sub",
                Operation::Multiply => "imul",
                Operation::BitwiseAnd => "and",
                Operation::BitwiseOr => "or",
                _ => "xor",
            };

            let lhs = assembler.load_slot(X86FullRegister::Rax, operands[1].as_slot());
            assembler.emit(format!(
                "{mnemonic} {lhs}, {}",
                assembler.slot(operands[2].as_slot())
            ));
            assembler.store_slot(operands[0].as_slot(), X86FullRegister::Rax);
        }
        Operation::Divide | Operation::Modulo => {
            assembler.load_slot(X86FullRegister::Rax, operands[1].as_slot());
            assembler.emit("cdq");
            assembler.emit(format!("idiv {}", assembler.slot(operands[2].as_slot())));

            // Quotient in eax, remainder in edx
            let result = if instruction.operation == Operation::Divide {
                X86FullRegister::Rax
            } else {
                X86FullRegister::Rdx
            };
            assembler.store_slot(operands[0].as_slot(), result);
        }
        Operation::ShiftLeft | Operation::ShiftRight => {
            let mnemonic = if instruction.operation == Operation::ShiftLeft {
                "sal"
            } else {
                "sar"
            };

            let lhs = assembler.load_slot(X86FullRegister::Rax, operands[1].as_slot());
            assembler.load_slot(X86FullRegister::Rcx, operands[2].as_slot());
            assembler.emit(format!("{mnemonic} {lhs}, {}", X86FullRegister::Rcx.as_8_bit()));
            assembler.store_slot(operands[0].as_slot(), X86FullRegister::Rax);
        }
        Operation::Negate => {
            assembler.emit(format!("neg {}", assembler.slot(operands[0].as_slot())));
        }
        Operation::BitwiseNot => {
            assembler.emit(format!("not {}", assembler.slot(operands[0].as_slot())));
        }
        Operation::LogicalNot => {
            let slot = operands[0].as_slot();

            assembler.emit(format!("cmp {}, 0", assembler.slot(slot)));
            assembler.emit(format!("sete {}", X86FullRegister::Rax.as_8_bit()));
            assembler.emit(format!(
                "movzx {}, {}",
                X86FullRegister::Rax.as_32_bit(),
                X86FullRegister::Rax.as_8_bit()
            ));
            assembler.store_slot(slot, X86FullRegister::Rax);
        }
        Operation::Increment => {
            assembler.emit(format!("add {}, 1", assembler.slot(operands[0].as_slot())));
        }
        Operation::Decrement => {
            assembler.emit(format!("sub {}, 1", assembler.slot(operands[0].as_slot())));
        }
        Operation::CompareEqual
        | Operation::CompareNotEqual
        | Operation::CompareGreater
        | Operation::CompareLess
        | Operation::CompareGreaterOrEqual
        | Operation::CompareLessOrEqual => {
            let set = match instruction.operation {
                Operation::CompareEqual => "sete",
                Operation::CompareNotEqual => "setne",
                Operation::CompareGreater => "setg",
                Operation::CompareLess => "setl",
                Operation::CompareGreaterOrEqual => "setge",
                _ => "setle",
            };

            let lhs = assembler.load_slot(X86FullRegister::Rax, operands[1].as_slot());
            assembler.emit(format!("cmp {lhs}, {}", assembler.slot(operands[2].as_slot())));
            assembler.emit(format!("{set} {}", X86FullRegister::Rax.as_8_bit()));
            assembler.emit(format!(
                "movzx {lhs}, {}",
                X86FullRegister::Rax.as_8_bit()
            ));
            assembler.store_slot(operands[0].as_slot(), X86FullRegister::Rax);
        }
        Operation::Call => codegen_call(assembler, instruction),
        Operation::Return => {
            if let Some(value) = operands.first() {
                assembler.load_slot(X86FullRegister::Rax, value.as_slot());
            }

            assembler.function_epilogue();
        }
        Operation::Jump => {
            let Operand::Label(target) = operands[0] else {
                panic!("internal compiler error: jump expects a label");
            };

            assembler.emit(format!("jmp {}", graph.block(target).label));
        }
    }
}

/// The first six arguments go in registers, the rest are pushed right to
/// left as 8 byte stack entries
fn codegen_call(assembler: &mut Assembler, instruction: &Instruction) {
    let [destination, target, arguments @ ..] = instruction.operands.as_slice() else {
        panic!("internal compiler error: call without a destination and target");
    };

    let Operand::Function(target) = target else {
        panic!("internal compiler error: call target must be a function name");
    };

    let stack_arguments = arguments.get(REGISTER_PARAMETER_COUNT..).unwrap_or_default();

    // Pad so rsp stays 16 byte aligned once an odd number of entries is pushed
    let padding = if stack_arguments.len() % 2 == 1 { 8 } else { 0 };
    if padding > 0 {
        assembler.emit(format!("sub rsp, {padding}"));
    }

    for argument in stack_arguments.iter().rev() {
        assembler.load_slot(X86FullRegister::Rax, argument.as_slot());
        assembler.emit(format!("push {}", X86FullRegister::Rax.as_64_bit()));
    }

    for (register, argument) in X86FullRegister::ARGUMENTS.iter().zip(arguments) {
        assembler.load_slot(*register, argument.as_slot());
    }

    // No vector registers are used by variadic callees
    assembler.emit(format!("mov {}, 0", X86FullRegister::Rax.as_32_bit()));
    assembler.emit(format!("call {target}"));

    let pushed = 8 * stack_arguments.len() + padding;
    if pushed > 0 {
        assembler.emit(format!("add rsp, {pushed}"));
    }

    assembler.store_slot(destination.as_slot(), X86FullRegister::Rax);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frontend::{SourceFile, parser::Parser},
        middle::ir::ast_lowering::lower_translation_unit,
    };

    fn compile(source: &str, emit_comments: bool) -> String {
        let source = SourceFile::from_memory(source);
        let unit = Parser::parse_translation_unit(&source).unwrap();
        let module = lower_translation_unit(&unit);

        CodeGeneratorX86_64LinuxGnu.translate_to_asm(&module, &CodegenOptions { emit_comments })
    }

    fn indented(lines: &[&str]) -> String {
        lines.iter().map(|line| format!("    {line}\n")).collect()
    }

    #[test]
    fn emits_file_header_and_trailer() {
        let asm = compile("int main() { return 0; }", false);

        assert!(asm.starts_with("    .intel_syntax noprefix\n    .text\n"));
        assert!(asm.contains("    .globl main\n    .type main, @function\nmain:\n"));
        assert!(asm.trim_end().ends_with(r#".section .note.GNU-stack,"",@progbits"#));
    }

    #[test]
    fn prologue_rounds_frame_and_spills_parameters() {
        let asm = compile(
            "int add(int a, int b) { return a + b; } int main() { return add(1, 2); }",
            false,
        );

        let expected = format!(
            "add:\n{}",
            indented(&[
                "push rbp",
                "mov rbp, rsp",
                "sub rsp, 16",
                "mov DWORD PTR [rbp-4], edi",
                "mov DWORD PTR [rbp-8], esi",
            ])
        );
        assert!(asm.contains(&expected));
    }

    #[test]
    fn straight_line_return_computes_sum() {
        let asm = compile("int main() { int a = 2; int b = 3; return a + b; }", false);

        assert!(asm.contains(&indented(&[
            "mov eax, DWORD PTR [rbp-4]",
            "add eax, DWORD PTR [rbp-12]",
            "mov DWORD PTR [rbp-20], eax",
            "mov eax, DWORD PTR [rbp-20]",
            "mov rsp, rbp",
            "pop rbp",
            "ret",
        ])));
    }

    #[test]
    fn branches_compare_test_against_zero() {
        let asm = compile("int main() { int i = 0; while (i < 3) { i++; } return i; }", false);

        assert!(asm.contains("jmp .Lmain_1_while_test\n.Lmain_1_while_test:\n"));
        assert!(asm.contains("cmp DWORD PTR [rbp-12], 0\n    je .Lmain_3_while_out\n    jmp .Lmain_2_while_body\n"));
        assert!(asm.contains("add DWORD PTR [rbp-4], 1"));
    }

    #[test]
    fn external_calls_use_the_plt() {
        let asm = compile("int main() { putchar('A'); return 0; }", false);

        assert!(asm.contains("mov DWORD PTR [rbp-8], 65"));
        assert!(asm.contains("mov edi, DWORD PTR [rbp-8]\n    mov eax, 0\n    call putchar@PLT\n"));
    }

    #[test]
    fn extra_arguments_are_pushed_with_alignment() {
        let asm = compile(
            "int f(int a, int b, int c, int d, int e, int g, int h) { return h; } \
             int main() { return f(1, 2, 3, 4, 5, 6, 7); }",
            false,
        );

        assert!(asm.contains("    sub rsp, 8\n    mov eax, DWORD PTR [rbp-32]\n    push rax\n"));
        assert!(asm.contains("    call f\n    add rsp, 16\n"));
        // Seventh parameter is read from the caller's frame
        assert!(asm.contains("mov eax, DWORD PTR [rbp+16]"));
    }

    #[test]
    fn comments_describe_ir_instructions() {
        let asm = compile("int main() { return 7; }", true);

        assert!(asm.contains("# ldconst !t0, 7"));
        assert!(asm.contains("# ret !t0"));
        assert!(!asm.contains('\u{1b}'));
    }
}
