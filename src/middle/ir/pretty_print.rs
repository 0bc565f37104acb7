use std::fmt::Write;

use colored::Colorize;
use itertools::Itertools;

use super::{ControlFlowGraph, Instruction, Module, Operand, Terminator};

pub fn pretty_print_module(module: &Module) -> String {
    module.functions.iter().map(pretty_print_graph).join("\n")
}

pub fn pretty_print_graph(graph: &ControlFlowGraph) -> String {
    let mut out = String::new();

    let parameters = graph
        .parameters()
        .iter()
        .map(|slot| slot_name(graph, &Operand::Slot(*slot)))
        .join(", ");

    let _ = writeln!(
        out,
        "{} {}{}{}{}",
        "fn".magenta(),
        graph.name.value().blue(),
        "(".white(),
        parameters,
        ") {".white()
    );

    for (slot, entry) in graph.symbols() {
        let _ = writeln!(
            out,
            "    {} {} {} {}",
            "slot".bright_black(),
            slot_name(graph, &Operand::Slot(slot)),
            entry.ty.to_string().green(),
            format!("[{:+}]", entry.frame_offset).bright_black()
        );
    }

    for (_, block) in graph.blocks() {
        let _ = writeln!(out, "{}", format!("{}:", block.label).bright_red());

        for instruction in &block.instructions {
            let _ = writeln!(out, "    {}", display_instruction(graph, instruction));
        }

        let terminator = match block.terminator() {
            Terminator::Return => format!("{}", "-> exit".bright_black()),
            Terminator::Jump(target) => format!(
                "{} {}",
                "->".bright_black(),
                graph.block(target).label.blue()
            ),
            Terminator::Branch {
                test,
                on_true,
                on_false,
            } => format!(
                "{} {} {} {} {}",
                "->".bright_black(),
                slot_name(graph, &Operand::Slot(test)),
                graph.block(on_true).label.blue(),
                "else".bright_black(),
                graph.block(on_false).label.blue()
            ),
        };

        let _ = writeln!(out, "    {terminator}");
    }

    let _ = writeln!(out, "{}", "}".white());

    out
}

/// `mnemonic operand, operand, ...` with slots shown by name
pub fn display_instruction(graph: &ControlFlowGraph, instruction: &Instruction) -> String {
    let operands = instruction
        .operands
        .iter()
        .map(|operand| slot_name(graph, operand))
        .join(", ");

    if operands.is_empty() {
        return instruction.operation.to_string().cyan().to_string();
    }

    format!("{} {operands}", instruction.operation.to_string().cyan())
}

fn slot_name(graph: &ControlFlowGraph, operand: &Operand) -> String {
    match operand {
        Operand::Slot(slot) => graph.symbol(*slot).name.value().yellow().to_string(),
        Operand::Literal(value) => value.to_string().purple().to_string(),
        Operand::Label(block) => graph.block(*block).label.blue().to_string(),
        Operand::Function(name) => name.blue().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frontend::intern::InternedSymbol,
        middle::ir::{Operation, Type},
    };

    #[test]
    fn prints_blocks_instructions_and_exits() {
        let mut graph = ControlFlowGraph::new(InternedSymbol::new("main"));
        graph.push_scope();
        let x = graph.declare_variable(InternedSymbol::new("x"), Type::Int);
        graph.emit(Operation::LoadConstant, vec![Operand::Slot(x), Operand::Literal(7)]);
        graph.emit(Operation::Return, vec![Operand::Slot(x)]);

        let printed = strip_ansi_escapes::strip_str(pretty_print_graph(&graph));

        assert!(printed.starts_with("fn main() {"));
        assert!(printed.contains("slot x int [-4]"));
        assert!(printed.contains(".Lmain_0_entry:\n    ldconst x, 7\n    ret x\n    -> exit"));
    }
}
