//! Lowers each function of a validated syntax tree into a control flow graph.
//!
//! Every sub-expression evaluates into a fresh temporary, except bare
//! identifiers which hand back their own slot. Structured control flow is
//! encoded in successor links; the block a construct ends in always starts
//! with no successors so the enclosing construct can link it onwards.

use hashbrown::HashSet;

use super::{BlockId, ControlFlowGraph, Module, Operand, Operation, Slot, Type};
use crate::frontend::{
    ast::{
        self, BinaryOperatorKind, ExpressionKind, Fixity, ForInitializer, IncrementKind,
        LiteralKind, StatementKind,
    },
    intern::InternedSymbol,
};

/// Suffix marking a call target as resolved by the dynamic linker
pub const EXTERNAL_CALL_SUFFIX: &str = "@PLT";

pub fn lower_translation_unit(unit: &ast::TranslationUnit) -> Module {
    let defined_functions: HashSet<InternedSymbol> =
        unit.functions.iter().map(|f| f.name.symbol).collect();

    let functions = unit
        .functions
        .iter()
        .map(|function| FunctionLoweringContext::lower(function, &defined_functions))
        .collect();

    Module { functions }
}

#[derive(Debug, Clone, Copy)]
struct LoopTargets {
    continue_target: BlockId,
    break_target: BlockId,
}

struct FunctionLoweringContext<'a> {
    graph: ControlFlowGraph,
    defined_functions: &'a HashSet<InternedSymbol>,
    loops: Vec<LoopTargets>,
}

impl<'a> FunctionLoweringContext<'a> {
    fn lower(
        function: &ast::FunctionDefinition,
        defined_functions: &'a HashSet<InternedSymbol>,
    ) -> ControlFlowGraph {
        let mut ctx = Self {
            graph: ControlFlowGraph::new(function.name.symbol),
            defined_functions,
            loops: Vec::new(),
        };

        for (position, parameter) in function.parameters.iter().enumerate() {
            ctx.graph
                .declare_parameter(parameter.name.symbol, Type::Int, position);
        }

        // The body's own scope sits directly above the parameters
        ctx.graph.push_scope();
        for statement in &function.body.statements {
            ctx.lower_statement(statement);
        }
        ctx.graph.pop_scope();

        log::debug!(
            "lowered `{}` into {} blocks and {} bytes of locals",
            function.name.symbol,
            ctx.graph.block_count(),
            ctx.graph.locals_size()
        );

        ctx.graph
    }

    #[track_caller]
    fn lookup(&self, name: InternedSymbol) -> Slot {
        match self.graph.lookup(name) {
            Some(slot) => slot,
            None => panic!(
                "internal compiler error: `{name}` is not declared in `{}` but passed validation",
                self.graph.name
            ),
        }
    }

    fn temporary(&mut self) -> Slot {
        let name = self.graph.new_temporary(Type::Int);
        self.lookup(name)
    }

    /// Appends a block and makes it the target of new instructions
    fn enter_block(&mut self, block: BlockId) {
        self.graph.append_block(block);
        self.graph.current_block = block;
    }

    fn jump_from_current(&mut self, target: BlockId) {
        self.graph.set_jump(self.graph.current_block, target);
    }

    fn lower_block(&mut self, block: &ast::Block) {
        self.graph.push_scope();
        for statement in &block.statements {
            self.lower_statement(statement);
        }
        self.graph.pop_scope();
    }

    fn lower_declarations(&mut self, declarations: &[ast::Declaration]) {
        for declaration in declarations {
            // Declared before the initializer is evaluated, as in C
            let slot = self
                .graph
                .declare_variable(declaration.name.symbol, Type::Int);

            if let Some(initializer) = &declaration.initializer {
                let value = self.lower_expression(initializer);
                self.graph.emit(
                    Operation::CopyVariable,
                    vec![Operand::Slot(slot), Operand::Slot(value)],
                );
            }
        }
    }

    fn lower_statement(&mut self, statement: &ast::Statement) {
        match &statement.kind {
            StatementKind::Declaration(declarations) => self.lower_declarations(declarations),
            StatementKind::Expression(expression) => {
                self.lower_expression(expression);
            }
            StatementKind::Block(block) => self.lower_block(block),
            StatementKind::If {
                condition,
                positive,
                negative,
            } => self.lower_if(condition, positive, negative.as_deref()),
            StatementKind::While { condition, body } => self.lower_while(condition, body),
            StatementKind::DoWhile { body, condition } => self.lower_do_while(body, condition),
            StatementKind::For {
                initializer,
                test,
                after,
                body,
            } => self.lower_for(
                initializer.as_ref(),
                test.as_deref(),
                after.as_deref(),
                body,
            ),
            StatementKind::Break => {
                let targets = self.innermost_loop("break");
                self.graph
                    .emit(Operation::Jump, vec![Operand::Label(targets.break_target)]);
            }
            StatementKind::Continue => {
                let targets = self.innermost_loop("continue");
                self.graph.emit(
                    Operation::Jump,
                    vec![Operand::Label(targets.continue_target)],
                );
            }
            StatementKind::Return(value) => {
                let operands = match value {
                    Some(value) => vec![Operand::Slot(self.lower_expression(value))],
                    None => Vec::new(),
                };

                self.graph.emit(Operation::Return, operands);
            }
            StatementKind::Empty => {}
        }
    }

    fn innermost_loop(&self, keyword: &str) -> LoopTargets {
        match self.loops.last() {
            Some(targets) => *targets,
            None => panic!("internal compiler error: `{keyword}` outside of a loop passed validation"),
        }
    }

    fn lower_if(
        &mut self,
        condition: &ast::Expression,
        positive: &ast::Statement,
        negative: Option<&ast::Statement>,
    ) {
        let test = self.lower_expression(condition);
        let test_block = self.graph.current_block;

        let true_block = self.graph.create_block("if_true");
        let false_block = negative.map(|_| self.graph.create_block("if_false"));
        let out_block = self.graph.create_block("if_out");

        self.graph.set_branch(
            test_block,
            test,
            true_block,
            false_block.unwrap_or(out_block),
        );

        self.enter_block(true_block);
        self.lower_statement(positive);
        self.jump_from_current(out_block);

        if let (Some(false_block), Some(negative)) = (false_block, negative) {
            self.enter_block(false_block);
            self.lower_statement(negative);
            self.jump_from_current(out_block);
        }

        self.enter_block(out_block);
    }

    fn lower_loop_body(&mut self, body: &ast::Statement, targets: LoopTargets) {
        self.loops.push(targets);
        self.lower_statement(body);
        self.loops.pop();
    }

    fn lower_while(&mut self, condition: &ast::Expression, body: &ast::Statement) {
        let test_block = self.graph.create_block("while_test");
        let body_block = self.graph.create_block("while_body");
        let out_block = self.graph.create_block("while_out");

        self.jump_from_current(test_block);

        self.enter_block(test_block);
        let test = self.lower_expression(condition);
        // The condition may itself have split into several blocks
        self.graph
            .set_branch(self.graph.current_block, test, body_block, out_block);

        self.enter_block(body_block);
        self.lower_loop_body(
            body,
            LoopTargets {
                continue_target: test_block,
                break_target: out_block,
            },
        );
        self.jump_from_current(test_block);

        self.enter_block(out_block);
    }

    fn lower_do_while(&mut self, body: &ast::Statement, condition: &ast::Expression) {
        let body_block = self.graph.create_block("do_body");
        let test_block = self.graph.create_block("do_test");
        let out_block = self.graph.create_block("do_out");

        self.jump_from_current(body_block);

        self.enter_block(body_block);
        self.lower_loop_body(
            body,
            LoopTargets {
                continue_target: test_block,
                break_target: out_block,
            },
        );
        self.jump_from_current(test_block);

        self.enter_block(test_block);
        let test = self.lower_expression(condition);
        self.graph
            .set_branch(self.graph.current_block, test, body_block, out_block);

        self.enter_block(out_block);
    }

    fn lower_for(
        &mut self,
        initializer: Option<&ForInitializer>,
        condition: Option<&ast::Expression>,
        after: Option<&ast::Expression>,
        body: &ast::Statement,
    ) {
        // Variables declared by the initializer belong to the loop
        self.graph.push_scope();

        match initializer {
            Some(ForInitializer::Declaration(declarations)) => {
                self.lower_declarations(declarations)
            }
            Some(ForInitializer::Expression(expression)) => {
                self.lower_expression(expression);
            }
            None => {}
        }

        let test_block = self.graph.create_block("for_test");
        let body_block = self.graph.create_block("for_body");
        let after_block = after.map(|_| self.graph.create_block("for_after"));
        let out_block = self.graph.create_block("for_out");

        self.jump_from_current(test_block);

        self.enter_block(test_block);
        match condition {
            Some(condition) => {
                let test = self.lower_expression(condition);
                self.graph
                    .set_branch(self.graph.current_block, test, body_block, out_block);
            }
            // Only a `break` leaves a loop without a test
            None => self.jump_from_current(body_block),
        }

        self.enter_block(body_block);
        self.lower_loop_body(
            body,
            LoopTargets {
                continue_target: after_block.unwrap_or(test_block),
                break_target: out_block,
            },
        );

        if let (Some(after_block), Some(after)) = (after_block, after) {
            self.jump_from_current(after_block);
            self.enter_block(after_block);
            self.lower_expression(after);
        }
        self.jump_from_current(test_block);

        self.enter_block(out_block);

        self.graph.pop_scope();
    }

    /// Returns the slot holding the value of the expression
    fn lower_expression(&mut self, expression: &ast::Expression) -> Slot {
        match &expression.kind {
            ExpressionKind::Literal(literal) => {
                let value = match literal.kind {
                    LiteralKind::Integer => parse_integer_literal(literal.symbol),
                    LiteralKind::Char => char_literal_value(literal.symbol),
                };

                let destination = self.temporary();
                self.graph.emit(
                    Operation::LoadConstant,
                    vec![Operand::Slot(destination), Operand::Literal(value)],
                );

                destination
            }
            ExpressionKind::Identifier(identifier) => self.lookup(identifier.symbol),
            ExpressionKind::Grouping(inner) => self.lower_expression(inner),
            ExpressionKind::FunctionCall { callee, arguments } => {
                let destination = self.temporary();

                let target = if self.defined_functions.contains(&callee.symbol) {
                    callee.symbol.value().to_string()
                } else {
                    format!("{}{EXTERNAL_CALL_SUFFIX}", callee.symbol)
                };

                let mut operands = vec![Operand::Slot(destination), Operand::Function(target)];
                for argument in arguments {
                    operands.push(Operand::Slot(self.lower_expression(argument)));
                }

                self.graph.emit(Operation::Call, operands);

                destination
            }
            ExpressionKind::Binary { lhs, operator, rhs } => match operator.kind {
                BinaryOperatorKind::LogicalAnd | BinaryOperatorKind::LogicalOr => {
                    self.lower_short_circuit(operator.kind, lhs, rhs)
                }
                kind => {
                    let Some(operation) = Operation::from_binary_operator(kind) else {
                        unreachable!("{kind} has an instruction");
                    };

                    let destination = self.temporary();
                    let lhs = self.lower_expression(lhs);
                    let rhs = self.lower_expression(rhs);

                    self.graph.emit(
                        operation,
                        vec![
                            Operand::Slot(destination),
                            Operand::Slot(lhs),
                            Operand::Slot(rhs),
                        ],
                    );

                    destination
                }
            },
            ExpressionKind::Unary { operator, operand } => {
                let value = self.lower_expression(operand);

                // Unary operations work in place, so never on the source slot
                let destination = self.temporary();
                self.graph.emit(
                    Operation::CopyVariable,
                    vec![Operand::Slot(destination), Operand::Slot(value)],
                );
                self.graph.emit(
                    Operation::from_unary_operator(operator.kind),
                    vec![Operand::Slot(destination)],
                );

                destination
            }
            ExpressionKind::Increment {
                kind,
                fixity,
                target,
            } => {
                let variable = self.lookup(target.symbol);
                let operation = match kind {
                    IncrementKind::Increment => Operation::Increment,
                    IncrementKind::Decrement => Operation::Decrement,
                };

                let destination = self.temporary();
                let copy = vec![Operand::Slot(destination), Operand::Slot(variable)];

                match fixity {
                    Fixity::Prefix => {
                        self.graph.emit(operation, vec![Operand::Slot(variable)]);
                        self.graph.emit(Operation::CopyVariable, copy);
                    }
                    Fixity::Postfix => {
                        self.graph.emit(Operation::CopyVariable, copy);
                        self.graph.emit(operation, vec![Operand::Slot(variable)]);
                    }
                }

                destination
            }
            ExpressionKind::Assignment {
                target,
                operator,
                value,
            } => {
                let value = self.lower_expression(value);
                let target = self.lookup(target.symbol);

                match operator {
                    None => self.graph.emit(
                        Operation::CopyVariable,
                        vec![Operand::Slot(target), Operand::Slot(value)],
                    ),
                    Some(operator) => self.graph.emit(
                        Operation::from_assignment_operator(operator.kind),
                        vec![
                            Operand::Slot(target),
                            Operand::Slot(target),
                            Operand::Slot(value),
                        ],
                    ),
                }

                target
            }
        }
    }

    /// `a && b` / `a || b`. The result starts at 0 and is set to 1 on the
    /// path where the whole expression holds. Both paths meet in a fresh
    /// block with no successors, which becomes the current block.
    fn lower_short_circuit(
        &mut self,
        operator: BinaryOperatorKind,
        lhs: &ast::Expression,
        rhs: &ast::Expression,
    ) -> Slot {
        let result = self.temporary();
        self.graph.emit(
            Operation::LoadConstant,
            vec![Operand::Slot(result), Operand::Literal(0)],
        );

        let lhs = self.lower_expression(lhs);

        let (rhs_tag, true_tag, out_tag) = match operator {
            BinaryOperatorKind::LogicalAnd => ("and_rhs", "and_true", "and_out"),
            _ => ("or_rhs", "or_true", "or_out"),
        };

        let rhs_block = self.graph.create_block(rhs_tag);
        let true_block = self.graph.create_block(true_tag);
        let out_block = self.graph.create_block(out_tag);

        let lhs_block = self.graph.current_block;
        match operator {
            // A false lhs decides `&&`, a true one decides `||`
            BinaryOperatorKind::LogicalAnd => {
                self.graph.set_branch(lhs_block, lhs, rhs_block, out_block)
            }
            _ => self.graph.set_branch(lhs_block, lhs, true_block, rhs_block),
        }

        self.enter_block(rhs_block);
        let rhs = self.lower_expression(rhs);
        self.graph
            .set_branch(self.graph.current_block, rhs, true_block, out_block);

        self.enter_block(true_block);
        self.graph.emit(
            Operation::LoadConstant,
            vec![Operand::Slot(result), Operand::Literal(1)],
        );
        self.jump_from_current(out_block);

        self.enter_block(out_block);

        result
    }
}

/// Wraps to 32 bits, so the magnitude 2^31 (only accepted under a unary
/// minus) becomes `i32::MIN`, which negates to itself
fn parse_integer_literal(symbol: InternedSymbol) -> i32 {
    match symbol.value().parse::<i64>() {
        Ok(value) => value as i32,
        Err(e) => panic!("internal compiler error: invalid integer literal {symbol}: {e}"),
    }
}

/// Ordinal value of a character literal such as `'a'` or `'\n'`
pub fn char_literal_value(symbol: InternedSymbol) -> i32 {
    let text = symbol.value();
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);

    let mut chars = inner.chars();

    let value = match (chars.next(), chars.next()) {
        (Some('\\'), Some(escaped)) => match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            other => other,
        },
        (Some(c), _) => c,
        (None, _) => panic!("internal compiler error: empty character literal"),
    };

    value as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frontend::{SourceFile, parser::Parser},
        middle::ir::{Instruction, Terminator},
    };

    fn lower(source: &str) -> Module {
        let source: &'static SourceFile = Box::leak(Box::new(SourceFile::from_memory(source)));
        let unit = Parser::parse_translation_unit(source).unwrap();
        lower_translation_unit(&unit)
    }

    fn operations(graph: &ControlFlowGraph) -> Vec<Operation> {
        graph
            .blocks()
            .flat_map(|(_, block)| block.instructions.iter().map(|i: &Instruction| i.operation))
            .collect()
    }

    fn assert_valid_shapes(graph: &ControlFlowGraph) {
        for (_, block) in graph.blocks() {
            // Panics on a malformed shape
            block.terminator();
        }
    }

    #[test]
    fn straight_line_code_is_one_block() {
        let module = lower("int main() { int a = 1; int b = 2; return a + b; }");
        let graph = &module.functions[0];

        assert_eq!(graph.block_count(), 1);
        assert_eq!(
            operations(graph),
            vec![
                Operation::LoadConstant,
                Operation::CopyVariable,
                Operation::LoadConstant,
                Operation::CopyVariable,
                Operation::Add,
                Operation::Return,
            ]
        );
    }

    #[test]
    fn binary_destination_is_allocated_before_operands() {
        let module = lower("int main() { int a = 1; return a * 2; }");
        let graph = &module.functions[0];
        let block = graph.block(graph.entry());

        let multiply = &block.instructions[3];
        assert_eq!(multiply.operation, Operation::Multiply);

        let destination = graph.symbol(multiply.operands[0].as_slot());
        let literal = graph.symbol(multiply.operands[2].as_slot());
        assert!(destination.frame_offset > literal.frame_offset);
    }

    #[test]
    fn while_loop_builds_test_body_and_out() {
        let module = lower("int main() { int i = 0; while (i < 3) { i++; } return i; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let blocks: Vec<_> = graph.blocks().collect();
        assert_eq!(blocks.len(), 4);

        let (entry, test, body, out) = (blocks[0].0, blocks[1].0, blocks[2].0, blocks[3].0);
        assert_eq!(graph.block(entry).terminator(), Terminator::Jump(test));
        assert!(matches!(
            graph.block(test).terminator(),
            Terminator::Branch { on_true, on_false, .. } if on_true == body && on_false == out
        ));
        assert_eq!(graph.block(body).terminator(), Terminator::Jump(test));
        assert_eq!(graph.block(out).terminator(), Terminator::Return);
    }

    fn block_tagged(graph: &ControlFlowGraph, tag: &str) -> BlockId {
        graph
            .blocks()
            .find(|(_, b)| b.label.ends_with(tag))
            .map(|(id, _)| id)
            .unwrap()
    }

    fn jump_targets(graph: &ControlFlowGraph) -> Vec<Operand> {
        graph
            .blocks()
            .flat_map(|(_, b)| b.instructions.iter())
            .filter(|i| i.operation == Operation::Jump)
            .map(|i| i.operands[0].clone())
            .collect()
    }

    #[test]
    fn do_while_runs_body_before_test() {
        let module = lower(
            "int main() { int i = 0; do { i++; if (i == 2) continue; } while (i < 3); return i; }",
        );
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let body = block_tagged(graph, "do_body");
        let test = block_tagged(graph, "do_test");
        let out = block_tagged(graph, "do_out");
        let if_out = block_tagged(graph, "if_out");

        assert_eq!(graph.block(graph.entry()).terminator(), Terminator::Jump(body));
        assert_eq!(graph.block(if_out).terminator(), Terminator::Jump(test));
        assert!(matches!(
            graph.block(test).terminator(),
            Terminator::Branch { on_true, on_false, .. } if on_true == body && on_false == out
        ));
        assert_eq!(graph.block(out).terminator(), Terminator::Return);

        assert_eq!(jump_targets(graph), vec![Operand::Label(test)]);
    }

    #[test]
    fn for_without_after_clause_continues_at_test() {
        let module =
            lower("int main() { int s = 0; for (int i = 0; i < 3;) { i++; continue; } return s; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        assert!(graph.blocks().all(|(_, b)| !b.label.ends_with("for_after")));

        let test = block_tagged(graph, "for_test");
        let body = block_tagged(graph, "for_body");

        assert_eq!(jump_targets(graph), vec![Operand::Label(test)]);
        assert_eq!(graph.block(body).terminator(), Terminator::Jump(test));
    }

    #[test]
    fn if_without_else_branches_to_out() {
        let module = lower("int main() { int x = 1; if (x) { x = 2; } return x; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let blocks: Vec<_> = graph.blocks().map(|(id, _)| id).collect();
        assert_eq!(blocks.len(), 3);
        assert!(matches!(
            graph.block(blocks[0]).terminator(),
            Terminator::Branch { on_true, on_false, .. } if on_true == blocks[1] && on_false == blocks[2]
        ));
        assert_eq!(graph.block(blocks[1]).terminator(), Terminator::Jump(blocks[2]));
    }

    #[test]
    fn if_else_creates_false_block() {
        let module = lower("int main() { int x = 1; if (x) x = 2; else x = 3; return x; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let labels: Vec<_> = graph.blocks().map(|(_, b)| b.label.clone()).collect();
        assert_eq!(
            labels,
            vec![
                ".Lmain_0_entry",
                ".Lmain_1_if_true",
                ".Lmain_2_if_false",
                ".Lmain_3_if_out"
            ]
        );
    }

    #[test]
    fn for_loop_continue_targets_after_block() {
        let module = lower(
            "int main() { int s = 0; for (int i = 0; i < 4; i++) { if (i == 2) continue; s += i; } return s; }",
        );
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let after = graph
            .blocks()
            .find(|(_, b)| b.label.ends_with("for_after"))
            .map(|(id, _)| id)
            .unwrap();

        let jumps: Vec<_> = graph
            .blocks()
            .flat_map(|(_, b)| b.instructions.iter())
            .filter(|i| i.operation == Operation::Jump)
            .collect();

        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].operands, vec![Operand::Label(after)]);
    }

    #[test]
    fn for_without_test_loops_unconditionally() {
        let module = lower("int main() { for (;;) { break; } return 0; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let (test, test_block) = graph
            .blocks()
            .find(|(_, b)| b.label.ends_with("for_test"))
            .unwrap();
        let body = graph
            .blocks()
            .find(|(_, b)| b.label.ends_with("for_body"))
            .map(|(id, _)| id)
            .unwrap();

        assert_eq!(test_block.terminator(), Terminator::Jump(body));
        assert_eq!(graph.block(body).terminator(), Terminator::Jump(test));
    }

    #[test]
    fn short_circuit_merges_into_fresh_block() {
        let module = lower("int main() { int a = 1; int b = 0; int c = a && b; return c; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let labels: Vec<_> = graph.blocks().map(|(_, b)| b.label.clone()).collect();
        assert_eq!(
            labels,
            vec![
                ".Lmain_0_entry",
                ".Lmain_1_and_rhs",
                ".Lmain_2_and_true",
                ".Lmain_3_and_out"
            ]
        );

        // The copy into `c` and the return land after the merge
        let out = graph.blocks().last().unwrap().1;
        assert_eq!(out.terminator(), Terminator::Return);
        assert_eq!(
            out.instructions
                .iter()
                .map(|i| i.operation)
                .collect::<Vec<_>>(),
            vec![Operation::CopyVariable, Operation::Return]
        );
    }

    #[test]
    fn short_circuit_in_loop_condition_branches_from_merge_block() {
        let module = lower("int main() { int i = 0; while (i < 3 || i == 7) i++; return i; }");
        let graph = &module.functions[0];
        assert_valid_shapes(graph);

        let or_out = graph
            .blocks()
            .find(|(_, b)| b.label.ends_with("or_out"))
            .unwrap()
            .1;
        let body = graph
            .blocks()
            .find(|(_, b)| b.label.ends_with("while_body"))
            .map(|(id, _)| id)
            .unwrap();

        assert!(matches!(
            or_out.terminator(),
            Terminator::Branch { on_true, .. } if on_true == body
        ));
    }

    #[test]
    fn calls_to_undefined_functions_are_external() {
        let module = lower("int f(int x) { return x; } int main() { putchar(65); return f(1); }");
        let graph = &module.functions[1];

        let targets: Vec<_> = graph
            .blocks()
            .flat_map(|(_, b)| b.instructions.iter())
            .filter(|i| i.operation == Operation::Call)
            .map(|i| i.operands[1].clone())
            .collect();

        assert_eq!(
            targets,
            vec![
                Operand::Function("putchar@PLT".to_string()),
                Operand::Function("f".to_string())
            ]
        );
    }

    #[test]
    fn compound_assignment_writes_target_in_place() {
        let module = lower("int main() { int x = 1; x <<= 2; return x; }");
        let graph = &module.functions[0];
        let x = graph.lookup_for_test("x");

        let shift = graph
            .block(graph.entry())
            .instructions
            .iter()
            .find(|i| i.operation == Operation::ShiftLeft)
            .unwrap();

        assert_eq!(shift.operands[0], Operand::Slot(x));
        assert_eq!(shift.operands[1], Operand::Slot(x));
    }

    #[test]
    fn postfix_increment_copies_before_incrementing() {
        let module = lower("int main() { int x = 1; int y = x++; return y; }");
        let ops = operations(&module.functions[0]);

        let increment = ops.iter().position(|o| *o == Operation::Increment).unwrap();
        assert_eq!(ops[increment - 1], Operation::CopyVariable);
    }

    #[test]
    fn char_literals_lower_to_ordinals() {
        assert_eq!(char_literal_value(InternedSymbol::new("'A'")), 65);
        assert_eq!(char_literal_value(InternedSymbol::new(r"'\n'")), 10);
        assert_eq!(char_literal_value(InternedSymbol::new(r"'\\'")), 92);
        assert_eq!(char_literal_value(InternedSymbol::new(r"'\''")), 39);
        assert_eq!(char_literal_value(InternedSymbol::new("'é'")), 233);
    }

    #[test]
    fn most_negative_int_literal_wraps_before_negation() {
        let module = lower("int main() { return -2147483648; }");
        let graph = &module.functions[0];
        let instructions = &graph.block(graph.entry()).instructions;

        assert_eq!(instructions[0].operation, Operation::LoadConstant);
        assert_eq!(instructions[0].operands[1], Operand::Literal(i32::MIN));
        assert_eq!(
            operations(graph),
            vec![
                Operation::LoadConstant,
                Operation::CopyVariable,
                Operation::Negate,
                Operation::Return,
            ]
        );
    }

    #[test]
    fn empty_return_has_no_operand() {
        let module = lower("void f() { return; } int main() { f(); return 0; }");
        let graph = &module.functions[0];

        let ret = &graph.block(graph.entry()).instructions[0];
        assert_eq!(ret.operation, Operation::Return);
        assert!(ret.operands.is_empty());
    }

    impl ControlFlowGraph {
        /// Finds a source variable by name regardless of scope
        fn lookup_for_test(&self, name: &str) -> Slot {
            self.symbols()
                .find(|(_, entry)| entry.name.value() == name)
                .map(|(slot, _)| slot)
                .unwrap()
        }
    }
}
