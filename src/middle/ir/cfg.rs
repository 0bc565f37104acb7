use hashbrown::HashMap;

use super::{Instruction, Operand, Operation, Type};
use crate::{
    frontend::intern::InternedSymbol,
    index::{Index, IndexVec},
};

crate::simple_index! {
    /// Identifies a basic block within its function's graph
    pub struct BlockId;
}

crate::simple_index! {
    /// Identifies a symbol table entry (local, parameter or temporary)
    pub struct Slot;
}

/// Offset handed to the first local. Locals grow downwards from here.
const FIRST_LOCAL_OFFSET: i32 = -4;

/// Offset of the seventh parameter, just above the saved frame pointer and
/// return address
const FIRST_STACK_PARAMETER_OFFSET: i32 = 16;

pub const REGISTER_PARAMETER_COUNT: usize = 6;

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: InternedSymbol,
    pub ty: Type,
    /// Byte displacement from the frame base
    pub frame_offset: i32,
}

#[derive(Debug)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub exit_true: Option<BlockId>,
    pub exit_false: Option<BlockId>,
    /// Read only when both exits are set
    pub test: Option<Slot>,
}

/// How control leaves a block, decoded from its successor links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Falls into the function epilogue
    Return,
    Jump(BlockId),
    Branch {
        test: Slot,
        on_true: BlockId,
        on_false: BlockId,
    },
}

impl BasicBlock {
    fn new(label: String) -> Self {
        Self {
            label,
            instructions: Vec::new(),
            exit_true: None,
            exit_false: None,
            test: None,
        }
    }

    #[track_caller]
    pub fn terminator(&self) -> Terminator {
        match (self.exit_true, self.exit_false, self.test) {
            (None, None, _) => Terminator::Return,
            (Some(target), None, _) => Terminator::Jump(target),
            (Some(on_true), Some(on_false), Some(test)) => Terminator::Branch {
                test,
                on_true,
                on_false,
            },
            _ => panic!(
                "internal compiler error: block {} has a malformed successor shape",
                self.label
            ),
        }
    }
}

/// A function's graph. Owns its blocks, which link to each other by id, and
/// the symbol table those blocks' instructions refer to.
#[derive(Debug)]
pub struct ControlFlowGraph {
    pub name: InternedSymbol,
    /// Where new instructions land during lowering
    pub current_block: BlockId,
    blocks: IndexVec<BlockId, BasicBlock>,
    /// Blocks in the order they were appended, which is emission order
    order: Vec<BlockId>,
    symbols: IndexVec<Slot, SymbolEntry>,
    scopes: Vec<HashMap<InternedSymbol, Slot>>,
    parameters: Vec<Slot>,
    next_frame_offset: i32,
    next_block_number: usize,
    next_temporary_number: usize,
}

impl ControlFlowGraph {
    /// Creates the graph with its entry block and an empty parameter scope.
    /// The function's own label is emitted ahead of the entry block and is not
    /// a block, so a lone `while` loop gives four blocks: entry, test, body
    /// and out.
    pub fn new(name: InternedSymbol) -> Self {
        let mut graph = Self {
            name,
            current_block: BlockId::new(0),
            blocks: IndexVec::new(),
            order: Vec::new(),
            symbols: IndexVec::new(),
            scopes: vec![HashMap::new()],
            parameters: Vec::new(),
            next_frame_offset: FIRST_LOCAL_OFFSET,
            next_block_number: 0,
            next_temporary_number: 0,
        };

        let entry = graph.create_block("entry");
        graph.append_block(entry);
        graph.current_block = entry;

        graph
    }

    pub fn entry(&self) -> BlockId {
        self.order[0]
    }

    /// Allocates a block with a fresh label. It is not part of the emission
    /// order until appended.
    pub fn create_block(&mut self, tag: &str) -> BlockId {
        let label = format!(".L{}_{}_{}", self.name, self.next_block_number, tag);
        self.next_block_number += 1;

        self.blocks.push(BasicBlock::new(label))
    }

    pub fn append_block(&mut self, block: BlockId) {
        assert!(
            !self.order.contains(&block),
            "internal compiler error: block {} appended twice",
            self.blocks[block].label
        );

        self.order.push(block);
    }

    #[track_caller]
    pub fn append_instruction(&mut self, block: BlockId, operation: Operation, operands: Vec<Operand>) {
        self.blocks[block]
            .instructions
            .push(Instruction::new(operation, operands));
    }

    /// Appends to the current block
    #[track_caller]
    pub fn emit(&mut self, operation: Operation, operands: Vec<Operand>) {
        self.append_instruction(self.current_block, operation, operands);
    }

    pub fn set_jump(&mut self, block: BlockId, target: BlockId) {
        let block = &mut self.blocks[block];

        block.exit_true = Some(target);
        block.exit_false = None;
        block.test = None;
    }

    pub fn set_branch(&mut self, block: BlockId, test: Slot, on_true: BlockId, on_false: BlockId) {
        let block = &mut self.blocks[block];

        block.exit_true = Some(on_true);
        block.exit_false = Some(on_false);
        block.test = Some(test);
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }

    /// Appended blocks in emission order
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.order.iter().map(|id| (*id, &self.blocks[*id]))
    }

    pub fn block_count(&self) -> usize {
        self.order.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        assert!(
            self.scopes.len() > 1,
            "internal compiler error: popped the parameter scope of {}",
            self.name
        );

        self.scopes.pop();
    }

    fn insert_symbol(&mut self, name: InternedSymbol, ty: Type, frame_offset: i32) -> Slot {
        assert_ne!(
            ty,
            Type::Void,
            "internal compiler error: `{name}` declared with type void"
        );

        let scope_depth = self.scopes.len();
        let Some(scope) = self.scopes.last_mut() else {
            unreachable!("the parameter scope is never popped");
        };

        if scope.contains_key(&name) {
            panic!("internal compiler error: `{name}` declared twice in the same scope");
        }

        let slot = self.symbols.push(SymbolEntry {
            name,
            ty,
            frame_offset,
        });
        scope.insert(name, slot);

        // The function body's outermost block may not hide a parameter
        if scope_depth == 2 && self.scopes[0].contains_key(&name) {
            panic!("internal compiler error: `{name}` shadows a parameter of {}", self.name);
        }

        slot
    }

    pub fn declare_variable(&mut self, name: InternedSymbol, ty: Type) -> Slot {
        let frame_offset = self.next_frame_offset;
        let slot = self.insert_symbol(name, ty, frame_offset);

        self.next_frame_offset -= ty.size_bytes();

        slot
    }

    /// Parameters must be declared in position order before any local
    pub fn declare_parameter(&mut self, name: InternedSymbol, ty: Type, position: usize) -> Slot {
        assert_eq!(
            self.scopes.len(),
            1,
            "internal compiler error: parameters must be declared in the parameter scope"
        );

        let slot = if position < REGISTER_PARAMETER_COUNT {
            let frame_offset = FIRST_LOCAL_OFFSET - (position as i32) * ty.size_bytes();

            assert_eq!(
                frame_offset, self.next_frame_offset,
                "internal compiler error: parameter {position} of {} declared out of order",
                self.name
            );

            let slot = self.insert_symbol(name, ty, frame_offset);
            self.next_frame_offset -= ty.size_bytes();
            slot
        } else {
            let frame_offset =
                FIRST_STACK_PARAMETER_OFFSET + 8 * (position - REGISTER_PARAMETER_COUNT) as i32;

            self.insert_symbol(name, ty, frame_offset)
        };

        self.parameters.push(slot);
        slot
    }

    /// Declares a compiler generated variable in the current scope and
    /// returns its name. The name can never collide with a source identifier.
    pub fn new_temporary(&mut self, ty: Type) -> InternedSymbol {
        let name = InternedSymbol::new(&format!("!t{}", self.next_temporary_number));
        self.next_temporary_number += 1;

        self.declare_variable(name, ty);

        name
    }

    /// Innermost declaration of `name` visible from the current scope
    pub fn lookup(&self, name: InternedSymbol) -> Option<Slot> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    pub fn symbol(&self, slot: Slot) -> &SymbolEntry {
        &self.symbols[slot]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (Slot, &SymbolEntry)> {
        self.symbols.enumerate()
    }

    pub fn parameters(&self) -> &[Slot] {
        &self.parameters
    }

    /// Bytes below the frame base used by locals, temporaries and spilled
    /// register parameters
    pub fn locals_size(&self) -> u32 {
        (FIRST_LOCAL_OFFSET - self.next_frame_offset) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str) -> InternedSymbol {
        InternedSymbol::new(name)
    }

    #[test]
    fn entry_block_is_created_first() {
        let graph = ControlFlowGraph::new(symbol("f"));

        assert_eq!(graph.block_count(), 1);
        assert_eq!(graph.entry(), graph.current_block);
        assert_eq!(graph.block(graph.entry()).label, ".Lf_0_entry");
        assert_eq!(graph.block(graph.entry()).terminator(), Terminator::Return);
    }

    #[test]
    fn offsets_are_never_reused_across_scopes() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.declare_parameter(symbol("a"), Type::Int, 0);
        graph.declare_parameter(symbol("b"), Type::Int, 1);

        graph.push_scope();
        graph.push_scope();
        let first = graph.declare_variable(symbol("x"), Type::Int);
        graph.pop_scope();
        graph.push_scope();
        let second = graph.declare_variable(symbol("x"), Type::Int);
        graph.pop_scope();

        assert_eq!(graph.symbol(graph.parameters()[0]).frame_offset, -4);
        assert_eq!(graph.symbol(graph.parameters()[1]).frame_offset, -8);
        assert_eq!(graph.symbol(first).frame_offset, -12);
        assert_eq!(graph.symbol(second).frame_offset, -16);
        assert_eq!(graph.locals_size(), 16);
    }

    #[test]
    fn stack_parameters_live_above_the_frame() {
        let mut graph = ControlFlowGraph::new(symbol("f"));

        for (position, name) in ["a", "b", "c", "d", "e", "f", "g", "h"].iter().enumerate() {
            graph.declare_parameter(symbol(name), Type::Int, position);
        }

        assert_eq!(graph.symbol(graph.parameters()[5]).frame_offset, -24);
        assert_eq!(graph.symbol(graph.parameters()[6]).frame_offset, 16);
        assert_eq!(graph.symbol(graph.parameters()[7]).frame_offset, 24);
        assert_eq!(graph.locals_size(), 24);
    }

    #[test]
    fn lookup_prefers_innermost_scope() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.push_scope();
        let outer = graph.declare_variable(symbol("x"), Type::Int);
        graph.push_scope();
        let inner = graph.declare_variable(symbol("x"), Type::Int);

        assert_eq!(graph.lookup(symbol("x")), Some(inner));
        graph.pop_scope();
        assert_eq!(graph.lookup(symbol("x")), Some(outer));
        assert_eq!(graph.lookup(symbol("y")), None);
    }

    #[test]
    fn temporaries_get_fresh_slots() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.push_scope();

        let a = graph.new_temporary(Type::Int);
        let b = graph.new_temporary(Type::Int);

        assert_ne!(a, b);
        assert_ne!(graph.lookup(a), graph.lookup(b));
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn duplicate_declaration_is_fatal() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.push_scope();
        graph.declare_variable(symbol("x"), Type::Int);
        graph.declare_variable(symbol("x"), Type::Int);
    }

    #[test]
    #[should_panic(expected = "shadows a parameter")]
    fn shadowing_a_parameter_in_the_body_is_fatal() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.declare_parameter(symbol("a"), Type::Int, 0);
        graph.push_scope();
        graph.declare_variable(symbol("a"), Type::Int);
    }

    #[test]
    fn successor_links_decode_to_terminators() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        graph.push_scope();
        let test = graph.declare_variable(symbol("t"), Type::Int);
        let entry = graph.entry();
        let a = graph.create_block("a");
        let b = graph.create_block("b");

        graph.set_jump(entry, a);
        assert_eq!(graph.block(entry).terminator(), Terminator::Jump(a));

        graph.set_branch(entry, test, a, b);
        assert_eq!(
            graph.block(entry).terminator(),
            Terminator::Branch {
                test,
                on_true: a,
                on_false: b
            }
        );
    }

    #[test]
    #[should_panic(expected = "malformed successor shape")]
    fn false_exit_without_true_exit_is_malformed() {
        let mut graph = ControlFlowGraph::new(symbol("f"));
        let other = graph.create_block("other");
        let entry = graph.entry();

        // Bypass the setters to build the forbidden shape
        graph.blocks[entry].exit_false = Some(other);
        graph.block(entry).terminator();
    }
}
