use crate::middle::ir::{ControlFlowGraph, Slot};

/// Accumulates GNU assembler (Intel syntax) text for one function. Every
/// value lives in a 32-bit stack slot addressed from `rbp`.
pub struct Assembler<'a> {
    output: String,
    graph: &'a ControlFlowGraph,
    emit_comments: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(graph: &'a ControlFlowGraph, emit_comments: bool) -> Self {
        Self {
            output: String::new(),
            graph,
            emit_comments,
        }
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn push_line(&mut self, string: impl AsRef<str>) {
        self.output.push_str(string.as_ref());
        self.output.push('\n');
    }

    pub fn emit(&mut self, string: impl AsRef<str>) {
        self.output.push_str("    ");
        self.push_line(string);
    }

    pub fn global_function(&mut self, name: &str) {
        self.emit(format!(".globl {name}"));
        self.emit(format!(".type {name}, @function"));
        self.push_line(format!("{name}:"));
    }

    pub fn label(&mut self, name: impl AsRef<str>) {
        self.push_line(format!("{}:", name.as_ref()));
    }

    /// Only written when comments were requested. Color codes from the IR
    /// printer are stripped.
    pub fn comment(&mut self, comment: impl AsRef<str>) {
        if self.emit_comments {
            let comment = strip_ansi_escapes::strip_str(comment.as_ref());
            self.emit(format!("# {comment}"));
        }
    }

    pub fn function_prologue(&mut self, stack_frame_size: u32) {
        self.emit("push rbp");
        self.emit("mov rbp, rsp");

        if stack_frame_size > 0 {
            self.emit(format!("sub rsp, {stack_frame_size}"));
        }
    }

    pub fn function_epilogue(&mut self) {
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
    }

    /// Memory operand of a slot, e.g. `DWORD PTR [rbp-8]`
    pub fn slot(&self, slot: Slot) -> String {
        let offset = self.graph.symbol(slot).frame_offset;

        if offset < 0 {
            format!("DWORD PTR [rbp{offset}]")
        } else {
            format!("DWORD PTR [rbp+{offset}]")
        }
    }

    pub fn load_slot(&mut self, destination: X86FullRegister, source: Slot) -> X86Register {
        let sized = destination.as_32_bit();
        self.emit(format!("mov {sized}, {}", self.slot(source)));
        sized
    }

    pub fn store_slot(&mut self, destination: Slot, source: X86FullRegister) {
        self.emit(format!(
            "mov {}, {}",
            self.slot(destination),
            source.as_32_bit()
        ));
    }
}

/// General Purpose Register 64-bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum X86FullRegister {
    Rax,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
}

impl X86FullRegister {
    /// Integer argument registers of the System V calling convention, in order
    pub const ARGUMENTS: [Self; 6] = [Self::Rdi, Self::Rsi, Self::Rdx, Self::Rcx, Self::R8, Self::R9];

    pub fn as_64_bit(self) -> X86Register {
        match self {
            Self::Rax => X86Register::Rax,
            Self::Rcx => X86Register::Rcx,
            Self::Rdx => X86Register::Rdx,
            Self::Rsi => X86Register::Rsi,
            Self::Rdi => X86Register::Rdi,
            Self::R8 => X86Register::R8,
            Self::R9 => X86Register::R9,
        }
    }

    pub fn as_32_bit(self) -> X86Register {
        match self {
            Self::Rax => X86Register::Eax,
            Self::Rcx => X86Register::Ecx,
            Self::Rdx => X86Register::Edx,
            Self::Rsi => X86Register::Esi,
            Self::Rdi => X86Register::Edi,
            Self::R8 => X86Register::R8d,
            Self::R9 => X86Register::R9d,
        }
    }

    pub fn as_8_bit(self) -> X86Register {
        match self {
            Self::Rax => X86Register::Al,
            Self::Rcx => X86Register::Cl,
            Self::Rdx => X86Register::Dl,
            Self::Rsi => X86Register::Sil,
            Self::Rdi => X86Register::Dil,
            Self::R8 => X86Register::R8b,
            Self::R9 => X86Register::R9b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[rustfmt::skip]
pub enum X86Register {
    // 64-bit
    Rax, Rcx, Rdx, Rsi, Rdi, R8, R9,

    // 32-bit
    Eax, Ecx, Edx, Esi, Edi, R8d, R9d,

    // 8-bit low
    Al, Cl, Dl, Sil, Dil, R8b, R9b,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frontend::intern::InternedSymbol, middle::ir::Type};

    #[test]
    fn registers_print_lowercase() {
        assert_eq!(X86FullRegister::R8.as_32_bit().to_string(), "r8d");
        assert_eq!(X86FullRegister::Rax.as_8_bit().to_string(), "al");
        assert_eq!(X86FullRegister::ARGUMENTS[3].as_64_bit().to_string(), "rcx");
    }

    #[test]
    fn slots_address_both_sides_of_the_frame() {
        let mut graph = ControlFlowGraph::new(InternedSymbol::new("f"));
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        for (position, name) in names.iter().enumerate() {
            graph.declare_parameter(InternedSymbol::new(name), Type::Int, position);
        }

        let assembler = Assembler::new(&graph, false);

        assert_eq!(assembler.slot(graph.parameters()[0]), "DWORD PTR [rbp-4]");
        assert_eq!(assembler.slot(graph.parameters()[6]), "DWORD PTR [rbp+16]");
    }

    #[test]
    fn comments_are_stripped_and_optional() {
        let graph = ControlFlowGraph::new(InternedSymbol::new("f"));

        let mut silent = Assembler::new(&graph, false);
        silent.comment("hidden");
        assert!(silent.into_output().is_empty());

        let mut verbose = Assembler::new(&graph, true);
        verbose.comment("\u{1b}[36mldconst\u{1b}[0m x, 1");
        assert_eq!(verbose.into_output(), "    # ldconst x, 1\n");
    }
}
