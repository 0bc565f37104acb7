use super::{SourceFile, intern::InternedSymbol, lexer::Span};

#[derive(Debug)]
pub struct TranslationUnit<'source> {
    pub source_file: &'source SourceFile,
    pub functions: Vec<FunctionDefinition>,
}

#[derive(Debug)]
pub struct FunctionDefinition {
    pub span: Span,
    pub return_type: TypeSpecifier,
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpecifier {
    Int,
    Void,
}

#[derive(Debug)]
pub struct Parameter {
    pub span: Span,
    pub name: Identifier,
}

#[derive(Debug, Clone, Copy)]
pub struct Identifier {
    pub span: Span,
    pub symbol: InternedSymbol,
}

#[derive(Debug)]
pub struct Block {
    pub span: Span,
    pub statements: Vec<Statement>,
}

#[derive(Debug)]
pub struct Statement {
    pub span: Span,
    pub kind: StatementKind,
}

#[derive(Debug)]
pub enum StatementKind {
    /// `int a = 1, b;`
    Declaration(Vec<Declaration>),
    /// Expression terminated with a semicolon
    Expression(Box<Expression>),
    Block(Box<Block>),
    If {
        condition: Box<Expression>,
        positive: Box<Statement>,
        /// Another if statement when written as `else if`
        negative: Option<Box<Statement>>,
    },
    While {
        condition: Box<Expression>,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Box<Expression>,
    },
    For {
        initializer: Option<ForInitializer>,
        test: Option<Box<Expression>>,
        after: Option<Box<Expression>>,
        body: Box<Statement>,
    },
    Break,
    Continue,
    Return(Option<Box<Expression>>),
    /// Empty statement (just a semicolon)
    Empty,
}

#[derive(Debug)]
pub enum ForInitializer {
    Declaration(Vec<Declaration>),
    Expression(Box<Expression>),
}

#[derive(Debug)]
pub struct Declaration {
    pub span: Span,
    pub name: Identifier,
    pub initializer: Option<Box<Expression>>,
}

#[derive(Debug)]
pub struct Expression {
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Debug)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(Identifier),
    Grouping(Box<Expression>),
    FunctionCall {
        callee: Identifier,
        arguments: Vec<Expression>,
    },
    Binary {
        lhs: Box<Expression>,
        operator: BinaryOperator,
        rhs: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// `++x`, `x--`, ...
    Increment {
        kind: IncrementKind,
        fixity: Fixity,
        target: Identifier,
    },
    Assignment {
        target: Identifier,
        /// `None` for a plain `=`
        operator: Option<AssignmentOperator>,
        value: Box<Expression>,
    },
}

impl Expression {
    /// Depth-first search for a function call whose callee satisfies the
    /// predicate, returning the first match
    pub fn find_call(&self, predicate: &impl Fn(&Identifier) -> bool) -> Option<&Expression> {
        match &self.kind {
            ExpressionKind::Literal(_)
            | ExpressionKind::Identifier(_)
            | ExpressionKind::Increment { .. } => None,
            ExpressionKind::Grouping(inner) => inner.find_call(predicate),
            ExpressionKind::FunctionCall { callee, arguments } => {
                if predicate(callee) {
                    return Some(self);
                }

                arguments.iter().find_map(|arg| arg.find_call(predicate))
            }
            ExpressionKind::Binary { lhs, rhs, .. } => lhs
                .find_call(predicate)
                .or_else(|| rhs.find_call(predicate)),
            ExpressionKind::Unary { operand, .. } => operand.find_call(predicate),
            ExpressionKind::Assignment { value, .. } => value.find_call(predicate),
        }
    }

    /// Strips any redundant parentheses
    pub fn ungrouped(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Grouping(inner) => inner.ungrouped(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryOperator {
    pub span: Span,
    pub kind: BinaryOperatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOperatorKind {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulus,
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanOrEqualTo,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanOrEqualTo,
    #[strum(serialize = "&&")]
    LogicalAnd,
    #[strum(serialize = "||")]
    LogicalOr,
    #[strum(serialize = "&")]
    BitwiseAnd,
    #[strum(serialize = "|")]
    BitwiseOr,
    #[strum(serialize = "^")]
    BitwiseXor,
    #[strum(serialize = "<<")]
    ShiftLeft,
    #[strum(serialize = ">>")]
    ShiftRight,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryOperator {
    pub span: Span,
    pub kind: UnaryOperatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOperatorKind {
    #[strum(serialize = "!")]
    LogicalNot,
    #[strum(serialize = "~")]
    BitwiseNot,
    #[strum(serialize = "-")]
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementKind {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy)]
pub struct Literal {
    pub span: Span,
    pub kind: LiteralKind,
    pub symbol: InternedSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer, // 1
    Char,    // 'A'
}

#[derive(Debug, Clone, Copy)]
pub struct AssignmentOperator {
    pub span: Span,
    pub kind: AssignmentOperatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperatorKind {
    Add,        // +=
    Subtract,   // -=
    Multiply,   // *=
    Divide,     // /=
    Modulus,    // %=
    BitwiseAnd, // &=
    BitwiseOr,  // |=
    BitwiseXor, // ^=
    ShiftLeft,  // <<=
    ShiftRight, // >>=
}
