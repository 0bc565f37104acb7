//! Semantic validation of a parsed translation unit. Runs over the syntax tree
//! independently of lowering but agrees with it on scoping: a function's
//! parameters live in their own scope, its body in the one above, and every
//! nested block or `for` statement opens another.

use hashbrown::HashMap;
use thiserror::Error;

use crate::frontend::{
    ast::{
        self, ExpressionKind, ForInitializer, Identifier, StatementKind, TranslationUnit,
        TypeSpecifier,
    },
    intern::InternedSymbol,
    lexer::Span,
};

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("redeclaration of variable `{0}`")]
    Redeclaration(InternedSymbol),
    #[error("declaration of `{0}` shadows a parameter")]
    ShadowsParameter(InternedSymbol),
    #[error("parameter `{0}` declared more than once")]
    DuplicateParameter(InternedSymbol),
    #[error("use of undeclared variable `{0}`")]
    UndeclaredVariable(InternedSymbol),
    #[error("result of void function `{0}` used in an expression")]
    VoidResultUsed(InternedSymbol),
    #[error("call to `{0}` which is the name of a variable in scope")]
    CalleeIsVariable(InternedSymbol),
    #[error("`break` used outside of a loop")]
    BreakOutsideLoop,
    #[error("`continue` used outside of a loop")]
    ContinueOutsideLoop,
    #[error("function `{0}` is defined more than once")]
    DuplicateFunction(InternedSymbol),
    #[error("no `main` function defined")]
    MissingMain,
}

impl SemanticErrorKind {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Redeclaration(_)
            | Self::ShadowsParameter(_)
            | Self::DuplicateParameter(_)
            | Self::VoidResultUsed(_)
            | Self::CalleeIsVariable(_) => 1,
            Self::UndeclaredVariable(_) => 2,
            Self::BreakOutsideLoop | Self::ContinueOutsideLoop => 3,
            Self::DuplicateFunction(_) => 4,
            Self::MissingMain => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UninitializedRead(InternedSymbol),
    UnusedVariable(InternedSymbol),
}

impl core::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::UninitializedRead(name) => {
                write!(f, "variable `{name}` is used before being initialized")
            }
            WarningKind::UnusedVariable(name) => write!(f, "variable `{name}` is never used"),
        }
    }
}

/// Only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum VariableState {
    Declared,
    Initialized,
    Used,
}

#[derive(Debug)]
struct Variable {
    state: VariableState,
    span: Span,
}

type Scope = HashMap<InternedSymbol, Variable>;

type ValidationResult<T = ()> = Result<T, SemanticError>;

#[derive(Debug, Default)]
pub struct Validator {
    functions: HashMap<InternedSymbol, TypeSpecifier>,
    scopes: Vec<Scope>,
    loop_depth: usize,
    warnings: Vec<Warning>,
}

impl Validator {
    /// Checks the whole unit, returning the warnings found along the way or
    /// the first fatal error
    pub fn validate_translation_unit(unit: &TranslationUnit) -> ValidationResult<Vec<Warning>> {
        let mut validator = Self::default();

        // Signatures first, so calls may refer to functions defined later
        for function in &unit.functions {
            if validator
                .functions
                .insert(function.name.symbol, function.return_type)
                .is_some()
            {
                return Err(SemanticError {
                    kind: SemanticErrorKind::DuplicateFunction(function.name.symbol),
                    span: function.name.span,
                });
            }
        }

        for function in &unit.functions {
            validator.validate_function(function)?;
        }

        if !validator.functions.contains_key(&InternedSymbol::new("main")) {
            return Err(SemanticError {
                kind: SemanticErrorKind::MissingMain,
                span: unit.source_file_end(),
            });
        }

        log::debug!(
            "validated {} functions with {} warnings",
            unit.functions.len(),
            validator.warnings.len()
        );

        Ok(validator.warnings)
    }

    fn validate_function(&mut self, function: &ast::FunctionDefinition) -> ValidationResult {
        let mut parameters = Scope::new();

        for parameter in &function.parameters {
            let name = parameter.name.symbol;

            if parameters.contains_key(&name) {
                return Err(SemanticError {
                    kind: SemanticErrorKind::DuplicateParameter(name),
                    span: parameter.name.span,
                });
            }

            parameters.insert(
                name,
                Variable {
                    state: VariableState::Initialized,
                    span: parameter.span,
                },
            );
        }

        self.scopes = vec![parameters];

        self.with_scope(|this| {
            function
                .body
                .statements
                .iter()
                .try_for_each(|statement| this.validate_statement(statement))
        })?;

        // Parameters are never reported as unused
        self.scopes.clear();

        Ok(())
    }

    /// Runs `f` inside a fresh scope, reporting the scope's unused variables
    /// once it closes
    fn with_scope(
        &mut self,
        f: impl FnOnce(&mut Self) -> ValidationResult,
    ) -> ValidationResult {
        self.scopes.push(Scope::new());
        let result = f(self);
        let Some(scope) = self.scopes.pop() else {
            unreachable!("scope pushed above");
        };
        result?;

        let mut unused: Vec<_> = scope
            .into_iter()
            .filter(|(_, variable)| variable.state < VariableState::Used)
            .collect();
        unused.sort_by_key(|(name, _)| name.value());

        self.warnings
            .extend(unused.into_iter().map(|(name, variable)| Warning {
                kind: WarningKind::UnusedVariable(name),
                span: variable.span,
            }));

        Ok(())
    }

    fn find_variable(&mut self, name: InternedSymbol) -> Option<&mut Variable> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(&name))
    }

    fn is_void_function(&self, callee: &Identifier) -> bool {
        self.functions.get(&callee.symbol) == Some(&TypeSpecifier::Void)
    }

    /// Fails if a void function's result is needed anywhere in `expression`
    fn check_value_used(&self, expression: &ast::Expression) -> ValidationResult {
        match expression.find_call(&|callee| self.is_void_function(callee)) {
            Some(ast::Expression {
                kind: ExpressionKind::FunctionCall { callee, .. },
                span,
            }) => Err(SemanticError {
                kind: SemanticErrorKind::VoidResultUsed(callee.symbol),
                span: *span,
            }),
            _ => Ok(()),
        }
    }

    /// Like `check_value_used`, but the value of the outermost expression is
    /// itself discarded
    fn check_value_discarded(&self, expression: &ast::Expression) -> ValidationResult {
        match &expression.ungrouped().kind {
            ExpressionKind::FunctionCall { arguments, .. } => arguments
                .iter()
                .try_for_each(|argument| self.check_value_used(argument)),
            ExpressionKind::Assignment { value, .. } => self.check_value_used(value),
            _ => self.check_value_used(expression),
        }
    }

    fn validate_statement(&mut self, statement: &ast::Statement) -> ValidationResult {
        match &statement.kind {
            StatementKind::Declaration(declarations) => self.validate_declarations(declarations),
            StatementKind::Expression(expression) => {
                self.check_value_discarded(expression)?;
                self.validate_expression(expression)
            }
            StatementKind::Block(block) => self.with_scope(|this| {
                block
                    .statements
                    .iter()
                    .try_for_each(|statement| this.validate_statement(statement))
            }),
            StatementKind::If {
                condition,
                positive,
                negative,
            } => {
                self.check_value_used(condition)?;
                self.validate_expression(condition)?;
                self.validate_statement(positive)?;

                if let Some(negative) = negative {
                    self.validate_statement(negative)?;
                }

                Ok(())
            }
            StatementKind::While { condition, body } => {
                self.check_value_used(condition)?;
                self.validate_expression(condition)?;
                self.validate_loop_body(body)
            }
            StatementKind::DoWhile { body, condition } => {
                self.validate_loop_body(body)?;
                self.check_value_used(condition)?;
                self.validate_expression(condition)
            }
            StatementKind::For {
                initializer,
                test,
                after,
                body,
            } => self.with_scope(|this| {
                match initializer {
                    Some(ForInitializer::Declaration(declarations)) => {
                        this.validate_declarations(declarations)?
                    }
                    Some(ForInitializer::Expression(expression)) => {
                        this.check_value_discarded(expression)?;
                        this.validate_expression(expression)?;
                    }
                    None => {}
                }

                if let Some(test) = test {
                    this.check_value_used(test)?;
                    this.validate_expression(test)?;
                }

                this.validate_loop_body(body)?;

                if let Some(after) = after {
                    this.check_value_discarded(after)?;
                    this.validate_expression(after)?;
                }

                Ok(())
            }),
            StatementKind::Break if self.loop_depth == 0 => Err(SemanticError {
                kind: SemanticErrorKind::BreakOutsideLoop,
                span: statement.span,
            }),
            StatementKind::Continue if self.loop_depth == 0 => Err(SemanticError {
                kind: SemanticErrorKind::ContinueOutsideLoop,
                span: statement.span,
            }),
            StatementKind::Break | StatementKind::Continue => Ok(()),
            StatementKind::Return(value) => match value {
                Some(value) => {
                    self.check_value_used(value)?;
                    self.validate_expression(value)
                }
                None => Ok(()),
            },
            StatementKind::Empty => Ok(()),
        }
    }

    fn validate_loop_body(&mut self, body: &ast::Statement) -> ValidationResult {
        self.loop_depth += 1;
        let result = self.validate_statement(body);
        self.loop_depth -= 1;

        result
    }

    fn validate_declarations(&mut self, declarations: &[ast::Declaration]) -> ValidationResult {
        for declaration in declarations {
            let name = declaration.name.symbol;

            if let Some(initializer) = &declaration.initializer {
                self.check_value_used(initializer)?;
            }

            let depth = self.scopes.len();
            let Some(scope) = self.scopes.last_mut() else {
                unreachable!("declarations only appear inside a function body");
            };

            if scope.contains_key(&name) {
                return Err(SemanticError {
                    kind: SemanticErrorKind::Redeclaration(name),
                    span: declaration.name.span,
                });
            }

            scope.insert(
                name,
                Variable {
                    state: VariableState::Declared,
                    span: declaration.name.span,
                },
            );

            if depth == 2 && self.scopes[0].contains_key(&name) {
                return Err(SemanticError {
                    kind: SemanticErrorKind::ShadowsParameter(name),
                    span: declaration.name.span,
                });
            }

            if let Some(initializer) = &declaration.initializer {
                self.validate_expression(initializer)?;
                self.advance(name, VariableState::Initialized);
            }
        }

        Ok(())
    }

    fn advance(&mut self, name: InternedSymbol, state: VariableState) {
        if let Some(variable) = self.find_variable(name) {
            variable.state = variable.state.max(state);
        }
    }

    fn undeclared(identifier: &Identifier) -> SemanticError {
        SemanticError {
            kind: SemanticErrorKind::UndeclaredVariable(identifier.symbol),
            span: identifier.span,
        }
    }

    /// A read of the variable's current value
    fn read_variable(&mut self, identifier: &Identifier) -> ValidationResult {
        let Some(variable) = self.find_variable(identifier.symbol) else {
            return Err(Self::undeclared(identifier));
        };

        let uninitialized = variable.state == VariableState::Declared;
        variable.state = VariableState::Used;

        if uninitialized {
            self.warnings.push(Warning {
                kind: WarningKind::UninitializedRead(identifier.symbol),
                span: identifier.span,
            });
        }

        Ok(())
    }

    fn validate_expression(&mut self, expression: &ast::Expression) -> ValidationResult {
        match &expression.kind {
            ExpressionKind::Literal(_) => Ok(()),
            ExpressionKind::Identifier(identifier) => self.read_variable(identifier),
            ExpressionKind::Grouping(inner) => self.validate_expression(inner),
            ExpressionKind::FunctionCall { callee, arguments } => {
                if self.find_variable(callee.symbol).is_some() {
                    return Err(SemanticError {
                        kind: SemanticErrorKind::CalleeIsVariable(callee.symbol),
                        span: callee.span,
                    });
                }

                arguments
                    .iter()
                    .try_for_each(|argument| self.validate_expression(argument))
            }
            ExpressionKind::Binary { lhs, rhs, .. } => {
                self.validate_expression(lhs)?;
                self.validate_expression(rhs)
            }
            ExpressionKind::Unary { operand, .. } => self.validate_expression(operand),
            ExpressionKind::Increment { target, .. } => self.read_variable(target),
            ExpressionKind::Assignment {
                target,
                operator,
                value,
            } => {
                if self.find_variable(target.symbol).is_none() {
                    return Err(Self::undeclared(target));
                }

                self.validate_expression(value)?;

                // Compound assignment reads the old value first
                if operator.is_some() {
                    self.read_variable(target)?;
                }

                self.advance(target.symbol, VariableState::Initialized);

                Ok(())
            }
        }
    }
}

impl TranslationUnit<'_> {
    /// Empty span at the end of the source, for errors about the whole unit
    fn source_file_end(&self) -> Span {
        let end = self.source_file.contents.len();
        Span::new(end, end)
    }
}
