//! Recursive-descent compiler from path text to [`CompiledPath`]
//!
//! Supported grammar (a namespace-free subset of XPath 1.0 location paths):
//!
//! ```text
//! path       := ('/' | '//')? step (('/' | '//') step)*
//! step       := '.' | '..' | node-test predicate*
//! node-test  := NAME | '*' | 'text()' | 'node()'
//! predicate  := '[' NUMBER ']' | '[' 'last()' ']' | '[' or-expr ']'
//! or-expr    := and-expr ('or' and-expr)*
//! and-expr   := unary ('and' unary)*
//! unary      := 'not(' or-expr ')' | '(' or-expr ')' | comparison
//! comparison := '@' NAME (('=' | '!=') LITERAL)?
//!             | ('contains' | 'starts-with') '(' '@' NAME ',' LITERAL ')'
//! ```

use super::lexer::{lex, PathToken};
use super::PathError;
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Child,
    SelfNode,
    Parent,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeTest {
    /// Element with this tag name
    Name(String),
    /// Any element (`*`)
    AnyElement,
    /// Text or CDATA node (`text()`)
    Text,
    /// Any node (`node()`, `.` and `..`)
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Predicate {
    /// 1-based position among the step's candidates
    Position(usize),
    Last,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expr {
    HasAttribute(String),
    AttributeEquals(String, String),
    AttributeNotEquals(String, String),
    Contains(String, String),
    StartsWith(String, String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }
}

/// A parsed, reusable location path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

/// Compile path text
pub fn compile(expression: &str) -> Result<CompiledPath, PathError> {
    let tokens = lex(expression).map_err(|offset| PathError::Syntax {
        expression: expression.to_string(),
        offset,
        message: "unrecognized character".to_string(),
    })?;

    PathCompiler {
        expression,
        tokens,
        pos: 0,
    }
    .compile()
}

struct PathCompiler<'src> {
    expression: &'src str,
    tokens: Vec<(PathToken<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> PathCompiler<'src> {
    fn compile(mut self) -> Result<CompiledPath, PathError> {
        let mut steps = Vec::new();

        let absolute = match self.peek() {
            Some(PathToken::Slash) => {
                self.advance();
                // A bare "/" selects the document node itself
                if self.is_at_end() {
                    return Ok(CompiledPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(PathToken::DoubleSlash) => {
                self.advance();
                steps.push(Step::descendant_or_self());
                true
            }
            _ => false,
        };

        // An empty relative path selects the context node
        if self.is_at_end() && !absolute {
            return Ok(CompiledPath { absolute, steps });
        }

        steps.push(self.parse_step()?);
        while !self.is_at_end() {
            match self.peek() {
                Some(PathToken::Slash) => {
                    self.advance();
                }
                Some(PathToken::DoubleSlash) => {
                    self.advance();
                    steps.push(Step::descendant_or_self());
                }
                _ => return Err(self.error("'/' or end of path")),
            }
            steps.push(self.parse_step()?);
        }

        Ok(CompiledPath { absolute, steps })
    }

    fn parse_step(&mut self) -> Result<Step, PathError> {
        let (axis, test) = match self.peek().cloned() {
            Some(PathToken::Dot) => {
                self.advance();
                return Ok(Step {
                    axis: Axis::SelfNode,
                    test: NodeTest::AnyNode,
                    predicates: Vec::new(),
                });
            }
            Some(PathToken::DotDot) => {
                self.advance();
                return Ok(Step {
                    axis: Axis::Parent,
                    test: NodeTest::AnyNode,
                    predicates: Vec::new(),
                });
            }
            Some(PathToken::Star) => {
                self.advance();
                (Axis::Child, NodeTest::AnyElement)
            }
            Some(PathToken::Name(name)) => {
                self.advance();
                if self.check(&PathToken::LParen) {
                    self.advance();
                    self.expect(PathToken::RParen, "')'")?;
                    match name {
                        "text" => (Axis::Child, NodeTest::Text),
                        "node" => (Axis::Child, NodeTest::AnyNode),
                        _ => return Err(self.error_at_previous("node test 'text()' or 'node()'")),
                    }
                } else {
                    (Axis::Child, NodeTest::Name(name.to_string()))
                }
            }
            _ => return Err(self.error("step")),
        };

        let mut predicates = Vec::new();
        while self.check(&PathToken::LBracket) {
            self.advance();
            predicates.push(self.parse_predicate()?);
            self.expect(PathToken::RBracket, "']'")?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, PathError> {
        match self.peek().cloned() {
            Some(PathToken::Number(n)) => {
                self.advance();
                if n == 0 {
                    return Err(self.error_at_previous("position starting at 1"));
                }
                Ok(Predicate::Position(n))
            }
            Some(PathToken::Name("last")) if self.peek_ahead(1) == Some(&PathToken::LParen) => {
                self.advance();
                self.advance();
                self.expect(PathToken::RParen, "')'")?;
                Ok(Predicate::Last)
            }
            _ => Ok(Predicate::Expr(self.parse_or()?)),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, PathError> {
        let mut left = self.parse_and()?;
        while self.check(&PathToken::Name("or")) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, PathError> {
        let mut left = self.parse_unary()?;
        while self.check(&PathToken::Name("and")) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, PathError> {
        match self.peek().cloned() {
            Some(PathToken::LParen) => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(PathToken::RParen, "')'")?;
                Ok(inner)
            }
            Some(PathToken::Name("not")) => {
                self.advance();
                self.expect(PathToken::LParen, "'('")?;
                let inner = self.parse_or()?;
                self.expect(PathToken::RParen, "')'")?;
                Ok(Expr::Not(Box::new(inner)))
            }
            Some(PathToken::Name(function @ ("contains" | "starts-with"))) => {
                self.advance();
                self.expect(PathToken::LParen, "'('")?;
                let attribute = self.parse_attribute_name()?;
                self.expect(PathToken::Comma, "','")?;
                let literal = self.expect_literal()?;
                self.expect(PathToken::RParen, "')'")?;
                Ok(if function == "contains" {
                    Expr::Contains(attribute, literal)
                } else {
                    Expr::StartsWith(attribute, literal)
                })
            }
            Some(PathToken::At) => {
                let attribute = self.parse_attribute_name()?;
                match self.peek() {
                    Some(PathToken::Equals) => {
                        self.advance();
                        Ok(Expr::AttributeEquals(attribute, self.expect_literal()?))
                    }
                    Some(PathToken::NotEquals) => {
                        self.advance();
                        Ok(Expr::AttributeNotEquals(attribute, self.expect_literal()?))
                    }
                    _ => Ok(Expr::HasAttribute(attribute)),
                }
            }
            _ => Err(self.error("predicate expression")),
        }
    }

    fn parse_attribute_name(&mut self) -> Result<String, PathError> {
        self.expect(PathToken::At, "'@'")?;
        match self.peek().cloned() {
            Some(PathToken::Name(name)) => {
                self.advance();
                Ok(name.to_string())
            }
            _ => Err(self.error("attribute name")),
        }
    }

    fn expect_literal(&mut self) -> Result<String, PathError> {
        match self.peek().cloned() {
            Some(PathToken::Literal(value)) => {
                self.advance();
                Ok(value.to_string())
            }
            _ => Err(self.error("quoted literal")),
        }
    }

    // --- token helpers ---

    fn peek(&self) -> Option<&PathToken<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&PathToken<'src>> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &PathToken<'src>) -> bool {
        self.peek() == Some(token)
    }

    fn expect(&mut self, token: PathToken<'src>, expected: &str) -> Result<(), PathError> {
        if self.check(&token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn error(&self, expected: &str) -> PathError {
        let (offset, found) = match self.tokens.get(self.pos) {
            Some((token, span)) => (span.start, format!("{:?}", token)),
            None => (self.expression.len(), "end of path".to_string()),
        };
        PathError::Syntax {
            expression: self.expression.to_string(),
            offset,
            message: format!("expected {}, found {}", expected, found),
        }
    }

    fn error_at_previous(&self, expected: &str) -> PathError {
        let offset = self
            .pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map(|(_, span)| span.start)
            .unwrap_or(0);
        PathError::Syntax {
            expression: self.expression.to_string(),
            offset,
            message: format!("expected {}", expected),
        }
    }
}
