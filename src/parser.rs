//! Dice notation parser.
//!
//! Turns strings such as `"4d6kh3+2"` into an [`ExpressionNode`] tree.
//! The parser performs no arithmetic; defaults such as the explosion depth
//! stay unresolved in the tree so it can be evaluated under any policy.
//!
//! ```text
//! expr      := ('+' | '-')? term (('+' | '-') term)*
//! term      := dice_pool operator* | integer
//! dice_pool := integer? 'd' integer
//! operator  := 'kh' integer | 'kl' integer | 'dh' integer | 'dl' integer
//!            | 'r' integer ('x' integer)? | 'rr' integer
//!            | '!' integer?
//! ```
//!
//! Whitespace is insignificant and `D` is accepted for `d`.

use crate::error::{DiceError, Result};
use crate::expr::ExpressionNode;
use crate::policy::DepthPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Number(u64),
    Dice,
    KeepHighest,
    KeepLowest,
    DropHighest,
    DropLowest,
    Reroll,
    RerollUnlimited,
    Repeat,
    Explode,
    Plus,
    Minus,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    lexeme: String,
    position: usize,
}

struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while self.position < self.input.len() && self.input[self.position].is_whitespace() {
            self.position += 1;
        }

        let start = self.position;
        let Some(&ch) = self.input.get(start) else {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                position: start,
            });
        };

        let kind = match ch {
            '+' => {
                self.position += 1;
                TokenKind::Plus
            }
            '-' => {
                self.position += 1;
                TokenKind::Minus
            }
            '!' => {
                self.position += 1;
                TokenKind::Explode
            }
            '0'..='9' => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                let value = digits.parse::<u64>().map_err(|_| {
                    DiceError::parse(digits.as_str(), start, "number is too large")
                })?;
                return Ok(Token {
                    kind: TokenKind::Number(value),
                    lexeme: digits,
                    position: start,
                });
            }
            c if c.is_ascii_alphabetic() => {
                let word = self.take_while(|c| c.is_ascii_alphabetic());
                let kind = match word.to_ascii_lowercase().as_str() {
                    "d" => TokenKind::Dice,
                    "kh" => TokenKind::KeepHighest,
                    "kl" => TokenKind::KeepLowest,
                    "dh" => TokenKind::DropHighest,
                    "dl" => TokenKind::DropLowest,
                    "r" => TokenKind::Reroll,
                    "rr" => TokenKind::RerollUnlimited,
                    "x" => TokenKind::Repeat,
                    _ => return Err(DiceError::parse(word, start, "unknown operator")),
                };
                return Ok(Token {
                    kind,
                    lexeme: word,
                    position: start,
                });
            }
            other => {
                return Err(DiceError::parse(other.to_string(), start, "unexpected character"));
            }
        };

        Ok(Token {
            kind,
            lexeme: ch.to_string(),
            position: start,
        })
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let start = self.position;
        while self.position < self.input.len() && predicate(self.input[self.position]) {
            self.position += 1;
        }
        self.input[start..self.position].iter().collect()
    }
}

/// Recursive-descent parser over a token stream.
///
/// # Examples
///
/// ```rust
/// use pfdice::{ExpressionNode, Parser};
///
/// let expr = Parser::new("2d6 + 3").unwrap().parse().unwrap();
/// assert_eq!(
///     expr,
///     ExpressionNode::sum(vec![ExpressionNode::dice(2, 6), ExpressionNode::constant(3)])
/// );
/// ```
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    /// Tokenize `input`.
    ///
    /// # Errors
    ///
    /// [`DiceError::ParseError`] for characters or words that are not part
    /// of dice notation.
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, cursor: 0 })
    }

    /// Parse the whole input into an expression tree.
    ///
    /// # Errors
    ///
    /// [`DiceError::ParseError`] naming the offending token and its position.
    pub fn parse(&mut self) -> Result<ExpressionNode> {
        if self.peek().kind == TokenKind::Eof {
            return Err(DiceError::parse("", 0, "empty expression"));
        }

        let mut terms = Vec::new();
        let leading_minus = match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Plus => {
                self.advance();
                false
            }
            _ => false,
        };
        let first = self.parse_term()?;
        terms.push(if leading_minus { negate(first) } else { first });

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Plus => {
                    self.advance();
                    terms.push(self.parse_term()?);
                }
                TokenKind::Minus => {
                    self.advance();
                    let term = self.parse_term()?;
                    terms.push(negate(term));
                }
                TokenKind::Eof => break,
                _ => return Err(unexpected(&token, "expected '+', '-' or end of input")),
            }
        }

        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(ExpressionNode::Sum(terms))
        }
    }

    fn parse_term(&mut self) -> Result<ExpressionNode> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                if self.peek().kind == TokenKind::Dice {
                    let count = narrow_u32(&token, value)?;
                    self.parse_pool(count)
                } else {
                    let value = i64::try_from(value)
                        .map_err(|_| unexpected(&token, "constant is too large"))?;
                    Ok(ExpressionNode::Constant(value))
                }
            }
            TokenKind::Dice => self.parse_pool(1),
            _ => Err(unexpected(&token, "expected a number or dice")),
        }
    }

    fn parse_pool(&mut self, count: u32) -> Result<ExpressionNode> {
        self.expect(TokenKind::Dice, "expected 'd'")?;
        let sides_token = self.peek().clone();
        let sides = narrow_u32(&sides_token, self.expect_number("expected die sides after 'd'")?)?;
        let mut node = ExpressionNode::dice(count, sides);

        loop {
            let token = self.peek().clone();
            node = match token.kind {
                TokenKind::KeepHighest => {
                    self.advance();
                    node.keep_highest(self.expect_count("expected a count after 'kh'")?)
                }
                TokenKind::KeepLowest => {
                    self.advance();
                    node.keep_lowest(self.expect_count("expected a count after 'kl'")?)
                }
                TokenKind::DropHighest => {
                    self.advance();
                    node.drop_highest(self.expect_count("expected a count after 'dh'")?)
                }
                TokenKind::DropLowest => {
                    self.advance();
                    node.drop_lowest(self.expect_count("expected a count after 'dl'")?)
                }
                TokenKind::Reroll => {
                    self.advance();
                    let threshold = self.expect_threshold("expected a threshold after 'r'")?;
                    let times = if self.peek().kind == TokenKind::Repeat {
                        self.advance();
                        let n = self.expect_count("expected a repeat count after 'x'")?;
                        Some(DepthPolicy::TruncatedAtDepth(n))
                    } else {
                        None
                    };
                    node.reroll(threshold, times)
                }
                TokenKind::RerollUnlimited => {
                    self.advance();
                    let threshold = self.expect_threshold("expected a threshold after 'rr'")?;
                    node.reroll(threshold, Some(DepthPolicy::Exact))
                }
                TokenKind::Explode => {
                    self.advance();
                    let depth_token = self.peek().clone();
                    let max_depth = match depth_token.kind {
                        TokenKind::Number(value) => {
                            self.advance();
                            Some(narrow_u32(&depth_token, value)?)
                        }
                        _ => None,
                    };
                    node.explode(max_depth)
                }
                _ => return Ok(node),
            };
        }
    }

    fn peek(&self) -> &Token {
        // the token stream always ends with Eof, and the cursor never passes it
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, reason: &str) -> Result<()> {
        let token = self.peek().clone();
        if token.kind != kind {
            return Err(unexpected(&token, reason));
        }
        self.advance();
        Ok(())
    }

    fn expect_number(&mut self, reason: &str) -> Result<u64> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(unexpected(&token, reason)),
        }
    }

    fn expect_count(&mut self, reason: &str) -> Result<u32> {
        let token = self.peek().clone();
        let value = self.expect_number(reason)?;
        narrow_u32(&token, value)
    }

    fn expect_threshold(&mut self, reason: &str) -> Result<i64> {
        let token = self.peek().clone();
        let value = self.expect_number(reason)?;
        i64::try_from(value).map_err(|_| unexpected(&token, "threshold is too large"))
    }
}

/// Parse dice notation into an expression tree.
///
/// # Errors
///
/// [`DiceError::ParseError`] naming the offending token and its position.
///
/// # Examples
///
/// ```rust
/// use pfdice::{parse, DiceError};
///
/// assert!(parse("4d6kh3").is_ok());
///
/// match parse("3x6") {
///     Err(DiceError::ParseError { token, position, .. }) => {
///         assert_eq!(token, "x");
///         assert_eq!(position, 1);
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
pub fn parse(input: &str) -> Result<ExpressionNode> {
    Parser::new(input)?.parse()
}

fn negate(node: ExpressionNode) -> ExpressionNode {
    match node {
        ExpressionNode::Constant(value) => ExpressionNode::Constant(-value),
        other => other.scale(-1),
    }
}

fn narrow_u32(token: &Token, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| unexpected(token, "number is too large"))
}

fn unexpected(token: &Token, reason: &str) -> DiceError {
    let lexeme = if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        token.lexeme.clone()
    };
    DiceError::parse(lexeme, token.position, reason)
}
