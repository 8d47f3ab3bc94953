use std::collections::BTreeMap;

use thiserror::Error;

/// Binary operators of the plural-rule grammar. Precedence is numeric with
/// smaller values binding tighter, matching the C grammar gettext rules are
/// written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Equal,
    NotEqual,
    GreaterEqual,
    LesserEqual,
    GreaterThan,
    LesserThan,
    And,
    Or,
    Modulo,
}

impl OpKind {
    pub fn precedence(self) -> u8 {
        match self {
            OpKind::Modulo => 3,
            OpKind::GreaterEqual
            | OpKind::LesserEqual
            | OpKind::GreaterThan
            | OpKind::LesserThan => 6,
            OpKind::Equal | OpKind::NotEqual => 7,
            OpKind::And => 11,
            OpKind::Or => 12,
        }
    }

    /// Name of the target-side command this operator compiles to.
    pub fn opcode(self) -> &'static str {
        match self {
            OpKind::Equal => "equal",
            OpKind::NotEqual => "notequal",
            OpKind::GreaterEqual => "greaterequal",
            OpKind::LesserEqual => "lesserequal",
            OpKind::GreaterThan => "greaterthan",
            OpKind::LesserThan => "lesserthan",
            OpKind::And => "and",
            OpKind::Or => "or",
            OpKind::Modulo => "modulo",
        }
    }
}

/// Sentinel precedence for grouping and ternary tokens: never popped by a
/// binary operator, pops everything themselves.
const GROUP_PRECEDENCE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(u64),
    Ident(String),
    Op(OpKind),
    OpenGroup,
    CloseGroup,
    TernaryStart,
    TernaryMiddle,
}

impl Token {
    fn stack_precedence(&self) -> u8 {
        match self {
            Token::Op(op) => op.precedence(),
            _ => GROUP_PRECEDENCE,
        }
    }

    /// Whether a close-group pops this token off the stack immediately after
    /// the matching open-group is discarded. Only binary operators carry the
    /// capability; the hook exists for named-function tokens that the current
    /// grammar never produces.
    fn pops_after_group(&self) -> bool {
        matches!(self, Token::Op(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("no token matches \"{0}<...>\"")]
    UnmatchedInput(String),
    #[error("could not find matching open parenthesis")]
    UnbalancedGroup,
    #[error("operator \"?\" must have a matching \":\"")]
    TernaryWithoutMiddle,
    #[error("expression stack holds {0} items at end, expected exactly 1")]
    UnbalancedStack(usize),
    #[error("ternary branch used as a plain operand")]
    MisplacedBranch,
    #[error("unresolved identifier \"{0}\"")]
    UnresolvedIdentifier(String),
    #[error("modulo by zero")]
    ModuloByZero,
}

/// Parses an infix expression into Reverse-Polish token order.
///
/// An identifier rename table may substitute the rendered text of chosen
/// identifiers after parsing; plural compilation uses it to inject the
/// runtime count in place of `n`.
pub struct Parser<'a> {
    source: &'a str,
    renames: BTreeMap<String, String>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            renames: BTreeMap::new(),
        }
    }

    pub fn rename_identifier(&mut self, from: &str, to: &str) {
        self.renames.insert(from.to_string(), to.to_string());
    }

    pub fn parse(&self) -> Result<Vec<Token>, ExprError> {
        let mut output = Vec::new();
        let mut stack: Vec<Token> = Vec::new();
        let bytes = self.source.as_bytes();
        let mut offset = 0;
        while offset < bytes.len() {
            let (token, width) = match next_token(&self.source[offset..]) {
                Some(found) => found,
                None => {
                    let rest = &self.source[offset..];
                    let fragment = rest.chars().take(10).collect::<String>();
                    return Err(ExprError::UnmatchedInput(fragment));
                }
            };
            offset += width;
            let token = match token {
                Some(token) => token,
                None => continue,
            };
            match token {
                Token::Literal(_) | Token::Ident(_) => output.push(token),
                Token::OpenGroup => stack.push(token),
                Token::CloseGroup => {
                    loop {
                        match stack.pop() {
                            Some(Token::OpenGroup) => break,
                            Some(popped) => output.push(popped),
                            None => return Err(ExprError::UnbalancedGroup),
                        }
                    }
                    if stack.last().map(Token::pops_after_group).unwrap_or(false) {
                        if let Some(popped) = stack.pop() {
                            output.push(popped);
                        }
                    }
                }
                _ => {
                    // Strictly-less-than keeps equal-precedence chains
                    // right-associative; compiled output depends on it.
                    let precedence = token.stack_precedence();
                    while stack
                        .last()
                        .map(|top| top.stack_precedence() < precedence)
                        .unwrap_or(false)
                    {
                        if let Some(popped) = stack.pop() {
                            output.push(popped);
                        }
                    }
                    stack.push(token);
                }
            }
        }
        while let Some(token) = stack.pop() {
            if token == Token::OpenGroup {
                return Err(ExprError::UnbalancedGroup);
            }
            output.push(token);
        }
        if self.renames.is_empty() {
            return Ok(output);
        }
        Ok(output
            .into_iter()
            .map(|token| match token {
                Token::Ident(name) => match self.renames.get(&name) {
                    Some(replacement) => Token::Ident(replacement.clone()),
                    None => Token::Ident(name),
                },
                other => other,
            })
            .collect())
    }
}

/// Longest-match lexing at the head of `rest`. Two-character operators are
/// tried before their one-character prefixes. Returns `(None, width)` for
/// skipped whitespace and `None` when nothing matches.
fn next_token(rest: &str) -> Option<(Option<Token>, usize)> {
    let bytes = rest.as_bytes();
    let first = *bytes.first()?;
    let two = bytes.get(1).map(|second| [first, *second]);
    let op = match two {
        Some([b'=', b'=']) => Some(OpKind::Equal),
        Some([b'!', b'=']) => Some(OpKind::NotEqual),
        Some([b'>', b'=']) => Some(OpKind::GreaterEqual),
        Some([b'<', b'=']) => Some(OpKind::LesserEqual),
        Some([b'&', b'&']) => Some(OpKind::And),
        Some([b'|', b'|']) => Some(OpKind::Or),
        _ => None,
    };
    if let Some(op) = op {
        return Some((Some(Token::Op(op)), 2));
    }
    let single = match first {
        b'>' => Some(Token::Op(OpKind::GreaterThan)),
        b'<' => Some(Token::Op(OpKind::LesserThan)),
        b'%' => Some(Token::Op(OpKind::Modulo)),
        b'?' => Some(Token::TernaryStart),
        b':' => Some(Token::TernaryMiddle),
        b'(' => Some(Token::OpenGroup),
        b')' => Some(Token::CloseGroup),
        _ => None,
    };
    if let Some(token) = single {
        return Some((Some(token), 1));
    }
    if first.is_ascii_digit() {
        let end = bytes
            .iter()
            .position(|byte| !byte.is_ascii_digit())
            .unwrap_or(bytes.len());
        let value = rest[..end].parse::<u64>().ok()?;
        return Some((Some(Token::Literal(value)), end));
    }
    if first.is_ascii_alphabetic() || first == b'_' {
        let end = bytes
            .iter()
            .position(|byte| !(byte.is_ascii_alphanumeric() || *byte == b'_'))
            .unwrap_or(bytes.len());
        return Some((Some(Token::Ident(rest[..end].to_string())), end));
    }
    if first.is_ascii_whitespace() {
        let end = bytes
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        return Some((None, end));
    }
    None
}

enum EvalItem {
    Value(i64),
    Branch(i64, i64),
}

/// Evaluates an RPN sequence with C integer semantics (comparisons and
/// logic yield 0 or 1). Identifiers must have been renamed to integer text
/// beforehand; anything else is an error. Used to verify plural rules
/// without a rendering engine.
pub fn evaluate(rpn: &[Token]) -> Result<i64, ExprError> {
    let mut stack: Vec<EvalItem> = Vec::new();
    for token in rpn {
        match token {
            Token::Literal(value) => stack.push(EvalItem::Value(*value as i64)),
            Token::Ident(name) => {
                let value = name
                    .parse::<i64>()
                    .map_err(|_| ExprError::UnresolvedIdentifier(name.clone()))?;
                stack.push(EvalItem::Value(value));
            }
            Token::Op(op) => {
                let right = pop_value(&mut stack)?;
                let left = pop_value(&mut stack)?;
                let result = match op {
                    OpKind::Equal => (left == right) as i64,
                    OpKind::NotEqual => (left != right) as i64,
                    OpKind::GreaterEqual => (left >= right) as i64,
                    OpKind::LesserEqual => (left <= right) as i64,
                    OpKind::GreaterThan => (left > right) as i64,
                    OpKind::LesserThan => (left < right) as i64,
                    OpKind::And => (left != 0 && right != 0) as i64,
                    OpKind::Or => (left != 0 || right != 0) as i64,
                    OpKind::Modulo => {
                        left.checked_rem(right).ok_or(ExprError::ModuloByZero)?
                    }
                };
                stack.push(EvalItem::Value(result));
            }
            Token::TernaryMiddle => {
                let false_branch = pop_value(&mut stack)?;
                let true_branch = pop_value(&mut stack)?;
                stack.push(EvalItem::Branch(true_branch, false_branch));
            }
            Token::TernaryStart => match stack.pop() {
                Some(EvalItem::Branch(true_branch, false_branch)) => {
                    let condition = pop_value(&mut stack)?;
                    let chosen = if condition != 0 {
                        true_branch
                    } else {
                        false_branch
                    };
                    stack.push(EvalItem::Value(chosen));
                }
                _ => return Err(ExprError::TernaryWithoutMiddle),
            },
            Token::OpenGroup | Token::CloseGroup => {
                return Err(ExprError::UnbalancedStack(stack.len()));
            }
        }
    }
    match (stack.pop(), stack.len()) {
        (Some(EvalItem::Value(value)), 0) => Ok(value),
        (Some(EvalItem::Branch(..)), _) => Err(ExprError::MisplacedBranch),
        (Some(_), remaining) => Err(ExprError::UnbalancedStack(remaining + 1)),
        (None, _) => Err(ExprError::UnbalancedStack(0)),
    }
}

fn pop_value(stack: &mut Vec<EvalItem>) -> Result<i64, ExprError> {
    match stack.pop() {
        Some(EvalItem::Value(value)) => Ok(value),
        Some(EvalItem::Branch(..)) => Err(ExprError::MisplacedBranch),
        None => Err(ExprError::UnbalancedStack(0)),
    }
}
