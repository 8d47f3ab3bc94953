use crate::expr::{ExprError, Parser, Token};

/// Namespace prefix of the arithmetic macro set shipped with the LaTeX
/// gettext package. Every compiled operator renders as
/// `\<prefix><opcode>{..}{..}`.
pub const DEFAULT_PREFIX: &str = "gettextmath";

/// The reserved identifier a plural rule uses for the runtime count.
pub const COUNT_IDENTIFIER: &str = "n";

enum Operand {
    Text(String),
    Branch {
        true_branch: String,
        false_branch: String,
    },
}

/// Renders an RPN token sequence as nested macro calls. The output is the
/// compatibility surface with the rendering engine's macro set and must not
/// change shape.
pub fn render(rpn: &[Token], prefix: &str) -> Result<String, ExprError> {
    let mut stack: Vec<Operand> = Vec::new();
    for token in rpn {
        match token {
            Token::Literal(value) => stack.push(Operand::Text(value.to_string())),
            Token::Ident(name) => stack.push(Operand::Text(name.clone())),
            Token::Op(op) => {
                let right = pop_text(&mut stack)?;
                let left = pop_text(&mut stack)?;
                stack.push(Operand::Text(command_call(
                    op.opcode(),
                    prefix,
                    &[&left, &right],
                )));
            }
            Token::TernaryMiddle => {
                let false_branch = pop_text(&mut stack)?;
                let true_branch = pop_text(&mut stack)?;
                stack.push(Operand::Branch {
                    true_branch,
                    false_branch,
                });
            }
            Token::TernaryStart => match stack.pop() {
                Some(Operand::Branch {
                    true_branch,
                    false_branch,
                }) => {
                    let condition = pop_text(&mut stack)?;
                    stack.push(Operand::Text(command_call(
                        "ifthenelse",
                        prefix,
                        &[&condition, &true_branch, &false_branch],
                    )));
                }
                _ => return Err(ExprError::TernaryWithoutMiddle),
            },
            Token::OpenGroup | Token::CloseGroup => {
                return Err(ExprError::UnbalancedGroup);
            }
        }
    }
    match (stack.pop(), stack.len()) {
        (Some(Operand::Text(rendered)), 0) => Ok(rendered),
        (Some(Operand::Branch { .. }), _) => Err(ExprError::MisplacedBranch),
        (Some(_), remaining) => Err(ExprError::UnbalancedStack(remaining + 1)),
        (None, _) => Err(ExprError::UnbalancedStack(0)),
    }
}

/// Compiles an infix expression straight to rendered macro calls, renaming
/// identifiers along the way.
pub fn compile(
    source: &str,
    prefix: &str,
    renames: &[(&str, &str)],
) -> Result<String, ExprError> {
    let mut parser = Parser::new(source);
    for (from, to) in renames {
        parser.rename_identifier(from, to);
    }
    render(&parser.parse()?, prefix)
}

/// Wraps a compiled expression as a one-argument LaTeX command with the
/// count identifier bound to `#1`.
pub fn define_macro(
    name: &str,
    source: &str,
    prefix: &str,
    renew: bool,
) -> Result<String, ExprError> {
    let body = compile(source, prefix, &[(COUNT_IDENTIFIER, "#1")])?;
    let command = if renew { "\\renewcommand" } else { "\\newcommand" };
    Ok(format!("{command}{{{name}}}[1]{{{body}}}"))
}

fn command_call(name: &str, prefix: &str, args: &[&str]) -> String {
    format!("\\{prefix}{name}{{{}}}", args.join("}{"))
}

fn pop_text(stack: &mut Vec<Operand>) -> Result<String, ExprError> {
    match stack.pop() {
        Some(Operand::Text(text)) => Ok(text),
        Some(Operand::Branch { .. }) => Err(ExprError::MisplacedBranch),
        None => Err(ExprError::UnbalancedStack(0)),
    }
}
