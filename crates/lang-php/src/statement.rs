use crate::scanner::{LineSpan, Member};
use crate::token::{TokenKind, lex};

/// One top-level statement of a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub span: LineSpan,
    /// True when the statement itself is a `return`. A `return` nested in a
    /// block, string, or comment never marks the enclosing statement.
    pub is_return: bool,
}

/// Splits a method body into its sequence of top-level statements.
///
/// Statements end at a `;` outside parentheses, or at the `}` closing a
/// block construct (`if`/`foreach`/`try`/...). `else`, `elseif`, `catch`,
/// `finally` and the `while` of a `do` continue the current statement.
/// A bodyless member, or one whose braces never balance, yields an empty
/// sequence.
pub fn method_statements(source: &str, member: &Member) -> Vec<Statement> {
    let tokens = lex(source);

    // Find this member's `function` keyword, then the body opening brace.
    let mut fn_idx = None;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind == TokenKind::Ident
            && tok.text == "function"
            && tok.line >= member.span.start
            && tok.line <= member.span.end
            && tokens[i + 1..]
                .iter()
                .find(|t| t.kind == TokenKind::Ident)
                .is_some_and(|t| t.text == member.name)
        {
            fn_idx = Some(i);
            break;
        }
    }
    let Some(fn_idx) = fn_idx else {
        return Vec::new();
    };

    let mut ob = None;
    for (i, tok) in tokens.iter().enumerate().skip(fn_idx) {
        match tok.kind {
            TokenKind::OpenBrace => {
                ob = Some(i);
                break;
            }
            TokenKind::Semicolon => return Vec::new(),
            _ => {}
        }
    }
    let Some(ob) = ob else {
        return Vec::new();
    };

    let mut stmts = Vec::new();
    let mut depth = 1usize;
    let mut paren = 0usize;
    let mut start_line: Option<usize> = None;
    let mut first_word = String::new();

    let mut k = ob + 1;
    while k < tokens.len() {
        let tok = &tokens[k];
        match tok.kind {
            TokenKind::OpenParen => paren += 1,
            TokenKind::CloseParen => paren = paren.saturating_sub(1),
            TokenKind::OpenBrace => {
                if depth == 1 && start_line.is_none() {
                    start_line = Some(tok.line);
                    first_word.clear();
                }
                depth += 1;
            }
            TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                if depth == 1 && !continues_statement(&tokens, k, &first_word) {
                    if let Some(start) = start_line.take() {
                        stmts.push(Statement {
                            span: LineSpan {
                                start,
                                end: tok.line,
                            },
                            is_return: first_word == "return",
                        });
                    }
                }
            }
            TokenKind::Semicolon => {
                if depth == 1 && paren == 0 {
                    if let Some(start) = start_line.take() {
                        stmts.push(Statement {
                            span: LineSpan {
                                start,
                                end: tok.line,
                            },
                            is_return: first_word == "return",
                        });
                    }
                }
            }
            _ => {
                if depth == 1 && start_line.is_none() {
                    start_line = Some(tok.line);
                    first_word = match tok.kind {
                        TokenKind::Ident => tok.text.to_string(),
                        _ => String::new(),
                    };
                }
            }
        }
        k += 1;
    }

    stmts
}

fn continues_statement(
    tokens: &[crate::token::Token<'_>],
    close_idx: usize,
    first_word: &str,
) -> bool {
    match tokens.get(close_idx + 1) {
        Some(next) if next.kind == TokenKind::Ident => {
            matches!(next.text, "else" | "elseif" | "catch" | "finally")
                || (first_word == "do" && next.text == "while")
        }
        _ => false,
    }
}
