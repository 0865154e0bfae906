use crate::token::{Token, TokenKind, lex};

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Constant,
}

/// A named member of a class body, located by line span.
///
/// For methods the span runs from the first modifier token of the
/// declaration through the closing brace of the body (or the semicolon of
/// an abstract signature). For constants it covers the `const` statement.
#[derive(Debug, Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    pub span: LineSpan,
    /// Doc comment directly preceding the declaration, if any.
    pub doc: Option<String>,
}

/// Structural facts about the first class declared in a file.
#[derive(Debug, Clone)]
pub struct ClassShape {
    pub name: String,
    pub open_brace_line: usize,
    pub close_brace_line: usize,
    /// Line of the last `const` declaration in the body, if any.
    pub last_const_line: Option<usize>,
    pub members: Vec<Member>,
}

/// True iff the token stream contains a `class` definition keyword.
///
/// A `class` token immediately preceded by `::` is the class-name constant
/// (`Foo::class`), not a definition, and does not count.
pub fn declares_class(source: &str) -> bool {
    class_keyword_index(&lex(source)).is_some()
}

/// Locates a named member's declaration span, or `None` when the file does
/// not parse into a balanced class body.
pub fn find_member_span(source: &str, name: &str) -> Option<LineSpan> {
    ClassShape::parse(source)?.member(name).map(|m| m.span)
}

fn class_keyword_index(tokens: &[Token<'_>]) -> Option<usize> {
    tokens.iter().enumerate().position(|(i, tok)| {
        tok.kind == TokenKind::Ident
            && tok.text.eq_ignore_ascii_case("class")
            && (i == 0 || tokens[i - 1].kind != TokenKind::DoubleColon)
    })
}

impl ClassShape {
    /// Parses the first class declaration out of `source`.
    ///
    /// Returns `None` when no class is declared or the body braces never
    /// balance; callers treat that as "nothing to contribute / nothing to
    /// weave" rather than an error.
    pub fn parse(source: &str) -> Option<ClassShape> {
        let tokens = lex(source);
        let class_idx = class_keyword_index(&tokens)?;
        let name = tokens[class_idx + 1..]
            .iter()
            .find(|t| t.kind == TokenKind::Ident)?
            .text
            .to_string();
        let open_idx =
            (class_idx..tokens.len()).find(|&i| tokens[i].kind == TokenKind::OpenBrace)?;

        let mut members = Vec::new();
        let mut last_const_line = None;
        let mut close_brace_line = None;
        let mut depth = 0usize;
        let mut pending_doc: Option<String> = None;
        let mut decl_start: Option<usize> = None;

        let mut i = open_idx;
        while i < tokens.len() {
            let tok = &tokens[i];
            match tok.kind {
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        close_brace_line = Some(tok.line);
                        break;
                    }
                }
                TokenKind::DocComment if depth == 1 => {
                    pending_doc = Some(tok.text.to_string());
                    decl_start = None;
                }
                TokenKind::Semicolon if depth == 1 => {
                    decl_start = None;
                    pending_doc = None;
                }
                TokenKind::Ident if depth == 1 && tok.text == "function" => {
                    let start_line = decl_start.take().unwrap_or(tok.line);
                    let (mname, end_idx, end_line) = method_extent(&tokens, i)?;
                    members.push(Member {
                        kind: MemberKind::Method,
                        name: mname,
                        span: LineSpan {
                            start: start_line,
                            end: end_line,
                        },
                        doc: pending_doc.take(),
                    });
                    // Jump past the body; nested braces are already matched.
                    i = end_idx;
                }
                TokenKind::Ident if depth == 1 && tok.text == "const" => {
                    let start_line = decl_start.take().unwrap_or(tok.line);
                    let (cname, end_idx, end_line) = const_extent(&tokens, i)?;
                    last_const_line = Some(end_line);
                    members.push(Member {
                        kind: MemberKind::Constant,
                        name: cname,
                        span: LineSpan {
                            start: start_line,
                            end: end_line,
                        },
                        doc: pending_doc.take(),
                    });
                    i = end_idx;
                }
                _ if depth == 1 => {
                    if decl_start.is_none() {
                        decl_start = Some(tok.line);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Some(ClassShape {
            name,
            open_brace_line: tokens[open_idx].line,
            close_brace_line: close_brace_line?,
            last_const_line,
            members,
        })
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Method)
    }

    pub fn constants(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Constant)
    }
}

/// Resolves a method declaration starting at the `function` keyword to its
/// name and final token (closing brace, or semicolon for a bodyless
/// signature).
fn method_extent(tokens: &[Token<'_>], fn_idx: usize) -> Option<(String, usize, usize)> {
    let mut j = fn_idx + 1;
    while j < tokens.len() && tokens[j].kind != TokenKind::Ident {
        if tokens[j].kind == TokenKind::OpenParen {
            return None;
        }
        j += 1;
    }
    let name = tokens.get(j)?.text.to_string();

    let mut depth = 0usize;
    let mut k = j + 1;
    while k < tokens.len() {
        match tokens[k].kind {
            TokenKind::Semicolon if depth == 0 => return Some((name, k, tokens[k].line)),
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((name, k, tokens[k].line));
                }
            }
            _ => {}
        }
        k += 1;
    }
    None
}

fn const_extent(tokens: &[Token<'_>], const_idx: usize) -> Option<(String, usize, usize)> {
    let mut name = None;
    let mut j = const_idx + 1;
    while j < tokens.len() {
        match tokens[j].kind {
            TokenKind::Ident if name.is_none() => name = Some(tokens[j].text.to_string()),
            TokenKind::Semicolon => return Some((name?, j, tokens[j].line)),
            _ => {}
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CART: &str = r#"<?php

namespace App\Plugins\Shop\Models;

class Cart
{
    const CURRENCY = 'EUR';

    private $items = [];

    /**
     * Running total of the cart.
     */
    public function total()
    {
        $sum = 0;
        foreach ($this->items as $item) {
            $sum += $item->price;
        }
        return $sum;
    }

    public function clear(): void
    {
        $this->items = [];
    }
}
"#;

    #[test]
    fn detects_class_definitions() {
        assert!(declares_class(CART));
        assert!(declares_class("<?php abstract class A {}"));
    }

    #[test]
    fn class_name_constant_is_not_a_definition() {
        assert!(!declares_class("<?php return Cart::class;"));
        assert!(!declares_class("<?php $c = 'class';"));
        assert!(!declares_class("<?php // class Hidden {}"));
    }

    #[test]
    fn shape_reports_braces_and_members() {
        let shape = ClassShape::parse(CART).unwrap();
        assert_eq!(shape.name, "Cart");
        assert_eq!(shape.open_brace_line, 6);
        assert_eq!(shape.close_brace_line, 27);
        assert_eq!(shape.last_const_line, Some(7));

        let total = shape.member("total").unwrap();
        assert_eq!(total.kind, MemberKind::Method);
        assert_eq!(total.span, LineSpan { start: 14, end: 21 });
        assert!(total.doc.as_deref().unwrap().contains("Running total"));

        let clear = shape.member("clear").unwrap();
        assert_eq!(clear.span, LineSpan { start: 23, end: 26 });
        assert!(clear.doc.is_none());
    }

    #[test]
    fn method_span_includes_modifiers() {
        let src = "<?php\nclass A\n{\n    public static function f()\n    {\n        return 1;\n    }\n}\n";
        let span = find_member_span(src, "f").unwrap();
        assert_eq!(span, LineSpan { start: 4, end: 7 });
    }

    #[test]
    fn unbalanced_body_yields_no_shape() {
        let src = "<?php\nclass A\n{\n    public function f()\n    {\n        return 1;\n}\n";
        assert!(ClassShape::parse(src).is_none());
    }

    #[test]
    fn abstract_signature_ends_at_semicolon() {
        let src = "<?php\nabstract class A\n{\n    abstract public function f();\n\n    public function g()\n    {\n    }\n}\n";
        let shape = ClassShape::parse(src).unwrap();
        assert_eq!(shape.member("f").unwrap().span, LineSpan { start: 4, end: 4 });
        assert_eq!(shape.member("g").unwrap().span, LineSpan { start: 6, end: 8 });
    }

    #[test]
    fn constant_between_methods_is_found() {
        let src = "<?php\nclass A\n{\n    const A = 1;\n    public function f()\n    {\n    }\n    const B = 2;\n}\n";
        let shape = ClassShape::parse(src).unwrap();
        assert_eq!(shape.last_const_line, Some(8));
        assert_eq!(shape.constants().count(), 2);
    }
}
