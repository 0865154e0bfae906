//! Extraction of tagged contributions from overlay files.
//!
//! A member of an overlay class opts into weaving through a marker in its
//! doc comment: `@add` contributes the whole method to the target class,
//! `@beforeReturn` contributes the method's body statements for insertion
//! in front of the target method's first top-level `return`. Constants are
//! collected unconditionally.

use classloom_php::{ClassShape, LineSpan, Member, MemberKind, method_statements};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static ADD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@add\b").unwrap());
static BEFORE_RETURN_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@beforeReturn\b").unwrap());

/// Parsed value of a contributed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    /// Verbatim scalar expression text (numbers, quoted strings, ...).
    Scalar(String),
    /// Ordered list literal, one verbatim element per entry.
    List(Vec<String>),
}

impl ConstValue {
    fn parse(raw: &str) -> ConstValue {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            return ConstValue::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return ConstValue::Bool(false);
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect();
            return ConstValue::List(items);
        }
        ConstValue::Scalar(raw.to_string())
    }

    pub fn render(&self) -> String {
        match self {
            ConstValue::Bool(true) => "true".to_string(),
            ConstValue::Bool(false) => "false".to_string(),
            ConstValue::Scalar(text) => text.clone(),
            ConstValue::List(items) => format!("[{}]", items.join(",")),
        }
    }
}

/// A wholly new method for the target class, as verbatim declaration text.
#[derive(Debug, Clone)]
pub struct MethodContribution {
    pub name: String,
    pub text: String,
}

/// Body statements to run just before the target method returns.
#[derive(Debug, Clone)]
pub struct PrependContribution {
    pub name: String,
    pub body: String,
}

/// Everything one target accumulates across its overlay files.
///
/// Methods accumulate and never overwrite each other; constants sharing a
/// name are last-definition-wins, keeping the position of the first.
#[derive(Debug, Clone, Default)]
pub struct ContributionSet {
    pub append: Vec<MethodContribution>,
    pub prepend: Vec<PrependContribution>,
    pub constants: IndexMap<String, ConstValue>,
}

impl ContributionSet {
    pub fn is_empty(&self) -> bool {
        self.append.is_empty() && self.prepend.is_empty() && self.constants.is_empty()
    }

    pub fn merge(&mut self, other: ContributionSet) {
        self.append.extend(other.append);
        self.prepend.extend(other.prepend);
        for (name, value) in other.constants {
            self.constants.insert(name, value);
        }
    }
}

/// Collects tagged contributions out of one overlay file.
///
/// A file that does not parse into a balanced class contributes nothing;
/// the weave continues without it.
pub fn collect(source: &str) -> ContributionSet {
    let mut set = ContributionSet::default();
    let Some(shape) = ClassShape::parse(source) else {
        debug!("overlay declares no parsable class, nothing collected");
        return set;
    };
    let lines: Vec<&str> = source.lines().collect();

    for member in &shape.members {
        match member.kind {
            MemberKind::Method => {
                let Some(doc) = member.doc.as_deref() else {
                    continue;
                };
                if ADD_MARKER.is_match(doc) {
                    set.append.push(MethodContribution {
                        name: member.name.clone(),
                        text: span_text(&lines, member.span),
                    });
                }
                if BEFORE_RETURN_MARKER.is_match(doc) {
                    match prepend_body(source, member, &lines) {
                        Some(body) => set.prepend.push(PrependContribution {
                            name: member.name.clone(),
                            body,
                        }),
                        None => warn!(
                            method = %member.name,
                            "@beforeReturn contribution has no usable body, dropped"
                        ),
                    }
                }
            }
            MemberKind::Constant => {
                if let Some(raw) = constant_value_text(&lines, member.span) {
                    set.constants
                        .insert(member.name.clone(), ConstValue::parse(&raw));
                }
            }
        }
    }

    set
}

fn span_text(lines: &[&str], span: LineSpan) -> String {
    lines[span.start - 1..span.end].join("\n")
}

/// The contribution's own statements, excluding its trailing `return`.
fn prepend_body(source: &str, member: &Member, lines: &[&str]) -> Option<String> {
    let mut stmts = method_statements(source, member);
    if stmts.last().is_some_and(|s| s.is_return) {
        stmts.pop();
    }
    let first = stmts.first()?;
    let last = stmts.last()?;
    Some(lines[first.span.start - 1..last.span.end].join("\n"))
}

fn constant_value_text(lines: &[&str], span: LineSpan) -> Option<String> {
    let text = lines.get(span.start - 1..span.end)?.join("\n");
    let eq = text.find('=')?;
    let value = text[eq + 1..].trim();
    let value = value.strip_suffix(';').unwrap_or(value).trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERLAY: &str = r#"<?php

namespace App\Plugins\Audit\Models;

class Cart
{
    const AUDITED = true;
    const CHANNELS = [1, 2, 3];
    const LABEL = 'audit';

    /**
     * @add
     */
    public function auditTrail()
    {
        return $this->trail;
    }

    /**
     * @beforeReturn
     */
    public function total()
    {
        $this->record('total');
        return 0;
    }

    public function untagged()
    {
        return null;
    }
}
"#;

    #[test]
    fn markers_select_members() {
        let set = collect(OVERLAY);
        assert_eq!(set.append.len(), 1);
        assert_eq!(set.append[0].name, "auditTrail");
        assert!(set.append[0].text.contains("public function auditTrail()"));
        assert!(set.append[0].text.ends_with("}"));

        assert_eq!(set.prepend.len(), 1);
        assert_eq!(set.prepend[0].name, "total");
        assert!(set.prepend[0].body.contains("$this->record('total');"));
        assert!(!set.prepend[0].body.contains("return 0;"));
    }

    #[test]
    fn untagged_members_are_ignored() {
        let set = collect(OVERLAY);
        assert!(!set.append.iter().any(|m| m.name == "untagged"));
        assert!(!set.prepend.iter().any(|m| m.name == "untagged"));
    }

    #[test]
    fn constants_are_collected_unconditionally() {
        let set = collect(OVERLAY);
        assert_eq!(set.constants.len(), 3);
        assert_eq!(set.constants["AUDITED"], ConstValue::Bool(true));
        assert_eq!(
            set.constants["CHANNELS"],
            ConstValue::List(vec!["1".into(), "2".into(), "3".into()])
        );
        assert_eq!(set.constants["LABEL"], ConstValue::Scalar("'audit'".into()));
    }

    #[test]
    fn marker_must_be_a_whole_word() {
        let src = "<?php\nclass C\n{\n    /** @additional notes */\n    public function f()\n    {\n        return 1;\n    }\n}\n";
        assert!(collect(src).is_empty());
    }

    #[test]
    fn merge_is_last_definition_wins_for_constants_only() {
        let mut a = collect("<?php\nclass C\n{\n    const X = 1;\n}\n");
        let b = collect("<?php\nclass C\n{\n    const X = 2;\n    const Y = 3;\n}\n");
        a.merge(b);
        assert_eq!(a.constants["X"], ConstValue::Scalar("2".into()));
        let keys: Vec<_> = a.constants.keys().cloned().collect();
        assert_eq!(keys, vec!["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn prepend_without_a_body_is_dropped() {
        let src = "<?php\nclass C\n{\n    /** @beforeReturn */\n    public function f()\n    {\n        return 1;\n    }\n}\n";
        let set = collect(src);
        assert!(set.prepend.is_empty());
    }

    #[test]
    fn malformed_overlay_contributes_nothing() {
        let set = collect("<?php\nclass Broken\n{\n    public function f() {\n");
        assert!(set.is_empty());
    }
}
