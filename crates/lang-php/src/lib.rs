//! Lexical layer for the PHP sources classloom weaves.
//!
//! This crate deliberately stops short of a full PHP parser. Weaving only
//! needs three structural facts about a file: whether it defines a class,
//! where each named member begins and ends, and how a method body splits
//! into top-level statements. Everything here works on a flat token stream
//! with brace/paren bookkeeping.

pub mod scanner;
pub mod statement;
pub mod token;

pub use scanner::{ClassShape, LineSpan, Member, MemberKind, declares_class, find_member_span};
pub use statement::{Statement, method_statements};
