//! A C# subset parser and CST library for build-time source transformation.
//!
//! This crate parses C# source files far enough to edit class declarations:
//! using directives, namespaces, class headers with base lists, and nested
//! classes are modeled structurally, while every other construct rides along
//! as a verbatim raw run. Serialization re-emits the whole file in a
//! normalized format.
//!
//! # Overview
//!
//! - **Parsing**: [`parse_unit`] turns source text into a [`CompilationUnit`].
//! - **Locating**: [`collect_classes`] finds classes extending a marker base
//!   type, addressed by stable [`ClassPath`]s.
//! - **Editing**: [`synthesize_method`] and [`append_method`] build and
//!   splice the injected method; every edit yields a new tree snapshot.
//! - **Serialization**: [`serialize`] (or the [`Codegen`] trait) converts a
//!   tree back to text.
//!
//! # Quick Start
//!
//! ```
//! use srcview_cst::{parse_unit, collect_classes, synthesize_method, append_method, serialize};
//!
//! let source = "public class FooController : Controller { }";
//! let unit = parse_unit(source).expect("parse error");
//!
//! let mut tree = unit;
//! for m in collect_classes(&tree, "Controller") {
//!     let method = synthesize_method("Source", "ActionResult", "View");
//!     tree = append_method(&tree, &m.path, method).expect("path resolves");
//! }
//! assert!(serialize(&tree).contains("public ActionResult Source()"));
//! ```
//!
//! # Normalization
//!
//! Serialization always produces normalized formatting, so the first
//! parse/serialize pass may reflow whitespace. The output is a fixed point:
//! serializing the parse of already-normalized text reproduces it byte for
//! byte.

pub mod nodes;
pub use nodes::{
    Argument, CallExpr, ClassDecl, Codegen, CodegenState, CompilationUnit, Item, Member,
    MethodDecl, NamespaceDecl, RawLine, RawRun, Statement, TypeRef, UsingDirective,
};

pub mod tokenizer;
pub use tokenizer::{tokenize, TokError, Token, TokenKind};

pub mod parser;
pub use parser::{parse_unit, ParserError};

pub mod visitor;
pub use visitor::{collect_classes, ClassMatch, ClassPath};

pub mod transform;
pub use transform::{append_method, synthesize_method, TransformError};

/// Serializes a tree back to source text with normalized formatting.
pub fn serialize(unit: &CompilationUnit) -> String {
    let mut state = CodegenState::new();
    unit.codegen(&mut state);
    state.finish()
}

// ============================================================================
// Tests
// ============================================================================
