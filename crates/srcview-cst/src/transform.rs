//! Method synthesis and tree editing.
//!
//! The editor never mutates a tree in place: [`append_method`] clones the
//! unit, splices into the clone, and hands the new snapshot back. Repeated
//! edits fold each match through the previous iteration's output. Appending
//! at the end of a member list never shifts the indices any other collected
//! [`ClassPath`] relies on, so one set of matches drives the whole fold.

use thiserror::Error;

use crate::nodes::{
    Argument, CallExpr, CompilationUnit, Member, MethodDecl, Statement, TypeRef,
};
use crate::visitor::{class_at_mut, ClassPath};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for tree edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The path does not address a class in the given tree snapshot.
    #[error("class path does not resolve in this tree")]
    InvalidPath,
}

// ============================================================================
// Method Synthesis
// ============================================================================

/// Builds the injected diagnostic method node.
///
/// Pure and deterministic. The shape is fixed: `public`, the given return
/// type, the given name, no parameters, and a body consisting of a single
/// `return view_call("name");` statement whose string literal equals the
/// method's own name. Formatting is applied by codegen alongside the rest
/// of the file.
pub fn synthesize_method(name: &str, return_type: &str, view_call: &str) -> MethodDecl {
    MethodDecl {
        modifiers: vec!["public".to_string()],
        return_type: TypeRef::new(return_type),
        name: name.to_string(),
        params: Vec::new(),
        body: vec![Statement::Return(CallExpr {
            callee: view_call.to_string(),
            args: vec![Argument::StringLit(name.to_string())],
        })],
    }
}

// ============================================================================
// Tree Editing
// ============================================================================

/// Returns a new tree in which `method` is appended to the member list of
/// the class addressed by `path`. The input tree is left untouched.
///
/// # Errors
///
/// [`TransformError::InvalidPath`] if `path` does not resolve to a class in
/// this snapshot.
pub fn append_method(
    unit: &CompilationUnit,
    path: &ClassPath,
    method: MethodDecl,
) -> Result<CompilationUnit, TransformError> {
    let mut next = unit.clone();
    let class = class_at_mut(&mut next, path).ok_or(TransformError::InvalidPath)?;
    class.members.push(Member::Method(method));
    Ok(next)
}

// ============================================================================
// Tests
// ============================================================================
