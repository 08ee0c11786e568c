//! Read-only traversal: locating classes that extend a marker base type.
//!
//! Traversal is depth-first over every item and member with no pruning, so
//! matches are found at any nesting depth and inside non-matching classes.
//! Each match is addressed by a [`ClassPath`], the stable identity used by
//! the tree editor: a sequence of child indices from the unit root. Because
//! the editor only ever appends to member lists, paths collected before a
//! sequence of edits stay valid across all of them.

use crate::nodes::{ClassDecl, CompilationUnit, Item, Member};

// ============================================================================
// Class Paths
// ============================================================================

/// Index path from the unit root to a class declaration.
///
/// Each element indexes the children of the current node: the unit's items,
/// a namespace's items, or a class's members. A path always terminates at a
/// class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPath(Vec<usize>);

impl ClassPath {
    fn segments(&self) -> &[usize] {
        &self.0
    }
}

/// One located class: its declared name plus its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMatch {
    pub name: String,
    pub path: ClassPath,
}

// ============================================================================
// Collection
// ============================================================================

/// Walks the unit depth-first and returns every class whose base list
/// contains a reference textually equal to `marker`.
///
/// Read-only; returns an empty vector when nothing matches. Matching is
/// exact and case-sensitive on the rendered base text, so aliases and
/// qualified names that differ textually from the marker do not match.
pub fn collect_classes(unit: &CompilationUnit, marker: &str) -> Vec<ClassMatch> {
    let mut matches = Vec::new();
    let mut path = Vec::new();
    collect_in_items(&unit.items, marker, &mut path, &mut matches);
    matches
}

fn collect_in_items(
    items: &[Item],
    marker: &str,
    path: &mut Vec<usize>,
    matches: &mut Vec<ClassMatch>,
) {
    for (i, item) in items.iter().enumerate() {
        path.push(i);
        match item {
            Item::Namespace(ns) => collect_in_items(&ns.items, marker, path, matches),
            Item::Class(class) => collect_in_class(class, marker, path, matches),
            Item::Using(_) | Item::Raw(_) => {}
        }
        path.pop();
    }
}

fn collect_in_class(
    class: &ClassDecl,
    marker: &str,
    path: &mut Vec<usize>,
    matches: &mut Vec<ClassMatch>,
) {
    if class.extends(marker) {
        matches.push(ClassMatch {
            name: class.name.clone(),
            path: ClassPath(path.clone()),
        });
    }
    for (i, member) in class.members.iter().enumerate() {
        if let Member::Class(nested) = member {
            path.push(i);
            collect_in_class(nested, marker, path, matches);
            path.pop();
        }
    }
}

// ============================================================================
// Path Resolution
// ============================================================================

/// Resolves a path to a mutable class reference inside `unit`, or `None`
/// if the path does not address a class in this snapshot.
pub(crate) fn class_at_mut<'u>(
    unit: &'u mut CompilationUnit,
    path: &ClassPath,
) -> Option<&'u mut ClassDecl> {
    class_in_items_mut(&mut unit.items, path.segments())
}

fn class_in_items_mut<'u>(items: &'u mut [Item], path: &[usize]) -> Option<&'u mut ClassDecl> {
    let (&i, rest) = path.split_first()?;
    match items.get_mut(i)? {
        Item::Class(class) => class_in_class_mut(class, rest),
        Item::Namespace(ns) => class_in_items_mut(&mut ns.items, rest),
        Item::Using(_) | Item::Raw(_) => None,
    }
}

fn class_in_class_mut<'u>(class: &'u mut ClassDecl, path: &[usize]) -> Option<&'u mut ClassDecl> {
    let Some((&i, rest)) = path.split_first() else {
        return Some(class);
    };
    match class.members.get_mut(i)? {
        Member::Class(nested) => class_in_class_mut(nested, rest),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
