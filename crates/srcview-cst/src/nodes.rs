//! CST node types and code generation.
//!
//! The tree is owned and immutable-per-snapshot: edits clone the unit and
//! splice, they never mutate a shared tree in place. Serialization goes
//! through the [`Codegen`] trait with a [`CodegenState`] accumulator, and
//! always emits normalized formatting (4-space indent, Allman braces, one
//! declaration per line). Normalization is a pure function of the node
//! content, which is what makes serialize-after-parse idempotent.
//!
//! Constructs the parser does not model structurally (method bodies, fields,
//! properties, non-class type declarations) are carried as [`RawRun`]s:
//! verbatim source lines, dedented on capture and re-indented on emission.

use std::fmt;

// ============================================================================
// Codegen Infrastructure
// ============================================================================

/// Accumulator for code generation: an output buffer plus the current
/// indentation depth.
#[derive(Debug, Default)]
pub struct CodegenState {
    buf: String,
    indent: usize,
}

/// One indentation step.
const INDENT: &str = "    ";

impl CodegenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line at the current indent. An empty `text` produces a
    /// bare newline with no trailing whitespace.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Writes `{` on its own line and indents.
    pub fn open_block(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    /// Dedents and writes `}` on its own line.
    pub fn close_block(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    /// Writes one line exactly as given, with no indentation. Used for
    /// lines that begin inside a multi-line string literal, where leading
    /// whitespace is content.
    pub fn verbatim_line(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Consumes the state and returns the generated text.
    pub fn finish(self) -> String {
        self.buf
    }
}

impl fmt::Display for CodegenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

/// Conversion from a CST node back to source text.
pub trait Codegen {
    fn codegen(&self, state: &mut CodegenState);
}

// ============================================================================
// Compilation Unit
// ============================================================================

/// A whole parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub items: Vec<Item>,
}

/// A top-level or namespace-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Using(UsingDirective),
    Namespace(NamespaceDecl),
    Class(ClassDecl),
    /// Anything else at declaration level: interfaces, enums, structs,
    /// records, standalone comments, preprocessor regions.
    Raw(RawRun),
}

/// A `using` directive, stored verbatim including the terminating `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    pub text: String,
}

/// A namespace declaration, braced or file-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub name: String,
    pub file_scoped: bool,
    pub items: Vec<Item>,
}

// ============================================================================
// Class Declarations
// ============================================================================

/// A reference to a type in a base list, rendered as text.
///
/// Matching against the marker base type is exact textual equality on this
/// rendered form; no semantic resolution happens anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
}

impl TypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        TypeRef { text: text.into() }
    }
}

/// A class declaration with a structurally parsed header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Attribute groups preceding the declaration, one `[...]` per entry.
    pub attributes: Vec<String>,
    pub modifiers: Vec<String>,
    pub name: String,
    /// Rendered generic parameter list including angle brackets, if any.
    pub type_params: Option<String>,
    pub bases: Vec<TypeRef>,
    /// Rendered `where ...` constraint clauses, if any.
    pub where_clause: Option<String>,
    pub members: Vec<Member>,
}

impl ClassDecl {
    /// True iff the base list contains a reference whose rendered text
    /// equals `marker` exactly (case-sensitive).
    pub fn extends(&self, marker: &str) -> bool {
        self.bases.iter().any(|b| b.text == marker)
    }
}

/// A class body member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Class(ClassDecl),
    Method(MethodDecl),
    /// Any member the parser keeps verbatim: fields, properties, hand-written
    /// methods, constructors, events, comments.
    Raw(RawRun),
}

// ============================================================================
// Methods (synthesized shape only)
// ============================================================================

/// A structurally modeled method. Only synthesized methods take this form;
/// methods already present in the source stay as [`Member::Raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Vec<String>,
    pub return_type: TypeRef,
    pub name: String,
    /// Rendered parameter declarations. Always empty for synthesized methods.
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

/// A statement in a structurally modeled method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Return(CallExpr),
}

/// A simple call expression, `callee(args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub callee: String,
    pub args: Vec<Argument>,
}

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    StringLit(String),
}

// ============================================================================
// Raw Runs
// ============================================================================

/// One line of a [`RawRun`].
///
/// A `verbatim` line begins inside a multi-line string literal: its bytes are
/// literal content, so it is exempt from trimming, dedenting and
/// re-indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub verbatim: bool,
}

impl RawLine {
    pub fn code(text: impl Into<String>) -> Self {
        RawLine {
            text: text.into(),
            verbatim: false,
        }
    }
}

/// A verbatim run of source lines.
///
/// Captured from the token span of an unmodeled construct. The first line is
/// stored without leading whitespace; continuation lines are dedented by
/// their common leading whitespace so only indentation relative to the run
/// survives. Emission re-indents every line at the current depth, which keeps
/// capture-and-emit stable across repeated normalization passes. Lines inside
/// multi-line string literals are stored and emitted byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRun {
    pub lines: Vec<RawLine>,
}

impl RawRun {
    /// Builds a run from a byte span of the source text, with no string
    /// literals crossing line boundaries.
    pub fn from_span(text: &str, start: usize, end: usize) -> Self {
        Self::from_span_protected(text, start, end, &[])
    }

    /// Builds a run from a byte span of the source text. `protected` holds
    /// the absolute byte ranges of multi-line string literals within the
    /// span; lines starting inside one are kept verbatim, and a line where
    /// one opens keeps its trailing whitespace.
    pub fn from_span_protected(
        text: &str,
        start: usize,
        end: usize,
        protected: &[(usize, usize)],
    ) -> Self {
        let span = &text[start..end];
        let mut lines = Vec::new();
        let mut offset = start;
        for raw in span.split('\n') {
            let line_start = offset;
            let line_end = offset + raw.len();
            offset = line_end + 1;

            let inside = protected
                .iter()
                .any(|&(s, e)| line_start > s && line_start < e);
            if inside {
                lines.push(RawLine {
                    text: raw.to_string(),
                    verbatim: true,
                });
                continue;
            }
            // A literal opening on this line runs past the newline; its
            // trailing whitespace is literal content.
            let opens_literal = protected
                .iter()
                .any(|&(s, e)| (line_start..=line_end).contains(&s) && e > line_end);
            let kept = if opens_literal { raw } else { raw.trim_end() };
            lines.push(RawLine::code(kept));
        }
        if lines.len() > 1 {
            let common = common_indent(&lines[1..]);
            for line in &mut lines[1..] {
                if !line.verbatim && !line.text.is_empty() {
                    line.text = dedented(&line.text, common);
                }
            }
        }
        RawRun { lines }
    }

    /// The line texts in order, ignoring the verbatim flags.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Length in bytes of the longest whitespace prefix shared by all non-empty
/// dedentable lines.
fn common_indent(lines: &[RawLine]) -> usize {
    lines
        .iter()
        .filter(|l| !l.verbatim && !l.text.is_empty())
        .map(|l| l.text.len() - l.text.trim_start().len())
        .min()
        .unwrap_or(0)
}

/// Strips up to `common` bytes of leading whitespace, backing off to the
/// nearest char boundary so multi-byte whitespace never splits.
fn dedented(line: &str, common: usize) -> String {
    let prefix = line.len() - line.trim_start().len();
    let mut cut = common.min(prefix);
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line[cut..].to_string()
}

// ============================================================================
// Codegen Implementations
// ============================================================================

impl Codegen for CompilationUnit {
    fn codegen(&self, state: &mut CodegenState) {
        for item in &self.items {
            item.codegen(state);
        }
    }
}

impl Codegen for Item {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Item::Using(u) => state.line(&u.text),
            Item::Namespace(ns) => ns.codegen(state),
            Item::Class(c) => c.codegen(state),
            Item::Raw(r) => r.codegen(state),
        }
    }
}

impl Codegen for NamespaceDecl {
    fn codegen(&self, state: &mut CodegenState) {
        if self.file_scoped {
            state.line(&format!("namespace {};", self.name));
            for item in &self.items {
                item.codegen(state);
            }
        } else {
            state.line(&format!("namespace {}", self.name));
            state.open_block();
            for item in &self.items {
                item.codegen(state);
            }
            state.close_block();
        }
    }
}

impl Codegen for ClassDecl {
    fn codegen(&self, state: &mut CodegenState) {
        for attr in &self.attributes {
            state.line(attr);
        }
        let mut header = String::new();
        for m in &self.modifiers {
            header.push_str(m);
            header.push(' ');
        }
        header.push_str("class ");
        header.push_str(&self.name);
        if let Some(tp) = &self.type_params {
            header.push_str(tp);
        }
        if !self.bases.is_empty() {
            header.push_str(" : ");
            let rendered: Vec<&str> = self.bases.iter().map(|b| b.text.as_str()).collect();
            header.push_str(&rendered.join(", "));
        }
        if let Some(wc) = &self.where_clause {
            header.push(' ');
            header.push_str(wc);
        }
        state.line(&header);
        state.open_block();
        for member in &self.members {
            member.codegen(state);
        }
        state.close_block();
    }
}

impl Codegen for Member {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Member::Class(c) => c.codegen(state),
            Member::Method(m) => m.codegen(state),
            Member::Raw(r) => r.codegen(state),
        }
    }
}

impl Codegen for MethodDecl {
    fn codegen(&self, state: &mut CodegenState) {
        let mut header = String::new();
        for m in &self.modifiers {
            header.push_str(m);
            header.push(' ');
        }
        header.push_str(&self.return_type.text);
        header.push(' ');
        header.push_str(&self.name);
        header.push('(');
        header.push_str(&self.params.join(", "));
        header.push(')');
        state.line(&header);
        state.open_block();
        for stmt in &self.body {
            stmt.codegen(state);
        }
        state.close_block();
    }
}

impl Codegen for Statement {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Statement::Return(call) => {
                state.line(&format!("return {};", render_call(call)));
            }
        }
    }
}

fn render_call(call: &CallExpr) -> String {
    let args: Vec<String> = call.args.iter().map(render_argument).collect();
    format!("{}({})", call.callee, args.join(", "))
}

fn render_argument(arg: &Argument) -> String {
    match arg {
        Argument::StringLit(s) => {
            let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
    }
}

impl Codegen for RawRun {
    fn codegen(&self, state: &mut CodegenState) {
        for line in &self.lines {
            if line.verbatim {
                state.verbatim_line(&line.text);
            } else {
                state.line(&line.text);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn render(node: &impl Codegen) -> String {
        let mut state = CodegenState::new();
        node.codegen(&mut state);
        state.finish()
    }

    #[test]
    fn method_codegen_fixed_shape() {
        let method = MethodDecl {
            modifiers: vec!["public".to_string()],
            return_type: TypeRef::new("ActionResult"),
            name: "Source".to_string(),
            params: Vec::new(),
            body: vec![Statement::Return(CallExpr {
                callee: "View".to_string(),
                args: vec![Argument::StringLit("Source".to_string())],
            })],
        };
        assert_eq!(
            render(&method),
            "public ActionResult Source()\n{\n    return View(\"Source\");\n}\n"
        );
    }

    #[test]
    fn class_header_with_bases() {
        let class = ClassDecl {
            attributes: vec!["[Authorize]".to_string()],
            modifiers: vec!["public".to_string()],
            name: "HomeController".to_string(),
            type_params: None,
            bases: vec![TypeRef::new("Controller"), TypeRef::new("IDisposable")],
            where_clause: None,
            members: Vec::new(),
        };
        assert_eq!(
            render(&class),
            "[Authorize]\npublic class HomeController : Controller, IDisposable\n{\n}\n"
        );
    }

    #[test]
    fn raw_run_dedents_continuation_lines() {
        let src = "int x;\n        int y;\n        int z;";
        let run = RawRun::from_span(src, 0, src.len());
        assert_eq!(run.texts(), vec!["int x;", "int y;", "int z;"]);
    }

    #[test]
    fn raw_run_keeps_relative_indent() {
        let src = "void F()\n    {\n        x = 1;\n    }";
        let run = RawRun::from_span(src, 0, src.len());
        assert_eq!(run.texts(), vec!["void F()", "{", "    x = 1;", "}"]);
    }

    #[test]
    fn raw_run_reindents_on_emit() {
        let run = RawRun {
            lines: vec![RawLine::code("int x;"), RawLine::code("int y;")],
        };
        let mut state = CodegenState::new();
        state.open_block();
        run.codegen(&mut state);
        state.close_block();
        assert_eq!(state.finish(), "{\n    int x;\n    int y;\n}\n");
    }

    #[test]
    fn raw_run_keeps_string_interior_untouched() {
        let src = "    string s = @\"line1  \n  line2\";";
        let literal_start = src.find('@').unwrap();
        let run = RawRun::from_span_protected(src, 4, src.len(), &[(literal_start, src.len())]);
        // Trailing whitespace before the newline is literal content.
        assert_eq!(run.lines[0], RawLine::code("string s = @\"line1  "));
        assert_eq!(
            run.lines[1],
            RawLine {
                text: "  line2\";".to_string(),
                verbatim: true,
            }
        );
    }

    #[test]
    fn verbatim_lines_emit_without_indent() {
        let run = RawRun {
            lines: vec![
                RawLine::code("string s = @\"a"),
                RawLine {
                    text: "  b\";".to_string(),
                    verbatim: true,
                },
            ],
        };
        let mut state = CodegenState::new();
        state.open_block();
        run.codegen(&mut state);
        state.close_block();
        assert_eq!(state.finish(), "{\n    string s = @\"a\n  b\";\n}\n");
    }

    #[test]
    fn dedent_backs_off_from_multibyte_whitespace() {
        // U+3000 is three bytes; the common indent (two bytes) lands inside
        // it, so that line must be left alone rather than sliced mid-char.
        let src = "int a;\n\u{3000}int b;\n  int c;";
        let run = RawRun::from_span(src, 0, src.len());
        assert_eq!(run.texts(), vec!["int a;", "\u{3000}int b;", "int c;"]);
    }

    #[test]
    fn string_literal_argument_is_escaped() {
        let call = CallExpr {
            callee: "View".to_string(),
            args: vec![Argument::StringLit("a \"b\"".to_string())],
        };
        assert_eq!(render_call(&call), "View(\"a \\\"b\\\"\")");
    }

    #[test]
    fn extends_is_exact_and_case_sensitive() {
        let class = ClassDecl {
            attributes: Vec::new(),
            modifiers: Vec::new(),
            name: "A".to_string(),
            type_params: None,
            bases: vec![TypeRef::new("BaseController")],
            where_clause: None,
            members: Vec::new(),
        };
        assert!(!class.extends("Controller"));
        assert!(!class.extends("basecontroller"));
        assert!(class.extends("BaseController"));
    }
}
