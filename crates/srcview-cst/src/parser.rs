//! Recursive-descent parser for the C# declaration subset.
//!
//! The parser models what the transformation needs structurally (using
//! directives, namespaces, class declarations and their base lists, nested
//! classes) and keeps everything else as verbatim [`RawRun`]s bounded by
//! balanced-delimiter scanning. This is deliberately shallow: the engine
//! only ever edits class member lists, so statement-level grammar never
//! needs to exist.

use thiserror::Error;

use crate::nodes::{
    ClassDecl, CompilationUnit, Item, Member, NamespaceDecl, RawRun, TypeRef, UsingDirective,
};
use crate::tokenizer::{tokenize, TokError, Token, TokenKind};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error(transparent)]
    Tokenize(#[from] TokError),

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("expected {expected}, found {found:?} at line {line}, column {col}")]
    Unexpected {
        expected: &'static str,
        found: String,
        line: usize,
        col: usize,
    },
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parser
// ============================================================================

/// Modifier keywords that may precede a class or member declaration.
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "sealed", "partial",
    "new", "unsafe", "readonly", "ref",
];

/// Parses a whole source file into a [`CompilationUnit`].
pub fn parse_unit(text: &str) -> Result<CompilationUnit> {
    let toks = tokenize(text)?;
    let mut parser = Parser {
        text,
        toks,
        pos: 0,
    };
    let items = parser.parse_items(true)?;
    Ok(CompilationUnit { items })
}

struct Parser<'a> {
    text: &'a str,
    toks: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.toks.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn expect_punct(&mut self, text: &'static str) -> Result<Token<'a>> {
        match self.bump() {
            Some(tok) if tok.is_punct(text) => Ok(tok),
            Some(tok) => Err(ParserError::Unexpected {
                expected: text,
                found: tok.text.to_string(),
                line: tok.line,
                col: tok.col,
            }),
            None => Err(ParserError::UnexpectedEof { expected: text }),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<Token<'a>> {
        match self.bump() {
            Some(tok) if tok.kind == TokenKind::Ident => Ok(tok),
            Some(tok) => Err(ParserError::Unexpected {
                expected,
                found: tok.text.to_string(),
                line: tok.line,
                col: tok.col,
            }),
            None => Err(ParserError::UnexpectedEof { expected }),
        }
    }

    // ------------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------------

    /// Parses items until the enclosing `}` (or end of file when `top`).
    fn parse_items(&mut self, top: bool) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.is_punct("}") {
                if top {
                    // Stray close brace at file level: keep it verbatim rather
                    // than failing, the raw run scanner will pick it up.
                    items.push(Item::Raw(self.parse_raw_run_force()?));
                    continue;
                }
                break;
            }
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<Item> {
        let tok = self.peek().ok_or(ParserError::UnexpectedEof {
            expected: "declaration",
        })?;

        if tok.is_trivia() {
            return Ok(Item::Raw(self.parse_trivia_run()));
        }
        if tok.is_ident("using") {
            return Ok(Item::Using(self.parse_using()?));
        }
        if tok.is_ident("namespace") {
            return Ok(Item::Namespace(self.parse_namespace()?));
        }
        if self.at_standalone_attribute() {
            return Ok(Item::Raw(self.parse_standalone_attribute()?));
        }
        if let Some(class) = self.try_parse_class()? {
            return Ok(Item::Class(class));
        }
        Ok(Item::Raw(self.parse_raw_run()?))
    }

    /// Collects a maximal run of consecutive comment/directive tokens.
    fn parse_trivia_run(&mut self) -> RawRun {
        let first = self.toks[self.pos];
        let mut last = first;
        while let Some(tok) = self.peek() {
            if !tok.is_trivia() {
                break;
            }
            last = tok;
            self.pos += 1;
        }
        RawRun::from_span(self.text, first.start, last.end)
    }

    /// True at the start of an `[assembly: ...]` or `[module: ...]`
    /// attribute, the only attribute forms that stand alone at item level.
    fn at_standalone_attribute(&self) -> bool {
        self.peek().is_some_and(|t| t.is_punct("["))
            && self
                .toks
                .get(self.pos + 1)
                .is_some_and(|t| t.is_ident("assembly") || t.is_ident("module"))
            && self.toks.get(self.pos + 2).is_some_and(|t| t.is_punct(":"))
    }

    /// Parses one standalone attribute into its own raw item, so the items
    /// after it still get their own declarations.
    fn parse_standalone_attribute(&mut self) -> Result<RawRun> {
        let start_idx = self.pos;
        let first = self.toks[self.pos];
        match self.capture_balanced("[", "]")? {
            Some(_) => {
                let last = self.toks[self.pos - 1];
                Ok(self.raw_run_from(start_idx, first, last))
            }
            None => Err(ParserError::UnexpectedEof { expected: "']'" }),
        }
    }

    fn parse_using(&mut self) -> Result<UsingDirective> {
        let first = self.toks[self.pos];
        #[allow(unused_assignments)]
        let mut last = first;
        loop {
            match self.bump() {
                None => {
                    return Err(ParserError::UnexpectedEof { expected: "';'" });
                }
                Some(tok) => {
                    last = tok;
                    if tok.is_punct(";") {
                        break;
                    }
                }
            }
        }
        Ok(UsingDirective {
            text: self.text[first.start..last.end].trim().to_string(),
        })
    }

    fn parse_namespace(&mut self) -> Result<NamespaceDecl> {
        self.expect_ident("namespace")?;
        let mut name = String::new();
        loop {
            let tok = self.bump().ok_or(ParserError::UnexpectedEof {
                expected: "namespace name",
            })?;
            match tok.kind {
                TokenKind::Ident => name.push_str(tok.text),
                TokenKind::Punct if tok.text == "." => name.push('.'),
                TokenKind::Punct if tok.text == "{" => {
                    let items = self.parse_items(false)?;
                    self.expect_punct("}")?;
                    return Ok(NamespaceDecl {
                        name,
                        file_scoped: false,
                        items,
                    });
                }
                TokenKind::Punct if tok.text == ";" => {
                    let items = self.parse_items(false)?;
                    return Ok(NamespaceDecl {
                        name,
                        file_scoped: true,
                        items,
                    });
                }
                _ => {
                    return Err(ParserError::Unexpected {
                        expected: "namespace name",
                        found: tok.text.to_string(),
                        line: tok.line,
                        col: tok.col,
                    });
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    /// Attempts to parse a class declaration (attributes, modifiers, `class`).
    /// Restores the cursor and returns `None` if the lookahead does not reach
    /// a `class` keyword.
    fn try_parse_class(&mut self) -> Result<Option<ClassDecl>> {
        let start = self.pos;
        let mut attributes = Vec::new();
        while self.peek().is_some_and(|t| t.is_punct("[")) {
            match self.capture_balanced("[", "]")? {
                Some(text) => attributes.push(text),
                None => {
                    self.pos = start;
                    return Ok(None);
                }
            }
        }
        let mut modifiers = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.kind == TokenKind::Ident && MODIFIERS.contains(&tok.text) {
                modifiers.push(tok.text.to_string());
                self.pos += 1;
            } else {
                break;
            }
        }
        if !self.peek().is_some_and(|t| t.is_ident("class")) {
            self.pos = start;
            return Ok(None);
        }
        self.pos += 1;
        let class = self.parse_class_after_keyword(attributes, modifiers)?;
        Ok(Some(class))
    }

    /// Captures a balanced `open ... close` token group and returns its
    /// verbatim span text. Returns `None` if the group never closes.
    fn capture_balanced(&mut self, open: &str, close: &str) -> Result<Option<String>> {
        let first = self.toks[self.pos];
        debug_assert!(first.is_punct(open));
        let mut depth = 0usize;
        #[allow(unused_assignments)]
        let mut last = first;
        while let Some(tok) = self.bump() {
            last = tok;
            if tok.is_punct(open) {
                depth += 1;
            } else if tok.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(self.text[first.start..last.end].trim().to_string()));
                }
            }
        }
        Ok(None)
    }

    fn parse_class_after_keyword(
        &mut self,
        attributes: Vec<String>,
        modifiers: Vec<String>,
    ) -> Result<ClassDecl> {
        let name_tok = self.expect_ident("class name")?;
        let name = name_tok.text.to_string();

        let type_params = if self.peek().is_some_and(|t| t.is_punct("<")) {
            Some(self.capture_angles()?)
        } else {
            None
        };

        let mut bases = Vec::new();
        if self.peek().is_some_and(|t| t.is_punct(":")) {
            self.pos += 1;
            bases = self.parse_base_list()?;
        }

        let where_clause = if self.peek().is_some_and(|t| t.is_ident("where")) {
            Some(self.capture_until_open_brace()?)
        } else {
            None
        };

        self.expect_punct("{")?;
        let members = self.parse_members()?;
        self.expect_punct("}")?;

        Ok(ClassDecl {
            attributes,
            modifiers,
            name,
            type_params,
            bases,
            where_clause,
            members,
        })
    }

    /// Captures a balanced angle-bracket group as verbatim text. `>>` closes
    /// two levels, as in `List<List<int>>`.
    fn capture_angles(&mut self) -> Result<String> {
        let first = self.toks[self.pos];
        let mut depth = 0isize;
        #[allow(unused_assignments)]
        let mut last = first;
        while let Some(tok) = self.bump() {
            last = tok;
            depth += angle_delta(tok);
            if depth <= 0 {
                return Ok(self.text[first.start..last.end].trim().to_string());
            }
        }
        Err(ParserError::UnexpectedEof { expected: "'>'" })
    }

    /// Parses the comma-separated base list after `:`, stopping before `{`
    /// or a `where` clause. Commas inside generic arguments do not split.
    fn parse_base_list(&mut self) -> Result<Vec<TypeRef>> {
        let mut bases = Vec::new();
        let mut start: Option<Token<'a>> = None;
        let mut last: Option<Token<'a>> = None;
        let mut angle_depth = 0isize;

        loop {
            let tok = self.peek().ok_or(ParserError::UnexpectedEof {
                expected: "'{'",
            })?;
            if angle_depth == 0 && (tok.is_punct("{") || tok.is_ident("where")) {
                break;
            }
            if angle_depth == 0 && tok.is_punct(",") {
                self.push_base(&mut bases, start.take(), last.take());
                self.pos += 1;
                continue;
            }
            angle_depth += angle_delta(tok);
            if start.is_none() {
                start = Some(tok);
            }
            last = Some(tok);
            self.pos += 1;
        }
        self.push_base(&mut bases, start, last);
        Ok(bases)
    }

    fn push_base(&self, bases: &mut Vec<TypeRef>, start: Option<Token<'a>>, last: Option<Token<'a>>) {
        if let (Some(first), Some(last)) = (start, last) {
            let span = &self.text[first.start..last.end];
            let rendered = span.split_whitespace().collect::<Vec<_>>().join(" ");
            bases.push(TypeRef::new(rendered));
        }
    }

    /// Captures tokens from a `where` keyword up to (not including) the
    /// opening brace of the class body.
    fn capture_until_open_brace(&mut self) -> Result<String> {
        let first = self.toks[self.pos];
        let mut last = first;
        let mut angle_depth = 0isize;
        loop {
            let tok = self.peek().ok_or(ParserError::UnexpectedEof {
                expected: "'{'",
            })?;
            if angle_depth == 0 && tok.is_punct("{") {
                break;
            }
            angle_depth += angle_delta(tok);
            last = tok;
            self.pos += 1;
        }
        let span = &self.text[first.start..last.end];
        Ok(span.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    fn parse_members(&mut self) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.is_punct("}") {
                break;
            }
            if tok.is_trivia() {
                members.push(Member::Raw(self.parse_trivia_run()));
                continue;
            }
            if let Some(class) = self.try_parse_class()? {
                members.push(Member::Class(class));
                continue;
            }
            members.push(Member::Raw(self.parse_raw_run()?));
        }
        Ok(members)
    }

    // ------------------------------------------------------------------------
    // Raw runs
    // ------------------------------------------------------------------------

    /// Builds a raw run over the tokens in `start_idx..self.pos`, marking
    /// the byte ranges of multi-line string literals so their interior lines
    /// stay verbatim through dedent and re-indent.
    fn raw_run_from(&self, start_idx: usize, first: Token<'a>, last: Token<'a>) -> RawRun {
        let protected: Vec<(usize, usize)> = self.toks[start_idx..self.pos]
            .iter()
            .filter(|t| t.kind == TokenKind::Str && t.text.contains('\n'))
            .map(|t| (t.start, t.end))
            .collect();
        RawRun::from_span_protected(self.text, first.start, last.end, &protected)
    }

    /// Scans one unmodeled construct by balanced-delimiter tracking.
    ///
    /// The run ends at a `;` at depth zero, or after a depth-zero `{...}`
    /// block closes (absorbing a trailing `;`, and continuing through `=`,
    /// `.`, `(` or `,` so initializer and chained forms stay in one run).
    /// An enclosing `}` at depth zero terminates the run without being
    /// consumed.
    fn parse_raw_run(&mut self) -> Result<RawRun> {
        let start_idx = self.pos;
        let first = self.toks[self.pos];
        if first.is_punct("}") {
            // Callers never hand us an enclosing brace; a stray one at file
            // level is forced through parse_raw_run_force instead.
            return self.parse_raw_run_force();
        }
        let mut depth = 0isize;
        let mut last = first;
        while let Some(tok) = self.peek() {
            if depth == 0 && tok.is_punct("}") {
                break;
            }
            self.pos += 1;
            last = tok;
            if tok.kind != TokenKind::Punct {
                continue;
            }
            match tok.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" => depth -= 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        match self.peek() {
                            Some(next) if next.is_punct(";") => {
                                self.pos += 1;
                                last = next;
                                break;
                            }
                            Some(next)
                                if next.is_punct("=")
                                    || next.is_punct(".")
                                    || next.is_punct("(")
                                    || next.is_punct(",") => {}
                            _ => break,
                        }
                    }
                }
                ";" if depth == 0 => break,
                _ => {}
            }
        }
        Ok(self.raw_run_from(start_idx, first, last))
    }

    /// Consumes exactly one token as a raw run. Used for stray tokens that
    /// have no declaration-level meaning.
    fn parse_raw_run_force(&mut self) -> Result<RawRun> {
        let tok = self.bump().ok_or(ParserError::UnexpectedEof {
            expected: "token",
        })?;
        Ok(RawRun::from_span(self.text, tok.start, tok.end))
    }
}

/// Angle-bracket depth contribution of a token. `>>` and `<<` move two
/// levels, matching how the tokenizer groups shift operators.
fn angle_delta(tok: Token<'_>) -> isize {
    if tok.kind != TokenKind::Punct {
        return 0;
    }
    match tok.text {
        "<" => 1,
        "<<" => 2,
        ">" => -1,
        ">>" => -2,
        _ => 0,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> CompilationUnit {
        parse_unit(src).expect("parse error")
    }

    fn only_class(unit: &CompilationUnit) -> &ClassDecl {
        for item in &unit.items {
            if let Item::Class(c) = item {
                return c;
            }
        }
        panic!("no class item");
    }

    #[test]
    fn empty_class_with_base() {
        let unit = parse("public class FooController : Controller { }");
        let class = only_class(&unit);
        assert_eq!(class.name, "FooController");
        assert_eq!(class.modifiers, vec!["public"]);
        assert_eq!(class.bases, vec![TypeRef::new("Controller")]);
        assert!(class.members.is_empty());
    }

    #[test]
    fn class_without_base_list() {
        let unit = parse("class Plain { }");
        let class = only_class(&unit);
        assert!(class.bases.is_empty());
    }

    #[test]
    fn using_directives_kept_verbatim() {
        let unit = parse("using System;\nusing System.Web.Mvc;\nclass A { }");
        match &unit.items[0] {
            Item::Using(u) => assert_eq!(u.text, "using System;"),
            other => panic!("expected using, got {:?}", other),
        }
        match &unit.items[1] {
            Item::Using(u) => assert_eq!(u.text, "using System.Web.Mvc;"),
            other => panic!("expected using, got {:?}", other),
        }
    }

    #[test]
    fn braced_namespace() {
        let unit = parse("namespace My.App\n{\n    class A { }\n}\n");
        match &unit.items[0] {
            Item::Namespace(ns) => {
                assert_eq!(ns.name, "My.App");
                assert!(!ns.file_scoped);
                assert_eq!(ns.items.len(), 1);
            }
            other => panic!("expected namespace, got {:?}", other),
        }
    }

    #[test]
    fn file_scoped_namespace() {
        let unit = parse("namespace My.App;\nclass A { }\n");
        match &unit.items[0] {
            Item::Namespace(ns) => {
                assert!(ns.file_scoped);
                assert_eq!(ns.items.len(), 1);
            }
            other => panic!("expected namespace, got {:?}", other),
        }
    }

    #[test]
    fn generic_base_commas_do_not_split() {
        let unit = parse("class A : IHandler<string, int>, Controller { }");
        let class = only_class(&unit);
        assert_eq!(class.bases.len(), 2);
        assert_eq!(class.bases[0].text, "IHandler<string, int>");
        assert_eq!(class.bases[1].text, "Controller");
    }

    #[test]
    fn attributes_and_where_clause() {
        let unit = parse("[Serializable]\npublic class Box<T> : Holder where T : class { }");
        let class = only_class(&unit);
        assert_eq!(class.attributes, vec!["[Serializable]"]);
        assert_eq!(class.type_params.as_deref(), Some("<T>"));
        assert_eq!(class.where_clause.as_deref(), Some("where T : class"));
    }

    #[test]
    fn members_stay_verbatim() {
        let src = "class A : Controller\n{\n    private int count;\n\n    public int Get()\n    {\n        return count;\n    }\n}\n";
        let unit = parse(src);
        let class = only_class(&unit);
        let raw: Vec<&RawRun> = class
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Raw(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].texts(), vec!["private int count;"]);
        assert_eq!(raw[1].lines[0].text, "public int Get()");
        assert_eq!(raw[1].texts().last().copied(), Some("}"));
    }

    #[test]
    fn nested_class_is_structural() {
        let src = "class Outer : Controller { class Inner : Controller { } }";
        let unit = parse(src);
        let outer = only_class(&unit);
        assert_eq!(outer.members.len(), 1);
        match &outer.members[0] {
            Member::Class(inner) => assert_eq!(inner.name, "Inner"),
            other => panic!("expected nested class, got {:?}", other),
        }
    }

    #[test]
    fn property_with_initializer_is_one_member() {
        let src = "class A { public int X { get; set; } = 5; public int Y { get; set; } }";
        let unit = parse(src);
        let class = only_class(&unit);
        assert_eq!(class.members.len(), 2);
    }

    #[test]
    fn interface_is_raw_item() {
        let unit = parse("interface IThing { void Do(); }\nclass A { }");
        assert!(matches!(unit.items[0], Item::Raw(_)));
        assert!(matches!(unit.items[1], Item::Class(_)));
    }

    #[test]
    fn assembly_attribute_is_its_own_item() {
        let src = "[assembly: AssemblyVersion(\"1.0.0.0\")]\nnamespace N\n{\n    public class FooController : Controller { }\n}\n";
        let unit = parse(src);
        match &unit.items[0] {
            Item::Raw(r) => assert_eq!(r.texts(), vec!["[assembly: AssemblyVersion(\"1.0.0.0\")]"]),
            other => panic!("expected raw attribute, got {:?}", other),
        }
        match &unit.items[1] {
            Item::Namespace(ns) => {
                assert!(matches!(ns.items[0], Item::Class(_)));
            }
            other => panic!("expected namespace, got {:?}", other),
        }
    }

    #[test]
    fn module_attribute_does_not_absorb_following_class() {
        let src = "[module: CLSCompliant(true)]\nclass AController : Controller { }";
        let unit = parse(src);
        assert!(matches!(unit.items[0], Item::Raw(_)));
        let class = only_class(&unit);
        assert_eq!(class.name, "AController");
        assert!(class.attributes.is_empty());
    }

    #[test]
    fn multiline_verbatim_string_lines_are_marked() {
        let src = "class A\n{\n    string s = @\"line1\n  line2\";\n}\n";
        let unit = parse(src);
        let class = only_class(&unit);
        match &class.members[0] {
            Member::Raw(r) => {
                assert_eq!(r.lines[0].text, "string s = @\"line1");
                assert!(!r.lines[0].verbatim);
                assert_eq!(r.lines[1].text, "  line2\";");
                assert!(r.lines[1].verbatim);
            }
            other => panic!("expected raw member, got {:?}", other),
        }
    }

    #[test]
    fn semicolons_inside_for_loop_do_not_split() {
        let src = "class A { void F() { for (int i = 0; i < 3; i++) { } } }";
        let unit = parse(src);
        let class = only_class(&unit);
        assert_eq!(class.members.len(), 1);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(parse_unit("class { {").is_err());
        assert!(parse_unit("\"unterminated").is_err());
    }

    #[test]
    fn comments_between_members_survive() {
        let src = "class A\n{\n    // counts things\n    private int count;\n}\n";
        let unit = parse(src);
        let class = only_class(&unit);
        assert_eq!(class.members.len(), 2);
        match &class.members[0] {
            Member::Raw(r) => assert_eq!(r.texts(), vec!["// counts things"]),
            other => panic!("expected comment run, got {:?}", other),
        }
    }
}
