//! Tokenizer for C# source text.
//!
//! Produces a flat token stream with byte spans and 1-indexed line/column
//! positions. The tokenizer is whitespace-insensitive: whitespace separates
//! tokens but never appears in the stream. Comments and preprocessor
//! directives are kept as tokens so raw code runs survive round-tripping.

use thiserror::Error;

// ============================================================================
// Token Types
// ============================================================================

/// Kinds of tokens produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword, including `@`-prefixed verbatim identifiers.
    Ident,
    /// Numeric literal (integer, real, hex; suffixes included).
    Number,
    /// String literal: regular, verbatim (`@"..."`), or interpolated (`$"..."`).
    Str,
    /// Character literal.
    Char,
    /// `// ...` comment; text runs to end of line.
    LineComment,
    /// `/* ... */` comment.
    BlockComment,
    /// `#`-prefixed preprocessor directive; text runs to end of line.
    Directive,
    /// Operator or punctuation, multi-character operators grouped.
    Punct,
}

/// A single token with its byte span and source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset past the last character (exclusive).
    pub end: usize,
    /// 1-indexed line of the first character.
    pub line: usize,
    /// 1-indexed column of the first character.
    pub col: usize,
}

impl<'a> Token<'a> {
    /// True if this token is a comment or preprocessor directive.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::Directive
        )
    }

    /// True if this is a `Punct` token with exactly the given text.
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    /// True if this is an `Ident` token with exactly the given text.
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for tokenization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    #[error("unterminated string literal starting at line {line}, column {col}")]
    UnterminatedString { line: usize, col: usize },

    #[error("unterminated character literal starting at line {line}, column {col}")]
    UnterminatedChar { line: usize, col: usize },

    #[error("unterminated block comment starting at line {line}, column {col}")]
    UnterminatedBlockComment { line: usize, col: usize },

    #[error("unexpected character {ch:?} at line {line}, column {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
}

// ============================================================================
// Cursor
// ============================================================================

/// Character cursor over source text, tracking byte offset and line/column.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            text,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }

    fn eat_line(&mut self) {
        self.eat_while(|c| c != '\n');
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

// ============================================================================
// Tokenization
// ============================================================================

/// Multi-character operators, longest first so greedy matching is correct.
const PUNCTS3: &[&str] = &["<<=", ">>=", "??="];
const PUNCTS2: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<",
    ">>", "=>", "??", "?.", "::", "++", "--", "->",
];

/// Tokenizes C# source text into a flat token stream.
///
/// Whitespace is skipped; comments and directives are preserved as tokens.
///
/// # Errors
///
/// Returns a [`TokError`] for unterminated literals or comments, or for
/// characters that cannot start any token.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, TokError> {
    let mut toks = Vec::new();
    let mut cur = Cursor::new(text);

    while let Some(ch) = cur.peek() {
        if ch.is_whitespace() {
            cur.bump();
            continue;
        }

        let start = cur.pos;
        let line = cur.line;
        let col = cur.col;

        let kind = match ch {
            '/' if cur.peek_at(1) == Some('/') => {
                cur.eat_line();
                TokenKind::LineComment
            }
            '/' if cur.peek_at(1) == Some('*') => {
                cur.bump();
                cur.bump();
                lex_block_comment(&mut cur, line, col)?;
                TokenKind::BlockComment
            }
            '#' => {
                cur.eat_line();
                TokenKind::Directive
            }
            '"' => {
                cur.bump();
                lex_string(&mut cur, line, col)?;
                TokenKind::Str
            }
            '@' | '$' => {
                cur.bump();
                lex_at_or_dollar(ch, &mut cur, line, col)?
            }
            '\'' => {
                cur.bump();
                lex_char(&mut cur, line, col)?;
                TokenKind::Char
            }
            c if c.is_alphabetic() || c == '_' => {
                cur.eat_while(|c| c.is_alphanumeric() || c == '_');
                TokenKind::Ident
            }
            c if c.is_ascii_digit() => {
                lex_number(&mut cur);
                TokenKind::Number
            }
            c if c.is_ascii_punctuation() => {
                lex_punct(&mut cur);
                TokenKind::Punct
            }
            c => {
                return Err(TokError::UnexpectedChar { ch: c, line, col });
            }
        };

        toks.push(Token {
            kind,
            text: &text[start..cur.pos],
            start,
            end: cur.pos,
            line,
            col,
        });
    }

    Ok(toks)
}

fn lex_block_comment(cur: &mut Cursor<'_>, line: usize, col: usize) -> Result<(), TokError> {
    loop {
        match cur.bump() {
            None => return Err(TokError::UnterminatedBlockComment { line, col }),
            Some('*') if cur.peek() == Some('/') => {
                cur.bump();
                return Ok(());
            }
            Some(_) => {}
        }
    }
}

/// Lexes a regular or interpolated string body; the opening quote is consumed.
fn lex_string(cur: &mut Cursor<'_>, line: usize, col: usize) -> Result<(), TokError> {
    loop {
        match cur.bump() {
            None | Some('\n') => return Err(TokError::UnterminatedString { line, col }),
            Some('\\') => {
                if cur.bump().is_none() {
                    return Err(TokError::UnterminatedString { line, col });
                }
            }
            Some('"') => return Ok(()),
            Some(_) => {}
        }
    }
}

/// Lexes a verbatim string body, where `""` is the only escape; the opening
/// quote is consumed. Verbatim strings may span lines.
fn lex_verbatim_string(cur: &mut Cursor<'_>, line: usize, col: usize) -> Result<(), TokError> {
    loop {
        match cur.bump() {
            None => return Err(TokError::UnterminatedString { line, col }),
            Some('"') => {
                if cur.peek() == Some('"') {
                    cur.bump();
                } else {
                    return Ok(());
                }
            }
            Some(_) => {}
        }
    }
}

/// Disambiguates `@"..."`, `$"..."`, `$@"..."`, `@$"..."`, `@ident`, and the
/// bare punctuation fallback.
fn lex_at_or_dollar(
    first: char,
    cur: &mut Cursor<'_>,
    line: usize,
    col: usize,
) -> Result<TokenKind, TokError> {
    match (first, cur.peek()) {
        ('@', Some('"')) => {
            cur.bump();
            lex_verbatim_string(cur, line, col)?;
            Ok(TokenKind::Str)
        }
        ('@', Some('$')) if cur.peek_at(1) == Some('"') => {
            cur.bump();
            cur.bump();
            lex_verbatim_string(cur, line, col)?;
            Ok(TokenKind::Str)
        }
        ('@', Some(c)) if c.is_alphabetic() || c == '_' => {
            cur.eat_while(|c| c.is_alphanumeric() || c == '_');
            Ok(TokenKind::Ident)
        }
        ('$', Some('"')) => {
            cur.bump();
            lex_string(cur, line, col)?;
            Ok(TokenKind::Str)
        }
        ('$', Some('@')) if cur.peek_at(1) == Some('"') => {
            cur.bump();
            cur.bump();
            lex_verbatim_string(cur, line, col)?;
            Ok(TokenKind::Str)
        }
        _ => Ok(TokenKind::Punct),
    }
}

/// Lexes a character literal body; the opening quote is consumed. Lenient:
/// consumes escaped and plain characters until the closing quote.
fn lex_char(cur: &mut Cursor<'_>, line: usize, col: usize) -> Result<(), TokError> {
    loop {
        match cur.bump() {
            None | Some('\n') => return Err(TokError::UnterminatedChar { line, col }),
            Some('\\') => {
                if cur.bump().is_none() {
                    return Err(TokError::UnterminatedChar { line, col });
                }
            }
            Some('\'') => return Ok(()),
            Some(_) => {}
        }
    }
}

/// Lexes a numeric literal loosely: digits, hex digits, underscores, and
/// suffix letters, plus a single fractional part. Member access on literals
/// (`1.ToString()`) is preserved because the dot is only absorbed when a
/// digit follows.
fn lex_number(cur: &mut Cursor<'_>) {
    cur.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
    if cur.peek() == Some('.') && cur.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        cur.bump();
        cur.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
    }
}

fn lex_punct(cur: &mut Cursor<'_>) {
    let rest = cur.rest();
    for p in PUNCTS3 {
        if rest.starts_with(p) {
            cur.bump();
            cur.bump();
            cur.bump();
            return;
        }
    }
    for p in PUNCTS2 {
        if rest.starts_with(p) {
            cur.bump();
            cur.bump();
            return;
        }
    }
    cur.bump();
}

// ============================================================================
// Tests
// ============================================================================
