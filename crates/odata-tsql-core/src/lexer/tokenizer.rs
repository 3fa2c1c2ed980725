//! Filter tokenizer.
//!
//! Splits a filter string into classified tokens. Quoted text is opaque,
//! function calls and quantifiers absorb their parenthesized argument text
//! (kept raw for recursive compilation), and the list following `in` becomes
//! a single token.

use std::sync::LazyLock;

use regex::Regex;

use super::token::Fragment;
use super::{is_builtin_function, Keyword, Span, Token, TokenKind};
use crate::ast::{Literal, QuantifierKind};
use crate::parser::ParseError;

static PROPERTY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*(/[A-Za-z_$][A-Za-z0-9_.]*)*$").expect("static regex")
});
static LAMBDA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("static regex"));

/// Tokenizer over one filter string.
pub struct Tokenizer<'a> {
    /// The input text.
    input: &'a str,
    /// Current byte position.
    pos: usize,
    /// Start of the token being scanned.
    start: usize,
    /// Offset of `input` inside the text the user wrote.
    base: usize,
    /// Function names registered in addition to the built-ins.
    functions: &'a [String],
    /// Set after `not`; the next token must be a function call.
    pending_not: Option<Span>,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer for `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            base: 0,
            functions: &[],
            pending_not: None,
        }
    }

    /// Reports spans relative to an enclosing text, `input` starting at `base`.
    #[must_use]
    pub const fn with_offset(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Accepts calls to these user-registered functions.
    #[must_use]
    pub const fn with_functions(mut self, functions: &'a [String]) -> Self {
        self.functions = functions;
        self
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.pos).shift(self.base)
    }

    fn text(&self) -> &'a str {
        &self.input[self.start..self.pos]
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.span()).with_found(self.text())
    }

    /// Consumes a quoted section starting at the opening quote and returns
    /// its unescaped content.
    fn scan_quoted(&mut self) -> Result<String, ParseError> {
        self.advance();
        let mut content = String::new();
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                    content.push('\'');
                }
                Some('\'') => return Ok(content),
                Some(c) => content.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    /// Consumes a balanced parenthesized section starting at `(` and returns
    /// the inner text with its absolute offset.
    fn scan_group(&mut self, owner: &str) -> Result<Fragment, ParseError> {
        self.advance();
        let inner_start = self.pos;
        let mut depth = 1usize;
        let mut quoted = false;
        while let Some(c) = self.advance() {
            match c {
                '\'' => quoted = !quoted,
                '(' if !quoted => depth += 1,
                ')' if !quoted => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Fragment {
                            text: String::from(&self.input[inner_start..self.pos - 1]),
                            offset: self.base + inner_start,
                        });
                    }
                }
                _ => {}
            }
        }
        Err(self.error(format!("unbalanced parenthesis after '{owner}'")))
    }

    /// Consumes a run of non-delimiter characters.
    fn scan_word(&mut self) {
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '\''))
        {
            self.advance();
        }
    }

    fn is_function(&self, name: &str) -> bool {
        is_builtin_function(name) || self.functions.iter().any(|f| f == name)
    }

    fn previous_keyword(tokens: &[Token]) -> Option<Keyword> {
        tokens.last().and_then(Token::keyword)
    }

    /// Tokenizes the whole input.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the offending text for unterminated
    /// strings, unbalanced calls, unknown functions, a `not` that does not
    /// precede a call, and words that are neither keywords, literals nor
    /// property paths.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            self.start = self.pos;
            let Some(c) = self.peek() else { break };

            let kind = match c {
                '(' if Self::previous_keyword(&tokens) == Some(Keyword::In) => {
                    let group = self.scan_group("in")?;
                    let items = split_top_level(&group.text, ',')
                        .into_iter()
                        .map(|f| Fragment {
                            text: f.text,
                            offset: f.offset + group.offset,
                        })
                        .collect();
                    TokenKind::List(items)
                }
                '(' => {
                    self.advance();
                    TokenKind::LeftParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RightParen
                }
                '\'' => self.scan_quoted_token()?,
                _ => self.scan_word_token(&tokens)?,
            };

            let token = Token::new(kind, self.text(), self.span());
            if let Some(not_span) = self.pending_not.take() {
                let TokenKind::Function { name, args, .. } = token.kind else {
                    return Err(ParseError::new(
                        "'not' must be followed by a function call",
                        not_span,
                    )
                    .with_found(token.text));
                };
                let span = not_span.to(token.span);
                let text = format!("not {}", token.text);
                tokens.push(Token::new(
                    TokenKind::Function {
                        name,
                        args,
                        negate: true,
                    },
                    text,
                    span,
                ));
                continue;
            }
            if token.keyword() == Some(Keyword::Not) {
                self.pending_not = Some(token.span);
                continue;
            }
            tokens.push(token);
        }

        if let Some(span) = self.pending_not {
            return Err(ParseError::unexpected_eof("a function call after 'not'", span));
        }
        tracing::trace!(count = tokens.len(), "tokenized filter");
        Ok(tokens)
    }

    /// `'text'`, or an enum literal written `'Type'Value'`.
    fn scan_quoted_token(&mut self) -> Result<TokenKind, ParseError> {
        let content = self.scan_quoted()?;
        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            let member_start = self.pos;
            self.scan_word();
            let member = &self.input[member_start..self.pos];
            if self.peek() != Some('\'') {
                return Err(self.error("unterminated enum literal"));
            }
            self.advance();
            return Ok(TokenKind::Enum {
                type_name: content,
                value: String::from(member),
            });
        }
        Ok(TokenKind::Literal(Literal::String(content)))
    }

    fn scan_word_token(&mut self, tokens: &[Token]) -> Result<TokenKind, ParseError> {
        self.scan_word();
        let word = self.text();
        if word.is_empty() {
            self.advance();
            return Err(self.error("unexpected character"));
        }

        if let Some(keyword) = Keyword::from_str(word) {
            return Ok(TokenKind::Keyword(keyword));
        }
        match self.peek() {
            Some('\'') => return self.scan_typed(word),
            Some('(') => return self.scan_call(word),
            _ => {}
        }
        if let Some(name) = word.strip_prefix('@') {
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(self.error(format!("invalid parameter name '{word}'")));
            }
            return Ok(TokenKind::Parameter(String::from(name)));
        }
        if let Some(literal) = Literal::from_bare(word) {
            return Ok(TokenKind::Literal(literal));
        }
        if Literal::is_numeric(word) {
            return Err(self.error(format!("numeric literal '{word}' is out of range")));
        }
        if PROPERTY_PATH.is_match(word) {
            let array = Self::previous_keyword(tokens).is_some_and(|k| k.introduces_list());
            return Ok(TokenKind::Property {
                path: String::from(word),
                array,
            });
        }
        Err(self.error(format!("unrecognized token '{word}'")))
    }

    /// `prefix'body'`: a typed literal or an enum literal.
    fn scan_typed(&mut self, prefix: &'a str) -> Result<TokenKind, ParseError> {
        let body = self.scan_quoted()?;
        match Literal::from_typed(prefix, &body) {
            Some(Ok(literal)) => Ok(TokenKind::Literal(literal)),
            Some(Err(reason)) => Err(self.error(reason)),
            None => Ok(TokenKind::Enum {
                type_name: String::from(prefix),
                value: body,
            }),
        }
    }

    /// `name(...)`, `Nav/any(...)` or `Nav/all(...)`.
    fn scan_call(&mut self, word: &'a str) -> Result<TokenKind, ParseError> {
        let quantifier = word
            .strip_suffix("/any")
            .map(|nav| (nav, QuantifierKind::Any))
            .or_else(|| word.strip_suffix("/all").map(|nav| (nav, QuantifierKind::All)));

        if let Some((navigation, kind)) = quantifier {
            let group = self.scan_group(word)?;
            let (variable, body) = match LAMBDA.captures(&group.text) {
                Some(caps) => {
                    let head = caps.get(0).map_or(0, |m| m.end());
                    (
                        caps.get(1).map(|m| String::from(m.as_str())),
                        Fragment {
                            text: String::from(&group.text[head..]),
                            offset: group.offset + head,
                        },
                    )
                }
                None => (None, group),
            };
            let body = (!body.text.trim().is_empty()).then_some(body);
            if body.is_none() && kind == QuantifierKind::All {
                return Err(self.error(format!("'{word}' requires a predicate")));
            }
            return Ok(TokenKind::Quantifier {
                navigation: String::from(navigation),
                kind,
                variable,
                body,
            });
        }

        if !self.is_function(word) {
            self.advance();
            return Err(self.error(format!("unknown function '{word}'")));
        }
        let group = self.scan_group(word)?;
        let args = split_top_level(&group.text, ',')
            .into_iter()
            .map(|f| Fragment {
                text: f.text,
                offset: f.offset + group.offset,
            })
            .collect();
        Ok(TokenKind::Function {
            name: String::from(word),
            args,
            negate: false,
        })
    }
}

/// Whether `text` is a property path: `Name`, `Address/City`.
#[must_use]
pub fn is_property_path(text: &str) -> bool {
    PROPERTY_PATH.is_match(text)
}

/// Splits `text` at every `separator` outside quotes and parentheses.
///
/// Pieces are trimmed; offsets are relative to `text`. Whitespace-only input
/// yields no pieces.
#[must_use]
pub fn split_top_level(text: &str, separator: char) -> Vec<Fragment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut piece_start = 0;

    let mut push = |start: usize, end: usize| {
        let raw = &text[start..end];
        let leading = raw.len() - raw.trim_start().len();
        pieces.push(Fragment {
            text: String::from(raw.trim()),
            offset: start + leading,
        });
    };

    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            c if c == separator && !quoted && depth == 0 => {
                push(piece_start, i);
                piece_start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    push(piece_start, text.len());
    pieces
}
