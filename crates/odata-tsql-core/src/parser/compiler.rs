//! The precedence compiler.
//!
//! Turns the flat token stream into the structured document. Each
//! parenthesized group is assembled on a stack; when a group closes, its
//! items are reduced by four passes in order: aggregate extraction,
//! arithmetic precedence resolution, binary-operator binding, conjunction
//! binding. The reduced group becomes a single item of the enclosing group.

use crate::ast::{ArithmeticOp, Expression, Literal, Operand, PredicateKind, ELEMENT};
use crate::error::Result;
use crate::lexer::{
    is_boolean_function, is_builtin_function, split_top_level, Keyword, Span, Token, TokenKind,
    Tokenizer,
};

use super::document::{DocNode, Tag};
use super::error::ParseError;
use super::precedence::climb;

/// Names accepted to the right of `with`.
const AGGREGATES: &[&str] = &[
    "sum",
    "min",
    "max",
    "average",
    "avg",
    "count",
    "countdistinct",
    "merge",
    "none",
];

/// What the compiled text must evaluate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// A boolean filter.
    Filter,
    /// A value (function argument, order-by key, aggregate expression).
    Operand,
}

/// A reduced item.
#[derive(Debug, Clone)]
struct Node {
    doc: DocNode,
    span: Span,
}

/// An item of a group under assembly.
#[derive(Debug, Clone)]
enum Item {
    Keyword(Keyword, Span),
    Node(Node),
}

impl Item {
    const fn span(&self) -> Span {
        match self {
            Self::Keyword(_, span) => *span,
            Self::Node(node) => node.span,
        }
    }
}

/// One parenthesized group.
#[derive(Debug)]
struct Frame {
    /// Position of the opening parenthesis; `None` for the outermost group.
    open: Option<Span>,
    items: Vec<Item>,
}

/// The text being compiled and its offset in the user's input.
#[derive(Debug, Clone, Copy)]
struct Source<'a> {
    text: &'a str,
    base: usize,
}

impl Source<'_> {
    fn slice(&self, span: Span) -> &str {
        span.start
            .checked_sub(self.base)
            .zip(span.end.checked_sub(self.base))
            .and_then(|(start, end)| self.text.get(start..end))
            .unwrap_or_default()
    }
}

/// Compiles filter text into the structured document and the expression model.
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    /// User-registered function names accepted by the tokenizer.
    functions: Vec<String>,
}

impl FilterParser {
    /// Creates a parser accepting the built-in functions only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accepts calls to these functions.
    #[must_use]
    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Compiles a filter into its structured document (a root node).
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the offending token for unbalanced
    /// parentheses, operators missing an operand, unknown functions, and
    /// input that does not evaluate to a boolean.
    pub fn compile_document(&self, input: &str) -> std::result::Result<DocNode, ParseError> {
        let doc = self.compile(Source { text: input, base: 0 }, Mode::Filter)?;
        tracing::debug!(document = %doc, "compiled filter");
        Ok(DocNode::root(doc))
    }

    /// Parses a filter into the expression model.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Parse`](crate::CompileError::Parse) for
    /// malformed input.
    pub fn parse_filter(&self, input: &str) -> Result<Expression> {
        let doc = self.compile_document(input)?;
        Expression::from_document(&doc)
    }

    /// Parses a value expression: a property, literal, call, arithmetic, or
    /// `<expr> with <aggregate>`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Parse`](crate::CompileError::Parse) for
    /// malformed input or a boolean expression.
    pub fn parse_operand(&self, input: &str) -> Result<Operand> {
        let doc = self.compile(Source { text: input, base: 0 }, Mode::Operand)?;
        Operand::from_document(&doc)
    }

    fn compile(&self, source: Source<'_>, mode: Mode) -> std::result::Result<DocNode, ParseError> {
        let tokens = Tokenizer::new(source.text)
            .with_offset(source.base)
            .with_functions(&self.functions)
            .tokenize()?;
        tracing::trace!(tokens = tokens.len(), text = source.text, "assembling groups");

        let mut stack = vec![Frame {
            open: None,
            items: Vec::new(),
        }];
        for token in tokens {
            match token.kind {
                TokenKind::LeftParen => stack.push(Frame {
                    open: Some(token.span),
                    items: Vec::new(),
                }),
                TokenKind::RightParen => {
                    let frame = match stack.pop() {
                        Some(frame) if frame.open.is_some() => frame,
                        _ => {
                            return Err(ParseError::new("unbalanced parenthesis", token.span)
                                .with_found(")"))
                        }
                    };
                    let open = frame.open.unwrap_or(token.span);
                    let span = open.to(token.span);
                    if frame.items.is_empty() {
                        return Err(ParseError::new("empty parentheses", span).with_found("()"));
                    }
                    let doc = self.reduce(source, frame.items, false, mode)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.items.push(Item::Node(Node { doc, span }));
                    }
                }
                TokenKind::Keyword(keyword) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.items.push(Item::Keyword(keyword, token.span));
                    }
                }
                _ => {
                    let node = self.leaf(token)?;
                    if let Some(frame) = stack.last_mut() {
                        frame.items.push(Item::Node(node));
                    }
                }
            }
        }

        let root = match stack.pop() {
            Some(frame) if stack.is_empty() => frame,
            Some(frame) => {
                let span = frame.open.unwrap_or_else(|| Span::point(source.base));
                return Err(ParseError::new("unbalanced parenthesis", span).with_found("("));
            }
            None => return Err(ParseError::new("unbalanced parenthesis", Span::point(source.base))),
        };
        if root.items.is_empty() {
            let span = Span::new(source.base, source.base + source.text.len());
            return Err(ParseError::unexpected_eof(
                match mode {
                    Mode::Filter => "a predicate",
                    Mode::Operand => "a value",
                },
                span,
            ));
        }

        let span = root
            .items
            .first()
            .map(Item::span)
            .zip(root.items.last().map(Item::span))
            .map_or(Span::point(source.base), |(a, b)| a.to(b));
        let doc = self.reduce(source, root.items, true, mode)?;
        match mode {
            Mode::Filter if !doc.tag.is_boolean() => Err(ParseError::unexpected(
                "a predicate",
                source.slice(span),
                span,
            )),
            Mode::Operand if doc.tag.is_boolean() => {
                Err(ParseError::unexpected("a value", source.slice(span), span))
            }
            _ => Ok(doc),
        }
    }

    /// Runs the four reduction passes over one group.
    fn reduce(
        &self,
        source: Source<'_>,
        items: Vec<Item>,
        outermost: bool,
        mode: Mode,
    ) -> std::result::Result<DocNode, ParseError> {
        let items = extract_aggregates(source, items)?;
        let items = resolve_arithmetic(source, items)?;
        let has_conjunction = items
            .iter()
            .any(|i| matches!(i, Item::Keyword(k, _) if k.is_conjunction()));
        let sugar = has_conjunction || (outermost && mode == Mode::Filter);
        let items = bind_operators(source, items, sugar)?;
        bind_conjunctions(source, items)
    }

    /// Converts an operand token into a document node.
    fn leaf(&self, token: Token) -> std::result::Result<Node, ParseError> {
        let span = token.span;
        let doc = match token.kind {
            TokenKind::Literal(literal) => literal_doc(&literal),
            TokenKind::Enum { type_name, value } => DocNode::new(Tag::Enum)
                .attr("type", type_name)
                .attr("value", value),
            TokenKind::Parameter(name) => DocNode::new(Tag::Parameter).attr("value", name),
            TokenKind::Property { path, array } => {
                let doc = DocNode::new(Tag::Property).attr("value", path);
                if array {
                    doc.attr("array", "true")
                } else {
                    doc
                }
            }
            TokenKind::List(items) => {
                let mut list = DocNode::new(Tag::List);
                for item in items {
                    list = list.child(self.argument(&item.text, item.offset, span)?);
                }
                list
            }
            TokenKind::Function { name, args, negate } => {
                let mut doc = DocNode::new(Tag::Function).attr("name", name.as_str());
                if negate {
                    doc = doc.attr("negate", "true");
                }
                for arg in args {
                    doc = doc.child(self.argument(&arg.text, arg.offset, span)?);
                }
                doc
            }
            TokenKind::Quantifier {
                navigation,
                kind,
                variable,
                body,
            } => {
                let mut doc = DocNode::new(Tag::Quantifier)
                    .attr("kind", kind.as_str())
                    .attr("name", navigation);
                if let Some(body) = body {
                    let mut item = self.compile(
                        Source {
                            text: &body.text,
                            base: body.offset,
                        },
                        Mode::Filter,
                    )?;
                    if let Some(variable) = &variable {
                        rescope(&mut item, variable);
                    }
                    doc = doc.child(item);
                }
                if let Some(variable) = variable {
                    doc = doc.attr("variable", variable);
                }
                doc
            }
            TokenKind::Keyword(_) | TokenKind::LeftParen | TokenKind::RightParen => {
                return Err(ParseError::unexpected("an operand", token.text, span));
            }
        };
        Ok(Node { doc, span })
    }

    /// Compiles one function argument or list item.
    fn argument(
        &self,
        text: &str,
        offset: usize,
        owner: Span,
    ) -> std::result::Result<DocNode, ParseError> {
        if text.is_empty() {
            return Err(ParseError::new("empty argument", owner));
        }
        let inner = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .filter(|inner| split_top_level(inner, ',').len() > 1);
        if let Some(inner) = inner {
            let mut list = DocNode::new(Tag::List);
            for item in split_top_level(inner, ',') {
                list = list.child(self.argument(&item.text, offset + 1 + item.offset, owner)?);
            }
            return Ok(list);
        }
        self.compile(Source { text, base: offset }, Mode::Operand)
    }
}

fn literal_doc(literal: &Literal) -> DocNode {
    DocNode::new(Tag::Literal)
        .attr("type", literal.type_tag())
        .attr("value", literal.raw_value())
}

/// Rewrites `v/Prop` to `Prop` scoped by prefix `v`, and `v` alone to the
/// element itself. Nested quantifiers keep their own scope.
fn rescope(doc: &mut DocNode, variable: &str) {
    match doc.tag {
        Tag::Property => {
            let Some(value) = doc.get("value").map(String::from) else {
                return;
            };
            let scoped = if value == variable {
                Some(String::from(ELEMENT))
            } else {
                value
                    .strip_prefix(variable)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .map(String::from)
            };
            if let Some(scoped) = scoped {
                doc.attributes.insert(String::from("value"), scoped);
                doc.attributes
                    .insert(String::from("prefix"), String::from(variable));
            }
        }
        Tag::Quantifier => {}
        _ => doc
            .children
            .iter_mut()
            .for_each(|child| rescope(child, variable)),
    }
}

fn keyword_error(keyword: Keyword, span: Span, problem: &str) -> ParseError {
    ParseError::new(format!("'{}' {problem}", keyword.as_str()), span).with_found(keyword.as_str())
}

/// Pass 1: folds `<arithmetic run> with <aggregate>` into one node.
fn extract_aggregates(
    source: Source<'_>,
    mut items: Vec<Item>,
) -> std::result::Result<Vec<Item>, ParseError> {
    while let Some(at) = items
        .iter()
        .position(|i| matches!(i, Item::Keyword(Keyword::With, _)))
    {
        let with_span = items[at].span();

        let aggregate = match items.get(at + 1) {
            Some(Item::Node(node)) if node.doc.tag == Tag::Property => node
                .doc
                .get("value")
                .filter(|v| AGGREGATES.contains(&v.to_ascii_lowercase().as_str()))
                .map(str::to_ascii_lowercase),
            _ => None,
        };
        let Some(aggregate) = aggregate else {
            let found = items.get(at + 1).map_or("", |i| source.slice(i.span()));
            return Err(ParseError::unexpected("an aggregate after 'with'", found, with_span));
        };

        let mut start = at;
        while start >= 1 && matches!(items[start - 1], Item::Node(_)) {
            start -= 1;
            let extends = start >= 2
                && matches!(&items[start - 1], Item::Keyword(k, _) if k.is_arithmetic())
                && matches!(items[start - 2], Item::Node(_));
            if !extends {
                break;
            }
            start -= 1;
        }
        if start == at {
            return Err(keyword_error(Keyword::With, with_span, "is missing its operand"));
        }

        let run: Vec<Item> = items.drain(start..=at + 1).collect();
        let span = run[0].span().to(with_span);
        let mut left = resolve_arithmetic(source, run[..run.len() - 2].to_vec())?;
        let Some(Item::Node(operand)) = left.pop() else {
            return Err(keyword_error(Keyword::With, with_span, "is missing its operand"));
        };
        tracing::trace!(aggregate = %aggregate, "extracted aggregate");
        let doc = DocNode::new(Tag::With)
            .attr("aggregate", aggregate)
            .child(operand.doc);
        items.insert(start, Item::Node(Node { doc, span }));
    }
    Ok(items)
}

/// Pass 2: reduces every `operand (op operand)+` run by precedence climbing.
fn resolve_arithmetic(
    source: Source<'_>,
    items: Vec<Item>,
) -> std::result::Result<Vec<Item>, ParseError> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    let mut iter = items.into_iter().peekable();

    while let Some(item) = iter.next() {
        let op = match &item {
            Item::Keyword(k, span) => ArithmeticOp::from_keyword(*k).map(|op| (op, *k, *span)),
            Item::Node(_) => None,
        };
        let Some((op, keyword, span)) = op else {
            out.push(item);
            continue;
        };

        let Some(Item::Node(first)) = out.pop() else {
            return Err(keyword_error(keyword, span, "is missing its left operand"));
        };
        let mut run = Vec::new();
        let mut pending = Some((op, keyword, span));
        let mut end = first.span;
        while let Some((op, keyword, span)) = pending.take() {
            match iter.next() {
                Some(Item::Node(node)) => {
                    end = node.span;
                    run.push((op, node.doc));
                }
                Some(other) => {
                    return Err(ParseError::unexpected(
                        format!("an operand after '{}'", keyword.as_str()),
                        source.slice(other.span()),
                        other.span(),
                    ))
                }
                None => return Err(keyword_error(keyword, span, "is missing its right operand")),
            }
            if let Some(Item::Keyword(k, s)) = iter.peek() {
                if let Some(next) = ArithmeticOp::from_keyword(*k) {
                    pending = Some((next, *k, *s));
                    iter.next();
                }
            }
        }

        let span = first.span.to(end);
        out.push(Item::Node(Node {
            doc: climb(first.doc, run),
            span,
        }));
    }
    Ok(out)
}

/// Pass 3: binds comparison and membership operators, then rewrites bare
/// boolean calls to `<call> eq true` when `sugar` is set.
fn bind_operators(
    source: Source<'_>,
    items: Vec<Item>,
    sugar: bool,
) -> std::result::Result<Vec<Item>, ParseError> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    let mut iter = items.into_iter();

    while let Some(item) = iter.next() {
        let kind = match &item {
            Item::Keyword(k, span) => PredicateKind::from_keyword(*k).map(|kind| (kind, *k, *span)),
            Item::Node(_) => None,
        };
        let Some((kind, keyword, span)) = kind else {
            out.push(item);
            continue;
        };

        let subject = match out.pop() {
            Some(Item::Node(node)) if !node.doc.tag.is_boolean() => node,
            Some(Item::Node(node)) => {
                return Err(ParseError::unexpected(
                    format!("a value before '{}'", keyword.as_str()),
                    source.slice(node.span),
                    node.span,
                ))
            }
            _ => return Err(keyword_error(keyword, span, "is missing its left operand")),
        };
        let predicate = match iter.next() {
            Some(Item::Node(node)) if !node.doc.tag.is_boolean() => node,
            Some(other) => {
                return Err(ParseError::unexpected(
                    format!("a value after '{}'", keyword.as_str()),
                    source.slice(other.span()),
                    other.span(),
                ))
            }
            None => return Err(keyword_error(keyword, span, "is missing its right operand")),
        };

        let span = subject.span.to(predicate.span);
        let doc = DocNode::new(Tag::Predicate)
            .attr("kind", kind.as_str())
            .child(subject.doc)
            .child(predicate.doc);
        out.push(Item::Node(Node { doc, span }));
    }

    if sugar {
        for item in &mut out {
            if let Item::Node(node) = item {
                if is_boolean_call(&node.doc) {
                    let call = std::mem::replace(&mut node.doc, DocNode::new(Tag::Predicate));
                    node.doc = DocNode::new(Tag::Predicate)
                        .attr("kind", "eq")
                        .attr("implicit", "true")
                        .child(call)
                        .child(literal_doc(&Literal::Bool(true)));
                }
            }
        }
    }
    Ok(out)
}

/// Calls that may stand alone as a predicate: boolean built-ins, negated
/// calls, and user-registered functions.
fn is_boolean_call(doc: &DocNode) -> bool {
    if doc.tag != Tag::Function {
        return false;
    }
    let name = doc.get("name").unwrap_or_default();
    doc.flag("negate") || is_boolean_function(name) || !is_builtin_function(name)
}

/// Pass 4: binds `and` tighter than `or`, flattening same-kind runs.
fn bind_conjunctions(source: Source<'_>, items: Vec<Item>) -> std::result::Result<DocNode, ParseError> {
    let mut alternatives: Vec<Vec<Node>> = vec![Vec::new()];
    let mut piece: Vec<Node> = Vec::new();
    let mut last_keyword: Option<(Keyword, Span)> = None;
    let has_conjunction = items
        .iter()
        .any(|i| matches!(i, Item::Keyword(k, _) if k.is_conjunction()));

    let close_piece = |piece: &mut Vec<Node>,
                       terms: &mut Vec<Node>,
                       keyword: Option<(Keyword, Span)>|
     -> std::result::Result<(), ParseError> {
        let mut nodes = std::mem::take(piece).into_iter();
        let Some(node) = nodes.next() else {
            return Err(match keyword {
                Some((k, span)) => keyword_error(k, span, "is missing an operand"),
                None => ParseError::new("missing operand", Span::point(source.base)),
            });
        };
        if let Some(extra) = nodes.next() {
            return Err(ParseError::unexpected(
                "an operator",
                source.slice(extra.span),
                extra.span,
            ));
        }
        if has_conjunction && !node.doc.tag.is_boolean() {
            return Err(ParseError::unexpected(
                "a predicate",
                source.slice(node.span),
                node.span,
            ));
        }
        terms.push(node);
        Ok(())
    };

    for item in items {
        match item {
            Item::Node(node) => piece.push(node),
            Item::Keyword(keyword, span) if keyword.is_conjunction() => {
                let mut terms = alternatives.pop().unwrap_or_default();
                close_piece(&mut piece, &mut terms, Some((keyword, span)))?;
                alternatives.push(terms);
                if keyword == Keyword::Or {
                    alternatives.push(Vec::new());
                }
                last_keyword = Some((keyword, span));
            }
            Item::Keyword(keyword, span) => {
                return Err(ParseError::unexpected(
                    "an operand or conjunction",
                    keyword.as_str(),
                    span,
                ))
            }
        }
    }
    if let Some(last) = alternatives.last_mut() {
        close_piece(&mut piece, last, last_keyword)?;
    }

    let mut groups: Vec<DocNode> = alternatives
        .into_iter()
        .map(|terms| {
            let mut docs: Vec<DocNode> = terms.into_iter().map(|n| n.doc).collect();
            if docs.len() == 1 {
                docs.remove(0)
            } else {
                DocNode::new(Tag::Condition)
                    .attr("kind", "and")
                    .with_children(docs)
            }
        })
        .collect();
    if groups.len() == 1 {
        return Ok(groups.remove(0));
    }
    tracing::trace!(alternatives = groups.len(), "bound conjunctions");
    Ok(DocNode::new(Tag::Condition)
        .attr("kind", "or")
        .with_children(groups))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(input: &str) -> String {
        FilterParser::new()
            .compile_document(input)
            .unwrap()
            .children[0]
            .to_string()
    }

    #[test]
    fn test_simple_predicate_document() {
        assert_eq!(
            doc("Age gt 21"),
            "(predicate kind=gt (property value=Age) (literal type=int value=21))"
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed = FilterParser::new()
            .parse_filter("A eq 1 or B eq 2 and C eq 3")
            .unwrap();
        assert_eq!(parsed.serialize(), "A eq 1 or (B eq 2 and C eq 3)");
    }

    #[test]
    fn test_bare_boolean_call_is_sugared() {
        assert_eq!(
            doc("contains(Name,'foo')"),
            "(predicate implicit=true kind=eq (function name=contains (property value=Name) \
             (literal type=string value=foo)) (literal type=bool value=true))"
        );
    }

    #[test]
    fn test_grouped_scalar_call_is_not_sugared() {
        let parsed = FilterParser::new()
            .parse_filter("(length(Name)) gt 5")
            .unwrap();
        assert_eq!(parsed.serialize(), "length(Name) gt 5");
    }

    #[test]
    fn test_quantifier_body_is_rescoped() {
        assert_eq!(
            doc("Orders/any(o: o/Total gt 10)"),
            "(quantifier kind=any name=Orders variable=o (predicate kind=gt \
             (property prefix=o value=Total) (literal type=int value=10)))"
        );
    }

    #[test]
    fn test_with_aggregate() {
        let operand = FilterParser::new()
            .parse_operand("Price mul Quantity with sum")
            .unwrap();
        assert_eq!(operand.to_string(), "Price mul Quantity with sum");
    }

    #[test]
    fn test_errors_name_the_token() {
        let parser = FilterParser::new();
        let err = parser.compile_document("Age gt").unwrap_err();
        assert_eq!(err.message, "'gt' is missing its right operand");

        let err = parser.compile_document("(Age gt 1").unwrap_err();
        assert_eq!(err.message, "unbalanced parenthesis");
        assert_eq!(err.span, Span::new(0, 1));

        let err = parser.compile_document("Age gt 1)").unwrap_err();
        assert_eq!(err.found.as_deref(), Some(")"));

        let err = parser.compile_document("Age Name eq 1").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("Name eq 1"));

        let err = parser.compile_document("Price add 1").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("Price add 1"));
    }

    #[test]
    fn test_nested_error_span_is_absolute() {
        let err = FilterParser::new()
            .compile_document("contains(Name, 'a' eq)")
            .unwrap_err();
        assert_eq!(err.message, "'eq' is missing its right operand");
        assert_eq!(err.span, Span::new(19, 21));
    }
}
