//! The structured document emitted by the precedence compiler.
//!
//! Each node carries a tag naming its kind, scalar fields as string
//! attributes, and nested nodes as children. The expression model is built
//! from this document one constructor per tag.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Node kinds of the structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Synthetic root holding one expression.
    Root,
    /// `and` / `or` over ordered items.
    Condition,
    /// Comparison or membership test.
    Predicate,
    /// Binary arithmetic.
    Arithmetic,
    /// Scalar or boolean function call.
    Function,
    /// Property reference.
    Property,
    /// `@name` placeholder.
    Parameter,
    /// Typed scalar.
    Literal,
    /// Enum literal.
    Enum,
    /// Literal list.
    List,
    /// `any` / `all` over a collection.
    Quantifier,
    /// Aggregate application.
    With,
}

impl Tag {
    /// Returns the tag name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Condition => "condition",
            Self::Predicate => "predicate",
            Self::Arithmetic => "arithmetic",
            Self::Function => "function",
            Self::Property => "property",
            Self::Parameter => "parameter",
            Self::Literal => "literal",
            Self::Enum => "enum",
            Self::List => "list",
            Self::Quantifier => "quantifier",
            Self::With => "with",
        }
    }

    /// Nodes that evaluate to a boolean at the top of a filter.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Condition | Self::Predicate | Self::Quantifier)
    }
}

/// One node of the structured document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    /// Node kind.
    pub tag: Tag,
    /// Scalar fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Nested nodes, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocNode>,
}

impl DocNode {
    /// Creates an empty node.
    #[must_use]
    pub const fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(String::from(name), value.into());
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, node: DocNode) -> Self {
        self.children.push(node);
        self
    }

    /// Appends children.
    #[must_use]
    pub fn with_children(mut self, nodes: impl IntoIterator<Item = DocNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns true if the attribute is `"true"`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    /// Wraps an expression node under the synthetic root.
    #[must_use]
    pub fn root(expression: DocNode) -> Self {
        Self::new(Tag::Root).child(expression)
    }

    /// Serializes the document as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error (not expected for well-formed nodes).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Compact s-expression form, handy in logs and tests:
/// `(predicate kind=eq (property value=Age) (literal type=int value=21))`.
impl fmt::Display for DocNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.tag.as_str())?;
        for (name, value) in &self.attributes {
            write!(f, " {name}={value}")?;
        }
        for child in &self.children {
            write!(f, " {child}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let node = DocNode::new(Tag::Predicate)
            .attr("kind", "eq")
            .child(DocNode::new(Tag::Property).attr("value", "Age"))
            .child(
                DocNode::new(Tag::Literal)
                    .attr("type", "int")
                    .attr("value", "21"),
            );
        assert_eq!(
            node.to_string(),
            "(predicate kind=eq (property value=Age) (literal type=int value=21))"
        );
    }

    #[test]
    fn test_json_uses_lowercase_tags() {
        let json = DocNode::root(DocNode::new(Tag::Parameter).attr("value", "x"))
            .to_json()
            .unwrap();
        assert!(json.contains("\"root\""));
        assert!(json.contains("\"parameter\""));
        let back: DocNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.children[0].get("value"), Some("x"));
    }
}
