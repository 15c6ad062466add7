//! Lossless XML tree for SVG tiles.
//!
//! Every parsed node remembers the byte range it was read from, so a
//! document can be written back with only the edited subtrees rebuilt.

use std::collections::BTreeMap;
use std::ops::Range;

/// Byte range into [`Document::source`].
pub type Span = Range<usize>;

/// Namespace bindings in scope at some element, keyed by prefix
/// (`None` is the default namespace).
pub type Scope = BTreeMap<Option<String>, String>;

/// A parsed SVG document together with the text it came from.
#[derive(Debug, Clone)]
pub struct Document {
    /// The original document text. Spans index into this.
    pub source: String,
    /// The root element (normally `<svg>`).
    pub root: Element,
}

/// Where an element's tags sit in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    pub start_tag: Span,
    /// `None` for self-closing elements.
    pub end_tag: Option<Span>,
}

impl ElementSpan {
    /// The range covering the whole element, tags included.
    pub fn outer(&self) -> Span {
        match &self.end_tag {
            Some(end) => self.start_tag.start..end.end,
            None => self.start_tag.clone(),
        }
    }
}

/// An XML element.
#[derive(Debug, Clone)]
pub struct Element {
    /// Element name with its prefix and resolved namespace
    pub name: QName,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<Node>,
    /// Source location, `None` for elements built in memory
    pub span: Option<ElementSpan>,
    edited: bool,
}

/// A qualified name (possibly with namespace prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace prefix (e.g., "dc", "rdf")
    pub prefix: Option<String>,
    /// Local name (e.g., "title", "li")
    pub local: String,
    /// Namespace URI the prefix resolved to, if any
    pub namespace: Option<String>,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
            namespace: None,
        }
    }

    /// Parse a qualified name from a string like "prefix:local" or just "local".
    pub fn parse(s: &str) -> Self {
        if let Some((prefix, local)) = s.split_once(':') {
            Self::with_prefix(prefix, local)
        } else {
            Self::new(s)
        }
    }

    /// Check if this is a namespace declaration (xmlns or xmlns:prefix).
    pub fn is_xmlns(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || (self.prefix.is_none() && self.local == "xmlns")
    }

    /// True if the name resolved to `namespace` and has the given local part.
    pub fn matches(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    /// Get the full name as a string.
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QName::parse(name),
            value: value.into(),
        }
    }
}

/// A node in the tree. Parsed nodes carry their source span.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Character data, already unescaped
    Text { value: String, span: Option<Span> },
    Comment { value: String, span: Option<Span> },
    CData { value: String, span: Option<Span> },
    ProcessingInstruction {
        target: String,
        content: Option<String>,
        span: Option<Span>,
    },
}

impl Node {
    /// A text node built in memory.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
            span: None,
        }
    }

    /// Source range of this node, if it was parsed.
    pub fn span(&self) -> Option<Span> {
        match self {
            Node::Element(e) => e.span.as_ref().map(ElementSpan::outer),
            Node::Text { span, .. }
            | Node::Comment { span, .. }
            | Node::CData { span, .. }
            | Node::ProcessingInstruction { span, .. } => span.clone(),
        }
    }

    /// True if the node can be copied verbatim from the source.
    pub fn is_pristine(&self) -> bool {
        match self {
            Node::Element(e) => e.is_pristine(),
            other => other.span().is_some(),
        }
    }

    fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text { value, .. } if value.trim().is_empty())
    }
}

impl Element {
    /// A fresh element with the given name and no source location.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            span: None,
            edited: false,
        }
    }

    /// Builder-style attribute for elements constructed in memory.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Get an unprefixed attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.prefix.is_none() && a.name.local == name)
            .map(|a| a.value.as_str())
    }

    /// Check if this element has a specific local name.
    pub fn is(&self, name: &str) -> bool {
        self.name.local == name
    }

    /// Add this element's namespace declarations to `scope`.
    pub fn declare_into(&self, scope: &mut Scope) {
        for attr in self.attributes.iter().filter(|a| a.name.is_xmlns()) {
            let prefix = match attr.name.prefix {
                Some(_) => Some(attr.name.local.clone()),
                None => None,
            };
            if attr.value.is_empty() {
                scope.remove(&prefix);
            } else {
                scope.insert(prefix, attr.value.clone());
            }
        }
    }

    /// Iterate over child elements only (skip text, comments, etc.).
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements mutably.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.child_elements().collect::<Vec<_>>().into_iter().rev().collect(),
        }
    }

    /// First descendant with the given namespace and local name.
    pub fn find(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name.matches(namespace, local))
    }

    /// First element in this subtree (`self` included) matching `pred`.
    pub fn find_mut(&mut self, pred: &impl Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in self.child_elements_mut() {
            if let Some(found) = child.find_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Namespace bindings in scope at the first element in this subtree
    /// matching `pred`. `inherited` holds the bindings in scope above `self`.
    pub fn scope_of(&self, inherited: &Scope, pred: &impl Fn(&Element) -> bool) -> Option<Scope> {
        let mut scope = inherited.clone();
        self.declare_into(&mut scope);
        if pred(self) {
            return Some(scope);
        }
        self.child_elements()
            .find_map(|child| child.scope_of(&scope, pred))
    }

    /// Concatenated character data of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(e) => e.collect_text(out),
                Node::Text { value, .. } | Node::CData { value, .. } => out.push_str(value),
                _ => {}
            }
        }
    }

    /// Append a child, keeping any trailing whitespace (the indentation
    /// before the closing tag) last.
    pub fn append_child(&mut self, node: Node) {
        let at = match self.children.last() {
            Some(last) if last.is_blank_text() => self.children.len() - 1,
            _ => self.children.len(),
        };
        self.children.insert(at, node);
        self.edited = true;
    }

    /// Remove every descendant element matching `pred`, returning how many
    /// were removed. Matches are not searched for inside removed subtrees.
    pub fn remove_descendants(&mut self, pred: &impl Fn(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if pred(e)));
        let mut removed = before - self.children.len();
        if removed > 0 {
            self.edited = true;
        }
        for child in self.child_elements_mut() {
            removed += child.remove_descendants(pred);
        }
        removed
    }

    /// True if neither this element nor anything below it changed since parsing.
    pub fn is_pristine(&self) -> bool {
        self.span.is_some() && !self.edited && self.children.iter().all(Node::is_pristine)
    }
}

/// Depth-first iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let elem = self.stack.pop()?;
        self.stack.extend(elem.child_elements().collect::<Vec<_>>().into_iter().rev());
        Some(elem)
    }
}

impl Document {
    /// First element in the document (root included) matching `pred`.
    pub fn find_element(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        if pred(&self.root) {
            return Some(&self.root);
        }
        self.root.descendants().find(|e| pred(*e))
    }

    /// Mutable variant of [`Document::find_element`].
    pub fn find_element_mut(&mut self, pred: impl Fn(&Element) -> bool) -> Option<&mut Element> {
        self.root.find_mut(&pred)
    }

    /// Namespace bindings in scope at the first element matching `pred`.
    pub fn scope_of(&self, pred: impl Fn(&Element) -> bool) -> Option<Scope> {
        self.root.scope_of(&Scope::new(), &pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(local: &str) -> Element {
        Element::new(QName::new(local))
    }

    #[test]
    fn test_qname_parse() {
        let q = QName::parse("rdf:li");
        assert_eq!(q.prefix.as_deref(), Some("rdf"));
        assert_eq!(q.local, "li");
        assert_eq!(q.full_name(), "rdf:li");
        assert!(QName::parse("xmlns:dc").is_xmlns());
        assert!(QName::parse("xmlns").is_xmlns());
        assert!(!QName::parse("viewBox").is_xmlns());
    }

    #[test]
    fn test_descendants_document_order() {
        let mut a = named("a");
        let mut b = named("b");
        b.append_child(Node::Element(named("c")));
        a.append_child(Node::Element(b));
        a.append_child(Node::Element(named("d")));

        let order: Vec<_> = a.descendants().map(|e| e.name.local.as_str()).collect();
        assert_eq!(order, ["b", "c", "d"]);
    }

    #[test]
    fn test_append_keeps_trailing_whitespace_last() {
        let mut a = named("a");
        a.children.push(Node::text("\n  "));
        a.append_child(Node::Element(named("b")));
        assert!(matches!(a.children[0], Node::Element(_)));
        assert!(a.children[1].is_blank_text());
    }

    #[test]
    fn test_declare_into_and_undeclare() {
        let mut scope = Scope::new();
        let e = named("svg")
            .with_attr("xmlns", "http://www.w3.org/2000/svg")
            .with_attr("xmlns:dc", "http://purl.org/dc/elements/1.1/");
        e.declare_into(&mut scope);
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.get(&Some("dc".to_string())).map(String::as_str), Some("http://purl.org/dc/elements/1.1/"));

        named("g").with_attr("xmlns", "").declare_into(&mut scope);
        assert!(!scope.contains_key(&None));
    }

    #[test]
    fn test_remove_descendants_counts_nested() {
        let mut a = named("a");
        let mut b = named("b");
        b.append_child(Node::Element(named("x")));
        a.append_child(Node::Element(b));
        a.append_child(Node::Element(named("x")));

        assert_eq!(a.remove_descendants(&|e: &Element| e.is("x")), 2);
        assert!(a.descendants().all(|e| !e.is("x")));
    }

    #[test]
    fn test_fresh_elements_are_not_pristine() {
        assert!(!named("a").is_pristine());
        assert!(!Node::text("x").is_pristine());
    }
}
