//! Reading and rewriting the descriptive metadata embedded in SVG tiles.
//!
//! Tiles carry Inkscape-style RDF metadata:
//!
//! ```xml
//! <metadata>
//!   <rdf:RDF>
//!     <cc:Work>
//!       <dc:format>image/svg+xml</dc:format>
//!       <dc:creator><cc:Agent><dc:title>Jane</dc:title></cc:Agent></dc:creator>
//!       <dc:subject><rdf:Bag><rdf:li>tile</rdf:li></rdf:Bag></dc:subject>
//!     </cc:Work>
//!   </rdf:RDF>
//! </metadata>
//! ```

use serde::{Deserialize, Serialize};

use crate::ast::*;
use crate::error::TileError;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const CC_NS: &str = "http://creativecommons.org/ns#";

/// Flat view of a tile's descriptive fields. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub viewbox: String,
    pub width: String,
    pub height: String,
    pub title: String,
    pub format: String,
    pub date: String,
    pub description: String,
    pub creator: String,
    pub publisher: String,
    pub rights: String,
    /// Keywords joined with `", "`
    pub keywords: String,
}

fn is_metadata(e: &Element) -> bool {
    e.name.prefix.is_none() && e.is("metadata")
}

fn is_work(e: &Element) -> bool {
    e.name.matches(CC_NS, "Work")
}

fn is_subject(e: &Element) -> bool {
    e.name.matches(DC_NS, "subject")
}

/// Extract the metadata record from a parsed document.
pub fn extract_metadata(doc: &Document) -> Metadata {
    let mut metadata = Metadata::default();

    if let Some(svg) = doc.find_element(|e| e.is("svg")) {
        let attr = |name| svg.get_attr(name).unwrap_or_default().to_string();
        metadata.viewbox = attr("viewBox");
        metadata.width = attr("width");
        metadata.height = attr("height");
        metadata.title = value_of(svg, SVG_NS, "title");
    }

    let Some(meta) = doc.find_element(is_metadata) else {
        return metadata;
    };

    metadata.format = value_of(meta, DC_NS, "format");
    metadata.date = value_of(meta, DC_NS, "date");
    metadata.description = value_of(meta, DC_NS, "description");

    metadata.creator = nested_title(meta, "creator");
    metadata.publisher = nested_title(meta, "publisher");
    metadata.rights = nested_title(meta, "rights");

    metadata.keywords = join_keywords(&read_keywords(meta));

    metadata
}

/// Text of the first `namespace:local` element below `node`.
fn value_of(node: &Element, namespace: &str, local: &str) -> String {
    node.find(namespace, local)
        .map(Element::text_content)
        .unwrap_or_default()
}

/// `dc:<parent>` → first `dc:title` below it.
fn nested_title(meta: &Element, parent: &str) -> String {
    meta.find(DC_NS, parent)
        .map(|p| value_of(p, DC_NS, "title"))
        .unwrap_or_default()
}

/// `dc:subject` → `rdf:Bag` → each `rdf:li`, in document order.
pub fn read_keywords(meta: &Element) -> Vec<String> {
    meta.find(DC_NS, "subject")
        .and_then(|subject| subject.find(RDF_NS, "Bag"))
        .map(|bag| {
            bag.child_elements()
                .filter(|e| e.name.matches(RDF_NS, "li"))
                .map(Element::text_content)
                .collect()
        })
        .unwrap_or_default()
}

/// Split comma separated keywords, trimming each one. Empty entries are kept.
///
/// A keyword cannot contain a comma.
pub fn split_keywords(csv: &str) -> Vec<String> {
    csv.split(',').map(|k| k.trim().to_string()).collect()
}

pub fn join_keywords(keywords: &[String]) -> String {
    keywords.join(", ")
}

/// Replace the document's keyword list with the comma separated `csv`.
///
/// Every `dc:subject` under `<metadata>` is removed and a fresh
/// `dc:subject/rdf:Bag/rdf:li*` subtree is appended to the `cc:Work`
/// element. Fails without touching the document when there is no
/// `<metadata>` or no `cc:Work` inside it.
pub fn apply_keywords(doc: &mut Document, csv: &str) -> Result<(), TileError> {
    let meta_scope = doc.scope_of(is_metadata).ok_or(TileError::MissingMetadata)?;
    let meta = doc
        .find_element_mut(is_metadata)
        .ok_or(TileError::MissingMetadata)?;
    let mut scope = meta
        .scope_of(&meta_scope, &is_work)
        .ok_or(TileError::MissingWorkContainer)?;

    let removed = meta.remove_descendants(&is_subject);
    if removed > 1 {
        log::debug!("Replaced {} keyword subjects", removed);
    }

    let mut subject = new_element(&mut scope, DC_NS, "dc", "subject");
    let mut bag = new_element(&mut scope, RDF_NS, "rdf", "Bag");
    for keyword in split_keywords(csv) {
        let mut li = new_element(&mut scope, RDF_NS, "rdf", "li");
        if !keyword.is_empty() {
            li.append_child(Node::text(keyword));
        }
        bag.append_child(Node::Element(li));
    }
    subject.append_child(Node::Element(bag));

    let work = meta
        .find_mut(&is_work)
        .ok_or(TileError::MissingWorkContainer)?;
    work.append_child(Node::Element(subject));

    Ok(())
}

/// Build `namespace:local` using a prefix already bound in `scope`, or
/// declare `fallback` for it on the new element.
fn new_element(scope: &mut Scope, namespace: &str, fallback: &str, local: &str) -> Element {
    // Prefer a named prefix over the default namespace.
    let bound = scope
        .iter()
        .filter(|(_, uri)| *uri == namespace)
        .map(|(prefix, _)| prefix.clone())
        .max();

    let mut name = match bound {
        Some(Some(prefix)) => QName::with_prefix(prefix, local),
        Some(None) => QName::new(local),
        None => {
            scope.insert(Some(fallback.to_string()), namespace.to_string());
            let mut name = QName::with_prefix(fallback, local);
            name.namespace = Some(namespace.to_string());
            return Element::new(name).with_attr(&format!("xmlns:{}", fallback), namespace);
        }
    };
    name.namespace = Some(namespace.to_string());
    Element::new(name)
}
