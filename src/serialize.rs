//! SVG serialization back to text.
//!
//! Untouched nodes are copied byte-for-byte from [`Document::source`];
//! only elements edited since parsing are rebuilt.

use crate::ast::*;

/// Serialize a Document to a string.
pub fn serialize(doc: &Document) -> String {
    let src = doc.source.as_str();
    let mut out = String::with_capacity(src.len() + 256);

    match doc.root.span.as_ref().map(ElementSpan::outer) {
        Some(outer) => {
            // XML declaration, DOCTYPE and anything after the root
            out.push_str(&src[..outer.start]);
            serialize_element(&mut out, &doc.root, src);
            out.push_str(&src[outer.end..]);
        }
        None => serialize_element(&mut out, &doc.root, src),
    }

    out
}

fn serialize_element(out: &mut String, elem: &Element, src: &str) {
    let Some(span) = &elem.span else {
        serialize_fresh_element(out, elem, src);
        return;
    };

    if elem.is_pristine() {
        out.push_str(&src[span.outer()]);
        return;
    }

    match &span.end_tag {
        Some(end_tag) => {
            out.push_str(&src[span.start_tag.clone()]);
            for child in &elem.children {
                serialize_node(out, child, src);
            }
            out.push_str(&src[end_tag.clone()]);
        }
        None if elem.children.is_empty() => out.push_str(&src[span.start_tag.clone()]),
        None => {
            // Was self-closing, now has children: reopen the start tag.
            let tag = src[span.start_tag.clone()].trim_end_matches('>').trim_end_matches('/');
            out.push_str(tag.trim_end());
            out.push('>');
            for child in &elem.children {
                serialize_node(out, child, src);
            }
            push_end_tag(out, elem);
        }
    }
}

fn serialize_fresh_element(out: &mut String, elem: &Element, src: &str) {
    out.push('<');
    out.push_str(&elem.name.full_name());

    for attr in &elem.attributes {
        out.push(' ');
        out.push_str(&attr.name.full_name());
        out.push_str("=\"");
        push_escaped_attr(out, &attr.value);
        out.push('"');
    }

    // Children or self-closing
    if elem.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');

        for child in &elem.children {
            serialize_node(out, child, src);
        }

        push_end_tag(out, elem);
    }
}

fn push_end_tag(out: &mut String, elem: &Element) {
    out.push_str("</");
    out.push_str(&elem.name.full_name());
    out.push('>');
}

fn serialize_node(out: &mut String, node: &Node, src: &str) {
    let raw = match node {
        Node::Element(_) => None,
        other => other.span(),
    };
    if let Some(span) = raw {
        out.push_str(&src[span]);
        return;
    }

    match node {
        Node::Element(elem) => serialize_element(out, elem, src),
        Node::Text { value, .. } => push_escaped_text(out, value),
        Node::Comment { value, .. } => {
            out.push_str("<!--");
            out.push_str(value);
            out.push_str("-->");
        }
        Node::CData { value, .. } => {
            out.push_str("<![CDATA[");
            out.push_str(value);
            out.push_str("]]>");
        }
        Node::ProcessingInstruction { target, content, .. } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(c) = content {
                out.push(' ');
                out.push_str(c);
            }
            out.push_str("?>");
        }
    }
}

fn push_escaped_attr(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_text(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
