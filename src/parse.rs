//! SVG parsing from XML.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::ast::*;
use crate::error::TileError;

/// Deepest element nesting accepted before the input is rejected.
pub const MAX_DEPTH: usize = 256;

/// General entities declared in the DOCTYPE internal subset, e.g.
/// `<!ENTITY ns_svg "http://www.w3.org/2000/svg">` as Illustrator writes them.
type Entities = BTreeMap<String, String>;

/// The text being parsed and the entities it declares.
struct Source<'a> {
    text: &'a str,
    entities: Entities,
}

impl Source<'_> {
    fn resolve(&self, name: &str) -> Option<&str> {
        self.entities
            .get(name)
            .map(String::as_str)
            .or_else(|| resolve_predefined_entity(name))
    }
}

/// Parse an SVG string into a Document.
///
/// The returned document keeps a copy of `svg`; every node records the
/// byte range it was read from and every element name is resolved against
/// the namespace declarations in scope.
pub fn parse_svg(svg: &str) -> Result<Document, TileError> {
    let mut reader = Reader::from_str(svg);
    let scope = Scope::new();
    let mut source = Source {
        text: svg,
        entities: Entities::new(),
    };

    let mut cursor = 0;
    let mut root = None;

    loop {
        let event = reader.read_event()?;
        let span = cursor..event_end(&reader, svg, cursor, &event);
        cursor = span.end;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(TileError::InvalidSvg("Multiple root elements".into()));
                }
                root = Some(parse_element(&mut reader, &source, &mut cursor, &start, span, &scope, 1)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(TileError::InvalidSvg("Multiple root elements".into()));
                }
                let (mut element, _) = parse_element_start(&start, &scope, &source)?;
                element.span = Some(ElementSpan {
                    start_tag: span,
                    end_tag: None,
                });
                root = Some(element);
            }
            Event::End(_) => {
                return Err(TileError::InvalidSvg("Unexpected closing tag".into()));
            }
            Event::Text(text) => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(TileError::InvalidSvg("Text outside the root element".into()));
                }
            }
            Event::DocType(doctype) => {
                source.entities = parse_entities(&String::from_utf8_lossy(&doctype));
            }
            Event::Eof => break,
            // Declarations, DOCTYPE, comments and PIs around the root are
            // kept verbatim by the serializer.
            _ => {}
        }
    }

    let root = root.ok_or_else(|| TileError::InvalidSvg("No root element found".into()))?;

    Ok(Document {
        source: svg.to_string(),
        root,
    })
}

/// Byte offset where `event`, which started at `start`, ends.
///
/// Markup events end at the reader position. Text runs up to the next `<`,
/// which the reader may already have consumed.
fn event_end(reader: &Reader<&[u8]>, src: &str, start: usize, event: &Event) -> usize {
    match event {
        Event::Text(_) => src[start..].find('<').map_or(src.len(), |i| start + i),
        Event::Eof => src.len(),
        _ => reader.buffer_position() as usize,
    }
}

/// Entity declarations in a DOCTYPE body. Parameter and external entities
/// are ignored.
fn parse_entities(doctype: &str) -> Entities {
    let mut entities = Entities::new();
    let mut rest = doctype;

    while let Some(at) = rest.find("<!ENTITY") {
        rest = rest[at + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        entities.insert(name.to_string(), rest[1..1 + len].to_string());
        rest = &rest[2 + len..];
    }

    entities
}

fn parse_element(
    reader: &mut Reader<&[u8]>,
    source: &Source,
    cursor: &mut usize,
    start: &BytesStart,
    start_tag: Span,
    parent_scope: &Scope,
    depth: usize,
) -> Result<Element, TileError> {
    let (mut element, scope) = parse_element_start(start, parent_scope, source)?;
    if depth > MAX_DEPTH {
        return Err(TileError::InvalidSvg(format!(
            "Elements nested deeper than {} levels",
            MAX_DEPTH
        )));
    }

    loop {
        let event = reader.read_event()?;
        let span = *cursor..event_end(reader, source.text, *cursor, &event);
        *cursor = span.end;

        match event {
            Event::Start(start) => {
                let child = parse_element(reader, source, cursor, &start, span, &scope, depth + 1)?;
                element.children.push(Node::Element(child));
            }
            Event::Empty(start) => {
                let (mut child, _) = parse_element_start(&start, &scope, source)?;
                child.span = Some(ElementSpan {
                    start_tag: span,
                    end_tag: None,
                });
                element.children.push(Node::Element(child));
            }
            Event::End(_) => {
                element.span = Some(ElementSpan {
                    start_tag,
                    end_tag: Some(span),
                });
                break;
            }
            Event::Text(text) => {
                element.children.push(Node::Text {
                    value: decode_text(&text, source),
                    span: Some(span),
                });
            }
            Event::Comment(comment) => {
                element.children.push(Node::Comment {
                    value: String::from_utf8_lossy(&comment).into_owned(),
                    span: Some(span),
                });
            }
            Event::CData(cdata) => {
                element.children.push(Node::CData {
                    value: String::from_utf8_lossy(&cdata).into_owned(),
                    span: Some(span),
                });
            }
            Event::PI(pi) => {
                let content = String::from_utf8_lossy(&pi).into_owned();
                let (target, rest) = content
                    .split_once(char::is_whitespace)
                    .map(|(t, r)| (t.to_string(), Some(r.to_string())))
                    .unwrap_or_else(|| (content, None));
                element.children.push(Node::ProcessingInstruction {
                    target,
                    content: rest,
                    span: Some(span),
                });
            }
            Event::Eof => {
                return Err(TileError::InvalidSvg("Unexpected end of file".into()));
            }
            _ => {
                return Err(TileError::InvalidSvg(format!(
                    "Declaration inside <{}>",
                    element.name.full_name()
                )));
            }
        }
    }

    Ok(element)
}

/// Unescaped text, or the raw bytes if it uses entities we cannot expand.
fn decode_text(text: &BytesText, source: &Source) -> String {
    match text.unescape_with(|name| source.resolve(name)) {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

/// Build an element from its start tag and return it together with the
/// namespace scope its children see.
fn parse_element_start(
    start: &BytesStart,
    parent_scope: &Scope,
    source: &Source,
) -> Result<(Element, Scope), TileError> {
    let name_bytes = start.name();
    let name = std::str::from_utf8(name_bytes.as_ref())?;

    let mut element = Element::new(QName::parse(name));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| TileError::InvalidSvg(format!("Invalid attribute: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = match attr.unescape_value_with(|name| source.resolve(name)) {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        element.attributes.push(Attribute {
            name: QName::parse(key),
            value,
        });
    }

    let mut scope = parent_scope.clone();
    element.declare_into(&mut scope);
    element.name.namespace = scope.get(&element.name.prefix).cloned();

    Ok((element, scope))
}
