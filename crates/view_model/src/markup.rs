//! Markup parsing and serialization
//!
//! Markup is read as well-formed, XML-compatible HTML: every element must be
//! closed (`<br/>` rather than `<br>`) and attribute values must be quoted.

use crate::{Result, ViewElement, ViewError, ViewNode};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse a markup fragment into view nodes.
///
/// Whitespace-only text is dropped. Comments, declarations and processing
/// instructions are ignored.
pub fn parse_markup(markup: &str) -> Result<Vec<ViewNode>> {
    let mut reader = Reader::from_str(markup);

    let mut stack: Vec<ViewElement> = Vec::new();
    let mut roots = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(element_from(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e)?;
                push_node(&mut stack, &mut roots, ViewNode::Element(element));
            }
            Ok(Event::End(ref e)) => {
                let element = stack.pop().ok_or_else(|| {
                    ViewError::Malformed(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                push_node(&mut stack, &mut roots, ViewNode::Element(element));
            }
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|err| ViewError::Malformed(err.to_string()))?;
                if !text.trim().is_empty() {
                    push_node(&mut stack, &mut roots, ViewNode::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if !text.is_empty() {
                    push_node(&mut stack, &mut roots, ViewNode::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ViewError::Malformed(format!(
                    "{} at byte {}",
                    err,
                    reader.buffer_position()
                )))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ViewError::Malformed(format!("unclosed element <{}>", open.name)));
    }
    Ok(roots)
}

fn element_from(start: &BytesStart<'_>) -> Result<ViewElement> {
    let mut element = ViewElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| ViewError::Malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| ViewError::Malformed(err.to_string()))?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn push_node(stack: &mut [ViewElement], roots: &mut Vec<ViewNode>, node: ViewNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Serialize view nodes back to markup
pub fn to_markup(nodes: &[ViewNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &ViewNode) {
    match node {
        ViewNode::Text(text) => out.push_str(&escape(text.as_str())),
        ViewNode::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value.as_str()));
                out.push('"');
            }
            out.push('>');
            for child in &element.children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}
