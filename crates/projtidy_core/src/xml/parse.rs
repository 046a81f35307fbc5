//! Event-driven loader building a [`Document`] from source text.

use super::document::{Attribute, Document, Element, NodeId, NodeKind, Text, TextKind};
use super::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

impl Document {
    /// Parses UTF-8 bytes, remembering a leading byte order mark.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        let text = std::str::from_utf8(bytes).map_err(XmlError::Encoding)?;
        Self::parse(text)
    }

    /// Parses source text into a whitespace-preserving tree.
    ///
    /// # Errors
    /// - `Syntax` when the reader rejects the input.
    /// - `Unclosed` when the input ends inside an element.
    /// - `MissingRoot` when no element is present at all.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let (bom, text) = match input.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let mut reader = Reader::from_str(text);
        let mut doc = Document::empty(bom);
        let mut open: Vec<NodeId> = vec![Document::DOCUMENT_NODE];
        let mut line = 1usize;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|err| XmlError::Syntax {
                position: start,
                message: err.to_string(),
            })?;
            let end = reader.buffer_position() as usize;
            let raw = text.get(start..end).ok_or_else(|| XmlError::Syntax {
                position: start,
                message: "event boundary is not a character boundary".to_string(),
            })?;
            let parent = open.last().copied().unwrap_or(Document::DOCUMENT_NODE);

            match event {
                Event::Start(start_tag) => {
                    let element = element_from(&start_tag, raw, false, line, start)?;
                    let id = doc.push(parent, NodeKind::Element(element));
                    open.push(id);
                }
                Event::Empty(start_tag) => {
                    let element = element_from(&start_tag, raw, true, line, start)?;
                    doc.push(parent, NodeKind::Element(element));
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(XmlError::Syntax {
                            position: start,
                            message: "closing tag without matching start tag".to_string(),
                        });
                    }
                    if let Some(element) = open.pop().and_then(|id| doc.element_mut(id)) {
                        element.set_end_tag(raw);
                    }
                }
                Event::Text(_) => {
                    doc.push(parent, NodeKind::Text(Text::new(raw, TextKind::Plain)));
                }
                Event::CData(_) => {
                    doc.push(parent, NodeKind::Text(Text::new(raw, TextKind::CData)));
                }
                Event::Eof => break,
                _ => {
                    doc.push(parent, NodeKind::Other(raw.to_string()));
                }
            }

            line += raw.bytes().filter(|b| *b == b'\n').count();
        }

        if open.len() > 1 {
            let name = open
                .last()
                .and_then(|id| doc.element(*id))
                .map(|element| element.name().to_string())
                .unwrap_or_default();
            return Err(XmlError::Unclosed { name });
        }
        if doc.root().is_none() {
            return Err(XmlError::MissingRoot);
        }
        Ok(doc)
    }
}

fn element_from(
    start_tag: &BytesStart<'_>,
    raw: &str,
    self_closing: bool,
    line: usize,
    position: usize,
) -> Result<Element, XmlError> {
    let name = String::from_utf8_lossy(start_tag.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start_tag.attributes() {
        let attr = attr.map_err(|err| XmlError::Syntax {
            position,
            message: err.to_string(),
        })?;
        let value = attr.unescape_value().map_err(|err| XmlError::Syntax {
            position,
            message: err.to_string(),
        })?;
        attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: value.into_owned(),
        });
    }
    Ok(Element::new(
        name,
        attributes,
        raw.to_string(),
        self_closing,
        line,
    ))
}
