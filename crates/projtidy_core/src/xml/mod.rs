//! Whitespace-preserving XML tree used by every normalization pass.
//!
//! # Responsibility
//! - Load project files into a mutable tree that remembers exact source bytes.
//! - Offer separator-aware structural edits (detach with leading text, etc.).
//!
//! # Invariants
//! - `Document::parse(s)?.to_bytes() == s.as_bytes()` for every accepted input.
//! - Only nodes the caller edits change their serialized form.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod document;
mod parse;

pub use document::{Attribute, Document, Element, NodeId, NodeKind, Text, TextKind};

/// Failure to load a project file into a [`Document`].
#[derive(Debug)]
pub enum XmlError {
    Encoding(std::str::Utf8Error),
    Syntax { position: usize, message: String },
    Unclosed { name: String },
    MissingRoot,
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(err) => write!(f, "file is not valid UTF-8: {err}"),
            Self::Syntax { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::Unclosed { name } => write!(f, "element `{name}` is never closed"),
            Self::MissingRoot => write!(f, "document has no root element"),
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::Syntax { .. } | Self::Unclosed { .. } | Self::MissingRoot => None,
        }
    }
}
