//! Arena-backed element tree with exact source bytes per node.
//!
//! # Responsibility
//! - Hold a project file as ordered nodes (elements, text, other markup).
//! - Provide the structural edits the normalizers need.
//! - Serialize back to bytes without touching unedited regions.
//!
//! # Invariants
//! - A node is attached to at most one parent at a time.
//! - Detached nodes stay in the arena but are never serialized.
//! - Unmodified documents serialize to the exact bytes they were parsed from.

const BOM: &str = "\u{feff}";

/// Stable handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Decoded attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name as written in source.
    pub name: String,
    /// Entity-decoded attribute value.
    pub value: String,
}

/// Element node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    start_tag: String,
    end_tag: Option<String>,
    line: usize,
}

impl Element {
    pub(crate) fn new(
        name: String,
        attributes: Vec<Attribute>,
        start_tag: String,
        self_closing: bool,
        line: usize,
    ) -> Self {
        let end_tag = if self_closing {
            None
        } else {
            Some(String::new())
        };
        Self {
            name,
            attributes,
            start_tag,
            end_tag,
            line,
        }
    }

    /// Qualified name, e.g. `ItemGroup` or `x:Foo`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Returns `true` when the element name carries no prefix, i.e. it lives in
    /// the default namespace inherited from the root.
    pub fn is_unprefixed(&self) -> bool {
        !self.name.contains(':')
    }

    /// Looks up an attribute by exact qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// 1-based line of the start tag in the source text.
    pub fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn set_end_tag(&mut self, raw: &str) {
        self.end_tag = Some(raw.to_string());
    }

    fn expand_self_closing(&mut self) {
        if self.end_tag.is_some() {
            return;
        }
        if let Some(head) = self.start_tag.strip_suffix("/>") {
            self.start_tag = format!("{head}>");
        }
        self.end_tag = Some(format!("</{}>", self.name));
    }
}

/// Flavor of a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Plain,
    CData,
}

/// Text node payload, stored as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    raw: String,
    kind: TextKind,
}

impl Text {
    pub(crate) fn new(raw: impl Into<String>, kind: TextKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }

    /// Returns `true` for plain text made only of XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.kind == TextKind::Plain
            && self
                .raw
                .chars()
                .all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
    }

    /// Decoded character data.
    pub fn value(&self) -> String {
        match self.kind {
            TextKind::CData => self
                .raw
                .strip_prefix("<![CDATA[")
                .and_then(|rest| rest.strip_suffix("]]>"))
                .unwrap_or(&self.raw)
                .to_string(),
            TextKind::Plain => match quick_xml::escape::unescape(&self.raw) {
                Ok(value) => value.into_owned(),
                Err(_) => self.raw.clone(),
            },
        }
    }
}

/// Payload of one tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document node owning prolog, root element and epilog.
    Document,
    Element(Element),
    Text(Text),
    /// Comment, processing instruction, XML declaration or doctype.
    Other(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Whitespace-preserving mutable XML tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    bom: bool,
}

impl Document {
    pub(crate) const DOCUMENT_NODE: NodeId = NodeId(0);

    pub(crate) fn empty(bom: bool) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: None,
            bom,
        }
    }

    /// Adds a new node as last child of `parent` and returns its handle.
    pub(crate) fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        if self.root.is_none()
            && parent == Self::DOCUMENT_NODE
            && matches!(self.nodes[id.0].kind, NodeKind::Element(_))
        {
            self.root = Some(id);
        }
        id
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Root element, if the document has one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Whether the source started with a UTF-8 byte order mark.
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&Text> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All child nodes in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children in document order.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// Unprefixed element children whose name is `name`.
    pub fn child_elements_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| {
                self.element(*child)
                    .is_some_and(|element| element.is_unprefixed() && element.name() == name)
            })
            .collect()
    }

    pub fn has_child_elements(&self, id: NodeId) -> bool {
        self.children(id)
            .iter()
            .any(|child| self.element(*child).is_some())
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        index.checked_sub(1).map(|prev| siblings[prev])
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Concatenated, decoded text of all descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            match &self.nodes[child.0].kind {
                NodeKind::Text(text) => out.push_str(&text.value()),
                NodeKind::Element(_) => self.collect_text(*child, out),
                NodeKind::Document | NodeKind::Other(_) => {}
            }
        }
    }

    /// Unlinks a node from its parent. No-op for already detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
    }

    /// Unlinks a node together with the text node directly before it, i.e. the
    /// indentation that introduced it.
    pub fn detach_with_leading_text(&mut self, id: NodeId) {
        if let Some(prev) = self.previous_sibling(id) {
            if self.is_text(prev) {
                self.detach(prev);
            }
        }
        self.detach(id);
    }

    /// Removes the last child of `id` when it is a text node.
    pub fn remove_trailing_text(&mut self, id: NodeId) {
        if let Some(last) = self.last_child(id) {
            if self.is_text(last) {
                self.detach(last);
            }
        }
    }

    /// Appends an attached or detached node as last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(element) = self.element_mut(parent) {
            element.expand_self_closing();
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Moves every child node of `from` to the end of `to`, keeping order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let moved = std::mem::take(&mut self.nodes[from.0].children);
        for child in &moved {
            self.nodes[child.0].parent = None;
        }
        for child in moved {
            self.append_child(to, child);
        }
    }

    /// Places `order` into the slots currently occupied by element children of
    /// `parent`, leaving interleaved text and comments where they are.
    ///
    /// `order` must be a permutation of `child_elements(parent)`; anything else
    /// leaves the tree untouched and returns `false`.
    pub fn reorder_child_elements(&mut self, parent: NodeId, order: &[NodeId]) -> bool {
        let slots: Vec<usize> = self.nodes[parent.0]
            .children
            .iter()
            .enumerate()
            .filter(|(_, child)| self.element(**child).is_some())
            .map(|(index, _)| index)
            .collect();
        if slots.len() != order.len() {
            return false;
        }
        let mut current: Vec<NodeId> = slots
            .iter()
            .map(|slot| self.nodes[parent.0].children[*slot])
            .collect();
        let mut proposed = order.to_vec();
        current.sort();
        proposed.sort();
        if current != proposed {
            return false;
        }
        for (slot, id) in slots.into_iter().zip(order) {
            self.nodes[parent.0].children[slot] = *id;
        }
        true
    }

    /// Serializes the attached tree.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.bom {
            out.extend_from_slice(BOM.as_bytes());
        }
        self.serialize_node(Self::DOCUMENT_NODE, &mut out);
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut Vec<u8>) {
        match &self.nodes[id.0].kind {
            NodeKind::Document => self.serialize_children(id, out),
            NodeKind::Text(text) => out.extend_from_slice(text.raw.as_bytes()),
            NodeKind::Other(raw) => out.extend_from_slice(raw.as_bytes()),
            NodeKind::Element(element) => {
                out.extend_from_slice(element.start_tag.as_bytes());
                if let Some(end_tag) = &element.end_tag {
                    self.serialize_children(id, out);
                    out.extend_from_slice(end_tag.as_bytes());
                }
            }
        }
    }

    fn serialize_children(&self, id: NodeId, out: &mut Vec<u8>) {
        for child in &self.nodes[id.0].children {
            self.serialize_node(*child, out);
        }
    }
}
