use std::cell::{Cell, RefCell};

use crate::arena::{Arena, Link, Ref};
use crate::{Attribute, QualifiedName};

/// A DOM Node, allocated in (and living as long as) its document's arena.
pub struct Node<'arena> {
    pub(crate) arena: Arena<'arena>,
    pub(crate) document: Link<'arena>,
    pub(crate) parent: Link<'arena>,
    pub(crate) previous_sibling: Link<'arena>,
    pub(crate) next_sibling: Link<'arena>,
    pub(crate) first_child: Link<'arena>,
    pub(crate) last_child: Link<'arena>,
    read_only: Cell<bool>,
    pub data: NodeData,
}

// Nodes are compared by identity. Use `is_equal_node` for structural equality.
impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Node<'_> {}

impl<'arena> Node<'arena> {
    pub(crate) fn new(arena: Arena<'arena>, document: Option<Ref<'arena>>, data: NodeData) -> Self {
        Node {
            arena,
            document: Cell::new(document),
            parent: Cell::new(None),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            read_only: Cell::new(false),
            data,
        }
    }

    pub fn are_same(a: Ref<'arena>, b: Ref<'arena>) -> bool {
        std::ptr::eq(a, b)
    }

    pub fn are_same_optional(a: Option<Ref<'arena>>, b: Option<Ref<'arena>>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Node::are_same(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn have_same_root(a: Ref<'arena>, b: Ref<'arena>) -> bool {
        Node::are_same(a.root(), b.root())
    }

    pub fn arena(&self) -> Arena<'arena> {
        self.arena
    }

    pub fn node_type(&self) -> NodeType {
        match &self.data {
            NodeData::Document => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Element { .. } => NodeType::Element,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::CharacterData { variant, .. } => match variant {
                CharacterDataVariant::Text => NodeType::Text,
                CharacterDataVariant::CDataSection => NodeType::CDataSection,
                CharacterDataVariant::Comment => NodeType::Comment,
                CharacterDataVariant::ProcessingInstruction { .. } => {
                    NodeType::ProcessingInstruction
                }
            },
            NodeData::Attr { .. } => NodeType::Attribute,
            NodeData::Entity { .. } => NodeType::Entity,
            NodeData::Notation { .. } => NodeType::Notation,
        }
    }

    pub fn node_name(&self) -> String {
        match &self.data {
            NodeData::Document => "#document".to_string(),
            NodeData::DocumentFragment => "#document-fragment".to_string(),
            NodeData::Element { name, .. } => name.local.clone(),
            NodeData::Doctype { name, .. } => name.clone(),
            NodeData::CharacterData { variant, .. } => match variant {
                CharacterDataVariant::Text => "#text".to_string(),
                CharacterDataVariant::CDataSection => "#cdata-section".to_string(),
                CharacterDataVariant::Comment => "#comment".to_string(),
                CharacterDataVariant::ProcessingInstruction { target } => target.clone(),
            },
            NodeData::Attr { name } | NodeData::Entity { name } | NodeData::Notation { name } => {
                name.clone()
            }
        }
    }

    /// The document this node was created by. A document is its own owner.
    pub fn owner_document(&'arena self) -> Ref<'arena> {
        match self.document.get() {
            Some(document) => document,
            None => self,
        }
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-tree-root
    pub fn root(&'arena self) -> Ref<'arena> {
        // SPEC: The root of an object is itself, if its parent is null,
        //       or else it is the root of its parent.
        let mut root = self;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    pub fn parent(&self) -> Option<Ref<'arena>> {
        self.parent.get()
    }

    pub fn previous_sibling(&self) -> Option<Ref<'arena>> {
        self.previous_sibling.get()
    }

    pub fn next_sibling(&self) -> Option<Ref<'arena>> {
        self.next_sibling.get()
    }

    pub fn first_child(&self) -> Option<Ref<'arena>> {
        self.first_child.get()
    }

    pub fn last_child(&self) -> Option<Ref<'arena>> {
        self.last_child.get()
    }

    pub fn has_child_nodes(&self) -> bool {
        self.first_child().is_some()
    }

    pub fn children(&self) -> impl Iterator<Item = Ref<'arena>> {
        std::iter::successors(self.first_child(), |node| node.next_sibling())
    }

    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    pub fn child_at(&self, index: usize) -> Option<Ref<'arena>> {
        self.children().nth(index)
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-tree-index
    pub fn index(&self) -> usize {
        std::iter::successors(self.previous_sibling(), |node| node.previous_sibling()).count()
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-tree-inclusive-ancestor
    pub fn inclusive_ancestors(&'arena self) -> impl Iterator<Item = Ref<'arena>> {
        std::iter::successors(Some(self), |node| node.parent())
    }

    pub fn ancestors(&self) -> impl Iterator<Item = Ref<'arena>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn is_inclusive_ancestor_of(&'arena self, other: Ref<'arena>) -> bool {
        other
            .inclusive_ancestors()
            .any(|ancestor| Node::are_same(ancestor, self))
    }

    pub fn is_ancestor_of(&'arena self, other: Ref<'arena>) -> bool {
        other.ancestors().any(|ancestor| Node::are_same(ancestor, self))
    }

    pub fn document_element(&'arena self) -> Option<Ref<'arena>> {
        self.owner_document().children().find(|child| child.is_element())
    }

    /// The node following this one in tree order, optionally without leaving `stay_within`.
    pub fn traverse_next_node(&'arena self, stay_within: Option<Ref<'arena>>) -> Option<Ref<'arena>> {
        if let Some(first_child) = self.first_child() {
            return Some(first_child);
        }
        self.traverse_next_sibling(stay_within)
    }

    /// Like `traverse_next_node`, but skips this node's descendants.
    pub fn traverse_next_sibling(
        &'arena self,
        stay_within: Option<Ref<'arena>>,
    ) -> Option<Ref<'arena>> {
        let mut current = self;
        loop {
            if Node::are_same_optional(Some(current), stay_within) {
                return None;
            }
            if let Some(next_sibling) = current.next_sibling() {
                return Some(next_sibling);
            }
            current = current.parent()?;
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    pub fn is_document_fragment(&self) -> bool {
        matches!(self.data, NodeData::DocumentFragment)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn is_html_element(&self) -> bool {
        self.is_element()
    }

    pub fn is_doctype(&self) -> bool {
        matches!(self.data, NodeData::Doctype { .. })
    }

    pub fn is_attr(&self) -> bool {
        matches!(self.data, NodeData::Attr { .. })
    }

    pub fn is_entity(&self) -> bool {
        matches!(self.data, NodeData::Entity { .. })
    }

    pub fn is_notation(&self) -> bool {
        matches!(self.data, NodeData::Notation { .. })
    }

    pub fn is_character_data(&self) -> bool {
        matches!(self.data, NodeData::CharacterData { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::Text,
                ..
            }
        )
    }

    pub fn is_cdata_section(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::CDataSection,
                ..
            }
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::Comment,
                ..
            }
        )
    }

    pub fn is_processing_instruction(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::ProcessingInstruction { .. },
                ..
            }
        )
    }

    /// Whether offsets into this node count UTF-16 code units rather than children.
    pub fn offset_in_characters(&self) -> bool {
        self.is_character_data()
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-length
    pub fn length(&self) -> usize {
        match &self.data {
            NodeData::CharacterData { data, .. } => data.borrow().encode_utf16().count(),
            _ => self.child_count(),
        }
    }

    pub fn element_tag_name(&self) -> Option<&str> {
        if let NodeData::Element { name, .. } = &self.data {
            return Some(&name.local);
        }
        None
    }

    pub fn is_element_with_tag(&self, tag: &str) -> bool {
        self.element_tag_name() == Some(tag)
    }

    pub fn is_element_with_one_of_tags(&self, tags: &[&str]) -> bool {
        if let Some(name) = self.element_tag_name() {
            return tags.contains(&name);
        }
        false
    }

    pub fn is_block_element(&self) -> bool {
        self.is_element_with_one_of_tags(&[
            "address",
            "article",
            "aside",
            "blockquote",
            "body",
            "center",
            "dd",
            "details",
            "dialog",
            "dir",
            "div",
            "dl",
            "dt",
            "fieldset",
            "figcaption",
            "figure",
            "footer",
            "form",
            "h1",
            "h2",
            "h3",
            "h4",
            "h5",
            "h6",
            "header",
            "hgroup",
            "hr",
            "html",
            "li",
            "listing",
            "main",
            "menu",
            "nav",
            "ol",
            "p",
            "plaintext",
            "pre",
            "section",
            "summary",
            "table",
            "tbody",
            "td",
            "tfoot",
            "th",
            "thead",
            "tr",
            "ul",
            "xmp",
        ])
    }

    /// Elements whose contents never produce rendered text.
    pub fn is_non_rendered_element(&self) -> bool {
        self.is_element_with_one_of_tags(&["head", "script", "style", "template", "title"])
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Core/core.html#ID-1590626202
    pub fn child_type_allowed(&self, kind: NodeType) -> bool {
        match self.node_type() {
            NodeType::Document => matches!(
                kind,
                NodeType::Element
                    | NodeType::ProcessingInstruction
                    | NodeType::Comment
                    | NodeType::DocumentType
            ),
            NodeType::DocumentFragment
            | NodeType::Element
            | NodeType::Entity
            | NodeType::EntityReference => matches!(
                kind,
                NodeType::Element
                    | NodeType::ProcessingInstruction
                    | NodeType::Comment
                    | NodeType::Text
                    | NodeType::CDataSection
                    | NodeType::EntityReference
            ),
            NodeType::Attribute => matches!(kind, NodeType::Text | NodeType::EntityReference),
            _ => false,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn get_attribute(&self, local_name: &str) -> Option<String> {
        let NodeData::Element { attributes, .. } = &self.data else {
            return None;
        };
        attributes
            .borrow()
            .iter()
            .find(|attribute| attribute.name.local == local_name)
            .map(|attribute| attribute.value.clone())
    }

    pub fn set_attribute(&self, local_name: &str, value: &str) {
        let NodeData::Element { attributes, .. } = &self.data else {
            return;
        };
        let mut attributes = attributes.borrow_mut();
        match attributes
            .iter_mut()
            .find(|attribute| attribute.name.local == local_name)
        {
            Some(attribute) => attribute.value = value.to_string(),
            None => attributes.push(Attribute {
                name: QualifiedName::new(None, local_name.to_string()),
                value: value.to_string(),
            }),
        }
    }

    // SPECLINK: https://html.spec.whatwg.org/multipage/interaction.html#attr-contenteditable
    pub fn is_content_editable(&'arena self) -> bool {
        for node in self.inclusive_ancestors() {
            match node.get_attribute("contenteditable").as_deref() {
                Some("" | "true" | "plaintext-only") => return true,
                Some("false") => return false,
                _ => {}
            }
        }
        false
    }

    /// The highest editable element in the run of editable ancestors containing this node.
    pub fn root_editable_element(&'arena self) -> Option<Ref<'arena>> {
        let mut root = None;
        for node in self.inclusive_ancestors() {
            if !node.is_content_editable() {
                break;
            }
            if node.is_element() {
                root = Some(node);
            }
        }
        root
    }

    pub fn enclosing_block_flow_element(&'arena self) -> Option<Ref<'arena>> {
        self.inclusive_ancestors().find(|node| node.is_block_element())
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_document() {
            return write!(f, "Document {{ ... }}");
        }

        f.debug_struct("Node")
            .field("data", &self.data)
            .field(
                "children",
                &self
                    .children()
                    .map(|child| child.data.to_string())
                    .collect::<Vec<_>>(),
            )
            .field(
                "previous_sibling",
                &self.previous_sibling().map(|v| v.data.to_string()),
            )
            .field("next_sibling", &self.next_sibling().map(|v| v.data.to_string()))
            .field("parent", &self.parent().map(|v| v.data.to_string()))
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum NodeData {
    Document,
    DocumentFragment,
    Element {
        name: QualifiedName,
        attributes: RefCell<Vec<Attribute>>,
    },
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    CharacterData {
        data: RefCell<String>,
        variant: CharacterDataVariant,
    },
    Attr {
        name: String,
    },
    Entity {
        name: String,
    },
    Notation {
        name: String,
    },
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum CharacterDataVariant {
    Text,
    CDataSection,
    ProcessingInstruction { target: String },
    Comment,
}

// SPECLINK: https://www.w3.org/TR/DOM-Level-2-Core/core.html#ID-1950641247
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CDataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl std::fmt::Display for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeData::Document => write!(f, "Document"),
            NodeData::DocumentFragment => write!(f, "DocumentFragment"),
            NodeData::Doctype { name, .. } => write!(f, "DOCTYPE {name}"),
            NodeData::Element { name, .. } => write!(f, "Element({})", name.local),
            NodeData::CharacterData { variant, .. } => match variant {
                CharacterDataVariant::Text => write!(f, "Text"),
                CharacterDataVariant::CDataSection => write!(f, "CDATASection"),
                CharacterDataVariant::ProcessingInstruction { .. } => {
                    write!(f, "ProcessingInstruction")
                }
                CharacterDataVariant::Comment => write!(f, "Comment"),
            },
            NodeData::Attr { name } => write!(f, "Attr({name})"),
            NodeData::Entity { name } => write!(f, "Entity({name})"),
            NodeData::Notation { name } => write!(f, "Notation({name})"),
        }
    }
}
