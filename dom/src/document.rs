use std::cell::RefCell;

use crate::arena::{Arena, Ref};
use crate::node::{CharacterDataVariant, Node, NodeData};
use crate::ranges::Range;
use crate::QualifiedName;

// Factory methods. Every node created through these belongs to the document
// that `self` belongs to.
impl<'arena> Node<'arena> {
    pub fn new_document(arena: Arena<'arena>) -> Ref<'arena> {
        arena.alloc(Node::new(arena, None, NodeData::Document))
    }

    fn create_node(&'arena self, data: NodeData) -> Ref<'arena> {
        self.arena
            .alloc(Node::new(self.arena, Some(self.owner_document()), data))
    }

    // SPECLINK: https://dom.spec.whatwg.org/#dom-document-createelement
    pub fn create_element(&'arena self, local_name: &str) -> Ref<'arena> {
        self.create_node(NodeData::Element {
            name: QualifiedName::new(None, local_name.to_ascii_lowercase()),
            attributes: RefCell::new(vec![]),
        })
    }

    pub fn create_document_fragment(&'arena self) -> Ref<'arena> {
        self.create_node(NodeData::DocumentFragment)
    }

    pub fn create_text_node(&'arena self, data: &str) -> Ref<'arena> {
        self.create_character_data(data, CharacterDataVariant::Text)
    }

    pub fn create_cdata_section(&'arena self, data: &str) -> Ref<'arena> {
        self.create_character_data(data, CharacterDataVariant::CDataSection)
    }

    pub fn create_comment(&'arena self, data: &str) -> Ref<'arena> {
        self.create_character_data(data, CharacterDataVariant::Comment)
    }

    pub fn create_processing_instruction(&'arena self, target: &str, data: &str) -> Ref<'arena> {
        self.create_character_data(
            data,
            CharacterDataVariant::ProcessingInstruction {
                target: target.to_string(),
            },
        )
    }

    pub fn create_doctype(
        &'arena self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> Ref<'arena> {
        self.create_node(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    pub fn create_attribute(&'arena self, local_name: &str) -> Ref<'arena> {
        self.create_node(NodeData::Attr {
            name: local_name.to_string(),
        })
    }

    pub fn create_entity(&'arena self, name: &str) -> Ref<'arena> {
        self.create_node(NodeData::Entity {
            name: name.to_string(),
        })
    }

    pub fn create_notation(&'arena self, name: &str) -> Ref<'arena> {
        self.create_node(NodeData::Notation {
            name: name.to_string(),
        })
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-DocumentRange-method-createRange
    pub fn create_range(&'arena self) -> Range<'arena> {
        Range::new(self.owner_document())
    }

    fn create_character_data(&'arena self, data: &str, variant: CharacterDataVariant) -> Ref<'arena> {
        self.create_node(NodeData::CharacterData {
            data: RefCell::new(data.to_string()),
            variant,
        })
    }
}
