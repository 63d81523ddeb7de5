use crate::arena::Ref;
use crate::dom_exception::{DomException, ErrorName};
use crate::node::{CharacterDataVariant, Node, NodeData, NodeType};

impl<'arena> Node<'arena> {
    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity
    pub fn ensure_pre_insertion_validity(
        &'arena self,
        node: Ref<'arena>,
        child: Option<Ref<'arena>>,
    ) -> Result<(), DomException> {
        if self.is_read_only() {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        // Moving a node out of a read-only parent is a modification of that parent too.
        if node.parent().is_some_and(|parent| parent.is_read_only()) {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        if !Node::are_same(node.owner_document(), self.owner_document()) {
            return Err(ErrorName::WrongDocumentError.into());
        }

        // SPEC: 2. If node is a host-including inclusive ancestor of parent, then throw a "HierarchyRequestError" DOMException.
        if node.is_inclusive_ancestor_of(self) {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // SPEC: 3. If child is non-null and its parent is not parent, then throw a "NotFoundError" DOMException.
        if let Some(child) = child {
            if !Node::are_same_optional(child.parent(), Some(self)) {
                return Err(ErrorName::NotFoundError.into());
            }
        }

        // SPEC: 4. If node is not a DocumentFragment, DocumentType, Element, or CharacterData node, then throw a "HierarchyRequestError" DOMException.
        let inserted_types: Vec<NodeType> = if node.is_document_fragment() {
            node.children().map(|child| child.node_type()).collect()
        } else {
            vec![node.node_type()]
        };
        if inserted_types
            .iter()
            .any(|kind| !self.child_type_allowed(*kind))
        {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // SPEC: 6. If parent is a document, and any of the statements below, switched on the interface node implements, are true, then throw a "HierarchyRequestError" DOMException.
        if self.is_document() {
            let element_count = inserted_types
                .iter()
                .filter(|kind| **kind == NodeType::Element)
                .count();
            let has_element_child = self
                .children()
                .any(|existing| existing.is_element() && !Node::are_same(existing, node));
            if element_count > 1 || (element_count == 1 && has_element_child) {
                return Err(ErrorName::HierarchyRequestError.into());
            }

            let has_doctype_child = self
                .children()
                .any(|existing| existing.is_doctype() && !Node::are_same(existing, node));
            if node.is_doctype() && has_doctype_child {
                return Err(ErrorName::HierarchyRequestError.into());
            }
        }

        Ok(())
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-pre-insert
    pub fn insert_before(
        &'arena self,
        node: Ref<'arena>,
        child: Option<Ref<'arena>>,
    ) -> Result<Ref<'arena>, DomException> {
        // SPEC: 1. Ensure pre-insertion validity of node into parent before child.
        self.ensure_pre_insertion_validity(node, child)?;

        // SPEC: 2. Let referenceChild be child.
        let mut reference_child = child;
        // SPEC: 3. If referenceChild is node, then set referenceChild to node’s next sibling.
        if Node::are_same_optional(reference_child, Some(node)) {
            reference_child = node.next_sibling();
        }

        // SPEC: 4. Insert node into parent before referenceChild.
        let nodes: Vec<Ref<'arena>> = if node.is_document_fragment() {
            node.children().collect()
        } else {
            vec![node]
        };
        for node in nodes {
            node.unlink();
            self.link_before(node, reference_child);
        }

        // SPEC: 5. Return node.
        Ok(node)
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-append
    pub fn append_child(&'arena self, node: Ref<'arena>) -> Result<Ref<'arena>, DomException> {
        self.insert_before(node, None)
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-pre-remove
    pub fn remove_child(&'arena self, child: Ref<'arena>) -> Result<Ref<'arena>, DomException> {
        if self.is_read_only() {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        // SPEC: 1. If child’s parent is not parent, then throw a "NotFoundError" DOMException.
        if !Node::are_same_optional(child.parent(), Some(self)) {
            return Err(ErrorName::NotFoundError.into());
        }

        // SPEC: 2. Remove child.
        child.unlink();

        // SPEC: 3. Return child.
        Ok(child)
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-clone
    pub fn clone_node(&'arena self, deep: bool) -> Ref<'arena> {
        let copy = self
            .arena
            .alloc(Node::new(self.arena, self.document.get(), self.data.clone()));
        if deep {
            for child in self.children() {
                copy.link_before(child.clone_node(true), None);
            }
        }
        copy
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-node-equals
    pub fn is_equal_node(&self, other: &Node<'arena>) -> bool {
        if self.data != other.data || self.child_count() != other.child_count() {
            return false;
        }
        self.children()
            .zip(other.children())
            .all(|(a, b)| a.is_equal_node(b))
    }

    fn link_before(&'arena self, node: Ref<'arena>, child: Option<Ref<'arena>>) {
        node.parent.set(Some(self));
        match child {
            Some(child) => {
                let previous = child.previous_sibling.get();
                node.previous_sibling.set(previous);
                node.next_sibling.set(Some(child));
                child.previous_sibling.set(Some(node));
                match previous {
                    Some(previous) => previous.next_sibling.set(Some(node)),
                    None => self.first_child.set(Some(node)),
                }
            }
            None => {
                let last = self.last_child.get();
                node.previous_sibling.set(last);
                node.next_sibling.set(None);
                match last {
                    Some(last) => last.next_sibling.set(Some(node)),
                    None => self.first_child.set(Some(node)),
                }
                self.last_child.set(Some(node));
            }
        }
    }

    fn unlink(&self) {
        let Some(parent) = self.parent.get() else {
            return;
        };
        let previous = self.previous_sibling.get();
        let next = self.next_sibling.get();
        match previous {
            Some(previous) => previous.next_sibling.set(next),
            None => parent.first_child.set(next),
        }
        match next {
            Some(next) => next.previous_sibling.set(previous),
            None => parent.last_child.set(previous),
        }
        self.parent.set(None);
        self.previous_sibling.set(None);
        self.next_sibling.set(None);
    }
}

// Character data. Offsets and counts are in UTF-16 code units.
impl<'arena> Node<'arena> {
    pub fn data(&self) -> Option<String> {
        match &self.data {
            NodeData::CharacterData { data, .. } => Some(data.borrow().clone()),
            _ => None,
        }
    }

    pub fn set_data(&self, value: &str) -> Result<(), DomException> {
        self.replace_character_data(|_| value.encode_utf16().collect())
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-cd-substring
    pub fn substring_data(&self, offset: usize, count: usize) -> Result<String, DomException> {
        let units = self.code_units();
        // SPEC: 2. If offset is greater than length, then throw an "IndexSizeError" DOMException.
        if offset > units.len() {
            return Err(ErrorName::IndexSizeError.into());
        }
        let end = offset.saturating_add(count).min(units.len());
        Ok(String::from_utf16_lossy(&units[offset..end]))
    }

    pub fn append_data(&self, value: &str) -> Result<(), DomException> {
        self.replace_character_data(|mut units| {
            units.extend(value.encode_utf16());
            units
        })
    }

    // SPECLINK: https://dom.spec.whatwg.org/#dom-characterdata-deletedata
    pub fn delete_data(&self, offset: usize, count: usize) -> Result<(), DomException> {
        if offset > self.code_units().len() {
            return Err(ErrorName::IndexSizeError.into());
        }
        self.replace_character_data(|mut units| {
            let end = offset.saturating_add(count).min(units.len());
            units.drain(offset..end);
            units
        })
    }

    // SPECLINK: https://dom.spec.whatwg.org/#concept-text-split
    pub fn split_text(&'arena self, offset: usize) -> Result<Ref<'arena>, DomException> {
        let NodeData::CharacterData { variant, .. } = &self.data else {
            return Err(ErrorName::HierarchyRequestError.into());
        };
        if !matches!(
            variant,
            CharacterDataVariant::Text | CharacterDataVariant::CDataSection
        ) {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // SPEC: 1. Let length be node’s length.
        let units = self.code_units();
        // SPEC: 2. If offset is greater than length, then throw an "IndexSizeError" DOMException.
        if offset > units.len() {
            return Err(ErrorName::IndexSizeError.into());
        }
        // The new node is linked into the parent, so a read-only parent is modified too.
        if self.is_read_only() || self.parent().is_some_and(|parent| parent.is_read_only()) {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        // SPEC: 4. Let new data be the result of substringing data with node node, offset offset, and count count.
        // SPEC: 5. Let new node be a new Text node, with the same node document as node. Set new node’s data to new data.
        let new_node = self.arena.alloc(Node::new(
            self.arena,
            Some(self.owner_document()),
            NodeData::CharacterData {
                data: String::from_utf16_lossy(&units[offset..]).into(),
                variant: variant.clone(),
            },
        ));

        // SPEC: 7. If parent is not null, then insert new node into parent before node’s next sibling.
        if let Some(parent) = self.parent() {
            parent.link_before(new_node, self.next_sibling());
        }

        // SPEC: 8. Replace data with node node, offset offset, count count, and data the empty string.
        self.delete_data(offset, units.len() - offset)?;

        // SPEC: 9. Return new node.
        Ok(new_node)
    }

    fn code_units(&self) -> Vec<u16> {
        match &self.data {
            NodeData::CharacterData { data, .. } => data.borrow().encode_utf16().collect(),
            _ => Vec::new(),
        }
    }

    fn replace_character_data(
        &self,
        edit: impl FnOnce(Vec<u16>) -> Vec<u16>,
    ) -> Result<(), DomException> {
        let NodeData::CharacterData { data, .. } = &self.data else {
            return Err(ErrorName::InvalidNodeTypeError.into());
        };
        if self.is_read_only() {
            return Err(ErrorName::NoModificationAllowedError.into());
        }
        let units = edit(data.borrow().encode_utf16().collect());
        *data.borrow_mut() = String::from_utf16_lossy(&units);
        Ok(())
    }
}
