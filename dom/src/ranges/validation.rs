use crate::arena::Ref;
use crate::dom_exception::{DomException, ErrorName};
use crate::node::{Node, NodeType};
use crate::ranges::Range;

/// Node kinds that can never contain a boundary point.
pub(crate) fn is_disallowed_container(node: &Node) -> bool {
    matches!(
        node.node_type(),
        NodeType::Entity | NodeType::Notation | NodeType::DocumentType
    )
}

/// Validates `(node, offset)` as a boundary point.
pub(crate) fn check_node_with_offset(node: Ref, offset: usize) -> Result<(), DomException> {
    if is_disallowed_container(node) {
        return Err(ErrorName::InvalidNodeTypeError.into());
    }
    if offset > node.length() {
        return Err(ErrorName::IndexSizeError.into());
    }
    Ok(())
}

/// Validates `node` as the reference of a before/after placement.
// SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-setStartBefore
pub(crate) fn check_node_before_after(node: Ref) -> Result<(), DomException> {
    // SPEC: INVALID_NODE_TYPE_ERR: Raised if the root container of refNode is not an Attr,
    //       Document or DocumentFragment node
    if !matches!(
        node.root().node_type(),
        NodeType::Attribute | NodeType::Document | NodeType::DocumentFragment
    ) {
        return Err(ErrorName::InvalidNodeTypeError.into());
    }

    // SPEC: or if refNode is a Document, DocumentFragment, Attr, Entity, or Notation node.
    if matches!(
        node.node_type(),
        NodeType::Document
            | NodeType::DocumentFragment
            | NodeType::Attribute
            | NodeType::Entity
            | NodeType::Notation
    ) {
        return Err(ErrorName::InvalidNodeTypeError.into());
    }

    Ok(())
}

impl<'arena> Range<'arena> {
    pub(crate) fn check_owner_document(&self, node: Ref<'arena>) -> Result<(), DomException> {
        if !Node::are_same(node.owner_document(), self.owner_document()) {
            return Err(ErrorName::WrongDocumentError.into());
        }
        Ok(())
    }

    /// Whether an inclusive ancestor of either boundary container is read-only.
    pub(crate) fn contained_by_read_only(&self) -> Result<bool, DomException> {
        let start = self.start_container()?;
        let end = self.end_container()?;
        Ok(start
            .inclusive_ancestors()
            .chain(end.inclusive_ancestors())
            .any(|node| node.is_read_only()))
    }

    /// Rejects content operations over read-only nodes or document types.
    ///
    /// `clone_contents` does not modify the tree, so it only runs the
    /// document-type scan.
    pub(crate) fn check_delete_extract(&self, modifies: bool) -> Result<(), DomException> {
        let past_end = self.past_end_node()?;
        let mut current = self.start_node()?;
        while let Some(node) = current {
            if Node::are_same_optional(Some(node), past_end) {
                break;
            }
            if modifies && node.is_read_only() {
                return Err(ErrorName::NoModificationAllowedError.into());
            }
            if node.is_doctype() {
                return Err(ErrorName::HierarchyRequestError.into());
            }
            current = node.traverse_next_node(None);
        }

        if modifies && self.contained_by_read_only()? {
            return Err(ErrorName::NoModificationAllowedError.into());
        }
        Ok(())
    }
}
