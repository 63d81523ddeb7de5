use std::cmp::Ordering;

use crate::arena::Ref;
use crate::dom_exception::{DomException, ErrorName};
use crate::node::{Node, NodeType};
use crate::ranges::range::Boundaries;
use crate::ranges::validation::{check_node_before_after, is_disallowed_container};
use crate::ranges::{BoundaryPoint, Range};

impl<'arena> Range<'arena> {
    /// The parent and index of a before/after reference node.
    fn placement_of(&self, node: Ref<'arena>) -> Result<(Ref<'arena>, usize), DomException> {
        self.boundaries()?;
        self.check_owner_document(node)?;
        check_node_before_after(node)?;
        let parent = node
            .parent()
            .ok_or(DomException::from(ErrorName::InvalidNodeTypeError))?;
        Ok((parent, node.index()))
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-setStartBefore
    pub fn set_start_before(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        let (parent, index) = self.placement_of(node)?;
        self.set_start(parent, index)
    }

    pub fn set_start_after(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        let (parent, index) = self.placement_of(node)?;
        self.set_start(parent, index + 1)
    }

    pub fn set_end_before(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        let (parent, index) = self.placement_of(node)?;
        self.set_end(parent, index)
    }

    pub fn set_end_after(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        let (parent, index) = self.placement_of(node)?;
        self.set_end(parent, index + 1)
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-selectNode
    pub fn select_node(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        self.boundaries()?;

        // SPEC: INVALID_NODE_TYPE_ERR: Raised if an ancestor of refNode is an Entity, Notation or
        //       DocumentType node or if refNode is a Document, DocumentFragment, Attr, Entity, or
        //       Notation node.
        if node.ancestors().any(|ancestor| is_disallowed_container(ancestor)) {
            return Err(ErrorName::InvalidNodeTypeError.into());
        }
        let (parent, index) = self.placement_of(node)?;

        self.boundaries = Some(Boundaries {
            start: BoundaryPoint::new(parent, index),
            end: BoundaryPoint::new(parent, index + 1),
        });
        Ok(())
    }

    /// Selects the children of `node`, from offset 0 to its child count.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-selectNodeContents
    pub fn select_node_contents(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        self.boundaries()?;
        self.check_owner_document(node)?;

        // SPEC: INVALID_NODE_TYPE_ERR: Raised if refNode or an ancestor of refNode is an Entity,
        //       Notation or DocumentType node.
        if node
            .inclusive_ancestors()
            .any(|ancestor| is_disallowed_container(ancestor))
        {
            return Err(ErrorName::InvalidNodeTypeError.into());
        }

        self.boundaries = Some(Boundaries {
            start: BoundaryPoint::new(node, 0),
            end: BoundaryPoint::new(node, node.child_count()),
        });
        Ok(())
    }

    /// Validates inserting `node` at the start and returns the node that
    /// will receive it as a child.
    fn check_insertion(&self, node: Ref<'arena>) -> Result<Ref<'arena>, DomException> {
        let Boundaries { start, .. } = self.boundaries()?;

        // SPEC: NO_MODIFICATION_ALLOWED_ERR: Raised if an ancestor container of the start of the
        //       Range is read-only.
        if self.contained_by_read_only()? {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        // SPEC: WRONG_DOCUMENT_ERR: Raised if newNode and the container of the start of the Range
        //       were not created from the same document.
        if !Node::are_same(node.owner_document(), start.node.owner_document()) {
            return Err(ErrorName::WrongDocumentError.into());
        }

        // Text gets split on insertion, so the new node goes into its parent.
        let splits = start.node.is_text() || start.node.is_cdata_section();
        let container = match splits {
            true => start
                .node
                .parent()
                .ok_or(DomException::from(ErrorName::HierarchyRequestError))?,
            false => start.node,
        };

        // SPEC: HIERARCHY_REQUEST_ERR: Raised if the container of the start of the Range is of a
        //       type that does not allow children of the type of newNode or if newNode is an
        //       ancestor of the container.
        let allowed = match node.is_document_fragment() {
            true => node
                .children()
                .all(|child| container.child_type_allowed(child.node_type())),
            false => container.child_type_allowed(node.node_type()),
        };
        // Attr, Entity, Notation and Document nodes are never allowed children, so they fail
        // here before INVALID_NODE_TYPE_ERR could apply.
        if !allowed || node.is_inclusive_ancestor_of(start.node) {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        Ok(container)
    }

    /// Inserts `node` at the start of the range, splitting a text start container.
    ///
    /// The end point keeps addressing the same content: it moves into the
    /// split-off text or stays after the child it preceded. Offsets are read
    /// back after insertion, since `node` may already be a child of the
    /// container.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-insertNode
    pub fn insert_node(&mut self, node: Ref<'arena>) -> Result<(), DomException> {
        let container = self.check_insertion(node)?;
        let Boundaries { mut start, mut end } = self.boundaries()?;
        let inserted = match node.is_document_fragment() {
            true => node.child_count(),
            false => 1,
        };
        let first_inserted = match node.is_document_fragment() {
            true => node.first_child(),
            false => Some(node),
        };

        // The child the end sits before, skipping `node` itself if it is about to move.
        let end_in_container = Node::are_same(end.node, container);
        let end_after_start = end.offset > start.offset;
        let end_anchor = match container.child_at(end.offset) {
            Some(child) if Node::are_same(child, node) => child.next_sibling(),
            child => child,
        };
        let offset_before = |anchor: Option<Ref<'arena>>| match anchor {
            Some(anchor) => anchor.index(),
            None => container.child_count(),
        };

        if Node::are_same(container, start.node) {
            let reference = match start.node.child_at(start.offset) {
                Some(child) if Node::are_same(child, node) => child.next_sibling(),
                child => child,
            };
            container.insert_before(node, reference)?;
            if let Some(first) = first_inserted {
                start.offset = first.index();
            }
            if end_in_container {
                end.offset = match end_after_start {
                    true => offset_before(end_anchor),
                    false => start.offset,
                };
            }
        } else {
            let text_index = start.node.index();
            let right = start.node.split_text(start.offset)?;
            container.insert_before(node, Some(right))?;
            if Node::are_same(end.node, start.node) && end_after_start {
                end = BoundaryPoint::new(right, end.offset - start.offset);
            } else if end_in_container && end.offset > text_index {
                end.offset = offset_before(end_anchor);
            }
        }

        // `node` may have been moved out from under the end point.
        if !Node::have_same_root(start.node, end.node) || start.compare(&end) == Ordering::Greater {
            end = start;
        }

        log::trace!("inserted {} node(s) at {start:?}", inserted);
        self.boundaries = Some(Boundaries { start, end });
        Ok(())
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-surround
    pub fn surround_contents(&mut self, new_parent: Ref<'arena>) -> Result<(), DomException> {
        let Boundaries { start, end } = self.boundaries()?;

        // SPEC: INVALID_NODE_TYPE_ERR: Raised if node is an Attr, Entity, DocumentType, Notation,
        //       Document, or DocumentFragment node.
        if matches!(
            new_parent.node_type(),
            NodeType::Attribute
                | NodeType::Entity
                | NodeType::DocumentType
                | NodeType::Notation
                | NodeType::Document
                | NodeType::DocumentFragment
        ) {
            return Err(ErrorName::InvalidNodeTypeError.into());
        }

        // Everything `insert_node` checks, against the container that will actually receive
        // `new_parent`.
        self.check_insertion(new_parent)?;

        // SPEC: BAD_BOUNDARYPOINTS_ERR: Raised if the Range partially selects a non-text node.
        let partially_selects = |point: BoundaryPoint| {
            !point.node.offset_in_characters()
                && point.offset > 0
                && point.offset < point.node.child_count()
        };
        if partially_selects(start) || partially_selects(end) {
            return Err(ErrorName::BadBoundaryPointsError.into());
        }

        self.check_delete_extract(true)?;
        if new_parent.is_read_only() {
            return Err(ErrorName::NoModificationAllowedError.into());
        }

        while let Some(child) = new_parent.first_child() {
            new_parent.remove_child(child)?;
        }
        let fragment = self.extract_contents()?;
        self.insert_node(new_parent)?;
        if let Some(fragment) = fragment {
            new_parent.append_child(fragment)?;
        }
        self.select_node(new_parent)
    }
}
