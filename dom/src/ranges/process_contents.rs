use crate::arena::Ref;
use crate::dom_exception::DomException;
use crate::node::Node;
use crate::ranges::range::Boundaries;
use crate::ranges::{BoundaryPoint, Range};

/// What `process_contents` does with the selected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAction {
    /// Remove the content from the tree.
    Delete,
    /// Move the content into a new fragment.
    Extract,
    /// Copy the content into a new fragment.
    Clone,
}

impl ContentAction {
    fn produces_fragment(self) -> bool {
        !matches!(self, ContentAction::Delete)
    }

    fn modifies_tree(self) -> bool {
        !matches!(self, ContentAction::Clone)
    }

    /// Applies the action to one selected `node` whose live parent is `from`.
    /// Extracted and cloned nodes are appended to `into`, or prepended when
    /// `prepend` is set.
    fn carry<'arena>(
        self,
        node: Ref<'arena>,
        from: Ref<'arena>,
        into: Option<Ref<'arena>>,
        prepend: bool,
    ) -> Result<(), DomException> {
        let node = match (self, into) {
            (ContentAction::Delete, _) => {
                from.remove_child(node)?;
                return Ok(());
            }
            (_, None) => return Ok(()),
            (ContentAction::Extract, Some(_)) => node,
            (ContentAction::Clone, Some(_)) => node.clone_node(true),
        };
        if let Some(into) = into {
            let before = if prepend { into.first_child() } else { None };
            into.insert_before(node, before)?;
        }
        Ok(())
    }
}

/// The highest inclusive ancestor of `node` strictly below `root`, if `node` is not `root`.
fn partial_ancestor<'arena>(node: Ref<'arena>, root: Ref<'arena>) -> Option<Ref<'arena>> {
    if Node::are_same(node, root) {
        return None;
    }
    node.inclusive_ancestors()
        .find(|ancestor| Node::are_same_optional(ancestor.parent(), Some(root)))
}

impl<'arena> Range<'arena> {
    /// Deletes or extracts the selected content, then collapses the range
    /// where the content used to be.
    ///
    /// Callers validate first (see `check_delete_extract`). Returns the new
    /// fragment for `Extract`, and `None` for `Delete` or when the range is
    /// collapsed.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level-2-Range-Deleting-Content
    pub(crate) fn process_contents(
        &mut self,
        action: ContentAction,
    ) -> Result<Option<Ref<'arena>>, DomException> {
        let (fragment, collapse_point) = self.traverse_contents(action)?;
        if action.modifies_tree() {
            if let Some(point) = collapse_point {
                self.collapse_to(point);
            }
        }
        Ok(fragment)
    }

    /// Copies the selected content into a new fragment without touching the tree.
    pub(crate) fn copy_contents(&self) -> Result<Option<Ref<'arena>>, DomException> {
        let (fragment, _) = self.traverse_contents(ContentAction::Clone)?;
        Ok(fragment)
    }

    /// Walks the selected content applying `action`. Returns the fragment, if
    /// the action produces one, and the point a modifying action collapses to.
    fn traverse_contents(
        &self,
        action: ContentAction,
    ) -> Result<(Option<Ref<'arena>>, Option<BoundaryPoint<'arena>>), DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        if start == end {
            return Ok((None, None));
        }

        log::trace!("{action:?} contents {self:?}");

        let common_root = self.common_ancestor_container()?;
        let partial_start = partial_ancestor(start.node, common_root);
        let partial_end = partial_ancestor(end.node, common_root);

        let fragment = action
            .produces_fragment()
            .then(|| self.owner_document().create_document_fragment());

        // Both points share a container: everything from the start offset up
        // to the end offset.
        if Node::are_same(start.node, end.node) {
            let container = start.node;
            if container.offset_in_characters() {
                if let Some(fragment) = fragment {
                    let copy = container.clone_node(true);
                    copy.delete_data(end.offset, copy.length().saturating_sub(end.offset))?;
                    copy.delete_data(0, start.offset)?;
                    fragment.append_child(copy)?;
                }
                if action.modifies_tree() {
                    container.delete_data(start.offset, end.offset - start.offset)?;
                }
            } else {
                let selected: Vec<_> = container
                    .children()
                    .skip(start.offset)
                    .take(end.offset - start.offset)
                    .collect();
                for child in selected {
                    action.carry(child, container, fragment, false)?;
                }
            }

            return Ok((fragment, Some(start)));
        }

        // The containers differ. Everything after the start up to a child of
        // the common ancestor goes into `left_contents`, everything before the
        // end into `right_contents`, and the common ancestor's children in
        // between are handled directly.
        let mut left_contents = None;
        if !Node::are_same(start.node, common_root) {
            let container = start.node;
            if container.offset_in_characters() {
                if action.produces_fragment() {
                    let copy = container.clone_node(true);
                    copy.delete_data(0, start.offset)?;
                    left_contents = Some(copy);
                }
                if action.modifies_tree() {
                    container.delete_data(
                        start.offset,
                        container.length().saturating_sub(start.offset),
                    )?;
                }
            } else {
                left_contents = action.produces_fragment().then(|| container.clone_node(false));
                let following: Vec<_> = container.children().skip(start.offset).collect();
                for child in following {
                    action.carry(child, container, left_contents, false)?;
                }
            }

            let mut sibling = container.next_sibling();
            let mut left_parent = container.parent();
            while let Some(parent) = left_parent.filter(|parent| !Node::are_same(*parent, common_root)) {
                if let Some(contents) = left_contents {
                    let frame = parent.clone_node(false);
                    frame.append_child(contents)?;
                    left_contents = Some(frame);
                }
                while let Some(node) = sibling {
                    sibling = node.next_sibling();
                    action.carry(node, parent, left_contents, false)?;
                }
                sibling = parent.next_sibling();
                left_parent = parent.parent();
            }
        }

        let mut right_contents = None;
        if !Node::are_same(end.node, common_root) {
            let container = end.node;
            if container.offset_in_characters() {
                if action.produces_fragment() {
                    let copy = container.clone_node(true);
                    copy.delete_data(end.offset, copy.length().saturating_sub(end.offset))?;
                    right_contents = Some(copy);
                }
                if action.modifies_tree() {
                    container.delete_data(0, end.offset)?;
                }
            } else {
                right_contents = action.produces_fragment().then(|| container.clone_node(false));
                let preceding: Vec<_> = container.children().take(end.offset).collect();
                for child in preceding.into_iter().rev() {
                    action.carry(child, container, right_contents, true)?;
                }
            }

            let mut sibling = container.previous_sibling();
            let mut right_parent = container.parent();
            while let Some(parent) = right_parent.filter(|parent| !Node::are_same(*parent, common_root)) {
                if let Some(contents) = right_contents {
                    let frame = parent.clone_node(false);
                    frame.append_child(contents)?;
                    right_contents = Some(frame);
                }
                while let Some(node) = sibling {
                    sibling = node.previous_sibling();
                    action.carry(node, parent, right_contents, true)?;
                }
                sibling = parent.previous_sibling();
                right_parent = parent.parent();
            }
        }

        // Children of the common ancestor lying wholly inside the range.
        let process_start = match partial_start {
            Some(partial_start) => partial_start.next_sibling(),
            None => common_root.child_at(start.offset),
        };
        let process_end = match partial_end {
            Some(partial_end) => Some(partial_end),
            None => common_root.child_at(end.offset),
        };

        if let (Some(fragment), Some(left_contents)) = (fragment, left_contents) {
            fragment.append_child(left_contents)?;
        }

        let mut current = process_start;
        while let Some(node) = current.filter(|node| !Node::are_same_optional(Some(*node), process_end)) {
            current = node.next_sibling();
            action.carry(node, common_root, fragment, false)?;
        }

        if let (Some(fragment), Some(right_contents)) = (fragment, right_contents) {
            fragment.append_child(right_contents)?;
        }

        // Partial ancestors that survive a modifying action mark where the
        // removed content was.
        let collapse_point = match (partial_start, partial_end) {
            (Some(partial_start), _) => BoundaryPoint::new(common_root, partial_start.index() + 1),
            (None, Some(partial_end)) => BoundaryPoint::new(common_root, partial_end.index()),
            (None, None) => start,
        };

        Ok((fragment, Some(collapse_point)))
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use typed_arena::Arena;

    use crate::arena::Ref;
    use crate::dom_exception::ErrorName;
    use crate::node::Node;
    use crate::ranges::BoundaryPoint;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// `<div><p>Hello <b>bold</b> world</p><ul><li>one</li><li>two</li></ul></div>`
    fn build<'arena>(document: Ref<'arena>) -> Ref<'arena> {
        let div = document.create_element("div");
        let p = document.create_element("p");
        let b = document.create_element("b");
        let ul = document.create_element("ul");
        div.append_child(p).unwrap();
        p.append_child(document.create_text_node("Hello ")).unwrap();
        p.append_child(b).unwrap();
        b.append_child(document.create_text_node("bold")).unwrap();
        p.append_child(document.create_text_node(" world")).unwrap();
        div.append_child(ul).unwrap();
        for item in ["one", "two"] {
            let li = document.create_element("li");
            li.append_child(document.create_text_node(item)).unwrap();
            ul.append_child(li).unwrap();
        }
        document.append_child(div).unwrap();
        div
    }

    /// Every boundary point of the subtree rooted at `root`, in tree order.
    fn boundary_points<'arena>(root: Ref<'arena>) -> Vec<BoundaryPoint<'arena>> {
        let mut points = vec![];
        let mut current = Some(root);
        while let Some(node) = current {
            for offset in 0..=node.length() {
                points.push(BoundaryPoint::new(node, offset));
            }
            current = node.traverse_next_node(Some(root));
        }
        points
    }

    #[test]
    fn extract_across_siblings() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let p = document.create_element("p");
        let hello = document.create_text_node("Hello ");
        let b = document.create_element("b");
        let world = document.create_text_node(" world");
        document.append_child(p).unwrap();
        p.append_child(hello).unwrap();
        p.append_child(b).unwrap();
        b.append_child(document.create_text_node("bold")).unwrap();
        p.append_child(world).unwrap();

        let mut range = document.create_range();
        range.set_start(hello, 6).unwrap();
        range.set_end(world, 1).unwrap();
        let fragment = range.extract_contents().unwrap().unwrap();

        assert_eq!(fragment.to_html(), "<b>bold</b> ");
        assert_eq!(p.to_html(), "<p>Hello world</p>");
        assert_eq!(range.start_container().unwrap(), p);
        assert_eq!(range.start_offset().unwrap(), 1);
        assert!(range.collapsed().unwrap());
    }

    #[test]
    fn delete_inside_one_text_node() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let text = document.create_text_node("abcdef");
        let p = document.create_element("p");
        document.append_child(p).unwrap();
        p.append_child(text).unwrap();

        let mut range = document.create_range();
        range.set_start(text, 2).unwrap();
        range.set_end(text, 5).unwrap();
        range.delete_contents().unwrap();

        assert_eq!(text.data().as_deref(), Some("abf"));
        assert_eq!(range.start_container().unwrap(), text);
        assert_eq!(range.end_offset().unwrap(), 2);
        assert!(range.collapsed().unwrap());
    }

    #[test]
    fn collapsed_ranges_produce_nothing() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let div = build(document);
        let mut range = document.create_range();
        range.set_start(div, 1).unwrap();

        assert_eq!(range.clone_contents().unwrap(), None);
        assert_eq!(range.extract_contents().unwrap(), None);
        assert_eq!(div.child_count(), 2);
    }

    #[test]
    fn cloning_leaves_the_range_where_it_was() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let div = build(document);
        let bold = div.first_child().unwrap().child_at(1).unwrap().first_child().unwrap();
        let two = div.last_child().unwrap().last_child().unwrap().first_child().unwrap();

        let mut range = document.create_range();
        range.set_start(bold, 1).unwrap();
        range.set_end(two, 2).unwrap();
        let before = range.clone_range().unwrap();

        let fragment = range.clone_contents().unwrap().unwrap();
        assert_eq!(
            fragment.to_html(),
            "<p><b>old</b> world</p><ul><li>one</li><li>tw</li></ul>"
        );
        assert_eq!(range.to_html().unwrap(), fragment.to_html());
        assert_eq!(range, before);
        assert!(!range.collapsed().unwrap());
    }

    #[test]
    fn extract_from_nested_containers() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let div = build(document);
        let bold = div.first_child().unwrap().child_at(1).unwrap().first_child().unwrap();
        let two = div.last_child().unwrap().last_child().unwrap().first_child().unwrap();

        let mut range = document.create_range();
        range.set_start(bold, 2).unwrap();
        range.set_end(two, 1).unwrap();
        let fragment = range.extract_contents().unwrap().unwrap();

        assert_eq!(
            fragment.to_html(),
            "<p><b>ld</b> world</p><ul><li>one</li><li>t</li></ul>"
        );
        assert_eq!(
            div.to_html(),
            "<div><p>Hello <b>bo</b></p><ul><li>wo</li></ul></div>"
        );
        assert_eq!(range.start_container().unwrap(), div);
        assert_eq!(range.start_offset().unwrap(), 1);
    }

    #[test]
    fn delete_from_element_container_to_text() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let div = build(document);
        let ul = div.last_child().unwrap();
        let one = ul.first_child().unwrap().first_child().unwrap();

        let mut range = document.create_range();
        range.set_start(div, 0).unwrap();
        range.set_end(one, 2).unwrap();
        range.delete_contents().unwrap();

        assert_eq!(div.to_html(), "<div><ul><li>e</li><li>two</li></ul></div>");
        assert_eq!(range.start_container().unwrap(), div);
        assert_eq!(range.start_offset().unwrap(), 0);
    }

    #[test]
    fn processing_instructions_behave_like_text() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let div = document.create_element("div");
        let pi = document.create_processing_instruction("xml-stylesheet", "href=a.css");
        document.append_child(div).unwrap();
        div.append_child(pi).unwrap();

        let mut range = document.create_range();
        range.set_start(pi, 0).unwrap();
        range.set_end(pi, 4).unwrap();
        let fragment = range.extract_contents().unwrap().unwrap();

        assert_eq!(fragment.first_child().unwrap().data().as_deref(), Some("href"));
        assert_eq!(pi.data().as_deref(), Some("=a.css"));
    }

    #[test]
    fn read_only_and_doctype_are_rejected_before_mutation() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let doctype = document.create_doctype("html", "", "");
        document.append_child(doctype).unwrap();
        let div = build(document);

        let mut range = document.create_range();
        range.set_start(document, 0).unwrap();
        range.set_end(div, 1).unwrap();
        assert_eq!(
            range.extract_contents().unwrap_err().name,
            ErrorName::HierarchyRequestError
        );
        assert_eq!(
            range.clone_contents().unwrap_err().name,
            ErrorName::HierarchyRequestError
        );

        let p = div.first_child().unwrap();
        p.set_read_only(true);
        let mut range = document.create_range();
        range.select_node_contents(div).unwrap();
        let before = div.to_html();
        assert_eq!(
            range.delete_contents().unwrap_err().name,
            ErrorName::NoModificationAllowedError
        );
        assert_eq!(div.to_html(), before);
        assert!(range.clone_contents().unwrap().is_some());
    }

    quickcheck! {
        fn clone_leaves_the_tree_and_matches_extract(a: usize, b: usize) -> bool {
            init();
            let live_arena = Arena::new();
            let live_document = Node::new_document(&live_arena);
            let live = build(live_document);
            let twin_arena = Arena::new();
            let twin_document = Node::new_document(&twin_arena);
            let twin = build(twin_document);

            let live_points = boundary_points(live);
            let twin_points = boundary_points(twin);
            let (a, b) = (a % live_points.len(), b % live_points.len());
            let (first, last) = (a.min(b), a.max(b));

            let mut cloned = live_document.create_range();
            cloned.set_start(live_points[first].node, live_points[first].offset).unwrap();
            cloned.set_end(live_points[last].node, live_points[last].offset).unwrap();
            let mut extracted = twin_document.create_range();
            extracted.set_start(twin_points[first].node, twin_points[first].offset).unwrap();
            extracted.set_end(twin_points[last].node, twin_points[last].offset).unwrap();

            let before = live.to_html();
            let copy = cloned.clone_contents().unwrap();
            let moved = extracted.extract_contents().unwrap();

            let untouched = live.to_html() == before;
            let same = match (copy, moved) {
                (Some(copy), Some(moved)) => copy.is_equal_node(moved),
                (None, None) => true,
                _ => false,
            };
            untouched && same && extracted.collapsed().unwrap()
        }
    }
}
