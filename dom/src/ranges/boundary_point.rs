use std::cmp::Ordering;

use crate::arena::Ref;
use crate::node::Node;

// SPECLINK: https://dom.spec.whatwg.org/#boundary-points
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct BoundaryPoint<'arena> {
    // SPEC: A boundary point is a tuple consisting of a node (a node)
    pub node: Ref<'arena>,
    // SPEC: and an offset (a non-negative integer).
    pub offset: usize,
}

impl<'arena> BoundaryPoint<'arena> {
    pub fn new(node: Ref<'arena>, offset: usize) -> Self {
        Self { node, offset }
    }

    pub fn verify_correctness(&self) -> bool {
        // SPEC: A correct boundary point’s offset will be between 0 and the boundary point’s node’s length, inclusive.
        let range = 0..=self.node.length();
        range.contains(&self.offset)
    }

    /// Orders two boundary points in tree order.
    ///
    /// Points in different trees have no order and compare as `Equal`;
    /// callers that care check `Node::have_same_root` first.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level-2-Range-Comparing
    pub fn compare(&self, other: &BoundaryPoint<'arena>) -> Ordering {
        let (a, b) = (self, other);

        // Both points share a container: offsets decide.
        if Node::are_same(a.node, b.node) {
            return a.offset.cmp(&b.offset);
        }

        // B's container is a descendant of A's: locate the child of A's
        // container holding B and compare A's offset with its index.
        if let Some(child) = child_of_ancestor(a.node, b.node) {
            return match a.offset <= child.index() {
                true => Ordering::Less,
                false => Ordering::Greater,
            };
        }

        // The symmetric case.
        if let Some(child) = child_of_ancestor(b.node, a.node) {
            return match child.index() < b.offset {
                true => Ordering::Less,
                false => Ordering::Greater,
            };
        }

        // Neither contains the other: order the children of the common
        // ancestor that lead to each container.
        let Some(root) = common_ancestor(a.node, b.node) else {
            return Ordering::Equal;
        };
        match (child_of_ancestor(root, a.node), child_of_ancestor(root, b.node)) {
            (Some(child_a), Some(child_b)) if !Node::are_same(child_a, child_b) => {
                child_a.index().cmp(&child_b.index())
            }
            _ => Ordering::Equal,
        }
    }
}

impl std::fmt::Debug for BoundaryPoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.node.node_name(), self.offset)
    }
}

/// The deepest node that is an inclusive ancestor of both `a` and `b`.
pub fn common_ancestor<'arena>(a: Ref<'arena>, b: Ref<'arena>) -> Option<Ref<'arena>> {
    a.inclusive_ancestors()
        .find(|ancestor| ancestor.is_inclusive_ancestor_of(b))
}

/// The inclusive ancestor of `descendant` whose parent is `ancestor`, if
/// `ancestor` is a proper ancestor of `descendant`.
pub(crate) fn child_of_ancestor<'arena>(
    ancestor: Ref<'arena>,
    descendant: Ref<'arena>,
) -> Option<Ref<'arena>> {
    descendant
        .inclusive_ancestors()
        .find(|node| Node::are_same_optional(node.parent(), Some(ancestor)))
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use typed_arena::Arena;

    use super::{common_ancestor, BoundaryPoint};
    use crate::node::Node;

    #[test]
    fn compares_in_tree_order() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let p = document.create_element("p");
        let hello = document.create_text_node("Hello ");
        let b = document.create_element("b");
        let bold = document.create_text_node("bold");
        let world = document.create_text_node(" world");
        document.append_child(p).unwrap();
        p.append_child(hello).unwrap();
        p.append_child(b).unwrap();
        b.append_child(bold).unwrap();
        p.append_child(world).unwrap();

        let point = |node, offset| BoundaryPoint::new(node, offset);

        // Same container.
        assert_eq!(point(hello, 1).compare(&point(hello, 3)), Ordering::Less);
        assert_eq!(point(hello, 3).compare(&point(hello, 3)), Ordering::Equal);

        // Descendant on the right.
        assert_eq!(point(p, 1).compare(&point(bold, 2)), Ordering::Less);
        assert_eq!(point(p, 2).compare(&point(bold, 2)), Ordering::Greater);

        // Descendant on the left.
        assert_eq!(point(bold, 0).compare(&point(p, 2)), Ordering::Less);
        assert_eq!(point(bold, 4).compare(&point(p, 1)), Ordering::Greater);

        // Siblings under a common ancestor.
        assert_eq!(point(hello, 6).compare(&point(world, 0)), Ordering::Less);
        assert_eq!(point(world, 0).compare(&point(bold, 4)), Ordering::Greater);
    }

    #[test]
    fn different_trees_do_not_order() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let detached = document.create_element("div");

        assert_eq!(common_ancestor(document, detached), None);
        assert_eq!(
            BoundaryPoint::new(document, 0).compare(&BoundaryPoint::new(detached, 0)),
            Ordering::Equal
        );
    }

    #[test]
    fn correctness_uses_length() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let text = document.create_text_node("abc");

        assert!(BoundaryPoint::new(text, 3).verify_correctness());
        assert!(!BoundaryPoint::new(text, 4).verify_correctness());
    }
}
