//! Collaborators a [`Range`](crate::ranges::Range) delegates to for work
//! that depends on rendering or parsing.

use crate::arena::Ref;
use crate::dom_exception::DomException;
use crate::ranges::BoundaryPoint;

/// Walks rendered content and produces its plain text.
pub trait TextIterator<'arena> {
    /// Brings any cached layout up to date with the tree.
    fn update_layout(&self) {}

    /// The rendered text between `start` and `end`.
    fn plain_text(&self, start: BoundaryPoint<'arena>, end: BoundaryPoint<'arena>) -> String;
}

/// Parses markup in the context of an element.
pub trait FragmentParser<'arena> {
    /// Parses `markup` as the contents of `context`, returning a document fragment.
    fn parse_fragment(&self, context: Ref<'arena>, markup: &str)
        -> Result<Ref<'arena>, DomException>;
}
