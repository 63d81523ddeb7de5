use dom::arena::Ref;

use crate::position::{self, Affinity, Position};

/// A caret location: the canonical position for everything that renders at
/// the same place, plus the affinity it was requested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisiblePosition<'arena> {
    deep_equivalent: Position<'arena>,
    affinity: Affinity,
}

impl<'arena> VisiblePosition<'arena> {
    pub fn new(deep_equivalent: Position<'arena>, affinity: Affinity) -> Self {
        Self {
            deep_equivalent,
            affinity,
        }
    }

    pub fn deep_equivalent(&self) -> Position<'arena> {
        self.deep_equivalent
    }

    pub fn affinity(&self) -> Affinity {
        self.affinity
    }
}

/// Which word a word boundary query picks when the caret sits between two words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordSide {
    RightWordIfOnBoundary,
    LeftWordIfOnBoundary,
}

/// Answers questions about rendered caret positions.
///
/// A `None` visible position means there is no caret for the input, the
/// equivalent of a null position.
pub trait VisiblePositionOracle<'arena> {
    /// Brings cached caret geometry up to date with the tree.
    fn update_layout(&self);

    /// The caret for `position`, if it renders anywhere.
    fn visible_position(
        &self,
        position: Position<'arena>,
        affinity: Affinity,
    ) -> Option<VisiblePosition<'arena>>;

    fn next(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>>;
    fn previous(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>>;

    fn is_start_of_line(&self, position: &VisiblePosition<'arena>) -> bool;
    fn is_end_of_line(&self, position: &VisiblePosition<'arena>) -> bool;
    fn is_start_of_paragraph(&self, position: &VisiblePosition<'arena>) -> bool;
    fn is_end_of_paragraph(&self, position: &VisiblePosition<'arena>) -> bool;
    fn is_end_of_document(&self, position: &VisiblePosition<'arena>) -> bool;

    fn start_of_word(
        &self,
        position: &VisiblePosition<'arena>,
        side: WordSide,
    ) -> Option<VisiblePosition<'arena>>;
    fn end_of_word(
        &self,
        position: &VisiblePosition<'arena>,
        side: WordSide,
    ) -> Option<VisiblePosition<'arena>>;
    fn start_of_line(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>>;
    fn end_of_line(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>>;
    fn start_of_paragraph(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>>;
    fn end_of_paragraph(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>>;
    fn start_of_document(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>>;
    fn end_of_document(&self, position: &VisiblePosition<'arena>)
        -> Option<VisiblePosition<'arena>>;

    /// The furthest upstream position rendering at the same place as `position`.
    fn upstream(&self, position: Position<'arena>) -> Position<'arena>;

    /// The furthest downstream position rendering at the same place as `position`.
    fn downstream(&self, position: Position<'arena>) -> Position<'arena>;

    fn equivalent_range_compliant_position(&self, position: Position<'arena>) -> Position<'arena> {
        position::equivalent_range_compliant_position(position)
    }

    /// The largest offset into `node` that a position can have.
    fn max_deep_offset(&self, node: Ref<'arena>) -> usize {
        node.length()
    }
}
