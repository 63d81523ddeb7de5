use std::cmp::Ordering;

use dom::arena::Ref;
use dom::node::Node;
use dom::ranges::Range;

use crate::position::{Affinity, Position};
use crate::visible_position::{VisiblePosition, VisiblePositionOracle, WordSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionState {
    #[default]
    None,
    Caret,
    Range,
}

/// How far a selection is expanded around its endpoints when validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Character,
    Word,
    Line,
    LineBoundary,
    Paragraph,
    ParagraphBoundary,
    DocumentBoundary,
}

/// A user selection: the anchor (`base`) and focus (`extent`) the user
/// placed, and the ordered, canonical `start` and `end` derived from them.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'arena> {
    base: Option<Position<'arena>>,
    extent: Option<Position<'arena>>,
    start: Option<Position<'arena>>,
    end: Option<Position<'arena>>,
    affinity: Affinity,
    state: SelectionState,
    base_is_first: bool,
}

impl Default for Selection<'_> {
    fn default() -> Self {
        Self {
            base: None,
            extent: None,
            start: None,
            end: None,
            affinity: Affinity::default(),
            state: SelectionState::None,
            base_is_first: true,
        }
    }
}

impl<'arena> Selection<'arena> {
    pub fn new(
        base: Position<'arena>,
        extent: Position<'arena>,
        affinity: Affinity,
        oracle: &impl VisiblePositionOracle<'arena>,
    ) -> Self {
        let mut selection = Self {
            base: Some(base),
            extent: Some(extent),
            affinity,
            ..Self::default()
        };
        selection.validate(Granularity::Character, oracle);
        selection
    }

    pub fn caret(
        position: Position<'arena>,
        affinity: Affinity,
        oracle: &impl VisiblePositionOracle<'arena>,
    ) -> Self {
        Self::new(position, position, affinity, oracle)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn base(&self) -> Option<Position<'arena>> {
        self.base
    }

    pub fn extent(&self) -> Option<Position<'arena>> {
        self.extent
    }

    pub fn start(&self) -> Option<Position<'arena>> {
        self.start
    }

    pub fn end(&self) -> Option<Position<'arena>> {
        self.end
    }

    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_none(&self) -> bool {
        self.state == SelectionState::None
    }

    pub fn is_caret(&self) -> bool {
        self.state == SelectionState::Caret
    }

    pub fn is_range(&self) -> bool {
        self.state == SelectionState::Range
    }

    pub fn base_is_first(&self) -> bool {
        self.base_is_first
    }

    /// Moves the selection onto rendered positions, orders it, expands it to
    /// `granularity` and keeps it on one side of any editable boundary.
    pub fn validate(
        &mut self,
        granularity: Granularity,
        oracle: &impl VisiblePositionOracle<'arena>,
    ) {
        oracle.update_layout();

        let original_base = self.base;
        let base_and_extent_equal = self.base == self.extent;
        let affinity = self.affinity;
        let deep_equivalent = |position| {
            oracle
                .visible_position(position, affinity)
                .map(|visible| visible.deep_equivalent())
        };
        self.base = self.base.and_then(deep_equivalent);
        self.extent = if base_and_extent_equal {
            self.base
        } else {
            self.extent.and_then(deep_equivalent)
        };

        match (self.base, self.extent) {
            (None, None) => {
                // Flash the caret somewhere near where the selection used to be.
                let fallback = original_base
                    .and_then(|base| base.node.enclosing_block_flow_element())
                    .map(|block| Position::new(block, 0));
                self.base = fallback;
                self.extent = fallback;
                self.base_is_first = true;
            }
            (None, Some(extent)) => {
                self.base = Some(extent);
                self.base_is_first = true;
            }
            (Some(base), None) => {
                self.extent = Some(base);
                self.base_is_first = true;
            }
            (Some(base), Some(extent)) => {
                self.base_is_first = base.compare(&extent) != Ordering::Greater;
            }
        }

        (self.start, self.end) = if self.base_is_first {
            (self.base, self.extent)
        } else {
            (self.extent, self.base)
        };

        if let (Some(start), Some(end)) = (self.start, self.end) {
            self.expand(start, end, granularity, oracle);
        }

        self.adjust_for_editable_content(oracle);

        match (self.start, self.end) {
            (Some(start), Some(end))
                if start == end || oracle.upstream(start) == oracle.upstream(end) =>
            {
                self.state = SelectionState::Caret;
            }
            (Some(start), Some(end)) => {
                self.state = SelectionState::Range;
                // Affinity only means something for a caret.
                self.affinity = Affinity::Downstream;
                self.start = Some(oracle.downstream(start));
                self.end = Some(oracle.upstream(end));
            }
            _ => {
                self.start = None;
                self.end = None;
                self.state = SelectionState::None;
                self.affinity = Affinity::Downstream;
            }
        }
    }

    fn expand(
        &mut self,
        start: Position<'arena>,
        end: Position<'arena>,
        granularity: Granularity,
        oracle: &impl VisiblePositionOracle<'arena>,
    ) {
        let start = oracle.visible_position(start, self.affinity);
        let end = oracle.visible_position(end, self.affinity);

        let (start, end) = match granularity {
            Granularity::Character => return,
            Granularity::Word => (
                start.and_then(|start| oracle.start_of_word(&start, word_side(oracle, &start))),
                end.and_then(|end| oracle.end_of_word(&end, word_side(oracle, &end))),
            ),
            Granularity::Line => (
                start.and_then(|start| oracle.start_of_line(&start)),
                end.and_then(|end| oracle.end_of_line(&end)).map(|end| {
                    // Include the break after the line.
                    if oracle.is_end_of_paragraph(&end) {
                        oracle.next(&end).unwrap_or(end)
                    } else {
                        end
                    }
                }),
            ),
            Granularity::LineBoundary => (
                start.and_then(|start| oracle.start_of_line(&start)),
                end.and_then(|end| oracle.end_of_line(&end)),
            ),
            Granularity::Paragraph => (
                start.and_then(|start| {
                    let start = if oracle.is_start_of_line(&start) && oracle.is_end_of_document(&start) {
                        oracle.previous(&start).unwrap_or(start)
                    } else {
                        start
                    };
                    oracle.start_of_paragraph(&start)
                }),
                end.and_then(|end| oracle.end_of_paragraph(&end))
                    .map(|end| oracle.next(&end).unwrap_or(end)),
            ),
            Granularity::ParagraphBoundary => (
                start.and_then(|start| oracle.start_of_paragraph(&start)),
                end.and_then(|end| oracle.end_of_paragraph(&end)),
            ),
            Granularity::DocumentBoundary => (
                start.and_then(|start| oracle.start_of_document(&start)),
                end.and_then(|end| oracle.end_of_document(&end)),
            ),
        };

        if let Some(start) = start {
            self.start = Some(start.deep_equivalent());
        }
        if let Some(end) = end {
            self.end = Some(end.deep_equivalent());
        }
    }

    /// Keeps a selection based in editable content inside its editable root,
    /// and one based outside editable content out of every editable root.
    fn adjust_for_editable_content(&mut self, oracle: &impl VisiblePositionOracle<'arena>) {
        let (Some(base), Some(start), Some(end)) = (self.base, self.start, self.end) else {
            return;
        };

        let base_root = base.node.root_editable_element();
        let start_root = start.node.root_editable_element();
        let end_root = end.node.root_editable_element();
        if Node::are_same_optional(base_root, start_root)
            && Node::are_same_optional(base_root, end_root)
        {
            return;
        }

        let deep_equivalent = |position: Position<'arena>| {
            oracle
                .visible_position(position, Affinity::default())
                .map_or(position, |visible| visible.deep_equivalent())
        };

        match base_root {
            Some(root) => {
                if !Node::are_same_optional(base_root, start_root) {
                    let first = deep_equivalent(Position::new(root, 0));
                    self.start = Some(oracle.downstream(first));
                }
                if !Node::are_same_optional(base_root, end_root) {
                    let last = deep_equivalent(Position::new(root, oracle.max_deep_offset(root)));
                    self.end = Some(oracle.upstream(last));
                }
            }
            None => {
                if let Some(root) = end_root {
                    let previous = leave_editable_root(root, |root| {
                        oracle
                            .visible_position(Position::new(root, 0), Affinity::default())
                            .and_then(|visible| oracle.previous(&visible))
                    });
                    self.end = Some(previous.unwrap_or_else(|| {
                        log::warn!("no non-editable position before {root:?}, keeping the base");
                        base
                    }));
                }
                if let Some(root) = start_root {
                    let next = leave_editable_root(root, |root| {
                        let last = Position::new(root, oracle.max_deep_offset(root));
                        oracle
                            .visible_position(last, Affinity::default())
                            .and_then(|visible| oracle.next(&visible))
                    });
                    self.start = Some(next.unwrap_or_else(|| {
                        log::warn!("no non-editable position after {root:?}, keeping the base");
                        base
                    }));
                }
            }
        }

        let extent_root = self
            .extent
            .and_then(|extent| extent.node.root_editable_element());
        if !Node::are_same_optional(base_root, extent_root) {
            self.extent = if self.base_is_first {
                self.end
            } else {
                self.start
            };
        }
    }

    /// The Range covering this selection, or `None` when there is nothing
    /// selected or no valid Range can be built.
    pub fn to_range(&self, oracle: &impl VisiblePositionOracle<'arena>) -> Option<Range<'arena>> {
        if self.is_none() {
            return None;
        }
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return None;
        };

        // Edit commands call this right after changing the tree.
        oracle.update_layout();

        let (start, end) = if self.is_caret() {
            // Style is taken from the character before a caret.
            let caret = oracle.equivalent_range_compliant_position(oracle.upstream(start));
            (caret, caret)
        } else {
            let mut start = oracle.downstream(start);
            let mut end = oracle.upstream(end);
            // Collapsed whitespace can put the end before the start.
            if start.compare(&end) == Ordering::Greater {
                std::mem::swap(&mut start, &mut end);
            }
            (
                oracle.equivalent_range_compliant_position(start),
                oracle.equivalent_range_compliant_position(end),
            )
        };

        let mut range = Range::new(start.node.owner_document());
        if let Err(error) = range.set_start(start.node, start.offset) {
            log::error!("Exception setting Range start from Selection: {error}");
            return None;
        }
        if let Err(error) = range.set_end(end.node, end.offset) {
            log::error!("Exception setting Range end from Selection: {error}");
            return None;
        }
        Some(range)
    }

    pub fn debug_position(&self) {
        let Some(start) = self.start else {
            return;
        };

        log::debug!("Selection =================");
        match self.end.filter(|end| *end != start) {
            None => log::debug!(
                "pos:        {} {:p}:{}",
                start.node.node_name(),
                start.node,
                start.offset
            ),
            Some(end) => {
                log::debug!(
                    "start:      {} {:p}:{}",
                    start.node.node_name(),
                    start.node,
                    start.offset
                );
                log::debug!("-----------------------------------");
                log::debug!(
                    "end:        {} {:p}:{}",
                    end.node.node_name(),
                    end.node,
                    end.offset
                );
                log::debug!("-----------------------------------");
            }
        }
        log::debug!("================================");
    }
}

impl PartialEq for Selection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.base == other.base
            && self.extent == other.extent
            && self.affinity == other.affinity
            && self.state == other.state
    }
}

/// Selects the last word instead of the next one after the last word of a
/// wrapped line or of the document.
fn word_side<'arena>(
    oracle: &impl VisiblePositionOracle<'arena>,
    position: &VisiblePosition<'arena>,
) -> WordSide {
    let after_last_word_of_line = oracle.is_end_of_line(position)
        && !oracle.is_start_of_line(position)
        && !oracle.is_end_of_paragraph(position);
    if oracle.is_end_of_document(position) || after_last_word_of_line {
        WordSide::LeftWordIfOnBoundary
    } else {
        WordSide::RightWordIfOnBoundary
    }
}

/// Steps out of `root` until reaching a position with no editable root.
fn leave_editable_root<'arena>(
    mut root: Ref<'arena>,
    step: impl Fn(Ref<'arena>) -> Option<VisiblePosition<'arena>>,
) -> Option<Position<'arena>> {
    loop {
        let position = step(root)?.deep_equivalent();
        match position.node.root_editable_element() {
            None => return Some(position),
            Some(next) if Node::are_same(next, root) => return None,
            Some(next) => root = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use dom::arena::Ref;
    use dom::node::Node;
    use quickcheck::quickcheck;
    use typed_arena::Arena;

    use super::{Granularity, Selection, SelectionState};
    use crate::position::{Affinity, Position};
    use crate::text_flow::TextFlow;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// ```html
    /// <body>
    ///   <p>Plain text here</p>
    ///   <div contenteditable>The browser wins</div>
    ///   <p>Tail</p>
    /// </body>
    /// ```
    fn page<'arena>(document: Ref<'arena>) -> [Ref<'arena>; 3] {
        let body = document.create_element("body");
        document.append_child(body).unwrap();

        let intro = document.create_text_node("Plain text here");
        let p = document.create_element("p");
        body.append_child(p).unwrap();
        p.append_child(intro).unwrap();

        let editable = document.create_text_node("The browser wins");
        let div = document.create_element("div");
        div.set_attribute("contenteditable", "");
        body.append_child(div).unwrap();
        div.append_child(editable).unwrap();

        let tail = document.create_text_node("Tail");
        let p = document.create_element("p");
        body.append_child(p).unwrap();
        p.append_child(tail).unwrap();

        [intro, editable, tail]
    }

    /// Three plain paragraphs: "one two", "three" and "four".
    fn paragraphs<'arena>(document: Ref<'arena>) -> [Ref<'arena>; 3] {
        let body = document.create_element("body");
        document.append_child(body).unwrap();
        ["one two", "three", "four"].map(|data| {
            let p = document.create_element("p");
            let text = document.create_text_node(data);
            body.append_child(p).unwrap();
            p.append_child(text).unwrap();
            text
        })
    }

    fn endpoints<'arena>(selection: &Selection<'arena>) -> (Position<'arena>, Position<'arena>) {
        (selection.start().unwrap(), selection.end().unwrap())
    }

    #[test]
    fn word_granularity_selects_the_word_under_the_caret() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [_, editable, _] = page(document);
        let flow = TextFlow::new(document);

        let mut selection = Selection::caret(Position::new(editable, 6), Affinity::Upstream, &flow);
        assert!(selection.is_caret());
        assert_eq!(selection.affinity(), Affinity::Upstream);

        selection.validate(Granularity::Word, &flow);
        selection.debug_position();
        assert!(selection.is_range());
        assert_eq!(selection.affinity(), Affinity::Downstream);
        assert_eq!(
            endpoints(&selection),
            (Position::new(editable, 4), Position::new(editable, 11))
        );

        let range = selection.to_range(&flow).unwrap();
        assert_eq!(range.to_string().unwrap(), "browser");
    }

    #[test]
    fn selections_based_in_editable_content_stay_inside_it() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [intro, editable, tail] = page(document);
        let flow = TextFlow::new(document);

        let forward = Selection::new(
            Position::new(editable, 1),
            Position::new(tail, 2),
            Affinity::Downstream,
            &flow,
        );
        assert!(forward.base_is_first());
        assert_eq!(
            endpoints(&forward),
            (Position::new(editable, 1), Position::new(editable, 16))
        );
        assert_eq!(forward.extent(), forward.end());

        let backward = Selection::new(
            Position::new(editable, 3),
            Position::new(intro, 2),
            Affinity::Downstream,
            &flow,
        );
        assert!(!backward.base_is_first());
        assert_eq!(
            endpoints(&backward),
            (Position::new(editable, 0), Position::new(editable, 3))
        );
        assert_eq!(backward.extent(), backward.start());
    }

    #[test]
    fn selections_based_outside_editable_content_stay_out_of_it() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [intro, editable, tail] = page(document);
        let flow = TextFlow::new(document);

        let forward = Selection::new(
            Position::new(intro, 2),
            Position::new(editable, 3),
            Affinity::Downstream,
            &flow,
        );
        assert_eq!(
            endpoints(&forward),
            (Position::new(intro, 2), Position::new(intro, 15))
        );
        assert_eq!(forward.extent(), Some(Position::new(intro, 15)));

        let backward = Selection::new(
            Position::new(tail, 2),
            Position::new(editable, 3),
            Affinity::Downstream,
            &flow,
        );
        assert_eq!(
            endpoints(&backward),
            (Position::new(tail, 0), Position::new(tail, 2))
        );
        assert_eq!(backward.extent(), Some(Position::new(tail, 0)));
    }

    #[test]
    fn granularities_expand_to_their_units() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [one, three, four] = paragraphs(document);
        let flow = TextFlow::new(document);

        let expand = |position, granularity| {
            let mut selection = Selection::caret(position, Affinity::Downstream, &flow);
            selection.validate(granularity, &flow);
            endpoints(&selection)
        };

        assert_eq!(
            expand(Position::new(one, 1), Granularity::Line),
            (Position::new(one, 0), Position::new(three, 0))
        );
        assert_eq!(
            expand(Position::new(one, 1), Granularity::LineBoundary),
            (Position::new(one, 0), Position::new(one, 7))
        );
        assert_eq!(
            expand(Position::new(three, 2), Granularity::Paragraph),
            (Position::new(three, 0), Position::new(four, 0))
        );
        assert_eq!(
            expand(Position::new(three, 2), Granularity::ParagraphBoundary),
            (Position::new(three, 0), Position::new(three, 5))
        );
        assert_eq!(
            expand(Position::new(three, 2), Granularity::DocumentBoundary),
            (Position::new(one, 0), Position::new(four, 4))
        );
        // After the last word of the document, the last word is selected.
        assert_eq!(
            expand(Position::new(four, 4), Granularity::Word),
            (Position::new(four, 0), Position::new(four, 4))
        );
        // The last paragraph has no break to include.
        assert_eq!(
            expand(Position::new(four, 1), Granularity::Paragraph),
            (Position::new(four, 0), Position::new(four, 4))
        );
    }

    #[test]
    fn unrendered_positions_fall_back_to_their_block() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        paragraphs(document);
        let flow = TextFlow::new(document);

        let p = document.create_element("p");
        let text = document.create_text_node("detached");
        p.append_child(text).unwrap();
        let selection = Selection::caret(Position::new(text, 3), Affinity::Upstream, &flow);
        assert!(selection.is_caret());
        assert_eq!(selection.start(), Some(Position::new(p, 0)));

        let lone = document.create_text_node("lone");
        let mut selection = Selection::caret(Position::new(lone, 1), Affinity::Upstream, &flow);
        assert_eq!(selection.state(), SelectionState::None);
        assert_eq!(selection.affinity(), Affinity::Downstream);
        assert_eq!(selection.start(), None);
        assert!(selection.to_range(&flow).is_none());

        selection.clear();
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn carets_become_collapsed_ranges_upstream() {
        init();
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let p = document.create_element("p");
        let hello = document.create_text_node("Hello ");
        let b = document.create_element("b");
        let bold = document.create_text_node("bold");
        document.append_child(p).unwrap();
        p.append_child(hello).unwrap();
        p.append_child(b).unwrap();
        b.append_child(bold).unwrap();
        let flow = TextFlow::new(document);

        let selection = Selection::caret(Position::new(hello, 6), Affinity::Downstream, &flow);
        assert_eq!(selection.start(), Some(Position::new(bold, 0)));

        let range = selection.to_range(&flow).unwrap();
        assert!(range.collapsed().unwrap());
        assert_eq!(range.start_position().unwrap(), Position::new(hello, 6));

        let again = Selection::caret(Position::new(bold, 0), Affinity::Downstream, &flow);
        assert_eq!(selection, again);
    }

    /// `<p>one</p><div contenteditable>ab<b>cd</b></div><p>tail</p>`, and
    /// every boundary point in it.
    fn mixed<'arena>(document: Ref<'arena>) -> Vec<Position<'arena>> {
        let body = document.create_element("body");
        document.append_child(body).unwrap();
        let p = document.create_element("p");
        body.append_child(p).unwrap();
        p.append_child(document.create_text_node("one")).unwrap();
        let div = document.create_element("div");
        div.set_attribute("contenteditable", "true");
        body.append_child(div).unwrap();
        div.append_child(document.create_text_node("ab")).unwrap();
        let b = document.create_element("b");
        div.append_child(b).unwrap();
        b.append_child(document.create_text_node("cd")).unwrap();
        let p = document.create_element("p");
        body.append_child(p).unwrap();
        p.append_child(document.create_text_node("tail")).unwrap();

        let mut positions = vec![];
        let mut current = Some(document);
        while let Some(node) = current {
            positions.extend((0..=node.length()).map(|offset| Position::new(node, offset)));
            current = node.traverse_next_node(None);
        }
        positions
    }

    fn editable_root<'a>(position: Option<Position<'a>>) -> Option<Ref<'a>> {
        position.and_then(|position| position.node.root_editable_element())
    }

    quickcheck! {
        fn validation_is_idempotent(base: usize, extent: usize, upstream: bool) -> bool {
            let arena = Arena::new();
            let document = Node::new_document(&arena);
            let positions = mixed(document);
            let flow = TextFlow::new(document);
            let affinity = if upstream { Affinity::Upstream } else { Affinity::Downstream };

            let once = Selection::new(
                positions[base % positions.len()],
                positions[extent % positions.len()],
                affinity,
                &flow,
            );
            let mut twice = once;
            twice.validate(Granularity::Character, &flow);
            once == twice
        }

        fn endpoints_share_the_editable_root_of_the_base(base: usize, extent: usize) -> bool {
            let arena = Arena::new();
            let document = Node::new_document(&arena);
            let positions = mixed(document);
            let flow = TextFlow::new(document);

            let selection = Selection::new(
                positions[base % positions.len()],
                positions[extent % positions.len()],
                Affinity::Downstream,
                &flow,
            );
            let base_root = editable_root(selection.base());
            Node::are_same_optional(base_root, editable_root(selection.start()))
                && Node::are_same_optional(base_root, editable_root(selection.end()))
        }
    }
}
