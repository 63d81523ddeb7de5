//! Caret positions, the visible-position model they are measured against,
//! and the user selection built on top of DOM ranges.

use dom::ranges::Range;

pub mod position;
pub mod selection;
pub mod text_flow;
pub mod visible_position;

pub use position::{Affinity, Position};
pub use selection::{Granularity, Selection, SelectionState};
pub use text_flow::TextFlow;
pub use visible_position::{VisiblePosition, VisiblePositionOracle, WordSide};

/// The position style computations for `range` should start from.
///
/// Skips content at the start of the range that would otherwise make the
/// style look mixed: a paragraph break right at the start, or the end of
/// the node before the selection.
pub fn editing_start_position<'arena>(
    range: &Range<'arena>,
    oracle: &impl VisiblePositionOracle<'arena>,
) -> Option<Position<'arena>> {
    let start = range.start_position().ok()?;
    let visible = oracle.visible_position(start, Affinity::default())?;

    // The style behind a caret is the relevant one.
    if range.collapsed().ok()? {
        return Some(visible.deep_equivalent());
    }

    if oracle.is_end_of_paragraph(&visible) {
        let next = oracle.next(&visible)?;
        return Some(oracle.downstream(next.deep_equivalent()));
    }

    Some(oracle.downstream(visible.deep_equivalent()))
}

#[cfg(test)]
mod tests {
    use dom::node::Node;
    use typed_arena::Arena;

    use super::{editing_start_position, Position, TextFlow};

    #[test]
    fn editing_start_skips_what_precedes_the_selection() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let body = document.create_element("body");
        document.append_child(body).unwrap();
        let first = document.create_element("p");
        let plain = document.create_text_node("plain ");
        let b = document.create_element("b");
        let bold = document.create_text_node("bold");
        body.append_child(first).unwrap();
        first.append_child(plain).unwrap();
        first.append_child(b).unwrap();
        b.append_child(bold).unwrap();
        let second = document.create_element("p");
        let next = document.create_text_node("next");
        body.append_child(second).unwrap();
        second.append_child(next).unwrap();
        let flow = TextFlow::new(document);

        let mut range = document.create_range();
        range.set_start(plain, 6).unwrap();
        range.set_end(bold, 2).unwrap();
        assert_eq!(
            editing_start_position(&range, &flow),
            Some(Position::new(bold, 0))
        );

        range.set_start(bold, 4).unwrap();
        range.set_end(next, 2).unwrap();
        assert_eq!(
            editing_start_position(&range, &flow),
            Some(Position::new(next, 0))
        );

        range.collapse(true).unwrap();
        assert_eq!(
            editing_start_position(&range, &flow),
            Some(Position::new(bold, 4))
        );

        range.detach().unwrap();
        assert_eq!(editing_start_position(&range, &flow), None);
    }
}
