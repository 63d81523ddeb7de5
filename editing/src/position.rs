use dom::node::NodeType;
use dom::ranges::BoundaryPoint;

/// A position in the document. Editing positions are boundary points that
/// may not yet be valid as Range boundaries.
pub type Position<'arena> = BoundaryPoint<'arena>;

/// Which of two visually equivalent positions a caret prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Affinity {
    /// The end of the previous line.
    Upstream,
    /// The start of the next line.
    #[default]
    Downstream,
}

/// Elements that hold no caret positions of their own.
const REPLACED_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "embed", "object", "iframe"];

/// Whether `position` can be used as a Range boundary point as it is.
pub fn is_range_compliant(position: &Position) -> bool {
    let container = position.node;
    let allowed = !matches!(
        container.node_type(),
        NodeType::Attribute | NodeType::DocumentType | NodeType::Entity | NodeType::Notation
    );
    allowed
        && !container.is_element_with_one_of_tags(REPLACED_ELEMENTS)
        && position.verify_correctness()
}

/// The closest position to `position` that is a valid Range boundary point.
///
/// Offsets are clamped to the container's length, and positions inside
/// nodes that cannot hold a boundary move to their parent, before or after
/// the node.
pub fn equivalent_range_compliant_position<'arena>(position: Position<'arena>) -> Position<'arena> {
    let container = position.node;
    let offset = position.offset.min(container.length());
    let clamped = Position::new(container, offset);
    if is_range_compliant(&clamped) {
        return clamped;
    }

    match container.parent() {
        Some(parent) => {
            let index = container.index();
            let after = position.offset > 0;
            Position::new(parent, if after { index + 1 } else { index })
        }
        None => clamped,
    }
}
