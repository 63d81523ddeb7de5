use std::cmp::Ordering;

use crate::arena::Ref;
use crate::dom_exception::{DomException, ErrorName};
use crate::interfaces::{FragmentParser, TextIterator};
use crate::node::Node;
use crate::ranges::validation::check_node_with_offset;
use crate::ranges::{common_ancestor, BoundaryPoint, ContentAction};

#[derive(Clone, Copy)]
pub(crate) struct Boundaries<'arena> {
    pub(crate) start: BoundaryPoint<'arena>,
    pub(crate) end: BoundaryPoint<'arena>,
}

// SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level-2-Range-idl
#[derive(Clone)]
pub struct Range<'arena> {
    owner_document: Ref<'arena>,
    /// `None` once the range has been detached.
    pub(crate) boundaries: Option<Boundaries<'arena>>,
}

/// Which pair of boundary points `compare_boundary_points` compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareHow {
    StartToStart = 0,
    StartToEnd = 1,
    EndToEnd = 2,
    EndToStart = 3,
}

impl TryFrom<u16> for CompareHow {
    type Error = DomException;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompareHow::StartToStart),
            1 => Ok(CompareHow::StartToEnd),
            2 => Ok(CompareHow::EndToEnd),
            3 => Ok(CompareHow::EndToStart),
            _ => Err(ErrorName::SyntaxError.into()),
        }
    }
}

impl<'arena> Range<'arena> {
    /// A range collapsed at the start of `document`.
    pub fn new(document: Ref<'arena>) -> Self {
        let point = BoundaryPoint::new(document, 0);
        Self {
            owner_document: document,
            boundaries: Some(Boundaries {
                start: point,
                end: point,
            }),
        }
    }

    pub fn owner_document(&self) -> Ref<'arena> {
        self.owner_document
    }

    pub fn is_detached(&self) -> bool {
        self.boundaries.is_none()
    }

    pub(crate) fn boundaries(&self) -> Result<Boundaries<'arena>, DomException> {
        self.boundaries
            .ok_or_else(|| ErrorName::InvalidStateError.into())
    }

    pub fn start_position(&self) -> Result<BoundaryPoint<'arena>, DomException> {
        Ok(self.boundaries()?.start)
    }

    pub fn end_position(&self) -> Result<BoundaryPoint<'arena>, DomException> {
        Ok(self.boundaries()?.end)
    }

    pub fn start_container(&self) -> Result<Ref<'arena>, DomException> {
        Ok(self.boundaries()?.start.node)
    }

    pub fn start_offset(&self) -> Result<usize, DomException> {
        Ok(self.boundaries()?.start.offset)
    }

    pub fn end_container(&self) -> Result<Ref<'arena>, DomException> {
        Ok(self.boundaries()?.end.node)
    }

    pub fn end_offset(&self) -> Result<usize, DomException> {
        Ok(self.boundaries()?.end.offset)
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level-2-Range-attr-collapsed
    pub fn collapsed(&self) -> Result<bool, DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        Ok(start == end)
    }

    /// The deepest node containing both boundary points.
    ///
    /// Falls back to the document element if the containers do not share
    /// a tree, which a live range never allows.
    pub fn common_ancestor_container(&self) -> Result<Ref<'arena>, DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        Ok(common_ancestor(start.node, end.node)
            .or_else(|| self.owner_document.document_element())
            .unwrap_or(self.owner_document))
    }

    /// Whether the range is live, both containers share a root and start does not follow end.
    pub fn boundary_points_valid(&self) -> bool {
        let Some(Boundaries { start, end }) = self.boundaries else {
            return false;
        };
        Node::have_same_root(start.node, end.node) && start.compare(&end) != Ordering::Greater
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-setStart
    pub fn set_start(&mut self, node: Ref<'arena>, offset: usize) -> Result<(), DomException> {
        let Boundaries { end, .. } = self.boundaries()?;
        self.check_owner_document(node)?;
        check_node_with_offset(node, offset)?;

        let start = BoundaryPoint::new(node, offset);
        // Collapse onto the new start if it left the end's tree or passed the end.
        let collapse = !Node::have_same_root(start.node, end.node)
            || start.compare(&end) == Ordering::Greater;
        if collapse {
            log::trace!("collapsing range onto new start {start:?}");
        }
        self.boundaries = Some(Boundaries {
            start,
            end: if collapse { start } else { end },
        });
        Ok(())
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-setEnd
    pub fn set_end(&mut self, node: Ref<'arena>, offset: usize) -> Result<(), DomException> {
        let Boundaries { start, .. } = self.boundaries()?;
        self.check_owner_document(node)?;
        check_node_with_offset(node, offset)?;

        let end = BoundaryPoint::new(node, offset);
        let collapse = !Node::have_same_root(start.node, end.node)
            || start.compare(&end) == Ordering::Greater;
        if collapse {
            log::trace!("collapsing range onto new end {end:?}");
        }
        self.boundaries = Some(Boundaries {
            start: if collapse { end } else { start },
            end,
        });
        Ok(())
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-collapse
    pub fn collapse(&mut self, to_start: bool) -> Result<(), DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        let point = if to_start { start } else { end };
        self.boundaries = Some(Boundaries {
            start: point,
            end: point,
        });
        Ok(())
    }

    /// Collapses both boundary points onto `point` without validation.
    pub(crate) fn collapse_to(&mut self, point: BoundaryPoint<'arena>) {
        self.boundaries = Some(Boundaries {
            start: point,
            end: point,
        });
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-compareBoundaryPoints
    pub fn compare_boundary_points(
        &self,
        how: CompareHow,
        source: &Range<'arena>,
    ) -> Result<Ordering, DomException> {
        let this = self.boundaries()?;
        let other = source.boundaries()?;

        let this_container = self.common_ancestor_container()?;
        let source_container = source.common_ancestor_container()?;
        if !Node::are_same(
            this_container.owner_document(),
            source_container.owner_document(),
        ) || !Node::have_same_root(this_container, source_container)
        {
            return Err(ErrorName::WrongDocumentError.into());
        }

        let (a, b) = match how {
            CompareHow::StartToStart => (this.start, other.start),
            CompareHow::StartToEnd => (this.start, other.end),
            CompareHow::EndToEnd => (this.end, other.end),
            CompareHow::EndToStart => (this.end, other.start),
        };
        Ok(a.compare(&b))
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-deleteContents
    pub fn delete_contents(&mut self) -> Result<(), DomException> {
        self.check_delete_extract(true)?;
        self.process_contents(ContentAction::Delete)?;
        Ok(())
    }

    /// Moves the selected content into a new fragment. Returns `None` for a collapsed range.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-extractContents
    pub fn extract_contents(&mut self) -> Result<Option<Ref<'arena>>, DomException> {
        self.check_delete_extract(true)?;
        self.process_contents(ContentAction::Extract)
    }

    /// Copies the selected content into a new fragment. Returns `None` for a collapsed range.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-cloneContents
    pub fn clone_contents(&self) -> Result<Option<Ref<'arena>>, DomException> {
        self.check_delete_extract(false)?;
        self.copy_contents()
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-clone
    pub fn clone_range(&self) -> Result<Range<'arena>, DomException> {
        self.boundaries()?;
        Ok(self.clone())
    }

    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-detach
    pub fn detach(&mut self) -> Result<(), DomException> {
        self.boundaries()?;
        self.boundaries = None;
        Ok(())
    }

    /// The first node in tree order that lies at or after the start.
    pub fn start_node(&self) -> Result<Option<Ref<'arena>>, DomException> {
        let BoundaryPoint { node, offset } = self.start_position()?;
        if node.offset_in_characters() {
            return Ok(Some(node));
        }
        if let Some(child) = node.child_at(offset) {
            return Ok(Some(child));
        }
        if offset == 0 {
            return Ok(Some(node));
        }
        Ok(node.traverse_next_sibling(None))
    }

    /// The first node in tree order that lies entirely after the end.
    pub fn past_end_node(&self) -> Result<Option<Ref<'arena>>, DomException> {
        let BoundaryPoint { node, offset } = self.end_position()?;
        if node.offset_in_characters() {
            return Ok(node.traverse_next_sibling(None));
        }
        if let Some(child) = node.child_at(offset) {
            return Ok(Some(child));
        }
        Ok(node.traverse_next_sibling(None))
    }

    /// The concatenated data of the text and CDATA nodes inside the range.
    // SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level2-Range-method-toString
    pub fn to_string(&self) -> Result<String, DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        let past_end = self.past_end_node()?;

        let mut text = Vec::<u16>::new();
        let mut current = self.start_node()?;
        while let Some(node) = current {
            if Node::are_same_optional(Some(node), past_end) {
                break;
            }
            if node.is_text() || node.is_cdata_section() {
                let data = node.data().unwrap_or_default();
                let mut units: Vec<u16> = data.encode_utf16().collect();
                if Node::are_same(node, end.node) {
                    units.truncate(end.offset);
                }
                if Node::are_same(node, start.node) {
                    units.drain(..start.offset.min(units.len()));
                }
                text.extend(units);
            }
            current = node.traverse_next_node(None);
        }
        Ok(String::from_utf16_lossy(&text))
    }

    /// Markup for a copy of the selected content.
    pub fn to_html(&self) -> Result<String, DomException> {
        Ok(self
            .clone_contents()?
            .map(|fragment| fragment.to_html())
            .unwrap_or_default())
    }

    /// The rendered text of the range, as produced by `iterator`.
    pub fn text(&self, iterator: &impl TextIterator<'arena>) -> Result<String, DomException> {
        let Boundaries { start, end } = self.boundaries()?;
        iterator.update_layout();
        Ok(iterator.plain_text(start, end))
    }

    // SPECLINK: https://w3c.github.io/DOM-Parsing/#dom-range-createcontextualfragment
    pub fn create_contextual_fragment(
        &self,
        markup: &str,
        parser: &impl FragmentParser<'arena>,
    ) -> Result<Ref<'arena>, DomException> {
        let context = self.start_container()?;
        if !context.is_html_element() {
            return Err(ErrorName::NotSupportedError.into());
        }
        parser.parse_fragment(context, markup)
    }
}

/// A range selecting the contents of `node`.
pub fn range_of_contents<'arena>(node: Ref<'arena>) -> Result<Range<'arena>, DomException> {
    let mut range = Range::new(node.owner_document());
    range.select_node_contents(node)?;
    Ok(range)
}

impl PartialEq for Range<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.boundaries, other.boundaries) {
            (None, None) => true,
            (Some(a), Some(b)) => a.start == b.start && a.end == b.end,
            _ => false,
        }
    }
}

impl Eq for Range<'_> {}

impl std::fmt::Debug for Range<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.boundaries {
            None => write!(f, "<empty>"),
            Some(Boundaries { start, end }) => write!(
                f,
                "from offset {} of {} to offset {} of {}",
                start.offset,
                start.node.node_name(),
                end.offset,
                end.node.node_name()
            ),
        }
    }
}
