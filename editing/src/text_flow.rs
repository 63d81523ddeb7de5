use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use dom::arena::Ref;
use dom::interfaces::TextIterator;
use dom::node::Node;
use unicode_segmentation::UnicodeSegmentation;

use crate::position::{Affinity, Position};
use crate::visible_position::{VisiblePosition, VisiblePositionOracle, WordSide};

/// A layout-free caret model of a document.
///
/// Rendered text flows into paragraphs that break at block boundaries and at
/// `<br>`. Every paragraph is a single line.
pub struct TextFlow<'arena> {
    document: Ref<'arena>,
    layout: RefCell<Option<Rc<Layout<'arena>>>>,
}

struct Caret<'arena> {
    /// Right after the previous character.
    upstream: Position<'arena>,
    /// Right before the next character, or `upstream` at the end of a paragraph.
    downstream: Position<'arena>,
    paragraph: usize,
}

struct Paragraph<'arena> {
    block: Option<Ref<'arena>>,
    first_caret: usize,
    text: String,
    /// Byte offset into `text` of every caret in the paragraph.
    caret_bytes: Vec<usize>,
}

impl Paragraph<'_> {
    fn char_count(&self) -> usize {
        self.caret_bytes.len() - 1
    }

    fn last_caret(&self) -> usize {
        self.first_caret + self.char_count()
    }

    /// Paragraph-local caret bounds of the word segment holding character `index`.
    fn word_containing(&self, index: usize) -> (usize, usize) {
        let byte = self.caret_bytes[index];
        self.text
            .split_word_bound_indices()
            .map(|(start, segment)| (start, start + segment.len()))
            .find(|(start, end)| *start <= byte && byte < *end)
            .map(|(start, end)| (self.caret_at_byte(start), self.caret_at_byte(end)))
            .unwrap_or((index, index + 1))
    }

    fn caret_at_byte(&self, byte: usize) -> usize {
        self.caret_bytes
            .binary_search(&byte)
            .unwrap_or_else(|index| index)
    }
}

/// A rendered text node.
struct TextRun<'arena> {
    node: Ref<'arena>,
    paragraph: usize,
    /// Paragraph-local index of the node's first character.
    first_char: usize,
    /// UTF-16 offset of each character in the node.
    char_starts: Vec<usize>,
}

struct RenderedChar<'arena> {
    node: Ref<'arena>,
    start: usize,
    end: usize,
    c: char,
}

#[derive(Default)]
struct Layout<'arena> {
    carets: Vec<Caret<'arena>>,
    paragraphs: Vec<Paragraph<'arena>>,
    runs: Vec<TextRun<'arena>>,
}

#[derive(Default)]
struct LayoutBuilder<'arena> {
    layout: Layout<'arena>,
    block: Option<Ref<'arena>>,
    chars: Vec<RenderedChar<'arena>>,
    runs: Vec<TextRun<'arena>>,
}

impl<'arena> LayoutBuilder<'arena> {
    fn build(document: Ref<'arena>) -> Layout<'arena> {
        let mut builder = LayoutBuilder::default();
        let mut current = Some(document);
        while let Some(node) = current {
            if node.is_non_rendered_element() {
                current = node.traverse_next_sibling(None);
                continue;
            }
            if node.is_element_with_tag("br") {
                builder.line_break(node);
            } else if (node.is_text() || node.is_cdata_section()) && is_rendered_text(node) {
                builder.text(node);
            }
            current = node.traverse_next_node(None);
        }
        builder.flush();
        builder.layout
    }

    fn text(&mut self, node: Ref<'arena>) {
        let block = node.enclosing_block_flow_element();
        if !self.chars.is_empty() && !Node::are_same_optional(block, self.block) {
            self.flush();
        }
        if self.chars.is_empty() {
            self.block = block;
        }

        let data = node.data().unwrap_or_default();
        let mut run = TextRun {
            node,
            paragraph: 0,
            first_char: self.chars.len(),
            char_starts: vec![],
        };
        let mut offset = 0;
        for c in data.chars() {
            let end = offset + c.len_utf16();
            run.char_starts.push(offset);
            self.chars.push(RenderedChar {
                node,
                start: offset,
                end,
                c,
            });
            offset = end;
        }
        self.runs.push(run);
    }

    fn line_break(&mut self, br: Ref<'arena>) {
        let block = br.enclosing_block_flow_element();
        if !self.chars.is_empty() && !Node::are_same_optional(block, self.block) {
            self.flush();
        }
        if !self.chars.is_empty() {
            self.flush();
            return;
        }

        // A break with nothing before it in its paragraph renders an empty line.
        let Some(parent) = br.parent() else {
            return;
        };
        let anchor = Position::new(parent, br.index());
        self.layout.paragraphs.push(Paragraph {
            block,
            first_caret: self.layout.carets.len(),
            text: String::new(),
            caret_bytes: vec![0],
        });
        self.layout.carets.push(Caret {
            upstream: anchor,
            downstream: anchor,
            paragraph: self.layout.paragraphs.len() - 1,
        });
    }

    fn flush(&mut self) {
        if self.chars.is_empty() {
            return;
        }

        let paragraph = self.layout.paragraphs.len();
        let first_caret = self.layout.carets.len();
        let count = self.chars.len();
        let mut text = String::new();
        let mut caret_bytes = vec![0];
        for k in 0..=count {
            let upstream = match k {
                0 => Position::new(self.chars[0].node, self.chars[0].start),
                _ => Position::new(self.chars[k - 1].node, self.chars[k - 1].end),
            };
            let downstream = match self.chars.get(k) {
                Some(next) => Position::new(next.node, next.start),
                None => upstream,
            };
            self.layout.carets.push(Caret {
                upstream,
                downstream,
                paragraph,
            });
            if let Some(next) = self.chars.get(k) {
                text.push(next.c);
                caret_bytes.push(text.len());
            }
        }

        self.layout.paragraphs.push(Paragraph {
            block: self.block,
            first_caret,
            text,
            caret_bytes,
        });
        for mut run in self.runs.drain(..) {
            run.paragraph = paragraph;
            self.layout.runs.push(run);
        }
        self.chars.clear();
    }
}

/// Whitespace-only text containing a newline is source formatting, not content.
fn is_rendered_text(node: Ref) -> bool {
    let Some(data) = node.data() else {
        return false;
    };
    !data.is_empty() && !(data.contains('\n') && data.chars().all(char::is_whitespace))
}

impl<'arena> TextFlow<'arena> {
    pub fn new(document: Ref<'arena>) -> Self {
        Self {
            document: document.owner_document(),
            layout: RefCell::new(None),
        }
    }

    pub fn document(&self) -> Ref<'arena> {
        self.document
    }

    /// Rebuilds the caret model from the current tree.
    pub fn update_layout(&self) {
        let layout = LayoutBuilder::build(self.document);
        log::trace!(
            "text flow has {} carets in {} paragraphs",
            layout.carets.len(),
            layout.paragraphs.len()
        );
        *self.layout.borrow_mut() = Some(Rc::new(layout));
    }

    fn layout(&self) -> Rc<Layout<'arena>> {
        if self.layout.borrow().is_none() {
            self.update_layout();
        }
        self.layout.borrow().clone().unwrap_or_default()
    }

    /// The caret that `position` renders at.
    fn caret_index(&self, layout: &Layout<'arena>, position: Position<'arena>) -> Option<usize> {
        if layout.carets.is_empty() || !Node::have_same_root(position.node, self.document) {
            return None;
        }

        // Inside rendered text, count the characters before the offset.
        if let Some(run) = layout
            .runs
            .iter()
            .find(|run| Node::are_same(run.node, position.node))
        {
            let before = run
                .char_starts
                .iter()
                .filter(|start| **start < position.offset)
                .count();
            return Some(layout.paragraphs[run.paragraph].first_caret + run.first_char + before);
        }

        // Elsewhere, prefer the nearest caret after the position, then the one
        // before it, as long as it belongs to the position's block.
        let block = position.node.enclosing_block_flow_element();
        let in_block = |index: usize| match block {
            None => true,
            Some(block) => layout.paragraphs[layout.carets[index].paragraph]
                .block
                .is_some_and(|caret_block| block.is_inclusive_ancestor_of(caret_block)),
        };
        let after = layout
            .carets
            .iter()
            .position(|caret| caret.downstream.compare(&position) != Ordering::Less);
        let before = match after {
            Some(index) => index.checked_sub(1),
            None => Some(layout.carets.len() - 1),
        };
        if let Some(index) = after.filter(|index| in_block(*index)) {
            return Some(index);
        }
        if let Some(index) = before.filter(|index| in_block(*index)) {
            return Some(index);
        }
        after.or(before)
    }

    fn at(
        &self,
        layout: &Layout<'arena>,
        index: usize,
        affinity: Affinity,
    ) -> VisiblePosition<'arena> {
        VisiblePosition::new(layout.carets[index].downstream, affinity)
    }

    fn locate(&self, position: &VisiblePosition<'arena>) -> Option<(Rc<Layout<'arena>>, usize)> {
        let layout = self.layout();
        let index = self.caret_index(&layout, position.deep_equivalent())?;
        Some((layout, index))
    }

    fn paragraph_bounds(&self, position: &VisiblePosition<'arena>) -> Option<(usize, usize, usize)> {
        let (layout, index) = self.locate(position)?;
        let paragraph = &layout.paragraphs[layout.carets[index].paragraph];
        Some((paragraph.first_caret, index, paragraph.last_caret()))
    }

    fn paragraph_edge(
        &self,
        position: &VisiblePosition<'arena>,
        at_end: bool,
    ) -> Option<VisiblePosition<'arena>> {
        let (layout, index) = self.locate(position)?;
        let paragraph = &layout.paragraphs[layout.carets[index].paragraph];
        let edge = if at_end {
            paragraph.last_caret()
        } else {
            paragraph.first_caret
        };
        Some(self.at(&layout, edge, position.affinity()))
    }

    /// The bounds of the word that `side` picks around `position`, as caret indexes.
    fn word_bounds(
        &self,
        position: &VisiblePosition<'arena>,
        side: WordSide,
    ) -> Option<(Rc<Layout<'arena>>, usize, Option<(usize, usize)>)> {
        let (layout, index) = self.locate(position)?;
        let paragraph = &layout.paragraphs[layout.carets[index].paragraph];
        let local = index - paragraph.first_caret;
        let character = match side {
            WordSide::RightWordIfOnBoundary if local < paragraph.char_count() => Some(local),
            WordSide::LeftWordIfOnBoundary if local > 0 => Some(local - 1),
            _ => None,
        };
        let bounds = character.map(|character| {
            let (start, end) = paragraph.word_containing(character);
            (paragraph.first_caret + start, paragraph.first_caret + end)
        });
        Some((layout, index, bounds))
    }
}

impl<'arena> VisiblePositionOracle<'arena> for TextFlow<'arena> {
    fn update_layout(&self) {
        TextFlow::update_layout(self)
    }

    fn visible_position(
        &self,
        position: Position<'arena>,
        affinity: Affinity,
    ) -> Option<VisiblePosition<'arena>> {
        let layout = self.layout();
        let index = self.caret_index(&layout, position)?;
        Some(self.at(&layout, index, affinity))
    }

    fn next(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>> {
        let (layout, index) = self.locate(position)?;
        (index + 1 < layout.carets.len()).then(|| self.at(&layout, index + 1, position.affinity()))
    }

    fn previous(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>> {
        let (layout, index) = self.locate(position)?;
        let index = index.checked_sub(1)?;
        Some(self.at(&layout, index, position.affinity()))
    }

    fn is_start_of_line(&self, position: &VisiblePosition<'arena>) -> bool {
        self.is_start_of_paragraph(position)
    }

    fn is_end_of_line(&self, position: &VisiblePosition<'arena>) -> bool {
        self.is_end_of_paragraph(position)
    }

    fn is_start_of_paragraph(&self, position: &VisiblePosition<'arena>) -> bool {
        self.paragraph_bounds(position)
            .is_some_and(|(first, index, _)| index == first)
    }

    fn is_end_of_paragraph(&self, position: &VisiblePosition<'arena>) -> bool {
        self.paragraph_bounds(position)
            .is_some_and(|(_, index, last)| index == last)
    }

    fn is_end_of_document(&self, position: &VisiblePosition<'arena>) -> bool {
        self.locate(position)
            .is_some_and(|(layout, index)| index + 1 == layout.carets.len())
    }

    fn start_of_word(
        &self,
        position: &VisiblePosition<'arena>,
        side: WordSide,
    ) -> Option<VisiblePosition<'arena>> {
        let (layout, index, bounds) = self.word_bounds(position, side)?;
        let start = bounds.map_or(index, |(start, _)| start);
        Some(self.at(&layout, start, position.affinity()))
    }

    fn end_of_word(
        &self,
        position: &VisiblePosition<'arena>,
        side: WordSide,
    ) -> Option<VisiblePosition<'arena>> {
        let (layout, index, bounds) = self.word_bounds(position, side)?;
        let end = bounds.map_or(index, |(_, end)| end);
        Some(self.at(&layout, end, position.affinity()))
    }

    fn start_of_line(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>> {
        self.paragraph_edge(position, false)
    }

    fn end_of_line(&self, position: &VisiblePosition<'arena>) -> Option<VisiblePosition<'arena>> {
        self.paragraph_edge(position, true)
    }

    fn start_of_paragraph(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>> {
        self.paragraph_edge(position, false)
    }

    fn end_of_paragraph(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>> {
        self.paragraph_edge(position, true)
    }

    fn start_of_document(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>> {
        let (layout, _) = self.locate(position)?;
        Some(self.at(&layout, 0, position.affinity()))
    }

    fn end_of_document(
        &self,
        position: &VisiblePosition<'arena>,
    ) -> Option<VisiblePosition<'arena>> {
        let (layout, _) = self.locate(position)?;
        Some(self.at(&layout, layout.carets.len() - 1, position.affinity()))
    }

    fn upstream(&self, position: Position<'arena>) -> Position<'arena> {
        let layout = self.layout();
        self.caret_index(&layout, position)
            .map_or(position, |index| layout.carets[index].upstream)
    }

    fn downstream(&self, position: Position<'arena>) -> Position<'arena> {
        let layout = self.layout();
        self.caret_index(&layout, position)
            .map_or(position, |index| layout.carets[index].downstream)
    }
}

impl<'arena> TextIterator<'arena> for TextFlow<'arena> {
    fn update_layout(&self) {
        TextFlow::update_layout(self)
    }

    /// Rendered characters between the carets of `start` and `end`, with a
    /// newline for every paragraph break.
    fn plain_text(&self, start: Position<'arena>, end: Position<'arena>) -> String {
        let layout = self.layout();
        let (Some(first), Some(last)) = (
            self.caret_index(&layout, start),
            self.caret_index(&layout, end),
        ) else {
            return String::new();
        };

        let mut text = String::new();
        for index in first..last {
            let caret = &layout.carets[index];
            if layout.carets[index + 1].paragraph != caret.paragraph {
                text.push('\n');
                continue;
            }
            let paragraph = &layout.paragraphs[caret.paragraph];
            let local = index - paragraph.first_caret;
            let bytes = paragraph.caret_bytes[local]..paragraph.caret_bytes[local + 1];
            text.push_str(&paragraph.text[bytes]);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use dom::arena::Ref;
    use dom::interfaces::TextIterator;
    use dom::node::Node;
    use typed_arena::Arena;

    use super::TextFlow;
    use crate::position::{Affinity, Position};
    use crate::visible_position::{VisiblePositionOracle, WordSide};

    /// ```html
    /// <body>
    ///   <p>Hello <b>brave</b> browser</p>
    ///   <p><br></p>
    ///   <div>one<br>two</div>
    /// </body>
    /// ```
    fn build<'arena>(document: Ref<'arena>) -> [Ref<'arena>; 7] {
        let body = document.create_element("body");
        document.append_child(body).unwrap();
        body.append_child(document.create_text_node("\n  ")).unwrap();

        let p = document.create_element("p");
        let hello = document.create_text_node("Hello ");
        let b = document.create_element("b");
        let brave = document.create_text_node("brave");
        let browser = document.create_text_node(" browser");
        body.append_child(p).unwrap();
        p.append_child(hello).unwrap();
        p.append_child(b).unwrap();
        b.append_child(brave).unwrap();
        p.append_child(browser).unwrap();

        let empty = document.create_element("p");
        let br = document.create_element("br");
        body.append_child(empty).unwrap();
        empty.append_child(br).unwrap();

        let div = document.create_element("div");
        let one = document.create_text_node("one");
        let two = document.create_text_node("two");
        body.append_child(div).unwrap();
        div.append_child(one).unwrap();
        div.append_child(document.create_element("br")).unwrap();
        div.append_child(two).unwrap();

        [body, hello, brave, browser, empty, one, two]
    }

    #[test]
    fn paragraphs_and_carets() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [body, hello, brave, browser, empty, one, two] = build(document);
        let flow = TextFlow::new(document);
        flow.update_layout();

        let start = flow
            .visible_position(Position::new(body, 0), Affinity::Downstream)
            .unwrap();
        assert_eq!(start.deep_equivalent(), Position::new(hello, 0));
        assert!(flow.is_start_of_paragraph(&start));

        // The caret between two text nodes is canonically downstream.
        let seam = flow
            .visible_position(Position::new(hello, 6), Affinity::Downstream)
            .unwrap();
        assert_eq!(seam.deep_equivalent(), Position::new(brave, 0));
        assert_eq!(flow.upstream(Position::new(brave, 0)), Position::new(hello, 6));

        let end = flow.end_of_paragraph(&seam).unwrap();
        assert_eq!(end.deep_equivalent(), Position::new(browser, 8));
        assert!(flow.is_end_of_line(&end));

        // The empty paragraph has a single caret before its break.
        let blank = flow.next(&end).unwrap();
        assert_eq!(blank.deep_equivalent(), Position::new(empty, 0));
        assert!(flow.is_start_of_paragraph(&blank) && flow.is_end_of_paragraph(&blank));

        let after_blank = flow.next(&blank).unwrap();
        assert_eq!(after_blank.deep_equivalent(), Position::new(one, 0));
        let last = flow.end_of_document(&after_blank).unwrap();
        assert_eq!(last.deep_equivalent(), Position::new(two, 3));
        assert!(flow.is_end_of_document(&last));
        assert_eq!(flow.previous(&flow.start_of_document(&last).unwrap()), None);
    }

    #[test]
    fn words_pick_a_side_on_boundaries() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [_, hello, brave, browser, ..] = build(document);
        let flow = TextFlow::new(document);

        let inside = flow
            .visible_position(Position::new(browser, 4), Affinity::Downstream)
            .unwrap();
        let start = flow
            .start_of_word(&inside, WordSide::RightWordIfOnBoundary)
            .unwrap();
        let end = flow.end_of_word(&inside, WordSide::RightWordIfOnBoundary).unwrap();
        assert_eq!(start.deep_equivalent(), Position::new(browser, 1));
        assert_eq!(end.deep_equivalent(), Position::new(browser, 8));

        let boundary = flow
            .visible_position(Position::new(hello, 6), Affinity::Downstream)
            .unwrap();
        let right = flow.end_of_word(&boundary, WordSide::RightWordIfOnBoundary).unwrap();
        assert_eq!(right.deep_equivalent(), Position::new(browser, 0));
        assert_eq!(flow.upstream(right.deep_equivalent()), Position::new(brave, 5));
        let left = flow
            .start_of_word(&boundary, WordSide::LeftWordIfOnBoundary)
            .unwrap();
        assert_eq!(left.deep_equivalent(), Position::new(hello, 5));
    }

    #[test]
    fn positions_outside_text_find_their_block() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [body, _, _, browser, _, one, _] = build(document);
        let flow = TextFlow::new(document);

        let p = browser.parent().unwrap();
        let at_end = flow
            .visible_position(Position::new(p, p.child_count()), Affinity::Downstream)
            .unwrap();
        assert_eq!(at_end.deep_equivalent(), Position::new(browser, 8));

        let div = one.parent().unwrap();
        let in_div = flow
            .visible_position(Position::new(div, 0), Affinity::Downstream)
            .unwrap();
        assert_eq!(in_div.deep_equivalent(), Position::new(one, 0));

        let detached = document.create_element("div");
        assert_eq!(
            flow.visible_position(Position::new(detached, 0), Affinity::Downstream),
            None
        );
        assert_eq!(flow.max_deep_offset(body), body.child_count());
    }

    #[test]
    fn plain_text_breaks_paragraphs() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [_, hello, _, _, _, _, two] = build(document);
        let flow = TextFlow::new(document);

        let mut range = document.create_range();
        range.set_start(hello, 2).unwrap();
        range.set_end(two, 2).unwrap();
        assert_eq!(
            range.text(&flow).unwrap(),
            "llo brave browser\n\none\ntw"
        );
        assert_eq!(
            flow.plain_text(Position::new(two, 0), Position::new(two, 3)),
            "two"
        );
    }

    #[test]
    fn layout_follows_the_tree_after_update() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let [_, _, _, _, _, one, _] = build(document);
        let flow = TextFlow::new(document);
        flow.update_layout();

        one.append_data("!").unwrap();
        TextIterator::update_layout(&flow);
        let end = flow
            .visible_position(Position::new(one, 4), Affinity::Upstream)
            .unwrap();
        assert!(flow.is_end_of_paragraph(&end));
        assert_eq!(end.affinity(), Affinity::Upstream);
    }
}
