//! In-page term highlighting.
//!
//! A [`PageView`] holds the parsed content of one rendered page. Highlighting
//! walks its text nodes in document order and wraps every occurrence of the
//! term in a marker element:
//!
//! ```html
//! <mark class="folio-highlight" data-match-index="0">term</mark>
//! ```
//!
//! A text node is matched literally first (case-insensitive); only when that
//! finds nothing is it matched again after script normalization, so
//! `اسلام` finds `إِسْلَام`. Marked spans always show the original text.
//!
//! Each matching text node is replaced in one step: the replacement fragment
//! is built, inserted before the node, and the node detached. Clearing
//! reverses this and merges the text back together, so the text content
//! after a highlight/clear cycle is identical to what it was before.
//!
//! Side effects that belong to the browser (scrolling, the attention pulse,
//! the match-count notice) go through [`HighlightHost`].

mod debounce;
mod dom;
mod serialize;
mod tree_sink;

pub use debounce::{Debouncer, Keystroke};
pub use dom::{Attribute, Dom, Node, NodeData, NodeId};
pub use serialize::inner_html;

use std::ops::Range;

use tracing::debug;

use crate::config::HighlightConfig;
use crate::normalize::{FoldedText, fold_term};

/// Tag used for highlight markers.
pub const MARKER_TAG: &str = "mark";

/// Attribute carrying a marker's position among all matches.
pub const MATCH_INDEX_ATTR: &str = "data-match-index";

/// Subtrees whose text is never highlighted.
const SKIPPED_TAGS: &[&str] = &["script", "style", "textarea", "noscript"];

/// Highlight knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Terms with fewer characters are not searched.
    pub min_term_chars: usize,
    /// Class put on every marker element.
    pub marker_class: String,
    /// Gap kept between the first marker and the viewport edge.
    pub scroll_offset_px: u32,
    /// How long the attention pulse stays on the first marker.
    pub pulse_ms: u64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            min_term_chars: 2,
            marker_class: "folio-highlight".to_string(),
            scroll_offset_px: 100,
            pulse_ms: 3000,
        }
    }
}

impl From<&HighlightConfig> for HighlightOptions {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            min_term_chars: config.min_term_chars,
            marker_class: config.marker_class.clone(),
            scroll_offset_px: config.scroll_offset_px,
            pulse_ms: config.pulse_ms,
        }
    }
}

/// Browser-side effects triggered after a successful highlight.
pub trait HighlightHost {
    /// Smoothly scroll so marker `index` sits `offset_px` below the top edge.
    fn scroll_into_view(&mut self, index: usize, offset_px: u32);

    /// Start the attention pulse on marker `index`; the host removes it after
    /// `duration_ms`.
    fn pulse(&mut self, index: usize, duration_ms: u64);

    /// Show a transient notice with the number of matches.
    fn notify(&mut self, match_count: usize);
}

/// A host that ignores every effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl HighlightHost for NoopHost {
    fn scroll_into_view(&mut self, _index: usize, _offset_px: u32) {}
    fn pulse(&mut self, _index: usize, _duration_ms: u64) {}
    fn notify(&mut self, _match_count: usize) {}
}

/// Highlight state of a page view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Highlighted {
        term: String,
        matches: usize,
    },
}

/// The content region of one rendered page.
#[derive(Debug, Clone)]
pub struct PageView {
    dom: Dom,
    root: NodeId,
    state: ViewState,
    options: HighlightOptions,
}

impl PageView {
    /// Parse page content HTML.
    pub fn new(html: &str, options: HighlightOptions) -> Self {
        let dom = Dom::parse(html);
        let root = dom.body();
        Self {
            dom,
            root,
            state: ViewState::Idle,
            options,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    /// Number of markers currently in the view.
    pub fn match_count(&self) -> usize {
        match &self.state {
            ViewState::Idle => 0,
            ViewState::Highlighted { matches, .. } => *matches,
        }
    }

    /// The current inner HTML of the content region.
    pub fn html(&self) -> String {
        inner_html(&self.dom, self.root)
    }

    /// The current text of the content region.
    pub fn text_content(&self) -> String {
        self.dom.text_content(self.root)
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Clear, highlight `term`, and on success scroll to the first match,
    /// pulse it and announce the count. Returns whether anything matched.
    pub fn highlight_and_scroll<H: HighlightHost + ?Sized>(
        &mut self,
        term: &str,
        host: &mut H,
    ) -> bool {
        let matches = self.highlight(term);
        if matches == 0 {
            return false;
        }
        host.scroll_into_view(0, self.options.scroll_offset_px);
        host.pulse(0, self.options.pulse_ms);
        host.notify(matches);
        true
    }

    /// Clear, then mark every occurrence of `term`. Returns the match count.
    pub fn highlight(&mut self, term: &str) -> usize {
        self.clear();

        let term = term.trim();
        if term.chars().count() < self.options.min_term_chars {
            return 0;
        }
        let literal = fold_term(term, false);
        let normalized = fold_term(term, true);

        let mut next_index = 0;
        for node in self.text_nodes() {
            let Some(text) = self.dom.text(node).map(str::to_owned) else {
                continue;
            };
            let ranges = find_matches(&text, &literal, &normalized);
            if ranges.is_empty() {
                continue;
            }
            self.replace_with_fragment(node, &text, &ranges, &mut next_index);
        }

        debug!(term, matches = next_index, "highlighted page");
        if next_index > 0 {
            self.state = ViewState::Highlighted {
                term: term.to_string(),
                matches: next_index,
            };
        }
        next_index
    }

    /// Remove every marker, restoring plain merged text. Returns to `Idle`.
    pub fn clear(&mut self) {
        let markers: Vec<NodeId> = self
            .dom
            .descendants(self.root)
            .into_iter()
            .filter(|&id| self.is_marker(id))
            .collect();
        if markers.is_empty() && self.state == ViewState::Idle {
            return;
        }

        for marker in markers {
            let text = self.dom.text_content(marker);
            let replacement = self.dom.create_text(text);
            self.dom.insert_before(marker, replacement);
            self.dom.detach(marker);
        }
        self.dom.normalize_text(self.root);
        self.state = ViewState::Idle;
    }

    fn is_marker(&self, id: NodeId) -> bool {
        self.dom.tag_name(id) == Some(MARKER_TAG)
            && self.dom.has_class(id, &self.options.marker_class)
    }

    /// Text nodes below the root in document order, skipping script-like
    /// subtrees and existing markers.
    fn text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.dom.children(self.root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if self.dom.text(id).is_some() {
                out.push(id);
                continue;
            }
            let skip = self
                .dom
                .tag_name(id)
                .is_some_and(|tag| SKIPPED_TAGS.contains(&tag))
                || self.is_marker(id);
            if skip {
                continue;
            }
            let mut children: Vec<NodeId> = self.dom.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Swap one text node for text and marker nodes covering `ranges`.
    fn replace_with_fragment(
        &mut self,
        node: NodeId,
        text: &str,
        ranges: &[Range<usize>],
        next_index: &mut usize,
    ) {
        let mut fragment = Vec::with_capacity(ranges.len() * 2 + 1);
        let mut cursor = 0;
        for range in ranges {
            if range.start > cursor {
                fragment.push(self.dom.create_text(&text[cursor..range.start]));
            }
            let marker = self.dom.create_html_element(
                MARKER_TAG,
                vec![
                    Attribute::new("class", self.options.marker_class.clone()),
                    Attribute::new(MATCH_INDEX_ATTR, next_index.to_string()),
                ],
            );
            let inner = self.dom.create_text(&text[range.clone()]);
            self.dom.append(marker, inner);
            fragment.push(marker);
            *next_index += 1;
            cursor = range.end;
        }
        if cursor < text.len() {
            fragment.push(self.dom.create_text(&text[cursor..]));
        }

        for piece in fragment {
            self.dom.insert_before(node, piece);
        }
        self.dom.detach(node);
    }
}

/// Byte ranges of `text` to mark: literal matches, or normalized matches
/// when there are no literal ones.
fn find_matches(text: &str, literal: &str, normalized: &str) -> Vec<Range<usize>> {
    let found = FoldedText::new(text, false).find_all(literal);
    if !found.is_empty() || normalized.is_empty() {
        return found;
    }
    FoldedText::new(text, true).find_all(normalized)
}

/// Highlight `term` in an HTML fragment and return the new HTML with the
/// match count.
///
/// ```
/// use folio::highlight::{highlight_html, HighlightOptions};
///
/// let (html, count) = highlight_html("<p>Foo and foo</p>", "foo", &HighlightOptions::default());
/// assert_eq!(count, 2);
/// assert!(html.contains(r#"<mark class="folio-highlight" data-match-index="1">foo</mark>"#));
/// ```
pub fn highlight_html(html: &str, term: &str, options: &HighlightOptions) -> (String, usize) {
    let mut view = PageView::new(html, options.clone());
    let count = view.highlight(term);
    (view.html(), count)
}
