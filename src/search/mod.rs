//! Book search.
//!
//! Matching falls through three tiers, each tried only when the previous one
//! found nothing:
//!
//! 1. [`MatchTier::Substring`]: the term as a substring of the raw content
//!    (markup included) or the title, ignoring Unicode case.
//! 2. [`MatchTier::AllWords`]: for multi-word terms, every word matches the
//!    content or the title on its own.
//! 3. [`MatchTier::Stripped`]: the term against the content with markup
//!    removed, still ignoring case.
//!
//! Results come back in page number order with a plain-text snippet around
//! the first occurrence.

use tracing::debug;

use crate::book::{BookId, MatchTier, Page, SearchResult};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::normalize::{FoldedText, fold_term};
use crate::store::PageStore;
use crate::util::{collapse_whitespace, strip_tags};

/// Message returned for terms below the minimum length.
pub const TERM_TOO_SHORT: &str = "Search term too short";

/// Search knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Trimmed terms with fewer characters are rejected.
    pub min_term_chars: usize,
    /// Characters of context kept on each side of the match in a snippet.
    pub snippet_radius: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_term_chars: 2,
            snippet_radius: 80,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_term_chars: config.min_term_chars,
            snippet_radius: config.snippet_radius,
        }
    }
}

/// Search one book for `term`.
///
/// A blank term yields no results without touching the store. A term shorter
/// than `min_term_chars` is a validation error.
pub fn search<S: PageStore + ?Sized>(
    store: &S,
    book: BookId,
    term: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }
    if term.chars().count() < options.min_term_chars {
        return Err(Error::validation(TERM_TOO_SHORT));
    }

    let pages = store.list_pages(book)?;
    let Some((tier, matched)) = match_pages(&pages, term) else {
        debug!(book = %book, term, "search found nothing");
        return Ok(Vec::new());
    };
    debug!(book = %book, term, ?tier, results = matched.len(), "search matched");

    Ok(matched
        .into_iter()
        .map(|page| SearchResult {
            page_id: page.id,
            page_number: page.page_number,
            title: page.title.clone(),
            term: term.to_string(),
            tier,
            snippet: snippet(&page.content, term, options.snippet_radius),
        })
        .collect())
}

/// Run the tiers in order and return the first non-empty result set.
pub fn match_pages<'a>(pages: &'a [Page], term: &str) -> Option<(MatchTier, Vec<&'a Page>)> {
    let lowered: Vec<Lowered> = pages.iter().map(Lowered::new).collect();

    let needle = fold_term(term, false);
    let substring: Vec<&Page> = pages
        .iter()
        .zip(&lowered)
        .filter(|(_, l)| l.contains(&needle))
        .map(|(p, _)| p)
        .collect();
    if !substring.is_empty() {
        return Some((MatchTier::Substring, substring));
    }

    if term.contains(char::is_whitespace) {
        let words: Vec<String> = term
            .split_whitespace()
            .map(|word| fold_term(word, false))
            .collect();
        let all_words: Vec<&Page> = pages
            .iter()
            .zip(&lowered)
            .filter(|(_, l)| words.iter().all(|word| l.contains(word)))
            .map(|(p, _)| p)
            .collect();
        if !all_words.is_empty() {
            return Some((MatchTier::AllWords, all_words));
        }
    }

    let stripped: Vec<&Page> = pages
        .iter()
        .zip(&lowered)
        .filter(|(p, l)| {
            fold_term(&strip_tags(&p.content), false).contains(&needle) || l.title.contains(&needle)
        })
        .map(|(p, _)| p)
        .collect();
    if !stripped.is_empty() {
        return Some((MatchTier::Stripped, stripped));
    }

    None
}

/// A page's raw content and title, lowercased char by char. Markup stays.
struct Lowered {
    content: String,
    title: String,
}

impl Lowered {
    fn new(page: &Page) -> Self {
        Self {
            content: fold_term(&page.content, false),
            title: fold_term(&page.title, false),
        }
    }

    fn contains(&self, needle: &str) -> bool {
        self.content.contains(needle) || self.title.contains(needle)
    }
}

/// Plain-text excerpt of `content` centred on the first match of `term`.
///
/// At most `2 * radius` characters of text, with `...` marking each cut end.
/// When the term only matches after normalization, or only word by word,
/// the excerpt centres on whatever is found first; failing that it starts at
/// the beginning.
///
/// ```
/// use folio::search::snippet;
///
/// assert_eq!(snippet("<p>The quick brown fox</p>", "brown", 100), "The quick brown fox");
/// assert_eq!(snippet("aaaa bbbb cccc", "bbbb", 2), "...a bb...");
/// ```
pub fn snippet(content: &str, term: &str, radius: usize) -> String {
    let text = collapse_whitespace(&strip_tags(content));
    let start_byte = locate(&text, term).unwrap_or(0);

    let total = text.chars().count();
    let match_char = text[..start_byte].chars().count();
    let from = match_char.saturating_sub(radius);
    let to = (from + radius * 2).min(total);

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.extend(text.chars().skip(from).take(to - from));
    if to < total {
        out.push_str("...");
    }
    out
}

fn locate(text: &str, term: &str) -> Option<usize> {
    let literal = FoldedText::new(text, false);
    if let Some(range) = literal.find_first(&fold_term(term, false)) {
        return Some(range.start);
    }

    let normalized = FoldedText::new(text, true);
    if let Some(range) = normalized.find_first(&fold_term(term, true)) {
        return Some(range.start);
    }

    term.split_whitespace()
        .filter_map(|word| literal.find_first(&fold_term(word, false)))
        .map(|range| range.start)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::PageId;

    fn page(n: u32, title: &str, content: &str) -> Page {
        Page {
            id: PageId(n as u64),
            book_id: BookId(1),
            page_number: n,
            title: title.to_string(),
            content: content.to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_substring_matches_title() {
        let pages = vec![page(1, "Chapter One", "body"), page(2, "Two", "body")];
        let (tier, found) = match_pages(&pages, "chapter").unwrap();
        assert_eq!(tier, MatchTier::Substring);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page_number, 1);
    }

    #[test]
    fn test_substring_sees_markup() {
        let pages = vec![page(1, "", "<p>hello</p>")];
        let (tier, _) = match_pages(&pages, "p>hel").unwrap();
        assert_eq!(tier, MatchTier::Substring);
    }

    #[test]
    fn test_all_words_tier() {
        let pages = vec![
            page(1, "", "only a cat here"),
            page(2, "", "a dog and a cat"),
        ];
        let (tier, found) = match_pages(&pages, "cat dog").unwrap();
        assert_eq!(tier, MatchTier::AllWords);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page_number, 2);
    }

    #[test]
    fn test_stripped_tier_bridges_tags_and_unicode_case() {
        let pages = vec![page(1, "", "<b>ÉCO</b>LE normale")];
        let (tier, _) = match_pages(&pages, "école normale").unwrap();
        assert_eq!(tier, MatchTier::Stripped);
    }

    #[test]
    fn test_literal_tiers_ignore_unicode_case() {
        let pages = vec![page(1, "", "ÉCOLE et la normale")];
        let (tier, _) = match_pages(&pages, "école").unwrap();
        assert_eq!(tier, MatchTier::Substring);
        let (tier, found) = match_pages(&pages, "école NORMALE").unwrap();
        assert_eq!(tier, MatchTier::AllWords);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_no_match() {
        let pages = vec![page(1, "a", "b")];
        assert!(match_pages(&pages, "zzz").is_none());
    }

    #[test]
    fn test_snippet_falls_back_to_start() {
        assert_eq!(snippet("abcdef", "zz", 2), "abcd...");
    }

    #[test]
    fn test_snippet_normalized_match() {
        let text = "قال: إِسْلَام";
        let s = snippet(text, "اسلام", 100);
        assert_eq!(s, text);
    }
}
