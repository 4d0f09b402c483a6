//! Script-aware text normalization for fuzzy matching.
//!
//! Arabic and Urdu text is written with optional diacritics, several shapes of
//! the same letter, and decorative elongation. A reader typing a query rarely
//! reproduces those exactly, so both the query and the text are reduced to a
//! canonical form before comparing.
//!
//! [`normalize`] is the plain contract. [`FoldedText`] does the same work one
//! character at a time while remembering where every folded character came
//! from, so a match found in folded text can be mapped back onto the original.

use std::ops::Range;

/// Tatweel (kashida), the elongation character.
const TATWEEL: char = '\u{0640}';

/// Map one character to its canonical form, or `None` to drop it.
///
/// Drops Arabic-script diacritics and tatweel, and collapses letter variants:
/// every alef to bare alef, yeh and alef maksura variants to Arabic yeh,
/// teh marbuta and the Urdu heh shapes to heh, keheh to kaf, waw with hamza
/// to waw.
pub fn normalize_char(c: char) -> Option<char> {
    match c {
        // Harakat, tanwin, shadda, sukun, and the extended marks
        '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' => None,
        // Quranic annotation marks
        '\u{06D6}'..='\u{06DC}' | '\u{06DF}'..='\u{06E4}' | '\u{06E7}' | '\u{06E8}' => None,
        '\u{06EA}'..='\u{06ED}' => None,
        TATWEEL => None,
        'آ' | 'أ' | 'إ' | 'ٱ' | 'ٲ' | 'ٳ' => Some('ا'),
        'ى' | 'ی' | 'ې' | 'ے' | 'ئ' => Some('ي'),
        'ة' | 'ۃ' | 'ہ' | 'ھ' | 'ۀ' | 'ە' => Some('ه'),
        'ک' | 'ڪ' => Some('ك'),
        'ؤ' => Some('و'),
        _ => Some(c),
    }
}

/// Normalize text for script-variant-insensitive matching.
///
/// Pure and idempotent: `normalize(&normalize(s)) == normalize(s)`.
///
/// ```
/// use folio::normalize::normalize;
///
/// assert_eq!(normalize("  إِسْلَام  "), "اسلام");
/// assert_eq!(normalize("كتــــاب"), "كتاب");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text.chars().filter_map(normalize_char).collect();
    folded.trim().to_string()
}

/// Text folded for case-insensitive (and optionally script-normalized)
/// matching, with a map back to byte ranges of the source.
#[derive(Debug, Clone)]
pub struct FoldedText {
    folded: String,
    /// For each byte of `folded` that starts a character, the byte range of
    /// the source character it came from. Indexed by folded char position.
    origins: Vec<Range<usize>>,
    /// Byte offset in `folded` of each folded char, parallel to `origins`.
    offsets: Vec<usize>,
}

impl FoldedText {
    /// Lowercase every character of `source`, applying [`normalize_char`]
    /// first when `normalized` is set.
    pub fn new(source: &str, normalized: bool) -> Self {
        let mut folded = String::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len());

        for (start, c) in source.char_indices() {
            let range = start..start + c.len_utf8();
            let c = if normalized {
                match normalize_char(c) {
                    Some(c) => c,
                    None => continue,
                }
            } else {
                c
            };
            for lower in c.to_lowercase() {
                offsets.push(folded.len());
                origins.push(range.clone());
                folded.push(lower);
            }
        }

        Self {
            folded,
            origins,
            offsets,
        }
    }

    /// The folded string.
    pub fn as_str(&self) -> &str {
        &self.folded
    }

    /// Find every non-overlapping occurrence of `needle` (already folded the
    /// same way) and return the matching byte ranges of the *source* text,
    /// left to right.
    pub fn find_all(&self, needle: &str) -> Vec<Range<usize>> {
        let mut matches = Vec::new();
        if needle.is_empty() {
            return matches;
        }

        let mut from = 0;
        while let Some(pos) = memchr::memmem::find(&self.folded.as_bytes()[from..], needle.as_bytes())
        {
            let start = from + pos;
            let end = start + needle.len();
            if let Some(range) = self.source_range(start, end) {
                // Two folded chars can share one source char; never emit
                // a range that overlaps the previous one.
                if matches
                    .last()
                    .is_none_or(|prev: &Range<usize>| prev.end <= range.start)
                {
                    matches.push(range);
                }
            }
            from = end;
        }
        matches
    }

    /// Find the first occurrence of `needle`, as a source byte range.
    pub fn find_first(&self, needle: &str) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let start = memchr::memmem::find(self.folded.as_bytes(), needle.as_bytes())?;
        self.source_range(start, start + needle.len())
    }

    /// Map a folded byte range onto the covering source byte range.
    fn source_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        let first = self.offsets.binary_search(&start).ok()?;
        let last = match self.offsets.binary_search(&end) {
            Ok(idx) => idx.checked_sub(1)?,
            Err(idx) => idx.checked_sub(1)?,
        };
        Some(self.origins[first].start..self.origins[last].end)
    }
}

/// Fold a query term the same way [`FoldedText::new`] folds text.
///
/// Lowercasing goes char by char, so a final capital sigma folds to `σ`
/// here just as it does in the text.
pub fn fold_term(term: &str, normalized: bool) -> String {
    let lower = |s: &str| -> String { s.chars().flat_map(char::to_lowercase).collect() };
    if normalized {
        lower(&normalize(term))
    } else {
        lower(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_diacritics() {
        // bismillah with full harakat
        assert_eq!(normalize("بِسْمِ"), "بسم");
        assert_eq!(normalize("مُحَمَّدٌ"), "محمد");
    }

    #[test]
    fn test_unifies_letter_variants() {
        assert_eq!(normalize("أحمد"), "احمد");
        assert_eq!(normalize("إيمان"), "ايمان");
        assert_eq!(normalize("آمين"), "امين");
        assert_eq!(normalize("مدرسة"), "مدرسه");
        assert_eq!(normalize("مصطفى"), "مصطفي");
        // Urdu yeh and heh shapes
        assert_eq!(normalize("کتابی"), "كتابي");
        assert_eq!(normalize("ہے"), "هي");
    }

    #[test]
    fn test_strips_tatweel_and_trims() {
        assert_eq!(normalize("  جــمــيــل  "), "جميل");
    }

    #[test]
    fn test_latin_untouched() {
        assert_eq!(normalize("Hello World"), "Hello World");
    }

    #[test]
    fn test_folded_text_maps_back_to_source() {
        let source = "قال: الكِتَابُ مفيد";
        let folded = FoldedText::new(source, true);
        let needle = fold_term("الكتاب", true);
        let matches = folded.find_all(&needle);
        assert_eq!(matches.len(), 1);
        assert_eq!(&source[matches[0].clone()], "الكِتَابُ".trim_end_matches('ُ'));
    }

    #[test]
    fn test_folded_text_case_insensitive() {
        let source = "Foo bar FOO baz foo";
        let folded = FoldedText::new(source, false);
        let matches = folded.find_all("foo");
        assert_eq!(matches, vec![0..3, 8..11, 16..19]);
        assert_eq!(folded.find_first("bar"), Some(4..7));
    }

    #[test]
    fn test_term_folds_like_text() {
        // Whole-string lowercasing would turn the last Σ into ς
        assert_eq!(fold_term("ΟΔΟΣ", false), "οδοσ");
        assert_eq!(FoldedText::new("ΟΔΟΣ", false).as_str(), "οδοσ");
        let folded = FoldedText::new("η ΟΔΟΣ", false);
        assert_eq!(folded.find_first(&fold_term("ΟΔΟΣ", false)), Some(3..11));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn prop_normalize_is_idempotent_on_arabic(
            s in prop::collection::vec(prop::char::range('\u{0600}', '\u{06FF}'), 0..40)
        ) {
            let s: String = s.into_iter().collect();
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
