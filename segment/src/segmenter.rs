//! Sentence segmentation.
//!
//! A sentence ends at a dot that is followed by end of text, a newline, or a
//! space and an upper case character. Dots in abbreviations ("e.g. baboons"),
//! decimals ("2.9"), ellipses and dots followed by a comma do not end a
//! sentence. Sentences may span several fragments; [`Item::Break`] ends the
//! current sentence regardless of punctuation.
//!
//! Offsets count characters, not bytes.

use crate::types::{Fragment, Item, Segment};

/// Segment under construction.
#[derive(Debug, Default)]
struct Accumulator {
    content: Vec<Fragment>,
    start_offset: Option<usize>,
    end_offset: Option<usize>,
}

impl Accumulator {
    fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn append(mut self, text: String, path: &str, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "fragment slice {start}..={end} is inverted");
        debug_assert_eq!(text.chars().count(), end - start + 1);
        self.content.push(Fragment::new(text, path));
        if self.start_offset.is_none() {
            self.start_offset = Some(start);
        }
        self.end_offset = Some(end);
        self
    }

    /// Push the segment onto `segments` unless it has no content.
    fn finish_into(self, mut segments: Vec<Segment>) -> Vec<Segment> {
        let Accumulator {
            content,
            start_offset,
            end_offset,
        } = self;
        if let (Some(start_offset), Some(end_offset)) = (start_offset, end_offset) {
            let blank = content.iter().all(|f| f.text.trim().is_empty());
            if !blank {
                segments.push(Segment {
                    content,
                    start_offset,
                    end_offset,
                });
            }
        }
        segments
    }
}

/// Divide cleaned content into segments, one for each sentence.
///
/// Leading whitespace of a sentence is excluded from its content and offsets.
/// Text left over after the last sentence final character becomes a segment
/// of its own.
pub fn segment_sentences(items: &[Item]) -> Vec<Segment> {
    let (segments, open) = items.iter().fold(
        (Vec::new(), Accumulator::default()),
        |(segments, open), item| match item {
            Item::Text(fragment) => add_fragment(segments, open, fragment),
            Item::Break => (open.finish_into(segments), Accumulator::default()),
        },
    );
    open.finish_into(segments)
}

/// Convenience wrapper for input without segment breaks.
pub fn segment_fragments(fragments: &[Fragment]) -> Vec<Segment> {
    let items: Vec<Item> = fragments.iter().cloned().map(Item::Text).collect();
    segment_sentences(&items)
}

/// Feed one fragment into the segmentation state.
fn add_fragment(
    mut segments: Vec<Segment>,
    mut open: Accumulator,
    fragment: &Fragment,
) -> (Vec<Segment>, Accumulator) {
    let chars: Vec<char> = fragment.text.chars().collect();
    let mut cursor = 0;

    while cursor < chars.len() {
        let start = if open.is_empty() {
            cursor + leading_whitespace(&chars[cursor..])
        } else {
            cursor
        };

        let (end, ended) = match sentence_final_offset(&chars, start) {
            Some(end) => (end, true),
            None => (chars.len() - 1, false),
        };

        let sentence: String = if start <= end {
            chars[start..=end].iter().collect()
        } else {
            String::new()
        };

        if !sentence.is_empty() && sentence != "\n" {
            open = open.append(sentence, &fragment.path, start, end);
            if ended {
                segments = open.finish_into(segments);
                open = Accumulator::default();
            }
        }

        cursor = end + 1;
    }

    (segments, open)
}

fn leading_whitespace(chars: &[char]) -> usize {
    chars.iter().take_while(|c| c.is_whitespace()).count()
}

/// Offset of the first sentence final character at or after `from`.
fn sentence_final_offset(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&i| is_sentence_final(chars, i))
}

fn is_sentence_final(chars: &[char], index: usize) -> bool {
    if chars[index] != '.' {
        return false;
    }
    match chars.get(index + 1) {
        None | Some('\n') => true,
        Some(' ') => chars.get(index + 2).is_none_or(|&c| is_upper(c)),
        Some(_) => false,
    }
}

/// True if upper casing leaves `c` unchanged. Digits, punctuation and caseless
/// scripts count as upper case, lower case letters do not.
fn is_upper(c: char) -> bool {
    c.to_uppercase().eq(std::iter::once(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segment: &Segment) -> Vec<&str> {
        segment.content.iter().map(|f| f.text.as_str()).collect()
    }

    fn single(text: &str) -> Vec<Segment> {
        segment_fragments(&[Fragment::text(text)])
    }

    #[test]
    fn test_is_sentence_final() {
        let chars: Vec<char> = "Hello. World".chars().collect();
        assert!(is_sentence_final(&chars, 5));

        let chars: Vec<char> = "2.9".chars().collect();
        assert!(!is_sentence_final(&chars, 1));

        let chars: Vec<char> = "e.g. baboons".chars().collect();
        assert!(!is_sentence_final(&chars, 1));
        assert!(!is_sentence_final(&chars, 3));

        let chars: Vec<char> = "end.\nnext".chars().collect();
        assert!(is_sentence_final(&chars, 3));
    }

    #[test]
    fn test_segment_sentences() {
        let segments = single("Sentence 1. Sentence 2. Sentence 3.");
        assert_eq!(
            segments,
            vec![
                Segment {
                    content: vec![Fragment::text("Sentence 1.")],
                    start_offset: 0,
                    end_offset: 10,
                },
                Segment {
                    content: vec![Fragment::text("Sentence 2.")],
                    start_offset: 12,
                    end_offset: 22,
                },
                Segment {
                    content: vec![Fragment::text("Sentence 3.")],
                    start_offset: 24,
                    end_offset: 34,
                },
            ]
        );
    }

    #[test]
    fn test_two_sentences() {
        let segments = single("Sentence 1. Sentence 2.");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text(), "Sentence 1.");
        assert_eq!(segments[1].text(), "Sentence 2.");
    }

    #[test]
    fn test_dont_segment_by_ellipses() {
        let segments = single("This is... one sentence.");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["This is... one sentence."]);
    }

    #[test]
    fn test_dont_segment_by_abbreviations() {
        let segments = single("One sentence i.e. one segment.");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["One sentence i.e. one segment."]);

        let segments = single("Monkeys, penguins etc.");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["Monkeys, penguins etc."]);
    }

    #[test]
    fn test_dont_segment_by_dot_directly_followed_by_comma() {
        let segments = single("As with etc., jr. and friends.");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["As with etc., jr. and friends."]);
    }

    #[test]
    fn test_dont_segment_by_decimal_dot() {
        let segments = single("In numbers like 2.9.");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["In numbers like 2.9."]);
    }

    #[test]
    fn test_keep_last_segment_without_sentence_final_character() {
        let segments = single("Sentence. No sentence final");
        assert_eq!(segments.len(), 2);
        assert_eq!(texts(&segments[1]), vec!["No sentence final"]);
        assert_eq!(segments[1].start_offset, 10);
        assert_eq!(segments[1].end_offset, 26);
    }

    #[test]
    fn test_text_from_multiple_nodes() {
        let segments = segment_fragments(&[
            Fragment::new("Sentence split ", "a"),
            Fragment::new("by", "b"),
            Fragment::new(" tags.", "c"),
        ]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_offset, 0);
        assert_eq!(segments[0].end_offset, 5);
        assert_eq!(
            segments[0].content,
            vec![
                Fragment::new("Sentence split ", "a"),
                Fragment::new("by", "b"),
                Fragment::new(" tags.", "c"),
            ]
        );
    }

    #[test]
    fn test_start_offset_for_multiple_text_nodes() {
        let segments = segment_fragments(&[
            Fragment::text("First sentence. Split"),
            Fragment::text("sentence. And other sentence."),
        ]);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].start_offset, 16);
        assert_eq!(segments[1].end_offset, 8);
        assert_eq!(texts(&segments[1]), vec!["Split", "sentence."]);
        assert_eq!(segments[2].start_offset, 10);
    }

    #[test]
    fn test_text_offset() {
        let segments = single("Sentence.");
        assert_eq!(segments[0].start_offset, 0);
        assert_eq!(segments[0].end_offset, 8);
    }

    #[test]
    fn test_segment_text_with_unicode_chars() {
        let segments = single("Normal sentence. Utterance with å. Another normal sentence.");
        assert_eq!(texts(&segments[1]), vec!["Utterance with å."]);
        assert_eq!(segments[1].start_offset, 17);
        assert_eq!(segments[1].end_offset, 33);
        assert_eq!(texts(&segments[2]), vec!["Another normal sentence."]);
        assert_eq!(segments[2].start_offset, 35);
        assert_eq!(segments[2].end_offset, 58);
    }

    #[test]
    fn test_text_starts_with_sentence_final_character() {
        let segments = segment_fragments(&[
            Fragment::text("Sentence one"),
            Fragment::text(". Sentence two."),
        ]);
        assert_eq!(segments.len(), 2);
        assert_eq!(texts(&segments[0]), vec!["Sentence one", "."]);
        assert_eq!(segments[0].end_offset, 0);
        assert_eq!(texts(&segments[1]), vec!["Sentence two."]);
    }

    #[test]
    fn test_last_text_is_only_sentence_final_character() {
        let segments = segment_fragments(&[
            Fragment::text("Sentence one"),
            Fragment::text(". "),
            Fragment::text("Sentence two."),
        ]);
        assert_eq!(segments.len(), 2);
        assert_eq!(texts(&segments[0]), vec!["Sentence one", "."]);
        assert_eq!(texts(&segments[1]), vec!["Sentence two."]);
    }

    #[test]
    fn test_dont_create_empty_text_for_whitespaces() {
        let segments = segment_fragments(&[
            Fragment::text("Sentence 1. "),
            Fragment::text("Sentence 2."),
        ]);
        assert_eq!(texts(&segments[0]), vec!["Sentence 1."]);
        assert_eq!(texts(&segments[1]), vec!["Sentence 2."]);
    }

    #[test]
    fn test_remove_text_with_only_whitespaces_outside_segments() {
        let segments = segment_fragments(&[Fragment::text(" "), Fragment::text("Sentence 1.")]);
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["Sentence 1."]);
        assert_eq!(segments[0].start_offset, 0);
    }

    #[test]
    fn test_remove_leading_and_trailing_whitespaces() {
        let segments = single(" Sentence. ");
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["Sentence."]);
        assert_eq!(segments[0].start_offset, 1);
        assert_eq!(segments[0].end_offset, 9);
    }

    #[test]
    fn test_dont_add_only_newline_item() {
        let segments = segment_fragments(&[Fragment::text("text"), Fragment::text("\n")]);
        assert_eq!(segments.len(), 1);
        assert_eq!(texts(&segments[0]), vec!["text"]);
    }

    #[test]
    fn test_segment_sentences_by_breaks() {
        let segments = segment_sentences(&[
            Fragment::text("Header").into(),
            Item::Break,
            Fragment::text("Paragraph one").into(),
            Item::Break,
            Fragment::text("Paragraph two").into(),
        ]);
        assert_eq!(segments.len(), 3);
        assert_eq!(texts(&segments[0]), vec!["Header"]);
        assert_eq!(texts(&segments[1]), vec!["Paragraph one"]);
        assert_eq!(texts(&segments[2]), vec!["Paragraph two"]);
        assert_eq!(segments[2].end_offset, 12);
    }

    #[test]
    fn test_dont_create_empty_text_for_whitespaces_between_breaks() {
        let segments = segment_sentences(&[
            Fragment::text("Text one").into(),
            Item::Break,
            Fragment::text(" ").into(),
            Item::Break,
            Fragment::text("Text two").into(),
        ]);
        assert_eq!(segments.len(), 2);
        assert_eq!(texts(&segments[0]), vec!["Text one"]);
        assert_eq!(texts(&segments[1]), vec!["Text two"]);
    }

    #[test]
    fn test_paths_are_forwarded() {
        let segments = segment_fragments(&[Fragment::new("One. Two.", "./p/text()")]);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.content[0].path == "./p/text()"));
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_sentences(&[]).is_empty());
        assert!(segment_fragments(&[Fragment::text("")]).is_empty());
        assert!(segment_fragments(&[Fragment::text("  \n ")]).is_empty());
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let items = vec![
            Fragment::text("Sentence one. Sentence").into(),
            Fragment::text(" two. Three").into(),
            Item::Break,
            Fragment::text("Heading").into(),
        ];
        let first = segment_sentences(&items);
        let second = segment_sentences(&items);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }
}
