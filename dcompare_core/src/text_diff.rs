use crate::matcher::similarity_percent;
use regex::Regex;
use serde::Serialize;
use similar::{Algorithm, ChangeTag, DiffOp, DiffTag, TextDiff};
use std::sync::OnceLock;

/// Line- and word-level comparison of two normalised documents
#[derive(Debug, Clone, Serialize)]
pub struct TextComparison {
    pub left_label: String,
    pub right_label: String,
    /// Unified diff, one entry per output line, no trailing newlines
    pub diff: Vec<String>,
    /// Percentage of matching lines (0-100, two decimals)
    pub line_similarity: f64,
    /// Percentage of matching word tokens (0-100, two decimals)
    pub word_similarity: f64,
}

/// Text diff engine producing unified diffs and similarity scores
pub struct TextDiffEngine {
    context_lines: usize,
}

impl TextDiffEngine {
    pub fn new() -> Self {
        Self { context_lines: 3 }
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Compare two texts, labelling the diff with the given names
    pub fn compare_text(
        &self,
        left: &str,
        right: &str,
        left_label: &str,
        right_label: &str,
    ) -> TextComparison {
        let left_lines = split_lines(left);
        let right_lines = split_lines(right);

        let diff = self.unified_diff(&left_lines, &right_lines, left_label, right_label);
        let line_similarity = similarity_percent(&left_lines, &right_lines);
        let word_similarity = similarity_percent(&word_tokens(left), &word_tokens(right));

        TextComparison {
            left_label: left_label.to_string(),
            right_label: right_label.to_string(),
            diff,
            line_similarity,
            word_similarity,
        }
    }

    /// Unified diff of two line sequences.
    ///
    /// Returns nothing at all, not even the header, when the sequences are
    /// equal.
    pub fn unified_diff(
        &self,
        left_lines: &[&str],
        right_lines: &[&str],
        left_label: &str,
        right_label: &str,
    ) -> Vec<String> {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_slices(left_lines, right_lines);

        let hunks: Vec<Vec<DiffOp>> = diff
            .grouped_ops(self.context_lines)
            .into_iter()
            .filter(|group| group.iter().any(|op| op.tag() != DiffTag::Equal))
            .collect();

        let mut output = Vec::new();
        if hunks.is_empty() {
            return output;
        }

        output.push(format!("--- {}", left_label));
        output.push(format!("+++ {}", right_label));

        for group in &hunks {
            let (first, last) = match (group.first(), group.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => continue,
            };
            output.push(format!(
                "@@ -{} +{} @@",
                format_range(first.old_range().start, last.old_range().end),
                format_range(first.new_range().start, last.new_range().end),
            ));

            for op in group {
                for change in diff.iter_changes(op) {
                    let sign = match change.tag() {
                        ChangeTag::Equal => ' ',
                        ChangeTag::Delete => '-',
                        ChangeTag::Insert => '+',
                    };
                    output.push(format!("{}{}", sign, change.value()));
                }
            }
        }

        output
    }
}

impl Default for TextDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Hunk range in `start,length` form; single lines omit the length and
/// empty ranges point at the line before.
fn format_range(start: usize, end: usize) -> String {
    let length = end - start;
    let mut beginning = start + 1;
    if length == 1 {
        return beginning.to_string();
    }
    if length == 0 {
        beginning -= 1;
    }
    format!("{},{}", beginning, length)
}

/// Split on every universal line boundary, dropping the terminators.
///
/// `\r\n` counts as one boundary and a trailing terminator does not yield
/// an empty last line. Form feeds are boundaries, so PDF page markers
/// separate lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_line_boundary(ch) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(next_idx, '\n')) = chars.peek() {
                chars.next();
                start = next_idx + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_boundary(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Lowercased word tokens: maximal runs of word characters
pub fn word_tokens(text: &str) -> Vec<String> {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let word = WORD.get_or_init(|| Regex::new(r"\w+").expect("word pattern is valid"));

    let lowered = text.to_lowercase();
    word.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_single_lines() {
        let engine = TextDiffEngine::new();
        let result = engine.compare_text("Test Case.", "Hello World.", "a.txt", "b.txt");

        assert_eq!(result.line_similarity, 0.0);
        assert_eq!(result.word_similarity, 0.0);
        assert_eq!(
            result.diff,
            vec!["--- a.txt", "+++ b.txt", "@@ -1 +1 @@", "-Test Case.", "+Hello World."]
        );
    }

    #[test]
    fn test_equal_lines_produce_no_diff() {
        let engine = TextDiffEngine::new();
        let result = engine.compare_text("same\ntext\n", "same\ntext", "a", "b");

        assert!(result.diff.is_empty());
        assert_eq!(result.line_similarity, 100.0);
        assert_eq!(result.word_similarity, 100.0);
    }

    #[test]
    fn test_context_is_limited() {
        let left: String = (1..=20).map(|i| format!("line {}\n", i)).collect();
        let right = left.replace("line 10\n", "line ten\n");

        let engine = TextDiffEngine::new();
        let result = engine.compare_text(&left, &right, "a", "b");

        assert_eq!(result.diff[2], "@@ -7,7 +7,7 @@");
        assert!(result.diff.contains(&"-line 10".to_string()));
        assert!(result.diff.contains(&"+line ten".to_string()));
        assert!(!result.diff.contains(&" line 1".to_string()));
        // 2 headers + 1 hunk header + 3 context + 2 changed + 3 context
        assert_eq!(result.diff.len(), 11);

        let narrow = TextDiffEngine::new()
            .with_context_lines(1)
            .compare_text(&left, &right, "a", "b");
        assert_eq!(narrow.diff[2], "@@ -9,3 +9,3 @@");
    }

    #[test]
    fn test_insertion_into_empty() {
        let engine = TextDiffEngine::new();
        let result = engine.compare_text("", "new line\n", "a", "b");

        assert_eq!(result.diff, vec!["--- a", "+++ b", "@@ -0,0 +1 @@", "+new line"]);
        assert_eq!(result.line_similarity, 0.0);
    }

    #[test]
    fn test_word_similarity_ignores_case_and_punctuation() {
        let engine = TextDiffEngine::new();
        let result = engine.compare_text("Hello, World!", "hello world", "a", "b");

        assert_eq!(result.line_similarity, 0.0);
        assert_eq!(result.word_similarity, 100.0);
    }

    #[test]
    fn test_scores_are_symmetric() {
        let engine = TextDiffEngine::new();
        let left = "alpha beta\ngamma\ndelta epsilon\n";
        let right = "alpha\ngamma\ndelta epsilon zeta\n";

        let forward = engine.compare_text(left, right, "l", "r");
        let backward = engine.compare_text(right, left, "r", "l");
        assert_eq!(forward.line_similarity, backward.line_similarity);
        assert_eq!(forward.word_similarity, backward.word_similarity);
        assert!((0.0..=100.0).contains(&forward.line_similarity));
        assert!((0.0..=100.0).contains(&forward.word_similarity));
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n"), vec!["a"]);
        assert_eq!(split_lines("a\r\nb\rc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("page one\x0cpage two"), vec!["page one", "page two"]);
        assert_eq!(split_lines("\n"), vec![""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(word_tokens("Test Case."), vec!["test", "case"]);
        assert_eq!(word_tokens("snake_case, Über 42"), vec!["snake_case", "über", "42"]);
        assert!(word_tokens("... !!!").is_empty());
    }

    #[test]
    fn test_format_range() {
        assert_eq!(format_range(0, 1), "1");
        assert_eq!(format_range(0, 0), "0,0");
        assert_eq!(format_range(3, 3), "3,0");
        assert_eq!(format_range(6, 13), "7,7");
    }
}
