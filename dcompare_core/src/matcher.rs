//! Longest-matching-blocks sequence matcher.
//!
//! Finds the longest contiguous run common to both sequences, then recurses
//! into the pieces to its left and right. The similarity ratio is
//! `2 * M / T` where `M` is the total size of the matching blocks and `T`
//! the combined length of both sequences.
//!
//! There is no popular-element junk heuristic: every element can anchor a
//! match regardless of sequence length. Scores for sequences of 200 or
//! more items with many repeats are therefore higher than the ones
//! Python's `difflib.SequenceMatcher` reports with its default `autojunk`.

use std::collections::HashMap;
use std::hash::Hash;

/// `size` equal elements starting at `a[a_start]` and `b[b_start]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions of every element of `b`, ascending
    b_index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b_index: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b_index.entry(item).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Longest block inside `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    /// A zero-sized block at `(a_lo, b_lo)` means nothing matches.
    pub fn find_longest_match(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> MatchingBlock {
        let mut best = MatchingBlock {
            a_start: a_lo,
            b_start: b_lo,
            size: 0,
        };

        // run_lengths[j] = length of the match ending at a[i - 1] and b[j]
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_run_lengths = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_lengths.insert(j, k);
                    if k > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            run_lengths = next_run_lengths;
        }

        best
    }

    /// All matching blocks, ordered and with adjacent blocks merged.
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let found = self.find_longest_match(a_lo, a_hi, b_lo, b_hi);
            if found.size == 0 {
                continue;
            }
            let a_end = found.a_start + found.size;
            let b_end = found.b_start + found.size;
            if a_lo < found.a_start && b_lo < found.b_start {
                pending.push((a_lo, found.a_start, b_lo, found.b_start));
            }
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
            blocks.push(found);
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));

        let mut merged: Vec<MatchingBlock> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = merged.last_mut() {
                if last.a_start + last.size == block.a_start
                    && last.b_start + last.size == block.b_start
                {
                    last.size += block.size;
                    continue;
                }
            }
            merged.push(block);
        }
        merged
    }

    /// Total number of matched elements
    pub fn matched_len(&self) -> usize {
        self.matching_blocks().iter().map(|block| block.size).sum()
    }

    /// Similarity in `[0, 1]`; two empty sequences are fully similar.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * self.matched_len() as f64 / total as f64
    }
}

/// Similarity of two sequences as a percentage rounded to two decimals
pub fn similarity_percent<T: Eq + Hash>(a: &[T], b: &[T]) -> f64 {
    round2(SequenceMatcher::new(a, b).ratio() * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
