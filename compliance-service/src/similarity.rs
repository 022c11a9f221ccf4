//! String similarity primitives used by the screener.
//!
//! All scores derive from the matching-block ratio `2 * M / T`, where `M` is
//! the number of characters covered by matching blocks and `T` is the combined
//! length of both strings. Public functions report it as an integer in 0..=100,
//! rounded half-to-even.

use std::collections::{BTreeSet, HashMap};

// Sequences at least this long get their most frequent characters dropped
// from the longest-match index.
const POPULAR_MIN_LEN: usize = 200;

/// `a[a_start..a_start + len] == b[b_start..b_start + len]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Greedy longest-common-block matcher over two char sequences.
///
/// Finds the longest matching block, then recurses into the unmatched
/// regions on either side of it. Ties go to the earliest block in `a`, then
/// in `b`.
pub struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular characters are missing from the index; grow the block over them.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        MatchingBlock {
            a_start: best_i,
            b_start: best_j,
            len: best_len,
        }
    }

    /// Matching blocks in ascending order, terminated by a zero-length
    /// block at `(a.len(), b.len())`.
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            found.push(block);
            if alo < block.a_start && blo < block.b_start {
                pending.push((alo, block.a_start, blo, block.b_start));
            }
            if block.a_start + block.len < ahi && block.b_start + block.len < bhi {
                pending.push((block.a_start + block.len, ahi, block.b_start + block.len, bhi));
            }
        }
        found.sort();

        // Collapse blocks that continue each other
        let mut blocks: Vec<MatchingBlock> = Vec::with_capacity(found.len() + 1);
        for block in found {
            match blocks.last_mut() {
                Some(last)
                    if last.a_start + last.len == block.a_start
                        && last.b_start + last.len == block.b_start =>
                {
                    last.len += block.len;
                }
                _ => blocks.push(block),
            }
        }
        blocks.push(MatchingBlock {
            a_start: self.a.len(),
            b_start: self.b.len(),
            len: 0,
        });
        blocks
    }

    /// Raw ratio in 0.0..=1.0. Two empty sequences count as identical.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|block| block.len).sum();
        2.0 * matched as f64 / total as f64
    }
}

fn to_score(ratio: f64) -> u8 {
    (100.0 * ratio).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Lowercase, trim, and turn every non-word character into whitespace.
pub fn full_process(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    replaced.to_lowercase().trim().to_string()
}

/// Whole-string similarity, 0..=100.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    to_score(SequenceMatcher::new(&a, &b).ratio())
}

/// Best ratio between the shorter string and any equally long window of the
/// longer one, 0..=100.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0f64;
    for block in SequenceMatcher::new(shorter, longer).matching_blocks() {
        let start = block.b_start.saturating_sub(block.a_start).min(longer.len());
        let end = (start + shorter.len()).min(longer.len());
        let window_ratio = SequenceMatcher::new(shorter, &longer[start..end]).ratio();
        if window_ratio > 0.995 {
            return 100;
        }
        best = best.max(window_ratio);
    }
    to_score(best)
}

/// Word-order insensitive similarity on raw input, 0..=100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set_ratio_processed(&full_process(a), &full_process(b))
}

/// [`token_set_ratio`] for inputs that already went through [`full_process`].
pub fn token_set_ratio_processed(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let common = join(tokens_a.intersection(&tokens_b).copied());
    let only_a = join(tokens_a.difference(&tokens_b).copied());
    let only_b = join(tokens_b.difference(&tokens_a).copied());

    let with_a = format!("{} {}", common, only_a).trim().to_string();
    let with_b = format!("{} {}", common, only_b).trim().to_string();

    ratio(&common, &with_a)
        .max(ratio(&common, &with_b))
        .max(ratio(&with_a, &with_b))
}

fn join<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_matching_blocks() {
        let a = chars("abxcd");
        let b = chars("abcd");
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a_start: 0, b_start: 0, len: 2 },
                MatchingBlock { a_start: 3, b_start: 2, len: 2 },
                MatchingBlock { a_start: 5, b_start: 4, len: 0 },
            ]
        );
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("kitten", "sitting"), 62);
        assert_eq!(ratio("abcd", "bcde"), 75);
        assert_eq!(ratio("same", "same"), 100);
        assert_eq!(ratio("", ""), 100);
        assert_eq!(ratio("", "abc"), 0);
    }

    #[test]
    fn test_ratio_rounds_half_to_even() {
        // 2 * 1 / 16 = 0.125
        assert_eq!(ratio("a", "abcdefghijklmno"), 12);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("tehran", "tehran, iran"), 100);
        assert_eq!(partial_ratio("iran", "tehran, iran"), 100);
        assert_eq!(partial_ratio("tehran, iran", "iran"), 100);
    }

    #[test]
    fn test_partial_ratio_near_miss() {
        assert_eq!(partial_ratio("iran", "iraq"), 75);
        assert_eq!(partial_ratio("", "iran"), 0);
    }

    #[test]
    fn test_full_process() {
        assert_eq!(full_process("  Al-Qaida, Inc. "), "al qaida  inc");
        assert_eq!(full_process("Société Générale"), "société générale");
        assert_eq!(full_process("!!!"), "");
    }

    #[test]
    fn test_token_set_ignores_order() {
        assert_eq!(token_set_ratio("Bank of Iran", "Iran of Bank"), 100);
    }

    #[test]
    fn test_token_set_tolerates_extra_words() {
        assert_eq!(token_set_ratio("Bank Melli", "Bank Melli Iran"), 100);
        assert_eq!(token_set_ratio("melli melli bank", "bank melli"), 100);
    }

    #[test]
    fn test_token_set_unrelated_names() {
        let score = token_set_ratio("John Smith", "Islamic Revolutionary Guard Corps");
        assert!(score < 50, "unexpected score {}", score);
        assert_eq!(token_set_ratio("", "anything"), 0);
    }
}
