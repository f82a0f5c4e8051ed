//! Misspelling-tolerant title matching using the longest-matching-block
//! ratio: `2·M / T`, where `M` is the number of characters in matching
//! blocks and `T` the combined length of both strings.

use ndarray::Array1;
use std::collections::HashMap;

/// Sequences at least this long treat very frequent characters as noise
/// when seeding matches.
const POPULAR_MIN_LEN: usize = 200;

/// A pre-indexed right-hand sequence, reused across many queries.
#[derive(Debug, Clone)]
pub struct MatchTarget {
    chars: Vec<char>,
    positions: HashMap<char, Vec<usize>>,
}

impl MatchTarget {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in chars.iter().enumerate() {
            positions.entry(c).or_default().push(j);
        }
        if chars.len() >= POPULAR_MIN_LEN {
            let limit = chars.len() / 100 + 1;
            positions.retain(|_, idx| idx.len() <= limit);
        }
        Self { chars, positions }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Longest block `a[i..i+size] == b[j..j+size]` inside the given ranges.
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn longest_match(
        &self,
        a: &[char],
        (alo, ahi): (usize, usize),
        (blo, bhi): (usize, usize),
    ) -> (usize, usize, usize) {
        let b = &self.chars;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut run_len: HashMap<usize, usize> = HashMap::new();

        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_len: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.positions.get(c) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = run_len.get(&(j.wrapping_sub(1))).copied().unwrap_or(0) + 1;
                    next_len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            run_len = next_len;
        }

        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total characters covered by the non-overlapping matching blocks.
    pub fn matched_chars(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut pending = vec![((0, a.len()), (0, self.chars.len()))];
        while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
            let (i, j, size) = self.longest_match(a, (alo, ahi), (blo, bhi));
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push(((alo, i), (blo, j)));
            }
            if i + size < ahi && j + size < bhi {
                pending.push(((i + size, ahi), (j + size, bhi)));
            }
        }
        matched
    }

    pub fn ratio(&self, a: &[char]) -> f64 {
        let total = a.len() + self.chars.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * self.matched_chars(a) as f64 / total as f64
    }
}

/// Ratio between two strings, as-is (no case folding).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    MatchTarget::new(b).ratio(&a)
}

/// Scores a query against every item title. No threshold is applied here.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    titles: Vec<MatchTarget>,
}

impl FuzzyMatcher {
    /// Titles are lower-cased once at build time; row `i` is title `i`.
    pub fn new<S: AsRef<str>>(titles: &[S]) -> Self {
        Self {
            titles: titles
                .iter()
                .map(|t| MatchTarget::new(&t.as_ref().to_lowercase()))
                .collect(),
        }
    }

    /// Scores in `[0, 1]`, aligned with title order.
    pub fn similarity_to_all(&self, query: &str) -> Array1<f64> {
        let query: Vec<char> = query.to_lowercase().chars().collect();
        self.titles.iter().map(|t| t.ratio(&query)).collect()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
