//! Line diff engine: longest-common-block alignment plus a character-level
//! similarity ratio.
//!
//! Alignment works like Ratcliff/Obershelp: find the longest run of lines
//! common to both inputs, keep it as `unchanged`, then repeat on the region
//! before it and the region after it. Gaps with no common line become
//! `removed` lines followed by `added` lines. The result is readable for
//! mostly-similar documents but is not guaranteed to be a minimal edit script.
//!
//! Everything here is pure and total: any two strings, including empty ones,
//! produce a result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default cap on classified lines returned to callers.
pub const DEFAULT_MAX_LINES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Unchanged,
    Removed,
    Added,
}

/// One classified line. `text` keeps its original terminator, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: LineKind,
    #[serde(rename = "content")]
    pub text: String,
}

impl DiffLine {
    fn new(kind: LineKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Output of `diff_and_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDiff {
    /// At most `max_lines` entries, a prefix of the full diff.
    pub lines: Vec<DiffLine>,
    /// Number of classified lines before truncation.
    pub total_lines: usize,
    /// 0.0 to 100.0, two decimals.
    pub similarity_percentage: f64,
}

impl TextDiff {
    pub fn is_truncated(&self) -> bool {
        self.total_lines > self.lines.len()
    }
}

/// Diffs two texts line by line and scores their similarity.
///
/// Similarity is computed over the full diff; only the returned `lines`
/// are truncated to `max_lines`.
pub fn diff_and_score(text1: &str, text2: &str, max_lines: usize) -> TextDiff {
    let mut lines = diff_lines(text1, text2);

    let matched_chars: usize = lines
        .iter()
        .filter(|l| l.kind == LineKind::Unchanged)
        .map(|l| l.text.chars().count())
        .sum();
    let total_chars = text1.chars().count() + text2.chars().count();

    let total_lines = lines.len();
    lines.truncate(max_lines);

    TextDiff {
        lines,
        total_lines,
        similarity_percentage: similarity_percentage(matched_chars, total_chars),
    }
}

/// Full, untruncated classified diff.
pub fn diff_lines(text1: &str, text2: &str) -> Vec<DiffLine> {
    let a = split_lines(text1);
    let b = split_lines(text2);

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);

    for block in matching_blocks(&a, &b) {
        emit_gap(&mut out, &a[i..block.a], &b[j..block.b]);
        out.extend(
            a[block.a..block.a + block.size]
                .iter()
                .map(|line| DiffLine::new(LineKind::Unchanged, line)),
        );
        i = block.a + block.size;
        j = block.b + block.size;
    }
    emit_gap(&mut out, &a[i..], &b[j..]);

    out
}

/// `200 * matched / total`, rounded half-up to two decimals.
///
/// `matched_chars` counts each unchanged line once; the factor of two
/// accounts for it appearing in both texts. Two empty texts are identical.
pub fn similarity_percentage(matched_chars: usize, total_chars: usize) -> f64 {
    if total_chars == 0 {
        return 100.0;
    }
    // hundredths = floor(20000 * M / T + 1/2), kept in integers
    let m = matched_chars as u128;
    let t = total_chars as u128;
    let hundredths = (40_000 * m + t) / (2 * t);
    hundredths as f64 / 100.0
}

/// Splits into lines, keeping terminators attached.
///
/// Terminators are the Unicode line boundaries: `\n`, `\r\n`, `\r`, vertical
/// tab, form feed, the file/group/record separators, NEL, and the line and
/// paragraph separators.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        if c == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
            end += 1;
        }
        lines.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn emit_gap(out: &mut Vec<DiffLine>, removed: &[&str], added: &[&str]) {
    out.extend(removed.iter().map(|l| DiffLine::new(LineKind::Removed, l)));
    out.extend(added.iter().map(|l| DiffLine::new(LineKind::Added, l)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// All aligned blocks, ordered by position (increasing in both sequences).
fn matching_blocks(a: &[&str], b: &[&str]) -> Vec<Block> {
    let mut b_index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, line) in b.iter().enumerate() {
        b_index.entry(*line).or_default().push(j);
    }

    let mut blocks = Vec::new();
    // Explicit stack instead of recursion; regions are disjoint so the
    // visiting order does not affect the final (sorted) result.
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let block = longest_block(a, &b_index, alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        if alo < block.a && blo < block.b {
            pending.push((alo, block.a, blo, block.b));
        }
        let (a_end, b_end) = (block.a + block.size, block.b + block.size);
        if a_end < ahi && b_end < bhi {
            pending.push((a_end, ahi, b_end, bhi));
        }
        blocks.push(block);
    }

    blocks.sort_unstable_by_key(|blk| (blk.a, blk.b));
    blocks
}

/// Longest run with `a[i..i+k] == b[j..j+k]` inside `a[alo..ahi]`, `b[blo..bhi]`.
/// Ties go to the smallest `i`, then the smallest `j`.
fn longest_block(
    a: &[&str],
    b_index: &HashMap<&str, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Block {
    let mut best = Block {
        a: alo,
        b: blo,
        size: 0,
    };
    // run_len[j] = length of the common run ending at (i - 1, j)
    let mut run_len: HashMap<usize, usize> = HashMap::new();

    for (i, line) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run_len = HashMap::new();
        if let Some(positions) = b_index.get(line) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_len.insert(j, k);
                if k > best.size {
                    best = Block {
                        a: i + 1 - k,
                        b: j + 1 - k,
                        size: k,
                    };
                }
            }
        }
        run_len = next_run_len;
    }

    best
}
