//! Word-level diff between an original sentence and its refined form.
//!
//! Both sentences are split on whitespace and aligned with the classic
//! matching-block opcode diff:
//!
//! 1. Find the longest run of equal words inside the current window. Ties go
//!    to the run that starts earliest in the original, then earliest in the
//!    refined sequence.
//! 2. Recurse into the windows left and right of that run.
//! 3. Merge adjacent blocks, then walk the gaps between blocks to emit
//!    `replace`, `delete`, or `insert` opcodes, with `equal` opcodes for the
//!    blocks themselves.
//!
//! The output always covers both word sequences end to end, so the
//! `refined_text` of each opcode, concatenated in order, reproduces the
//! refined words exactly. Identical non-empty inputs produce a single `equal`
//! opcode; two empty inputs produce no opcodes.

use std::collections::HashMap;

use crate::model::{DiffKind, DiffOp, MissType};

/// Result of analysing one (original, grammar-corrected, refined) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub miss_type: MissType,
    pub diff_details: Vec<DiffOp>,
}

/// Classify which stage changed the sentence.
pub fn classify(original: &str, lt_corrected: &str, llm_refined: &str) -> MissType {
    if original != lt_corrected {
        MissType::LtCorrected
    } else if original != llm_refined {
        MissType::LtMissedAndLlmRefined
    } else {
        MissType::None
    }
}

/// Classify the triple and diff the original against the final refined text.
pub fn analyze(original: &str, lt_corrected: &str, llm_refined: &str) -> Analysis {
    Analysis {
        miss_type: classify(original, lt_corrected, llm_refined),
        diff_details: diff(original, llm_refined),
    }
}

/// Compute word-level opcodes transforming `original` into `refined`.
pub fn diff(original: &str, refined: &str) -> Vec<DiffOp> {
    let a: Vec<&str> = original.split_whitespace().collect();
    let b: Vec<&str> = refined.split_whitespace().collect();

    Matcher::new(&a, &b)
        .opcodes()
        .into_iter()
        .map(|(kind, i1, i2, j1, j2)| DiffOp {
            kind,
            original_span: i1..i2,
            refined_span: j1..j2,
            original_text: a[i1..i2].join(" "),
            refined_text: b[j1..j2].join(" "),
        })
        .collect()
}

type Block = (usize, usize, usize);
type Opcode = (DiffKind, usize, usize, usize, usize);

struct Matcher<'s, 'w> {
    a: &'s [&'w str],
    b: &'s [&'w str],
    /// Word -> ascending positions in `b`.
    b2j: HashMap<&'w str, Vec<usize>>,
}

impl<'s, 'w> Matcher<'s, 'w> {
    fn new(a: &'s [&'w str], b: &'s [&'w str]) -> Self {
        let mut b2j: HashMap<&'w str, Vec<usize>> = HashMap::new();
        for (j, word) in b.iter().enumerate() {
            b2j.entry(*word).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest equal run in `a[alo..ahi]` / `b[blo..bhi]` as `(i, j, size)`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best: Block = (alo, blo, 0);
        // j -> length of the run ending at (i - 1, j)
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(self.a[i]) {
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
                    next.insert(j, k);
                    if k > best.2 {
                        best = (i + 1 - k, j + 1 - k, k);
                    }
                }
            }
            j2len = next;
        }
        best
    }

    /// Matching blocks in ascending order, terminated by `(len(a), len(b), 0)`.
    fn matching_blocks(&self) -> Vec<Block> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks: Vec<Block> = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            blocks.push((i, j, k));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort_unstable();

        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len() + 1);
        let (mut i1, mut j1, mut k1) = (0, 0, 0);
        for (i2, j2, k2) in blocks {
            if i1 + k1 == i2 && j1 + k1 == j2 {
                k1 += k2;
            } else {
                if k1 > 0 {
                    merged.push((i1, j1, k1));
                }
                (i1, j1, k1) = (i2, j2, k2);
            }
        }
        if k1 > 0 {
            merged.push((i1, j1, k1));
        }
        merged.push((la, lb, 0));
        merged
    }

    fn opcodes(&self) -> Vec<Opcode> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);

        for (ai, bj, size) in self.matching_blocks() {
            let kind = if i < ai && j < bj {
                Some(DiffKind::Replace)
            } else if i < ai {
                Some(DiffKind::Delete)
            } else if j < bj {
                Some(DiffKind::Insert)
            } else {
                None
            };
            if let Some(kind) = kind {
                ops.push((kind, i, ai, j, bj));
            }
            (i, j) = (ai + size, bj + size);
            if size > 0 {
                ops.push((DiffKind::Equal, ai, i, bj, j));
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(ops: &[DiffOp]) -> Vec<DiffKind> {
        ops.iter().map(|op| op.kind).collect()
    }

    fn changes(ops: &[DiffOp]) -> Vec<&DiffOp> {
        ops.iter().filter(|op| op.kind != DiffKind::Equal).collect()
    }

    #[test]
    fn single_word_replacement() {
        let ops = diff("a b c", "a x c");
        let changed = changes(&ops);
        assert_eq!(changed.len(), 1);
        let op = changed[0];
        assert_eq!(op.kind, DiffKind::Replace);
        assert_eq!(op.original_span, 1..2);
        assert_eq!(op.refined_span, 1..2);
        assert_eq!(op.original_text, "b");
        assert_eq!(op.refined_text, "x");
    }

    #[test]
    fn full_opcode_sequence() {
        let ops = diff("the quick brown fox", "the slow brown dog jumps");
        assert_eq!(
            kinds(&ops),
            vec![
                DiffKind::Equal,
                DiffKind::Replace,
                DiffKind::Equal,
                DiffKind::Replace
            ]
        );
        assert_eq!(ops[3].original_span, 3..4);
        assert_eq!(ops[3].refined_span, 3..5);
        assert_eq!(ops[3].refined_text, "dog jumps");
    }

    #[test]
    fn deletion_prefers_longest_run() {
        let ops = diff("I really want it", "I want it");
        assert_eq!(
            kinds(&ops),
            vec![DiffKind::Equal, DiffKind::Delete, DiffKind::Equal]
        );
        assert_eq!(ops[1].original_span, 1..2);
        assert_eq!(ops[1].refined_span, 1..1);
        assert_eq!(ops[1].original_text, "really");
        assert_eq!(ops[1].refined_text, "");
    }

    #[test]
    fn insertion_between_words() {
        let ops = diff("He goes school", "He goes to school");
        let changed = changes(&ops);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].kind, DiffKind::Insert);
        assert_eq!(changed[0].original_span, 2..2);
        assert_eq!(changed[0].refined_span, 2..3);
        assert_eq!(changed[0].refined_text, "to");
    }

    #[test]
    fn empty_original_is_all_insert() {
        let ops = diff("", "hello there");
        assert_eq!(kinds(&ops), vec![DiffKind::Insert]);
        assert_eq!(ops[0].refined_span, 0..2);
    }

    #[test]
    fn empty_refined_is_all_delete() {
        let ops = diff("hello there", "   ");
        assert_eq!(kinds(&ops), vec![DiffKind::Delete]);
        assert_eq!(ops[0].original_span, 0..2);
    }

    #[test]
    fn identical_is_single_equal() {
        let ops = diff("He goes to school", "He goes to school");
        assert_eq!(kinds(&ops), vec![DiffKind::Equal]);
        assert_eq!(ops[0].original_span, 0..4);
    }

    #[test]
    fn both_empty_is_no_ops() {
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn whitespace_runs_are_ignored() {
        let ops = diff("a  b\tc", "a b c");
        assert_eq!(kinds(&ops), vec![DiffKind::Equal]);
    }

    #[test]
    fn repeated_words_are_deterministic() {
        let first = diff("the cat the dog the end", "the dog the cat the end the");
        for _ in 0..20 {
            assert_eq!(
                diff("the cat the dog the end", "the dog the cat the end the"),
                first
            );
        }
    }

    /// Rebuild the refined word sequence from a full opcode list.
    fn reconstruct_refined(ops: &[DiffOp]) -> Vec<String> {
        ops.iter()
            .flat_map(|op| op.refined_text.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn reconstructs_refined_words() {
        let pairs = [
            ("a b c", "a x c"),
            ("", "one two"),
            ("one two", ""),
            ("I want one babies", "I want one baby"),
            ("He go to school", "He goes to school every day"),
            ("the the the", "the a the b the"),
            ("x y z", "z y x"),
        ];
        for (original, refined) in pairs {
            let ops = diff(original, refined);
            let expected: Vec<String> =
                refined.split_whitespace().map(str::to_string).collect();
            assert_eq!(reconstruct_refined(&ops), expected, "{original:?} -> {refined:?}");

            let rebuilt_original: Vec<&str> = ops
                .iter()
                .flat_map(|op| op.original_text.split_whitespace())
                .collect();
            let expected_original: Vec<&str> = original.split_whitespace().collect();
            assert_eq!(rebuilt_original, expected_original);
        }
    }

    #[test]
    fn spans_are_contiguous() {
        let ops = diff("a b c d e", "a c x d f g");
        let (mut i, mut j) = (0, 0);
        for op in &ops {
            assert_eq!(op.original_span.start, i);
            assert_eq!(op.refined_span.start, j);
            i = op.original_span.end;
            j = op.refined_span.end;
        }
        assert_eq!((i, j), (5, 6));
    }

    #[test]
    fn classify_grammar_change_wins() {
        assert_eq!(
            classify("He go to school", "He goes to school", "He goes to school"),
            MissType::LtCorrected
        );
        assert_eq!(
            classify("He go to school", "He goes to school", "He go to school"),
            MissType::LtCorrected
        );
    }

    #[test]
    fn classify_llm_only_change() {
        assert_eq!(
            classify("I has a idea", "I has a idea", "I have an idea"),
            MissType::LtMissedAndLlmRefined
        );
    }

    #[test]
    fn classify_no_change() {
        assert_eq!(classify("Fine.", "Fine.", "Fine."), MissType::None);
        assert_eq!(classify("", "", ""), MissType::None);
    }

    #[test]
    fn analyze_diffs_original_against_refined() {
        let analysis = analyze("He go to school", "He goes to school", "He goes to school");
        assert_eq!(analysis.miss_type, MissType::LtCorrected);
        let changed = changes(&analysis.diff_details);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].original_text, "go");
        assert_eq!(changed[0].refined_text, "goes");
    }
}
