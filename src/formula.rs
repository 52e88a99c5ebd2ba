//! Split formula builder.
//!
//! Turns a chosen [`SplitResult`] into the two branches of a case split:
//!
//! - the *splitting formula*, which introduces fresh halves of the pivot
//!   term, equates the pivot with their concatenation
//!   (`pivot = left_half · right_half`), and reassembles
//!   `left_terms ++ [left_half] = lit2.left` and
//!   `[right_half] ++ right_terms = lit2.right` through fresh intermediate
//!   concatenation results, each fresh string paired with a non-negative
//!   length variable and tied to its parts by additive length constraints,
//!   the whole formula existentially closed;
//! - the *diff-length guard* `splitLen < leftLen ∨ splitLen > leftLen +
//!   len(pivot)`, true exactly when the model-chosen boundary is inconsistent
//!   with the equation, so the case split stays sound when the heuristic
//!   guess was wrong.
//!
//! Emitted linear constraints mention symbolic terms only: lengths of
//! concrete literals are folded into the constant.

use crate::arith::{LinearConstraint, Relation};
use crate::ast::{Formula, TermId, TermManager};
use crate::error::Result;
use crate::facts::{ConcatFact, FactIndex, LengthFact};
use crate::oracle::length_of;
use crate::split::SplitResult;

/// The two formulas of a Nielsen case split, plus the variables the
/// splitting formula quantifies over.
#[derive(Debug, Clone)]
pub struct SplitParts {
    /// Existentially closed reassembly of the equation through the split.
    pub splitting: Formula,
    /// Disjunctive guard covering models that disagree with the split point.
    pub guard: Formula,
    /// Freshly introduced variables (strings and their lengths).
    pub fresh: Vec<TermId>,
}

/// Build the splitting formula and diff-length guard for a chosen split.
pub fn build_split_formulas(
    tm: &mut TermManager,
    index: &FactIndex,
    split: &SplitResult,
    lit2: &ConcatFact,
) -> Result<SplitParts> {
    let mut fresh = Vec::new();
    let mut conjuncts = Vec::new();

    let (pivot_l, len_pl) = fresh_string(tm, &mut fresh, &mut conjuncts);
    let (pivot_r, len_pr) = fresh_string(tm, &mut fresh, &mut conjuncts);
    // The pivot is the concatenation of its halves; this is what makes the
    // retraction of lit2 sound.
    conjuncts.push(Formula::Concat(ConcatFact {
        left: pivot_l,
        right: pivot_r,
        result: split.pivot,
    }));
    conjuncts.push(Formula::Linear(linear(
        tm,
        &[(len_pl, 1), (len_pr, 1), (split.pivot_len_term, -1)],
        Relation::Eq,
        0,
    )));

    // left_terms ++ [left_half] = lit2.left
    let mut left_chain: Vec<(TermId, TermId)> = split
        .left_terms
        .iter()
        .copied()
        .zip(split.left_len_terms.iter().copied())
        .collect();
    left_chain.push((pivot_l, len_pl));
    let left_target_len = length_of(tm, index, lit2.left)?;
    fold_chain(tm, &mut fresh, &mut conjuncts, &left_chain, lit2.left, left_target_len);

    // [right_half] ++ right_terms = lit2.right
    let mut right_chain = vec![(pivot_r, len_pr)];
    for &term in &split.right_terms {
        let len = length_of(tm, index, term)?;
        right_chain.push((term, len));
    }
    let right_target_len = length_of(tm, index, lit2.right)?;
    fold_chain(tm, &mut fresh, &mut conjuncts, &right_chain, lit2.right, right_target_len);

    let splitting = Formula::Exists(fresh.clone(), Box::new(Formula::And(conjuncts)));

    // splitLen < leftLen  |  splitLen > leftLen + len(pivot)
    let split_len = left_target_len;
    let mut under_pairs = vec![(split_len, 1)];
    for &l in &split.left_len_terms {
        under_pairs.push((l, -1));
    }
    let mut over_pairs = under_pairs.clone();
    over_pairs.push((split.pivot_len_term, -1));
    let guard = Formula::Or(vec![
        Formula::Linear(linear(tm, &under_pairs, Relation::Lt, 0)),
        Formula::Linear(linear(tm, &over_pairs, Relation::Gt, 0)),
    ]);

    Ok(SplitParts { splitting, guard, fresh })
}

/// Introduce a fresh string variable with a companion length variable, its
/// length fact, and the non-negativity constraint.
fn fresh_string(
    tm: &mut TermManager,
    fresh: &mut Vec<TermId>,
    conjuncts: &mut Vec<Formula>,
) -> (TermId, TermId) {
    let s = tm.fresh_str_var("w");
    let l = tm.fresh_int_var("len_w");
    fresh.push(s);
    fresh.push(l);
    conjuncts.push(Formula::Length(LengthFact { string_term: s, length_term: l }));
    conjuncts.push(Formula::Linear(LinearConstraint::nonneg(l)));
    (s, l)
}

/// Linear constraint over the given summands, folding the lengths of
/// concrete terms into the constant.
fn linear(
    tm: &TermManager,
    pairs: &[(TermId, i64)],
    relation: Relation,
    constant: i64,
) -> LinearConstraint {
    let mut terms = Vec::new();
    let mut constant = constant;
    for &(t, coeff) in pairs {
        match tm.int_value(t) {
            Some(n) => constant -= coeff * n,
            None => terms.push((t, coeff)),
        }
    }
    LinearConstraint { terms, relation, constant }
}

/// Reassemble `chain` into `target` by left-folding, introducing a fresh
/// intermediate result for every internal node and tying lengths additively.
fn fold_chain(
    tm: &mut TermManager,
    fresh: &mut Vec<TermId>,
    conjuncts: &mut Vec<Formula>,
    chain: &[(TermId, TermId)],
    target: TermId,
    target_len: TermId,
) {
    if chain.len() == 1 {
        let (term, len) = chain[0];
        conjuncts.push(Formula::StrEq(term, target));
        conjuncts.push(Formula::Linear(linear(
            tm,
            &[(len, 1), (target_len, -1)],
            Relation::Eq,
            0,
        )));
        return;
    }

    let (mut acc, mut acc_len) = chain[0];
    for (i, &(term, len)) in chain.iter().enumerate().skip(1) {
        let (result, result_len) = if i + 1 == chain.len() {
            (target, target_len)
        } else {
            fresh_string(tm, fresh, conjuncts)
        };
        conjuncts.push(Formula::Concat(ConcatFact {
            left: acc,
            right: term,
            result,
        }));
        conjuncts.push(Formula::Linear(linear(
            tm,
            &[(acc_len, 1), (len, 1), (result_len, -1)],
            Relation::Eq,
            0,
        )));
        acc = result;
        acc_len = result_len;
    }
}
