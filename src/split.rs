//! Split chooser: model-guided alignment of two word equations.
//!
//! Given two concatenation facts `lit1: a·b = t` and `lit2: c·d = t` over the
//! same result term, the chooser walks `lit1`'s concatenation chain and finds
//! the atom the boundary induced by `len(c)` falls into under the current
//! length model. The walk is an explicit stack over chain nodes, never deep
//! call recursion, and descends into any node that is itself the result of a
//! concatenation group.
//!
//! The choice is advisory. The model is one witness among many, so the
//! formula builder always pairs the resulting split with a diff-length guard
//! covering the models that disagree with it.

use crate::arith::LengthModel;
use crate::ast::{TermId, TermManager};
use crate::error::{Result, SolverError};
use crate::facts::{ConcatFact, FactIndex};
use crate::oracle::{length_of, model_length};

/// Where, inside one equation's chain, the other equation's boundary falls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    /// Atoms fully consumed to the left of the boundary, in chain order.
    pub left_terms: Vec<TermId>,
    /// Length terms of `left_terms`; their sum is the cumulative left length.
    pub left_len_terms: Vec<TermId>,
    /// The atom the boundary falls into.
    pub pivot: TermId,
    /// Length term of the pivot.
    pub pivot_len_term: TermId,
    /// Atoms after the pivot, in chain order.
    pub right_terms: Vec<TermId>,
}

/// One candidate cut position in a concatenation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionPoint {
    /// The atom at the cut.
    pub atom: TermId,
    /// Atoms before the cut, innermost first (reverse chain order).
    pub left_rev: Vec<TermId>,
    /// Length terms of the atoms before the cut, in chain order.
    pub left_len_terms: Vec<TermId>,
    /// Atoms after the cut, in chain order.
    pub right: Vec<TermId>,
}

/// Flatten one concatenation fact into its chain of atoms.
///
/// Explicit-stack preorder walk; a node that is itself the result of another
/// concatenation group is treated as non-atomic and expanded through its
/// first defining fact. The fact graph is required to be acyclic (host
/// invariant).
pub fn flatten_chain(index: &FactIndex, fact: &ConcatFact) -> Vec<TermId> {
    let mut atoms = Vec::new();
    let mut stack = vec![fact.right, fact.left];
    while let Some(term) = stack.pop() {
        if let Some(sub) = index.concat_of(term) {
            stack.push(sub.right);
            stack.push(sub.left);
        } else {
            atoms.push(term);
        }
    }
    atoms
}

/// Enumerate every cut position of `fact`'s chain.
pub fn decomposition_points(
    tm: &mut TermManager,
    index: &FactIndex,
    fact: &ConcatFact,
) -> Result<Vec<DecompositionPoint>> {
    let atoms = flatten_chain(index, fact);
    let mut points = Vec::with_capacity(atoms.len());
    let mut left_len_terms: Vec<TermId> = Vec::new();
    for (i, &atom) in atoms.iter().enumerate() {
        let mut left_rev: Vec<TermId> = atoms[..i].to_vec();
        left_rev.reverse();
        points.push(DecompositionPoint {
            atom,
            left_rev,
            left_len_terms: left_len_terms.clone(),
            right: atoms[i + 1..].to_vec(),
        });
        left_len_terms.push(length_of(tm, index, atom)?);
    }
    Ok(points)
}

/// Choose the split of `lit1`'s chain induced by `lit2.left`'s length under
/// the model.
///
/// Accumulates atom lengths until the target is reached or overshot; when the
/// target lands exactly on an atom boundary the following atom becomes the
/// pivot (its left half will be empty), and when the target consumes the
/// whole chain the last atom does.
pub fn choose_split(
    tm: &mut TermManager,
    index: &FactIndex,
    model: &LengthModel,
    lit1: &ConcatFact,
    lit2: &ConcatFact,
) -> Result<SplitResult> {
    let target = model_length(tm, index, model, lit2.left)?;
    let atoms = flatten_chain(index, lit1);

    let mut left_terms = Vec::new();
    let mut left_len_terms = Vec::new();
    let mut consumed = 0i64;
    let last = atoms.len() - 1;
    for (i, &atom) in atoms.iter().enumerate() {
        let atom_len = model_length(tm, index, model, atom)?;
        if i < last && consumed + atom_len <= target {
            left_terms.push(atom);
            left_len_terms.push(length_of(tm, index, atom)?);
            consumed += atom_len;
            continue;
        }
        return Ok(SplitResult {
            left_terms,
            left_len_terms,
            pivot: atom,
            pivot_len_term: length_of(tm, index, atom)?,
            right_terms: atoms[i + 1..].to_vec(),
        });
    }
    Err(SolverError::Internal(
        "empty concatenation chain".to_string(),
    ))
}
