//! Concatenation and length fact index.
//!
//! The host proof engine hands the splitter its current fact set; this index
//! groups concatenation facts by their result term so that non-linear
//! equations (two or more facts sharing a result) are found in O(1), and
//! maps every string term to its length fact.

use crate::ast::{TermId, TermManager};
use rustc_hash::FxHashMap;

/// Ternary relation `result = left · right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConcatFact {
    /// Left operand.
    pub left: TermId,
    /// Right operand.
    pub right: TermId,
    /// Result term.
    pub result: TermId,
}

/// Binary relation `length(string_term) = length_term`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthFact {
    /// The string term.
    pub string_term: TermId,
    /// The integer term carrying its length.
    pub length_term: TermId,
}

/// Index of the current fact set, grouped for the splitting engine.
#[derive(Debug, Default)]
pub struct FactIndex {
    by_result: FxHashMap<TermId, Vec<ConcatFact>>,
    // First-insertion order of distinct result terms, so that selection over
    // groups is deterministic for a fixed seed.
    result_order: Vec<TermId>,
    length_terms: FxHashMap<TermId, TermId>,
}

impl FactIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concatenation fact.
    pub fn add_concat(&mut self, fact: ConcatFact) {
        let group = self.by_result.entry(fact.result).or_default();
        if group.is_empty() {
            self.result_order.push(fact.result);
        }
        group.push(fact);
    }

    /// Register a length fact.
    pub fn add_length(&mut self, fact: LengthFact) {
        self.length_terms.insert(fact.string_term, fact.length_term);
    }

    /// All concatenation facts whose result is `term`.
    pub fn concat_group_of(&self, term: TermId) -> Option<&[ConcatFact]> {
        self.by_result.get(&term).map(|g| g.as_slice())
    }

    /// The first concatenation fact defining `term`, if `term` is itself the
    /// result of some concatenation. Used by the split chooser to descend
    /// into non-atomic chain nodes.
    pub fn concat_of(&self, term: TermId) -> Option<&ConcatFact> {
        self.by_result.get(&term).and_then(|g| g.first())
    }

    /// The integer term carrying the length of `term`, if a length fact for
    /// it was registered.
    pub fn length_term_of(&self, term: TermId) -> Option<TermId> {
        self.length_terms.get(&term).copied()
    }

    /// Result terms in first-insertion order.
    pub fn results(&self) -> &[TermId] {
        &self.result_order
    }

    /// Result terms whose group has at least two members and whose result is
    /// not concrete: the non-linear equations eligible for a Nielsen split.
    pub fn splittable_results(&self, tm: &TermManager) -> Vec<TermId> {
        self.result_order
            .iter()
            .copied()
            .filter(|&r| {
                !tm.is_concrete(r) && self.by_result.get(&r).is_some_and(|g| g.len() >= 2)
            })
            .collect()
    }

    /// Total number of concatenation facts.
    pub fn num_concat_facts(&self) -> usize {
        self.by_result.values().map(|g| g.len()).sum()
    }
}
