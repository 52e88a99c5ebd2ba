//! Nielsen transform engine.
//!
//! Top-level driver of the word-equation splitter. One invocation performs a
//! single non-terminal decision:
//!
//! 1. filter concatenation groups down to the splittable ones (two or more
//!    members, non-concrete result);
//! 2. pick one group and two distinct member literals uniformly at random
//!    (fairness heuristic, not needed for soundness; the randomness source
//!    is caller-supplied so selection is deterministic for a fixed seed);
//! 3. query the arithmetic oracle for a length model, emitting a
//!    contradiction action when the facts are already unsatisfiable;
//! 4. short-circuit with an empty-string case split when an operand of the
//!    second literal has length 0 under the model;
//! 5. otherwise run the split chooser and formula builder and emit the
//!    two-way case split, retracting the second literal in the splitting
//!    branch.
//!
//! The engine is one-shot: no retries, no caching of the oracle's answer
//! across invocations.

use crate::arith::{ArithSolver, LinearConstraint};
use crate::ast::{Formula, TermManager};
use crate::error::{Result, SolverError};
use crate::facts::{ConcatFact, FactIndex};
use crate::formula::build_split_formulas;
use crate::oracle::{length_of, model_length};
use crate::split::choose_split;
use rand::Rng;

/// One alternative branch of a case split.
#[derive(Debug, Clone)]
pub struct Branch {
    /// Formula the host asserts when taking this branch.
    pub formula: Formula,
    /// Concatenation facts the host retracts when taking this branch.
    pub retractions: Vec<ConcatFact>,
}

/// Result of one splitter invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No splittable equation exists.
    NoAction,
    /// The arithmetic facts are already unsatisfiable; the host must
    /// backtrack.
    Contradiction,
    /// A case split over the given alternative branches.
    Split(Vec<Branch>),
}

/// Counters for one splitter instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NielsenStats {
    /// Total invocations.
    pub proposals: usize,
    /// Invocations that found nothing to split.
    pub no_action: usize,
    /// Contradiction actions emitted.
    pub contradictions: usize,
    /// Empty-operand shortcut splits.
    pub degenerate_splits: usize,
    /// Full Nielsen splits.
    pub full_splits: usize,
}

/// Word-equation splitting engine.
#[derive(Debug, Default)]
pub struct NielsenSplitter {
    stats: NielsenStats,
}

impl NielsenSplitter {
    /// Create a splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> NielsenStats {
        self.stats
    }

    /// Propose a case-split action for the current fact set.
    ///
    /// Pure up to trace output: the outcome is a function of the facts, the
    /// arithmetic constraints, and the state of `rng`.
    pub fn propose<R: Rng + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        index: &FactIndex,
        arith_facts: &[LinearConstraint],
        solver: &mut dyn ArithSolver,
        rng: &mut R,
    ) -> Result<Outcome> {
        self.stats.proposals += 1;

        let splittable = index.splittable_results(tm);
        if splittable.is_empty() {
            self.stats.no_action += 1;
            return Ok(Outcome::NoAction);
        }

        let result = splittable[rng.random_range(0..splittable.len())];
        let group = index
            .concat_group_of(result)
            .ok_or_else(|| SolverError::Internal("splittable group vanished".to_string()))?;
        let i = rng.random_range(0..group.len());
        let j0 = rng.random_range(0..group.len() - 1);
        let j = if j0 >= i { j0 + 1 } else { j0 };
        let lit1 = group[i];
        let lit2 = group[j];

        let Some(model) = solver.find_length_model(arith_facts) else {
            self.stats.contradictions += 1;
            tracing::debug!("length facts unsatisfiable, emitting contradiction");
            return Ok(Outcome::Contradiction);
        };

        // Degenerate shortcut: an operand of the second literal is empty
        // under the model.
        for operand in [lit2.left, lit2.right] {
            if model_length(tm, index, &model, operand)? == 0 {
                self.stats.degenerate_splits += 1;
                let empty = tm.mk_str_lit("");
                let len_term = length_of(tm, index, operand)?;
                let is_empty = Formula::And(vec![
                    Formula::StrEq(operand, empty),
                    Formula::Linear(LinearConstraint::eq_const(len_term, 0)),
                ]);
                let is_nonempty = Formula::Linear(LinearConstraint::positive(len_term));
                tracing::debug!(
                    operand = %tm.display(operand),
                    "degenerate split: operand empty under model"
                );
                return Ok(Outcome::Split(vec![
                    Branch { formula: is_empty, retractions: Vec::new() },
                    Branch { formula: is_nonempty, retractions: Vec::new() },
                ]));
            }
        }

        let split = choose_split(tm, index, &model, &lit1, &lit2)?;
        let parts = build_split_formulas(tm, index, &split, &lit2)?;
        self.stats.full_splits += 1;
        tracing::debug!(
            pivot = %tm.display(split.pivot),
            splitting = %parts.splitting.display(tm),
            guard = %parts.guard.display(tm),
            "nielsen split"
        );
        Ok(Outcome::Split(vec![
            Branch { formula: parts.splitting, retractions: vec![lit2] },
            Branch { formula: parts.guard, retractions: Vec::new() },
        ]))
    }
}
