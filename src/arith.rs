//! Linear arithmetic constraints, length models, and the arithmetic oracle
//! boundary.
//!
//! The splitting engine never decides arithmetic itself. It hands the current
//! conjunction of [`LinearConstraint`]s to an [`ArithSolver`] (one blocking
//! query per invocation, the result never cached) and gets back either a
//! [`LengthModel`] witness or "unsatisfiable". The witness is advisory: it
//! guides the choice of a split point, while the emitted guard formula keeps
//! the case split sound for every other model.
//!
//! [`PropagationModelFinder`] is an in-tree solver for the concat-length
//! fragment: it pins exact values through equalities with one unknown,
//! tightens bounds through unit-coefficient inequalities with at most one
//! unknown, and completes the remaining variables from their lower bounds.
//! Constraints with two or more unknown summands are outside the propagated
//! fragment and are not enforced by the witness. Unsatisfiability is reported
//! only when a conflict is actually forced, so a weak witness can never turn
//! a satisfiable fact set into a contradiction.

use crate::ast::TermId;
use crate::error::{Result, SolverError};
use rustc_hash::{FxHashMap, FxHashSet};

/// Comparison relation of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Equal.
    Eq,
    /// Less than or equal.
    Le,
    /// Strictly less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Strictly greater than.
    Gt,
}

/// Linear constraint `sum(coeff * term) REL constant` over integer terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    /// Summands as (term, coefficient) pairs.
    pub terms: Vec<(TermId, i64)>,
    /// Comparison relation.
    pub relation: Relation,
    /// Right-hand constant.
    pub constant: i64,
}

impl LinearConstraint {
    /// `term = value`.
    pub fn eq_const(term: TermId, value: i64) -> Self {
        Self {
            terms: vec![(term, 1)],
            relation: Relation::Eq,
            constant: value,
        }
    }

    /// `term >= 0`.
    pub fn nonneg(term: TermId) -> Self {
        Self {
            terms: vec![(term, 1)],
            relation: Relation::Ge,
            constant: 0,
        }
    }

    /// `term > 0`.
    pub fn positive(term: TermId) -> Self {
        Self {
            terms: vec![(term, 1)],
            relation: Relation::Gt,
            constant: 0,
        }
    }

    /// Length additivity `left + right = result` for a concatenation.
    pub fn additivity(left: TermId, right: TermId, result: TermId) -> Self {
        Self {
            terms: vec![(left, 1), (right, 1), (result, -1)],
            relation: Relation::Eq,
            constant: 0,
        }
    }

    /// Evaluate the constraint under a total assignment. Returns `None` if
    /// some summand has no value.
    pub fn eval(&self, assignment: &FxHashMap<TermId, i64>) -> Option<bool> {
        let mut sum = 0i64;
        for (t, c) in &self.terms {
            sum += c * assignment.get(t)?;
        }
        Some(match self.relation {
            Relation::Eq => sum == self.constant,
            Relation::Le => sum <= self.constant,
            Relation::Lt => sum < self.constant,
            Relation::Ge => sum >= self.constant,
            Relation::Gt => sum > self.constant,
        })
    }
}

/// Concrete integer witness for the lengths of string terms.
///
/// Stored as its defining equality constraints. [`LengthModel::evaluate`]
/// performs the reduction of §length-oracle: the model must resolve a length
/// term to exactly one defining equality, otherwise the totality precondition
/// has been violated by the producer.
#[derive(Debug, Clone, Default)]
pub struct LengthModel {
    defining: Vec<LinearConstraint>,
}

impl LengthModel {
    /// Build a model from explicit assignments.
    pub fn from_assignments(assignments: &[(TermId, i64)]) -> Self {
        Self {
            defining: assignments
                .iter()
                .map(|&(t, v)| LinearConstraint::eq_const(t, v))
                .collect(),
        }
    }

    /// The defining constraints of the witness.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.defining
    }

    /// Extract the witness value of a length term.
    ///
    /// Contract: the model is total over all length terms, so the reduction
    /// must yield exactly one value. Zero or several distinct values is a
    /// fatal invariant breach, reported as
    /// [`SolverError::AmbiguousLengthModel`].
    pub fn evaluate(&self, length_term: TermId) -> Result<i64> {
        let mut value: Option<i64> = None;
        for c in &self.defining {
            if c.relation != Relation::Eq || c.terms.len() != 1 {
                continue;
            }
            let (t, coeff) = c.terms[0];
            if t != length_term || coeff == 0 || c.constant % coeff != 0 {
                continue;
            }
            let v = c.constant / coeff;
            match value {
                None => value = Some(v),
                Some(prev) if prev != v => {
                    return Err(SolverError::AmbiguousLengthModel(length_term));
                }
                Some(_) => {}
            }
        }
        value.ok_or(SolverError::AmbiguousLengthModel(length_term))
    }
}

/// External arithmetic oracle.
///
/// One query per splitter invocation: find a witness for the negation of the
/// current arithmetic fact set (i.e. a model of the facts), or report that
/// the facts are already unsatisfiable by returning `None`.
pub trait ArithSolver {
    /// Find a length model consistent with `facts`, or `None` if `facts` are
    /// unsatisfiable.
    fn find_length_model(&mut self, facts: &[LinearConstraint]) -> Option<LengthModel>;
}

/// Bounds-propagation model finder for the concat-length fragment.
///
/// Not a decision procedure: it answers "unsatisfiable" only for conflicts it
/// can force (contradicting exact values, a violated fully-determined
/// constraint, or crossing bounds), and otherwise always produces a witness,
/// completing undetermined variables from their lower bounds. Inequalities
/// with several unknown summands are not propagated, so the witness may
/// violate them; the splitting engine treats every witness as advisory, and
/// a host with a full linear-integer solver can substitute it behind
/// [`ArithSolver`].
#[derive(Debug, Clone)]
pub struct PropagationModelFinder {
    max_rounds: usize,
}

impl Default for PropagationModelFinder {
    fn default() -> Self {
        Self { max_rounds: 64 }
    }
}

impl PropagationModelFinder {
    /// Create a finder with the default round limit.
    pub fn new() -> Self {
        Self::default()
    }

    fn solve(&self, facts: &[LinearConstraint]) -> Option<LengthModel> {
        let mut exact: FxHashMap<TermId, i64> = FxHashMap::default();
        let mut lower: FxHashMap<TermId, i64> = FxHashMap::default();
        let mut upper: FxHashMap<TermId, i64> = FxHashMap::default();
        let mut vars: Vec<TermId> = Vec::new();
        let mut seen: FxHashSet<TermId> = FxHashSet::default();
        for c in facts {
            for (t, _) in &c.terms {
                if seen.insert(*t) {
                    vars.push(*t);
                }
            }
        }

        // Fixpoint: pin variables through equalities with one unknown and
        // tighten bounds through unit-coefficient inequalities with one
        // unknown. Constraints with two or more unknowns are skipped.
        for _ in 0..self.max_rounds {
            let mut changed = false;
            for c in facts {
                let mut known_sum = 0i64;
                let mut unknown: Option<(TermId, i64)> = None;
                let mut num_unknown = 0;
                for &(t, coeff) in &c.terms {
                    if let Some(&v) = exact.get(&t) {
                        known_sum += coeff * v;
                    } else {
                        num_unknown += 1;
                        unknown = Some((t, coeff));
                    }
                }
                match (c.relation, num_unknown) {
                    (_, 0) => {
                        let holds = match c.relation {
                            Relation::Eq => known_sum == c.constant,
                            Relation::Le => known_sum <= c.constant,
                            Relation::Lt => known_sum < c.constant,
                            Relation::Ge => known_sum >= c.constant,
                            Relation::Gt => known_sum > c.constant,
                        };
                        if !holds {
                            return None;
                        }
                    }
                    (Relation::Eq, 1) => {
                        let (t, coeff) = unknown.expect("one unknown");
                        let rem = c.constant - known_sum;
                        if rem % coeff != 0 {
                            return None;
                        }
                        let v = rem / coeff;
                        if let Some(&lo) = lower.get(&t)
                            && v < lo
                        {
                            return None;
                        }
                        if let Some(&hi) = upper.get(&t)
                            && v > hi
                        {
                            return None;
                        }
                        exact.insert(t, v);
                        changed = true;
                    }
                    (relation, 1) => {
                        let (t, coeff) = unknown.expect("one unknown");
                        let rem = c.constant - known_sum;
                        changed |= match (relation, coeff) {
                            (Relation::Ge, 1) => bump_lower(&mut lower, t, rem),
                            (Relation::Gt, 1) => bump_lower(&mut lower, t, rem + 1),
                            (Relation::Le, 1) => bump_upper(&mut upper, t, rem),
                            (Relation::Lt, 1) => bump_upper(&mut upper, t, rem - 1),
                            (Relation::Ge, -1) => bump_upper(&mut upper, t, -rem),
                            (Relation::Gt, -1) => bump_upper(&mut upper, t, -rem - 1),
                            (Relation::Le, -1) => bump_lower(&mut lower, t, -rem),
                            (Relation::Lt, -1) => bump_lower(&mut lower, t, -rem + 1),
                            _ => false,
                        };
                    }
                    _ => {}
                }
            }
            if !changed {
                break;
            }
        }

        // Crossed bounds and pinned values outside their bounds are forced
        // conflicts too.
        for &t in &vars {
            let lo = lower.get(&t).copied();
            let hi = upper.get(&t).copied();
            if let (Some(lo), Some(hi)) = (lo, hi)
                && lo > hi
            {
                return None;
            }
            if let Some(&v) = exact.get(&t)
                && (lo.is_some_and(|lo| v < lo) || hi.is_some_and(|hi| v > hi))
            {
                return None;
            }
        }

        // Complete: undetermined variables take their lower bound (lengths
        // default to 0).
        let mut assignments = Vec::with_capacity(vars.len());
        for &t in &vars {
            let v = exact
                .get(&t)
                .copied()
                .unwrap_or_else(|| lower.get(&t).copied().unwrap_or(0).max(0));
            assignments.push((t, v));
        }
        Some(LengthModel::from_assignments(&assignments))
    }
}

fn bump_lower(lower: &mut FxHashMap<TermId, i64>, t: TermId, v: i64) -> bool {
    match lower.get_mut(&t) {
        Some(e) if v > *e => {
            *e = v;
            true
        }
        Some(_) => false,
        None => {
            lower.insert(t, v);
            true
        }
    }
}

fn bump_upper(upper: &mut FxHashMap<TermId, i64>, t: TermId, v: i64) -> bool {
    match upper.get_mut(&t) {
        Some(e) if v < *e => {
            *e = v;
            true
        }
        Some(_) => false,
        None => {
            upper.insert(t, v);
            true
        }
    }
}

impl ArithSolver for PropagationModelFinder {
    fn find_length_model(&mut self, facts: &[LinearConstraint]) -> Option<LengthModel> {
        self.solve(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: u32) -> TermId {
        TermId(n)
    }

    #[test]
    fn test_model_evaluate_exact() {
        let model = LengthModel::from_assignments(&[(var(0), 3), (var(1), 0)]);
        assert_eq!(model.evaluate(var(0)), Ok(3));
        assert_eq!(model.evaluate(var(1)), Ok(0));
    }

    #[test]
    fn test_model_evaluate_missing_is_contract_breach() {
        let model = LengthModel::from_assignments(&[(var(0), 3)]);
        assert_eq!(
            model.evaluate(var(9)),
            Err(SolverError::AmbiguousLengthModel(var(9)))
        );
    }

    #[test]
    fn test_model_evaluate_conflicting_is_contract_breach() {
        let model = LengthModel {
            defining: vec![
                LinearConstraint::eq_const(var(0), 1),
                LinearConstraint::eq_const(var(0), 2),
            ],
        };
        assert_eq!(
            model.evaluate(var(0)),
            Err(SolverError::AmbiguousLengthModel(var(0)))
        );
    }

    #[test]
    fn test_finder_forward_propagation() {
        let (x, y, t) = (var(0), var(1), var(2));
        let facts = vec![
            LinearConstraint::eq_const(x, 1),
            LinearConstraint::eq_const(y, 2),
            LinearConstraint::additivity(x, y, t),
        ];
        let model = PropagationModelFinder::new()
            .find_length_model(&facts)
            .expect("satisfiable");
        assert_eq!(model.evaluate(t), Ok(3));
    }

    #[test]
    fn test_finder_backward_propagation() {
        let (x, y, t) = (var(0), var(1), var(2));
        let facts = vec![
            LinearConstraint::eq_const(x, 1),
            LinearConstraint::eq_const(t, 3),
            LinearConstraint::additivity(x, y, t),
        ];
        let model = PropagationModelFinder::new()
            .find_length_model(&facts)
            .expect("satisfiable");
        assert_eq!(model.evaluate(y), Ok(2));
    }

    #[test]
    fn test_finder_conflict_is_unsat() {
        let x = var(0);
        let facts = vec![
            LinearConstraint::eq_const(x, 1),
            LinearConstraint::eq_const(x, 2),
        ];
        assert!(PropagationModelFinder::new().find_length_model(&facts).is_none());
    }

    #[test]
    fn test_finder_bound_conflict_is_unsat() {
        let x = var(0);
        let facts = vec![
            LinearConstraint::eq_const(x, 1),
            LinearConstraint {
                terms: vec![(x, 1)],
                relation: Relation::Ge,
                constant: 5,
            },
        ];
        assert!(PropagationModelFinder::new().find_length_model(&facts).is_none());
    }

    #[test]
    fn test_finder_one_unknown_inequality_tightens_bound() {
        let (x, y) = (var(0), var(1));
        let facts = vec![
            LinearConstraint::eq_const(x, 2),
            LinearConstraint {
                terms: vec![(x, 1), (y, 1)],
                relation: Relation::Ge,
                constant: 5,
            },
        ];
        let model = PropagationModelFinder::new()
            .find_length_model(&facts)
            .expect("satisfiable");
        assert_eq!(model.evaluate(y), Ok(3));
    }

    #[test]
    fn test_finder_determined_inequality_conflict_is_unsat() {
        let (x, y) = (var(0), var(1));
        let facts = vec![
            LinearConstraint::eq_const(x, 2),
            LinearConstraint::eq_const(y, 1),
            LinearConstraint {
                terms: vec![(x, 1), (y, 1)],
                relation: Relation::Ge,
                constant: 5,
            },
        ];
        assert!(PropagationModelFinder::new().find_length_model(&facts).is_none());
    }

    #[test]
    fn test_finder_multi_unknown_inequality_still_yields_witness() {
        // Two unknown summands are outside the propagated fragment: the
        // finder never answers unsat for them, and the witness may violate
        // the constraint.
        let (x, y) = (var(0), var(1));
        let facts = vec![LinearConstraint {
            terms: vec![(x, 1), (y, 1)],
            relation: Relation::Ge,
            constant: 5,
        }];
        let model = PropagationModelFinder::new()
            .find_length_model(&facts)
            .expect("witness, not unsat");
        assert_eq!(model.evaluate(x), Ok(0));
        assert_eq!(model.evaluate(y), Ok(0));
    }

    #[test]
    fn test_finder_completes_free_variables() {
        let (x, y) = (var(0), var(1));
        let facts = vec![
            LinearConstraint::nonneg(x),
            LinearConstraint {
                terms: vec![(y, 1)],
                relation: Relation::Ge,
                constant: 4,
            },
        ];
        let model = PropagationModelFinder::new()
            .find_length_model(&facts)
            .expect("satisfiable");
        assert_eq!(model.evaluate(x), Ok(0));
        assert_eq!(model.evaluate(y), Ok(4));
    }

    #[test]
    fn test_constraint_eval() {
        let (x, y) = (var(0), var(1));
        let c = LinearConstraint::additivity(x, y, var(2));
        let mut a = FxHashMap::default();
        a.insert(x, 1);
        a.insert(y, 2);
        a.insert(var(2), 3);
        assert_eq!(c.eval(&a), Some(true));
        a.insert(var(2), 4);
        assert_eq!(c.eval(&a), Some(false));
    }
}
