//! Length oracle.
//!
//! Resolves the length of any string term: concrete literals carry their own
//! length (in characters, matching the rest of the engine), symbolic terms
//! are resolved through their length fact. A symbolic term with no length
//! fact is a precondition breach by the host, not a recoverable condition.

use crate::arith::LengthModel;
use crate::ast::{TermId, TermManager};
use crate::error::{Result, SolverError};
use crate::facts::FactIndex;

/// The integer term carrying the length of `term`.
///
/// Concrete string literals yield a fresh integer literal; symbolic terms
/// yield the integer term of their length fact. Fails with
/// [`SolverError::MissingLengthFact`] when a symbolic term has no length
/// fact.
pub fn length_of(tm: &mut TermManager, index: &FactIndex, term: TermId) -> Result<TermId> {
    if let Some(s) = tm.str_value(term) {
        let n = s.chars().count() as i64;
        return Ok(tm.mk_int(n));
    }
    index
        .length_term_of(term)
        .ok_or(SolverError::MissingLengthFact(term))
}

/// The concrete length of `term` under the given length model.
///
/// Concrete terms are read off directly; symbolic terms go through their
/// length fact and the model's witness value.
pub fn model_length(
    tm: &mut TermManager,
    index: &FactIndex,
    model: &LengthModel,
    term: TermId,
) -> Result<i64> {
    let length_term = length_of(tm, index, term)?;
    if let Some(n) = tm.int_value(length_term) {
        return Ok(n);
    }
    model.evaluate(length_term)
}
