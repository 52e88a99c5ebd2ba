//! Prioritized streaming transducer artifact.
//!
//! The compiler's output: a finite-state machine with `num_captures + 1`
//! string registers (the last one is the output accumulator), per-state
//! priority-ordered transitions, and one register-update operation per
//! register per transition. Execution lives in a separate component; this
//! module only defines the artifact.

use crate::pattern::{CaptureId, Label, StateId};
use smallvec::SmallVec;

/// Register index. Registers `0..num_captures` hold capture groups; register
/// `num_captures` is the output accumulator.
pub type RegisterId = usize;

/// One element of a replacement specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceAtom {
    /// Fixed text.
    Lit(String),
    /// Contents of a capture register.
    Capture(CaptureId),
}

/// Replacement specification: the text substituted per match, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replacement(pub Vec<ReplaceAtom>);

impl Replacement {
    /// Replacement consisting of fixed text only.
    pub fn literal(text: &str) -> Self {
        Self(vec![ReplaceAtom::Lit(text.to_string())])
    }

    /// Highest capture index referenced, if any.
    pub fn max_capture(&self) -> Option<CaptureId> {
        self.0
            .iter()
            .filter_map(|a| match a {
                ReplaceAtom::Capture(c) => Some(*c),
                ReplaceAtom::Lit(_) => None,
            })
            .max()
    }
}

/// Update operation applied to one register on one transition.
///
/// "The current symbol" is the symbol consumed by the transition; zero-width
/// transitions contribute the empty string for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOp {
    /// `r := r`, leave unchanged.
    Keep,
    /// `r := r · cur`, extend with the boundary symbol.
    Extend,
    /// `r := cur`, restart from a fresh boundary.
    Reset,
    /// `r := ε`, clear.
    Clear,
    /// `r := r · expand(replacement)`, append the replacement text,
    /// substituting referenced capture registers (pre-update values).
    Subst(Replacement),
}

/// Transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Zero-width: consumes nothing.
    Eps,
    /// Consumes one symbol admitted by the label.
    Sym(Label),
    /// Consumes any one symbol.
    AnySym,
}

/// Register-update vector of a transition, one entry per register.
pub type UpdateVec = SmallVec<[UpdateOp; 4]>;

/// One prioritized transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Guard deciding whether the transition applies.
    pub guard: Guard,
    /// Destination state.
    pub target: StateId,
    /// Per-register updates.
    pub updates: UpdateVec,
}

/// One transducer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransducerState {
    /// Whether a run may stop here at end of input.
    pub accepting: bool,
    /// Output expression on acceptance: concatenation of the named
    /// registers. `None` for non-accepting states.
    pub output: Option<Vec<RegisterId>>,
    /// Outgoing transitions in priority order (first = highest).
    pub transitions: Vec<Transition>,
}

/// Prioritized streaming transducer.
#[derive(Debug, Clone)]
pub struct Transducer {
    /// States indexed by id.
    pub states: Vec<TransducerState>,
    /// Initial (and scanning) state.
    pub initial: StateId,
    /// Total register count, capture registers plus the output accumulator.
    pub num_registers: usize,
}

impl Transducer {
    /// The output accumulator register.
    pub fn output_register(&self) -> RegisterId {
        self.num_registers - 1
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Total number of transitions.
    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }
}
