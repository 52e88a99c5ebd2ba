//! Transducer compiler.
//!
//! Worklist-driven product construction turning a [`PatternAutomaton`] plus a
//! [`Replacement`] into a prioritized streaming transducer implementing
//! replace-all-with-capture-groups semantics.
//!
//! The dedicated initial state scans: it is always accepting (zero matches so
//! far means the output is an identity copy), prefers a zero-width jump into
//! the pattern start over its any-symbol copy self-loop, and owns the output
//! accumulator. Inside the match product the consumed symbols flow into the
//! capture registers as dictated by the activation/reset metadata; the output
//! register is held until an edge reaches the pattern's accepting state,
//! which substitutes the expanded replacement into the output, clears every
//! capture register, and returns to the initial state to scan for the next
//! match.
//!
//! The pattern-state-to-transducer-state map is memoized, so the worklist is
//! bounded by the pattern's state count; register-update vectors are computed
//! once per `(from, to)` state pair and cached.

use crate::error::{Result, SolverError};
use crate::pattern::{PatternAutomaton, StateId};
use crate::transducer::{
    Guard, Replacement, Transducer, TransducerState, Transition, UpdateOp, UpdateVec,
};
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::collections::VecDeque;

/// Update outcome for one capture register, from the boolean pair
/// (activated entering the target state, reset by a star on the edge).
///
/// The four cases are mutually exclusive and exhaustive.
pub fn capture_update(activated: bool, reset: bool) -> UpdateOp {
    match (activated, reset) {
        (true, true) => UpdateOp::Reset,
        (true, false) => UpdateOp::Extend,
        (false, true) => UpdateOp::Clear,
        (false, false) => UpdateOp::Keep,
    }
}

/// Counters for one compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompilerStats {
    /// Transducer states created (pattern states explored plus the initial).
    pub num_states: usize,
    /// Transitions emitted.
    pub num_transitions: usize,
    /// Distinct `(from, to)` update vectors computed.
    pub cached_update_vectors: usize,
}

/// Compiler for one pattern/replacement pair.
///
/// All state (the worklist, the state map, the update-vector cache) is
/// exclusively owned by one compilation and never shared across calls.
#[derive(Debug)]
pub struct TransducerCompiler<'a> {
    pattern: &'a PatternAutomaton,
    replacement: &'a Replacement,
    states: Vec<TransducerState>,
    state_map: FxHashMap<StateId, StateId>,
    op_cache: FxHashMap<(StateId, StateId), UpdateVec>,
    worklist: VecDeque<StateId>,
    num_registers: usize,
}

const INITIAL: StateId = 0;

impl<'a> TransducerCompiler<'a> {
    /// Set up a compilation.
    pub fn new(pattern: &'a PatternAutomaton, replacement: &'a Replacement) -> Self {
        Self {
            pattern,
            replacement,
            states: Vec::new(),
            state_map: FxHashMap::default(),
            op_cache: FxHashMap::default(),
            worklist: VecDeque::new(),
            num_registers: pattern.num_captures + 1,
        }
    }

    /// Compile `pattern` against `replacement`.
    pub fn compile(pattern: &'a PatternAutomaton, replacement: &'a Replacement) -> Result<Transducer> {
        Ok(Self::new(pattern, replacement).run()?.0)
    }

    /// Run the product construction, returning the transducer and the
    /// compilation counters.
    pub fn run(mut self) -> Result<(Transducer, CompilerStats)> {
        if let Some(max) = self.replacement.max_capture()
            && max >= self.pattern.num_captures
        {
            return Err(SolverError::Internal(format!(
                "dangling capture reference {max} in replacement"
            )));
        }

        let out = self.num_registers - 1;

        // Scanning state: accepting with identity output.
        self.states.push(TransducerState {
            accepting: true,
            output: Some(vec![out]),
            transitions: Vec::new(),
        });

        let start = self.transducer_state_of(self.pattern.initial);
        let keep_all: UpdateVec = smallvec![UpdateOp::Keep; self.num_registers];
        let mut copy: UpdateVec = smallvec![UpdateOp::Keep; self.num_registers];
        copy[out] = UpdateOp::Extend;
        self.states[INITIAL].transitions = vec![
            Transition { guard: Guard::Eps, target: start, updates: keep_all },
            Transition { guard: Guard::AnySym, target: INITIAL, updates: copy },
        ];

        while let Some(s) = self.worklist.pop_front() {
            let ts = self.state_map[&s];
            let mut transitions = Vec::new();
            for i in 0..self.pattern.pre[s].len() {
                let to = self.pattern.pre[s][i];
                transitions.push(self.transition(Guard::Eps, s, to));
            }
            for i in 0..self.pattern.labeled[s].len() {
                let (label, to) = self.pattern.labeled[s][i];
                transitions.push(self.transition(Guard::Sym(label), s, to));
            }
            for i in 0..self.pattern.post[s].len() {
                let to = self.pattern.post[s][i];
                transitions.push(self.transition(Guard::Eps, s, to));
            }
            self.states[ts].transitions = transitions;
        }

        let transducer = Transducer {
            states: self.states,
            initial: INITIAL,
            num_registers: self.num_registers,
        };
        let stats = CompilerStats {
            num_states: transducer.num_states(),
            num_transitions: transducer.num_transitions(),
            cached_update_vectors: self.op_cache.len(),
        };
        tracing::debug!(
            states = stats.num_states,
            transitions = stats.num_transitions,
            registers = transducer.num_registers,
            "compiled replace-all transducer"
        );
        Ok((transducer, stats))
    }

    /// The transducer state for a non-accepting pattern state, created and
    /// queued on first sight.
    fn transducer_state_of(&mut self, pattern_state: StateId) -> StateId {
        if let Some(&ts) = self.state_map.get(&pattern_state) {
            return ts;
        }
        let ts = self.states.len();
        self.states.push(TransducerState {
            accepting: false,
            output: None,
            transitions: Vec::new(),
        });
        self.state_map.insert(pattern_state, ts);
        self.worklist.push_back(pattern_state);
        ts
    }

    /// Build one transducer transition for the pattern edge `from -> to`.
    ///
    /// Edges into the pattern's accepting state complete a match: they return
    /// to the scanning state, substitute the replacement into the output
    /// register, and clear every capture register.
    fn transition(&mut self, guard: Guard, from: StateId, to: StateId) -> Transition {
        let updates = self.updates_for(from, to);
        let target = if to == self.pattern.accepting {
            INITIAL
        } else {
            self.transducer_state_of(to)
        };
        Transition { guard, target, updates }
    }

    /// Register-update vector for the pattern edge `from -> to`, cached per
    /// state pair.
    fn updates_for(&mut self, from: StateId, to: StateId) -> UpdateVec {
        if let Some(cached) = self.op_cache.get(&(from, to)) {
            return cached.clone();
        }
        let vector = if to == self.pattern.accepting {
            let mut v: UpdateVec = smallvec![UpdateOp::Clear; self.num_registers];
            v[self.num_registers - 1] = UpdateOp::Subst(self.replacement.clone());
            v
        } else {
            let mut v = UpdateVec::with_capacity(self.num_registers);
            for capture in 0..self.pattern.num_captures {
                let activated = self.pattern.capture_active(to, capture);
                let reset = self.pattern.capture_reset(from, to, capture);
                v.push(capture_update(activated, reset));
            }
            // Matched text lives in the capture registers; the output
            // accumulator is only written when the match completes.
            v.push(UpdateOp::Keep);
            v
        };
        self.op_cache.insert((from, to), vector.clone());
        vector
    }
}
