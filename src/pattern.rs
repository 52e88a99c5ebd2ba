//! Capture-group pattern automaton.
//!
//! Input artifact of the transducer compiler, produced by an external
//! pattern front end. States carry the set of capture groups active on
//! entry; edges carry the set of Kleene stars that loop back across them,
//! which in turn determines the captures reset on that edge. The automaton
//! is constructed once per pattern compilation and immutable afterward; the
//! compiler trusts its metadata (the producer is the trust boundary).
//!
//! Transitions are partitioned into three classes:
//! - *pre* edges: zero-width, taken before consuming a symbol;
//! - *labeled* edges: consume one input symbol;
//! - *post* edges: zero-width, taken after consuming.
//!
//! Within each class the edge list order is the priority order (first =
//! highest).

use rustc_hash::{FxHashMap, FxHashSet};

/// State identifier.
pub type StateId = usize;

/// Capture-group index.
pub type CaptureId = usize;

/// Kleene-star index.
pub type StarId = usize;

/// Symbol guard of a labeled edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// A specific character.
    Char(char),
    /// Any character (wildcard).
    Any,
}

impl Label {
    /// Whether the label admits the given character.
    pub fn matches(&self, ch: char) -> bool {
        match self {
            Label::Char(c) => *c == ch,
            Label::Any => true,
        }
    }
}

/// Capture-group pattern automaton with its derived maps.
#[derive(Debug, Clone)]
pub struct PatternAutomaton {
    /// Number of states; ids are `0..num_states`.
    pub num_states: usize,
    /// Start state of the pattern.
    pub initial: StateId,
    /// Accepting state ("one full match consumed").
    pub accepting: StateId,
    /// Zero-width pre edges per state, in priority order.
    pub pre: Vec<Vec<StateId>>,
    /// Labeled (symbol-consuming) edges per state, in priority order.
    pub labeled: Vec<Vec<(Label, StateId)>>,
    /// Zero-width post edges per state, in priority order.
    pub post: Vec<Vec<StateId>>,
    /// Captures active on entry to each state.
    pub captures_activated_at: Vec<FxHashSet<CaptureId>>,
    /// Kleene stars looping back across each edge.
    pub stars_reset_on: FxHashMap<(StateId, StateId), FxHashSet<StarId>>,
    /// Captures nested strictly inside each star.
    pub captures_in_star: FxHashMap<StarId, FxHashSet<CaptureId>>,
    /// Number of capture groups of the pattern.
    pub num_captures: usize,
}

impl PatternAutomaton {
    /// Whether `capture` is active on entry to `state`.
    pub fn capture_active(&self, state: StateId, capture: CaptureId) -> bool {
        self.captures_activated_at[state].contains(&capture)
    }

    /// Whether `capture` is reset by some star looping back on the edge
    /// `from -> to`.
    pub fn capture_reset(&self, from: StateId, to: StateId, capture: CaptureId) -> bool {
        let Some(stars) = self.stars_reset_on.get(&(from, to)) else {
            return false;
        };
        stars.iter().any(|star| {
            self.captures_in_star
                .get(star)
                .is_some_and(|caps| caps.contains(&capture))
        })
    }
}

/// Incremental constructor for [`PatternAutomaton`].
#[derive(Debug, Default)]
pub struct PatternBuilder {
    num_states: usize,
    initial: StateId,
    accepting: StateId,
    pre: Vec<Vec<StateId>>,
    labeled: Vec<Vec<(Label, StateId)>>,
    post: Vec<Vec<StateId>>,
    captures_activated_at: Vec<FxHashSet<CaptureId>>,
    stars_reset_on: FxHashMap<(StateId, StateId), FxHashSet<StarId>>,
    captures_in_star: FxHashMap<StarId, FxHashSet<CaptureId>>,
    num_captures: usize,
}

impl PatternBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new state.
    pub fn add_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        self.pre.push(Vec::new());
        self.labeled.push(Vec::new());
        self.post.push(Vec::new());
        self.captures_activated_at.push(FxHashSet::default());
        id
    }

    /// Set the start state.
    pub fn set_initial(&mut self, state: StateId) -> &mut Self {
        self.initial = state;
        self
    }

    /// Set the accepting state.
    pub fn set_accepting(&mut self, state: StateId) -> &mut Self {
        self.accepting = state;
        self
    }

    /// Append a pre edge (priority = registration order).
    pub fn add_pre(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.pre[from].push(to);
        self
    }

    /// Append a labeled edge (priority = registration order).
    pub fn add_labeled(&mut self, from: StateId, label: Label, to: StateId) -> &mut Self {
        self.labeled[from].push((label, to));
        self
    }

    /// Append a post edge (priority = registration order).
    pub fn add_post(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.post[from].push(to);
        self
    }

    /// Mark `capture` active on entry to `state`.
    pub fn activate_capture(&mut self, state: StateId, capture: CaptureId) -> &mut Self {
        self.captures_activated_at[state].insert(capture);
        self.num_captures = self.num_captures.max(capture + 1);
        self
    }

    /// Record that `star` loops back across the edge `from -> to`.
    pub fn reset_star(&mut self, from: StateId, to: StateId, star: StarId) -> &mut Self {
        self.stars_reset_on.entry((from, to)).or_default().insert(star);
        self
    }

    /// Record that `capture` is nested strictly inside `star`.
    pub fn nest_capture(&mut self, star: StarId, capture: CaptureId) -> &mut Self {
        self.captures_in_star.entry(star).or_default().insert(capture);
        self.num_captures = self.num_captures.max(capture + 1);
        self
    }

    /// Finish construction.
    pub fn build(self) -> PatternAutomaton {
        PatternAutomaton {
            num_states: self.num_states,
            initial: self.initial,
            accepting: self.accepting,
            pre: self.pre,
            labeled: self.labeled,
            post: self.post,
            captures_activated_at: self.captures_activated_at,
            stars_reset_on: self.stars_reset_on,
            captures_in_star: self.captures_in_star,
            num_captures: self.num_captures,
        }
    }
}
