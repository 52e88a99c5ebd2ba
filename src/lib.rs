//! String-constraint reasoning engine.
//!
//! Two tightly related subsystems of a string theory solver:
//!
//! - **Word-equation splitting**: the Nielsen transformation applied to
//!   non-linear concatenation equations (`a·b = c·d`), guided by a concrete
//!   length model from an arithmetic oracle. Each invocation yields a case
//!   split that is sound for *all* models: the model-chosen splitting formula
//!   is always paired with a diff-length guard covering the models that
//!   disagree with the guess.
//! - **Transducer compilation**: a worklist product construction turning a
//!   capture-group pattern automaton plus a replacement specification into a
//!   prioritized streaming transducer implementing replace-all semantics,
//!   with one string register per capture group plus an output accumulator.
//!
//! ## Host protocol
//!
//! The surrounding proof engine supplies the current fact set
//! ([`FactIndex`], arithmetic [`LinearConstraint`]s) and an [`ArithSolver`];
//! [`NielsenSplitter::propose`] returns an [`Outcome`]: no action, a
//! contradiction the host must backtrack on, or a list of
//! (formula, retractions) branches the host schedules. The engine is a pure
//! function of (facts, seed); the randomness source is caller-supplied for
//! reproducible runs.
//!
//! ## Example
//!
//! ```
//! use strsolv::{
//!     PatternBuilder, Label, Replacement, ReplaceAtom, TransducerCompiler,
//! };
//!
//! // Pattern (a) with one capture group, replacement "[" + capture + "]".
//! let mut b = PatternBuilder::new();
//! let p0 = b.add_state();
//! let p1 = b.add_state();
//! let p2 = b.add_state();
//! b.set_initial(p0)
//!     .set_accepting(p2)
//!     .add_labeled(p0, Label::Char('a'), p1)
//!     .add_post(p1, p2)
//!     .activate_capture(p1, 0);
//! let pattern = b.build();
//!
//! let replacement = Replacement(vec![
//!     ReplaceAtom::Lit("[".to_string()),
//!     ReplaceAtom::Capture(0),
//!     ReplaceAtom::Lit("]".to_string()),
//! ]);
//! let transducer = TransducerCompiler::compile(&pattern, &replacement).unwrap();
//! assert_eq!(transducer.num_registers, 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod arith;
pub mod ast;
pub mod compile;
pub mod error;
pub mod facts;
pub mod formula;
pub mod nielsen;
pub mod oracle;
pub mod pattern;
pub mod split;
pub mod transducer;

// Word-equation engine exports
pub use arith::{ArithSolver, LengthModel, LinearConstraint, PropagationModelFinder, Relation};
pub use ast::{Formula, TermId, TermKind, TermManager};
pub use error::{Result, SolverError};
pub use facts::{ConcatFact, FactIndex, LengthFact};
pub use formula::{SplitParts, build_split_formulas};
pub use nielsen::{Branch, NielsenSplitter, NielsenStats, Outcome};
pub use oracle::{length_of, model_length};
pub use split::{DecompositionPoint, SplitResult, choose_split, decomposition_points, flatten_chain};

// Transducer compiler exports
pub use compile::{CompilerStats, TransducerCompiler, capture_update};
pub use pattern::{CaptureId, Label, PatternAutomaton, PatternBuilder, StarId, StateId};
pub use transducer::{
    Guard, RegisterId, ReplaceAtom, Replacement, Transducer, TransducerState, Transition,
    UpdateOp, UpdateVec,
};
