//! Term arena and formula algebra.
//!
//! Terms are opaque handles ([`TermId`]) into an arena [`TermManager`]. A
//! term is either *concrete* (a string or integer literal) or *symbolic*
//! (an unresolved variable). Constructors are hash-consed: building the
//! same literal or the same named variable twice yields the same handle.
//!
//! [`Formula`] is the structured output language of the splitting engine:
//! conjunctions of concatenation facts, length facts and linear constraints,
//! disjunctions, string equalities, and existential closure over freshly
//! introduced variables.

use crate::arith::{LinearConstraint, Relation};
use crate::facts::{ConcatFact, LengthFact};
use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// Handle to a term stored in a [`TermManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

/// Term payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Symbolic string variable.
    StringVar(String),
    /// Concrete string literal.
    StringLit(String),
    /// Symbolic integer variable.
    IntVar(String),
    /// Concrete integer literal.
    IntLit(i64),
}

/// Arena of hash-consed terms.
#[derive(Debug, Default)]
pub struct TermManager {
    terms: Vec<TermKind>,
    cache: FxHashMap<TermKind, TermId>,
    fresh_counter: u32,
}

impl TermManager {
    /// Create an empty term manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: TermKind) -> TermId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(kind.clone());
        self.cache.insert(kind, id);
        id
    }

    /// Create a symbolic string variable.
    pub fn mk_str_var(&mut self, name: &str) -> TermId {
        self.intern(TermKind::StringVar(name.to_string()))
    }

    /// Create a concrete string literal.
    pub fn mk_str_lit(&mut self, value: &str) -> TermId {
        self.intern(TermKind::StringLit(value.to_string()))
    }

    /// Create a symbolic integer variable.
    pub fn mk_int_var(&mut self, name: &str) -> TermId {
        self.intern(TermKind::IntVar(name.to_string()))
    }

    /// Create a concrete integer literal.
    pub fn mk_int(&mut self, value: i64) -> TermId {
        self.intern(TermKind::IntLit(value))
    }

    /// Create a fresh string variable with a unique generated name.
    pub fn fresh_str_var(&mut self, prefix: &str) -> TermId {
        let name = format!("{}!{}", prefix, self.fresh_counter);
        self.fresh_counter += 1;
        self.intern(TermKind::StringVar(name))
    }

    /// Create a fresh integer variable with a unique generated name.
    pub fn fresh_int_var(&mut self, prefix: &str) -> TermId {
        let name = format!("{}!{}", prefix, self.fresh_counter);
        self.fresh_counter += 1;
        self.intern(TermKind::IntVar(name))
    }

    /// Get the payload of a term.
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.terms[id.0 as usize]
    }

    /// Whether the term carries a known value.
    pub fn is_concrete(&self, id: TermId) -> bool {
        matches!(
            self.kind(id),
            TermKind::StringLit(_) | TermKind::IntLit(_)
        )
    }

    /// The string value, if the term is a string literal.
    pub fn str_value(&self, id: TermId) -> Option<&str> {
        match self.kind(id) {
            TermKind::StringLit(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value, if the term is an integer literal.
    pub fn int_value(&self, id: TermId) -> Option<i64> {
        match self.kind(id) {
            TermKind::IntLit(n) => Some(*n),
            _ => None,
        }
    }

    /// Number of interned terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Compact rendering of a term for trace output.
    pub fn display(&self, id: TermId) -> String {
        match self.kind(id) {
            TermKind::StringVar(n) | TermKind::IntVar(n) => n.clone(),
            TermKind::StringLit(s) => format!("{s:?}"),
            TermKind::IntLit(n) => n.to_string(),
        }
    }
}

/// Structured formula produced by the splitting engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    /// `result = left · right`.
    Concat(ConcatFact),
    /// `length(string_term) = length_term`.
    Length(LengthFact),
    /// Linear arithmetic constraint over integer terms.
    Linear(LinearConstraint),
    /// String equality.
    StrEq(TermId, TermId),
    /// Conjunction.
    And(Vec<Formula>),
    /// Disjunction.
    Or(Vec<Formula>),
    /// Existential closure over freshly introduced variables.
    Exists(Vec<TermId>, Box<Formula>),
}

impl Formula {
    /// Compact rendering for trace output.
    pub fn display(&self, tm: &TermManager) -> String {
        let mut out = String::new();
        self.write(tm, &mut out);
        out
    }

    fn write(&self, tm: &TermManager, out: &mut String) {
        match self {
            Formula::Concat(f) => {
                let _ = write!(
                    out,
                    "{} = {} . {}",
                    tm.display(f.result),
                    tm.display(f.left),
                    tm.display(f.right)
                );
            }
            Formula::Length(f) => {
                let _ = write!(
                    out,
                    "len({}) = {}",
                    tm.display(f.string_term),
                    tm.display(f.length_term)
                );
            }
            Formula::Linear(c) => {
                for (i, (t, coeff)) in c.terms.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" + ");
                    }
                    if *coeff == 1 {
                        out.push_str(&tm.display(*t));
                    } else {
                        let _ = write!(out, "{}*{}", coeff, tm.display(*t));
                    }
                }
                let rel = match c.relation {
                    Relation::Eq => "=",
                    Relation::Le => "<=",
                    Relation::Lt => "<",
                    Relation::Ge => ">=",
                    Relation::Gt => ">",
                };
                let _ = write!(out, " {} {}", rel, c.constant);
            }
            Formula::StrEq(a, b) => {
                let _ = write!(out, "{} = {}", tm.display(*a), tm.display(*b));
            }
            Formula::And(fs) => Self::write_list(tm, fs, " & ", out),
            Formula::Or(fs) => Self::write_list(tm, fs, " | ", out),
            Formula::Exists(vars, body) => {
                out.push_str("exists ");
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&tm.display(*v));
                }
                out.push_str(". ");
                body.write(tm, out);
            }
        }
    }

    fn write_list(tm: &TermManager, fs: &[Formula], sep: &str, out: &mut String) {
        out.push('(');
        for (i, f) in fs.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            f.write(tm, out);
        }
        out.push(')');
    }
}
