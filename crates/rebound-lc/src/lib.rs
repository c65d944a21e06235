//! An untyped lambda calculus with lets and tuples, represented with the
//! scope-indexed binders of `rebound_core`.
//!
//! Terms are parsed with [`parse::parse_term`], printed through their
//! `Display` impl, and reduced by the big-step evaluators in [`eval`] or the
//! steppers in [`step`].

pub mod eval;
pub mod parse;
pub mod print;
pub mod step;
pub mod syntax;

pub use eval::{eval, nf, nf_env, whnf, Error};
pub use parse::parse_term;
pub use print::{dump_term, print_term_to_string};
pub use step::{evaluate, normalize, run_with, step, step_value, EvalConfig};
pub use syntax::{RcTerm, Term, TuplePattern};
