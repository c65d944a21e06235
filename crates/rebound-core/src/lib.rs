//! Scope-indexed de Bruijn terms without the index bookkeeping.
//!
//! A term family opts in by implementing [`SubstVar`] (how to make a variable)
//! and [`Subst`] (how to push an [`Env`] through a term). Binders are stored
//! as [`Bind`], [`Bind2`] or [`PatBind`] values, which take care of lifting
//! environments under binders and of delaying substitutions until the body is
//! actually needed. Terms that also implement [`Strengthen`] can be moved
//! back into a smaller scope when they do not use some of their variables.

pub mod bind;
pub mod common;
pub mod env;
pub mod pat;
pub mod strengthen;
pub mod subst;

#[cfg(test)]
mod testing;

pub use bind::*;
pub use common::*;
pub use env::*;
pub use pat::*;
pub use strengthen::*;
pub use subst::*;
