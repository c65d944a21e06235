//! Binders for one and two variables, as pattern binders over the fixed-size
//! patterns [`One`] and [`Two`].

use crate::env::Env;
use crate::pat::{One, PatBind, Two};
use crate::subst::{Subst, SubstVar};

pub type Bind<V, T> = PatBind<V, One, T>;

pub type Bind2<V, T> = PatBind<V, Two, T>;

/// Bind index zero of `body`, a term of scope `scope + 1`.
pub fn bind<V: SubstVar, T>(body: T, scope: usize) -> Bind<V, T> {
    PatBind::new(One, body, scope)
}

/// Bind indices zero and one of `body`, a term of scope `scope + 2`.
pub fn bind2<V: SubstVar, T>(body: T, scope: usize) -> Bind2<V, T> {
    PatBind::new(Two, body, scope)
}

impl<V: SubstVar, T> PatBind<V, One, T> {
    pub fn unbind_with<R>(&self, f: impl FnOnce(&Env<V>, &T) -> R) -> R {
        f(&self.env, &*self.body)
    }

    pub fn instantiate_with<R>(&self, value: V, f: impl FnOnce(&Env<V>, &T) -> R) -> R {
        f(&self.env.clone().cons(value), &*self.body)
    }
}

impl<V: SubstVar, T: Subst<V> + Clone> PatBind<V, One, T> {
    /// Replace the bound variable with `value`.
    pub fn instantiate(&self, value: V) -> T {
        T::subst(&self.body, &self.env.clone().cons(value))
    }

    /// The body, with the bound variable as index zero.
    pub fn unbind(&self) -> T {
        if self.env.is_identity() {
            return T::clone(&self.body);
        }
        T::subst(&self.body, &self.env.up())
    }
}

impl<V: SubstVar, T: Subst<V> + Clone> PatBind<V, Two, T> {
    /// Replace index zero with `v0` and index one with `v1`.
    pub fn instantiate2(&self, v0: V, v1: V) -> T {
        T::subst(&self.body, &self.env.clone().cons(v1).cons(v0))
    }

    pub fn unbind2(&self) -> T {
        if self.env.is_identity() {
            return T::clone(&self.body);
        }
        T::subst(&self.body, &self.env.up().up())
    }
}
