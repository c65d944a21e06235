use crate::common::Fin;
use crate::env::Env;
use std::rc::Rc;

/// Apply an environment throughout a term.
///
/// Implementations must satisfy `t.subst(&Env::identity(n)) == t` and
/// `t.subst(&(f >> g)) == t.subst(f).subst(g)`. Binders should be stored as
/// [`crate::PatBind`]s, which lift the environment past the bound variables
/// on their own.
pub trait Subst<V>: Sized {
    #[must_use]
    fn subst(&self, env: &Env<V>) -> Self;
}

/// A term family with a variable case.
pub trait SubstVar: Subst<Self> + Clone {
    /// Embed an index as a term. Must be injective, and must commute with
    /// shifting.
    fn var(x: Fin) -> Self;
}

impl SubstVar for Fin {
    fn var(x: Fin) -> Self {
        x
    }
}

impl Subst<Fin> for Fin {
    fn subst(&self, env: &Env<Fin>) -> Self {
        env.lookup(*self)
    }
}

impl<V, T: Subst<V>> Subst<V> for Rc<T> {
    fn subst(&self, env: &Env<V>) -> Self {
        Rc::new(T::subst(self, env))
    }
}

impl<V, T: Subst<V>> Subst<V> for Box<T> {
    fn subst(&self, env: &Env<V>) -> Self {
        Box::new(T::subst(self, env))
    }
}

impl<V, T: Subst<V>> Subst<V> for Vec<T> {
    fn subst(&self, env: &Env<V>) -> Self {
        self.iter().map(|t| t.subst(env)).collect()
    }
}

impl<V, T: Subst<V>> Subst<V> for Option<T> {
    fn subst(&self, env: &Env<V>) -> Self {
        self.as_ref().map(|t| t.subst(env))
    }
}

/// Move every free variable of a term in scope `scope` up by `by`.
pub fn shift<V: SubstVar, T: Subst<V>>(term: &T, by: usize, scope: usize) -> T {
    term.subst(&Env::shift(by, scope))
}

/// Reinterpret a term in scope `scope` as a term in scope `scope + by`.
pub fn weaken<V: SubstVar, T: Subst<V>>(term: &T, by: usize, scope: usize) -> T {
    term.subst(&Env::weaken(by, scope))
}
