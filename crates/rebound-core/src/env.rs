//! Environments: explicit substitutions from one scope to another.
//!
//! An `Env<V>` maps every index of its domain to a `V` living in its
//! codomain. Environments are built lazily out of a handful of primitive
//! constructors and only do work when looked up, so composing them, lifting
//! them under binders, and stacking them inside binders is cheap.

use crate::common::Fin;
use crate::subst::{Subst, SubstVar};
use either::Either;
use std::fmt;
use std::ops::Shr;
use std::rc::Rc;

/// A renaming which inserts `by` fresh variables at position `at`. With
/// `by == 0` this is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Renaming {
    at: usize,
    by: usize,
}

impl Renaming {
    fn apply(self, x: Fin) -> Fin {
        x.shift_from(self.at, self.by)
    }
}

#[derive(Debug)]
enum Repr<V> {
    /// The empty environment.
    Zero,
    /// Identity, shifting, and weakening.
    Rename(Renaming),
    /// A value for index zero, then the rest of the environment.
    Cons(V, Env<V>),
    /// The environment with its first `n` slots removed.
    Drop(usize, Env<V>),
    /// The slots of the first environment followed by the slots of the second.
    Append(Env<V>, Env<V>),
    /// Look up in the first environment, then substitute with the second.
    Compose(Env<V>, Env<V>),
}

/// A substitution from `domain` variables to values in a scope of size
/// `codomain`.
pub struct Env<V> {
    domain: usize,
    codomain: usize,
    repr: Rc<Repr<V>>,
}

impl<V> Clone for Env<V> {
    fn clone(&self) -> Self {
        Env {
            domain: self.domain,
            codomain: self.codomain,
            repr: Rc::clone(&self.repr),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Env<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("domain", &self.domain)
            .field("codomain", &self.codomain)
            .field("repr", &self.repr)
            .finish()
    }
}

impl<V> Env<V> {
    fn from_repr(domain: usize, codomain: usize, repr: Repr<V>) -> Env<V> {
        Env {
            domain,
            codomain,
            repr: Rc::new(repr),
        }
    }

    pub fn domain(&self) -> usize {
        self.domain
    }

    pub fn codomain(&self) -> usize {
        self.codomain
    }

    pub fn is_identity(&self) -> bool {
        matches!(&*self.repr, Repr::Rename(Renaming { by: 0, .. }))
    }

    /// The environment with an empty domain.
    pub fn zero(codomain: usize) -> Env<V> {
        Env::from_repr(0, codomain, Repr::Zero)
    }

    pub fn identity(scope: usize) -> Env<V> {
        Env::from_repr(scope, scope, Repr::Rename(Renaming { at: 0, by: 0 }))
    }

    /// Increment every variable by one.
    pub fn shift1(scope: usize) -> Env<V> {
        Env::shift(1, scope)
    }

    /// Increment every variable by `by`.
    pub fn shift(by: usize, scope: usize) -> Env<V> {
        Env::shift_from(0, by, scope)
    }

    /// Insert `by` variables at position `at` of the scope. Variables below
    /// `at` are untouched.
    pub fn shift_from(at: usize, by: usize, scope: usize) -> Env<V> {
        assert!(
            at <= scope,
            "cannot insert variables at position {at} of a scope of size {scope}"
        );
        let at = if by == 0 { 0 } else { at };
        Env::from_repr(scope, scope + by, Repr::Rename(Renaming { at, by }))
    }

    /// Place every variable in a scope with `by` more variables on top.
    pub fn weaken(by: usize, scope: usize) -> Env<V> {
        Env::shift_from(scope, by, scope)
    }

    /// Extend the environment with a new value for index zero. The existing
    /// slots move up by one.
    #[must_use]
    pub fn cons(self, value: V) -> Env<V> {
        let domain = self.domain + 1;
        let codomain = self.codomain;
        Env::from_repr(domain, codomain, Repr::Cons(value, self))
    }

    /// Concatenate two environments with the same codomain. The slots of
    /// `self` come first.
    #[must_use]
    pub fn append(&self, rest: &Env<V>) -> Env<V> {
        assert_eq!(
            self.codomain, rest.codomain,
            "cannot append environments with codomains {} and {}",
            self.codomain, rest.codomain
        );
        if self.domain == 0 {
            return rest.clone();
        }
        if rest.domain == 0 {
            return self.clone();
        }
        Env::from_repr(
            self.domain + rest.domain,
            self.codomain,
            Repr::Append(self.clone(), rest.clone()),
        )
    }

    /// Compose two environments: first `self`, then `next`.
    #[must_use]
    pub fn compose(&self, next: &Env<V>) -> Env<V> {
        assert_eq!(
            self.codomain, next.domain,
            "cannot compose an environment into scope {} with one from scope {}",
            self.codomain, next.domain
        );
        if self.is_identity() {
            return next.clone();
        }
        if next.is_identity() {
            return self.clone();
        }
        if self.domain == 0 {
            return Env::zero(next.codomain);
        }
        Env::from_repr(
            self.domain,
            next.codomain,
            Repr::Compose(self.clone(), next.clone()),
        )
    }

    /// Everything but the first slot.
    #[must_use]
    pub fn tail(&self) -> Env<V> {
        assert!(self.domain > 0, "tail of an environment with an empty domain");
        match &*self.repr {
            Repr::Cons(_, rest) => rest.clone(),
            Repr::Drop(n, env) => Env::from_repr(
                self.domain - 1,
                self.codomain,
                Repr::Drop(n + 1, env.clone()),
            ),
            _ => Env::from_repr(
                self.domain - 1,
                self.codomain,
                Repr::Drop(1, self.clone()),
            ),
        }
    }
}

impl<V: SubstVar> Env<V> {
    /// Substitute `value` for index zero and lower every other variable by one.
    pub fn singleton(value: V, scope: usize) -> Env<V> {
        Env::identity(scope).cons(value)
    }

    /// Build an environment whose slot `i` holds `values[i]`.
    pub fn from_vec(values: Vec<V>, codomain: usize) -> Env<V> {
        values
            .into_iter()
            .rev()
            .fold(Env::zero(codomain), Env::cons)
    }

    /// Apply the environment to a single index.
    pub fn lookup(&self, x: Fin) -> V {
        assert_eq!(
            x.scope(),
            self.domain,
            "index {x} from a scope of size {} looked up in an environment with domain {}",
            x.scope(),
            self.domain
        );
        match &*self.repr {
            Repr::Zero => unreachable!("the empty environment has no indices"),
            Repr::Rename(renaming) => V::var(renaming.apply(x)),
            Repr::Cons(value, rest) => match x.pred() {
                None => value.clone(),
                Some(y) => rest.lookup(y),
            },
            Repr::Drop(n, env) => env.lookup(x.shift(*n)),
            Repr::Append(first, rest) => match x.split(first.domain) {
                Either::Left(y) => first.lookup(y),
                Either::Right(y) => rest.lookup(y),
            },
            Repr::Compose(first, next) => first.lookup(x).subst(next),
        }
    }

    pub fn head(&self) -> V {
        assert!(self.domain > 0, "head of an environment with an empty domain");
        self.lookup(Fin::new(0, self.domain))
    }

    /// Lift the environment under a binder. The new variable maps to itself,
    /// every other variable is looked up and then shifted past the binder.
    #[must_use]
    pub fn up(&self) -> Env<V> {
        match &*self.repr {
            Repr::Rename(Renaming { at, by }) => Env::from_repr(
                self.domain + 1,
                self.codomain + 1,
                Repr::Rename(Renaming {
                    at: if *by == 0 { 0 } else { at + 1 },
                    by: *by,
                }),
            ),
            _ => self
                .compose(&Env::shift1(self.codomain))
                .cons(V::var(Fin::first(self.codomain))),
        }
    }

    /// Lift the environment under `n` binders.
    #[must_use]
    pub fn up_n(&self, n: usize) -> Env<V> {
        let mut env = self.clone();
        for _ in 0..n {
            env = env.up();
        }
        env
    }

    /// Every slot of the environment, in order.
    pub fn to_vec(&self) -> Vec<V> {
        Fin::all(self.domain).map(|x| self.lookup(x)).collect()
    }
}

impl<V: SubstVar> Subst<V> for Env<V> {
    fn subst(&self, env: &Env<V>) -> Self {
        self.compose(env)
    }
}

impl<'a, 'b, V: SubstVar> Shr<&'b Env<V>> for &'a Env<V> {
    type Output = Env<V>;

    fn shr(self, next: &'b Env<V>) -> Env<V> {
        self.compose(next)
    }
}

/// Environments are equal when they agree on every slot.
impl<V: SubstVar + PartialEq> PartialEq for Env<V> {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
            && self.codomain == other.codomain
            && (Rc::ptr_eq(&self.repr, &other.repr)
                || Fin::all(self.domain).all(|x| self.lookup(x) == other.lookup(x)))
    }
}
