//! Binders for a group of variables described by a pattern.

use crate::env::Env;
use crate::subst::{Subst, SubstVar};
use std::fmt;
use std::rc::Rc;

/// A value that binds a known number of variables.
pub trait Pattern {
    fn size(&self) -> usize;
}

/// The pattern of a binder for exactly one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct One;

/// The pattern of a binder for exactly two variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Two;

impl Pattern for One {
    fn size(&self) -> usize {
        1
    }
}

impl Pattern for Two {
    fn size(&self) -> usize {
        2
    }
}

impl<V> Subst<V> for One {
    fn subst(&self, _: &Env<V>) -> Self {
        One
    }
}

impl<V> Subst<V> for Two {
    fn subst(&self, _: &Env<V>) -> Self {
        Two
    }
}

/// Independent patterns side by side. None of them can refer to variables
/// bound by the others.
impl<P: Pattern> Pattern for Vec<P> {
    fn size(&self) -> usize {
        self.iter().map(Pattern::size).sum()
    }
}

impl<P: Pattern> Pattern for Rc<P> {
    fn size(&self) -> usize {
        P::size(self)
    }
}

/// A telescope: the variables of `first` are in scope in `rest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rebind<P1, P2> {
    pub first: P1,
    pub rest: P2,
}

impl<P1, P2> Rebind<P1, P2> {
    pub fn new(first: P1, rest: P2) -> Rebind<P1, P2> {
        Rebind { first, rest }
    }
}

impl<P1: Pattern, P2: Pattern> Pattern for Rebind<P1, P2> {
    fn size(&self) -> usize {
        self.first.size() + self.rest.size()
    }
}

impl<V, P1, P2> Subst<V> for Rebind<P1, P2>
where
    V: SubstVar,
    P1: Pattern + Subst<V>,
    P2: Subst<V>,
{
    fn subst(&self, env: &Env<V>) -> Self {
        Rebind {
            first: self.first.subst(env),
            rest: self.rest.subst(&env.up_n(self.first.size())),
        }
    }
}

/// A binder for the variables of a pattern.
///
/// The body lives in a scope of `pattern.size() + n`, where the first
/// `pattern.size()` indices are the bound variables. Substitutions applied to
/// the binder are not pushed into the body: they are composed into the
/// delayed environment and only applied when the binder is opened.
pub struct PatBind<V, P, T> {
    pub(crate) pattern: P,
    pub(crate) env: Env<V>,
    pub(crate) body: Rc<T>,
}

impl<V, P: Clone, T> Clone for PatBind<V, P, T> {
    fn clone(&self) -> Self {
        PatBind {
            pattern: self.pattern.clone(),
            env: self.env.clone(),
            body: Rc::clone(&self.body),
        }
    }
}

impl<V: fmt::Debug, P: fmt::Debug, T: fmt::Debug> fmt::Debug for PatBind<V, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatBind")
            .field("pattern", &self.pattern)
            .field("env", &self.env)
            .field("body", &self.body)
            .finish()
    }
}

impl<V: SubstVar, P: Pattern, T> PatBind<V, P, T> {
    /// Bind the pattern's variables in `body`, a term of scope
    /// `pattern.size() + scope`.
    pub fn new(pattern: P, body: T, scope: usize) -> Self {
        PatBind {
            pattern,
            env: Env::identity(scope),
            body: Rc::new(body),
        }
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    /// The number of bound variables.
    pub fn size(&self) -> usize {
        self.pattern.size()
    }

    /// The scope of the binder itself, not counting the bound variables.
    pub fn scope(&self) -> usize {
        self.env.codomain()
    }

    /// Run `f` on the delayed environment and the raw body. The environment
    /// still has to be lifted over the bound variables before it can be
    /// applied to the body.
    pub fn unbind_all_with<R>(&self, f: impl FnOnce(&P, &Env<V>, &T) -> R) -> R {
        f(&self.pattern, &self.env, &*self.body)
    }

    /// Run `f` on the environment which instantiates the bound variables with
    /// `args`, and the raw body.
    pub fn instantiate_all_with<R>(&self, args: &Env<V>, f: impl FnOnce(&Env<V>, &T) -> R) -> R {
        self.check_args(args);
        f(&args.append(&self.env), &*self.body)
    }

    fn check_args(&self, args: &Env<V>) {
        assert_eq!(
            args.domain(),
            self.size(),
            "a pattern of size {} cannot be instantiated with {} values",
            self.size(),
            args.domain()
        );
        assert_eq!(
            args.codomain(),
            self.scope(),
            "instantiating a binder in scope {} with values from scope {}",
            self.scope(),
            args.codomain()
        );
    }
}

impl<V: SubstVar, P: Pattern, T: Subst<V> + Clone> PatBind<V, P, T> {
    /// Replace every bound variable at once. Slot `i` of `args` replaces
    /// index `i` of the body.
    pub fn instantiate_all(&self, args: &Env<V>) -> T {
        self.check_args(args);
        T::subst(&self.body, &args.append(&self.env))
    }

    /// Push the delayed environment into the body, exposing the bound
    /// variables as the first indices of the result.
    pub fn unbind_all(&self) -> T {
        if self.env.is_identity() {
            return T::clone(&self.body);
        }
        tracing::trace!(
            size = self.size(),
            scope = self.scope(),
            "forcing delayed substitution"
        );
        T::subst(&self.body, &self.env.up_n(self.size()))
    }
}

impl<V, P, T> Subst<V> for PatBind<V, P, T>
where
    V: SubstVar,
    P: Subst<V>,
{
    fn subst(&self, env: &Env<V>) -> Self {
        PatBind {
            pattern: self.pattern.subst(env),
            env: self.env.compose(env),
            body: Rc::clone(&self.body),
        }
    }
}

/// Binders are compared by their patterns and opened bodies, never by the
/// shape of their delayed environments.
impl<V, P, T> PartialEq for PatBind<V, P, T>
where
    V: SubstVar,
    P: Pattern + PartialEq,
    T: Subst<V> + Clone + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.scope() == other.scope()
            && self.pattern == other.pattern
            && self.unbind_all() == other.unbind_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{bind, bind2};
    use crate::testing::{ann, app, arb_env, arb_tm, lit, tele, var, Ann, Tm};
    use proptest::prelude::*;

    #[test]
    fn test_sizes() {
        assert_eq!(One.size(), 1);
        assert_eq!(Two.size(), 2);
        assert_eq!(vec![One, One, One].size(), 3);
        assert_eq!(Rebind::new(Two, vec![One]).size(), 3);
    }

    #[test]
    fn test_instantiate_all() {
        // Body in scope 2 + 1: $0 $1 $2.
        let body = app(app(var(0, 3), var(1, 3)), var(2, 3));
        let b: PatBind<Tm, Two, Tm> = PatBind::new(Two, body, 1);
        let args = Env::from_vec(vec![lit(1), lit(2)], 1);
        assert_eq!(
            b.instantiate_all(&args),
            app(app(lit(1), lit(2)), var(0, 1))
        );
    }

    #[test]
    fn test_subst_keeps_body_shared() {
        let b: PatBind<Tm, One, Tm> = PatBind::new(One, var(1, 2), 1);
        let moved = b.subst(&Env::singleton(lit(3), 0));
        assert!(Rc::ptr_eq(&b.body, &moved.body));
        assert_eq!(moved.scope(), 0);
        assert_eq!(moved.unbind_all(), lit(3));
    }

    #[test]
    fn test_unbind_all_lifts() {
        // Binding two variables over a scope of one, then shifting the
        // outside by one, must leave the bound variables alone.
        let body = app(var(0, 3), var(2, 3));
        let b: PatBind<Tm, Two, Tm> = PatBind::new(Two, body, 1);
        let shifted = b.subst(&Env::shift1(1));
        assert_eq!(shifted.unbind_all(), app(var(0, 4), var(3, 4)));
    }

    #[test]
    fn test_pattern_is_transported() {
        // The annotation lives in the binder's scope, so the outer
        // substitution must reach it.
        let b: PatBind<Tm, Ann, Tm> = PatBind::new(ann(var(0, 1)), var(0, 2), 1);
        let moved = b.subst(&Env::singleton(lit(9), 0));
        assert_eq!(moved.pattern(), &ann(lit(9)));
    }

    #[test]
    fn test_rebind_lifts_rest() {
        // (x : $0) (y : x): the second annotation sees x as index 0.
        let pattern = Rebind::new(ann(var(0, 1)), ann(var(0, 2)));
        let moved: Rebind<Ann, Ann> = pattern.subst(&Env::singleton(lit(4), 0));
        assert_eq!(moved, Rebind::new(ann(lit(4)), ann(var(0, 1))));
    }

    #[test]
    fn test_telescope_binder() {
        let t = tele(ann(var(0, 1)), ann(var(0, 2)), app(var(1, 3), var(2, 3)), 1);
        let moved = t.subst(&Env::singleton(lit(2), 0));
        let expected = tele(ann(lit(2)), ann(var(0, 1)), app(var(1, 2), lit(2)), 0);
        assert_eq!(moved, expected);
    }

    #[test]
    #[should_panic(expected = "cannot be instantiated with 1 values")]
    fn test_instantiate_all_arity_mismatch() {
        let b: PatBind<Tm, Two, Tm> = PatBind::new(Two, var(0, 2), 0);
        let _ = b.instantiate_all(&Env::from_vec(vec![lit(1)], 0));
    }

    proptest! {
        #[test]
        fn prop_pattern_size_one_agrees_with_bind(
            body in arb_tm(3, 3),
            v in arb_tm(2, 2),
            f in arb_env(2, 1),
        ) {
            let single = bind(body.clone(), 2);
            let general: PatBind<Tm, Vec<One>, Tm> = PatBind::new(vec![One], body, 2);
            prop_assert_eq!(
                single.instantiate(v.clone()),
                general.instantiate_all(&Env::from_vec(vec![v], 2))
            );
            prop_assert_eq!(single.unbind(), general.unbind_all());
            prop_assert_eq!(single.subst(&f).unbind(), general.subst(&f).unbind_all());
        }

        #[test]
        fn prop_pattern_size_two_agrees_with_bind2(
            body in arb_tm(4, 3),
            v0 in arb_tm(2, 2),
            v1 in arb_tm(2, 2),
            f in arb_env(2, 3),
        ) {
            let double = bind2(body.clone(), 2);
            let general: PatBind<Tm, Vec<One>, Tm> = PatBind::new(vec![One, One], body, 2);
            prop_assert_eq!(
                double.instantiate2(v0.clone(), v1.clone()),
                general.instantiate_all(&Env::from_vec(vec![v0, v1], 2))
            );
            prop_assert_eq!(double.unbind2(), general.unbind_all());
            prop_assert_eq!(double.subst(&f).unbind2(), general.subst(&f).unbind_all());
        }

        #[test]
        fn prop_apply_outer_is_lazy_substitution(body in arb_tm(4, 3), f in arb_env(2, 3)) {
            let b: PatBind<Tm, Two, Tm> = PatBind::new(Two, body, 2);
            let eager = b.unbind_all().subst(&f.up_n(2));
            prop_assert_eq!(b.subst(&f).unbind_all(), eager);
        }

        #[test]
        fn prop_unbind_has_bound_variables_first(body in arb_tm(3, 2)) {
            let b: PatBind<Tm, Two, Tm> = PatBind::new(Two, body.clone(), 1);
            let args = Env::from_vec(vec![var(0, 3), var(1, 3)], 3);
            let instantiated = b.subst(&Env::shift(2, 1)).instantiate_all(&args);
            prop_assert_eq!(instantiated, b.unbind_all());
            prop_assert_eq!(b.unbind_all(), body);
        }
    }
}
