//! A small term language and proptest strategies for exercising the laws of
//! the core.

use crate::bind::{bind, Bind};
use crate::common::Fin;
use crate::env::Env;
use crate::pat::{PatBind, Pattern, Rebind};
use crate::strengthen::{Strengthen, StrengthenError};
use crate::subst::{Subst, SubstVar};
use proptest::prelude::*;
use proptest::strategy::Union;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tm {
    Lit(u8),
    Var(Fin),
    App(Rc<Tm>, Rc<Tm>),
    Lam(Bind<Tm, Tm>),
    Tele(PatBind<Tm, Rebind<Ann, Ann>, Tm>),
}

/// A pattern for one variable, annotated with a term from the enclosing scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Ann {
    pub(crate) ann: Rc<Tm>,
}

impl Pattern for Ann {
    fn size(&self) -> usize {
        1
    }
}

impl Subst<Tm> for Ann {
    fn subst(&self, env: &Env<Tm>) -> Self {
        Ann {
            ann: self.ann.subst(env),
        }
    }
}

impl Strengthen for Ann {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        Ok(Ann {
            ann: self.ann.strengthen_rec(k, m, n)?,
        })
    }
}

impl SubstVar for Tm {
    fn var(x: Fin) -> Self {
        Tm::Var(x)
    }
}

impl Subst<Tm> for Tm {
    fn subst(&self, env: &Env<Tm>) -> Self {
        match self {
            Tm::Lit(n) => Tm::Lit(*n),
            Tm::Var(x) => env.lookup(*x),
            Tm::App(f, a) => Tm::App(f.subst(env), a.subst(env)),
            Tm::Lam(b) => Tm::Lam(b.subst(env)),
            Tm::Tele(b) => Tm::Tele(b.subst(env)),
        }
    }
}

impl Strengthen for Tm {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        Ok(match self {
            Tm::Lit(n) => Tm::Lit(*n),
            Tm::Var(x) => Tm::Var(Strengthen::strengthen_rec(x, k, m, n)?),
            Tm::App(f, a) => Tm::App(f.strengthen_rec(k, m, n)?, a.strengthen_rec(k, m, n)?),
            Tm::Lam(b) => Tm::Lam(b.strengthen_rec(k, m, n)?),
            Tm::Tele(b) => Tm::Tele(b.strengthen_rec(k, m, n)?),
        })
    }
}

pub(crate) fn lit(n: u8) -> Tm {
    Tm::Lit(n)
}

pub(crate) fn var(index: usize, scope: usize) -> Tm {
    Tm::Var(Fin::new(index, scope))
}

pub(crate) fn app(f: Tm, a: Tm) -> Tm {
    Tm::App(Rc::new(f), Rc::new(a))
}

/// A lambda in scope `scope`; the body is in scope `scope + 1`.
pub(crate) fn lam(body: Tm, scope: usize) -> Tm {
    Tm::Lam(bind(body, scope))
}

pub(crate) fn ann(ann: Tm) -> Ann {
    Ann { ann: Rc::new(ann) }
}

pub(crate) fn tele(first: Ann, rest: Ann, body: Tm, scope: usize) -> Tm {
    Tm::Tele(PatBind::new(Rebind::new(first, rest), body, scope))
}

/// Terms of the given scope, nested at most `depth` deep.
pub(crate) fn arb_tm(scope: usize, depth: u32) -> BoxedStrategy<Tm> {
    let leaf = if scope == 0 {
        (0u8..4).prop_map(lit).boxed()
    } else {
        prop_oneof![
            1 => (0u8..4).prop_map(lit),
            3 => (0..scope).prop_map(move |i| var(i, scope)),
        ]
        .boxed()
    };
    if depth == 0 {
        return leaf;
    }
    prop_oneof![
        2 => leaf,
        2 => (arb_tm(scope, depth - 1), arb_tm(scope, depth - 1)).prop_map(|(f, a)| app(f, a)),
        2 => arb_tm(scope + 1, depth - 1).prop_map(move |body| lam(body, scope)),
        1 => (
            arb_tm(scope, 0),
            arb_tm(scope + 1, 0),
            arb_tm(scope + 2, depth - 1),
        )
            .prop_map(move |(a, b, body)| tele(ann(a), ann(b), body, scope)),
    ]
    .boxed()
}

/// Environments from `domain` to `codomain`, built from every kind of
/// primitive constructor.
pub(crate) fn arb_env(domain: usize, codomain: usize) -> BoxedStrategy<Env<Tm>> {
    arb_env_at(domain, codomain, 2)
}

fn arb_env_at(domain: usize, codomain: usize, depth: u32) -> BoxedStrategy<Env<Tm>> {
    let mut options: Vec<BoxedStrategy<Env<Tm>>> = vec![
        proptest::collection::vec(arb_tm(codomain, 2), domain)
            .prop_map(move |values| Env::from_vec(values, codomain))
            .boxed(),
    ];
    if domain == codomain {
        options.push(Just(Env::identity(domain)).boxed());
    }
    if codomain >= domain {
        let by = codomain - domain;
        options.push(Just(Env::shift(by, domain)).boxed());
        options.push(Just(Env::weaken(by, domain)).boxed());
        options.push(
            (0..=domain)
                .prop_map(move |at| Env::shift_from(at, by, domain))
                .boxed(),
        );
    }
    if depth > 0 {
        if domain > 0 {
            options.push(
                (arb_tm(codomain, 2), arb_env_at(domain - 1, codomain, depth - 1))
                    .prop_map(|(v, env)| env.cons(v))
                    .boxed(),
            );
            options.push(
                arb_env_at(domain + 1, codomain, depth - 1)
                    .prop_map(|env| env.tail())
                    .boxed(),
            );
            let split = domain / 2;
            options.push(
                (
                    arb_env_at(split, codomain, depth - 1),
                    arb_env_at(domain - split, codomain, depth - 1),
                )
                    .prop_map(|(first, rest)| first.append(&rest))
                    .boxed(),
            );
        }
        if domain > 0 && codomain > 0 {
            options.push(
                arb_env_at(domain - 1, codomain - 1, depth - 1)
                    .prop_map(|env| env.up())
                    .boxed(),
            );
        }
        options.push(
            (0usize..3)
                .prop_flat_map(move |middle| {
                    (
                        arb_env_at(domain, middle, depth - 1),
                        arb_env_at(middle, codomain, depth - 1),
                    )
                })
                .prop_map(|(first, next)| first.compose(&next))
                .boxed(),
        );
    }
    Union::new(options).boxed()
}
