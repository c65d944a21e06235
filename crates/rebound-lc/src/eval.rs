//! Big-step evaluation.
//!
//! [`eval`] is call-by-value and stops at lambdas, [`whnf`] is call-by-name
//! and stops at the head, [`nf`] and [`nf_env`] normalize under binders in
//! normal order. None of these are bounded: a term without a normal form
//! makes them loop. See [`crate::step`] for a stepper with a step limit.

use crate::syntax::{self as syn, Term, Tuple};
use rebound_core::{Env, PatBind};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("a pattern of {expected} variables cannot split a tuple of {found} elements")]
    ArityMismatch { expected: usize, found: usize },
    #[error("no result after {0} steps")]
    StepLimit(usize),
}

/// The environment which instantiates a split's pattern with the tuple's
/// components.
pub(crate) fn split_args(
    split: &syn::Split,
    tuple: &Tuple,
    scope: usize,
) -> Result<Env<Term>, Error> {
    let expected = split.body.size();
    let found = tuple.elements.len();
    if expected != found {
        tracing::debug!(expected, found, "stuck on a split");
        return Err(Error::ArityMismatch { expected, found });
    }
    Ok(tuple.to_env(scope))
}

////////////////////////////////////////////////////////////////////////////////
// Weak head normal form
////////////////////////////////////////////////////////////////////////////////

/// Reduce the head of a term until it is a lambda, a tuple, or stuck on a
/// variable. Arguments are substituted unevaluated.
pub fn whnf(term: &Term) -> Result<Term, Error> {
    match term {
        Term::Application(app) => match whnf(&app.function)? {
            Term::Lambda(lam) => whnf(&lam.body.instantiate(Term::clone(&app.argument))),
            function => Ok(Term::application(
                Rc::new(function),
                app.argument.clone(),
            )),
        },
        Term::Let(l) => whnf(&l.body.instantiate(Term::clone(&l.value))),
        Term::Split(split) => {
            let scope = split.body.scope();
            match whnf(&split.scrutinee)? {
                Term::Tuple(tuple) => {
                    whnf(&split.body.instantiate_all(&split_args(split, &tuple, scope)?))
                }
                scrutinee => Ok(Term::Split(syn::Split::new(
                    Rc::new(scrutinee),
                    split.body.clone(),
                ))),
            }
        }
        Term::Variable(_) | Term::Lambda(_) | Term::Tuple(_) => Ok(term.clone()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Call-by-value evaluation
////////////////////////////////////////////////////////////////////////////////

/// Evaluate a term to a value, never reducing under a binder. Functions and
/// arguments are evaluated before the call, left to right.
pub fn eval(term: &Term) -> Result<Term, Error> {
    match term {
        Term::Variable(_) | Term::Lambda(_) => Ok(term.clone()),
        Term::Application(app) => eval_application(app),
        Term::Let(l) => {
            let value = eval(&l.value)?;
            eval(&l.body.instantiate(value))
        }
        Term::Tuple(tuple) => Ok(Term::tuple(
            tuple
                .elements
                .iter()
                .map(|e| eval(e).map(Rc::new))
                .collect::<Result<_, _>>()?,
        )),
        Term::Split(split) => eval_split(split),
    }
}

fn eval_application(app: &syn::Application) -> Result<Term, Error> {
    let function = eval(&app.function)?;
    let argument = eval(&app.argument)?;
    match function {
        Term::Lambda(lam) => eval(&lam.body.instantiate(argument)),
        function => Ok(Term::application(Rc::new(function), Rc::new(argument))),
    }
}

fn eval_split(split: &syn::Split) -> Result<Term, Error> {
    let scope = split.body.scope();
    match eval(&split.scrutinee)? {
        Term::Tuple(tuple) => eval(&split.body.instantiate_all(&split_args(split, &tuple, scope)?)),
        scrutinee => Ok(Term::Split(syn::Split::new(
            Rc::new(scrutinee),
            split.body.clone(),
        ))),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Normalization by substitution
////////////////////////////////////////////////////////////////////////////////

/// The normal form of a term, found by normal order reduction. Each redex is
/// contracted by instantiating its binder.
pub fn nf(term: &Term) -> Result<Term, Error> {
    tracing::trace!(%term, "nf");
    match term {
        Term::Variable(_) => Ok(term.clone()),
        Term::Lambda(lam) => Ok(Term::lambda(nf(&lam.body.unbind())?, lam.body.scope())),
        Term::Application(app) => match whnf(&app.function)? {
            Term::Lambda(lam) => nf(&lam.body.instantiate(Term::clone(&app.argument))),
            function => Ok(Term::application(
                Rc::new(nf(&function)?),
                Rc::new(nf(&app.argument)?),
            )),
        },
        Term::Let(l) => nf(&l.body.instantiate(Term::clone(&l.value))),
        Term::Tuple(tuple) => Ok(Term::tuple(
            tuple
                .elements
                .iter()
                .map(|e| nf(e).map(Rc::new))
                .collect::<Result<_, _>>()?,
        )),
        Term::Split(split) => {
            let scope = split.body.scope();
            match whnf(&split.scrutinee)? {
                Term::Tuple(tuple) => {
                    nf(&split.body.instantiate_all(&split_args(split, &tuple, scope)?))
                }
                scrutinee => Ok(Term::Split(syn::Split::new(
                    Rc::new(nf(&scrutinee)?),
                    PatBind::new(
                        *split.body.pattern(),
                        nf(&split.body.unbind_all())?,
                        scope,
                    ),
                ))),
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Normalization with an explicit environment
////////////////////////////////////////////////////////////////////////////////

/// The normal form of `term` under `env`, without building the substituted
/// term first.
///
/// The values in `env` must already be normal. Nothing is assumed of the
/// delayed environments of binders inside `term`: their values are
/// normalized under `env` before the body is entered, and the body itself is
/// normalized directly.
pub fn nf_env(env: &Env<Term>, term: &Term) -> Result<Term, Error> {
    let scope = env.codomain();
    match term {
        Term::Variable(var) => Ok(env.lookup(var.index)),
        Term::Lambda(lam) => lam.body.unbind_with(|delayed, body| {
            Ok(Term::lambda(nf_env(&nf_delayed(delayed, env)?.up(), body)?, scope))
        }),
        Term::Application(app) => match nf_env(env, &app.function)? {
            Term::Lambda(lam) => {
                let argument = nf_env(env, &app.argument)?;
                lam.body.unbind_with(|delayed, body| {
                    let delayed = nf_delayed(delayed, &Env::identity(scope))?;
                    nf_env(&delayed.cons(argument), body)
                })
            }
            function => Ok(Term::application(
                Rc::new(function),
                Rc::new(nf_env(env, &app.argument)?),
            )),
        },
        Term::Let(l) => {
            let value = nf_env(env, &l.value)?;
            l.body
                .unbind_with(|delayed, body| nf_env(&nf_delayed(delayed, env)?.cons(value), body))
        }
        Term::Tuple(tuple) => Ok(Term::tuple(
            tuple
                .elements
                .iter()
                .map(|e| nf_env(env, e).map(Rc::new))
                .collect::<Result<_, _>>()?,
        )),
        Term::Split(split) => match nf_env(env, &split.scrutinee)? {
            Term::Tuple(tuple) => {
                let args = split_args(split, &tuple, scope)?;
                split
                    .body
                    .unbind_all_with(|_, delayed, body| {
                        nf_env(&args.append(&nf_delayed(delayed, env)?), body)
                    })
            }
            scrutinee => {
                let arity = split.body.size();
                let body = split.body.unbind_all_with(|_, delayed, body| {
                    nf_env(&nf_delayed(delayed, env)?.up_n(arity), body)
                })?;
                Ok(Term::Split(syn::Split::new(
                    Rc::new(scrutinee),
                    PatBind::new(*split.body.pattern(), body, scope),
                )))
            }
        },
    }
}

/// `delayed >> env`, with every value normalized.
fn nf_delayed(delayed: &Env<Term>, env: &Env<Term>) -> Result<Env<Term>, Error> {
    if delayed.is_identity() {
        return Ok(env.clone());
    }
    let values = delayed
        .to_vec()
        .iter()
        .map(|value| nf_env(env, value))
        .collect::<Result<_, _>>()?;
    Ok(Env::from_vec(values, env.codomain()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_term;
    use insta::assert_snapshot;
    use rebound_core::Subst;

    fn parse(input: &str) -> Term {
        parse_term(input, 0).unwrap()
    }

    fn nf_closed(term: &Term) -> Result<Term, Error> {
        nf_env(&Env::identity(0), term)
    }

    #[test]
    fn test_whnf_stops_at_lambda() {
        let term = parse("(λ %x %y → %x) (λ %z → %z)");
        assert_snapshot!(whnf(&term).unwrap().to_string(), @"λ %0 %1 → %1");
    }

    #[test]
    fn test_whnf_is_call_by_name() {
        // The diverging argument is never evaluated.
        let term = parse("(λ %x %y → %y) ((λ %z → %z %z) (λ %z → %z %z))");
        assert_snapshot!(whnf(&term).unwrap().to_string(), @"λ %0 → %0");
    }

    #[test]
    fn test_eval_does_not_go_under_binders() {
        let term = parse("(λ %x %y → %x (λ %z → %z %z)) (λ %x → %x)");
        assert_snapshot!(eval(&term).unwrap().to_string(), @"λ %0 → (λ %1 → %1) λ %1 → %1 %1");
    }

    #[test]
    fn test_nf_goes_under_binders() {
        let term = parse("(λ %x %y → %x (λ %z → %z %z)) (λ %x → %x)");
        assert_snapshot!(nf(&term).unwrap().to_string(), @"λ %0 %1 → %1 %1");
        assert_eq!(nf_closed(&term), nf(&term));
    }

    #[test]
    fn test_nf_open_term_is_stuck() {
        let term = parse_term("!0 (λ %x → %x)", 1).unwrap();
        assert_eq!(nf(&term), Ok(term.clone()));
        assert_eq!(nf_env(&Env::identity(1), &term), Ok(term.clone()));
        assert_eq!(eval(&term), Ok(term.clone()));
        assert_eq!(whnf(&term), Ok(term));
    }

    #[test]
    fn test_let_and_split() {
        let term = parse("let %p = (λ %x → %x, λ %x %y → %x) in let (%i, %k) = %p in %k %i");
        assert_snapshot!(nf(&term).unwrap().to_string(), @"λ %0 %1 → %1");
        assert_eq!(nf_closed(&term), nf(&term));
        assert_eq!(eval(&term), nf(&term));
    }

    #[test]
    fn test_stuck_split_is_normalized_inside() {
        let term = parse_term("let (%a, %b) = !0 in (λ %x → %x) %b", 1).unwrap();
        let expected = parse_term("let (%a, %b) = !0 in %b", 1).unwrap();
        assert_eq!(nf(&term), Ok(expected.clone()));
        assert_eq!(nf_env(&Env::identity(1), &term), Ok(expected));
    }

    #[test]
    fn test_arity_mismatch() {
        let term = parse("let (%a, %b) = (λ %x → %x,) in %a");
        let err = Err(Error::ArityMismatch {
            expected: 2,
            found: 1,
        });
        assert_eq!(nf(&term), err);
        assert_eq!(nf_closed(&term), err);
        assert_eq!(eval(&term), err);
        assert_eq!(whnf(&term), err);
    }

    #[test]
    fn test_nf_env_normalizes_delayed_environments() {
        // whnf leaves the unevaluated argument in the lambda's environment.
        let head = whnf(&parse("(λ %x %y → %x) ((λ %z → %z) (λ %z → %z))")).unwrap();
        assert_snapshot!(nf(&head).unwrap().to_string(), @"λ %0 %1 → %1");
        assert_eq!(nf_closed(&head), nf(&head));

        let redex = parse("(λ %z → %z) (λ %z → %z)");
        let lifted = parse_term("λ %y → !0", 1)
            .unwrap()
            .subst(&Env::singleton(redex, 0));
        assert_eq!(nf_closed(&lifted), nf(&lifted));

        let split = parse_term("λ %p → let (%a, %b) = %p in !0", 1)
            .unwrap()
            .subst(&Env::singleton(parse("(λ %z → %z) (λ %z → %z)"), 0));
        assert_eq!(nf(&split), Ok(parse("λ %p → let (%a, %b) = %p in λ %z → %z")));
        assert_eq!(nf_closed(&split), nf(&split));
    }

    #[test]
    fn test_nf_env_substitutes_free_variables() {
        // !0 !1 with !0 := λ x. x, !1 := !0 from the outer scope
        let term = parse_term("!0 !1", 2).unwrap();
        let env = Env::from_vec(
            vec![
                parse_term("λ %x → %x", 1).unwrap(),
                parse_term("!0", 1).unwrap(),
            ],
            1,
        );
        assert_eq!(nf_env(&env, &term), Ok(parse_term("!0", 1).unwrap()));
    }
}
