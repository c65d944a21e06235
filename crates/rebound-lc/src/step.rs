//! Small-step reduction, and drivers which iterate it under a step limit.

use crate::eval::{split_args, Error};
use crate::syntax::{self as syn, Term};
use rebound_core::PatBind;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Give up after this many reductions.
    pub max_steps: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig { max_steps: 10_000 }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Normal order
////////////////////////////////////////////////////////////////////////////////

/// Contract the leftmost outermost redex, anywhere in the term. Returns
/// `None` when the term is normal.
pub fn step(term: &Term) -> Result<Option<Term>, Error> {
    match term {
        Term::Variable(_) => Ok(None),
        Term::Lambda(lam) => Ok(step(&lam.body.unbind())?
            .map(|body| Term::lambda(body, lam.body.scope()))),
        Term::Application(app) => {
            if let Term::Lambda(lam) = &*app.function {
                return Ok(Some(lam.body.instantiate(Term::clone(&app.argument))));
            }
            if let Some(function) = step(&app.function)? {
                return Ok(Some(Term::application(
                    Rc::new(function),
                    app.argument.clone(),
                )));
            }
            Ok(step(&app.argument)?
                .map(|argument| Term::application(app.function.clone(), Rc::new(argument))))
        }
        Term::Let(l) => Ok(Some(l.body.instantiate(Term::clone(&l.value)))),
        Term::Tuple(tuple) => step_elements(&tuple.elements, step),
        Term::Split(split) => {
            if let Some(result) = contract_split(split)? {
                return Ok(Some(result));
            }
            if let Some(scrutinee) = step(&split.scrutinee)? {
                return Ok(Some(Term::Split(syn::Split::new(
                    Rc::new(scrutinee),
                    split.body.clone(),
                ))));
            }
            let scope = split.body.scope();
            Ok(step(&split.body.unbind_all())?.map(|body| {
                Term::Split(syn::Split::new(
                    split.scrutinee.clone(),
                    PatBind::new(*split.body.pattern(), body, scope),
                ))
            }))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Call by value
////////////////////////////////////////////////////////////////////////////////

/// One step of call-by-value evaluation. Never reduces under a binder, and
/// returns `None` on values and on stuck terms.
pub fn step_value(term: &Term) -> Result<Option<Term>, Error> {
    match term {
        Term::Variable(_) | Term::Lambda(_) => Ok(None),
        Term::Application(app) => {
            if let Some(function) = step_value(&app.function)? {
                return Ok(Some(Term::application(
                    Rc::new(function),
                    app.argument.clone(),
                )));
            }
            if let Some(argument) = step_value(&app.argument)? {
                return Ok(Some(Term::application(
                    app.function.clone(),
                    Rc::new(argument),
                )));
            }
            match &*app.function {
                Term::Lambda(lam) => Ok(Some(lam.body.instantiate(Term::clone(&app.argument)))),
                _ => Ok(None),
            }
        }
        Term::Let(l) => match step_value(&l.value)? {
            Some(value) => Ok(Some(Term::Let(syn::Let::new(
                Rc::new(value),
                l.body.clone(),
            )))),
            None => Ok(Some(l.body.instantiate(Term::clone(&l.value)))),
        },
        Term::Tuple(tuple) => step_elements(&tuple.elements, step_value),
        Term::Split(split) => match step_value(&split.scrutinee)? {
            Some(scrutinee) => Ok(Some(Term::Split(syn::Split::new(
                Rc::new(scrutinee),
                split.body.clone(),
            )))),
            None => contract_split(split),
        },
    }
}

/// Step the leftmost element which can step.
fn step_elements(
    elements: &[syn::RcTerm],
    step: impl Fn(&Term) -> Result<Option<Term>, Error>,
) -> Result<Option<Term>, Error> {
    for (i, element) in elements.iter().enumerate() {
        if let Some(next) = step(element)? {
            let mut elements = elements.to_vec();
            elements[i] = Rc::new(next);
            return Ok(Some(Term::tuple(elements)));
        }
    }
    Ok(None)
}

/// Contract a split whose scrutinee is already a tuple.
fn contract_split(split: &syn::Split) -> Result<Option<Term>, Error> {
    let Term::Tuple(tuple) = &*split.scrutinee else {
        return Ok(None);
    };
    let args = split_args(split, tuple, split.body.scope())?;
    Ok(Some(split.body.instantiate_all(&args)))
}

////////////////////////////////////////////////////////////////////////////////
// Drivers
////////////////////////////////////////////////////////////////////////////////

/// Step until `step` returns `None`, calling `on_step` with every
/// intermediate term. Fails once more than `config.max_steps` steps would be
/// needed.
pub fn run_with(
    term: &Term,
    config: &EvalConfig,
    step: impl Fn(&Term) -> Result<Option<Term>, Error>,
    mut on_step: impl FnMut(usize, &Term),
) -> Result<Term, Error> {
    let mut current = term.clone();
    for n in 0..=config.max_steps {
        match step(&current)? {
            None => {
                tracing::debug!(steps = n, "reached a normal form");
                return Ok(current);
            }
            Some(_) if n == config.max_steps => break,
            Some(next) => {
                current = next;
                on_step(n + 1, &current);
            }
        }
    }
    tracing::debug!(max_steps = config.max_steps, "giving up");
    Err(Error::StepLimit(config.max_steps))
}

/// The normal form of a term, by iterating [`step`].
pub fn normalize(term: &Term, config: &EvalConfig) -> Result<Term, Error> {
    run_with(term, config, step, |_, _| {})
}

/// The value of a term, by iterating [`step_value`].
pub fn evaluate(term: &Term, config: &EvalConfig) -> Result<Term, Error> {
    run_with(term, config, step_value, |_, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{eval, nf};
    use crate::parse::parse_term;
    use insta::assert_snapshot;

    fn parse(input: &str) -> Term {
        parse_term(input, 0).unwrap()
    }

    #[test]
    fn test_step_is_leftmost_outermost() {
        let term = parse("(λ %x → %x) ((λ %y → %y) (λ %z → %z))");
        let next = step(&term).unwrap().unwrap();
        assert_snapshot!(next.to_string(), @"(λ %0 → %0) λ %0 → %0");
    }

    #[test]
    fn test_step_value_reduces_argument_first() {
        let term = parse("(λ %x → %x) ((λ %y → %y) (λ %z → %z))");
        let next = step_value(&term).unwrap().unwrap();
        assert_snapshot!(next.to_string(), @"(λ %0 → %0) λ %0 → %0");
        let term = parse("(λ %x → λ %y → %x) (λ %z → %z)");
        let next = step_value(&term).unwrap().unwrap();
        assert_snapshot!(next.to_string(), @"λ %0 %1 → %1");
    }

    #[test]
    fn test_normal_forms_do_not_step() {
        let term = parse("λ %x → %x (λ %y → %y)");
        assert_eq!(step(&term), Ok(None));
        assert_eq!(step_value(&term), Ok(None));
        let stuck = parse_term("let (%a) = !0 in %a", 1).unwrap();
        assert_eq!(step(&stuck), Ok(None));
    }

    #[test]
    fn test_normalize_counts_steps() {
        let term = parse("(λ %x → %x) ((λ %y → %y) (λ %z → %z))");
        let mut seen = Vec::new();
        let result = run_with(&term, &EvalConfig::default(), step, |n, t| {
            seen.push((n, t.to_string()));
        });
        assert_eq!(result, Ok(parse("λ %z → %z")));
        assert_eq!(
            seen,
            vec![
                (1, "(λ %0 → %0) λ %0 → %0".to_owned()),
                (2, "λ %0 → %0".to_owned()),
            ]
        );
        let config = EvalConfig { max_steps: 2 };
        assert_eq!(normalize(&term, &config), Ok(parse("λ %z → %z")));
        let config = EvalConfig { max_steps: 1 };
        assert_eq!(normalize(&term, &config), Err(Error::StepLimit(1)));
    }

    #[test]
    fn test_step_limit_on_divergence() {
        let omega = parse("(λ %x → %x %x) (λ %x → %x %x)");
        let config = EvalConfig { max_steps: 50 };
        assert_eq!(normalize(&omega, &config), Err(Error::StepLimit(50)));
        assert_eq!(evaluate(&omega, &config), Err(Error::StepLimit(50)));
    }

    #[test]
    fn test_agrees_with_big_step() {
        let inputs = [
            "(λ %x %y → %x (λ %z → %z %z)) (λ %x → %x)",
            "let %p = (λ %x → %x, λ %x %y → %x) in let (%i, %k) = %p in %k %i",
            "(λ %f → (%f (λ %x → %x), %f (λ %x %y → %y))) (λ %g → %g %g)",
        ];
        for input in inputs {
            let term = parse(input);
            let config = EvalConfig::default();
            assert_eq!(normalize(&term, &config), nf(&term), "{input}");
            assert_eq!(evaluate(&term, &config), eval(&term), "{input}");
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let term = parse("let (%a, %b) = () in %a");
        let err = Err(Error::ArityMismatch {
            expected: 2,
            found: 0,
        });
        assert_eq!(step(&term), err);
        assert_eq!(step_value(&term), err);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EvalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EvalConfig::default());
        let config: EvalConfig = serde_json::from_str(r#"{"max_steps": 3}"#).unwrap();
        assert_eq!(config.max_steps, 3);
    }
}
