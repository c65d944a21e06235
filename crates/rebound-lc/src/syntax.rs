use rebound_core::{
    bind, Bind, Env, Fin, PatBind, Pattern, Strengthen, StrengthenError, Subst, SubstVar,
};
use std::rc::Rc;

pub type RcTerm = Rc<Term>;

/// The pattern of a tuple split. Component `i` of the tuple is bound to
/// index `i` of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TuplePattern {
    pub arity: usize,
}

impl TuplePattern {
    pub fn new(arity: usize) -> TuplePattern {
        TuplePattern { arity }
    }
}

impl Pattern for TuplePattern {
    fn size(&self) -> usize {
        self.arity
    }
}

impl Subst<Term> for TuplePattern {
    fn subst(&self, _: &Env<Term>) -> Self {
        *self
    }
}

impl Strengthen for TuplePattern {
    fn strengthen_rec(&self, _: usize, _: usize, _: usize) -> Result<Self, StrengthenError> {
        Ok(*self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Variable(Variable),
    Lambda(Lambda),
    Application(Application),
    Let(Let),
    Tuple(Tuple),
    Split(Split),
}

impl Term {
    pub fn variable(index: Fin) -> Term {
        Term::Variable(Variable::new(index))
    }

    pub fn variable_rc(index: Fin) -> RcTerm {
        Rc::new(Term::variable(index))
    }

    /// A lambda in scope `scope`, whose body is in scope `scope + 1`.
    pub fn lambda(body: Term, scope: usize) -> Term {
        Term::Lambda(Lambda::new(bind(body, scope)))
    }

    pub fn lambda_rc(body: Term, scope: usize) -> RcTerm {
        Rc::new(Term::lambda(body, scope))
    }

    pub fn application(function: RcTerm, argument: RcTerm) -> Term {
        Term::Application(Application::new(function, argument))
    }

    pub fn application_rc(function: RcTerm, argument: RcTerm) -> RcTerm {
        Rc::new(Term::application(function, argument))
    }

    /// `let x = value in body`, where `body` is in scope `scope + 1`.
    pub fn let_in(value: RcTerm, body: Term, scope: usize) -> Term {
        Term::Let(Let::new(value, bind(body, scope)))
    }

    pub fn let_in_rc(value: RcTerm, body: Term, scope: usize) -> RcTerm {
        Rc::new(Term::let_in(value, body, scope))
    }

    pub fn tuple(elements: Vec<RcTerm>) -> Term {
        Term::Tuple(Tuple::new(elements))
    }

    pub fn tuple_rc(elements: Vec<RcTerm>) -> RcTerm {
        Rc::new(Term::tuple(elements))
    }

    /// `let (x0, .., xn) = scrutinee in body`, where `body` is in scope
    /// `scope + arity`.
    pub fn split(scrutinee: RcTerm, arity: usize, body: Term, scope: usize) -> Term {
        Term::Split(Split::new(
            scrutinee,
            PatBind::new(TuplePattern::new(arity), body, scope),
        ))
    }

    pub fn split_rc(scrutinee: RcTerm, arity: usize, body: Term, scope: usize) -> RcTerm {
        Rc::new(Term::split(scrutinee, arity, body, scope))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub index: Fin,
}

impl Variable {
    pub fn new(index: Fin) -> Variable {
        Variable { index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub body: Bind<Term, Term>,
}

impl Lambda {
    pub fn new(body: Bind<Term, Term>) -> Lambda {
        Lambda { body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub function: RcTerm,
    pub argument: RcTerm,
}

impl Application {
    pub fn new(function: RcTerm, argument: RcTerm) -> Application {
        Application { function, argument }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub value: RcTerm,
    pub body: Bind<Term, Term>,
}

impl Let {
    pub fn new(value: RcTerm, body: Bind<Term, Term>) -> Let {
        Let { value, body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub elements: Vec<RcTerm>,
}

impl Tuple {
    pub fn new(elements: Vec<RcTerm>) -> Tuple {
        Tuple { elements }
    }

    /// An environment mapping slot `i` to element `i`.
    pub fn to_env(&self, scope: usize) -> Env<Term> {
        Env::from_vec(
            self.elements.iter().map(|e| Term::clone(e)).collect(),
            scope,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub scrutinee: RcTerm,
    pub body: PatBind<Term, TuplePattern, Term>,
}

impl Split {
    pub fn new(scrutinee: RcTerm, body: PatBind<Term, TuplePattern, Term>) -> Split {
        Split { scrutinee, body }
    }
}

impl SubstVar for Term {
    fn var(x: Fin) -> Self {
        Term::variable(x)
    }
}

impl Subst<Term> for Term {
    fn subst(&self, env: &Env<Term>) -> Self {
        match self {
            Term::Variable(var) => env.lookup(var.index),
            Term::Lambda(lam) => Term::Lambda(Lambda::new(lam.body.subst(env))),
            Term::Application(app) => Term::application(
                app.function.subst(env),
                app.argument.subst(env),
            ),
            Term::Let(l) => Term::Let(Let::new(l.value.subst(env), l.body.subst(env))),
            Term::Tuple(tuple) => Term::tuple(tuple.elements.subst(env)),
            Term::Split(split) => Term::Split(Split::new(
                split.scrutinee.subst(env),
                split.body.subst(env),
            )),
        }
    }
}

impl Strengthen for Term {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        Ok(match self {
            Term::Variable(var) => Term::variable(Strengthen::strengthen_rec(&var.index, k, m, n)?),
            Term::Lambda(lam) => Term::Lambda(Lambda::new(lam.body.strengthen_rec(k, m, n)?)),
            Term::Application(app) => Term::application(
                app.function.strengthen_rec(k, m, n)?,
                app.argument.strengthen_rec(k, m, n)?,
            ),
            Term::Let(l) => Term::Let(Let::new(
                l.value.strengthen_rec(k, m, n)?,
                l.body.strengthen_rec(k, m, n)?,
            )),
            Term::Tuple(tuple) => Term::tuple(tuple.elements.strengthen_rec(k, m, n)?),
            Term::Split(split) => Term::Split(Split::new(
                split.scrutinee.strengthen_rec(k, m, n)?,
                split.body.strengthen_rec(k, m, n)?,
            )),
        })
    }
}
