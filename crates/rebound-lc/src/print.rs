use crate::syntax::{Application, Lambda, Let, Split, Term, Tuple, Variable};
use elegance::{Io, Printer, Render};
use rebound_core::Fin;
use std::fmt;

const INDENT: isize = 2;
const COLUMNS: usize = 80;

const NO_PREC: Option<usize> = None;
const LAMBDA_LHS: Option<usize> = NO_PREC;
const LAMBDA_RHS: Option<usize> = Some(3);
const LET_LHS: Option<usize> = NO_PREC;
const LET_RHS: Option<usize> = Some(3);
const APP_LHS: Option<usize> = Some(4);
const APP_RHS: Option<usize> = Some(5);

pub fn dump_term(term: &Term) {
    let mut p = Printer::new(Io(std::io::stdout()), COLUMNS);
    let st = State::new();
    let _ = term.print(st, &mut p);
    let _ = p.hard_break();
    let _ = p.finish();
}

/// Bound variables are printed as `%level`, free variables as `!index`
/// counted from the innermost variable of the term's own scope.
pub fn print_term_to_string(term: &Term) -> String {
    let mut p = Printer::new(String::new(), COLUMNS);
    let st = State::new();
    let _ = term.print(st, &mut p);
    p.finish().unwrap_or_default()
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_term_to_string(self))
    }
}

#[derive(Clone, Copy)]
struct State {
    /// Ambient binder depth.
    depth: usize,
    // The parent precedence.
    precedence: (Option<usize>, Option<usize>),
}

impl State {
    fn new() -> State {
        State {
            depth: 0,
            precedence: (None, None),
        }
    }

    fn set_lhs_prec(self, prec: Option<usize>) -> State {
        State {
            precedence: (prec, self.precedence.1),
            ..self
        }
    }

    fn set_rhs_prec(self, prec: Option<usize>) -> State {
        State {
            precedence: (self.precedence.0, prec),
            ..self
        }
    }

    fn inc_depth(self) -> State {
        self.add_depth(1)
    }

    fn add_depth(self, n: usize) -> State {
        State {
            depth: self.depth + n,
            ..self
        }
    }
}

fn print_left_subterm<R>(
    st: State,
    p: &mut Printer<R>,
    x: &Term,
    lhs_prec: Option<usize>,
) -> Result<(), R::Error>
where
    R: Render,
{
    x.print(st.set_rhs_prec(lhs_prec), p)
}

fn print_right_subterm<R>(
    st: State,
    p: &mut Printer<R>,
    x: &Term,
    rhs_prec: Option<usize>,
) -> Result<(), R::Error>
where
    R: Render,
{
    x.print(st.set_lhs_prec(rhs_prec), p)
}

fn print_internal_subterm<R>(st: State, p: &mut Printer<R>, x: &Term) -> Result<(), R::Error>
where
    R: Render,
{
    x.print(st.set_lhs_prec(NO_PREC).set_rhs_prec(NO_PREC), p)
}

fn with_prec<F, R>(
    st: State,
    p: &mut Printer<R>,
    lhs_prec: Option<usize>,
    rhs_prec: Option<usize>,
    f: F,
) -> Result<(), R::Error>
where
    F: FnOnce(State, &mut Printer<R>) -> Result<(), R::Error>,
    R: Render,
{
    // If the parent binds tighter, or if equal, then we need parens to ensure
    // that this subexpression would be parsed together as an atomic expression.
    let mut need_parens = false;
    if let Some(left_prec) = lhs_prec {
        if let Some(left_parent) = st.precedence.0 {
            need_parens |= left_parent >= left_prec;
        }
    }
    if let Some(right_prec) = rhs_prec {
        if let Some(right_parent) = st.precedence.1 {
            need_parens |= right_parent >= right_prec;
        }
    }
    if need_parens {
        p.igroup(INDENT, |p| {
            p.text("(")?;
            f(st.set_lhs_prec(NO_PREC).set_rhs_prec(NO_PREC), p)?;
            p.text(")")
        })
    } else {
        f(st, p)
    }
}

fn print_binder<R>(st: State, p: &mut Printer<R>) -> Result<(), R::Error>
where
    R: Render,
{
    // The binder about to be entered is the innermost of `depth + 1`.
    p.text_owned(Fin::new(0, st.depth + 1).to_level().to_string())
}

impl Term {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        match self {
            Term::Variable(var) => var.print(st, p),
            Term::Lambda(lam) => lam.print(st, p),
            Term::Application(app) => app.print(st, p),
            Term::Let(l) => l.print(st, p),
            Term::Tuple(tuple) => tuple.print(st, p),
            Term::Split(split) => split.print(st, p),
        }
    }
}

impl Variable {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        let index = self.index.index();
        if index < st.depth {
            p.text_owned(Fin::new(index, st.depth).to_level().to_string())
        } else {
            p.text_owned(format!("!{}", index - st.depth))
        }
    }
}

impl Lambda {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        with_prec(st, p, LAMBDA_LHS, LAMBDA_RHS, |st, p| {
            p.cgroup(2, |p| {
                let mut st = st;
                let mut body = self.body.unbind();
                p.cgroup(0, |p| {
                    p.text("λ ")?;
                    loop {
                        print_binder(st, p)?;
                        st = st.inc_depth();
                        if let Term::Lambda(lam) = &body {
                            let next = lam.body.unbind();
                            body = next;
                        } else {
                            break;
                        }
                        p.space()?;
                    }
                    p.space()?;
                    p.text("→")
                })?;
                p.space()?;
                print_right_subterm(st, p, &body, LAMBDA_RHS)
            })
        })
    }
}

impl Application {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        with_prec(st, p, APP_LHS, APP_RHS, |st, p| {
            p.cgroup(0, |p| {
                print_left_subterm(st, p, &self.function, APP_LHS)?;
                p.space()?;
                print_right_subterm(st, p, &self.argument, APP_RHS)
            })
        })
    }
}

impl Let {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        with_prec(st, p, LET_LHS, LET_RHS, |st, p| {
            p.cgroup(0, |p| {
                p.cgroup(INDENT, |p| {
                    p.text("let ")?;
                    print_binder(st, p)?;
                    p.text(" =")?;
                    p.space()?;
                    print_internal_subterm(st, p, &self.value)
                })?;
                p.space()?;
                p.text("in")?;
                p.space()?;
                print_right_subterm(st.inc_depth(), p, &self.body.unbind(), LET_RHS)
            })
        })
    }
}

impl Tuple {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        p.text("(")?;
        p.cgroup(1, |p| {
            for (i, element) in self.elements.iter().enumerate() {
                if i > 0 {
                    p.text(",")?;
                    p.space()?;
                }
                print_internal_subterm(st, p, element)?;
            }
            // A one element tuple keeps its comma to tell it apart from
            // parentheses.
            if self.elements.len() == 1 {
                p.text(",")?;
            }
            Ok(())
        })?;
        p.text(")")
    }
}

impl Split {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        let arity = self.body.pattern().arity;
        with_prec(st, p, LET_LHS, LET_RHS, |st, p| {
            p.cgroup(0, |p| {
                p.cgroup(INDENT, |p| {
                    p.text("let (")?;
                    // Component `i` is bound to index `i` of the body.
                    for i in 0..arity {
                        if i > 0 {
                            p.text(", ")?;
                        }
                        print_binder(st.add_depth(arity - i - 1), p)?;
                    }
                    p.text(") =")?;
                    p.space()?;
                    print_internal_subterm(st, p, &self.scrutinee)
                })?;
                p.space()?;
                p.text("in")?;
                p.space()?;
                print_right_subterm(st.add_depth(arity), p, &self.body.unbind_all(), LET_RHS)
            })
        })
    }
}
