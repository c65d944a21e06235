//! Narrowing the scope of a term by showing that some of its variables are
//! never used.

use crate::common::Fin;
use crate::pat::{One, PatBind, Pattern, Rebind, Two};
use crate::subst::{Subst, SubstVar};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StrengthenError {
    /// The variable is one of those being removed.
    #[error("variable {0} occurs in the range being removed")]
    Escapes(Fin),
}

pub trait Strengthen: Sized {
    /// Remove the variables `k..k + m` from a term of scope `k + m + n`,
    /// giving a term of scope `k + n`.
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError>;

    /// Remove the innermost `m` variables from a term of scope `m + n`.
    fn strengthen(&self, m: usize, n: usize) -> Result<Self, StrengthenError> {
        self.strengthen_rec(0, m, n)
    }

    /// Does the variable `x` occur free in the term?
    fn occurs(&self, x: Fin) -> bool {
        let above = x.scope() - x.index() - 1;
        self.strengthen_rec(x.index(), 1, above).is_err()
    }
}

impl Strengthen for Fin {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        Fin::strengthen_rec(*self, k, m, n).ok_or(StrengthenError::Escapes(*self))
    }
}

impl<T: Strengthen> Strengthen for Rc<T> {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        T::strengthen_rec(self, k, m, n).map(Rc::new)
    }
}

impl<T: Strengthen> Strengthen for Box<T> {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        T::strengthen_rec(self, k, m, n).map(Box::new)
    }
}

impl<T: Strengthen> Strengthen for Vec<T> {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        self.iter().map(|t| t.strengthen_rec(k, m, n)).collect()
    }
}

impl<T: Strengthen> Strengthen for Option<T> {
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        self.as_ref().map(|t| t.strengthen_rec(k, m, n)).transpose()
    }
}

impl Strengthen for One {
    fn strengthen_rec(&self, _: usize, _: usize, _: usize) -> Result<Self, StrengthenError> {
        Ok(One)
    }
}

impl Strengthen for Two {
    fn strengthen_rec(&self, _: usize, _: usize, _: usize) -> Result<Self, StrengthenError> {
        Ok(Two)
    }
}

impl<P1, P2> Strengthen for Rebind<P1, P2>
where
    P1: Pattern + Strengthen,
    P2: Strengthen,
{
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        Ok(Rebind {
            first: self.first.strengthen_rec(k, m, n)?,
            rest: self.rest.strengthen_rec(k + self.first.size(), m, n)?,
        })
    }
}

/// Binders are opened, strengthened with the bound variables added to the
/// kept prefix, and closed again with a fresh identity environment.
impl<V, P, T> Strengthen for PatBind<V, P, T>
where
    V: SubstVar,
    P: Pattern + Strengthen,
    T: Subst<V> + Strengthen + Clone,
{
    fn strengthen_rec(&self, k: usize, m: usize, n: usize) -> Result<Self, StrengthenError> {
        assert_eq!(
            self.scope(),
            k + m + n,
            "binder in scope {} strengthened as if in scope {k} + {m} + {n}",
            self.scope()
        );
        let size = self.size();
        let pattern = self.pattern.strengthen_rec(k, m, n)?;
        let body = self
            .unbind_all()
            .strengthen_rec(size + k, m, n)
            .inspect_err(|err| tracing::trace!(%err, size, "binder body escapes"))?;
        Ok(PatBind::new(pattern, body, k + n))
    }
}
