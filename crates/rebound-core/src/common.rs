use either::Either;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FinError {
    #[error("index {index} is out of bounds for a scope of size {scope}")]
    OutOfBounds { index: usize, scope: usize },
}

/// A de Bruijn index together with the size of the scope it lives in. The
/// index is always strictly smaller than the scope.
#[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawFin")]
pub struct Fin {
    index: usize,
    scope: usize,
}

#[derive(Deserialize)]
struct RawFin {
    index: usize,
    scope: usize,
}

impl TryFrom<RawFin> for Fin {
    type Error = FinError;

    fn try_from(raw: RawFin) -> Result<Self, Self::Error> {
        Fin::try_new(raw.index, raw.scope)
    }
}

impl Fin {
    /// Create an index, panicking if it does not fit in the scope.
    pub fn new(index: usize, scope: usize) -> Fin {
        match Fin::try_new(index, scope) {
            Ok(fin) => fin,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(index: usize, scope: usize) -> Result<Fin, FinError> {
        if index < scope {
            Ok(Fin { index, scope })
        } else {
            Err(FinError::OutOfBounds { index, scope })
        }
    }

    /// The first index of a scope one larger than `scope`.
    pub fn first(scope: usize) -> Fin {
        Fin {
            index: 0,
            scope: scope + 1,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn scope(self) -> usize {
        self.scope
    }

    pub fn succ(self) -> Fin {
        self.shift(1)
    }

    /// Move the index up by `by`, growing the scope to match.
    pub fn shift(self, by: usize) -> Fin {
        Fin {
            index: self.index + by,
            scope: self.scope + by,
        }
    }

    /// Keep the index, but place it in a scope with `by` more variables on top.
    pub fn weaken(self, by: usize) -> Fin {
        Fin {
            index: self.index,
            scope: self.scope + by,
        }
    }

    /// Insert `by` fresh variables at position `at`. Indices below `at` are
    /// untouched, the rest move up.
    pub fn shift_from(self, at: usize, by: usize) -> Fin {
        if self.index < at {
            self.weaken(by)
        } else {
            self.shift(by)
        }
    }

    /// The inverse of `succ`. Index zero has no predecessor.
    pub fn pred(self) -> Option<Fin> {
        if self.index == 0 {
            None
        } else {
            Some(Fin {
                index: self.index - 1,
                scope: self.scope - 1,
            })
        }
    }

    /// Split a scope `p + m` into its first `p` slots and the remaining `m`.
    pub fn split(self, p: usize) -> Either<Fin, Fin> {
        assert!(
            p <= self.scope,
            "cannot split scope {} at {}",
            self.scope,
            p
        );
        if self.index < p {
            Either::Left(Fin {
                index: self.index,
                scope: p,
            })
        } else {
            Either::Right(Fin {
                index: self.index - p,
                scope: self.scope - p,
            })
        }
    }

    /// Remove the slots `k..k + m` from a scope of size `k + m + n`. Fails if
    /// this index is one of the removed slots.
    pub fn strengthen_rec(self, k: usize, m: usize, n: usize) -> Option<Fin> {
        assert_eq!(
            self.scope,
            k + m + n,
            "index {self} does not live in a scope of size {k} + {m} + {n}"
        );
        if self.index < k {
            Some(Fin {
                index: self.index,
                scope: k + n,
            })
        } else if self.index < k + m {
            None
        } else {
            Some(Fin {
                index: self.index - m,
                scope: k + n,
            })
        }
    }

    pub fn to_level(self) -> Level {
        Level(self.scope - self.index - 1)
    }

    /// Every index of the scope, from zero upwards.
    pub fn all(scope: usize) -> impl DoubleEndedIterator<Item = Fin> + ExactSizeIterator {
        (0..scope).map(move |index| Fin { index, scope })
    }
}

impl Display for Fin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.index)
    }
}

impl From<Fin> for usize {
    fn from(x: Fin) -> usize {
        x.index
    }
}

/// A de Bruijn level, counting binders from the outside in.
#[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Level(usize);

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}
