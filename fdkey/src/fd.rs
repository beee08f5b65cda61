use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A functional dependency `lhs -> rhs`.
///
/// The right-hand side never repeats attributes of the left-hand side: they
/// are dropped on construction since `X -> X` carries no information.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawFd<T>", bound(deserialize = "T: Deserialize<'de> + Clone"))]
pub struct FunctionalDependency<T: Ord> {
    lhs: BTreeSet<T>,
    rhs: BTreeSet<T>,
}

/// Wire form; goes through [`FunctionalDependency::new`] when read back.
#[derive(Deserialize)]
struct RawFd<T: Ord> {
    lhs: BTreeSet<T>,
    rhs: BTreeSet<T>,
}

impl<T: Ord + Clone> From<RawFd<T>> for FunctionalDependency<T> {
    fn from(raw: RawFd<T>) -> Self {
        Self::new(raw.lhs, raw.rhs)
    }
}

/// Short alias, mirrors how dependencies are usually written down.
pub type Fd<T> = FunctionalDependency<T>;

impl<T: Ord + Clone> FunctionalDependency<T> {
    pub fn new<L, R>(lhs: L, rhs: R) -> Self
    where
        L: IntoIterator<Item = T>,
        R: IntoIterator<Item = T>,
    {
        let lhs: BTreeSet<T> = lhs.into_iter().collect();
        let rhs = rhs.into_iter().filter(|a| !lhs.contains(a)).collect();
        Self { lhs, rhs }
    }

    /// `x -> y`
    pub fn singleton(x: T, y: T) -> Self {
        Self::new([x], [y])
    }

    /// `{} -> y`: `y` is a constant of the relation.
    pub fn constant(y: T) -> Self {
        Self::new([], [y])
    }

    /// `{} -> ys`
    pub fn constants<R: IntoIterator<Item = T>>(ys: R) -> Self {
        Self::new([], ys)
    }

    pub fn lhs(&self) -> &BTreeSet<T> {
        &self.lhs
    }

    pub fn rhs(&self) -> &BTreeSet<T> {
        &self.rhs
    }

    /// Split into one dependency per right-hand side attribute.
    pub fn decompose(&self) -> impl Iterator<Item = FunctionalDependency<T>> + '_ {
        self.rhs.iter().map(move |y| FunctionalDependency {
            lhs: self.lhs.clone(),
            rhs: BTreeSet::from([y.clone()]),
        })
    }
}

impl<T: Ord + fmt::Display> fmt::Display for FunctionalDependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side<T: fmt::Display>(f: &mut fmt::Formatter<'_>, s: &BTreeSet<T>) -> fmt::Result {
            write!(f, "{{")?;
            for (i, a) in s.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", a)?;
            }
            write!(f, "}}")
        }
        side(f, &self.lhs)?;
        write!(f, " -> ")?;
        side(f, &self.rhs)
    }
}

/// Every attribute mentioned on either side of `fds`.
pub fn attributes_of<T: Ord + Clone>(fds: &[FunctionalDependency<T>]) -> BTreeSet<T> {
    let mut out = BTreeSet::new();
    for fd in fds {
        out.extend(fd.lhs.iter().cloned());
        out.extend(fd.rhs.iter().cloned());
    }
    out
}
