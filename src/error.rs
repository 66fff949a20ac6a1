use core::fmt;
use std::fmt::Debug;

/// The two-valued error taxonomy of the wiring-and-stepping engine.
///
/// Every fallible operation in [`crate::Fabric`] returns one of these two
/// kinds: a precondition violation (`InvalidArg`, `InvalidPtr`) or an
/// allocation failure (`AllocFailed`). No other error kinds exist.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A `Ptr` handle did not refer to a live machine in this `Fabric`,
    /// either because it was never inserted here or because the machine it
    /// pointed to has since been deleted.
    #[error("InvalidPtr")]
    InvalidPtr,
    /// A precondition on the arguments of a call was violated (zero-size
    /// where one is forbidden, out-of-range bit index, overflowing range,
    /// missing callback, etc).
    #[error("{0}")]
    InvalidArg(&'static str),
    /// Allocation or reallocation failed while growing a buffer or a
    /// consumer list.
    #[error("AllocFailed")]
    AllocFailed,
}

pub(crate) struct DisplayStr<'a>(pub &'a str);
impl<'a> Debug for DisplayStr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPtr => write!(f, "InvalidPtr"),
            Self::InvalidArg(arg0) => f.debug_tuple("InvalidArg").field(&DisplayStr(arg0)).finish(),
            Self::AllocFailed => write!(f, "AllocFailed"),
        }
    }
}
