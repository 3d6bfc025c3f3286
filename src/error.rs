//! This module contains types and functions related to public-facing errors.

use std::{error::Error, fmt};

/// Represents an error that can occur while turning PCRE byte-code into an
/// NFA.
///
/// A failed build never yields a partially constructed automaton; callers
/// that want the "never matches" fallback instead of an error can use
/// [`Builder::build_or_non_matching`](crate::Builder::build_or_non_matching).
#[derive(Debug)]
pub struct BuildError {
    kind: Box<BuildErrorKind>,
}

impl BuildError {
    fn new(kind: BuildErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    pub(crate) fn unknown_opcode(code: u8) -> Self {
        Self::new(BuildErrorKind::UnknownOpcode(code))
    }

    pub(crate) fn malformed_group(found: u8) -> Self {
        Self::new(BuildErrorKind::MalformedGroup { found })
    }

    pub(crate) fn truncated(at: usize, len: usize) -> Self {
        Self::new(BuildErrorKind::Truncated { at, len })
    }

    pub(crate) fn compile(err: Box<dyn Error + Send + Sync>) -> Self {
        Self::new(BuildErrorKind::Compile(err))
    }

    /// Returns true if this error was produced by the external byte-code
    /// compiler rather than by NFA construction itself.
    pub fn is_compile(&self) -> bool {
        matches!(*self.kind, BuildErrorKind::Compile(_))
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            BuildErrorKind::UnknownOpcode(code) => {
                write!(f, "unknown opcode: {code}")
            },
            BuildErrorKind::MalformedGroup { found } => {
                write!(f, "group terminated by unexpected opcode: {found}")
            },
            BuildErrorKind::Truncated { at, len } => {
                write!(f, "byte-code ends unexpectedly: offset {at} out of {len} bytes")
            },
            BuildErrorKind::Compile(err) => {
                write!(f, "external compiler error: {err}")
            },
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &*self.kind {
            BuildErrorKind::Compile(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Represents the specific kind of a [`BuildError`].
#[derive(Debug)]
enum BuildErrorKind {
    /// The dispatcher read an opcode outside the recognized set, or an opcode
    /// that is never valid at the position it appeared in.
    UnknownOpcode(u8),
    /// A group was terminated by something other than the ordinary or the
    /// greedy-repeat `KET` variant.
    MalformedGroup { found: u8 },
    /// An opcode or operand read ran past the end of the byte-code buffer.
    Truncated { at: usize, len: usize },
    /// The external byte-code compiler reported a failure.
    Compile(Box<dyn Error + Send + Sync>),
}
