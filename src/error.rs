use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, covering every failure this library can report.
///
/// The variants fall into the three tiers the transpiler distinguishes:
///
/// ## Recoverable-local
/// Absorbed at the component boundary where they occur; the caller logs the
/// condition, substitutes a sentinel and continues.
/// - [`Error::UnknownTokenKind`] - token table tag outside the modeled set
///
/// ## Recoverable-per-method
/// The affected method's reconstruction yields an empty or partial statement
/// list; the rest of the type is unaffected.
/// - [`Error::TruncatedBytecode`] - instruction cursor ran past the body
///
/// ## Fatal-per-run
/// Unwinds to the driver and terminates the run.
/// - [`Error::SectionMapping`] - an RVA not covered by any section
/// - [`Error::NameCollision`] - two types sanitizing to one emitted name
/// - [`Error::NoExplicitMembers`] - proxy synthesis requested without cause
///
/// File-parsing variants ([`Error::Malformed`], [`Error::OutOfBounds`],
/// [`Error::NotSupported`], [`Error::Empty`], [`Error::FileError`],
/// [`Error::GoblinErr`]) are always fatal: a module that cannot be read
/// cannot be partially transpiled.
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The structure does not conform to the PE/ECMA-335 layout. The source
    /// location where the malformation was detected is captured for
    /// debugging.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// The input is not a PE image, or carries no CLR metadata directory.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Recursion limit reached while decoding a signature blob.
    ///
    /// Signature trees are bounded to protect against crafted blobs that
    /// nest modifiers or generic instantiations without end. The associated
    /// value is the limit that was hit.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The token's table tag is not one of the modeled kinds.
    ///
    /// Only TypeDef, TypeRef, TypeSpec, Field, MethodDef, MemberRef and
    /// MethodSpec tokens resolve. Callers treat this as non-fatal and
    /// substitute the `"unknown"` sentinel name.
    #[error("Token kind is not modeled - {0}")]
    UnknownTokenKind(Token),

    /// A relative virtual address is not mapped by any section.
    ///
    /// Aborts processing of the current method or field; the run continues
    /// with the remaining items unless reached through a path that cannot
    /// skip.
    #[error("RVA could not be mapped to a file offset - 0x{0:x}")]
    SectionMapping(u32),

    /// A method's instruction stream ended in the middle of an instruction.
    ///
    /// Reconstruction of that method stops; statements decoded so far are
    /// discarded by the caller and the run continues.
    #[error("Truncated instruction stream at body offset {offset}")]
    TruncatedBytecode {
        /// Byte offset into the method body at which decoding failed
        offset: usize,
    },

    /// A token referenced a row that does not exist in its table.
    #[error("Failed to find metadata row - {0}")]
    RowNotFound(Token),

    /// Two distinct types sanitize to the same emitted identifier.
    ///
    /// The graph rejects the colliding type rather than silently merging
    /// declarations; this terminates the run.
    #[error("Emitted name '{name}' collides: {existing} vs {incoming}")]
    NameCollision {
        /// The sanitized identifier both types map to
        name: String,
        /// Token of the type already admitted under the name
        existing: Token,
        /// Token of the type that attempted to reuse the name
        incoming: Token,
    },

    /// Proxy synthesis was invoked on a type without explicit members.
    ///
    /// A programming-contract violation on the caller's side, not a data
    /// error; the associated value names the offending type.
    #[error("Dispatch proxy requested for '{0}', which has no explicit interface members")]
    NoExplicitMembers(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_captures_location() {
        let err = malformed_error!("bad stream");
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "bad stream");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn malformed_formats_arguments() {
        let err = malformed_error!("row {} of {}", 3, "TypeDef");
        assert!(err.to_string().contains("row 3 of TypeDef"));
    }

    #[test]
    fn display_identifies_offender() {
        let err = Error::NameCollision {
            name: "Widget".into(),
            existing: Token::new(0x0200_0001),
            incoming: Token::new(0x0200_0007),
        };
        let text = err.to_string();
        assert!(text.contains("Widget"));
        assert!(text.contains("0x02000001"));
        assert!(text.contains("0x02000007"));
    }

    #[test]
    fn unknown_token_kind_is_display() {
        let err = Error::UnknownTokenKind(Token::new(0x0800_0001));
        assert!(err.to_string().contains("0x08000001"));
    }
}
