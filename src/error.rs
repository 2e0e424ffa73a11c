//! Error kinds for every stage of the pipeline: lexing, parsing, type
//! checking, linking, structural validation, and fixed-width arithmetic.

use thiserror::Error;

/// Errors raised while tokenizing input text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("{path}:{line}: unclosed quoted string starting near {token}")]
    UnclosedString {
        path: String,
        line: usize,
        token: String,
    },

    #[error("{path}:{line}: unknown escape sequence in {token}")]
    UnknownEscape {
        path: String,
        line: usize,
        token: String,
    },

    #[error("{path}:{line}: expected hexadecimal digits, found {token}")]
    MissingHexDigits {
        path: String,
        line: usize,
        token: String,
    },

    #[error("{path}:{line}: unexpected character {token}")]
    UnexpectedCharacter {
        path: String,
        line: usize,
        token: String,
    },
}

/// Errors raised while parsing a token stream into a `Module`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("{path}:{line}: expected {expected}, found {token}")]
    UnexpectedToken {
        path: String,
        line: usize,
        expected: String,
        token: String,
    },

    #[error("{path}:{line}: malformed {construct}: {token}")]
    MalformedConstruct {
        path: String,
        line: usize,
        construct: String,
        token: String,
    },

    #[error("{path}: unexpected end of file")]
    UnexpectedEof { path: String },
}

/// Errors raised when a term, instruction, or declaration is constructed (or
/// linked) at an inconsistent type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{path}:{line}: type mismatch: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        line: usize,
        expected: String,
        found: String,
    },

    #[error("incompatible declaration for {reference}: {reason}")]
    IncompatibleDeclaration { reference: String, reason: String },
}

/// Errors raised while merging modules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("duplicate function definition: {reference}")]
    DuplicateDefinition { reference: String },

    #[error("inconsistent {what} found during linking: '{first}' vs '{second}'")]
    InconsistentTargetInfo {
        what: String,
        first: String,
        second: String,
    },

    #[error("type mismatch for global: {reference}")]
    GlobalTypeMismatch { reference: String },

    #[error("function declaration mismatch: {reference}")]
    SignatureMismatch { reference: String },
}

/// Errors raised by structural validation of terms, instructions, or
/// functions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Message(String),
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError::Message(message.into())
    }
}

/// Errors raised by fixed-width integer arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("division by zero in {op} at bit width {bits}")]
    DivisionByZero { op: String, bits: u32 },

    #[error("invalid bit width: {bits}")]
    InvalidBitWidth { bits: i64 },
}

/// The crate-wide error type; every fallible public operation returns
/// `Result<T>` in terms of this enum.
#[derive(Debug, Error)]
pub enum LlirError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LlirError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_error_messages_include_position() {
        let err = LexicalError::UnexpectedCharacter {
            path: "a.ll".into(),
            line: 3,
            token: "'#'".into(),
        };
        assert!(err.to_string().contains("a.ll:3"));
    }

    #[test]
    fn llir_error_converts_from_components() {
        let err: LlirError = DomainError::InvalidBitWidth { bits: 0 }.into();
        assert!(matches!(err, LlirError::Domain(_)));
    }
}
