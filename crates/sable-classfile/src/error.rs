//! Parse failures, located by byte offset into the class file where one is known.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("class file is truncated")]
    Truncated,
    #[error("{0} bytes left over after the structure ended")]
    TrailingBytes(usize),
    #[error("not a class file: magic is 0x{0:08x}")]
    BadMagic(u32),
    #[error("constant pool has no usable entry #{0}")]
    BadConstantIndex(u16),
    #[error("unknown constant pool tag {0}")]
    BadConstantTag(u8),
    #[error("constant pool entry #{index} is {found}, expected {expected}")]
    ConstantMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
    #[error("constant is not valid modified UTF-8")]
    BadModifiedUtf8,
    #[error("invalid descriptor `{0}`")]
    BadDescriptor(String),
    #[error("malformed {0} attribute")]
    BadAttribute(&'static str),
    #[error("unknown element_value tag {0:?}")]
    BadElementTag(char),
}

/// An [`ErrorKind`] plus the byte offset the parser had reached, if the failure came from
/// reading class-file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<usize>,
}

impl Error {
    pub(crate) fn at(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset: Some(offset),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Keeps an existing offset; the innermost location wins.
    pub(crate) fn or_at(mut self, offset: usize) -> Self {
        self.offset.get_or_insert(offset);
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, offset: None }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} (at byte {offset})", self.kind),
            None => self.kind.fmt(f),
        }
    }
}

impl std::error::Error for Error {}
