use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while decoding an ELF object.
///
/// Structural violations and I/O failures abort the current parse. Advisory data
/// (vendor attributes, unresolvable names) never surfaces here; the decoder degrades
/// instead. Every variant carries the byte offset it was detected at where one exists.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid ELF magic {found:02x?} at offset {offset:#x}")]
    InvalidMagic { found: [u8; 4], offset: u64 },

    #[error("unsupported ELF class {value} at offset {offset:#x}")]
    UnsupportedClass { value: u8, offset: u64 },

    #[error("unsupported ELF data encoding {value} at offset {offset:#x}")]
    UnsupportedEndianness { value: u8, offset: u64 },

    #[error("extended section count resolves to {count} sections (table at {offset:#x})")]
    MalformedSectionCount { count: u64, offset: u64 },

    #[error("section header entry size {size} is below the {expected} byte layout (table at {offset:#x})")]
    InvalidSectionEntrySize {
        size: u16,
        expected: u16,
        offset: u64,
    },

    #[error("section name string table index {index} is invalid for {count} sections (table at {offset:#x})")]
    InvalidStringTableIndex { index: u32, count: usize, offset: u64 },

    #[error("section {index} referenced as name string table has type {found:#x} (header at {offset:#x})")]
    WrongStringTableType { index: usize, found: u32, offset: u64 },

    #[error("truncated input: {wanted} bytes required at offset {offset:#x}")]
    Truncated { offset: u64, wanted: u64 },

    #[error("failed to seek to offset {offset:#x}")]
    SeekFailed {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to query the stream position")]
    Position {
        #[source]
        source: io::Error,
    },

    #[error("read failed at offset {offset:#x}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CPU name {name:?} does not resolve to its own machine classification")]
    ResolutionExhausted { name: String },
}

/// Coarse grouping of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidMagic,
    UnsupportedClass,
    UnsupportedEndianness,
    MalformedSectionCount,
    InvalidSectionEntrySize,
    InvalidStringTableIndex,
    WrongStringTableType,
    Truncated,
    SeekFailed,
    Io,
    ResolutionExhausted,
}

impl ErrorKind {
    /// Structural violation of the object format.
    pub fn is_format(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidMagic
                | ErrorKind::UnsupportedClass
                | ErrorKind::UnsupportedEndianness
                | ErrorKind::MalformedSectionCount
                | ErrorKind::InvalidSectionEntrySize
                | ErrorKind::InvalidStringTableIndex
                | ErrorKind::WrongStringTableType
        )
    }

    /// The byte source could not deliver what was asked of it.
    pub fn is_io(self) -> bool {
        matches!(self, ErrorKind::Truncated | ErrorKind::SeekFailed | ErrorKind::Io)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMagic { .. } => ErrorKind::InvalidMagic,
            Error::UnsupportedClass { .. } => ErrorKind::UnsupportedClass,
            Error::UnsupportedEndianness { .. } => ErrorKind::UnsupportedEndianness,
            Error::MalformedSectionCount { .. } => ErrorKind::MalformedSectionCount,
            Error::InvalidSectionEntrySize { .. } => ErrorKind::InvalidSectionEntrySize,
            Error::InvalidStringTableIndex { .. } => ErrorKind::InvalidStringTableIndex,
            Error::WrongStringTableType { .. } => ErrorKind::WrongStringTableType,
            Error::Truncated { .. } => ErrorKind::Truncated,
            Error::SeekFailed { .. } => ErrorKind::SeekFailed,
            Error::Position { .. } | Error::Io { .. } | Error::Open { .. } => ErrorKind::Io,
            Error::ResolutionExhausted { .. } => ErrorKind::ResolutionExhausted,
        }
    }

    /// Byte offset at which the error was detected, if the error is tied to one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::InvalidMagic { offset, .. }
            | Error::UnsupportedClass { offset, .. }
            | Error::UnsupportedEndianness { offset, .. }
            | Error::MalformedSectionCount { offset, .. }
            | Error::InvalidSectionEntrySize { offset, .. }
            | Error::InvalidStringTableIndex { offset, .. }
            | Error::WrongStringTableType { offset, .. }
            | Error::Truncated { offset, .. }
            | Error::SeekFailed { offset, .. }
            | Error::Io { offset, .. } => Some(*offset),
            Error::Position { .. } | Error::Open { .. } | Error::ResolutionExhausted { .. } => {
                None
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
