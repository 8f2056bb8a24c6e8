use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Index;

/// Errors raised while loading or parsing a .bvh file.
///
/// Every variant coming from the parser carries the 1-based line number in the
/// original text and the raw line, so the offending input can be located
/// without parsing again. Parsing never recovers: the first error ends it.
#[derive(Error, Debug)]
pub enum BvhError {
    /// The file to load does not exist
    #[error("could not find file '{}'", .path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A structural keyword (`ROOT`, `{`, `}`, `OFFSET`, `MOTION`, ...) was expected
    #[error("line {line}: expected {expected}, found {}", describe_line(.text))]
    MalformedHeader {
        line: usize,
        text: String,
        expected: &'static str,
    },

    /// A float or integer could not be read
    #[error("line {line}: invalid number '{token}' in {}", describe_line(.text))]
    MalformedNumber {
        line: usize,
        text: String,
        token: String,
    },

    /// A CHANNELS entry that is none of the six recognized channel names
    #[error("line {line}: unknown channel type '{token}' in {}", describe_line(.text))]
    UnknownChannelType {
        line: usize,
        text: String,
        token: String,
    },

    /// A CHANNELS line or MOTION row whose value count disagrees with what was declared
    #[error("line {line}: expected {expected} values, found {found} in {}", describe_line(.text))]
    ChannelCountMismatch {
        line: usize,
        text: String,
        expected: usize,
        found: usize,
    },
}

impl BvhError {
    /// 1-based line of the input the error refers to.
    pub fn line(&self) -> Option<usize> {
        match self {
            BvhError::MalformedHeader { line, .. }
            | BvhError::MalformedNumber { line, .. }
            | BvhError::UnknownChannelType { line, .. }
            | BvhError::ChannelCountMismatch { line, .. } => Some(*line),
            BvhError::NotFound { .. } | BvhError::Io(_) => None,
        }
    }

    /// Raw text of the offending line. Empty when parsing ran past the end of the input.
    pub fn line_text(&self) -> Option<&str> {
        match self {
            BvhError::MalformedHeader { text, .. }
            | BvhError::MalformedNumber { text, .. }
            | BvhError::UnknownChannelType { text, .. }
            | BvhError::ChannelCountMismatch { text, .. } => Some(text),
            BvhError::NotFound { .. } | BvhError::Io(_) => None,
        }
    }
}

fn describe_line(text: &str) -> String {
    if text.is_empty() {
        "end of file".to_string()
    } else {
        format!("\"{}\"", text)
    }
}

/// Errors raised while stepping through motion frames.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    /// A channel binding whose target node is not part of the skeleton. Bindings made
    /// through `Skeleton::bind_channel` are checked up front, so this is not raised for
    /// parsed or builder-made skeletons.
    #[error("channel {channel} is bound to node {target}, which does not exist")]
    UnsupportedChannel { channel: Index, target: Index },
}

/// Result type using BvhError
pub type Result<T> = std::result::Result<T, BvhError>;
