use std::io;

/// Line-level failure from [`LineParser`](crate::LineParser).
///
/// Parsing fails fast on the offending physical line; both kinds carry
/// the 1-based line number.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: &'static str },
    #[error("indentation error at line {line}: {width} leading spaces match no open level")]
    Indentation { line: usize, width: usize },
}

/// Failure while loading a tree from a byte source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Failure while writing a tree to a sink.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
