//! Reader and writer for the indented tree mapping format used to persist
//! configuration, model, and view trees.
//!
//! The format is a constrained YAML subset: one `name: value` record per
//! physical line, nesting expressed purely by leading spaces, `#` comment
//! lines, and `|`/`>` multi-line scalar blocks. Sequences, anchors, tags,
//! and flow collections are not part of the format.
//!
//! ```text
//! server:
//!     host: 127.0.0.1
//!     motd: |
//!         line one
//!         line two
//! timeout: 30
//! ```
//!
//! Loading mutates a caller-owned [`Node`] tree in place and is not
//! atomic: a failed load keeps the nodes added before the offending line.
//! Saving emits values raw, so only scalars without newlines or quote
//! collisions are guaranteed to round-trip.

mod error;
mod parse;
mod reader;
mod tree;
mod writer;

pub use error::{LoadError, ParseError, SaveError};
pub use parse::{BlockStyle, LineEvent, LineParser};
pub use reader::TreeReader;
pub use tree::Node;
pub use writer::{Format, TreeWriter};
