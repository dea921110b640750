//! # yaml2toml-core
//!
//! Converts configuration documents between YAML, TOML and JSON through a
//! single format-agnostic value tree.
//!
//! Decoding is *safe*: YAML tags can only select among the fixed scalar,
//! sequence and mapping vocabulary, never construct arbitrary types. Encoding
//! is *strict*: a value the target cannot express (TOML has no `null`, no
//! non-string keys, and needs a table at the root) is rejected with the path
//! of the offending node instead of being coerced.
//!
//! ## Quick start
//!
//! ```rust
//! use yaml2toml_core::convert_str;
//!
//! let yaml = "name: example\nversion: 1\ntags:\n  - alpha\n  - beta\n";
//! let toml = convert_str(yaml, "yaml", "toml").unwrap();
//! assert_eq!(toml, "name = \"example\"\nversion = 1\ntags = [\"alpha\", \"beta\"]\n");
//! ```
//!
//! ## Modules
//!
//! - [`value`] — the generic document tree
//! - [`format`] — format tags, names and file extensions
//! - [`decoder`] — source text → `Value`
//! - [`encoder`] — `Value` → target text, with shape validation
//! - [`mod@convert`] — the one-call decode + encode entry points
//! - [`batch`] — recursive directory conversion behind a `Workspace` trait
//! - [`error`] — error types

pub mod batch;
pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod value;
mod yaml_events;

pub use batch::{
    run_batch, BatchEvent, BatchOptions, BatchReport, FsWorkspace, SkipReason, Workspace,
};
pub use convert::{convert, convert_str};
pub use decoder::{decode, decode_str};
pub use encoder::{encode, encode_to_string, validate};
pub use error::{BatchError, Construct, ConvertError, Location};
pub use format::Format;
pub use value::{Timestamp, Value};
