//! The single-shot conversion entry points.

use tracing::trace;

use crate::decoder::{decode, decode_str};
use crate::encoder::{encode, encode_to_string};
use crate::error::Result;
use crate::format::Format;

/// Convert one document from `from` to `to`.
///
/// Pure and deterministic: the same bytes always yield the same bytes, and
/// nothing outside the return value is touched.
///
/// # Example
/// ```
/// use yaml2toml_core::{convert, Format};
///
/// let toml = convert(b"name: example\n", Format::Yaml, Format::Toml).unwrap();
/// assert_eq!(toml, b"name = \"example\"\n");
/// ```
pub fn convert(source: &[u8], from: Format, to: Format) -> Result<Vec<u8>> {
    trace!(%from, %to, bytes = source.len(), "converting document");
    let value = decode(source, from)?;
    encode(&value, to)
}

/// Convert text using format tags such as `"yaml"`, `"toml"` or `"json"`.
///
/// Unknown tags fail with [`ConvertError::UnsupportedFormat`](crate::ConvertError::UnsupportedFormat).
pub fn convert_str(source: &str, from: &str, to: &str) -> Result<String> {
    let from: Format = from.parse()?;
    let to: Format = to.parse()?;
    let value = decode_str(source, from)?;
    encode_to_string(&value, to)
}
