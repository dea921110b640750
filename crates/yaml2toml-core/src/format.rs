//! Serialization format tags.

use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;

/// A textual serialization grammar the converter can decode from and encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Yaml, Format::Toml, Format::Json];

    pub fn name(self) -> &'static str {
        match self {
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
            Format::Json => "JSON",
        }
    }

    /// Conventional extension (without the dot) for files written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// Extensions recognized when searching for source files of this format.
    pub fn input_extensions(self) -> &'static [&'static str] {
        match self {
            Format::Yaml => &["yml", "yaml"],
            Format::Toml => &["toml"],
            Format::Json => &["json"],
        }
    }

    /// Whether a document in this format must have a mapping at its root.
    pub fn requires_mapping_root(self) -> bool {
        matches!(self, Format::Toml)
    }

    /// Guess the format from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|f| {
            f.input_extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!("YAML".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!(" Toml ".parse::<Format>().unwrap(), Format::Toml);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "ini".parse::<Format>().unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat(ref tag) if tag == "ini"));
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(Format::from_extension("yml"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("YAML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("toml"), Some(Format::Toml));
        assert_eq!(Format::from_extension("txt"), None);
    }
}
