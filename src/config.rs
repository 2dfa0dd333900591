use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output options for the text listing.
///
/// Every field may be set from a TOML file; omitted fields keep their
/// defaults and unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// Include file offsets in operator comment lines (cleared by -n)
    pub show_offsets: bool,
    /// Hex dump payloads and binary arrays (cleared by -d)
    pub dump_hex: bool,
    /// Bytes per hex dump row
    pub dump_width: usize,
    /// Stop dumping a block after this many bytes
    pub max_dump_bytes: Option<usize>,
    /// Spaces per graphics state nesting level
    pub indent_width: usize,
    /// Show printable ubyte arrays as quoted strings
    pub text_arrays: bool,
    /// Show enumeration names in place of their numbers
    pub enum_labels: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            show_offsets: true,
            dump_hex: true,
            dump_width: 16,
            max_dump_bytes: None,
            indent_width: 4,
            text_arrays: true,
            enum_labels: true,
        }
    }
}

impl OutputOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: OutputOptions = toml::from_str(text).map_err(ConfigError::Parse)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dump_width == 0 {
            return Err(ConfigError::Invalid(
                "dump_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Cannot read options file: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid options file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid option: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
