//! `$format`, `$inlinecount` and custom (non-`$`) options

use super::{single_arg, OptionKey, OptionKind, QueryOption};
use crate::data::Datum;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

fn text_arg(kind: OptionKind, args: &[Datum]) -> Result<String> {
    let arg = single_arg(kind, args)?;
    match arg {
        Datum::String(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        other => Err(Error::InvalidArgument(format!(
            "{} expects a non-empty string, got {}",
            kind, other
        ))),
    }
}

/// Requested response format, e.g. `json` or `atom`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    format: String,
}

impl FormatOption {
    pub fn new<S: Into<String>>(format: S) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        text_arg(OptionKind::Format, args).map(Self::new)
    }
}

impl QueryOption for FormatOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Format
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::FORMAT)
    }

    fn value(&self) -> String {
        self.format.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineCount {
    AllPages,
    None,
}

impl FromStr for InlineCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allpages" => Ok(InlineCount::AllPages),
            "none" => Ok(InlineCount::None),
            other => Err(Error::InvalidArgument(format!(
                "$inlinecount must be 'allpages' or 'none', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for InlineCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineCount::AllPages => f.write_str("allpages"),
            InlineCount::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineCountOption {
    mode: InlineCount,
}

impl InlineCountOption {
    pub fn new(mode: InlineCount) -> Self {
        Self { mode }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        text_arg(OptionKind::InlineCount, args)?.parse().map(Self::new)
    }

    pub fn mode(&self) -> InlineCount {
        self.mode
    }
}

impl QueryOption for InlineCountOption {
    fn kind(&self) -> OptionKind {
        OptionKind::InlineCount
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::INLINECOUNT)
    }

    fn value(&self) -> String {
        self.mode.to_string()
    }
}

/// Service-specific option; its name must not start with `$`
#[derive(Debug, Clone, PartialEq)]
pub struct CustomOption {
    key: OptionKey,
    value: Datum,
}

impl CustomOption {
    pub fn new<V: Into<Datum>>(key: &str, value: V) -> Result<Self> {
        let key = OptionKey::new(key);
        if key.as_str().is_empty() || key.is_system() {
            return Err(Error::InvalidArgument(format!(
                "custom option name '{}' must be non-empty and not start with '$'",
                key
            )));
        }
        Ok(Self {
            key,
            value: value.into(),
        })
    }

    /// `[name, value]`, as two arguments or one array
    pub fn from_args(args: &[Datum]) -> Result<Self> {
        let parts = match args {
            [Datum::Array(parts)] => parts.as_slice(),
            _ => args,
        };
        match parts {
            [Datum::String(key), value] => Self::new(key, value.clone()),
            _ => Err(Error::InvalidArgument(
                "Custom takes a name and a value".to_string(),
            )),
        }
    }
}

impl QueryOption for CustomOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Custom
    }

    fn key(&self) -> OptionKey {
        self.key.clone()
    }

    fn value(&self) -> String {
        match &self.value {
            Datum::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
