//! Parameter definitions and typed values
//!
//! This module defines the structures an application registers its parameters
//! with, plus the tagged scalar value type they resolve to.

use crate::error::{ParamError, ParamResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameter definition
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name (the CLI long option)
    pub name: String,

    /// Usage description for help text
    pub about: Option<String>,

    /// Extra CLI long names for the same parameter
    pub aliases: Vec<String>,

    /// Value type
    pub kind: ValueKind,

    /// Default value, applied when nothing else resolves one
    pub default: Option<ParamValue>,

    /// Environment variable to read from when the CLI does not set a value
    pub env: Option<String>,

    /// Interactive prompt, used when a command requires this parameter
    /// and no value has resolved
    pub prompt: Option<PromptSpec>,

    /// Whether resolved values are written back to the persisted store
    pub persist: bool,

    /// Hidden parameter (not exposed on the CLI or in help)
    pub hidden: bool,
}

impl ParamDef {
    /// Create a new parameter definition
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        ParamDef {
            name: name.into(),
            about: None,
            aliases: Vec::new(),
            kind,
            default: None,
            env: None,
            prompt: None,
            persist: false,
            hidden: false,
        }
    }

    /// Set the usage description
    pub fn about(mut self, text: impl Into<String>) -> Self {
        self.about = Some(text.into());
        self
    }

    /// Add a CLI alias
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    /// Set the default value
    pub fn default_value(mut self, value: ParamValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the environment variable fallback
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// Attach an interactive prompt
    pub fn prompt(mut self, text: impl Into<String>) -> Self {
        self.prompt = Some(PromptSpec {
            text: text.into(),
            sensitive: false,
            retries: None,
        });
        self
    }

    /// Attach a masked (no-echo) interactive prompt
    pub fn prompt_sensitive(mut self, text: impl Into<String>) -> Self {
        self.prompt = Some(PromptSpec {
            text: text.into(),
            sensitive: true,
            retries: None,
        });
        self
    }

    /// Override the prompt retry ceiling for this parameter
    pub fn prompt_retries(mut self, attempts: u32) -> Self {
        if let Some(spec) = &mut self.prompt {
            spec.retries = Some(attempts);
        }
        self
    }

    /// Persist resolved values to the parameter store
    pub fn persist(mut self) -> Self {
        self.persist = true;
        self
    }

    /// Hide this parameter from the CLI and help
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Interactive prompt specification
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// Prompt text shown to the user
    pub text: String,

    /// Whether input is masked (passwords, tokens)
    pub sensitive: bool,

    /// Retry ceiling override; `None` uses the run's default
    pub retries: Option<u32>,
}

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Bool,
    Int,
    Float,
}

impl ValueKind {
    /// Parse a raw string into a value of this kind
    pub fn parse(&self, name: &str, raw: &str) -> ParamResult<ParamValue> {
        match self {
            ValueKind::Str => Ok(ParamValue::Str(raw.to_string())),
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(ParamValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(ParamValue::Bool(false)),
                _ => Err(ParamError::InvalidValue {
                    name: name.to_string(),
                    error: format!("'{}' is not a boolean", raw),
                }),
            },
            ValueKind::Int => raw
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|e| ParamError::InvalidValue {
                    name: name.to_string(),
                    error: e.to_string(),
                }),
            ValueKind::Float => raw
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| ParamError::InvalidValue {
                    name: name.to_string(),
                    error: e.to_string(),
                }),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Str => "string",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
        };
        write!(f, "{}", label)
    }
}

/// A resolved parameter value
///
/// Untagged so the persisted store stays a flat JSON key-value document.
/// Variant order matters for deserialization: bool and numbers must be tried
/// before strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Str(_) => ValueKind::Str,
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::Int(_) => ValueKind::Int,
            ParamValue::Float(_) => ValueKind::Float,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float accessor; integer values coerce
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "{}", s),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}
