// Copyright @yucwang 2026

//! Reader for the Poisson simulator configuration files.
//!
//! Lines look like `<name> [=] <value> [value...] [# comment]`. Each value
//! token is typed as an integer if it parses as one, otherwise a float,
//! otherwise it is kept as text. A line carrying several values stores them
//! as a list in token order.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::math::constants::{Float, Int};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("configuration file {0} not found")]
    NotFound(PathBuf),
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration parameter `{0}` is missing")]
    MissingParameter(String),
    #[error("configuration parameter `{name}` = {found} is not {expected}")]
    InvalidParameter {
        name: String,
        expected: &'static str,
        found: String,
    },
}
type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(Int),
    Float(Float),
    Text(String),
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Types a single token: integer, then float, then text.
    pub fn coerce(token: &str) -> Self {
        if let Ok(v) = token.parse::<Int>() {
            return ConfigValue::Int(v);
        }
        if let Ok(v) = token.parse::<Float>() {
            return ConfigValue::Float(v);
        }
        ConfigValue::Text(token.to_string())
    }

    pub fn as_int(&self) -> Option<Int> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<Float> {
        match self {
            ConfigValue::Int(v) => Some(*v as Float),
            ConfigValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Float(v) => write!(f, "{:?}", v),
            ConfigValue::Text(v) => write!(f, "{}", v),
            ConfigValue::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Parameter table in file order. A repeated name keeps its first position
/// and takes the last value.
#[derive(Debug, Clone, Default)]
pub struct Config {
    entries: Vec<(String, ConfigValue)>,
    index: HashMap<String, usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: ConfigValue) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_int(&self, name: &str) -> Option<Int> {
        self.get(name).and_then(ConfigValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<Float> {
        self.get(name).and_then(ConfigValue::as_float)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ConfigValue::as_text)
    }

    pub fn require_int(&self, name: &str) -> Result<Int> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| invalid(name, "an integer", value))
    }

    pub fn require_float(&self, name: &str) -> Result<Float> {
        let value = self.require(name)?;
        value.as_float().ok_or_else(|| invalid(name, "a number", value))
    }

    /// Non-negative integer usable as a count or dimension.
    pub fn require_count(&self, name: &str) -> Result<usize> {
        let value = self.require(name)?;
        match value.as_int() {
            Some(v) if v >= 0 => Ok(v as usize),
            _ => Err(invalid(name, "a non-negative integer", value)),
        }
    }

    pub fn require(&self, name: &str) -> Result<&ConfigValue> {
        self.get(name).ok_or_else(|| ConfigError::MissingParameter(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn invalid(name: &str, expected: &'static str, value: &ConfigValue) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.to_string(),
        expected,
        found: value.to_string(),
    }
}

fn parse_line(line: &str) -> Option<(String, ConfigValue)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || tokens[0].starts_with('#') {
        return None;
    }

    let mut values: Vec<ConfigValue> = Vec::with_capacity(tokens.len() - 1);
    for token in &tokens[1..] {
        if token.starts_with('#') {
            break;
        }
        if *token == "=" {
            continue;
        }
        values.push(ConfigValue::coerce(token));
    }

    let value = match values.len() {
        0 => return None,
        1 => values.remove(0),
        _ => ConfigValue::List(values),
    };
    Some((tokens[0].to_string(), value))
}

pub fn parse_config(contents: &str) -> Config {
    let mut config = Config::new();
    for (number, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Some((name, value)) => config.insert(name, value),
            None => log::trace!("config line {} skipped: {:?}", number + 1, line),
        }
    }
    config
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read { path: path.to_path_buf(), source }
        }
    })?;
    let contents = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = contents {
        log::warn!("{} is not valid UTF-8, invalid bytes replaced.", path.display());
    }
    let config = parse_config(&contents);
    log::info!("Loaded {} parameters from {}.", config.len(), path.display());
    Ok(config)
}
