use std::str::FromStr;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{ConnectionKey, Diagram, PortRef};

// Component ids may contain ':'; the port name is everything after the last one.
static PORT_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(.+):([^:\s]+)\s*$").unwrap());
static CONNECTION_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+:[^:\s]+)\s*->\s*(.+:[^:\s]+)\s*$").unwrap());

/// Parse a diagram definition. JSON5 is accepted, so plain JSON is too.
pub fn parse_diagram(input: &str) -> Result<Diagram> {
    let diagram: Diagram = json5::from_str(input).context("invalid diagram definition")?;
    Ok(diagram)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("expected 'component:port', got '{0}'")]
    PortRef(String),
    #[error("expected 'component:port->component:port', got '{0}'")]
    ConnectionKey(String),
}

impl FromStr for PortRef {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PORT_REF_RE
            .captures(s)
            .ok_or_else(|| KeyParseError::PortRef(s.to_string()))?;
        Ok(PortRef::new(caps[1].trim(), &caps[2]))
    }
}

impl FromStr for ConnectionKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CONNECTION_KEY_RE
            .captures(s)
            .ok_or_else(|| KeyParseError::ConnectionKey(s.to_string()))?;
        let from = caps[1]
            .parse()
            .map_err(|_| KeyParseError::ConnectionKey(s.to_string()))?;
        let to = caps[2]
            .parse()
            .map_err(|_| KeyParseError::ConnectionKey(s.to_string()))?;
        Ok(ConnectionKey { from, to })
    }
}
