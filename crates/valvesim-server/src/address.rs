//! Wire-address parsing.
//!
//! Addresses use the `ns=<namespace>;i=<numeric-id>` or
//! `ns=<namespace>;s=<string-id>` syntax. Parsing is a typed field scan
//! over the `;`-separated parts; anything else is rejected for that entry
//! alone, never for the whole load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a wire address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("invalid namespace index in '{0}'")]
    InvalidNamespace(String),

    #[error("invalid numeric identifier in '{0}'")]
    InvalidNumericId(String),

    #[error("address '{0}' carries no identifier")]
    MissingIdentifier(String),

    #[error("unrecognized address field '{0}'")]
    UnknownField(String),
}

/// Identifier half of a node address: numeric or string token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
}

impl Identifier {
    /// The identifier without its `i=`/`s=` field prefix.
    pub fn raw(&self) -> String {
        match self {
            Identifier::Numeric(id) => id.to_string(),
            Identifier::String(id) => id.clone(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(id) => write!(f, "i={id}"),
            Identifier::String(id) => write!(f, "s={id}"),
        }
    }
}

/// Identity of a live node: namespace index plus identifier. Immutable
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeAddress {
    pub fn numeric(namespace: u16, id: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(id),
        }
    }

    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(id.into()),
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};{}", self.namespace, self.identifier)
    }
}

impl FromStr for NodeAddress {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().is_empty() {
            return Err(AddressError::Empty);
        }

        let mut namespace: u16 = 0;
        let mut identifier: Option<Identifier> = None;

        for part in input.split(';') {
            if let Some(value) = part.strip_prefix("ns=") {
                namespace = value
                    .parse()
                    .map_err(|_| AddressError::InvalidNamespace(input.to_string()))?;
            } else if let Some(value) = part.strip_prefix("i=") {
                let id = value
                    .parse()
                    .map_err(|_| AddressError::InvalidNumericId(input.to_string()))?;
                identifier = Some(Identifier::Numeric(id));
            } else if let Some(value) = part.strip_prefix("s=") {
                identifier = Some(Identifier::String(value.to_string()));
            } else {
                return Err(AddressError::UnknownField(part.to_string()));
            }
        }

        match identifier {
            Some(identifier) => Ok(Self {
                namespace,
                identifier,
            }),
            None => Err(AddressError::MissingIdentifier(input.to_string())),
        }
    }
}
