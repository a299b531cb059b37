// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hostname Value Object with DNS Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hostname validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostnameError {
    #[error("Hostname is empty")]
    Empty,

    #[error("Hostname exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Label exceeds maximum length of 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Invalid character in hostname: {0}")]
    InvalidCharacter(char),

    #[error("Label cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericLabel(String),

    #[error("Wildcard is only allowed as the whole leftmost label: {0}")]
    MisplacedWildcard(String),
}

/// DNS hostname value object (RFC 1123), optionally a leftmost wildcard
///
/// Invariants:
/// - Total length ≤ 253 characters, each label ≤ 63 characters
/// - Labels contain only alphanumeric characters and hyphens
/// - Labels cannot start or end with hyphens
/// - The last label is not all numeric
/// - `*` may appear only as the entire first label (`*.example.com`)
/// - Stored lowercase, so equality is case-insensitive
///
/// # Examples
///
/// ```rust
/// use edge_infrastructure::domain::Hostname;
///
/// let zone = Hostname::new("Example.com").unwrap();
/// assert_eq!(zone.as_str(), "example.com");
/// assert_eq!(zone.prefixed("www").unwrap().as_str(), "www.example.com");
/// assert!(zone.wildcard().unwrap().is_wildcard());
///
/// assert!(Hostname::new("-invalid").is_err());
/// assert!(Hostname::new("api.*.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    /// Maximum total length for FQDN (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length for a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a new hostname with validation
    pub fn new(hostname: impl Into<String>) -> Result<Self, HostnameError> {
        let hostname = hostname.into().to_lowercase();

        if hostname.is_empty() {
            return Err(HostnameError::Empty);
        }

        if hostname.len() > Self::MAX_LENGTH {
            return Err(HostnameError::TooLong(hostname.len()));
        }

        let labels: Vec<&str> = hostname.split('.').collect();
        let last = labels.len() - 1;
        for (position, label) in labels.iter().enumerate() {
            if *label == "*" {
                if position != 0 || labels.len() < 2 {
                    return Err(HostnameError::MisplacedWildcard(hostname.clone()));
                }
                continue;
            }
            Self::validate_label(label, position == last)?;
        }

        Ok(Self(hostname))
    }

    fn validate_label(label: &str, is_tld: bool) -> Result<(), HostnameError> {
        if label.is_empty() {
            return Err(HostnameError::Empty);
        }

        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(HostnameError::LabelTooLong(label.to_string()));
        }

        for ch in label.chars() {
            if ch == '*' {
                return Err(HostnameError::MisplacedWildcard(label.to_string()));
            }
            if !ch.is_ascii_alphanumeric() && ch != '-' {
                return Err(HostnameError::InvalidCharacter(ch));
            }
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(HostnameError::InvalidLabelFormat(label.to_string()));
        }

        if is_tld && label.chars().all(|c| c.is_ascii_digit()) {
            return Err(HostnameError::NumericLabel(label.to_string()));
        }

        Ok(())
    }

    /// Get the hostname as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the leftmost label is `*`
    pub fn is_wildcard(&self) -> bool {
        self.0.starts_with("*.")
    }

    /// The name without a leading wildcard label
    pub fn base_domain(&self) -> &str {
        self.0.strip_prefix("*.").unwrap_or(&self.0)
    }

    /// `label.self`, e.g. `app` + `example.com`
    pub fn prefixed(&self, label: &str) -> Result<Self, HostnameError> {
        Self::new(format!("{}.{}", label, self.base_domain()))
    }

    /// `*.self`
    pub fn wildcard(&self) -> Result<Self, HostnameError> {
        self.prefixed("*")
    }

    /// Name safe for use inside a resource name (`*` → `wildcard`, `.` → `-`)
    pub fn slug(&self) -> String {
        self.0.replace('*', "wildcard").replace('.', "-")
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Hostname {
    type Error = HostnameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Hostname {
    type Error = HostnameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hostname> for String {
    fn from(value: Hostname) -> Self {
        value.0
    }
}
