//! Shared types used across the dehasher toolkit.
//!
//! This module defines the breach record shape returned by the provider,
//! the credential projection derived from it and the closed set of export
//! formats.

use crate::error::DehasherError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One breach record as returned by the search provider.
///
/// Most fields are lists because the provider returns an array per field;
/// a single record can carry several emails, usernames or passwords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreachRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Email addresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    /// IP addresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_address: Vec<String>,
    /// Usernames
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub username: Vec<String>,
    /// Plaintext passwords
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub password: Vec<String>,
    /// Password hashes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashed_password: Vec<String>,
    /// Hash algorithm reported for `hashed_password`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hash_type: String,
    /// Person names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    /// Vehicle identification numbers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vin: Vec<String>,
    /// License plates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license_plate: Vec<String>,
    /// URLs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
    /// Social media handles
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub social: Vec<String>,
    /// Cryptocurrency wallet addresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cryptocurrency_address: Vec<String>,
    /// Postal addresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
    /// Phone numbers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,
    /// Company names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub company: Vec<String>,
    /// Name of the breached database this record came from
    #[serde(skip_serializing_if = "String::is_empty")]
    pub database_name: String,
}

impl BreachRecord {
    /// Names of the list-valued fields, in display order.
    pub const LIST_FIELDS: [&'static str; 14] = [
        "email",
        "ip_address",
        "username",
        "password",
        "hashed_password",
        "name",
        "vin",
        "license_plate",
        "url",
        "social",
        "cryptocurrency_address",
        "address",
        "phone",
        "company",
    ];

    /// Borrow a list-valued field by its serialized name.
    #[must_use]
    pub fn list_field(&self, name: &str) -> Option<&[String]> {
        let values = match name {
            "email" => &self.email,
            "ip_address" => &self.ip_address,
            "username" => &self.username,
            "password" => &self.password,
            "hashed_password" => &self.hashed_password,
            "name" => &self.name,
            "vin" => &self.vin,
            "license_plate" => &self.license_plate,
            "url" => &self.url,
            "social" => &self.social,
            "cryptocurrency_address" => &self.cryptocurrency_address,
            "address" => &self.address,
            "phone" => &self.phone,
            "company" => &self.company,
            _ => return None,
        };
        Some(values.as_slice())
    }

    /// Returns true if the record carries at least one plaintext password.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.iter().any(|p| !p.is_empty())
    }
}

/// An identifier/password pair projected out of a [`BreachRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    /// First email of the source record, empty if none
    pub email: String,
    /// First username of the source record, empty if none
    pub username: String,
    /// First plaintext password of the source record
    pub password: String,
}

impl Credential {
    /// The identifier shown next to the password: username, or email when
    /// the record had no username.
    #[must_use]
    pub fn identifier(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%{}", self.identifier(), self.password)
    }
}

/// Closed set of export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML documents
    Yaml,
    /// Comma-separated values with a header row
    Csv,
    /// Human-readable flat text
    Txt,
    /// Indented XML document
    Xml,
}

impl OutputFormat {
    /// All supported formats.
    pub const ALL: [OutputFormat; 5] = [Self::Json, Self::Yaml, Self::Csv, Self::Txt, Self::Xml];

    /// File extension written for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = DehasherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Txt),
            "xml" => Ok(Self::Xml),
            other => Err(DehasherError::Validation(format!(
                "unknown output format '{other}' (expected json, yaml, csv, txt or xml)"
            ))),
        }
    }
}
