//! Predicate builder.
//!
//! Turns typed search inputs into the provider's field-qualified query
//! grammar: `field:value` terms joined with `&`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separator between predicates in the composite query.
const PREDICATE_SEPARATOR: char = '&';

/// Stands in for plaintext password values outside the request body.
pub const REDACTED: &str = "[REDACTED]";

/// Searchable provider fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// `username`
    Username,
    /// `email`
    Email,
    /// `ip_address`
    IpAddress,
    /// `domain`
    Domain,
    /// `vin`
    Vin,
    /// `license_plate`
    LicensePlate,
    /// `address`
    Address,
    /// `phone`
    Phone,
    /// `social`
    Social,
    /// `cryptocurrency_address`
    CryptoAddress,
    /// `password`
    Password,
    /// `hashed_password`
    HashedPassword,
    /// `name`
    Name,
}

impl Field {
    /// Field tag used in the query grammar.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::IpAddress => "ip_address",
            Self::Domain => "domain",
            Self::Vin => "vin",
            Self::LicensePlate => "license_plate",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Social => "social",
            Self::CryptoAddress => "cryptocurrency_address",
            Self::Password => "password",
            Self::HashedPassword => "hashed_password",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How the provider matches predicate values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain term matching
    #[default]
    Exact,
    /// Values are regular expressions
    Regex,
    /// Values may contain `*` and `?` wildcards
    Wildcard,
}

/// Search request body sent to the provider.
///
/// The page and size are advanced between fetch units; everything else is
/// fixed once the predicates are added. `Debug` shows the redacted query.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Page number
    pub page: u32,
    /// Composite query
    pub query: String,
    /// Page size
    pub size: u32,
    /// Wildcard matching
    pub wildcard: bool,
    /// Regex matching
    pub regex: bool,
    /// Provider-side de-duplication (always on)
    pub de_dupe: bool,
    /// Submit password predicates in plaintext instead of hashing them
    #[serde(skip)]
    pub force_plaintext: bool,
    /// `query` with plaintext password values replaced
    #[serde(skip)]
    redacted: String,
}

impl fmt::Debug for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRequest")
            .field("page", &self.page)
            .field("query", &self.redacted)
            .field("size", &self.size)
            .field("wildcard", &self.wildcard)
            .field("regex", &self.regex)
            .field("de_dupe", &self.de_dupe)
            .field("force_plaintext", &self.force_plaintext)
            .finish()
    }
}

impl SearchRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new(page: u32, size: u32, match_mode: MatchMode, force_plaintext: bool) -> Self {
        Self {
            page,
            query: String::new(),
            size,
            wildcard: match_mode == MatchMode::Wildcard,
            regex: match_mode == MatchMode::Regex,
            de_dupe: true,
            force_plaintext,
            redacted: String::new(),
        }
    }

    /// The composite query safe to log, display or store: plaintext
    /// `password` values are replaced with [`REDACTED`].
    #[must_use]
    pub fn redacted_query(&self) -> &str {
        &self.redacted
    }

    /// True when no predicate has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Append `field:value` to the query. Blank values are ignored.
    ///
    /// Values containing whitespace are wrapped in double quotes unless the
    /// request is in regex mode or the value is already quoted.
    pub fn add_predicate(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        let value = if self.regex {
            value.to_string()
        } else {
            quote_spaced(value)
        };

        let shown = if field == Field::Password {
            REDACTED
        } else {
            value.as_str()
        };
        push_term(&mut self.redacted, field, shown);
        push_term(&mut self.query, field, &value);
    }

    /// Add a `username` predicate.
    pub fn add_username_query(&mut self, value: &str) {
        self.add_predicate(Field::Username, value);
    }

    /// Add an `email` predicate.
    pub fn add_email_query(&mut self, value: &str) {
        self.add_predicate(Field::Email, value);
    }

    /// Add an `ip_address` predicate.
    pub fn add_ip_address_query(&mut self, value: &str) {
        self.add_predicate(Field::IpAddress, value);
    }

    /// Add a `domain` predicate.
    pub fn add_domain_query(&mut self, value: &str) {
        self.add_predicate(Field::Domain, value);
    }

    /// Add a password predicate.
    ///
    /// Unless the request forces plaintext, the password is hashed with
    /// SHA-256 (lower-case hex) and submitted as `hashed_password`.
    pub fn add_password_query(&mut self, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        if self.force_plaintext {
            self.add_predicate(Field::Password, value);
        } else {
            self.add_hashed_password_query(&sha256_hex(value));
        }
    }

    /// Add a `hashed_password` predicate.
    pub fn add_hashed_password_query(&mut self, value: &str) {
        self.add_predicate(Field::HashedPassword, value);
    }

    /// Add a `name` predicate.
    pub fn add_name_query(&mut self, value: &str) {
        self.add_predicate(Field::Name, value);
    }

    /// Add a `vin` predicate.
    pub fn add_vin_query(&mut self, value: &str) {
        self.add_predicate(Field::Vin, value);
    }

    /// Add a `license_plate` predicate.
    pub fn add_license_plate_query(&mut self, value: &str) {
        self.add_predicate(Field::LicensePlate, value);
    }

    /// Add an `address` predicate.
    pub fn add_address_query(&mut self, value: &str) {
        self.add_predicate(Field::Address, value);
    }

    /// Add a `phone` predicate.
    pub fn add_phone_query(&mut self, value: &str) {
        self.add_predicate(Field::Phone, value);
    }

    /// Add a `social` predicate.
    pub fn add_social_query(&mut self, value: &str) {
        self.add_predicate(Field::Social, value);
    }

    /// Add a `cryptocurrency_address` predicate.
    pub fn add_crypto_address_query(&mut self, value: &str) {
        self.add_predicate(Field::CryptoAddress, value);
    }
}

/// Typed search inputs for one run.
///
/// The plaintext password is never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Predicates {
    /// Username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Password hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_password: Option<String>,
    /// Password
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Person name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Vehicle identification number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    /// License plate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Social media handle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<String>,
    /// Cryptocurrency address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_address: Option<String>,
}

impl Predicates {
    /// True when every predicate is absent or blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.username,
            &self.email,
            &self.ip_address,
            &self.hashed_password,
            &self.password,
            &self.name,
            &self.domain,
            &self.vin,
            &self.license_plate,
            &self.address,
            &self.phone,
            &self.social,
            &self.crypto_address,
        ]
        .iter()
        .all(|value| value.as_deref().map_or(true, |v| v.trim().is_empty()))
    }

    /// Add every non-empty predicate to `request`, in a fixed field order.
    pub fn apply_to(&self, request: &mut SearchRequest) {
        let adders: [(&Option<String>, fn(&mut SearchRequest, &str)); 13] = [
            (&self.username, SearchRequest::add_username_query),
            (&self.email, SearchRequest::add_email_query),
            (&self.ip_address, SearchRequest::add_ip_address_query),
            (&self.hashed_password, SearchRequest::add_hashed_password_query),
            (&self.password, SearchRequest::add_password_query),
            (&self.name, SearchRequest::add_name_query),
            (&self.domain, SearchRequest::add_domain_query),
            (&self.vin, SearchRequest::add_vin_query),
            (&self.license_plate, SearchRequest::add_license_plate_query),
            (&self.address, SearchRequest::add_address_query),
            (&self.phone, SearchRequest::add_phone_query),
            (&self.social, SearchRequest::add_social_query),
            (&self.crypto_address, SearchRequest::add_crypto_address_query),
        ];

        for (value, add) in adders {
            if let Some(value) = value.as_deref() {
                add(request, value);
            }
        }
    }
}

/// SHA-256 of `value`, lower-case hex.
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn push_term(query: &mut String, field: Field, value: &str) {
    if !query.is_empty() {
        query.push(PREDICATE_SEPARATOR);
    }
    query.push_str(field.tag());
    query.push(':');
    query.push_str(value);
}

fn quote_spaced(value: &str) -> String {
    let already_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    if value.contains(char::is_whitespace) && !already_quoted {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUNTER2_SHA256: &str = "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7";

    fn request() -> SearchRequest {
        SearchRequest::new(1, 100, MatchMode::Exact, false)
    }

    #[test]
    fn test_spaced_value_is_quoted() {
        let mut req = request();
        req.add_username_query("john doe");
        assert_eq!(req.query, "username:\"john doe\"");
    }

    #[test]
    fn test_plain_value_is_not_quoted() {
        let mut req = request();
        req.add_email_query("jdoe@example.com");
        assert_eq!(req.query, "email:jdoe@example.com");
    }

    #[test]
    fn test_already_quoted_value_is_kept() {
        let mut req = request();
        req.add_name_query("\"John Doe\"");
        assert_eq!(req.query, "name:\"John Doe\"");
    }

    #[test]
    fn test_regex_value_is_never_quoted() {
        let mut req = SearchRequest::new(1, 100, MatchMode::Regex, false);
        req.add_name_query("john\\s+doe .*");
        assert_eq!(req.query, "name:john\\s+doe .*");
        assert!(req.regex);
        assert!(!req.wildcard);
    }

    #[test]
    fn test_predicates_joined_with_ampersand() {
        let mut req = request();
        req.add_username_query("jdoe");
        req.add_domain_query("example.com");
        req.add_username_query("jdoe2");
        assert_eq!(req.query, "username:jdoe&domain:example.com&username:jdoe2");
    }

    #[test]
    fn test_blank_value_ignored() {
        let mut req = request();
        req.add_phone_query("   ");
        assert!(req.is_empty());
    }

    #[test]
    fn test_password_hashed_by_default() {
        let mut req = request();
        req.add_password_query("hunter2");
        assert_eq!(req.query, format!("hashed_password:{HUNTER2_SHA256}"));
    }

    #[test]
    fn test_password_plaintext_when_forced() {
        let mut req = SearchRequest::new(1, 100, MatchMode::Exact, true);
        req.add_password_query("hunter2");
        assert_eq!(req.query, "password:hunter2");
    }

    #[test]
    fn test_plaintext_password_redacted() {
        let mut req = SearchRequest::new(1, 100, MatchMode::Exact, true);
        req.add_email_query("jdoe@example.com");
        req.add_password_query("hunter2");

        assert_eq!(req.query, "email:jdoe@example.com&password:hunter2");
        assert_eq!(
            req.redacted_query(),
            "email:jdoe@example.com&password:[REDACTED]"
        );

        let debug = format!("{req:?}");
        assert!(!debug.contains("hunter2"), "debug leaked password: {debug}");
        assert!(debug.contains("password:[REDACTED]"));
    }

    #[test]
    fn test_hashed_password_not_redacted() {
        let mut req = request();
        req.add_password_query("hunter2");
        assert_eq!(req.redacted_query(), req.query);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex("hunter2"), HUNTER2_SHA256);
    }

    #[test]
    fn test_request_body_shape() {
        let mut req = SearchRequest::new(2, 4749, MatchMode::Wildcard, true);
        req.add_email_query("*@example.com");

        let body = serde_json::to_value(&req).expect("serialize request");
        assert_eq!(
            body,
            serde_json::json!({
                "page": 2,
                "query": "email:*@example.com",
                "size": 4749,
                "wildcard": true,
                "regex": false,
                "de_dupe": true
            })
        );
    }

    #[test]
    fn test_predicates_apply_in_field_order() {
        let predicates = Predicates {
            crypto_address: Some("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh".to_string()),
            email: Some("jdoe@example.com".to_string()),
            username: Some("jdoe".to_string()),
            password: Some("hunter2".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };

        let mut req = request();
        predicates.apply_to(&mut req);
        assert_eq!(
            req.query,
            format!(
                "username:jdoe&email:jdoe@example.com&hashed_password:{HUNTER2_SHA256}\
                 &cryptocurrency_address:bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"
            )
        );
    }

    #[test]
    fn test_predicates_is_empty() {
        assert!(Predicates::default().is_empty());
        assert!(Predicates {
            vin: Some("  ".to_string()),
            ..Default::default()
        }
        .is_empty());
        assert!(!Predicates {
            vin: Some("1HGCM82633A004352".to_string()),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_predicates_serialization_omits_password() {
        let predicates = Predicates {
            email: Some("jdoe@example.com".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&predicates).expect("serialize predicates");
        assert_eq!(json, r#"{"email":"jdoe@example.com"}"#);
    }
}
