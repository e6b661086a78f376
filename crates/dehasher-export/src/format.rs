//! Rendering of breach records and credentials into the export formats.

use crate::error::{ExportError, Result};
use dehasher_core::{BreachRecord, Credential, OutputFormat};
use quick_xml::se::Serializer;
use serde::Serialize;
use std::fmt::Write as _;

/// Record columns in export order: (serialized name, text label).
pub(crate) const RECORD_COLUMNS: [(&str, &str); 17] = [
    ("id", "Id"),
    ("email", "Email"),
    ("ip_address", "IP Address"),
    ("username", "Username"),
    ("password", "Password"),
    ("hashed_password", "Hashed Password"),
    ("hash_type", "Hash Type"),
    ("name", "Name"),
    ("vin", "VIN"),
    ("license_plate", "License Plate"),
    ("url", "URL"),
    ("social", "Social"),
    ("cryptocurrency_address", "Crypto Address"),
    ("address", "Address"),
    ("phone", "Phone"),
    ("company", "Company"),
    ("database_name", "Database Name"),
];

/// Separator used when a list field is flattened into one cell.
const LIST_SEPARATOR: &str = ", ";

#[derive(Serialize)]
#[serde(rename = "results")]
struct XmlResults<'a> {
    record: &'a [BreachRecord],
}

#[derive(Serialize)]
#[serde(rename = "credentials")]
struct XmlCredentials<'a> {
    credential: &'a [Credential],
}

/// Render breach records in `format`.
///
/// # Errors
/// Returns `ExportError` if JSON or YAML serialization fails.
pub fn render_results(records: &[BreachRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(records)?),
        OutputFormat::Csv => Ok(results_csv(records)),
        OutputFormat::Txt => Ok(results_text(records)),
        OutputFormat::Xml => to_xml(&XmlResults { record: records }),
    }
}

/// Render credential pairs in `format`.
///
/// # Errors
/// Returns `ExportError` if JSON or YAML serialization fails.
pub fn render_credentials(credentials: &[Credential], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(credentials)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(credentials)?),
        OutputFormat::Csv => Ok(credentials_csv(credentials)),
        OutputFormat::Txt => Ok(credentials_text(credentials)),
        OutputFormat::Xml => to_xml(&XmlCredentials {
            credential: credentials,
        }),
    }
}

/// Flat text rendering of breach records: one `Key: value` block per record,
/// empty fields omitted.
#[must_use]
pub fn results_text(records: &[BreachRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        for (key, label) in RECORD_COLUMNS {
            let value = column_value(record, key);
            if !value.is_empty() {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
    }
    out
}

/// Flat text rendering of credentials: one `identifier%password` per line.
#[must_use]
pub fn credentials_text(credentials: &[Credential]) -> String {
    let mut out = String::new();
    for credential in credentials {
        let _ = writeln!(out, "{credential}");
    }
    out
}

fn results_csv(records: &[BreachRecord]) -> String {
    let mut out = String::new();
    let header: Vec<&str> = RECORD_COLUMNS.iter().map(|(key, _)| *key).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let row: Vec<String> = RECORD_COLUMNS
            .iter()
            .map(|(key, _)| csv_escape(&column_value(record, key)))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn credentials_csv(credentials: &[Credential]) -> String {
    let mut out = String::from("email,username,password\n");
    for credential in credentials {
        let _ = writeln!(
            out,
            "{},{},{}",
            csv_escape(&credential.email),
            csv_escape(&credential.username),
            csv_escape(&credential.password)
        );
    }
    out
}

fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let mut out = String::new();
    let mut serializer = Serializer::new(&mut out);
    serializer.indent(' ', 2);
    value
        .serialize(serializer)
        .map_err(|e| ExportError::Xml(e.to_string()))?;
    out.push('\n');
    Ok(out)
}

pub(crate) fn column_value(record: &BreachRecord, key: &str) -> String {
    match key {
        "id" => record.id.clone(),
        "hash_type" => record.hash_type.clone(),
        "database_name" => record.database_name.clone(),
        list => record
            .list_field(list)
            .map(|values| values.join(LIST_SEPARATOR))
            .unwrap_or_default(),
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
