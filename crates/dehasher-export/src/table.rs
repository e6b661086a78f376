//! Aligned terminal tables for breach records and credentials.

use crate::error::{ExportError, Result};
use crate::format::{column_value, RECORD_COLUMNS};
use dehasher_core::{BreachRecord, Credential};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns shown for breach records.
pub const RESULT_HEADERS: [&str; 9] = [
    "Name",
    "Email",
    "Username",
    "Password",
    "Address",
    "Phone",
    "Social",
    "Crypto Address",
    "Company",
];

/// Columns shown for credentials.
pub const CREDENTIAL_HEADERS: [&str; 3] = ["Email", "Username", "Password"];

/// Narrowest a column is squeezed to when fitting a width budget.
const MIN_COLUMN_WIDTH: usize = 6;

/// Terminals narrower than this are not worth fitting to.
const MIN_TERMINAL_WIDTH: usize = 40;

/// Terminal width from `COLUMNS`, if set and usable.
#[must_use]
pub fn terminal_width() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|width| *width >= MIN_TERMINAL_WIDTH)
}

/// A table-shaped projection ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column headers
    pub headers: Vec<String>,
    /// Row cells, one `Vec` per row
    pub rows: Vec<Vec<String>>,
    /// Number of rows in the full data set before truncation
    pub total_rows: usize,
}

impl Table {
    /// True when rows were dropped to respect the display limit.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Render the table as aligned text, optionally fitted to `max_width` columns.
    #[must_use]
    pub fn render(&self, max_width: Option<usize>) -> String {
        let headers: Vec<&str> = self.headers.iter().map(String::as_str).collect();
        render_table(&headers, &self.rows, max_width)
    }
}

/// Project at most `limit` breach records into a table.
#[must_use]
pub fn results_table(records: &[BreachRecord], limit: usize) -> Table {
    let rows = records
        .iter()
        .take(limit)
        .map(|record| {
            [
                &record.name,
                &record.email,
                &record.username,
                &record.password,
                &record.address,
                &record.phone,
                &record.social,
                &record.cryptocurrency_address,
                &record.company,
            ]
            .iter()
            .map(|values| values.join(", "))
            .collect()
        })
        .collect();

    Table {
        headers: RESULT_HEADERS.iter().map(ToString::to_string).collect(),
        rows,
        total_rows: records.len(),
    }
}

/// Project at most `limit` credentials into a table.
#[must_use]
pub fn credentials_table(credentials: &[Credential], limit: usize) -> Table {
    let rows = credentials
        .iter()
        .take(limit)
        .map(|c| vec![c.email.clone(), c.username.clone(), c.password.clone()])
        .collect();

    Table {
        headers: CREDENTIAL_HEADERS.iter().map(ToString::to_string).collect(),
        rows,
        total_rows: credentials.len(),
    }
}

/// Project at most `limit` breach records into a table of the named fields.
///
/// Field names are the serialized record keys (`email`, `ip_address`, ...).
/// An empty selection falls back to [`results_table`].
///
/// # Errors
/// Returns `ExportError::UnknownField` for a name that is not a record field.
pub fn results_table_with(
    records: &[BreachRecord],
    fields: &[String],
    limit: usize,
) -> Result<Table> {
    if fields.is_empty() {
        return Ok(results_table(records, limit));
    }

    let columns = fields
        .iter()
        .map(|field| {
            let key = field.trim().to_ascii_lowercase();
            RECORD_COLUMNS
                .iter()
                .find(|(name, _)| *name == key)
                .copied()
                .ok_or_else(|| ExportError::UnknownField(field.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = records
        .iter()
        .take(limit)
        .map(|record| {
            columns
                .iter()
                .map(|(key, _)| column_value(record, key))
                .collect()
        })
        .collect();

    Ok(Table {
        headers: columns.iter().map(|(_, label)| (*label).to_string()).collect(),
        rows,
        total_rows: records.len(),
    })
}

/// Project at most `limit` credentials into a table of the named fields
/// (`email`, `username`, `password`).
///
/// # Errors
/// Returns `ExportError::UnknownField` for any other name.
pub fn credentials_table_with(
    credentials: &[Credential],
    fields: &[String],
    limit: usize,
) -> Result<Table> {
    if fields.is_empty() {
        return Ok(credentials_table(credentials, limit));
    }

    let columns = fields
        .iter()
        .map(|field| match field.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(0),
            "username" => Ok(1),
            "password" => Ok(2),
            _ => Err(ExportError::UnknownField(field.clone())),
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut table = credentials_table(credentials, limit);
    table.headers = columns
        .iter()
        .map(|idx| CREDENTIAL_HEADERS[*idx].to_string())
        .collect();
    table.rows = table
        .rows
        .into_iter()
        .map(|row| columns.iter().map(|idx| row[*idx].clone()).collect())
        .collect();
    Ok(table)
}

/// Render an aligned table for string rows.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_width: Option<usize>) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.width())
                .max()
                .unwrap_or(0)
                .max(header.width())
                .max(MIN_COLUMN_WIDTH)
        })
        .collect();

    fit_widths(&mut widths, headers, max_width);

    let header_line = headers
        .iter()
        .zip(widths.iter())
        .map(|(header, width)| pad(&truncate_text(header, *width), *width))
        .collect::<Vec<_>>()
        .join("  ");

    let divider = "-".repeat(header_line.width());

    let mut lines = Vec::with_capacity(2 + rows.len());
    lines.push(header_line.trim_end().to_string());
    lines.push(divider);
    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let value = row.get(index).map_or("", String::as_str);
                pad(&truncate_text(value, *width), *width)
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn fit_widths(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };

    if widths.is_empty() {
        return;
    }

    let separators = widths.len().saturating_sub(1) * 2;
    let mut total = widths.iter().sum::<usize>() + separators;

    while total > max_width {
        let mut candidate_idx = None;
        let mut candidate_width = 0usize;
        for (idx, width) in widths.iter().enumerate() {
            let min_width = headers[idx].width().max(MIN_COLUMN_WIDTH);
            if *width > min_width && *width > candidate_width {
                candidate_idx = Some(idx);
                candidate_width = *width;
            }
        }

        let Some(idx) = candidate_idx else {
            break;
        };

        widths[idx] -= 1;
        total -= 1;
    }
}

fn truncate_text(value: &str, width: usize) -> String {
    if value.width() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return "…".to_string();
    }

    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in value.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(value.width());
    format!("{value}{}", " ".repeat(fill))
}
