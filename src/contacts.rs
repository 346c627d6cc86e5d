//! Recipient normalization and deduplication.
//!
//! Contact rows arrive with arbitrary, mixed-case keys taken from spreadsheet
//! headers. [`normalize`] lowercases keys and lifts the well-known fields
//! (`email`, `name`, `company`) out of each row; [`dedupe`] then drops later
//! duplicates by email. This module is the only place duplicate detection
//! lives — every sending path goes through it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A raw contact row as parsed from a spreadsheet: arbitrary string keys
/// mapped to scalar values. Key casing is not yet normalized.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// One addressee with its personalization fields.
///
/// `email` is lowercased and trimmed during normalization. A record may have
/// no email at all; it is kept so the send loop can report it explicitly
/// rather than dropping it silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientRecord {
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    /// Any remaining row fields, keys lowercased.
    #[serde(default)]
    pub extra: RawRow,
}

impl RecipientRecord {
    fn from_raw(row: &RawRow) -> Self {
        let mut record = Self {
            email: None,
            name: None,
            company: None,
            extra: RawRow::new(),
        };

        for (key, value) in row {
            let key = key.to_lowercase();
            match key.as_str() {
                "email" => {
                    record.email = scalar_text(value)
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty());
                }
                "name" => {
                    record.name = scalar_text(value)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty());
                }
                "company" => {
                    record.company = scalar_text(value)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty());
                }
                _ => {
                    record.extra.insert(key, value.clone());
                }
            }
        }

        record
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A recipient set with duplicates removed.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Unique-by-email recipients in original order. Records without an
    /// email are retained here.
    pub recipients: Vec<RecipientRecord>,
    /// Emails of rows dropped as duplicates, in encounter order.
    pub duplicates: Vec<String>,
}

impl NormalizedBatch {
    /// Normalize and deduplicate raw rows in one step.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        dedupe(normalize(rows))
    }
}

/// Lowercase every key and extract the well-known fields from each row.
/// Order is preserved.
pub fn normalize(rows: &[RawRow]) -> Vec<RecipientRecord> {
    rows.iter().map(RecipientRecord::from_raw).collect()
}

/// Drop later duplicates by email, first occurrence wins.
///
/// Records without an email cannot be deduplicated and pass through.
pub fn dedupe(records: Vec<RecipientRecord>) -> NormalizedBatch {
    let mut seen = HashSet::new();
    let mut batch = NormalizedBatch::default();

    for record in records {
        match &record.email {
            Some(email) if !seen.insert(email.clone()) => {
                batch.duplicates.push(email.clone());
            }
            _ => batch.recipients.push(record),
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn normalize_lowercases_keys_and_email() {
        let rows = vec![row(&[
            ("Email", json!("  Alice@Example.COM ")),
            ("Name", json!("Alice")),
            ("Company", json!("Acme")),
            ("Role", json!("CTO")),
        ])];

        let records = normalize(&rows);
        assert_eq!(records[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(records[0].name.as_deref(), Some("Alice"));
        assert_eq!(records[0].company.as_deref(), Some("Acme"));
        assert_eq!(records[0].extra.get("role"), Some(&json!("CTO")));
    }

    #[test]
    fn normalize_keeps_rows_without_email() {
        let rows = vec![row(&[("name", json!("Bob"))])];
        let records = normalize(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, None);
    }

    #[test]
    fn normalize_treats_blank_email_as_missing() {
        let rows = vec![row(&[("email", json!("   "))])];
        assert_eq!(normalize(&rows)[0].email, None);
    }

    #[test]
    fn dedupe_is_case_insensitive_and_first_wins() {
        let rows = vec![
            row(&[("email", json!("a@x.com")), ("name", json!("First"))]),
            row(&[("email", json!("a@x.com"))]),
            row(&[("email", json!("b@x.com"))]),
            row(&[("email", json!("B@X.com"))]),
            row(&[("email", json!("c@x.com"))]),
        ];

        let batch = NormalizedBatch::from_rows(&rows);
        let emails: Vec<_> = batch
            .recipients
            .iter()
            .map(|r| r.email.clone().unwrap())
            .collect();

        assert_eq!(emails, vec!["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(batch.duplicates, vec!["a@x.com", "b@x.com"]);
        assert_eq!(
            batch.recipients[0].name.as_deref(),
            Some("First"),
            "first occurrence wins"
        );
    }

    #[test]
    fn dedupe_passes_through_rows_without_email() {
        let rows = vec![
            row(&[("name", json!("no-mail-1"))]),
            row(&[("name", json!("no-mail-2"))]),
        ];
        let batch = NormalizedBatch::from_rows(&rows);
        assert_eq!(batch.recipients.len(), 2);
        assert!(batch.duplicates.is_empty());
    }
}
