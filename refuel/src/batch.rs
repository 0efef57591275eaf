//! Recipient batch parsing and aggregation.
//!
//! Turns raw delimited text (one record per line) into a validated,
//! aggregated recipient list for batch refuels. Content limits are hard
//! rejects for the whole batch; per-line problems are carried as row errors
//! on the individual [`Recipient`] and never abort sibling rows.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use alloy_primitives::Address;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of lines accepted before per-line parsing.
pub const MAX_LINES: usize = 1000;
/// Maximum length of a single line, in characters.
pub const MAX_LINE_LEN: usize = 200;
/// Maximum input size, in bytes (5 MiB).
pub const MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
/// Maximum number of recipients in one batch.
pub const MAX_RECIPIENTS: usize = 100;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"));

// Strict decimal shape: a multi-dot string like "1.2.3" is invalid here,
// unlike permissive string-to-float parsing that would read it as 1.2.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,18})?$").expect("static regex"));

/// How amounts are supplied in the batch text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// One address per line; a single shared amount applies to all rows.
    CommonAmount,
    /// `address,amount` per line, comma-delimited.
    PerRecipientAmount,
}

impl BatchMode {
    const fn expected_fields(self) -> usize {
        match self {
            Self::CommonAmount => 1,
            Self::PerRecipientAmount => 2,
        }
    }
}

/// Whole-batch rejection reasons. These fail the entire import.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Input contained no non-empty lines.
    #[error("batch input is empty")]
    Empty,
    /// Input exceeded [`MAX_INPUT_BYTES`].
    #[error("batch input is {size} bytes, limit is {MAX_INPUT_BYTES}")]
    InputTooLarge {
        /// Observed input size in bytes.
        size: usize,
    },
    /// Input exceeded [`MAX_LINES`].
    #[error("batch has {count} lines, limit is {MAX_LINES}")]
    TooManyLines {
        /// Observed line count.
        count: usize,
    },
    /// A line exceeded [`MAX_LINE_LEN`] characters.
    #[error("line {line} is {len} characters long, limit is {MAX_LINE_LEN}")]
    LineTooLong {
        /// 1-based line number.
        line: usize,
        /// Observed line length.
        len: usize,
    },
    /// More recipients than [`MAX_RECIPIENTS`].
    #[error("batch has {count} recipients, limit is {MAX_RECIPIENTS}")]
    TooManyRecipients {
        /// Observed recipient count.
        count: usize,
    },
}

/// Per-row validation failure. Non-fatal: the row is kept, marked invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// The line had the wrong number of comma-delimited fields for the mode.
    #[error("expected {expected} field(s), found {found}")]
    FieldCount {
        /// Fields expected for the batch mode.
        expected: usize,
        /// Fields found on the line.
        found: usize,
    },
    /// The address field is not a `0x`-prefixed 40-hex-digit string.
    #[error("invalid address '{0}'")]
    Address(String),
    /// The amount field is not a strict positive decimal.
    #[error("invalid amount '{0}'")]
    Amount(String),
}

/// One parsed recipient row. Immutable once created; discard via
/// [`ParsedBatch::remove`], which re-aggregates totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Canonical lowercase address for valid rows; the raw field otherwise.
    pub address: String,
    /// Parsed amount for valid rows in per-recipient mode.
    pub amount: Option<Decimal>,
    /// Why the row is invalid, if it is.
    pub error: Option<RowError>,
}

impl Recipient {
    /// Whether this row passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// A validated, aggregated batch of recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    /// All rows in input order, valid and invalid alike.
    pub recipients: Vec<Recipient>,
    /// Sum of amounts over valid rows only.
    pub total_amount: Decimal,
    /// Number of valid rows.
    pub valid_count: usize,
    /// Number of invalid rows.
    pub invalid_count: usize,
}

impl ParsedBatch {
    /// Removes the row at `index` and re-runs aggregation over the
    /// remaining set. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) {
        if index < self.recipients.len() {
            self.recipients.remove(index);
            self.reaggregate();
        }
    }

    // Totals are always recomputed from scratch; stale counters are never
    // patched incrementally.
    fn reaggregate(&mut self) {
        self.total_amount = self
            .recipients
            .iter()
            .filter(|r| r.is_valid())
            .filter_map(|r| r.amount)
            .sum();
        self.valid_count = self.recipients.iter().filter(|r| r.is_valid()).count();
        self.invalid_count = self.recipients.len() - self.valid_count;
    }
}

impl fmt::Display for ParsedBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} recipients ({} valid, {} invalid), total {}",
            self.recipients.len(),
            self.valid_count,
            self.invalid_count,
            self.total_amount
        )
    }
}

/// Canonicalizes an address string.
///
/// Trims surrounding whitespace, checks the `0x` + 40-hex shape
/// case-insensitively, and returns the lowercase form. Returns an empty
/// string for anything failing the shape check.
#[must_use]
pub fn sanitize_address(input: &str) -> String {
    let trimmed = input.trim();
    if ADDRESS_RE.is_match(trimmed) {
        trimmed.to_ascii_lowercase()
    } else {
        String::new()
    }
}

fn parse_address(field: &str) -> Result<String, RowError> {
    let sanitized = sanitize_address(field);
    if sanitized.is_empty() {
        return Err(RowError::Address(field.trim().to_owned()));
    }
    // The shape check above guarantees this parses; Address round-trips the
    // canonical form.
    let _: Address = Address::from_str(&sanitized)
        .map_err(|_| RowError::Address(field.trim().to_owned()))?;
    Ok(sanitized)
}

fn parse_amount(field: &str) -> Result<Decimal, RowError> {
    let trimmed = field.trim();
    if !AMOUNT_RE.is_match(trimmed) {
        return Err(RowError::Amount(trimmed.to_owned()));
    }
    let amount =
        Decimal::from_str(trimmed).map_err(|_| RowError::Amount(trimmed.to_owned()))?;
    if amount <= Decimal::ZERO {
        return Err(RowError::Amount(trimmed.to_owned()));
    }
    Ok(amount)
}

fn parse_line(line: &str, mode: BatchMode, common_amount: Option<Decimal>) -> Recipient {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let expected = mode.expected_fields();
    if fields.len() != expected {
        return Recipient {
            address: line.to_owned(),
            amount: None,
            error: Some(RowError::FieldCount {
                expected,
                found: fields.len(),
            }),
        };
    }

    let address = match parse_address(fields[0]) {
        Ok(addr) => addr,
        Err(e) => {
            return Recipient {
                address: fields[0].to_owned(),
                amount: None,
                error: Some(e),
            };
        }
    };

    let amount = match mode {
        BatchMode::CommonAmount => common_amount,
        BatchMode::PerRecipientAmount => match parse_amount(fields[1]) {
            Ok(a) => Some(a),
            Err(e) => {
                return Recipient {
                    address,
                    amount: None,
                    error: Some(e),
                };
            }
        },
    };

    Recipient {
        address,
        amount,
        error: None,
    }
}

/// Parses raw batch text into a [`ParsedBatch`].
///
/// `common_amount` is the shared per-recipient amount in
/// [`BatchMode::CommonAmount`]; it is ignored in per-recipient mode.
/// Content limits are enforced before per-line parsing and reject the whole
/// batch; individual bad rows only mark themselves invalid.
pub fn parse_batch(
    content: &str,
    mode: BatchMode,
    common_amount: Option<Decimal>,
) -> Result<ParsedBatch, BatchError> {
    if content.len() > MAX_INPUT_BYTES {
        return Err(BatchError::InputTooLarge {
            size: content.len(),
        });
    }

    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(BatchError::Empty);
    }
    if lines.len() > MAX_LINES {
        return Err(BatchError::TooManyLines { count: lines.len() });
    }
    for (line_no, line) in &lines {
        let len = line.chars().count();
        if len > MAX_LINE_LEN {
            return Err(BatchError::LineTooLong {
                line: *line_no,
                len,
            });
        }
    }
    if lines.len() > MAX_RECIPIENTS {
        return Err(BatchError::TooManyRecipients { count: lines.len() });
    }

    let recipients: Vec<Recipient> = lines
        .iter()
        .map(|(_, line)| parse_line(line, mode, common_amount))
        .collect();

    let mut batch = ParsedBatch {
        recipients,
        total_amount: Decimal::ZERO,
        valid_count: 0,
        invalid_count: 0,
    };
    batch.reaggregate();
    tracing::debug!(
        rows = batch.recipients.len(),
        valid = batch.valid_count,
        invalid = batch.invalid_count,
        "parsed recipient batch"
    );
    Ok(batch)
}

/// Produces a fixed five-row template for user download.
///
/// Deterministic; the caller is responsible for placing it in a file.
#[must_use]
pub fn generate_sample_batch(mode: BatchMode) -> String {
    const ADDRESSES: [&str; 5] = [
        "0x1111111111111111111111111111111111111111",
        "0x2222222222222222222222222222222222222222",
        "0x3333333333333333333333333333333333333333",
        "0x4444444444444444444444444444444444444444",
        "0x5555555555555555555555555555555555555555",
    ];
    const AMOUNTS: [&str; 5] = ["0.01", "0.02", "0.03", "0.04", "0.05"];

    match mode {
        BatchMode::CommonAmount => ADDRESSES.join("\n"),
        BatchMode::PerRecipientAmount => ADDRESSES
            .iter()
            .zip(AMOUNTS.iter())
            .map(|(a, amt)| format!("{a},{amt}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
