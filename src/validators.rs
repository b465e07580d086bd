// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validators for the separated-string fields used by request forms.
//!
//! The prefix-list grammar is a comma-separated list of
//! `<ip-network>[ <op> <len>]*` tokens where `<op>` is one of `eq`, `le`, `ge`.
//! Lengths are checked against the network's own prefix length:
//! `eq` must equal it, otherwise `prefix-length < ge <= le`.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use chrono::NaiveDate;
use validator::{ValidateEmail, ValidationError};

const OPERATORS: [&str; 3] = ["eq", "le", "ge"];
const LENGTH_RULE: &str =
    "The prefix-length of IP network, le, ge should follow the rule: prefix-length < ge <= le.";

/// A rule violated by a prefix-list string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixListError {
    #[error("{0} is not a valid IP network.")]
    InvalidNetwork(String),

    #[error("\"{0}\" is not a valid operator. Please use eq/le/ge.")]
    InvalidOperator(String),

    #[error("\"{0}\" appears more than once.")]
    DuplicateOperator(String),

    #[error("The length should be a integer. {0} is not a integer.")]
    InvalidLength(String),

    #[error("A length should be followed after a operator.")]
    MissingLength,

    #[error("\"eq\" could not be using with \"{0}\".")]
    EqCombined(&'static str),

    #[error("With \"eq\", the following length should be exactly the same as IP network prefix's.")]
    EqMismatch,

    #[error("{}", LENGTH_RULE)]
    LengthOrder,
}

/// Drop one trailing separator, split, and trim each item. Empty items are skipped.
pub fn split_separated(value: &str, separator: char) -> Vec<String> {
    let value = value.strip_suffix(separator).unwrap_or(value);
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix length of a network written as `addr/len` or a bare address.
///
/// Host bits are allowed (`10.0.0.1/24` is accepted). IPv4 networks may
/// also give a dotted netmask (`/255.255.255.0`) or hostmask (`/0.0.0.255`).
pub fn network_prefix_len(network: &str) -> Option<u8> {
    let (addr, len) = match network.split_once('/') {
        Some((addr, len)) => (addr, Some(len)),
        None => (network, None),
    };
    let addr: IpAddr = addr.parse().ok()?;
    let max = if addr.is_ipv4() { 32 } else { 128 };

    match len {
        None => Some(max),
        Some(len) if !len.is_empty() && len.bytes().all(|b| b.is_ascii_digit()) => {
            let len: u8 = len.parse().ok()?;
            (len <= max).then_some(len)
        }
        Some(mask) if addr.is_ipv4() => mask_prefix_len(mask.parse().ok()?),
        Some(_) => None,
    }
}

/// Netmask first, then hostmask; anything non-contiguous is rejected.
fn mask_prefix_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    if bits.leading_ones() + bits.trailing_zeros() == 32 {
        return u8::try_from(bits.leading_ones()).ok();
    }
    if bits.leading_zeros() + bits.trailing_ones() == 32 {
        return u8::try_from(bits.leading_zeros()).ok();
    }
    None
}

/// Validate a comma-separated prefix-list string.
pub fn validate_prefix_list(value: &str) -> Result<(), PrefixListError> {
    let value = value.strip_suffix(',').unwrap_or(value);

    for prefix in value.split(',').map(str::trim) {
        let mut parts = prefix.split(' ');
        let network = parts.next().unwrap_or_default();
        let prefix_len = i64::from(
            network_prefix_len(network)
                .ok_or_else(|| PrefixListError::InvalidNetwork(network.to_string()))?,
        );

        let mut lengths: HashMap<&str, i64> = HashMap::new();
        let mut pending_operator: Option<&str> = None;
        for arg in parts {
            match pending_operator.take() {
                None => {
                    let operator = OPERATORS
                        .iter()
                        .copied()
                        .find(|op| *op == arg)
                        .ok_or_else(|| PrefixListError::InvalidOperator(arg.to_string()))?;
                    if lengths.contains_key(operator) {
                        return Err(PrefixListError::DuplicateOperator(arg.to_string()));
                    }
                    pending_operator = Some(operator);
                }
                Some(operator) => {
                    let length: i64 = arg
                        .parse()
                        .map_err(|_| PrefixListError::InvalidLength(arg.to_string()))?;
                    lengths.insert(operator, length);
                }
            }
        }
        if pending_operator.is_some() {
            return Err(PrefixListError::MissingLength);
        }

        check_lengths(prefix_len, &lengths)?;
    }

    Ok(())
}

fn check_lengths(prefix_len: i64, lengths: &HashMap<&str, i64>) -> Result<(), PrefixListError> {
    let (eq, le, ge) = (
        lengths.get("eq").copied(),
        lengths.get("le").copied(),
        lengths.get("ge").copied(),
    );

    if let Some(eq) = eq {
        if le.is_some() {
            return Err(PrefixListError::EqCombined("le"));
        }
        if ge.is_some() {
            return Err(PrefixListError::EqCombined("ge"));
        }
        if eq != prefix_len {
            return Err(PrefixListError::EqMismatch);
        }
        return Ok(());
    }

    match (ge, le) {
        (Some(ge), le) => {
            if prefix_len >= ge || le.is_some_and(|le| le < ge) {
                return Err(PrefixListError::LengthOrder);
            }
        }
        (None, Some(le)) => {
            if le < prefix_len {
                return Err(PrefixListError::LengthOrder);
            }
        }
        (None, None) => {}
    }
    Ok(())
}

/// Validate a `;`-separated list of e-mail addresses.
pub fn validate_semicolon_separated_emails(value: &str) -> Result<(), String> {
    let value = value.strip_suffix(';').unwrap_or(value);
    for email in value.split(';').map(str::trim) {
        if !email.to_string().validate_email() {
            return Err(format!(
                "\"{email}\" is not a valid Email. multiple date should be separated by \";\"."
            ));
        }
    }
    Ok(())
}

/// Validate a `,`-separated list of `YYYY-MM-DD` dates.
pub fn validate_comma_separated_dates(value: &str) -> Result<(), String> {
    let value = value.strip_suffix(',').unwrap_or(value);
    for date in value.split(',').map(str::trim) {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(format!(
                "\"{date}\" is not a valid date. Please enter a date with the format \"yyyy-mm-dd\". \
                 multiple date should be separated by \",\"."
            ));
        }
    }
    Ok(())
}

/// Parse a `,`-separated date list, skipping blanks.
pub fn parse_date_list(value: &str) -> Result<Vec<NaiveDate>, String> {
    split_separated(value, ',')
        .iter()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| format!("\"{date}\" is not a valid date."))
        })
        .collect()
}

// ─── Form field adapters ─────────────────────────────────────
//
// Blank values pass; `required` is enforced separately by the forms.

fn invalid(message: String) -> ValidationError {
    ValidationError::new("invalid").with_message(message.into())
}

pub fn prefix_list_field(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_prefix_list(value).map_err(|e| invalid(e.to_string()))
}

pub fn email_list_field(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_semicolon_separated_emails(value).map_err(invalid)
}

pub fn date_list_field(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_comma_separated_dates(value).map_err(invalid)
}
