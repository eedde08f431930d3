//! CSV format handling for replay input and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `CsvOperation` structure for deserializing replay rows
//! - Conversion from CSV rows to `Operation`s
//! - Writers for balances, users and the other ledger collections
//!
//! All functions are pure (no file I/O) for easy testing.

use std::io::Write;
use std::str::FromStr;

use csv::Writer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    GoldPrice, LedgerError, Operation, PaymentMethod, PaymentMethodInfo, ReviewAction,
    Transaction, User,
};

/// Replay row with columns: op, email, name, phone, amount, method, tx, details
///
/// Which optional columns are required depends on `op`. Short rows are
/// accepted; missing trailing columns read as empty.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CsvOperation {
    pub op: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub amount: Option<String>,
    pub method: Option<String>,
    pub tx: Option<String>,
    pub details: Option<String>,
}

/// Convert a CSV row into an `Operation`
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted operation
/// * `Err(String)` - Unknown op, missing column or unparsable value
pub fn convert_csv_operation(row: CsvOperation) -> Result<Operation, String> {
    let op = row.op.trim().to_lowercase();
    let email = row.email.trim().to_string();
    if email.is_empty() {
        return Err(format!("'{}' operation requires an email", op));
    }

    let operation = match op.as_str() {
        "register" => Operation::Register {
            email,
            name: required(&op, "name", row.name)?,
            phone: non_blank(row.phone).unwrap_or_default(),
        },
        "profile" => {
            let name = non_blank(row.name);
            let phone = non_blank(row.phone);
            if name.is_none() && phone.is_none() {
                return Err("'profile' operation requires a name or phone".to_string());
            }
            Operation::Profile { email, name, phone }
        }
        "price" => Operation::SetPrice {
            admin_email: email,
            price: amount(&op, row.amount)?,
        },
        "method" => Operation::SetMethod {
            admin_email: email,
            method: method(&op, row.method)?,
            details: required(&op, "details", row.details)?,
        },
        "buy" => Operation::Buy {
            email,
            label: required(&op, "tx", row.tx)?,
            amount_bdt: amount(&op, row.amount)?,
            method: method(&op, row.method)?,
            proof: non_blank(row.details),
        },
        "sell" => Operation::Sell {
            email,
            label: required(&op, "tx", row.tx)?,
            amount_bdt: amount(&op, row.amount)?,
            method: method(&op, row.method)?,
            payout_details: required(&op, "details", row.details)?,
        },
        "approve" | "reject" => Operation::Review {
            owner_email: email,
            label: required(&op, "tx", row.tx)?,
            action: if op == "approve" {
                ReviewAction::Approve
            } else {
                ReviewAction::Reject
            },
        },
        _ => return Err(format!("Invalid operation: '{}'", row.op)),
    };

    Ok(operation)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(op: &str, column: &str, value: Option<String>) -> Result<String, String> {
    non_blank(value).ok_or_else(|| format!("'{}' operation requires '{}'", op, column))
}

fn amount(op: &str, value: Option<String>) -> Result<Decimal, String> {
    let raw = required(op, "amount", value)?;
    Decimal::from_str(&raw).map_err(|_| format!("Invalid amount '{}' for '{}' operation", raw, op))
}

fn method(op: &str, value: Option<String>) -> Result<PaymentMethod, String> {
    PaymentMethod::from_str(&required(op, "method", value)?)
}

/// Format grams at a fixed number of fractional digits
pub fn format_grams(grams: Decimal, scale: u32) -> String {
    format!("{:.*}", scale as usize, grams)
}

/// Write final balances with columns: user, email, name, role, gold_balance
///
/// Users are sorted by id for deterministic output.
pub fn write_balances_csv(users: &[User], scale: u32, output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["user", "email", "name", "role", "gold_balance"])?;

    let mut sorted_users = users.to_vec();
    sorted_users.sort_by_key(|user| user.id);

    for user in sorted_users {
        writer.write_record(&[
            user.id.to_string(),
            user.email,
            user.name,
            user.role.to_string(),
            format_grams(user.gold_balance, scale),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the full user listing, including contact details and creation time
pub fn write_users_csv(users: &[User], scale: u32, output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "user",
        "name",
        "email",
        "phone",
        "role",
        "gold_balance",
        "created_at",
    ])?;

    for user in users {
        writer.write_record(&[
            user.id.to_string(),
            user.name.clone(),
            user.email.clone(),
            user.phone.clone(),
            user.role.to_string(),
            format_grams(user.gold_balance, scale),
            user.created_at.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Serialize records with their serde field names as the header
fn write_records<T: Serialize>(records: &[T], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write transactions in the given order
pub fn write_transactions_csv(transactions: &[Transaction], output: &mut dyn Write) -> Result<(), LedgerError> {
    write_records(transactions, output)
}

/// Write price records in the given order
pub fn write_prices_csv(prices: &[GoldPrice], output: &mut dyn Write) -> Result<(), LedgerError> {
    write_records(prices, output)
}

/// Write payment-method instructions
pub fn write_payment_methods_csv(
    methods: &[PaymentMethodInfo],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    write_records(methods, output)
}
