// 📄 CSV import/export
//
// Reservations and expenses come in with camelCase headers matching the
// stored JSON field names. The withdrawal ledger goes out without receipt
// payloads (a hasReceipt flag instead).

use crate::entities::{Employee, Expense, Reservation, Withdrawal};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

fn read_records<T: DeserializeOwned, R: Read>(reader: R, what: &str) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        // +2: header row and 1-based numbering
        let record: T = result.with_context(|| format!("Failed to deserialize {} on line {}", what, line + 2))?;
        records.push(record);
    }

    Ok(records)
}

pub fn read_reservations<R: Read>(reader: R) -> Result<Vec<Reservation>> {
    read_records(reader, "reservation")
}

pub fn read_expenses<R: Read>(reader: R) -> Result<Vec<Expense>> {
    read_records(reader, "expense")
}

pub fn read_employees<R: Read>(reader: R) -> Result<Vec<Employee>> {
    read_records(reader, "employee")
}

pub fn load_reservations_csv(path: &Path) -> Result<Vec<Reservation>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_reservations(file)
}

pub fn load_expenses_csv(path: &Path) -> Result<Vec<Expense>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_expenses(file)
}

pub fn load_employees_csv(path: &Path) -> Result<Vec<Employee>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_employees(file)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalRow<'a> {
    id: &'a str,
    partner_id: &'a str,
    partner_name: &'a str,
    amount: f64,
    receipt_number: &'a str,
    date: &'a str,
    recipient_name: &'a str,
    has_receipt: bool,
}

impl<'a> From<&'a Withdrawal> for WithdrawalRow<'a> {
    fn from(w: &'a Withdrawal) -> Self {
        WithdrawalRow {
            id: &w.id,
            partner_id: &w.partner_id,
            partner_name: &w.partner_name,
            amount: w.amount,
            receipt_number: &w.receipt_number,
            date: &w.date,
            recipient_name: &w.recipient_name,
            has_receipt: w.has_receipt(),
        }
    }
}

pub fn write_withdrawals<W: Write>(writer: W, withdrawals: &[Withdrawal]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for w in withdrawals {
        wtr.serialize(WithdrawalRow::from(w))?;
    }
    wtr.flush()?;
    Ok(withdrawals.len())
}

pub fn export_withdrawals_csv(path: &Path, withdrawals: &[Withdrawal]) -> Result<usize> {
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_withdrawals(file, withdrawals)
}
