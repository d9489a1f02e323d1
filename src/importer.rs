use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::NewExpense;
use crate::store::Store;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Strip currency symbols and thousands separators. Returns `None` for
/// anything that still is not a number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '₹'))
        .collect();
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    s.parse().ok()
}

/// Accepts `YYYY-MM-DD` and `MM/DD/YYYY`, returns `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| chrono::NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    category: Option<usize>,
    payment_mode: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    cashback: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut cols = Columns::default();
        for (i, h) in headers.iter().enumerate() {
            match h.trim().to_lowercase().replace(' ', "_").as_str() {
                "date" => cols.date = Some(i),
                "category" => cols.category = Some(i),
                "payment_mode" => cols.payment_mode = Some(i),
                "description" => cols.description = Some(i),
                "amount_paid" | "amount" => cols.amount = Some(i),
                "cashback" => cols.cashback = Some(i),
                _ => {}
            }
        }
        cols
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("Date");
        }
        if self.category.is_none() {
            missing.push("Category");
        }
        if self.payment_mode.is_none() {
            missing.push("Payment_Mode");
        }
        if self.amount.is_none() {
            missing.push("Amount_Paid");
        }
        missing
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn parse_record(record: &csv::StringRecord, cols: &Columns) -> Option<NewExpense> {
    let date = parse_date(field(record, cols.date))?;
    let category = field(record, cols.category);
    let payment_mode = field(record, cols.payment_mode);
    let amount = parse_amount(field(record, cols.amount))?;
    let cashback = parse_amount(field(record, cols.cashback))?;
    let description = field(record, cols.description);

    let mut row = NewExpense::new(&date, category, payment_mode, amount).with_cashback(cashback);
    if !description.is_empty() {
        row = row.with_description(description);
    }
    row.validate().ok()?;
    Some(row)
}

pub fn parse_file(file_path: &Path) -> Result<(Vec<NewExpense>, usize)> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let cols = Columns::from_headers(rdr.headers()?);
    let missing = cols.missing();
    if !missing.is_empty() {
        return Err(crate::error::ExpenseError::Other(format!(
            "{} is missing column(s): {}",
            file_path.display(),
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let parsed = result.ok().and_then(|record| parse_record(&record, &cols));
        match parsed {
            Some(row) => rows.push(row),
            None => {
                // header is line 1
                warn!(line = line + 2, "skipping unreadable row");
                skipped += 1;
            }
        }
    }
    Ok((rows, skipped))
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn import_file(store: &mut Store, file_path: &Path) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = store
            .connection()
            .prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            debug!(checksum = %checksum, "file already imported");
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let (rows, skipped) = parse_file(file_path)?;
    let filename = file_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let imported = store.append_import(&rows, filename, &checksum)?;

    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}
