use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{ExpenseError, Result};

/// Canonical `YYYY-MM-DD` form of `raw`. SQLite's date functions return
/// NULL for unpadded or five-digit-year text, so only years 1..=9999 pass.
pub fn normalize_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .filter(|d| (1..=9999).contains(&d.year()))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .ok_or_else(|| ExpenseError::InvalidDate(raw.to_string()))
}

/// A stored expense row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub payment_mode: String,
    pub description: Option<String>,
    pub amount: f64,
    pub cashback: f64,
}

/// A row waiting to be appended; `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: String,
    pub category: String,
    pub payment_mode: String,
    pub description: Option<String>,
    pub amount: f64,
    pub cashback: f64,
}

impl NewExpense {
    pub fn new(date: &str, category: &str, payment_mode: &str, amount: f64) -> Self {
        Self {
            date: date.to_string(),
            category: category.to_string(),
            payment_mode: payment_mode.to_string(),
            description: None,
            amount,
            cashback: 0.0,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_cashback(mut self, cashback: f64) -> Self {
        self.cashback = cashback;
        self
    }

    /// Month and weekday extraction in SQL depends on dates being stored in
    /// canonical ISO form, so every row is checked before it reaches the store.
    pub fn validate(&self) -> Result<()> {
        if normalize_date(&self.date)? != self.date {
            return Err(ExpenseError::InvalidDate(self.date.clone()));
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseError::Other("category must not be empty".into()));
        }
        if self.payment_mode.trim().is_empty() {
            return Err(ExpenseError::Other("payment mode must not be empty".into()));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ExpenseError::InvalidAmount(format!(
                "amount must be non-negative, got {}",
                self.amount
            )));
        }
        if !self.cashback.is_finite() || self.cashback < 0.0 {
            return Err(ExpenseError::InvalidAmount(format!(
                "cashback must be non-negative, got {}",
                self.cashback
            )));
        }
        Ok(())
    }
}

/// Columns a caller may filter or list distinct values on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Category,
    PaymentMode,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::PaymentMode => "payment_mode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_good_row() {
        let row = NewExpense::new("2025-02-28", "Food", "Cash", 12.5).with_cashback(0.5);
        assert!(row.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let row = NewExpense::new("2025-02-30", "Food", "Cash", 12.5);
        assert!(matches!(row.validate(), Err(ExpenseError::InvalidDate(_))));
        let row = NewExpense::new("02/01/2025", "Food", "Cash", 12.5);
        assert!(matches!(row.validate(), Err(ExpenseError::InvalidDate(_))));
    }

    #[test]
    fn test_validate_rejects_non_canonical_date() {
        for date in ["2025-1-5", "2025-01-5", " 2025-01-05", "+12025-01-05"] {
            let row = NewExpense::new(date, "Food", "Cash", 12.5);
            assert!(
                matches!(row.validate(), Err(ExpenseError::InvalidDate(_))),
                "accepted {date:?}"
            );
        }
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2025-1-5").unwrap(), "2025-01-05");
        assert_eq!(normalize_date(" 2025-12-31 ").unwrap(), "2025-12-31");
        assert!(matches!(normalize_date("2025-02-30"), Err(ExpenseError::InvalidDate(_))));
        assert!(normalize_date("12025-01-05").is_err());
    }

    #[test]
    fn test_validate_rejects_negative_amounts() {
        let row = NewExpense::new("2025-01-01", "Food", "Cash", -1.0);
        assert!(matches!(row.validate(), Err(ExpenseError::InvalidAmount(_))));
        let row = NewExpense::new("2025-01-01", "Food", "Cash", 1.0).with_cashback(-0.1);
        assert!(matches!(row.validate(), Err(ExpenseError::InvalidAmount(_))));
    }

    #[test]
    fn test_cashback_above_amount_is_allowed() {
        let row = NewExpense::new("2025-01-01", "Food", "Cash", 1.0).with_cashback(2.0);
        assert!(row.validate().is_ok());
    }
}
