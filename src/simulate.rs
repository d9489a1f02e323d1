use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::fmt::round2;
use crate::models::NewExpense;

/// (category, min amount, max amount)
const CATEGORIES: &[(&str, f64, f64)] = &[
    ("Food", 100.0, 500.0),
    ("Travel", 500.0, 5000.0),
    ("Bills", 200.0, 1500.0),
    ("Groceries", 300.0, 2000.0),
    ("Subscriptions", 100.0, 1000.0),
    ("Entertainment", 200.0, 2000.0),
    ("Gifts", 100.0, 1500.0),
    ("Shopping", 500.0, 5000.0),
    ("Healthcare", 300.0, 2500.0),
    ("Transportation", 50.0, 800.0),
    ("Education", 1000.0, 8000.0),
];

const PAYMENT_MODES: &[&str] = &["Cash", "UPI", "Credit Card", "Debit Card", "Netbanking"];

const WORDS: &[&str] = &[
    "weekly", "online", "local", "monthly", "family", "express", "market", "store",
    "annual", "quick", "premium", "corner", "city", "daily", "special", "bundle",
];

const CASHBACK_CHANCE: f64 = 0.3;
const MAX_CASHBACK_RATE: f64 = 0.1;

pub const DEFAULT_COUNT: usize = 1200;
pub const DEFAULT_YEAR: i32 = 2025;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub count: usize,
    /// Restrict every row to this month (1-12); random month per row otherwise.
    pub month: Option<u32>,
    pub year: i32,
    /// Same seed, same rows.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            month: None,
            year: DEFAULT_YEAR,
            seed: None,
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn random_row(rng: &mut StdRng, year: i32, month: Option<u32>) -> NewExpense {
    let month = month.unwrap_or_else(|| rng.gen_range(1..=12));
    let day = rng.gen_range(1..=days_in_month(year, month));
    let &(category, min, max) = CATEGORIES.choose(rng).unwrap_or(&CATEGORIES[0]);
    let payment_mode = PAYMENT_MODES.choose(rng).copied().unwrap_or("Cash");
    let word = WORDS.choose(rng).copied().unwrap_or("misc");

    let amount = round2(rng.gen_range(min..=max));
    let cashback = if rng.gen_bool(CASHBACK_CHANCE) {
        round2(rng.gen_range(0.0..=amount * MAX_CASHBACK_RATE))
    } else {
        0.0
    };

    NewExpense::new(
        &format!("{year:04}-{month:02}-{day:02}"),
        category,
        payment_mode,
        amount,
    )
    .with_description(&format!("{category} - {word}"))
    .with_cashback(cashback)
}

/// Build `config.count` synthetic expenses. Nothing is written; pass the
/// result to [`crate::store::Store::append_all`].
pub fn generate(config: &SimulationConfig) -> Vec<NewExpense> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let month = config.month.filter(|m| (1..=12).contains(m));
    (0..config.count)
        .map(|_| random_row(&mut rng, config.year, month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(count: usize, month: Option<u32>, seed: u64) -> SimulationConfig {
        SimulationConfig {
            count,
            month,
            year: 2025,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_generate_count() {
        assert_eq!(generate(&config(250, None, 1)).len(), 250);
        assert!(generate(&config(0, None, 1)).is_empty());
    }

    #[test]
    fn test_generated_rows_are_valid() {
        for row in generate(&config(500, None, 2)) {
            row.validate().unwrap();
            assert!(row.cashback <= row.amount * MAX_CASHBACK_RATE + 0.01);
            assert!(row.description.as_deref().unwrap().starts_with(&row.category));
        }
    }

    #[test]
    fn test_amounts_within_category_range() {
        for row in generate(&config(500, None, 3)) {
            let (_, min, max) = CATEGORIES
                .iter()
                .find(|(name, _, _)| *name == row.category)
                .unwrap();
            assert!(row.amount >= *min && row.amount <= *max, "{row:?}");
        }
    }

    #[test]
    fn test_month_restriction() {
        let rows = generate(&config(100, Some(2), 4));
        assert!(rows.iter().all(|r| r.date.starts_with("2025-02-")));
    }

    #[test]
    fn test_december_dates_are_valid() {
        let rows = generate(&config(200, Some(12), 5));
        for r in &rows {
            NaiveDate::parse_from_str(&r.date, "%Y-%m-%d").unwrap();
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(generate(&config(50, None, 9)), generate(&config(50, None, 9)));
        assert_ne!(generate(&config(50, None, 9)), generate(&config(50, None, 10)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }
}
