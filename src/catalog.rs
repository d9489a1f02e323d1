use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value;

use crate::error::{ExpenseError, Result};
use crate::filter::{Clause, Filter, BASE_CONDITION};

/// A query ready to run against the store. Building one never touches the
/// database.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, clause: Clause) -> Self {
        Self {
            sql,
            params: clause.params,
        }
    }
}

/// Non-negative row count or threshold used by `LIMIT` and `HAVING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Count(u32);

impl Count {
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl FromStr for Count {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(Count)
            .map_err(|_| ExpenseError::InvalidNumber {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const DEFAULT_TOP_CATEGORIES: Count = Count::new(5);
pub const DEFAULT_TOP_TRANSACTIONS: Count = Count::new(10);
pub const DEFAULT_CASHBACK_TRANSACTIONS: Count = Count::new(200);
pub const DEFAULT_MIN_OCCURRENCES: Count = Count::new(2);
pub const DEFAULT_MIN_DESCRIPTION_REPEATS: Count = Count::new(3);

const MONTH: &str = "CAST(strftime('%m', date) AS INTEGER)";
const WEEKDAY: &str = "CAST(strftime('%w', date) AS INTEGER)";

fn scope(filter: &Filter) -> Clause {
    filter.render(BASE_CONDITION)
}

// ---------------------------------------------------------------------------
// Group-and-sum by dimension
// ---------------------------------------------------------------------------

pub fn total_by_category(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT category, ROUND(SUM(amount), 2) AS total_spent, COUNT(*) AS txn_count \
         FROM expenses {} \
         GROUP BY category ORDER BY total_spent DESC",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn total_by_payment_mode(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT payment_mode, ROUND(SUM(amount), 2) AS total_spent, COUNT(*) AS txn_count \
         FROM expenses {} \
         GROUP BY payment_mode",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn top_categories(filter: &Filter, limit: Count) -> Statement {
    let mut w = scope(filter);
    let n = w.bind(i64::from(limit.get()));
    let sql = format!(
        "SELECT category, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} \
         GROUP BY category ORDER BY total_spent DESC LIMIT {n}",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn avg_by_category(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT category, ROUND(AVG(amount), 2) AS avg_amount, COUNT(*) AS txn_count \
         FROM expenses {} \
         GROUP BY category ORDER BY avg_amount DESC",
        w.sql
    );
    Statement::new(sql, w)
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// NULL when no rows match.
pub fn total_cashback(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT ROUND(SUM(cashback), 2) AS total_cashback FROM expenses {}",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn average_monthly_spend(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT ROUND(AVG(monthly), 2) AS avg_monthly_spend FROM ( \
         SELECT substr(date, 1, 7) AS ym, SUM(amount) AS monthly \
         FROM expenses {} GROUP BY ym)",
        w.sql
    );
    Statement::new(sql, w)
}

/// Headline numbers in one row; zeros over an empty set.
pub fn kpi_summary(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT ROUND(COALESCE(SUM(amount), 0), 2) AS total_spent, \
         COUNT(*) AS txn_count, \
         ROUND(COALESCE(SUM(cashback), 0), 2) AS total_cashback, \
         ROUND(COALESCE(AVG(amount), 0), 2) AS avg_amount \
         FROM expenses {}",
        w.sql
    );
    Statement::new(sql, w)
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

pub fn monthly_spending(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT {MONTH} AS month, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} \
         GROUP BY month ORDER BY month",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn monthly_cashback(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT {MONTH} AS month, ROUND(SUM(cashback), 2) AS total_cashback \
         FROM expenses {} \
         GROUP BY month ORDER BY month",
        w.sql
    );
    Statement::new(sql, w)
}

/// Per calendar month (`YYYY-MM`), so multi-year data does not fold together.
pub fn monthly_trend(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT substr(date, 1, 7) AS month, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} \
         GROUP BY month ORDER BY month",
        w.sql
    );
    Statement::new(sql, w)
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_spending(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT {WEEKDAY} AS weekday, ROUND(SUM(amount), 2) AS total_spent, COUNT(*) AS txn_count \
         FROM expenses {} \
         GROUP BY weekday ORDER BY weekday",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn months_for_categories(filter: &Filter, categories: &[String]) -> Statement {
    let mut w = scope(filter);
    let membership = if categories.is_empty() {
        "0".to_string()
    } else {
        let slots: Vec<String> = categories.iter().map(|c| w.bind(c.clone())).collect();
        format!("category IN ({})", slots.join(", "))
    };
    let sql = format!(
        "SELECT {MONTH} AS month, category, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} AND {membership} \
         GROUP BY month, category ORDER BY month, total_spent DESC",
        w.sql
    );
    Statement::new(sql, w)
}

// ---------------------------------------------------------------------------
// Shares and patterns
// ---------------------------------------------------------------------------

/// The grand-total subquery reuses the outer clause text, placeholders
/// included, so both sides always see the same rows.
pub fn category_contribution_pct(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT category, \
         ROUND(100.0 * SUM(amount) / (SELECT SUM(amount) FROM expenses {where_}), 2) AS pct_contribution, \
         ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {where_} \
         GROUP BY category ORDER BY pct_contribution DESC",
        where_ = w.sql
    );
    Statement::new(sql, w)
}

/// Categories seen at least `min_occurrences` times, with the months they
/// appear in. Groups on category alone.
pub fn recurring_expenses(filter: &Filter, min_occurrences: Count) -> Statement {
    let mut w = scope(filter);
    let n = w.bind(i64::from(min_occurrences.get()));
    let sql = format!(
        "SELECT category, COUNT(*) AS occurrences, \
         GROUP_CONCAT(DISTINCT {MONTH}) AS months \
         FROM expenses {} \
         GROUP BY category HAVING occurrences >= {n} \
         ORDER BY occurrences DESC",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn recurring_descriptions(filter: &Filter, min_occurrences: Count) -> Statement {
    let mut w = scope(filter);
    let n = w.bind(i64::from(min_occurrences.get()));
    let sql = format!(
        "SELECT description, COUNT(*) AS occurrences, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} AND description IS NOT NULL \
         GROUP BY description HAVING occurrences >= {n} \
         ORDER BY occurrences DESC, description",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn compare_h1_h2(filter: &Filter) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT CASE WHEN {MONTH} <= 6 THEN 'H1' ELSE 'H2' END AS half, \
         ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} \
         GROUP BY half ORDER BY half",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn weekend_split(filter: &Filter, category: &str) -> Statement {
    let mut w = scope(filter);
    let c = w.bind(category.to_string());
    let sql = format!(
        "SELECT CASE WHEN {WEEKDAY} IN (0, 6) THEN 'Weekend' ELSE 'Weekday' END AS day_type, \
         ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} AND category = {c} \
         GROUP BY day_type ORDER BY day_type",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn payment_split_for_category(filter: &Filter, category: &str) -> Statement {
    let mut w = scope(filter);
    let c = w.bind(category.to_string());
    let sql = format!(
        "SELECT payment_mode, ROUND(SUM(amount), 2) AS total_spent \
         FROM expenses {} AND category = {c} \
         GROUP BY payment_mode",
        w.sql
    );
    Statement::new(sql, w)
}

// ---------------------------------------------------------------------------
// Individual transactions
// ---------------------------------------------------------------------------

pub fn top_transactions(filter: &Filter, limit: Count) -> Statement {
    let mut w = scope(filter);
    let n = w.bind(i64::from(limit.get()));
    let sql = format!(
        "SELECT id, date, category, payment_mode, amount \
         FROM expenses {} \
         ORDER BY amount DESC, id LIMIT {n}",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn cashback_transactions(filter: &Filter, limit: Count) -> Statement {
    let mut w = scope(filter);
    let n = w.bind(i64::from(limit.get()));
    let sql = format!(
        "SELECT id, date, category, payment_mode, amount, cashback \
         FROM expenses {} AND cashback > 0 \
         ORDER BY cashback DESC, id LIMIT {n}",
        w.sql
    );
    Statement::new(sql, w)
}

pub fn largest_transaction(filter: &Filter) -> Statement {
    extreme_transaction(filter, "DESC")
}

pub fn smallest_transaction(filter: &Filter) -> Statement {
    extreme_transaction(filter, "ASC")
}

fn extreme_transaction(filter: &Filter, direction: &str) -> Statement {
    let w = scope(filter);
    let sql = format!(
        "SELECT id, date, category, payment_mode, description, amount, cashback \
         FROM expenses {} \
         ORDER BY amount {direction}, id LIMIT 1",
        w.sql
    );
    Statement::new(sql, w)
}

// ---------------------------------------------------------------------------
// Named insights
// ---------------------------------------------------------------------------

/// Category used by the weekend/weekday split when none is given.
pub const DEFAULT_WEEKEND_CATEGORY: &str = "Groceries";
/// Category used by the payment split when none is given.
pub const DEFAULT_PAYMENT_SPLIT_CATEGORY: &str = "Transportation";

/// Extra knobs for the insights that take them. `None` means the default.
#[derive(Debug, Clone, Default)]
pub struct InsightParams {
    pub limit: Option<Count>,
    pub min_occurrences: Option<Count>,
    pub categories: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    TotalByCategory,
    TotalByPaymentMode,
    TopCategories,
    AvgByCategory,
    TotalCashback,
    AverageMonthlySpend,
    MonthlySpending,
    MonthlyCashback,
    MonthlyTrend,
    WeekdaySpending,
    MonthsForCategories,
    ContributionPct,
    RecurringExpenses,
    RecurringDescriptions,
    CompareHalves,
    WeekendSplit,
    PaymentSplit,
    TopTransactions,
    CashbackTransactions,
    LargestTransaction,
    SmallestTransaction,
}

pub const ALL_INSIGHTS: &[Insight] = &[
    Insight::TotalByCategory,
    Insight::TotalByPaymentMode,
    Insight::TopCategories,
    Insight::AvgByCategory,
    Insight::TotalCashback,
    Insight::AverageMonthlySpend,
    Insight::MonthlySpending,
    Insight::MonthlyCashback,
    Insight::MonthlyTrend,
    Insight::WeekdaySpending,
    Insight::MonthsForCategories,
    Insight::ContributionPct,
    Insight::RecurringExpenses,
    Insight::RecurringDescriptions,
    Insight::CompareHalves,
    Insight::WeekendSplit,
    Insight::PaymentSplit,
    Insight::TopTransactions,
    Insight::CashbackTransactions,
    Insight::LargestTransaction,
    Insight::SmallestTransaction,
];

impl Insight {
    pub fn key(&self) -> &'static str {
        match self {
            Self::TotalByCategory => "by-category",
            Self::TotalByPaymentMode => "by-payment-mode",
            Self::TopCategories => "top-categories",
            Self::AvgByCategory => "avg-by-category",
            Self::TotalCashback => "total-cashback",
            Self::AverageMonthlySpend => "avg-monthly-spend",
            Self::MonthlySpending => "monthly",
            Self::MonthlyCashback => "monthly-cashback",
            Self::MonthlyTrend => "monthly-trend",
            Self::WeekdaySpending => "weekday",
            Self::MonthsForCategories => "category-months",
            Self::ContributionPct => "contribution",
            Self::RecurringExpenses => "recurring",
            Self::RecurringDescriptions => "recurring-descriptions",
            Self::CompareHalves => "h1-vs-h2",
            Self::WeekendSplit => "weekend-split",
            Self::PaymentSplit => "payment-split",
            Self::TopTransactions => "top-transactions",
            Self::CashbackTransactions => "cashback-transactions",
            Self::LargestTransaction => "largest",
            Self::SmallestTransaction => "smallest",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::TotalByCategory => "Total spending by category",
            Self::TotalByPaymentMode => "Spending by payment mode",
            Self::TopCategories => "Top expensive categories",
            Self::AvgByCategory => "Average transaction by category",
            Self::TotalCashback => "Total cashback earned",
            Self::AverageMonthlySpend => "Average monthly spend",
            Self::MonthlySpending => "Monthly spending",
            Self::MonthlyCashback => "Monthly cashback",
            Self::MonthlyTrend => "Spending per calendar month",
            Self::WeekdaySpending => "Spending by weekday",
            Self::MonthsForCategories => "Monthly totals for selected categories",
            Self::ContributionPct => "Category contribution to total (%)",
            Self::RecurringExpenses => "Recurring categories",
            Self::RecurringDescriptions => "Recurring expenses by description",
            Self::CompareHalves => "First vs second half of the year",
            Self::WeekendSplit => "Weekend vs weekday spending for a category",
            Self::PaymentSplit => "Payment modes for a category",
            Self::TopTransactions => "Largest transactions",
            Self::CashbackTransactions => "Transactions with cashback",
            Self::LargestTransaction => "Max transaction",
            Self::SmallestTransaction => "Min transaction",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        ALL_INSIGHTS
            .iter()
            .find(|i| i.key() == key)
            .copied()
            .ok_or_else(|| ExpenseError::UnknownInsight(key.to_string()))
    }

    pub fn statement(&self, filter: &Filter, params: &InsightParams) -> Statement {
        let limit = |default| params.limit.unwrap_or(default);
        let min = |default| params.min_occurrences.unwrap_or(default);
        match self {
            Self::TotalByCategory => total_by_category(filter),
            Self::TotalByPaymentMode => total_by_payment_mode(filter),
            Self::TopCategories => top_categories(filter, limit(DEFAULT_TOP_CATEGORIES)),
            Self::AvgByCategory => avg_by_category(filter),
            Self::TotalCashback => total_cashback(filter),
            Self::AverageMonthlySpend => average_monthly_spend(filter),
            Self::MonthlySpending => monthly_spending(filter),
            Self::MonthlyCashback => monthly_cashback(filter),
            Self::MonthlyTrend => monthly_trend(filter),
            Self::WeekdaySpending => weekday_spending(filter),
            Self::MonthsForCategories => months_for_categories(filter, &params.categories),
            Self::ContributionPct => category_contribution_pct(filter),
            Self::RecurringExpenses => recurring_expenses(filter, min(DEFAULT_MIN_OCCURRENCES)),
            Self::RecurringDescriptions => {
                recurring_descriptions(filter, min(DEFAULT_MIN_DESCRIPTION_REPEATS))
            }
            Self::CompareHalves => compare_h1_h2(filter),
            Self::WeekendSplit => weekend_split(
                filter,
                params.category.as_deref().unwrap_or(DEFAULT_WEEKEND_CATEGORY),
            ),
            Self::PaymentSplit => payment_split_for_category(
                filter,
                params
                    .category
                    .as_deref()
                    .unwrap_or(DEFAULT_PAYMENT_SPLIT_CATEGORY),
            ),
            Self::TopTransactions => top_transactions(filter, limit(DEFAULT_TOP_TRANSACTIONS)),
            Self::CashbackTransactions => {
                cashback_transactions(filter, limit(DEFAULT_CASHBACK_TRANSACTIONS))
            }
            Self::LargestTransaction => largest_transaction(filter),
            Self::SmallestTransaction => smallest_transaction(filter),
        }
    }
}
