//! Filter composition.
//!
//! A [`Filter`] is an ordered list of predicates that narrows the rows every
//! catalog query sees. Structured predicates render to bound parameters;
//! [`Predicate::Raw`] fragments are glued in as text using [`compose`], so
//! they must come from a trusted caller.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::types::Value;

use crate::error::{ExpenseError, Result};

/// Always-true condition every catalog statement starts from.
pub const BASE_CONDITION: &str = "WHERE 1=1";

fn and_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^AND\s").unwrap())
}

/// Glue a caller-supplied boolean fragment onto `base`.
///
/// An empty fragment leaves `base` untouched, a fragment that already starts
/// with `AND` is appended after one space, anything else gets `AND ` first.
/// The fragment's content is not inspected.
pub fn compose(base: &str, fragment: &str) -> String {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        base.to_string()
    } else if and_prefix().is_match(fragment) {
        format!("{base} {fragment}")
    } else {
        format!("{base} AND {fragment}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Category(String),
    PaymentMode(String),
    /// Calendar month as `YYYY-MM`.
    Month(String),
    /// Trusted SQL fragment, composed verbatim.
    Raw(String),
}

/// Rendered condition plus the values for its numbered placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Clause {
    /// Index the next bound value will take.
    pub fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// Bind `value` and return its `?N` placeholder.
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        let idx = self.next_index();
        self.params.push(value.into());
        format!("?{idx}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn and_raw(self, fragment: &str) -> Self {
        if fragment.trim().is_empty() {
            self
        } else {
            self.and(Predicate::Raw(fragment.to_string()))
        }
    }

    pub fn category(self, category: &str) -> Self {
        self.and(Predicate::Category(category.to_string()))
    }

    pub fn payment_mode(self, mode: &str) -> Self {
        self.and(Predicate::PaymentMode(mode.to_string()))
    }

    pub fn month(self, month: &str) -> Result<Self> {
        let month = parse_month(month)?;
        Ok(self.and(Predicate::Month(month)))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render every predicate onto `base`, left to right.
    pub fn render(&self, base: &str) -> Clause {
        let mut clause = Clause {
            sql: base.to_string(),
            params: Vec::new(),
        };
        for predicate in &self.predicates {
            let fragment = match predicate {
                Predicate::Category(c) => {
                    format!("category = {}", clause.bind(c.clone()))
                }
                Predicate::PaymentMode(m) => {
                    format!("payment_mode = {}", clause.bind(m.clone()))
                }
                Predicate::Month(m) => {
                    format!("substr(date, 1, 7) = {}", clause.bind(m.clone()))
                }
                Predicate::Raw(raw) => raw.clone(),
            };
            clause.sql = compose(&clause.sql, &fragment);
        }
        clause
    }
}

/// Normalize a `YYYY-MM` month, rejecting anything that is not a real month.
pub fn parse_month(raw: &str) -> Result<String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| ExpenseError::InvalidMonth(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_empty_fragment() {
        assert_eq!(compose("WHERE 1=1", ""), "WHERE 1=1");
        assert_eq!(compose("WHERE 1=1", "   \t "), "WHERE 1=1");
    }

    #[test]
    fn test_compose_and_prefixed_fragment() {
        assert_eq!(
            compose("WHERE 1=1", "AND category='Food'"),
            "WHERE 1=1 AND category='Food'"
        );
        assert_eq!(
            compose("WHERE 1=1", "  and amount > 5  "),
            "WHERE 1=1 and amount > 5"
        );
        assert_eq!(compose("WHERE 1=1", "And\tx = 1"), "WHERE 1=1 And\tx = 1");
    }

    #[test]
    fn test_compose_bare_fragment() {
        assert_eq!(
            compose("WHERE 1=1", "category='Food'"),
            "WHERE 1=1 AND category='Food'"
        );
        // "ANDROID" is not an AND keyword
        assert_eq!(
            compose("WHERE 1=1", "ANDROID = 1"),
            "WHERE 1=1 AND ANDROID = 1"
        );
    }

    #[test]
    fn test_compose_never_duplicates_and() {
        let out = compose("WHERE 1=1", "AND a = 1");
        assert_eq!(out.matches("AND").count(), 1);
    }

    #[test]
    fn test_render_empty_filter_is_base() {
        let clause = Filter::new().render(BASE_CONDITION);
        assert_eq!(clause.sql, BASE_CONDITION);
        assert!(clause.params.is_empty());
    }

    #[test]
    fn test_render_binds_values() {
        let clause = Filter::new()
            .category("Food")
            .payment_mode("O'Brien Card")
            .render(BASE_CONDITION);
        assert_eq!(clause.sql, "WHERE 1=1 AND category = ?1 AND payment_mode = ?2");
        assert_eq!(
            clause.params,
            vec![Value::Text("Food".into()), Value::Text("O'Brien Card".into())]
        );
    }

    #[test]
    fn test_render_mixes_raw_and_bound() {
        let clause = Filter::new().and_raw("AND amount > 100")
            .month("2025-3")
            .unwrap()
            .render(BASE_CONDITION);
        assert_eq!(
            clause.sql,
            "WHERE 1=1 AND amount > 100 AND substr(date, 1, 7) = ?1"
        );
        assert_eq!(clause.params, vec![Value::Text("2025-03".into())]);
    }

    #[test]
    fn test_raw_empty_is_no_filter() {
        assert!(Filter::new().and_raw("  ").is_empty());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-01").unwrap(), "2025-01");
        assert!(matches!(parse_month("2025-13"), Err(ExpenseError::InvalidMonth(_))));
        assert!(parse_month("January").is_err());
    }

    #[test]
    fn test_bind_continues_numbering() {
        let mut clause = Filter::new().category("Food").render(BASE_CONDITION);
        assert_eq!(clause.bind(5i64), "?2");
        assert_eq!(clause.next_index(), 3);
    }
}
