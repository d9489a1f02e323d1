use std::path::Path;

use colored::Colorize;
use comfy_table::Table;
use rusqlite::types::Value;

use crate::catalog::{Count, Insight, InsightParams, ALL_INSIGHTS};
use crate::cli::render::render;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::filter::Filter;
use crate::fmt::{month_name, weekday_name};
use crate::settings::load_settings;
use crate::store::ResultSet;

fn list_insights() -> String {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Insight"]);
    for insight in ALL_INSIGHTS {
        table.add_row(vec![insight.key(), insight.title()]);
    }
    format!("{table}\n\nRun one with `spendlens insights <KEY>`.")
}

/// Swap numeric `weekday` and `month` cells for names in table output.
fn name_calendar_columns(rs: &mut ResultSet) {
    let targets: [(&str, fn(i64) -> &'static str); 2] =
        [("weekday", weekday_name), ("month", month_name)];
    for (column, name) in targets {
        let Some(idx) = rs.column_index(column) else {
            continue;
        };
        for row in &mut rs.rows {
            if let Some(&Value::Integer(n)) = row.get(idx) {
                row[idx] = Value::Text(name(n).to_string());
            }
        }
    }
}

pub fn run(
    db_path: &Path,
    key: Option<&str>,
    filter: &Filter,
    mut params: InsightParams,
    format: OutputFormat,
) -> Result<()> {
    let Some(key) = key else {
        println!("{}", list_insights());
        return Ok(());
    };
    let insight = Insight::from_key(key)?;

    if insight == Insight::TopCategories && params.limit.is_none() {
        params.limit = Some(Count::new(load_settings().top_limit));
    }

    let store = super::open_existing(db_path)?;
    let mut rs = store.execute(&insight.statement(filter, &params))?;
    if format == OutputFormat::Table {
        name_calendar_columns(&mut rs);
        println!("{}", insight.title().bold());
    }
    println!("{}", render(&rs, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_insights_names_every_key() {
        let s = list_insights();
        for insight in ALL_INSIGHTS {
            assert!(s.contains(insight.key()), "missing {}", insight.key());
        }
    }

    #[test]
    fn test_name_calendar_columns() {
        let mut rs = ResultSet {
            columns: vec!["weekday".into(), "total_spent".into()],
            rows: vec![
                vec![Value::Integer(0), Value::Real(10.0)],
                vec![Value::Integer(6), Value::Real(20.0)],
            ],
        };
        name_calendar_columns(&mut rs);
        assert_eq!(rs.rows[0][0], Value::Text("Sun".into()));
        assert_eq!(rs.rows[1][0], Value::Text("Sat".into()));
        assert_eq!(rs.rows[1][1], Value::Real(20.0));
    }

    #[test]
    fn test_name_calendar_columns_leaves_year_month_text() {
        let mut rs = ResultSet {
            columns: vec!["month".into()],
            rows: vec![vec![Value::Text("2025-03".into())], vec![Value::Integer(3)]],
        };
        name_calendar_columns(&mut rs);
        assert_eq!(rs.rows[0][0], Value::Text("2025-03".into()));
        assert_eq!(rs.rows[1][0], Value::Text("Mar".into()));
    }
}
