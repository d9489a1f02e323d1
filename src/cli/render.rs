use comfy_table::{Cell, CellAlignment, Table};
use rusqlite::types::Value;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::store::{cell_text, ResultSet};

fn table_cell(v: &Value) -> Cell {
    match v {
        Value::Real(f) => Cell::new(format!("{f:.2}")).set_alignment(CellAlignment::Right),
        Value::Integer(i) => Cell::new(i).set_alignment(CellAlignment::Right),
        other => Cell::new(cell_text(other)),
    }
}

pub fn result_table(rs: &ResultSet) -> Table {
    let mut table = Table::new();
    table.set_header(&rs.columns);
    for row in &rs.rows {
        table.add_row(row.iter().map(table_cell).collect::<Vec<_>>());
    }
    table
}

/// Render a result set as text in the requested format.
pub fn render(rs: &ResultSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            if rs.is_empty() {
                Ok("(no rows)".to_string())
            } else {
                Ok(result_table(rs).to_string())
            }
        }
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            rs.write_csv(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rs.to_json())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["category".into(), "total_spent".into(), "txn_count".into()],
            rows: vec![
                vec![Value::Text("Travel".into()), Value::Real(200.0), Value::Integer(1)],
                vec![Value::Text("Food".into()), Value::Real(150.5), Value::Integer(2)],
            ],
        }
    }

    #[test]
    fn test_render_table() {
        let s = render(&sample(), OutputFormat::Table).unwrap();
        assert!(s.contains("category"));
        assert!(s.contains("200.00"));
        assert!(s.contains("150.50"));
    }

    #[test]
    fn test_render_empty_table() {
        let s = render(&ResultSet::default(), OutputFormat::Table).unwrap();
        assert_eq!(s, "(no rows)");
    }

    #[test]
    fn test_render_csv() {
        let s = render(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(s, "category,total_spent,txn_count\nTravel,200,1\nFood,150.5,2");
    }

    #[test]
    fn test_render_json() {
        let s = render(&sample(), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v[1]["total_spent"], 150.5);
    }
}
