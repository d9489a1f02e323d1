use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::catalog;
use crate::error::Result;
use crate::filter::Filter;
use crate::fmt::{bar, money};
use crate::settings::load_settings;
use crate::store::{ResultSet, Store};

const BAR_WIDTH: usize = 30;

pub struct Kpis {
    pub total_spent: f64,
    pub txn_count: i64,
    pub total_cashback: f64,
    pub avg_amount: f64,
}

/// (label, total, share of the filtered total in percent)
pub type Series = Vec<(String, f64, f64)>;

pub struct Dashboard {
    pub filtered: bool,
    pub kpis: Kpis,
    pub by_category: Series,
    pub by_payment_mode: Series,
    pub monthly: Series,
}

fn series(rs: &ResultSet, total: f64) -> Series {
    (0..rs.len())
        .map(|r| {
            let label = rs.text_at(r, 0).unwrap_or_default();
            let value = rs.f64_at(r, 1).unwrap_or(0.0);
            let pct = if total > 0.0 { value / total * 100.0 } else { 0.0 };
            (label, value, pct)
        })
        .collect()
}

pub fn build(store: &Store, filter: &Filter) -> Result<Dashboard> {
    let k = store.execute(&catalog::kpi_summary(filter))?;
    let kpis = Kpis {
        total_spent: k.f64_at(0, 0).unwrap_or(0.0),
        txn_count: k.i64_at(0, 1).unwrap_or(0),
        total_cashback: k.f64_at(0, 2).unwrap_or(0.0),
        avg_amount: k.f64_at(0, 3).unwrap_or(0.0),
    };
    let total = kpis.total_spent;

    let by_category = series(&store.execute(&catalog::total_by_category(filter))?, total);
    let mut by_payment_mode =
        series(&store.execute(&catalog::total_by_payment_mode(filter))?, total);
    by_payment_mode.sort_by(|a, b| b.1.total_cmp(&a.1));
    let monthly = series(&store.execute(&catalog::monthly_trend(filter))?, total);

    Ok(Dashboard {
        filtered: !filter.is_empty(),
        kpis,
        by_category,
        by_payment_mode,
        monthly,
    })
}

fn chart(title: &str, label: &str, data: &Series, currency: &str) -> String {
    let max = data.iter().map(|(_, v, _)| *v).fold(0.0, f64::max);
    let mut table = Table::new();
    table.set_header(vec![label, "Amount", "%", ""]);
    for (name, value, pct) in data {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(money(*value, currency)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{pct:.1}%")).set_alignment(CellAlignment::Right),
            Cell::new(bar(*value, max, BAR_WIDTH)),
        ]);
    }
    format!("{}\n{table}", title.bold())
}

pub fn format_dashboard(d: &Dashboard, currency: &str) -> String {
    if d.kpis.txn_count == 0 {
        return if d.filtered {
            "No expenses match these filters.".to_string()
        } else {
            "No expenses yet. Add some with `spendlens add`, `spendlens import` or `spendlens seed`."
                .to_string()
        };
    }

    let mut kpi = Table::new();
    kpi.set_header(vec!["Total Spending", "Transactions", "Total Cashback", "Avg Transaction"]);
    kpi.add_row(vec![
        Cell::new(money(d.kpis.total_spent, currency)),
        Cell::new(d.kpis.txn_count),
        Cell::new(money(d.kpis.total_cashback, currency)),
        Cell::new(money(d.kpis.avg_amount, currency)),
    ]);

    [
        format!("{}\n{kpi}", "Expense Overview".bold()),
        chart("Spending by Category", "Category", &d.by_category, currency),
        chart("Payment Mode Distribution", "Payment Mode", &d.by_payment_mode, currency),
        chart("Monthly Spending Trend", "Month", &d.monthly, currency),
    ]
    .join("\n\n")
}

pub fn run(db_path: &Path, filter: &Filter) -> Result<()> {
    let store = super::open_existing(db_path)?;
    let dashboard = build(&store, filter)?;
    println!("{}", format_dashboard(&dashboard, &load_settings().currency));
    Ok(())
}
