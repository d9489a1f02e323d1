/// Round to cents.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Format a float as money with thousands separators: ₹1,234.56
pub fn money(val: f64, symbol: &str) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Horizontal bar scaled so that `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// 0 = Sunday.
pub fn weekday_name(n: i64) -> &'static str {
    usize::try_from(n)
        .ok()
        .and_then(|i| WEEKDAYS.get(i))
        .copied()
        .unwrap_or("?")
}

/// 1 = January.
pub fn month_name(n: i64) -> &'static str {
    usize::try_from(n - 1)
        .ok()
        .and_then(|i| MONTHS.get(i))
        .copied()
        .unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "₹"), "₹1,234.56");
        assert_eq!(money(-500.00, "$"), "-$500.00");
        assert_eq!(money(0.0, "₹"), "₹0.00");
        assert_eq!(money(1000000.99, "₹"), "₹1,000,000.99");
        assert_eq!(money(42.10, ""), "42.10");
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(50.0, 100.0, 10).chars().count(), 5);
        assert_eq!(bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar(0.1, 100.0, 10).chars().count(), 1);
        assert!(bar(0.0, 100.0, 10).is_empty());
        assert!(bar(5.0, 0.0, 10).is_empty());
    }

    #[test]
    fn test_calendar_names() {
        assert_eq!(weekday_name(0), "Sun");
        assert_eq!(weekday_name(6), "Sat");
        assert_eq!(weekday_name(7), "?");
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "?");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(116.666), 116.67);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(1234.5), 1234.5);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
