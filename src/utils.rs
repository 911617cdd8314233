/// Compact dollar amount for chart labels: `$12.3M`, `$45.6K`, `$789`.
/// Negative amounts carry the sign ahead of the dollar sign.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if abs >= 1_000_000.0 {
        format!("{}${:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}${:.1}K", sign, abs / 1_000.0)
    } else {
        let whole = format!("{:.0}", abs);
        // -0.4 rounds to "0" and should not print as "-$0"
        if whole == "0" {
            "$0".to_string()
        } else {
            format!("{}${}", sign, whole)
        }
    }
}

pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(33_327_940.0), "$33.3M");
        assert_eq!(format_currency(-1_607_943.0), "-$1.6M");
        assert_eq!(format_currency(45_600.0), "$45.6K");
        assert_eq!(format_currency(789.0), "$789");
        assert_eq!(format_currency(-0.4), "$0");
        assert_eq!(format_currency(0.0), "$0");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(2443.0)), "2443%");
        assert_eq!(format_percentage(Some(8.4)), "8%");
        assert_eq!(format_percentage(None), "N/A");
    }
}
