pub fn format_throughput(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "not available".to_string();
    };

    if value >= 1_000_000_000.0 {
        format!("{:.2} B rows/sec", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2} M rows/sec", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2} K rows/sec", value / 1_000.0)
    } else {
        format!("{value:.2} rows/sec")
    }
}

pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut out = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_plain_rates_with_two_decimals() {
        assert_eq!(format_throughput(Some(950.0)), "950.00 rows/sec");
        assert_eq!(format_throughput(Some(0.0)), "0.00 rows/sec");
    }

    #[test]
    fn formats_scaled_rates() {
        assert_eq!(format_throughput(Some(1_500.0)), "1.50 K rows/sec");
        assert_eq!(format_throughput(Some(2_300_000.0)), "2.30 M rows/sec");
        assert_eq!(format_throughput(Some(4_100_000_000.0)), "4.10 B rows/sec");
    }

    #[test]
    fn absent_value_reads_not_available() {
        assert_eq!(format_throughput(None), "not available");
    }

    #[test]
    fn ellipsize_keeps_short_names_and_trims_long_ones() {
        assert_eq!(ellipsize("orders", 10), "orders");
        assert_eq!(
            ellipsize("orders_enriched_with_customers", 12),
            "orders_enri…"
        );
    }
}
