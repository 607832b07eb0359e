//! Plain-text diagnostics: evaluation summaries, table rows and parameter
//! inventories.

use std::fmt::Write;

use sweepplot_core::{Evaluation, ParameterInventory};

use crate::recipes::TableRecipe;

/// Significant digits used for evaluation output
pub const SIGNIFICANT_DIGITS: usize = 4;

/// Format `value` with `digits` significant digits, dropping trailing zeros.
///
/// Very small or very large magnitudes switch to exponent notation.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let digits = digits.max(1);
    let exponent = value.abs().log10().floor() as i32;

    if exponent < -4 || exponent >= digits as i32 {
        let formatted = format!("{:.*e}", digits - 1, value);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_zeros(mantissa)),
            None => formatted,
        };
    }

    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Header line followed by one `<metric> has mean: ... and mean std dev: ...`
/// line per metric. The "mean std dev" is the standard error of the mean.
pub fn format_evaluation(header: &str, evaluation: &Evaluation) -> String {
    let mut out = format!("{header}:\n");
    for (metric, summary) in &evaluation.metrics {
        match summary {
            Some(summary) => {
                let _ = writeln!(
                    out,
                    "  {metric} has mean: {:>6} and mean std dev: {:>6}",
                    format_significant(summary.mean, SIGNIFICANT_DIGITS),
                    format_significant(summary.std_err(), SIGNIFICANT_DIGITS),
                );
            }
            None => {
                let _ = writeln!(out, "  {metric} has no data");
            }
        }
    }
    out
}

/// One `label & v1 & v2 ...` row with per-column decimals
pub fn format_table_row(label: &str, evaluation: &Evaluation, table: &TableRecipe) -> String {
    let mut row = label.to_string();
    for (column, metric) in table.metrics.iter().enumerate() {
        let decimals = table.decimals_for(column);
        match evaluation.get(*metric) {
            Some(summary) => {
                let _ = write!(row, " & {:.*}", decimals, summary.mean);
            }
            None => row.push_str(" & -"),
        }
    }
    row
}

/// One line per parameter: `key: value, value, ...`
pub fn format_inventory(inventory: &ParameterInventory) -> String {
    let mut out = format!("{} matching records\n", inventory.matched);
    for (key, values) in &inventory.values {
        let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "{key}: {}", joined.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepplot_core::{Conditions, Metric, Metrics, Params, Record, evaluate, parameter_values};

    fn record(token: &str, cost: f64, safety: f64) -> Record {
        Record::new(
            Params::parse(token).unwrap(),
            Metrics::from_fields(&[cost, 0.0, 0.0, 0.0, 6.2, safety, 0.0, 0.0, 0.1]).unwrap(),
        )
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(6.2064, 4), "6.206");
        assert_eq!(format_significant(427.54, 4), "427.5");
        assert_eq!(format_significant(0.0034391, 4), "0.003439");
        assert_eq!(format_significant(0.00112, 4), "0.00112");
        assert_eq!(format_significant(12.0, 4), "12");
        assert_eq!(format_significant(123456.0, 4), "1.235e5");
        assert_eq!(format_significant(0.0000123, 4), "1.23e-5");
        assert_eq!(format_significant(0.0, 4), "0");
        assert_eq!(format_significant(-2.5, 4), "-2.5");
    }

    #[test]
    fn test_format_evaluation() {
        let records = vec![
            record("method=fixed", 400.0, 0.0),
            record("method=fixed", 500.0, 0.01),
        ];
        let conditions = Conditions::from_pairs([("method", "fixed")]).unwrap();
        let evaluation = evaluate(&records, &[Metric::Cost, Metric::P95Time], &conditions);

        let text = format_evaluation(&conditions.to_string(), &evaluation);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "method=fixed:");
        assert_eq!(lines[1], "  cost has mean:    450 and mean std dev:     50");
        assert_eq!(lines[2], "  95_ts has no data");
    }

    #[test]
    fn test_format_table_row() {
        let records = vec![
            record("method=fixed", 400.0, 0.0),
            record("method=fixed", 502.0, 0.01),
        ];
        let conditions = Conditions::from_pairs([("method", "fixed")]).unwrap();
        let table = TableRecipe {
            title: None,
            metrics: vec![Metric::Cost, Metric::Safety, Metric::Efficiency, Metric::MaxTime],
            decimals: vec![0, 4, 1],
            conditions: Conditions::new(),
            rows: Vec::new(),
        };
        let evaluation = evaluate(&records, &table.metrics, &conditions);

        assert_eq!(
            format_table_row("Fixed", &evaluation, &table),
            "Fixed & 451 & 0.0050 & 6.2 & -"
        );
    }

    #[test]
    fn test_format_inventory() {
        let records = vec![
            record("method=eudm,use_cfb=true", 1.0, 0.0),
            record("method=eudm,use_cfb=false", 1.0, 0.0),
        ];
        let inventory = parameter_values(&records, &Conditions::new());
        let text = format_inventory(&inventory);
        assert!(text.starts_with("2 matching records\n"));
        assert!(text.contains("method: eudm\n"));
        assert!(text.contains("use_cfb: true, false\n"));
    }
}
