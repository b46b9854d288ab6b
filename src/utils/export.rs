use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::config::AccountKind;
use crate::models::result::{DistributionStats, PerformanceReport, SimulationSummary};

/// Write a price path as `day,price` rows.
pub fn write_path_csv<W: Write>(path: &[f64], out: W) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["day", "price"])
        .map_err(|e| AppError::FileWrite(e.to_string()))?;

    for (day, price) in path.iter().enumerate() {
        wtr.write_record([day.to_string(), format!("{:.2}", price)])
            .map_err(|e| AppError::FileWrite(e.to_string()))?;
    }

    wtr.flush().map_err(|e| AppError::FileWrite(e.to_string()))?;
    Ok(())
}

pub fn write_path_csv_file(path: &[f64], file: &Path) -> Result<(), AppError> {
    let out = std::fs::File::create(file)
        .map_err(|e| AppError::FileWrite(format!("Cannot create CSV: {}", e)))?;
    write_path_csv(path, out)
}

/// Write a Monte Carlo summary as a key-value CSV report.
pub fn write_summary_csv<W: Write>(summary: &SimulationSummary, out: W) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["Metric", "Value"])
        .map_err(|e| AppError::FileWrite(e.to_string()))?;

    let mut rows: Vec<(String, String)> = vec![
        ("Strategy".into(), summary.strategy.clone()),
        ("Account".into(), account_label(summary.account).into()),
        ("Paths".into(), summary.paths.to_string()),
        ("Days".into(), summary.days.to_string()),
        ("Zero-Sum".into(), summary.zero_sum.to_string()),
        ("Start Price".into(), format!("{:.2}", summary.start_price)),
        ("Avg Max Drawdown %".into(), format!("{:.2}", summary.avg_max_drawdown_pct)),
        ("Failed Paths".into(), summary.failed_paths.to_string()),
    ];
    rows.extend(stats_rows("Terminal Price", &summary.terminal_prices, 1.0));
    // Return rows only exist when at least one path was scored.
    if summary.returns.count > 0 {
        rows.push((
            "Probability of Loss %".into(),
            format!("{:.2}", summary.probability_of_loss * 100.0),
        ));
        rows.extend(stats_rows("Return %", &summary.returns, 100.0));
    }

    for (name, value) in &rows {
        wtr.write_record([name.as_str(), value.as_str()])
            .map_err(|e| AppError::FileWrite(e.to_string()))?;
    }

    wtr.flush().map_err(|e| AppError::FileWrite(e.to_string()))?;
    Ok(())
}

fn stats_rows(label: &str, s: &DistributionStats, scale: f64) -> Vec<(String, String)> {
    [
        ("Mean", s.mean),
        ("Median", s.median),
        ("Std Dev", s.std_dev),
        ("Min", s.min),
        ("Max", s.max),
        ("P5", s.percentile_5),
        ("P25", s.percentile_25),
        ("P75", s.percentile_75),
        ("P95", s.percentile_95),
    ]
    .iter()
    .map(|(name, v)| (format!("{} {}", label, name), format!("{:.2}", v * scale)))
    .collect()
}

fn account_label(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::Unconstrained => "unconstrained",
        AccountKind::Funded => "funded",
    }
}

/// Human-readable performance breakdown.
pub fn format_report(report: &PerformanceReport) -> String {
    let r = report.rounded();
    let mut out = String::new();
    writeln!(out, "Performance ({}):", account_label(r.account)).ok();
    match r.account {
        AccountKind::Unconstrained => {
            writeln!(out, "Coin value: ${:.2}", r.coin_value).ok();
            writeln!(out, "Value of coins already sold: ${:.2}", r.cash_value).ok();
            writeln!(out, "Total value: ${:.2}", r.total_value).ok();
            writeln!(out, "Total spent: ${:.2}", r.basis).ok();
        }
        AccountKind::Funded => {
            writeln!(out, "Start money: ${:.2}", r.basis).ok();
            writeln!(out, "Coin value: ${:.2}", r.coin_value).ok();
            writeln!(out, "Cash remain: ${:.2}", r.cash_value).ok();
            writeln!(out, "Total value: ${:.2}", r.total_value).ok();
        }
    }
    writeln!(out, "Coins owned: {}", r.coins_owned).ok();
    write!(out, "Return: {:.2}%", report.performance * 100.0).ok();
    out
}

/// Human-readable Monte Carlo summary.
pub fn format_summary(summary: &SimulationSummary) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "Strategy '{}' on {} {}-day paths ({} account, zero-sum: {})",
        summary.strategy,
        summary.paths,
        summary.days,
        account_label(summary.account),
        summary.zero_sum
    )
    .ok();
    writeln!(out, "Start price: ${:.2}", summary.start_price).ok();
    let t = &summary.terminal_prices;
    writeln!(
        out,
        "Terminal price: mean ${:.2}, median ${:.2}, 5%-95% ${:.2} - ${:.2}",
        t.mean, t.median, t.percentile_5, t.percentile_95
    )
    .ok();
    let r = &summary.returns;
    if r.count > 0 {
        writeln!(
            out,
            "Return: mean {:.2}%, median {:.2}%, 5%-95% {:.2}% - {:.2}%",
            r.mean * 100.0,
            r.median * 100.0,
            r.percentile_5 * 100.0,
            r.percentile_95 * 100.0
        )
        .ok();
        writeln!(out, "Probability of loss: {:.2}%", summary.probability_of_loss * 100.0).ok();
    } else {
        writeln!(out, "Return: no path could be scored").ok();
    }
    write!(out, "Avg max drawdown: {:.2}%", summary.avg_max_drawdown_pct).ok();
    if summary.failed_paths > 0 {
        write!(out, "\nUnscored paths: {}", summary.failed_paths).ok();
    }
    out
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> PerformanceReport {
        PerformanceReport {
            account: AccountKind::Unconstrained,
            mark_price: 120.0,
            coins_owned: 10.0,
            coin_value: 1200.0,
            basis: 1000.0,
            cash_value: 0.0,
            total_value: 1200.0,
            performance: 0.2,
        }
    }

    #[test]
    fn test_path_csv() {
        let mut buf = Vec::new();
        write_path_csv(&[100.0, 110.004, 98.996], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "day,price\n0,100.00\n1,110.00\n2,99.00\n");
    }

    #[test]
    fn test_format_report() {
        let text = format_report(&sample_report());
        assert!(text.contains("Coin value: $1200.00"));
        assert!(text.contains("Total spent: $1000.00"));
        assert!(text.ends_with("Return: 20.00%"));
    }

    fn sample_summary() -> SimulationSummary {
        SimulationSummary {
            strategy: "lump_sum".into(),
            account: AccountKind::Funded,
            paths: 10,
            days: 30,
            zero_sum: true,
            start_price: 50.0,
            terminal_prices: DistributionStats::default(),
            returns: DistributionStats {
                count: 10,
                mean: 0.1234,
                ..Default::default()
            },
            probability_of_loss: 0.3,
            avg_max_drawdown_pct: 12.5,
            failed_paths: 0,
        }
    }

    #[test]
    fn test_summary_csv_rows() {
        let summary = sample_summary();
        let mut buf = Vec::new();
        write_summary_csv(&summary, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Metric,Value\n"));
        assert!(text.contains("Account,funded\n"));
        assert!(text.contains("Probability of Loss %,30.00\n"));
        assert!(text.contains("Return % Mean,12.34\n"));
        assert!(format_summary(&summary).contains("Probability of loss: 30.00%"));
    }

    #[test]
    fn test_summary_without_scored_paths() {
        let summary = SimulationSummary {
            returns: DistributionStats::default(),
            probability_of_loss: 0.0,
            failed_paths: 10,
            ..sample_summary()
        };
        let text = format_summary(&summary);
        assert!(text.contains("Return: no path could be scored"));
        assert!(!text.contains("Probability of loss"));
        assert!(text.ends_with("Unscored paths: 10"));

        let mut buf = Vec::new();
        write_summary_csv(&summary, &mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        assert!(csv.contains("Failed Paths,10\n"));
        assert!(!csv.contains("Probability of Loss"));
        assert!(!csv.contains("Return %"));
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&sample_report()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["account"], "unconstrained");
        assert_eq!(v["performance"], 0.2);
    }
}
