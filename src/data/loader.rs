use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::series::PriceSeries;
use crate::models::trade::{LedgerEntry, Side};

/// Header names accepted for the closing price, in priority order.
/// `Close**` is how CoinMarketCap labels it in its historical tables.
const CLOSE_HEADERS: [&str; 5] = ["close**", "close*", "close", "price", "adj close"];
const DATE_HEADERS: [&str; 3] = ["date", "timestamp", "time"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%b %d, %Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Load a daily price history from a CSV file.
pub fn load_price_csv(path: &Path) -> Result<PriceSeries, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::FileRead(format!("{}: {}", path.display(), e)))?;
    let series = read_price_csv(file)?;
    info!("Loaded {} prices from {}", series.len(), path.display());
    Ok(series)
}

/// Parse a price history from any CSV source.
///
/// Rows are returned oldest first; a file whose dates run newest first is
/// reversed.
pub fn read_price_csv<R: Read>(reader: R) -> Result<PriceSeries, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let close_idx = find_column(&headers, &CLOSE_HEADERS).ok_or_else(|| AppError::CsvParseError {
        row: 1,
        message: format!("no close/price column in header {:?}", headers.iter().collect::<Vec<_>>()),
    })?;
    let date_idx = find_column(&headers, &DATE_HEADERS);

    let mut prices = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let raw = record.get(close_idx).unwrap_or("");
        let price = parse_number(raw).ok_or_else(|| AppError::CsvParseError {
            row,
            message: format!("invalid price '{}'", raw),
        })?;
        prices.push(price);

        if let Some(idx) = date_idx {
            let raw = record.get(idx).unwrap_or("");
            let date = parse_date(raw).ok_or_else(|| AppError::CsvParseError {
                row,
                message: format!("invalid date '{}'", raw),
            })?;
            dates.push(date);
        }
    }

    if check_date_order(&dates)? == DateOrder::NewestFirst {
        warn!("Price history is newest-first; reversing {} rows", prices.len());
        prices.reverse();
    }

    PriceSeries::new(prices)
}

#[derive(Debug, PartialEq, Eq)]
enum DateOrder {
    OldestFirst,
    NewestFirst,
}

/// Dates must run one way from start to end. Undated files count as oldest
/// first.
fn check_date_order(dates: &[NaiveDate]) -> Result<DateOrder, AppError> {
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(DateOrder::OldestFirst),
    };
    let order = if first > last {
        DateOrder::NewestFirst
    } else {
        DateOrder::OldestFirst
    };
    let out_of_order = dates.windows(2).position(|w| match order {
        DateOrder::OldestFirst => w[0] > w[1],
        DateOrder::NewestFirst => w[0] < w[1],
    });
    match out_of_order {
        // Header is row 1; `i + 1` is the second date of the pair.
        Some(i) => Err(AppError::CsvParseError {
            row: i + 3,
            message: format!("date {} is out of order after {}", dates[i + 1], dates[i]),
        }),
        None => Ok(order),
    }
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

/// Numbers may carry thousands separators or a leading `$`.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '$').collect();
    cleaned.trim().parse::<f64>().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            // Datetime strings: keep the date part.
            raw.get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    side: Side,
    price: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    usd_amount: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    coin_amount: Option<f64>,
}

/// Load buy/sell actions from a CSV with columns
/// `side,price,usd_amount,coin_amount`. Empty amounts count as zero.
pub fn load_ledger_csv(path: &Path) -> Result<Vec<LedgerEntry>, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::FileRead(format!("{}: {}", path.display(), e)))?;
    read_ledger_csv(file)
}

pub fn read_ledger_csv<R: Read>(reader: R) -> Result<Vec<LedgerEntry>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    rdr.deserialize::<LedgerRow>()
        .map(|row| -> Result<LedgerEntry, AppError> {
            let row = row?;
            Ok(LedgerEntry {
                side: row.side,
                price: row.price,
                usd_amount: row.usd_amount.unwrap_or(0.0),
                coin_amount: row.coin_amount.unwrap_or(0.0),
            })
        })
        .collect()
}
