//! CSV ingest and normalization.
//!
//! This module is responsible for turning a raw transaction export into a
//! clean, typed `Dataset` that every downstream stage can trust.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level dropping** of incomplete line items, with counts reported
//! - **Whole-load failure** when a kept row has an unparsable date or number
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no aggregation logic here

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{CustomerId, Dataset, LoadOptions, TransactionRecord};
use crate::error::PipelineError;

const COL_INVOICE_NO: &str = "InvoiceNo";
const COL_DESCRIPTION: &str = "Description";
const COL_QUANTITY: &str = "Quantity";
const COL_UNIT_PRICE: &str = "UnitPrice";
const COL_INVOICE_DATE: &str = "InvoiceDate";
const COL_CUSTOMER_ID: &str = "CustomerID";
const COL_COUNTRY: &str = "Country";

const DATETIME_FMTS: [&str; 5] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];
const DATE_FMTS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Summary of what happened while reading the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows discarded because a required field was empty.
    pub rows_dropped: usize,
    /// Name of the text encoding the source was decoded with.
    pub encoding: &'static str,
}

/// Ingest output: the cleaned dataset plus read statistics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub stats: IngestStats,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    invoice_no: usize,
    description: usize,
    quantity: usize,
    unit_price: usize,
    invoice_date: usize,
    customer_id: usize,
    country: usize,
}

/// Read and clean a transaction file from disk.
pub fn load_dataset(path: &Path, options: LoadOptions) -> Result<IngestedData, PipelineError> {
    let bytes = fs::read(path).map_err(|e| PipelineError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let data = parse_dataset(&bytes, options)?;
    log::info!(
        "loaded '{}': {} rows read, {} kept, {} dropped as incomplete ({})",
        path.display(),
        data.stats.rows_read,
        data.stats.rows_kept,
        data.stats.rows_dropped,
        data.stats.encoding,
    );
    Ok(data)
}

/// Clean an in-memory transaction export.
pub fn parse_dataset(content: &[u8], options: LoadOptions) -> Result<IngestedData, PipelineError> {
    let (text, encoding) = decode_content(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Parse {
            line: 1,
            message: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and CSV lines are 1-based.
        let fallback_line = idx + 2;

        let record = result.map_err(|e| PipelineError::Parse {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line),
            message: format!("CSV parse error: {e}"),
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);
        rows_read += 1;

        match parse_row(&record, &columns, options) {
            Ok(Some(row)) => records.push(row),
            Ok(None) => rows_dropped += 1,
            Err(message) => return Err(PipelineError::Parse { line, message }),
        }
    }

    let stats = IngestStats {
        rows_read,
        rows_kept: records.len(),
        rows_dropped,
        encoding,
    };

    Ok(IngestedData {
        dataset: Dataset::new(records),
        stats,
    })
}

/// Decode source bytes, falling back to Windows-1252 (a superset of
/// ISO-8859-1) when the content is not valid UTF-8.
fn decode_content(content: &[u8]) -> (Cow<'_, str>, &'static str) {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);

    match std::str::from_utf8(content) {
        Ok(s) => (Cow::Borrowed(s), encoding_rs::UTF_8.name()),
        Err(e) => {
            log::warn!(
                "source is not valid UTF-8 (first bad byte at {}); decoding as {}",
                e.valid_up_to(),
                encoding_rs::WINDOWS_1252.name()
            );
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(content);
            (text, encoding_rs::WINDOWS_1252.name())
        }
    }
}

fn resolve_columns(headers: &StringRecord) -> Result<Columns, PipelineError> {
    let header_map = build_header_map(headers);

    let find = |name: &str| -> Result<usize, PipelineError> {
        header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| PipelineError::Parse {
                line: 1,
                message: format!("Missing required column: `{name}`"),
            })
    };

    Ok(Columns {
        invoice_no: find(COL_INVOICE_NO)?,
        description: find(COL_DESCRIPTION)?,
        quantity: find(COL_QUANTITY)?,
        unit_price: find(COL_UNIT_PRICE)?,
        invoice_date: find(COL_INVOICE_DATE)?,
        customer_id: find(COL_CUSTOMER_ID)?,
        country: find(COL_COUNTRY)?,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins on duplicate headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

/// `Invoice_No`, `invoice no` and `InvoiceNo` all resolve to `invoiceno`.
fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit a BOM on the first header even
    // after the file-level BOM was stripped by a re-save.
    name.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parse one CSV record.
///
/// Returns `Ok(None)` for an incomplete row (to be dropped) and `Err` for a
/// complete row whose values cannot be interpreted.
fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    options: LoadOptions,
) -> Result<Option<TransactionRecord>, String> {
    let fields = (
        get_value(record, columns.invoice_no),
        get_value(record, columns.description),
        get_value(record, columns.quantity),
        get_value(record, columns.unit_price),
        get_value(record, columns.invoice_date),
        get_value(record, columns.country),
    );
    let (Some(invoice_no), Some(description), Some(quantity), Some(unit_price), Some(invoice_date), Some(country)) =
        fields
    else {
        return Ok(None);
    };

    let customer_id = get_value(record, columns.customer_id).and_then(CustomerId::canonical);
    if options.require_customer && customer_id.is_none() {
        return Ok(None);
    }

    let record = TransactionRecord {
        invoice_no: invoice_no.to_string(),
        description: description.to_string(),
        quantity: parse_quantity(quantity)?,
        unit_price: parse_decimal(unit_price)
            .ok_or_else(|| format!("Invalid `{COL_UNIT_PRICE}` value '{unit_price}'."))?,
        invoice_date: parse_timestamp(invoice_date)?,
        customer_id,
        country: country.to_string(),
    };

    // Kept records always have a representable line revenue.
    if record.line_revenue().is_err() {
        return Err(format!(
            "`{COL_QUANTITY}` x `{COL_UNIT_PRICE}` ({quantity} x {unit_price}) is out of range."
        ));
    }
    Ok(Some(record))
}

fn get_value(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_quantity(s: &str) -> Result<i64, String> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }

    // Float-typed exports write integral quantities as `6.0`.
    parse_decimal(s)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i64())
        .ok_or_else(|| format!("Invalid `{COL_QUANTITY}` value '{s}' (expected an integer)."))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(format!(
        "Invalid `{COL_INVOICE_DATE}` value '{s}'. Expected M/D/YYYY H:MM, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const HEADER: &str = "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country\n";

    fn csv(rows: &[&str]) -> Vec<u8> {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out.into_bytes()
    }

    #[test]
    fn parses_source_style_rows() {
        let bytes = csv(&[
            "536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850.0,United Kingdom",
            "536366,22633,HAND WARMER UNION JACK,6,12/1/2010 8:28,1.85,17850,United Kingdom",
        ]);
        let data = parse_dataset(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(data.stats.rows_read, 2);
        assert_eq!(data.stats.rows_kept, 2);
        assert_eq!(data.stats.encoding, "UTF-8");

        let first = &data.dataset.records()[0];
        assert_eq!(first.invoice_no, "536365");
        assert_eq!(first.quantity, 6);
        assert_eq!(first.unit_price, dec!(2.55));
        assert_eq!(first.line_revenue(), Ok(dec!(15.30)));
        assert_eq!(
            first.invoice_date,
            NaiveDate::from_ymd_opt(2010, 12, 1).unwrap().and_hms_opt(8, 26, 0).unwrap()
        );
        assert_eq!(first.customer_id, data.dataset.records()[1].customer_id);
    }

    #[test]
    fn every_kept_record_is_complete() {
        let bytes = csv(&[
            "1,A,LANTERN,2,2011-01-01 10:00:00,3.00,100,France",
            "2,B,,2,2011-01-01 10:00:00,3.00,100,France",
            "3,C,MUG,,2011-01-01 10:00:00,3.00,100,France",
            "4,D,MUG,1,2011-01-02 10:00:00,3.00,,France",
            "5,E,MUG,1",
        ]);
        let data = parse_dataset(&bytes, LoadOptions::default()).unwrap();

        assert_eq!(data.stats.rows_read, 5);
        assert_eq!(data.stats.rows_kept, 2);
        assert_eq!(data.stats.rows_dropped, 3);
        for r in data.dataset.iter() {
            assert!(!r.invoice_no.is_empty() && !r.description.is_empty() && !r.country.is_empty());
            assert_eq!(r.line_revenue(), Ok(Decimal::from(r.quantity) * r.unit_price));
        }
        assert!(data.dataset.records()[1].customer_id.is_none());
    }

    #[test]
    fn require_customer_drops_anonymous_rows() {
        let bytes = csv(&[
            "1,A,LANTERN,2,2011-01-01 10:00:00,3.00,100,France",
            "4,D,MUG,1,2011-01-02 10:00:00,3.00,,France",
        ]);
        let data = parse_dataset(&bytes, LoadOptions { require_customer: true }).unwrap();
        assert_eq!(data.stats.rows_kept, 1);
        assert_eq!(data.stats.rows_dropped, 1);
    }

    #[test]
    fn latin1_source_is_decoded() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"1,A,CAF\xC9 MUG,1,2011-01-01,4.50,12,Espa\xF1a\n");

        let data = parse_dataset(&bytes, LoadOptions::default()).unwrap();
        assert_eq!(data.stats.encoding, "windows-1252");
        let r = &data.dataset.records()[0];
        assert_eq!(r.description, "CAFÉ MUG");
        assert_eq!(r.country, "España");
    }

    #[test]
    fn unparsable_date_fails_the_whole_load() {
        let bytes = csv(&[
            "1,A,LANTERN,2,2011-01-01 10:00:00,3.00,100,France",
            "2,A,LANTERN,2,not a date,3.00,100,France",
        ]);
        let err = parse_dataset(&bytes, LoadOptions::default()).unwrap_err();
        match err {
            PipelineError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("not a date"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unparsable_numbers_fail_the_load() {
        let bytes = csv(&["1,A,LANTERN,two,2011-01-01,3.00,100,France"]);
        assert!(matches!(
            parse_dataset(&bytes, LoadOptions::default()),
            Err(PipelineError::Parse { .. })
        ));

        let bytes = csv(&["1,A,LANTERN,2,2011-01-01,cheap,100,France"]);
        assert!(matches!(
            parse_dataset(&bytes, LoadOptions::default()),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_range_line_revenue_fails_the_load() {
        let bytes = csv(&[
            "1,A,LANTERN,2,2011-01-01,3.00,100,France",
            "2,A,GOLD BAR,9000000000000000000,2011-01-01,100000000000,100,France",
        ]);
        match parse_dataset(&bytes, LoadOptions::default()) {
            Err(PipelineError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("out of range"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn float_quantities_and_scientific_prices_are_accepted() {
        let bytes = csv(&["1,A,LANTERN,6.0,2011-01-01,1e-1,100,France"]);
        let data = parse_dataset(&bytes, LoadOptions::default()).unwrap();
        let r = &data.dataset.records()[0];
        assert_eq!(r.quantity, 6);
        assert_eq!(r.line_revenue(), Ok(dec!(0.6)));

        let bytes = csv(&["1,A,LANTERN,1.5,2011-01-01,1,100,France"]);
        assert!(parse_dataset(&bytes, LoadOptions::default()).is_err());
    }

    #[test]
    fn missing_column_is_reported() {
        let bytes = b"InvoiceNo,Description,Quantity,UnitPrice,CustomerID,Country\n1,A,1,1,1,UK\n";
        let err = parse_dataset(bytes, LoadOptions::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Parse {
                line: 1,
                message: "Missing required column: `InvoiceDate`".to_string(),
            }
        );
    }

    #[test]
    fn header_names_are_normalized() {
        let bytes = "\u{feff}invoice_no,description,quantity,unit_price,invoice_date,customer_id,country\n\
                     9,CANDLE,3,1.25,2011-02-03 09:15,77,Germany\n";
        let data = parse_dataset(bytes.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(data.dataset.len(), 1);
        assert_eq!(data.dataset.records()[0].country, "Germany");
    }

    #[test]
    fn load_dataset_reads_files_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&csv(&["1,A,LANTERN,2,2011-01-01,3.00,100,France"])).unwrap();

        let data = load_dataset(file.path(), LoadOptions::default()).unwrap();
        assert_eq!(data.dataset.len(), 1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            load_dataset(&missing, LoadOptions::default()),
            Err(PipelineError::Load { .. })
        ));
    }
}
