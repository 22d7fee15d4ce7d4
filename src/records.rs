// 📂 Record Store - parsed sales rows
// Loads the flat sales CSV once, applies the country scope, validates every row
// into a strongly-typed TransactionRecord.

use crate::error::{DashboardError, Result};
use anyhow::Context;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One validated sales row. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub region: String,
    pub year: i32,
    pub product_line: String,
    pub sales_amount: f64,
}

impl TransactionRecord {
    pub fn new(region: &str, year: i32, product_line: &str, sales_amount: f64) -> Self {
        TransactionRecord {
            region: region.to_string(),
            year,
            product_line: product_line.to_string(),
            sales_amount,
        }
    }
}

/// Which column plays the role of "region".
///
/// - `State { country }`: keep only rows of one country, group by STATE
/// - `Country`: keep every row, group by COUNTRY
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionScope {
    State { country: String },
    Country,
}

impl Default for RegionScope {
    fn default() -> Self {
        RegionScope::State {
            country: "USA".to_string(),
        }
    }
}

impl RegionScope {
    /// Human-readable name of the region key
    pub fn region_label(&self) -> &str {
        match self {
            RegionScope::State { .. } => "State",
            RegionScope::Country => "Country",
        }
    }

    /// Location coding of the region tokens, as understood by choropleth renderers
    pub fn location_mode(&self) -> &str {
        match self {
            RegionScope::State { .. } => "USA-states",
            RegionScope::Country => "country names",
        }
    }

    pub fn geo_scope(&self) -> &str {
        match self {
            RegionScope::State { .. } => "usa",
            RegionScope::Country => "world",
        }
    }

    /// Region shown in the pie chart before the first map click
    pub fn default_fallback_region(&self) -> &str {
        match self {
            RegionScope::State { .. } => "CA",
            RegionScope::Country => "USA",
        }
    }

    pub fn dashboard_title(&self) -> &str {
        match self {
            RegionScope::State { .. } => "US Sales Data Heatmap",
            RegionScope::Country => "Global Sales Data Heatmap",
        }
    }
}

/// Raw CSV row, before validation. Every field is optional so that a missing
/// column surfaces as a DataFormat error on the record instead of a CSV error.
#[derive(Debug, Clone, Deserialize)]
struct RawSalesRow {
    #[serde(rename = "ORDERDATE")]
    order_date: Option<String>,

    #[serde(rename = "PRODUCTLINE")]
    product_line: Option<String>,

    #[serde(rename = "SALES")]
    sales: Option<String>,

    #[serde(rename = "COUNTRY")]
    country: Option<String>,

    #[serde(rename = "STATE")]
    state: Option<String>,
}

/// Outcome of one load
#[derive(Debug, Default)]
pub struct LoadReport {
    pub rows_read: usize,
    pub loaded: usize,
    pub filtered_out: usize,
    pub rejected: Vec<DashboardError>,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        format!(
            "Read {} rows: {} loaded, {} outside scope, {} rejected",
            self.rows_read,
            self.loaded,
            self.filtered_out,
            self.rejected.len()
        )
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<TransactionRecord>,
}

impl RecordStore {
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        RecordStore { records }
    }

    /// Parse a sales CSV from any reader.
    ///
    /// Rows outside the scope's country are dropped before validation, so a
    /// malformed foreign row never counts as rejected.
    pub fn from_reader<R: Read>(reader: R, scope: &RegionScope) -> Result<(Self, LoadReport)> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = decode_record(rdr.byte_headers()?);

        let mut report = LoadReport::default();
        let mut records = Vec::new();
        let mut raw = ByteRecord::new();

        while rdr.read_byte_record(&mut raw)? {
            report.rows_read += 1;
            let line = raw.position().map(|p| p.line()).unwrap_or(0);
            let row: RawSalesRow = decode_record(&raw).deserialize(Some(&headers))?;

            match validate_row(&row, line, scope) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => report.filtered_out += 1,
                Err(err) => {
                    tracing::warn!("rejected sales row: {}", err);
                    report.rejected.push(err);
                }
            }
        }

        report.loaded = records.len();
        tracing::debug!("{}", report.summary());

        Ok((RecordStore { records }, report))
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, deduplicated years present in the store
    pub fn distinct_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn total_sales_for_year(&self, year: i32) -> f64 {
        self.records
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.sales_amount)
            .sum()
    }
}

/// Load a sales CSV from disk
pub fn load_csv(csv_path: &Path, scope: &RegionScope) -> anyhow::Result<(RecordStore, LoadReport)> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    RecordStore::from_reader(file, scope).context("Failed to parse sales CSV")
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Returns Ok(None) when the row is outside the scope.
fn validate_row(row: &RawSalesRow, line: u64, scope: &RegionScope) -> Result<Option<TransactionRecord>> {
    let country = required(&row.country, line, "COUNTRY")?;

    let region = match scope {
        RegionScope::State { country: wanted } => {
            if country != wanted.as_str() {
                return Ok(None);
            }
            required(&row.state, line, "STATE")?
        }
        RegionScope::Country => country,
    };

    let order_date = required(&row.order_date, line, "ORDERDATE")?;
    let year = parse_order_year(order_date)
        .ok_or_else(|| DashboardError::data_format(line, "ORDERDATE", format!("unparseable date: {}", order_date)))?;

    let product_line = required(&row.product_line, line, "PRODUCTLINE")?;
    let sales = parse_sales_amount(required(&row.sales, line, "SALES")?, line)?;

    Ok(Some(TransactionRecord::new(region, year, product_line, sales)))
}

fn required<'a>(value: &'a Option<String>, line: u64, field: &'static str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DashboardError::data_format(line, field, "missing value")),
    }
}

fn parse_sales_amount(value: &str, line: u64) -> Result<f64> {
    let amount: f64 = value
        .parse()
        .map_err(|_| DashboardError::data_format(line, "SALES", format!("not a number: {}", value)))?;

    if !amount.is_finite() {
        return Err(DashboardError::data_format(line, "SALES", format!("not finite: {}", value)));
    }
    if amount < 0.0 {
        return Err(DashboardError::data_format(line, "SALES", format!("negative amount: {}", value)));
    }

    Ok(amount)
}

const DATETIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Extract the calendar year from an order date
pub fn parse_order_year(value: &str) -> Option<i32> {
    let value = value.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.year());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d.year());
        }
    }

    None
}

/// Sales exports are ISO-8859-1; UTF-8 input is accepted as-is.
fn decode_record(raw: &ByteRecord) -> StringRecord {
    raw.iter().map(decode_field).collect::<Vec<String>>().into()
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ORDERNUMBER,SALES,ORDERDATE,PRODUCTLINE,COUNTRY,STATE
10107,2871.00,2/24/2003 0:00,Motorcycles,USA,NY
10121,2765.90,5/7/2003 0:00,Motorcycles,France,
10134,3884.34,7/1/2004 0:00,Classic Cars,USA,CA
10145,3746.70,8/25/2004 0:00,Classic Cars,USA,CA
10159,abc,10/10/2004 0:00,Ships,USA,CA
10168,1000.00,not-a-date,Ships,USA,CA
10180,500.00,11/11/2004 0:00,Ships,USA,
";

    fn usa() -> RegionScope {
        RegionScope::default()
    }

    #[test]
    fn test_parse_order_year_formats() {
        assert_eq!(parse_order_year("2/24/2003 0:00"), Some(2003));
        assert_eq!(parse_order_year("12/01/2005"), Some(2005));
        assert_eq!(parse_order_year("2004-07-01"), Some(2004));
        assert_eq!(parse_order_year("2004-07-01 13:45:00"), Some(2004));
        assert_eq!(parse_order_year("yesterday"), None);
    }

    #[test]
    fn test_state_scope_filters_country_before_validation() {
        let (store, report) = RecordStore::from_reader(SAMPLE.as_bytes(), &usa()).unwrap();

        assert_eq!(report.rows_read, 7);
        assert_eq!(report.filtered_out, 1); // France
        assert_eq!(report.loaded, 3);
        assert_eq!(report.rejected.len(), 3);
        assert_eq!(store.len(), 3);
        assert!(store.records().iter().all(|r| r.region == "NY" || r.region == "CA"));
    }

    #[test]
    fn test_rejected_rows_name_the_field() {
        let (_, report) = RecordStore::from_reader(SAMPLE.as_bytes(), &usa()).unwrap();

        let fields: Vec<&str> = report
            .rejected
            .iter()
            .map(|e| match e {
                DashboardError::DataFormat { field, .. } => *field,
                _ => "other",
            })
            .collect();

        assert_eq!(fields, vec!["SALES", "ORDERDATE", "STATE"]);
    }

    #[test]
    fn test_country_scope_uses_country_as_region() {
        let (store, report) = RecordStore::from_reader(SAMPLE.as_bytes(), &RegionScope::Country).unwrap();

        assert_eq!(report.filtered_out, 0);
        // Missing STATE is fine at country level
        assert_eq!(store.len(), 5);
        assert!(store.records().iter().any(|r| r.region == "France"));
        assert!(store.records().iter().all(|r| r.region == "USA" || r.region == "France"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let csv = "SALES,ORDERDATE,PRODUCTLINE,COUNTRY,STATE\n-5,1/1/2003,Ships,USA,CA\n";
        let (store, report) = RecordStore::from_reader(csv.as_bytes(), &usa()).unwrap();

        assert!(store.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].to_string().contains("negative"));
    }

    #[test]
    fn test_missing_column_is_data_format_error() {
        let csv = "SALES,ORDERDATE,COUNTRY,STATE\n10,1/1/2003,USA,CA\n";
        let (store, report) = RecordStore::from_reader(csv.as_bytes(), &usa()).unwrap();

        assert!(store.is_empty());
        assert!(matches!(
            report.rejected[0],
            DashboardError::DataFormat { field: "PRODUCTLINE", .. }
        ));
    }

    #[test]
    fn test_latin1_bytes_decoded() {
        let mut csv = b"SALES,ORDERDATE,PRODUCTLINE,COUNTRY,STATE\n10,1/1/2003,Ships,".to_vec();
        csv.extend_from_slice(&[0x4E, 0x6F, 0x72, 0x77, 0x61, 0x79, 0xF8]); // "Norway" + o-slash
        csv.extend_from_slice(b",\n");

        let (store, _) = RecordStore::from_reader(&csv[..], &RegionScope::Country).unwrap();

        assert_eq!(store.records()[0].region, "Norway\u{f8}");
    }

    #[test]
    fn test_distinct_years_and_year_totals() {
        let (store, _) = RecordStore::from_reader(SAMPLE.as_bytes(), &usa()).unwrap();

        assert_eq!(store.distinct_years(), vec![2003, 2004]);
        assert!((store.total_sales_for_year(2004) - 7631.04).abs() < 1e-9);
        assert_eq!(store.total_sales_for_year(1999), 0.0);
    }

    #[test]
    fn test_report_summary() {
        let (_, report) = RecordStore::from_reader(SAMPLE.as_bytes(), &usa()).unwrap();
        assert_eq!(report.summary(), "Read 7 rows: 3 loaded, 1 outside scope, 3 rejected");
    }
}
