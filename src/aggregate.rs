// 📊 Aggregator - grouped sums and product-line shares
//
// (region, year, product_line) -> total_sales
// (region, year)               -> share of each product line, in percent
//
// Computed once at load; the table is read-only afterwards.

use crate::error::{DashboardError, Result};
use crate::records::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub region: String,
    pub year: i32,
    pub product_line: String,
    pub total_sales: f64,
    /// 0.0 when the (region, year) group has no sales at all
    pub percentage_of_region_year: f64,
}

/// Immutable aggregate table, ordered by (region, year, product_line)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    rows: Vec<AggregateRow>,
}

/// Group and sum a record set. Order of the input does not matter.
pub fn aggregate(records: &[TransactionRecord]) -> AggregateTable {
    let mut sums: BTreeMap<(&str, i32, &str), f64> = BTreeMap::new();
    for r in records {
        *sums
            .entry((r.region.as_str(), r.year, r.product_line.as_str()))
            .or_insert(0.0) += r.sales_amount;
    }

    let mut group_totals: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    for (&(region, year, _), total) in &sums {
        *group_totals.entry((region, year)).or_insert(0.0) += total;
    }

    let rows = sums
        .into_iter()
        .map(|((region, year, product_line), total_sales)| {
            let group_total = group_totals.get(&(region, year)).copied().unwrap_or(0.0);
            let percentage_of_region_year = if group_total > 0.0 {
                total_sales / group_total * 100.0
            } else {
                0.0
            };

            AggregateRow {
                region: region.to_string(),
                year,
                product_line: product_line.to_string(),
                total_sales,
                percentage_of_region_year,
            }
        })
        .collect();

    AggregateTable { rows }
}

impl AggregateTable {
    /// Aggregate records that did not come through the CSV loader.
    ///
    /// Refuses any amount that would poison a sum (NaN, infinite, negative).
    pub fn try_from_records(records: &[TransactionRecord]) -> Result<Self> {
        for (i, r) in records.iter().enumerate() {
            if !r.sales_amount.is_finite() || r.sales_amount < 0.0 {
                return Err(DashboardError::data_format(
                    i as u64 + 1,
                    "SALES",
                    format!("unusable amount {} for {}/{}", r.sales_amount, r.region, r.year),
                ));
            }
        }

        Ok(aggregate(records))
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one exact (region, year) slice
    pub fn slice<'a>(&'a self, region: &'a str, year: i32) -> impl Iterator<Item = &'a AggregateRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.year == year && row.region == region)
    }

    /// Total sales per region for one year, summed over product lines
    pub fn region_totals(&self, year: i32) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for row in self.rows.iter().filter(|row| row.year == year) {
            *totals.entry(row.region.clone()).or_insert(0.0) += row.total_sales;
        }
        totals
    }

    pub fn year_total(&self, year: i32) -> f64 {
        self.rows
            .iter()
            .filter(|row| row.year == year)
            .map(|row| row.total_sales)
            .sum()
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|row| row.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.rows.iter().map(|row| row.region.as_str()).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    pub fn product_lines(&self) -> Vec<&str> {
        let mut lines: Vec<&str> = self.rows.iter().map(|row| row.product_line.as_str()).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

// ============================================================================
// TESTS
// ============================================================================
