// Dashboard - the shared, immutable dataset
//
// Built once at startup from the Record Store and shared by every viewer
// session behind an Arc. Holds the aggregate table and the year domain.

use crate::aggregate::AggregateTable;
use crate::controller::CrossFilterController;
use crate::error::{DashboardError, Result};
use crate::records::{RecordStore, RegionScope};
use crate::selection::YearDomain;
use crate::views::{self, MapDataset, PieDataset, PieSlice, RegionTotal};
use std::sync::Arc;

/// Startup choices for a dashboard
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub scope: RegionScope,
    /// Must be one of the dataset years when set
    pub default_year: Option<i32>,
    /// Overrides the scope's fallback region for the pie chart
    pub fallback_region: Option<String>,
}

#[derive(Debug)]
pub struct Dashboard {
    scope: RegionScope,
    table: AggregateTable,
    domain: YearDomain,
    default_year: i32,
    fallback_region: String,
}

impl Dashboard {
    /// Aggregate eagerly and validate the default year.
    pub fn build(store: &RecordStore, options: &DashboardOptions) -> Result<Self> {
        if store.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }

        let table = AggregateTable::try_from_records(store.records())?;
        let domain = YearDomain::new(store.distinct_years())?;
        let default_year = domain.resolve_default(options.default_year)?;
        let fallback_region = options
            .fallback_region
            .clone()
            .unwrap_or_else(|| options.scope.default_fallback_region().to_string());

        tracing::info!(
            records = store.len(),
            aggregate_rows = table.len(),
            default_year,
            fallback_region = %fallback_region,
            "dashboard built"
        );

        Ok(Dashboard {
            scope: options.scope.clone(),
            table,
            domain,
            default_year,
            fallback_region,
        })
    }

    /// A fresh viewer state, sharing this dataset
    pub fn new_session(self: &Arc<Self>) -> CrossFilterController {
        CrossFilterController::new(Arc::clone(self))
    }

    pub fn scope(&self) -> &RegionScope {
        &self.scope
    }

    pub fn table(&self) -> &AggregateTable {
        &self.table
    }

    pub fn domain(&self) -> &YearDomain {
        &self.domain
    }

    pub fn default_year(&self) -> i32 {
        self.default_year
    }

    pub fn fallback_region(&self) -> &str {
        &self.fallback_region
    }

    pub fn title(&self) -> &str {
        self.scope.dashboard_title()
    }

    /// Region -> total sales for one year. Independent of any selected region.
    pub fn derive_map_dataset(&self, year: i32) -> MapDataset {
        let regions = self
            .table
            .region_totals(year)
            .into_iter()
            .map(|(region, total_sales)| RegionTotal { region, total_sales })
            .collect();

        MapDataset {
            year,
            title: views::map_title(self.scope.region_label(), year),
            location_mode: self.scope.location_mode().to_string(),
            geo_scope: self.scope.geo_scope().to_string(),
            color_scale: views::COLOR_SCALE.to_string(),
            value_label: views::MAP_VALUE_LABEL.to_string(),
            regions,
        }
    }

    /// Product-line shares of one exact (region, year). Empty when absent.
    pub fn derive_pie_dataset(&self, region: &str, year: i32) -> PieDataset {
        let slices = self
            .table
            .slice(region, year)
            .map(|row| PieSlice {
                product_line: row.product_line.clone(),
                percentage: row.percentage_of_region_year,
            })
            .collect();

        PieDataset {
            region: region.to_string(),
            year,
            title: views::pie_title(region, year),
            value_label: views::PIE_VALUE_LABEL.to_string(),
            fallback_region: false,
            slices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TransactionRecord;

    fn store() -> RecordStore {
        RecordStore::from_records(vec![
            TransactionRecord::new("CA", 2003, "Classic Cars", 1000.0),
            TransactionRecord::new("CA", 2003, "Vintage Cars", 500.0),
            TransactionRecord::new("NY", 2003, "Classic Cars", 300.0),
            TransactionRecord::new("NY", 2004, "Ships", 50.0),
        ])
    }

    #[test]
    fn test_build_defaults_to_min_year_and_scope_fallback() {
        let dashboard = Dashboard::build(&store(), &DashboardOptions::default()).unwrap();

        assert_eq!(dashboard.default_year(), 2003);
        assert_eq!(dashboard.fallback_region(), "CA");
        assert_eq!(dashboard.domain().years(), &[2003, 2004]);
        assert_eq!(dashboard.title(), "US Sales Data Heatmap");
    }

    #[test]
    fn test_build_rejects_invalid_default_year() {
        let options = DashboardOptions {
            default_year: Some(1990),
            ..Default::default()
        };

        let err = Dashboard::build(&store(), &options).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDefault { year: 1990, .. }));
    }

    #[test]
    fn test_build_rejects_empty_store() {
        let err = Dashboard::build(&RecordStore::default(), &DashboardOptions::default()).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyDataset));
    }

    #[test]
    fn test_country_scope_fallback_and_override() {
        let options = DashboardOptions {
            scope: RegionScope::Country,
            ..Default::default()
        };
        let dashboard = Dashboard::build(&store(), &options).unwrap();
        assert_eq!(dashboard.fallback_region(), "USA");

        let options = DashboardOptions {
            fallback_region: Some("NY".to_string()),
            ..Default::default()
        };
        let dashboard = Dashboard::build(&store(), &options).unwrap();
        assert_eq!(dashboard.fallback_region(), "NY");
    }

    #[test]
    fn test_derive_map_dataset() {
        let dashboard = Dashboard::build(&store(), &DashboardOptions::default()).unwrap();
        let map = dashboard.derive_map_dataset(2003);

        assert_eq!(map.regions.len(), 2);
        assert_eq!(map.total_for("CA"), Some(1500.0));
        assert_eq!(map.total_for("NY"), Some(300.0));
        assert_eq!(map.title, "Total Sales by State for 2003");
        assert_eq!(map.location_mode, "USA-states");
    }

    #[test]
    fn test_derive_pie_dataset() {
        let dashboard = Dashboard::build(&store(), &DashboardOptions::default()).unwrap();
        let pie = dashboard.derive_pie_dataset("CA", 2003);

        assert_eq!(pie.slices.len(), 2);
        assert!((pie.percentage_for("Classic Cars").unwrap() - 66.67).abs() < 0.01);
        assert!((pie.percentage_for("Vintage Cars").unwrap() - 33.33).abs() < 0.01);
    }

    #[test]
    fn test_absent_slice_is_empty_not_error() {
        let dashboard = Dashboard::build(&store(), &DashboardOptions::default()).unwrap();

        let pie = dashboard.derive_pie_dataset("ZZ", 1776);
        assert!(pie.is_empty());

        let map = dashboard.derive_map_dataset(1776);
        assert!(map.regions.is_empty());
    }
}
