// View datasets handed to render adapters (terminal UI, JSON API)

use serde::{Deserialize, Serialize};

pub const COLOR_SCALE: &str = "Viridis";
pub const MAP_VALUE_LABEL: &str = "Total Sales ($)";
pub const PIE_VALUE_LABEL: &str = "Percentage of Sales";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub total_sales: f64,
}

/// Choropleth payload: total sales per region for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDataset {
    pub year: i32,
    pub title: String,
    pub location_mode: String,
    pub geo_scope: String,
    pub color_scale: String,
    pub value_label: String,
    pub regions: Vec<RegionTotal>,
}

impl MapDataset {
    pub fn total_for(&self, region: &str) -> Option<f64> {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .map(|r| r.total_sales)
    }

    pub fn grand_total(&self) -> f64 {
        self.regions.iter().map(|r| r.total_sales).sum()
    }

    /// Regions ordered by descending sales
    pub fn ranked(&self) -> Vec<&RegionTotal> {
        let mut ranked: Vec<&RegionTotal> = self.regions.iter().collect();
        ranked.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub product_line: String,
    pub percentage: f64,
}

/// Product-line breakdown for one (region, year).
///
/// An empty `slices` list is a valid result: the region has no sales that year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieDataset {
    pub region: String,
    pub year: i32,
    pub title: String,
    pub value_label: String,
    /// True when no map click happened yet and the fallback region is shown
    pub fallback_region: bool,
    pub slices: Vec<PieSlice>,
}

impl PieDataset {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn percentage_for(&self, product_line: &str) -> Option<f64> {
        self.slices
            .iter()
            .find(|s| s.product_line == product_line)
            .map(|s| s.percentage)
    }
}

pub fn map_title(region_label: &str, year: i32) -> String {
    format!("Total Sales by {} for {}", region_label, year)
}

pub fn pie_title(region: &str, year: i32) -> String {
    format!("Percentage of Each Product Line Sold in {} ({})", region, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(map_title("State", 2003), "Total Sales by State for 2003");
        assert_eq!(
            pie_title("CA", 2004),
            "Percentage of Each Product Line Sold in CA (2004)"
        );
    }

    #[test]
    fn test_map_ranked_and_totals() {
        let map = MapDataset {
            year: 2003,
            title: map_title("State", 2003),
            location_mode: "USA-states".to_string(),
            geo_scope: "usa".to_string(),
            color_scale: COLOR_SCALE.to_string(),
            value_label: MAP_VALUE_LABEL.to_string(),
            regions: vec![
                RegionTotal { region: "NY".to_string(), total_sales: 300.0 },
                RegionTotal { region: "CA".to_string(), total_sales: 1500.0 },
            ],
        };

        assert_eq!(map.ranked()[0].region, "CA");
        assert_eq!(map.grand_total(), 1800.0);
        assert_eq!(map.total_for("NY"), Some(300.0));
        assert_eq!(map.total_for("ZZ"), None);
    }
}
