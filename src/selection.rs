// Selection State - one (year, region) per viewer
//
// The dropdown and the slider are two views onto the same year; the map
// click sets the region. Only the cross-filter controller mutates this.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

/// Which year-bearing control fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearControl {
    Dropdown,
    Slider,
}

impl YearControl {
    pub fn id(&self) -> &'static str {
        match self {
            YearControl::Dropdown => "year-dropdown",
            YearControl::Slider => "year-slider",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub year: i32,
    /// None until the first map click
    pub region: Option<String>,
}

impl SelectionState {
    pub fn new(year: i32) -> Self {
        SelectionState { year, region: None }
    }
}

/// Values currently displayed by the two year controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlValues {
    pub dropdown: i32,
    pub slider: i32,
}

impl ControlValues {
    pub fn converged(year: i32) -> Self {
        ControlValues {
            dropdown: year,
            slider: year,
        }
    }

    pub fn get(&self, control: YearControl) -> i32 {
        match control {
            YearControl::Dropdown => self.dropdown,
            YearControl::Slider => self.slider,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.dropdown == self.slider
    }
}

// ============================================================================
// YEAR DOMAIN
// ============================================================================

/// The distinct years of the dataset, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearDomain {
    years: Vec<i32>,
}

impl YearDomain {
    pub fn new(mut years: Vec<i32>) -> Result<Self> {
        years.sort_unstable();
        years.dedup();
        if years.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }
        Ok(YearDomain { years })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    pub fn min(&self) -> i32 {
        self.years[0]
    }

    pub fn max(&self) -> i32 {
        self.years[self.years.len() - 1]
    }

    /// Default year: the override when it is one of the years, else the minimum.
    /// An override outside the domain is fatal.
    pub fn resolve_default(&self, requested: Option<i32>) -> Result<i32> {
        match requested {
            None => Ok(self.min()),
            Some(year) if self.contains(year) => Ok(year),
            Some(year) => Err(DashboardError::InvalidDefault {
                year,
                available: self.years.clone(),
            }),
        }
    }

    /// Next year in the domain, saturating at the last one
    pub fn step(&self, from: i32, forward: bool) -> i32 {
        let idx = match self.years.binary_search(&from) {
            Ok(i) => i,
            Err(i) => i.min(self.years.len() - 1),
        };
        let next = if forward {
            (idx + 1).min(self.years.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.years[next]
    }

    pub fn dropdown_options(&self) -> Vec<DropdownOption> {
        self.years
            .iter()
            .map(|&year| DropdownOption {
                label: year.to_string(),
                value: year,
            })
            .collect()
    }

    /// Slider restricted to one stop per dataset year
    pub fn slider_config(&self) -> SliderConfig {
        SliderConfig {
            min: self.min(),
            max: self.max(),
            marks: self.years.clone(),
            snap_to_marks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderConfig {
    pub min: i32,
    pub max: i32,
    pub marks: Vec<i32>,
    pub snap_to_marks: bool,
}
