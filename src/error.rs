// Dashboard errors
//
// - DataFormat: a record is rejected at load time (never coerced to zero)
// - InvalidDefault: configured default year is not in the dataset
// - EmptyDataset: nothing survived loading, no dashboard can be built
// - UnknownYear: a year control asked for a year outside the domain
//
// An empty pie slice is NOT an error, see `controller::PieDataset`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("line {line}: invalid {field}: {reason}")]
    DataFormat {
        line: u64,
        field: &'static str,
        reason: String,
    },

    #[error("default year {year} is not present in the dataset (available: {available:?})")]
    InvalidDefault { year: i32, available: Vec<i32> },

    #[error("no sales records available after loading")]
    EmptyDataset,

    #[error("year {0} is not present in the dataset")]
    UnknownYear(i32),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn data_format(line: u64, field: &'static str, reason: impl Into<String>) -> Self {
        DashboardError::DataFormat {
            line,
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
