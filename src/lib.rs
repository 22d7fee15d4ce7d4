// Sales Cross-Filter Dashboard - Core Library
// Exposes all modules for use in the TUI, the API server, and tests

pub mod error;
pub mod records;      // Record Store - CSV loading and country scope
pub mod aggregate;    // Aggregator - grouped sums and shares
pub mod selection;    // Selection State - year domain and controls
pub mod views;        // Map and pie datasets
pub mod controller;   // Cross-Filter Controller
pub mod dashboard;    // Shared immutable dataset
pub mod session;      // One controller per viewer
pub mod settings;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{DashboardError, Result};
pub use records::{
    TransactionRecord, RecordStore, RegionScope, LoadReport,
    load_csv, parse_order_year,
};
pub use aggregate::{
    AggregateRow, AggregateTable, aggregate,
};
pub use selection::{
    SelectionState, ControlValues, YearControl, YearDomain,
    DropdownOption, SliderConfig,
};
pub use views::{
    MapDataset, PieDataset, PieSlice, RegionTotal,
};
pub use controller::{
    CrossFilterController, InputEvent, Transition,
};
pub use dashboard::{
    Dashboard, DashboardOptions,
};
pub use session::{
    SessionRegistry, SharedController,
};
pub use settings::{
    Settings, init_logging,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
