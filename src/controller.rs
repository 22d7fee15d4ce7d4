// 🔀 Cross-Filter Controller
//
// Reconciles the dropdown, the slider and the map into one SelectionState
// and derives the map and pie datasets from it.
//
// Every input carries its provenance (which control fired). A year change is
// propagated from the originating control to every other year control; a map
// click only touches the region.

use crate::dashboard::Dashboard;
use crate::error::{DashboardError, Result};
use crate::selection::{ControlValues, SelectionState, YearControl};
use crate::views::{MapDataset, PieDataset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One inbound UI event, tagged with the control that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value")]
pub enum InputEvent {
    #[serde(rename = "year_dropdown")]
    YearFromDropdown(i32),
    #[serde(rename = "year_slider")]
    YearFromSlider(i32),
    #[serde(rename = "map_click")]
    RegionFromMapClick(String),
}

impl InputEvent {
    fn year_trigger(&self) -> Option<(YearControl, i32)> {
        match self {
            InputEvent::YearFromDropdown(year) => Some((YearControl::Dropdown, *year)),
            InputEvent::YearFromSlider(year) => Some((YearControl::Slider, *year)),
            InputEvent::RegionFromMapClick(_) => None,
        }
    }
}

/// Result of one dispatch cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: SelectionState,
    pub controls: ControlValues,
    /// Control the year was propagated from, if a year change happened
    pub origin: Option<YearControl>,
    pub map_changed: bool,
    pub pie_changed: bool,
}

pub struct CrossFilterController {
    dashboard: Arc<Dashboard>,
    state: SelectionState,
    controls: ControlValues,
}

impl CrossFilterController {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        let year = dashboard.default_year();
        CrossFilterController {
            dashboard,
            state: SelectionState::new(year),
            controls: ControlValues::converged(year),
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn controls(&self) -> ControlValues {
        self.controls
    }

    /// Apply a single event
    pub fn apply(&mut self, event: InputEvent) -> Result<Transition> {
        self.dispatch(std::slice::from_ref(&event))
    }

    /// Apply every trigger reported by one dispatch cycle.
    ///
    /// - no trigger: nothing changes (initial render)
    /// - year triggers from a single control: propagate from that control
    /// - year triggers from both controls that disagree: year is left alone
    /// - map clicks: last one wins, year untouched
    ///
    /// Years are validated before anything is mutated, so an error leaves the
    /// state exactly as it was.
    pub fn dispatch(&mut self, triggered: &[InputEvent]) -> Result<Transition> {
        let year_triggers: Vec<(YearControl, i32)> =
            triggered.iter().filter_map(InputEvent::year_trigger).collect();

        for &(_, year) in &year_triggers {
            if !self.dashboard.domain().contains(year) {
                return Err(DashboardError::UnknownYear(year));
            }
        }

        let click = triggered.iter().rev().find_map(|event| match event {
            InputEvent::RegionFromMapClick(region) => Some(region.clone()),
            _ => None,
        });

        let mut transition = Transition {
            state: self.state.clone(),
            controls: self.controls,
            origin: None,
            map_changed: false,
            pie_changed: false,
        };

        if let Some((origin, year)) = resolve_year(&year_triggers) {
            let year_changed = year != self.state.year;
            self.state.year = year;
            self.controls = ControlValues::converged(year);

            tracing::debug!(control = origin.map(|c| c.id()), year, "year propagated");

            transition.origin = origin;
            transition.map_changed = year_changed;
            transition.pie_changed = year_changed;
        } else if !year_triggers.is_empty() {
            tracing::debug!(?year_triggers, "conflicting year controls in one cycle, ignoring");
        }

        if let Some(region) = click {
            if self.state.region.as_deref() != Some(region.as_str()) {
                transition.pie_changed = true;
            }
            tracing::debug!(region = %region, "map click");
            self.state.region = Some(region);
        }

        transition.state = self.state.clone();
        transition.controls = self.controls;
        Ok(transition)
    }

    /// Region actually shown in the pie: the clicked one, or the fallback
    pub fn effective_region(&self) -> &str {
        self.state
            .region
            .as_deref()
            .unwrap_or_else(|| self.dashboard.fallback_region())
    }

    pub fn derive_map_dataset(&self, year: i32) -> MapDataset {
        self.dashboard.derive_map_dataset(year)
    }

    pub fn derive_pie_dataset(&self, region: &str, year: i32) -> PieDataset {
        self.dashboard.derive_pie_dataset(region, year)
    }

    pub fn current_map(&self) -> MapDataset {
        self.derive_map_dataset(self.state.year)
    }

    pub fn current_pie(&self) -> PieDataset {
        let mut pie = self.derive_pie_dataset(self.effective_region(), self.state.year);
        pie.fallback_region = self.state.region.is_none();
        pie
    }
}

/// Pick the single year to propagate and the control it came from.
///
/// Provenance decides, never the value: several triggers from the same control
/// resolve to its latest value. When both controls fired, the only safe outcome
/// is when they already agree (origin unknown); otherwise None.
fn resolve_year(triggers: &[(YearControl, i32)]) -> Option<(Option<YearControl>, i32)> {
    let (first_control, _) = *triggers.first()?;
    let (_, last_year) = *triggers.last()?;

    if triggers.iter().all(|(control, _)| *control == first_control) {
        return Some((Some(first_control), last_year));
    }

    if triggers.iter().all(|(_, year)| *year == last_year) {
        return Some((None, last_year));
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardOptions;
    use crate::records::{RecordStore, TransactionRecord};

    fn dashboard() -> Arc<Dashboard> {
        let store = RecordStore::from_records(vec![
            TransactionRecord::new("CA", 2003, "Classic Cars", 1000.0),
            TransactionRecord::new("CA", 2003, "Vintage Cars", 500.0),
            TransactionRecord::new("NY", 2003, "Classic Cars", 300.0),
            TransactionRecord::new("NY", 2004, "Ships", 80.0),
            TransactionRecord::new("TX", 2005, "Planes", 40.0),
        ]);
        Arc::new(Dashboard::build(&store, &DashboardOptions::default()).unwrap())
    }

    #[test]
    fn test_initial_state() {
        let controller = dashboard().new_session();

        assert_eq!(controller.state().year, 2003);
        assert_eq!(controller.state().region, None);
        assert!(controller.controls().is_converged());
    }

    #[test]
    fn test_empty_dispatch_returns_state_unchanged() {
        let mut controller = dashboard().new_session();
        let before = controller.state().clone();

        let transition = controller.dispatch(&[]).unwrap();

        assert_eq!(transition.state, before);
        assert_eq!(transition.origin, None);
        assert!(!transition.map_changed);
        assert!(!transition.pie_changed);
    }

    #[test]
    fn test_dropdown_propagates_to_slider() {
        let mut controller = dashboard().new_session();

        let t = controller.apply(InputEvent::YearFromDropdown(2004)).unwrap();

        assert_eq!(t.state.year, 2004);
        assert_eq!(t.controls.slider, 2004);
        assert_eq!(t.controls.dropdown, 2004);
        assert_eq!(t.origin, Some(YearControl::Dropdown));
        assert!(t.map_changed);
        assert!(t.pie_changed);
    }

    #[test]
    fn test_slider_propagates_to_dropdown() {
        let mut controller = dashboard().new_session();

        let t = controller.apply(InputEvent::YearFromSlider(2005)).unwrap();

        assert_eq!(t.controls, ControlValues::converged(2005));
        assert_eq!(t.origin, Some(YearControl::Slider));
    }

    #[test]
    fn test_convergence_in_either_order() {
        let d = dashboard();

        let mut a = d.new_session();
        a.apply(InputEvent::YearFromDropdown(2004)).unwrap();
        a.apply(InputEvent::YearFromSlider(2004)).unwrap();

        let mut b = d.new_session();
        b.apply(InputEvent::YearFromSlider(2004)).unwrap();
        b.apply(InputEvent::YearFromDropdown(2004)).unwrap();

        assert_eq!(a.state(), b.state());
        assert_eq!(a.controls(), b.controls());
        assert!(a.controls().is_converged());
    }

    #[test]
    fn test_year_change_keeps_region() {
        let mut controller = dashboard().new_session();
        controller.apply(InputEvent::RegionFromMapClick("NY".to_string())).unwrap();

        controller.apply(InputEvent::YearFromSlider(2004)).unwrap();

        assert_eq!(controller.state().region.as_deref(), Some("NY"));
    }

    #[test]
    fn test_map_click_keeps_year() {
        let mut controller = dashboard().new_session();
        controller.apply(InputEvent::YearFromDropdown(2005)).unwrap();

        let t = controller.apply(InputEvent::RegionFromMapClick("TX".to_string())).unwrap();

        assert_eq!(t.state.year, 2005);
        assert_eq!(t.state.region.as_deref(), Some("TX"));
        assert!(!t.map_changed);
        assert!(t.pie_changed);
    }

    #[test]
    fn test_unknown_year_is_rejected_without_mutation() {
        let mut controller = dashboard().new_session();
        let before = controller.state().clone();

        let err = controller
            .dispatch(&[
                InputEvent::RegionFromMapClick("NY".to_string()),
                InputEvent::YearFromSlider(1999),
            ])
            .unwrap_err();

        assert!(matches!(err, DashboardError::UnknownYear(1999)));
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn test_conflicting_controls_in_one_cycle_is_a_year_noop() {
        let mut controller = dashboard().new_session();

        let t = controller
            .dispatch(&[
                InputEvent::YearFromDropdown(2004),
                InputEvent::YearFromSlider(2005),
                InputEvent::RegionFromMapClick("NY".to_string()),
            ])
            .unwrap();

        assert_eq!(t.state.year, 2003);
        assert_eq!(t.controls, ControlValues::converged(2003));
        assert_eq!(t.origin, None);
        // the click is independent of the year conflict
        assert_eq!(t.state.region.as_deref(), Some("NY"));
    }

    #[test]
    fn test_agreeing_controls_in_one_cycle_apply() {
        let mut controller = dashboard().new_session();

        let t = controller
            .dispatch(&[InputEvent::YearFromDropdown(2005), InputEvent::YearFromSlider(2005)])
            .unwrap();

        assert_eq!(t.state.year, 2005);
        assert_eq!(t.origin, None);
        assert!(t.controls.is_converged());
    }

    #[test]
    fn test_repeated_triggers_from_one_control_use_latest() {
        let mut controller = dashboard().new_session();

        let t = controller
            .dispatch(&[InputEvent::YearFromSlider(2004), InputEvent::YearFromSlider(2005)])
            .unwrap();

        assert_eq!(t.state.year, 2005);
        assert_eq!(t.origin, Some(YearControl::Slider));
    }

    #[test]
    fn test_pie_uses_fallback_until_first_click() {
        let mut controller = dashboard().new_session();

        let pie = controller.current_pie();
        assert_eq!(pie.region, "CA");
        assert!(pie.fallback_region);
        assert_eq!(controller.state().region, None);

        controller.apply(InputEvent::RegionFromMapClick("NY".to_string())).unwrap();
        let pie = controller.current_pie();
        assert_eq!(pie.region, "NY");
        assert!(!pie.fallback_region);
        assert_eq!(pie.percentage_for("Classic Cars"), Some(100.0));
    }

    #[test]
    fn test_map_ignores_selected_region() {
        let mut controller = dashboard().new_session();
        let before = controller.current_map();

        controller.apply(InputEvent::RegionFromMapClick("NY".to_string())).unwrap();

        assert_eq!(controller.current_map(), before);
        assert_eq!(before.total_for("CA"), Some(1500.0));
        assert_eq!(before.total_for("NY"), Some(300.0));
    }

    #[test]
    fn test_click_on_region_without_sales_gives_empty_pie() {
        let mut controller = dashboard().new_session();
        controller.apply(InputEvent::RegionFromMapClick("ZZ".to_string())).unwrap();

        assert!(controller.current_pie().is_empty());
        assert!(controller.derive_pie_dataset("ZZ", 1776).is_empty());
    }

    #[test]
    fn test_input_event_wire_format() {
        let event: InputEvent = serde_json::from_str(r#"{"source":"year_slider","value":2004}"#).unwrap();
        assert_eq!(event, InputEvent::YearFromSlider(2004));

        let json = serde_json::to_string(&InputEvent::RegionFromMapClick("CA".to_string())).unwrap();
        assert_eq!(json, r#"{"source":"map_click","value":"CA"}"#);
    }
}
