//! The immutable filter selection a navigation request is built from.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::search_const::DEFAULT_PAGE_SIZE;
use crate::search_result::FacetOriginalValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraSelection {
    pub make: String,
    pub model: String,
}

impl CameraSelection {
    pub fn new(make: impl Into<String>, model: impl Into<String>) -> Self {
        Self { make: make.into(), model: model.into() }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

/// Active selection across every dimension plus pagination.
///
/// Values are never mutated in place: every `with_*` / `without_*` method
/// returns a new state, so many candidate states can be derived from one
/// request without aliasing. Any change to the selection resets the offset
/// to the first page; the page size is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    camera: Option<CameraSelection>,
    lens_model: BTreeSet<String>,
    colour_name: BTreeSet<String>,
    time_of_day: BTreeSet<String>,
    season: BTreeSet<String>,
    focal_category: BTreeSet<String>,
    shooting_condition: BTreeSet<String>,
    in_burst: Option<bool>,
    limit: u64,
    offset: u64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            year: None,
            month: None,
            day: None,
            camera: None,
            lens_model: BTreeSet::new(),
            colour_name: BTreeSet::new(),
            time_of_day: BTreeSet::new(),
            season: BTreeSet::new(),
            focal_category: BTreeSet::new(),
            shooting_condition: BTreeSet::new(),
            in_burst: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
    pub fn month(&self) -> Option<u32> {
        self.month
    }
    pub fn day(&self) -> Option<u32> {
        self.day
    }
    pub fn camera(&self) -> Option<&CameraSelection> {
        self.camera.as_ref()
    }
    pub fn lens_model(&self) -> &BTreeSet<String> {
        &self.lens_model
    }
    pub fn colour_name(&self) -> &BTreeSet<String> {
        &self.colour_name
    }
    pub fn time_of_day(&self) -> &BTreeSet<String> {
        &self.time_of_day
    }
    pub fn season(&self) -> &BTreeSet<String> {
        &self.season
    }
    pub fn focal_category(&self) -> &BTreeSet<String> {
        &self.focal_category
    }
    pub fn shooting_condition(&self) -> &BTreeSet<String> {
        &self.shooting_condition
    }
    pub fn in_burst(&self) -> Option<bool> {
        self.in_burst
    }
    pub fn limit(&self) -> u64 {
        self.limit
    }
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 1-based page number derived from offset and limit.
    pub fn page_number(&self) -> u64 {
        self.offset / self.limit.max(1) + 1
    }

    pub fn with_year(&self, year: i32) -> Self {
        self.refine(|next| next.year = Some(year))
    }
    pub fn with_month(&self, month: u32) -> Self {
        self.refine(|next| next.month = Some(month))
    }
    pub fn with_day(&self, day: u32) -> Self {
        self.refine(|next| next.day = Some(day))
    }
    pub fn with_camera(&self, make: impl Into<String>, model: impl Into<String>) -> Self {
        let camera = CameraSelection::new(make, model);
        self.refine(|next| next.camera = Some(camera))
    }
    pub fn with_lens(&self, lens: impl Into<String>) -> Self {
        self.with_text(Dimension::Lens, lens.into())
    }
    pub fn with_colour(&self, colour: impl Into<String>) -> Self {
        self.with_text(Dimension::Colour, colour.into())
    }
    pub fn with_time_of_day(&self, time_of_day: impl Into<String>) -> Self {
        self.with_text(Dimension::TimeOfDay, time_of_day.into())
    }
    pub fn with_season(&self, season: impl Into<String>) -> Self {
        self.with_text(Dimension::Season, season.into())
    }
    pub fn with_focal_category(&self, category: impl Into<String>) -> Self {
        self.with_text(Dimension::FocalCategory, category.into())
    }
    pub fn with_shooting_condition(&self, condition: impl Into<String>) -> Self {
        self.with_text(Dimension::ShootingCondition, condition.into())
    }
    pub fn with_in_burst(&self, in_burst: bool) -> Self {
        self.refine(|next| next.in_burst = Some(in_burst))
    }

    pub fn with_limit(&self, limit: u64) -> Self {
        self.derive(|next| next.limit = limit.max(1))
    }

    pub fn with_offset(&self, offset: u64) -> Self {
        self.derive(|next| next.offset = offset)
    }

    /// Moves to the 1-based `page`, keeping the page size.
    pub fn with_page(&self, page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(self.limit);
        self.with_offset(offset)
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| !self.has_dimension(*d))
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Year => self.year.is_some(),
            Dimension::Month => self.month.is_some(),
            Dimension::Day => self.day.is_some(),
            Dimension::Camera => self.camera.is_some(),
            Dimension::InBurst => self.in_burst.is_some(),
            _ => self.text_values(dimension).is_some_and(|set| !set.is_empty()),
        }
    }

    /// Dimensions with an active constraint, in descriptor order.
    pub fn active_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL.into_iter().filter(|d| self.has_dimension(*d)).collect()
    }

    /// Number of active values; a multi-select dimension counts once per value.
    pub fn active_filter_count(&self) -> usize {
        Dimension::ALL.iter().map(|d| self.selected_values(*d).len()).sum()
    }

    pub fn selected_values(&self, dimension: Dimension) -> Vec<FacetOriginalValue> {
        match dimension {
            Dimension::Year => self.year.map(|y| FacetOriginalValue::Int(y.into())).into_iter().collect(),
            Dimension::Month => self.month.map(|m| FacetOriginalValue::Int(m.into())).into_iter().collect(),
            Dimension::Day => self.day.map(|d| FacetOriginalValue::Int(d.into())).into_iter().collect(),
            Dimension::Camera => self.camera.clone().map(FacetOriginalValue::Camera).into_iter().collect(),
            Dimension::InBurst => self.in_burst.map(FacetOriginalValue::Flag).into_iter().collect(),
            _ => self
                .text_values(dimension)
                .map(|set| set.iter().cloned().map(FacetOriginalValue::String).collect())
                .unwrap_or_default(),
        }
    }

    pub fn is_selected(&self, dimension: Dimension, value: &FacetOriginalValue) -> bool {
        match (dimension, value) {
            (Dimension::Year, FacetOriginalValue::Int(y)) => self.year.is_some_and(|cur| i64::from(cur) == *y),
            (Dimension::Month, FacetOriginalValue::Int(m)) => self.month.is_some_and(|cur| i64::from(cur) == *m),
            (Dimension::Day, FacetOriginalValue::Int(d)) => self.day.is_some_and(|cur| i64::from(cur) == *d),
            (Dimension::Camera, FacetOriginalValue::Camera(c)) => self.camera.as_ref() == Some(c),
            (Dimension::InBurst, FacetOriginalValue::Flag(b)) => self.in_burst == Some(*b),
            (_, FacetOriginalValue::String(s)) => self.text_values(dimension).is_some_and(|set| set.contains(s)),
            _ => false,
        }
    }

    /// Adds `value` to a multi-select dimension, or replaces a scalar one.
    /// A value of the wrong kind for `dimension` leaves the selection as is.
    pub fn with_value(&self, dimension: Dimension, value: &FacetOriginalValue) -> Self {
        self.refine(|next| match (dimension, value) {
            (Dimension::Year, FacetOriginalValue::Int(y)) => {
                if let Ok(y) = i32::try_from(*y) {
                    next.year = Some(y);
                }
            }
            (Dimension::Month, FacetOriginalValue::Int(m)) => {
                if let Ok(m) = u32::try_from(*m) {
                    next.month = Some(m);
                }
            }
            (Dimension::Day, FacetOriginalValue::Int(d)) => {
                if let Ok(d) = u32::try_from(*d) {
                    next.day = Some(d);
                }
            }
            (Dimension::Camera, FacetOriginalValue::Camera(c)) => next.camera = Some(c.clone()),
            (Dimension::InBurst, FacetOriginalValue::Flag(b)) => next.in_burst = Some(*b),
            (_, FacetOriginalValue::String(s)) => {
                if let Some(set) = next.text_values_mut(dimension) {
                    set.insert(s.clone());
                }
            }
            _ => {}
        })
    }

    /// Removes one value. Scalars are cleared only when `value` is the
    /// selected one; other hierarchy levels are never touched.
    pub fn without_value(&self, dimension: Dimension, value: &FacetOriginalValue) -> Self {
        if !self.is_selected(dimension, value) {
            return self.clone();
        }
        match value {
            FacetOriginalValue::String(s) => self.refine(|next| {
                if let Some(set) = next.text_values_mut(dimension) {
                    set.remove(s);
                }
            }),
            _ => self.without_dimension(dimension),
        }
    }

    /// Clears the whole dimension. Removing the year keeps month and day.
    pub fn without_dimension(&self, dimension: Dimension) -> Self {
        self.refine(|next| match dimension {
            Dimension::Year => next.year = None,
            Dimension::Month => next.month = None,
            Dimension::Day => next.day = None,
            Dimension::Camera => next.camera = None,
            Dimension::InBurst => next.in_burst = None,
            _ => {
                if let Some(set) = next.text_values_mut(dimension) {
                    set.clear();
                }
            }
        })
    }

    /// Copies `dimension`'s selection from `other` into a new state.
    pub fn with_dimension_from(&self, other: &FilterState, dimension: Dimension) -> Self {
        other
            .selected_values(dimension)
            .iter()
            .fold(self.clone(), |acc, value| acc.with_value(dimension, value))
    }

    pub fn text_values(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        match dimension {
            Dimension::Lens => Some(&self.lens_model),
            Dimension::Colour => Some(&self.colour_name),
            Dimension::TimeOfDay => Some(&self.time_of_day),
            Dimension::Season => Some(&self.season),
            Dimension::FocalCategory => Some(&self.focal_category),
            Dimension::ShootingCondition => Some(&self.shooting_condition),
            _ => None,
        }
    }

    fn text_values_mut(&mut self, dimension: Dimension) -> Option<&mut BTreeSet<String>> {
        match dimension {
            Dimension::Lens => Some(&mut self.lens_model),
            Dimension::Colour => Some(&mut self.colour_name),
            Dimension::TimeOfDay => Some(&mut self.time_of_day),
            Dimension::Season => Some(&mut self.season),
            Dimension::FocalCategory => Some(&mut self.focal_category),
            Dimension::ShootingCondition => Some(&mut self.shooting_condition),
            _ => None,
        }
    }

    fn with_text(&self, dimension: Dimension, value: String) -> Self {
        self.with_value(dimension, &FacetOriginalValue::String(value))
    }

    fn derive(&self, f: impl FnOnce(&mut FilterState)) -> Self {
        let mut next = self.clone();
        f(&mut next);
        next
    }

    fn refine(&self, f: impl FnOnce(&mut FilterState)) -> Self {
        self.derive(|next| {
            f(next);
            next.offset = 0;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_do_not_mutate_the_source() {
        let base = FilterState::new().with_year(2024);
        let with_colour = base.with_colour("red");
        assert!(base.colour_name().is_empty());
        assert!(with_colour.colour_name().contains("red"));
        assert_eq!(with_colour.year(), Some(2024));
    }

    #[test]
    fn set_fields_compare_as_sets() {
        let a = FilterState::new().with_season("summer").with_season("winter");
        let b = FilterState::new().with_season("winter").with_season("summer");
        assert_eq!(a, b);
    }

    #[test]
    fn removing_year_keeps_month_and_day() {
        let full = FilterState::new().with_year(2024).with_month(3).with_day(15);
        let without_year = full.without_dimension(Dimension::Year);
        assert_eq!(without_year.year(), None);
        assert_eq!(without_year.month(), Some(3));
        assert_eq!(without_year.day(), Some(15));

        let without_month = full.without_value(Dimension::Month, &FacetOriginalValue::Int(3));
        assert_eq!(without_month.year(), Some(2024));
        assert_eq!(without_month.day(), Some(15));
    }

    #[test]
    fn without_value_leaves_unselected_scalars_alone() {
        let state = FilterState::new().with_year(2024);
        assert_eq!(state.without_value(Dimension::Year, &FacetOriginalValue::Int(2023)), state);
    }

    #[test]
    fn multi_select_removes_a_single_value() {
        let state = FilterState::new().with_colour("red").with_colour("blue");
        let next = state.without_value(Dimension::Colour, &FacetOriginalValue::String("red".into()));
        assert_eq!(next.colour_name().iter().collect::<Vec<_>>(), vec!["blue"]);
    }

    #[test]
    fn scalar_with_value_replaces() {
        let state = FilterState::new().with_camera("Canon", "EOS R5");
        let next = state.with_value(
            Dimension::Camera,
            &FacetOriginalValue::Camera(CameraSelection::new("Sony", "A7R V")),
        );
        assert_eq!(next.camera(), Some(&CameraSelection::new("Sony", "A7R V")));
    }

    #[test]
    fn wrong_value_kind_is_ignored() {
        let state = FilterState::new();
        assert_eq!(state.with_value(Dimension::Year, &FacetOriginalValue::String("x".into())), state);
    }

    #[test]
    fn refinement_resets_offset() {
        let state = FilterState::new().with_limit(10).with_page(3);
        assert_eq!(state.offset(), 20);
        assert_eq!(state.page_number(), 3);
        let refined = state.with_season("summer");
        assert_eq!(refined.offset(), 0);
        assert_eq!(refined.limit(), 10);
    }

    #[test]
    fn counts_active_values() {
        let state = FilterState::new()
            .with_year(2024)
            .with_colour("red")
            .with_colour("blue")
            .with_in_burst(false);
        assert_eq!(state.active_filter_count(), 4);
        assert_eq!(
            state.active_dimensions(),
            vec![Dimension::Year, Dimension::Colour, Dimension::InBurst]
        );
        assert!(!state.is_empty());
        assert!(FilterState::new().is_empty());
    }
}
