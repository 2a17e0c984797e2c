//! Breadcrumb trail, active filter chips and page title for a filter state.

use serde::{Deserialize, Serialize};

use crate::dimension::{Cardinality, Dimension};
use crate::filter_state::FilterState;
use crate::search_const::month_name;
use crate::search_result::FacetOriginalValue;
use crate::url_codec::canonical_url;

pub const ROOT_LABEL: &str = "All photos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

/// One currently applied value with a link that clears just that value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilterChip {
    pub dimension: Dimension,
    pub value: FacetOriginalValue,
    pub label: String,
    pub remove_url: String,
}

/// Drill-down trail from the unfiltered corpus to `state`.
///
/// Each crumb after the root restores one more active dimension, in
/// descriptor order, so following crumb `n` keeps dimensions `1..=n`.
pub fn build_breadcrumbs(state: &FilterState) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb { label: ROOT_LABEL.to_string(), url: "/".to_string() }];
    let mut trail = FilterState::new();
    for dimension in state.active_dimensions() {
        trail = trail.with_dimension_from(state, dimension);
        crumbs.push(Breadcrumb { label: dimension_label(state, dimension), url: canonical_url(&trail) });
    }
    crumbs
}

pub fn active_filter_chips(state: &FilterState) -> Vec<ActiveFilterChip> {
    state
        .active_dimensions()
        .into_iter()
        .flat_map(|dimension| {
            state.selected_values(dimension).into_iter().map(move |value| {
                let remove_url = canonical_url(&state.without_value(dimension, &value));
                ActiveFilterChip { dimension, label: dimension.value_label(&value), value, remove_url }
            })
        })
        .collect()
}

/// `Photos from March 2024`, `Canon EOS R5`, `Blue photos`, or `Photos`.
pub fn page_title(state: &FilterState) -> String {
    if let Some(year) = state.year() {
        return match state.month().and_then(month_name) {
            Some(month) => format!("Photos from {month} {year}"),
            None => format!("Photos from {year}"),
        };
    }
    if let Some(camera) = state.camera() {
        return camera.label();
    }
    for dimension in [Dimension::Colour, Dimension::TimeOfDay] {
        if let Some(first) = state.selected_values(dimension).first() {
            return format!("{} photos", dimension.value_label(first));
        }
    }
    "Photos".to_string()
}

fn dimension_label(state: &FilterState, dimension: Dimension) -> String {
    let values = state.selected_values(dimension);
    match dimension.cardinality() {
        Cardinality::MultiSelect => values
            .iter()
            .map(|v| dimension.value_label(v))
            .collect::<Vec<_>>()
            .join(", "),
        _ => values.first().map(|v| dimension.value_label(v)).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumbs_restore_dimensions_in_order() {
        let state = FilterState::new()
            .with_year(2024)
            .with_month(3)
            .with_camera("Canon", "EOS R5")
            .with_colour("red")
            .with_colour("blue");
        let crumbs = build_breadcrumbs(&state);
        let labels: Vec<_> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec![ROOT_LABEL, "2024", "March", "Canon EOS R5", "Blue, Red"]);
        let urls: Vec<_> = crumbs.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/",
                "/2024",
                "/2024/03",
                "/2024/03/camera/Canon/EOS%20R5",
                "/2024/03/camera/Canon/EOS%20R5?color=blue&color=red",
            ]
        );
        assert_eq!(crumbs.last().map(|c| c.url.clone()), Some(canonical_url(&state)));
    }

    #[test]
    fn empty_state_has_only_the_root_crumb() {
        assert_eq!(build_breadcrumbs(&FilterState::new()).len(), 1);
        assert!(active_filter_chips(&FilterState::new()).is_empty());
    }

    #[test]
    fn chips_remove_exactly_one_value() {
        let state = FilterState::new()
            .with_year(2024)
            .with_month(3)
            .with_day(15)
            .with_season("summer")
            .with_season("winter");
        let chips = active_filter_chips(&state);
        let by_label = |label: &str| chips.iter().find(|c| c.label == label).map(|c| c.remove_url.clone());

        assert_eq!(chips.len(), 5);
        assert_eq!(by_label("2024").as_deref(), Some("/?month=3&day=15&season=summer&season=winter"));
        assert_eq!(by_label("March").as_deref(), Some("/2024?day=15&season=summer&season=winter"));
        assert_eq!(by_label("Day 15").as_deref(), Some("/2024/03?season=summer&season=winter"));
        assert_eq!(by_label("Summer").as_deref(), Some("/2024/03/15?season=winter"));
    }

    #[test]
    fn titles() {
        assert_eq!(page_title(&FilterState::new()), "Photos");
        assert_eq!(page_title(&FilterState::new().with_year(2024).with_month(3)), "Photos from March 2024");
        assert_eq!(page_title(&FilterState::new().with_camera("Canon", "EOS R5")), "Canon EOS R5");
        assert_eq!(page_title(&FilterState::new().with_colour("blue")), "Blue photos");
    }
}
