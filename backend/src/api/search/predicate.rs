//! Predicate tree built from a [`FilterState`].
//!
//! Conjunction across dimensions, disjunction within a multi-select
//! dimension. The builder walks the dimension table in its fixed order, so
//! the same state always yields the same tree.

use chrono::Datelike;
use common::{
    dimension::{Cardinality, DIMENSIONS, Dimension, DimensionDescriptor},
    filter_state::FilterState,
    search_result::{FacetOriginalValue, ItemSummary},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    DateTaken,
    CameraMake,
    CameraModel,
    LensModel,
    ColourNames,
    TimeOfDay,
    Season,
    FocalCategory,
    ShootingCondition,
    BurstGroupId,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::DateTaken => "date_taken",
            Column::CameraMake => "camera_make",
            Column::CameraModel => "camera_model",
            Column::LensModel => "lens_model",
            Column::ColourNames => "colour_names",
            Column::TimeOfDay => "time_of_day",
            Column::Season => "season",
            Column::FocalCategory => "focal_category",
            Column::ShootingCondition => "shooting_condition",
            Column::BurstGroupId => "burst_group_id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [Column; 10] = [
            Column::DateTaken,
            Column::CameraMake,
            Column::CameraModel,
            Column::LensModel,
            Column::ColourNames,
            Column::TimeOfDay,
            Column::Season,
            Column::FocalCategory,
            Column::ShootingCondition,
            Column::BurstGroupId,
        ];
        ALL.into_iter().find(|c| c.name() == name)
    }

    /// Array columns hold several values per item and match by membership.
    pub fn is_array(self) -> bool {
        self == Column::ColourNames
    }

    fn text_value(self, item: &ItemSummary) -> Option<&str> {
        match self {
            Column::CameraMake => item.camera_make.as_deref(),
            Column::CameraModel => item.camera_model.as_deref(),
            Column::LensModel => item.lens_model.as_deref(),
            Column::TimeOfDay => item.time_of_day.as_deref(),
            Column::Season => item.season.as_deref(),
            Column::FocalCategory => item.focal_category.as_deref(),
            Column::ShootingCondition => item.shooting_condition.as_deref(),
            Column::BurstGroupId => item.burst_group_id.as_deref(),
            Column::DateTaken | Column::ColourNames => None,
        }
    }

    fn is_null(self, item: &ItemSummary) -> bool {
        match self {
            Column::DateTaken => item.date_taken.is_none(),
            Column::ColourNames => item.colour_names.is_empty(),
            other => other.text_value(item).is_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    pub fn of(self, item: &ItemSummary) -> Option<i64> {
        let date = item.date_taken?;
        Some(match self {
            DatePart::Year => date.year().into(),
            DatePart::Month => date.month().into(),
            DatePart::Day => date.day().into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every item.
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Eq(Column, String),
    /// Membership in an array column.
    Contains(Column, String),
    DatePartEq(DatePart, i64),
    IsNull(Column),
    IsNotNull(Column),
}

impl Predicate {
    /// Conjunction that drops `All` operands and flattens single children.
    pub fn and(parts: Vec<Predicate>) -> Predicate {
        let mut parts: Vec<_> = parts.into_iter().filter(|p| *p != Predicate::All).collect();
        match parts.len() {
            0 => Predicate::All,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    pub fn or(mut parts: Vec<Predicate>) -> Predicate {
        match parts.len() {
            1 => parts.remove(0),
            _ => Predicate::Or(parts),
        }
    }

    pub fn matches(&self, item: &ItemSummary) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(parts) => parts.iter().all(|p| p.matches(item)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(item)),
            Predicate::Eq(column, value) => column.text_value(item) == Some(value.as_str()),
            Predicate::Contains(Column::ColourNames, value) => item.colour_names.iter().any(|c| c == value),
            Predicate::Contains(column, value) => column.text_value(item) == Some(value.as_str()),
            Predicate::DatePartEq(part, value) => part.of(item) == Some(*value),
            Predicate::IsNull(column) => column.is_null(item),
            Predicate::IsNotNull(column) => !column.is_null(item),
        }
    }
}

pub fn build_predicate(state: &FilterState) -> Predicate {
    Predicate::and(DIMENSIONS.iter().filter_map(|d| dimension_predicate(state, d)).collect())
}

/// Predicate for `state` with `dimension`'s own constraint relaxed.
pub fn build_predicate_without(state: &FilterState, dimension: Dimension) -> Predicate {
    build_predicate(&state.without_dimension(dimension))
}

/// Predicate matching items that carry `value` in `dimension`.
pub fn value_predicate(dimension: Dimension, value: &FacetOriginalValue) -> Predicate {
    build_predicate(&FilterState::new().with_value(dimension, value))
}

fn columns(descriptor: &DimensionDescriptor) -> Vec<Column> {
    descriptor.columns.iter().filter_map(|name| Column::from_name(name)).collect()
}

fn dimension_predicate(state: &FilterState, descriptor: &DimensionDescriptor) -> Option<Predicate> {
    let dimension = descriptor.dimension;
    if !state.has_dimension(dimension) {
        return None;
    }
    let columns = columns(descriptor);
    let values = state.selected_values(dimension);
    match descriptor.cardinality {
        Cardinality::Hierarchical => {
            let part = match dimension {
                Dimension::Year => DatePart::Year,
                Dimension::Month => DatePart::Month,
                _ => DatePart::Day,
            };
            values.first().and_then(|v| v.as_int()).map(|v| Predicate::DatePartEq(part, v))
        }
        Cardinality::CompositeScalar => match values.first() {
            Some(FacetOriginalValue::Camera(camera)) => {
                let [make, model] = columns.as_slice() else {
                    return None;
                };
                Some(Predicate::and(vec![
                    Predicate::Eq(*make, camera.make.clone()),
                    Predicate::Eq(*model, camera.model.clone()),
                ]))
            }
            _ => None,
        },
        Cardinality::MultiSelect => {
            let column = *columns.first()?;
            let parts = values
                .into_iter()
                .filter_map(|v| match v {
                    FacetOriginalValue::String(s) if column.is_array() => Some(Predicate::Contains(column, s)),
                    FacetOriginalValue::String(s) => Some(Predicate::Eq(column, s)),
                    _ => None,
                })
                .collect::<Vec<_>>();
            Some(Predicate::or(parts))
        }
        Cardinality::TriState => {
            let column = *columns.first()?;
            match state.in_burst()? {
                true => Some(Predicate::IsNotNull(column)),
                false => Some(Predicate::IsNull(column)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item(id: u64) -> ItemSummary {
        ItemSummary {
            id,
            file_path: format!("/photos/{id}.jpg"),
            date_taken: NaiveDate::from_ymd_opt(2024, 3, 15).and_then(|d| d.and_hms_opt(10, 0, 0)),
            camera_make: Some("Canon".into()),
            camera_model: Some("EOS R5".into()),
            lens_model: Some("RF 24-70mm".into()),
            focal_length: Some(35.0),
            iso: Some(100),
            aperture: Some(2.8),
            width: Some(6000),
            height: Some(4000),
            time_of_day: Some("morning".into()),
            season: Some("spring".into()),
            focal_category: Some("normal".into()),
            shooting_condition: Some("bright".into()),
            colour_names: vec!["blue".into(), "green".into()],
            burst_group_id: None,
        }
    }

    #[test]
    fn every_descriptor_column_resolves() {
        for descriptor in DIMENSIONS.iter() {
            assert_eq!(columns(descriptor).len(), descriptor.columns.len(), "{}", descriptor.id);
        }
    }

    #[test]
    fn empty_state_matches_everything() {
        assert_eq!(build_predicate(&FilterState::new()), Predicate::All);
    }

    #[test]
    fn same_state_same_predicate_regardless_of_build_order() {
        let a = FilterState::new().with_colour("red").with_year(2024).with_season("summer");
        let b = FilterState::new().with_season("summer").with_year(2024).with_colour("red");
        assert_eq!(build_predicate(&a), build_predicate(&b));
    }

    #[test]
    fn structure_is_and_of_or() {
        let state = FilterState::new().with_year(2024).with_lens("A").with_lens("B").with_in_burst(true);
        assert_eq!(
            build_predicate(&state),
            Predicate::And(vec![
                Predicate::DatePartEq(DatePart::Year, 2024),
                Predicate::Or(vec![
                    Predicate::Eq(Column::LensModel, "A".into()),
                    Predicate::Eq(Column::LensModel, "B".into()),
                ]),
                Predicate::IsNotNull(Column::BurstGroupId),
            ])
        );
    }

    #[test]
    fn colour_uses_membership() {
        let state = FilterState::new().with_colour("blue");
        assert_eq!(build_predicate(&state), Predicate::Contains(Column::ColourNames, "blue".into()));
        assert!(build_predicate(&state).matches(&item(1)));
        assert!(!build_predicate(&FilterState::new().with_colour("red")).matches(&item(1)));
    }

    #[test]
    fn relaxing_a_dimension_keeps_the_others() {
        let state = FilterState::new().with_year(2024).with_month(3).with_colour("red");
        assert_eq!(
            build_predicate_without(&state, Dimension::Year),
            Predicate::And(vec![
                Predicate::DatePartEq(DatePart::Month, 3),
                Predicate::Contains(Column::ColourNames, "red".into()),
            ])
        );
    }

    #[test]
    fn in_memory_evaluation() {
        let photo = item(1);
        let matching = FilterState::new()
            .with_year(2024)
            .with_month(3)
            .with_day(15)
            .with_camera("Canon", "EOS R5")
            .with_season("spring")
            .with_season("summer")
            .with_in_burst(false);
        assert!(build_predicate(&matching).matches(&photo));
        assert!(!build_predicate(&matching.with_in_burst(true)).matches(&photo));
        assert!(!build_predicate(&matching.with_camera("Canon", "EOS R6")).matches(&photo));

        let undated = ItemSummary { date_taken: None, ..item(2) };
        assert!(!build_predicate(&FilterState::new().with_year(2024)).matches(&undated));
    }

    #[test]
    fn value_predicate_targets_one_value() {
        assert_eq!(
            value_predicate(Dimension::Month, &FacetOriginalValue::Int(7)),
            Predicate::DatePartEq(DatePart::Month, 7)
        );
    }
}
