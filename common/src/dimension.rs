//! Declarative table of the filterable dimensions.
//!
//! The predicate builder, the facet computer, the codec and the chip builder
//! all walk [`DIMENSIONS`] in order instead of branching per field, so the
//! order of this table is also the canonical order of query parameters,
//! breadcrumbs and facets.

use serde::{Deserialize, Serialize};

use crate::search_const::month_name;
use crate::search_result::FacetOriginalValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Month,
    Day,
    Camera,
    Lens,
    Colour,
    TimeOfDay,
    Season,
    FocalCategory,
    ShootingCondition,
    InBurst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Year / month / day: one integer each, removable independently.
    Hierarchical,
    /// Camera make and model, always selected as a pair.
    CompositeScalar,
    /// Set of strings, OR'd together.
    MultiSelect,
    /// Unset, true or false.
    TriState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrdering {
    NaturalDescending,
    CountDescending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionDescriptor {
    pub dimension: Dimension,
    /// Stable identifier, also used in diagnostics.
    pub id: &'static str,
    pub label: &'static str,
    /// Query-string key. Camera uses `camera_make` / `camera_model` instead.
    pub query_param: &'static str,
    /// Storage columns backing the dimension.
    pub columns: &'static [&'static str],
    pub cardinality: Cardinality,
    pub parent: Option<Dimension>,
    pub ordering: ValueOrdering,
}

pub static DIMENSIONS: [DimensionDescriptor; 11] = [
    DimensionDescriptor {
        dimension: Dimension::Year,
        id: "year",
        label: "Year",
        query_param: "year",
        columns: &["date_taken"],
        cardinality: Cardinality::Hierarchical,
        parent: None,
        ordering: ValueOrdering::NaturalDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Month,
        id: "month",
        label: "Month",
        query_param: "month",
        columns: &["date_taken"],
        cardinality: Cardinality::Hierarchical,
        parent: Some(Dimension::Year),
        ordering: ValueOrdering::NaturalDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Day,
        id: "day",
        label: "Day",
        query_param: "day",
        columns: &["date_taken"],
        cardinality: Cardinality::Hierarchical,
        parent: Some(Dimension::Month),
        ordering: ValueOrdering::NaturalDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Camera,
        id: "camera",
        label: "Camera",
        query_param: "camera",
        columns: &["camera_make", "camera_model"],
        cardinality: Cardinality::CompositeScalar,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Lens,
        id: "lens",
        label: "Lens",
        query_param: "lens",
        columns: &["lens_model"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Colour,
        id: "color",
        label: "Colour",
        query_param: "color",
        columns: &["colour_names"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::TimeOfDay,
        id: "time_of_day",
        label: "Time of Day",
        query_param: "time_of_day",
        columns: &["time_of_day"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::Season,
        id: "season",
        label: "Season",
        query_param: "season",
        columns: &["season"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::FocalCategory,
        id: "focal_category",
        label: "Focal Length",
        query_param: "focal_category",
        columns: &["focal_category"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::ShootingCondition,
        id: "shooting_condition",
        label: "Lighting",
        query_param: "shooting_condition",
        columns: &["shooting_condition"],
        cardinality: Cardinality::MultiSelect,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
    DimensionDescriptor {
        dimension: Dimension::InBurst,
        id: "in_burst",
        label: "Burst",
        query_param: "in_burst",
        columns: &["burst_group_id"],
        cardinality: Cardinality::TriState,
        parent: None,
        ordering: ValueOrdering::CountDescending,
    },
];

impl Dimension {
    pub const ALL: [Dimension; 11] = [
        Dimension::Year,
        Dimension::Month,
        Dimension::Day,
        Dimension::Camera,
        Dimension::Lens,
        Dimension::Colour,
        Dimension::TimeOfDay,
        Dimension::Season,
        Dimension::FocalCategory,
        Dimension::ShootingCondition,
        Dimension::InBurst,
    ];

    pub fn descriptor(self) -> &'static DimensionDescriptor {
        &DIMENSIONS[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    pub fn from_id(id: &str) -> Option<Self> {
        DIMENSIONS.iter().find(|d| d.id == id).map(|d| d.dimension)
    }

    pub fn cardinality(self) -> Cardinality {
        self.descriptor().cardinality
    }

    pub fn is_multi_select(self) -> bool {
        self.cardinality() == Cardinality::MultiSelect
    }

    /// Display label of one value of this dimension.
    pub fn value_label(self, value: &FacetOriginalValue) -> String {
        match (self, value) {
            (Dimension::Month, FacetOriginalValue::Int(m)) => u32::try_from(*m)
                .ok()
                .and_then(month_name)
                .map(str::to_string)
                .unwrap_or_else(|| m.to_string()),
            (Dimension::Day, FacetOriginalValue::Int(d)) => format!("Day {d}"),
            (_, FacetOriginalValue::Int(i)) => i.to_string(),
            (_, FacetOriginalValue::Camera(camera)) => camera.label(),
            (_, FacetOriginalValue::Flag(true)) => "In burst".to_string(),
            (_, FacetOriginalValue::Flag(false)) => "Not in burst".to_string(),
            (Dimension::Lens, FacetOriginalValue::String(s)) => s.clone(),
            (_, FacetOriginalValue::String(s)) => title_case(s),
        }
    }
}

/// `golden_hour_morning` -> `Golden Hour Morning`.
pub fn title_case(raw: &str) -> String {
    raw.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
