use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    breadcrumbs::{ActiveFilterChip, Breadcrumb},
    dimension::Dimension,
    filter_state::{CameraSelection, FilterState},
};


/// Raw value of one facet candidate, typed by the dimension it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum FacetOriginalValue {
    Int(i64),
    Flag(bool),
    String(String),
    Camera(CameraSelection),
}

impl FacetOriginalValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for FacetOriginalValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl std::fmt::Display for FacetOriginalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Flag(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{}", s),
            Self::Camera(c) => write!(f, "{}/{}", c.make, c.model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: u64,
    pub file_path: String,
    pub date_taken: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub iso: Option<u32>,
    pub aperture: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub time_of_day: Option<String>,
    pub season: Option<String>,
    pub focal_category: Option<String>,
    pub shooting_condition: Option<String>,
    pub colour_names: Vec<String>,
    pub burst_group_id: Option<String>,
}

impl ItemSummary {
    pub fn in_burst(&self) -> bool {
        self.burst_group_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub items: Vec<ItemSummary>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl ResultPage {
    pub fn new(items: Vec<ItemSummary>, total: u64, limit: u64, offset: u64) -> Self {
        let has_more = offset + (items.len() as u64) < total;
        Self { items, total, limit, offset, has_more }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: FacetOriginalValue,
    pub label: String,
    pub count: u64,
    pub selected: bool,
    /// `count > 0 || selected`. Disabled values are still listed so the
    /// presentation layer can render them as inert.
    pub enabled: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub dimension: Dimension,
    pub id: String,
    pub label: String,
    pub values: Vec<FacetValue>,
}

impl Facet {
    pub fn value(&self, value: &FacetOriginalValue) -> Option<&FacetValue> {
        self.values.iter().find(|v| &v.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FacetCollection {
    pub facets: Vec<Facet>,
    /// Dimensions whose computation failed for this request.
    pub omitted: Vec<Dimension>,
}

impl FacetCollection {
    pub fn facet(&self, dimension: Dimension) -> Option<&Facet> {
        self.facets.iter().find(|f| f.dimension == dimension)
    }

    pub fn values(&self) -> impl Iterator<Item = (&Facet, &FacetValue)> {
        self.facets.iter().flat_map(|f| f.values.iter().map(move |v| (f, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    pub page: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Everything the presentation layer needs for one navigation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPage {
    pub state: FilterState,
    pub title: String,
    pub canonical_url: String,
    pub results: ResultPage,
    pub facets: FacetCollection,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub active_filters: Vec<ActiveFilterChip>,
    pub pagination: PageLinks,
}
