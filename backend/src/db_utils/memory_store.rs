//! In-process store over a vector of items.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock},
};

use chrono::Datelike;
use common::{
    Dimension,
    filter_state::CameraSelection,
    search_result::{FacetOriginalValue, ItemSummary},
};

use crate::{api::search::predicate::Predicate, db_utils::item_store::ItemStore};

/// Items held in memory; every query reads its own snapshot, so `replace`
/// can run concurrently with navigation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Arc<Vec<ItemSummary>>>,
}

impl MemoryStore {
    pub fn new(items: Vec<ItemSummary>) -> Self {
        Self { items: RwLock::new(Arc::new(items)) }
    }

    pub fn replace(&self, items: Vec<ItemSummary>) {
        let mut guard = self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(items);
    }

    pub fn snapshot(&self) -> Arc<Vec<ItemSummary>> {
        self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

/// Date taken descending with undated items last, then id.
pub fn result_order(a: &ItemSummary, b: &ItemSummary) -> std::cmp::Ordering {
    (a.date_taken.is_none(), Reverse(a.date_taken), a.id).cmp(&(b.date_taken.is_none(), Reverse(b.date_taken), b.id))
}

/// Values `item` carries in `dimension`; empty strings count as missing.
pub fn item_values(item: &ItemSummary, dimension: Dimension) -> Vec<FacetOriginalValue> {
    let text = |value: &Option<String>| {
        value.iter().filter(|v| !v.is_empty()).map(|v| FacetOriginalValue::String(v.clone())).collect()
    };
    match dimension {
        Dimension::Year => item.date_taken.map(|d| FacetOriginalValue::Int(d.year().into())).into_iter().collect(),
        Dimension::Month => item.date_taken.map(|d| FacetOriginalValue::Int(d.month().into())).into_iter().collect(),
        Dimension::Day => item.date_taken.map(|d| FacetOriginalValue::Int(d.day().into())).into_iter().collect(),
        Dimension::Camera => match (&item.camera_make, &item.camera_model) {
            (Some(make), Some(model)) if !make.is_empty() && !model.is_empty() => {
                vec![FacetOriginalValue::Camera(CameraSelection::new(make.clone(), model.clone()))]
            }
            _ => Vec::new(),
        },
        Dimension::Lens => text(&item.lens_model),
        Dimension::Colour => item
            .colour_names
            .iter()
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|c| FacetOriginalValue::String(c.clone()))
            .collect(),
        Dimension::TimeOfDay => text(&item.time_of_day),
        Dimension::Season => text(&item.season),
        Dimension::FocalCategory => text(&item.focal_category),
        Dimension::ShootingCondition => text(&item.shooting_condition),
        Dimension::InBurst => vec![FacetOriginalValue::Flag(item.in_burst())],
    }
}

impl ItemStore for MemoryStore {
    async fn fetch_page(&self, predicate: &Predicate, limit: u64, offset: u64) -> anyhow::Result<Vec<ItemSummary>> {
        let items = self.snapshot();
        let mut matching: Vec<&ItemSummary> = items.iter().filter(|item| predicate.matches(item)).collect();
        matching.sort_by(|a, b| result_order(a, b));
        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset)?)
            .take(usize::try_from(limit)?)
            .cloned()
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        let items = self.snapshot();
        Ok(items.iter().filter(|item| predicate.matches(item)).count() as u64)
    }

    async fn group_counts(
        &self,
        dimension: Dimension,
        predicate: &Predicate,
        limit: usize,
    ) -> anyhow::Result<Vec<(FacetOriginalValue, u64)>> {
        let items = self.snapshot();
        let mut groups: BTreeMap<FacetOriginalValue, u64> = BTreeMap::new();
        for item in items.iter() {
            let matches = predicate.matches(item);
            for value in item_values(item, dimension) {
                *groups.entry(value).or_default() += u64::from(matches);
            }
        }
        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
        groups.truncate(limit);
        Ok(groups)
    }
}
