#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use backend::{
    EngineConfig, Navigator,
    api::search::predicate::Predicate,
    db_utils::{item_store::ItemStore, memory_store::MemoryStore},
};
use chrono::NaiveDate;
use common::{
    Dimension,
    search_result::{FacetOriginalValue, ItemSummary},
};

pub struct PhotoBuilder(ItemSummary);

pub fn photo(id: u64) -> PhotoBuilder {
    PhotoBuilder(ItemSummary {
        id,
        file_path: format!("/library/{id:05}.jpg"),
        date_taken: None,
        camera_make: None,
        camera_model: None,
        lens_model: None,
        focal_length: None,
        iso: None,
        aperture: None,
        width: Some(6000),
        height: Some(4000),
        time_of_day: None,
        season: None,
        focal_category: None,
        shooting_condition: None,
        colour_names: Vec::new(),
        burst_group_id: None,
    })
}

impl PhotoBuilder {
    pub fn taken(mut self, year: i32, month: u32, day: u32) -> Self {
        self.0.date_taken = NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(10, 30, 0));
        self
    }

    pub fn camera(mut self, make: &str, model: &str) -> Self {
        self.0.camera_make = Some(make.to_string());
        self.0.camera_model = Some(model.to_string());
        self
    }

    pub fn lens(mut self, lens: &str) -> Self {
        self.0.lens_model = Some(lens.to_string());
        self
    }

    pub fn colours(mut self, colours: &[&str]) -> Self {
        self.0.colour_names = colours.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn season(mut self, season: &str) -> Self {
        self.0.season = Some(season.to_string());
        self
    }

    pub fn time_of_day(mut self, time_of_day: &str) -> Self {
        self.0.time_of_day = Some(time_of_day.to_string());
        self
    }

    pub fn burst(mut self, group: &str) -> Self {
        self.0.burst_group_id = Some(group.to_string());
        self
    }

    pub fn build(self) -> ItemSummary {
        self.0
    }
}

/// A mixed library of 48 photos spread over two years, three cameras and a
/// handful of colours, seasons and bursts.
pub fn library() -> Vec<ItemSummary> {
    let cameras = [("Canon", "EOS R5"), ("Sony", "A7R V"), ("Fujifilm", "X-T5")];
    let lenses = ["RF 24-70mm", "FE 85mm", "XF 35mm", "RF 100-500mm"];
    let colours = ["red", "blue", "green", "yellow", "black"];
    let seasons = ["winter", "spring", "summer", "autumn"];
    let times = ["morning", "afternoon", "evening", "night"];
    (1..=48u64)
        .map(|id| {
            let i = id as usize;
            let (make, model) = cameras[i % 3];
            let mut builder = photo(id)
                .camera(make, model)
                .lens(lenses[i % 4])
                .colours(&[colours[i % 5], colours[(i / 5) % 5]])
                .season(seasons[(i / 3) % 4])
                .time_of_day(times[(i / 2) % 4]);
            if i % 7 != 0 {
                builder = builder.taken(2023 + (i % 2) as i32, (i % 12 + 1) as u32, (i % 28 + 1) as u32);
            }
            if i % 6 == 0 {
                builder = builder.burst(&format!("burst-{}", i / 12));
            }
            builder.build()
        })
        .collect()
}

pub fn navigator<S: ItemStore>(store: S) -> Navigator<S> {
    Navigator::new(store, Arc::new(EngineConfig::default()))
}

pub fn memory_navigator(items: Vec<ItemSummary>) -> Navigator<MemoryStore> {
    navigator(MemoryStore::new(items))
}

/// Wraps a store and fails the chosen calls.
pub struct FailingStore<S> {
    pub inner: S,
    pub fail_dimension: Option<Dimension>,
    pub fail_results: bool,
    /// Fails `count` calls for exactly this predicate.
    pub fail_count_for: Option<Predicate>,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, fail_dimension: None, fail_results: false, fail_count_for: None }
    }
}

impl<S: ItemStore> ItemStore for FailingStore<S> {
    async fn fetch_page(&self, predicate: &Predicate, limit: u64, offset: u64) -> anyhow::Result<Vec<ItemSummary>> {
        if self.fail_results {
            anyhow::bail!("connection refused");
        }
        self.inner.fetch_page(predicate, limit, offset).await
    }

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        if self.fail_results || self.fail_count_for.as_ref() == Some(predicate) {
            anyhow::bail!("connection refused");
        }
        self.inner.count(predicate).await
    }

    async fn group_counts(
        &self,
        dimension: Dimension,
        predicate: &Predicate,
        limit: usize,
    ) -> anyhow::Result<Vec<(FacetOriginalValue, u64)>> {
        if self.fail_dimension == Some(dimension) {
            anyhow::bail!("group by {} timed out", dimension.id());
        }
        self.inner.group_counts(dimension, predicate, limit).await
    }
}

/// Never answers.
pub struct StalledStore;

impl ItemStore for StalledStore {
    async fn fetch_page(&self, _: &Predicate, _: u64, _: u64) -> anyhow::Result<Vec<ItemSummary>> {
        std::future::pending().await
    }

    async fn count(&self, _: &Predicate) -> anyhow::Result<u64> {
        std::future::pending().await
    }

    async fn group_counts(&self, _: Dimension, _: &Predicate, _: usize) -> anyhow::Result<Vec<(FacetOriginalValue, u64)>> {
        std::future::pending().await
    }
}

/// Counts every call reaching the inner store.
pub struct CountingStore<S> {
    pub inner: S,
    pub calls: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<S: ItemStore> ItemStore for CountingStore<S> {
    async fn fetch_page(&self, predicate: &Predicate, limit: u64, offset: u64) -> anyhow::Result<Vec<ItemSummary>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_page(predicate, limit, offset).await
    }

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.count(predicate).await
    }

    async fn group_counts(
        &self,
        dimension: Dimension,
        predicate: &Predicate,
        limit: usize,
    ) -> anyhow::Result<Vec<(FacetOriginalValue, u64)>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.group_counts(dimension, predicate, limit).await
    }
}
