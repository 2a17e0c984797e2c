//! `ItemStore` backed by a ClickHouse `photos` table.

use anyhow::Context;
use chrono::NaiveDateTime;
use clickhouse::{Row, query::Query, sql::Identifier};
use common::{
    Dimension,
    filter_state::CameraSelection,
    search_result::{FacetOriginalValue, ItemSummary},
};
use serde::Deserialize;

use crate::{
    api::search::{
        predicate::Predicate,
        search_sql::{SQL_ORDER_CLAUSE, SQL_SELECT_COLUMNS, SqlArg, SqlWhere, build_sql_where_clause},
    },
    config::EngineConfig,
    db_utils::{clickhouse_utils::get_clickhouse_client, item_store::ItemStore},
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Row, Deserialize)]
pub struct PhotoRow {
    pub id: u64,
    pub file_path: String,
    /// `toString(date_taken)`, empty when undated.
    pub taken_at: String,
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

impl TryFrom<PhotoRow> for ItemSummary {
    type Error = anyhow::Error;

    fn try_from(row: PhotoRow) -> anyhow::Result<Self> {
        let date_taken = match row.taken_at.as_str() {
            "" => None,
            raw => Some(
                NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
                    .with_context(|| format!("photo {}: bad date_taken {raw:?}", row.id))?,
            ),
        };
        Ok(ItemSummary {
            id: row.id,
            file_path: row.file_path,
            date_taken,
            camera_make: row.camera_make,
            camera_model: row.camera_model,
            lens_model: row.lens_model,
            focal_length: row.focal_length,
            iso: row.iso,
            aperture: row.aperture,
            width: row.width,
            height: row.height,
            time_of_day: row.time_of_day,
            season: row.season,
            focal_category: row.focal_category,
            shooting_condition: row.shooting_condition,
            colour_names: row.colour_names,
            burst_group_id: row.burst_group_id,
        })
    }
}

#[derive(Clone)]
pub struct ClickhouseStore {
    client: clickhouse::Client,
    table: String,
}

impl ClickhouseStore {
    pub fn new(client: clickhouse::Client, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(get_clickhouse_client(config), config.photos_table.clone())
    }

    fn prepare(&self, query: StoreQuery) -> Query {
        let mut prepared = self.client.query(&query.sql);
        for bind in query.binds {
            prepared = match bind {
                Bind::Arg(SqlArg::Str(s)) => prepared.bind(s),
                Bind::Arg(SqlArg::Int(i)) => prepared.bind(i),
                Bind::Table => prepared.bind(Identifier(&self.table)),
                Bind::Value(v) => prepared.bind(v),
            };
        }
        prepared
    }
}

/// One value for a `?` placeholder. The table name is bound as an
/// identifier when the query is prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    Arg(SqlArg),
    Table,
    Value(u64),
}

/// SQL text and its binds, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub sql: String,
    pub binds: Vec<Bind>,
}

fn filter_binds(filter: SqlWhere) -> impl Iterator<Item = Bind> {
    filter.args.into_iter().map(Bind::Arg)
}

pub fn fetch_page_query(predicate: &Predicate, limit: u64, offset: u64) -> StoreQuery {
    let filter = build_sql_where_clause(predicate);
    let sql = format!("SELECT {SQL_SELECT_COLUMNS} FROM ? {} {SQL_ORDER_CLAUSE} LIMIT ? OFFSET ?", filter.clause());
    let mut binds = vec![Bind::Table];
    binds.extend(filter_binds(filter));
    binds.extend([Bind::Value(limit), Bind::Value(offset)]);
    StoreQuery { sql, binds }
}

pub fn count_query(predicate: &Predicate) -> StoreQuery {
    let filter = build_sql_where_clause(predicate);
    let sql = format!("SELECT count() FROM ? {}", filter.clause());
    let mut binds = vec![Bind::Table];
    binds.extend(filter_binds(filter));
    StoreQuery { sql, binds }
}

/// Every stored value of `dimension` with `countIf(predicate)`. The
/// condition sits in the select list, so its binds come before the table.
pub fn group_counts_query(dimension: Dimension, predicate: &Predicate, limit: usize) -> StoreQuery {
    let (key, guard) = group_key(dimension);
    let (select, group_by, order) = match dimension {
        Dimension::Camera => (key.to_string(), "make, model", "make, model"),
        Dimension::Year | Dimension::Month | Dimension::Day => (format!("{key} AS k"), "k", "k DESC"),
        _ => (format!("{key} AS k"), "k", "k"),
    };
    let filter = build_sql_where_clause(predicate);
    let sql = format!(
        "SELECT {select}, countIf({}) AS c FROM ? WHERE {guard} GROUP BY {group_by} ORDER BY c DESC, {order} LIMIT ?",
        filter.condition
    );
    let mut binds: Vec<Bind> = filter_binds(filter).collect();
    binds.extend([Bind::Table, Bind::Value(limit as u64)]);
    StoreQuery { sql, binds }
}

/// Key expression and non-null guard for one dimension's GROUP BY.
fn group_key(dimension: Dimension) -> (&'static str, &'static str) {
    match dimension {
        Dimension::Year => ("toInt64(toYear(assumeNotNull(date_taken)))", "date_taken IS NOT NULL"),
        Dimension::Month => ("toInt64(toMonth(assumeNotNull(date_taken)))", "date_taken IS NOT NULL"),
        Dimension::Day => ("toInt64(toDayOfMonth(assumeNotNull(date_taken)))", "date_taken IS NOT NULL"),
        Dimension::Lens => ("assumeNotNull(lens_model)", "lens_model IS NOT NULL AND lens_model != ''"),
        Dimension::Colour => ("arrayJoin(arrayDistinct(colour_names))", "notEmpty(colour_names)"),
        Dimension::TimeOfDay => ("assumeNotNull(time_of_day)", "time_of_day IS NOT NULL AND time_of_day != ''"),
        Dimension::Season => ("assumeNotNull(season)", "season IS NOT NULL AND season != ''"),
        Dimension::FocalCategory => {
            ("assumeNotNull(focal_category)", "focal_category IS NOT NULL AND focal_category != ''")
        }
        Dimension::ShootingCondition => (
            "assumeNotNull(shooting_condition)",
            "shooting_condition IS NOT NULL AND shooting_condition != ''",
        ),
        Dimension::InBurst => ("toUInt8(burst_group_id IS NOT NULL)", "1"),
        Dimension::Camera => (
            "assumeNotNull(camera_make) AS make, assumeNotNull(camera_model) AS model",
            "camera_make IS NOT NULL AND camera_model IS NOT NULL AND camera_make != '' AND camera_model != ''",
        ),
    }
}

impl ItemStore for ClickhouseStore {
    async fn fetch_page(&self, predicate: &Predicate, limit: u64, offset: u64) -> anyhow::Result<Vec<ItemSummary>> {
        let rows = self
            .prepare(fetch_page_query(predicate, limit, offset))
            .fetch_all::<PhotoRow>()
            .await
            .context("fetching result page")?;
        rows.into_iter().map(ItemSummary::try_from).collect()
    }

    async fn count(&self, predicate: &Predicate) -> anyhow::Result<u64> {
        self.prepare(count_query(predicate)).fetch_one::<u64>().await.context("counting results")
    }

    async fn group_counts(
        &self,
        dimension: Dimension,
        predicate: &Predicate,
        limit: usize,
    ) -> anyhow::Result<Vec<(FacetOriginalValue, u64)>> {
        let query = self.prepare(group_counts_query(dimension, predicate, limit));
        let context = || format!("grouping by {}", dimension.id());

        let groups = match dimension {
            Dimension::Year | Dimension::Month | Dimension::Day => query
                .fetch_all::<(i64, u64)>()
                .await
                .with_context(context)?
                .into_iter()
                .map(|(k, c)| (FacetOriginalValue::Int(k), c))
                .collect(),
            Dimension::Camera => query
                .fetch_all::<(String, String, u64)>()
                .await
                .with_context(context)?
                .into_iter()
                .map(|(make, model, c)| (FacetOriginalValue::Camera(CameraSelection::new(make, model)), c))
                .collect(),
            Dimension::InBurst => query
                .fetch_all::<(u8, u64)>()
                .await
                .with_context(context)?
                .into_iter()
                .map(|(k, c)| (FacetOriginalValue::Flag(k != 0), c))
                .collect(),
            _ => query
                .fetch_all::<(String, u64)>()
                .await
                .with_context(context)?
                .into_iter()
                .map(|(k, c)| (FacetOriginalValue::String(k), c))
                .collect(),
        };
        Ok(groups)
    }
}
