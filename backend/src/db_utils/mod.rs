pub mod clickhouse_store;
pub mod clickhouse_utils;
pub mod item_store;
pub mod memory_store;
