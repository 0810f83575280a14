//! Database model for sync_queue rows.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use sokoni_core::sync::{EntityId, SyncOperation};
use sokoni_core::Result;

pub(crate) fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

pub(crate) fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::sync_queue)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncOperationDB {
    pub id: i32,
    pub operation: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: String,
    pub timestamp: i64,
    pub status: String,
    pub retry_count: i32,
    pub priority: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_queue)]
pub struct NewSyncOperationDB {
    pub operation: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: String,
    pub timestamp: i64,
    pub status: String,
    pub retry_count: i32,
    pub priority: i32,
}

/// Entity ids are stored as text; numeric ids round-trip back to integers.
fn entity_id_from_db(value: &str) -> EntityId {
    match value.parse::<i64>() {
        Ok(numeric) => EntityId::Int(numeric),
        Err(_) => EntityId::Text(value.to_string()),
    }
}

pub(crate) fn to_sync_operation(row: SyncOperationDB) -> Result<SyncOperation> {
    Ok(SyncOperation {
        id: row.id,
        operation: enum_from_db(&row.operation)?,
        entity_type: enum_from_db(&row.entity_type)?,
        entity_id: entity_id_from_db(&row.entity_id),
        data: serde_json::from_str(&row.data)?,
        timestamp: row.timestamp,
        status: enum_from_db(&row.status)?,
        retry_count: row.retry_count,
        priority: sokoni_core::sync::SyncPriority::try_from(row.priority)
            .map_err(sokoni_core::Error::Validation)?,
    })
}
