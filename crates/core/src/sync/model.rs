//! Sync operation models: the durable reconciliation records.

use serde::{Deserialize, Serialize};

/// Operation kinds replayed against the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperationKind {
    Create,
    Update,
    Delete,
}

/// Entity collections participating in offline sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntity {
    Product,
    Cart,
    Order,
    Profile,
}

impl SyncEntity {
    /// API collection segment for this entity.
    pub fn collection(&self) -> &'static str {
        match self {
            SyncEntity::Product => "products",
            SyncEntity::Cart => "cart",
            SyncEntity::Order => "orders",
            SyncEntity::Profile => "profile",
        }
    }

    /// Map a request path to the entity it mutates. Defaults to `Product`
    /// for unrecognized paths, matching the outbound ledger contract.
    pub fn from_path(path: &str) -> Self {
        if path.contains("/cart") {
            SyncEntity::Cart
        } else if path.contains("/orders") {
            SyncEntity::Order
        } else if path.contains("/profile") {
            SyncEntity::Profile
        } else {
            SyncEntity::Product
        }
    }
}

/// Ledger record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Delivery priority. 1 is highest; FIFO within a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum SyncPriority {
    High,
    Normal,
    Low,
}

impl From<SyncPriority> for i32 {
    fn from(priority: SyncPriority) -> Self {
        match priority {
            SyncPriority::High => 1,
            SyncPriority::Normal => 2,
            SyncPriority::Low => 3,
        }
    }
}

impl TryFrom<i32> for SyncPriority {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(SyncPriority::High),
            2 => Ok(SyncPriority::Normal),
            3 => Ok(SyncPriority::Low),
            other => Err(format!("Invalid sync priority {}", other)),
        }
    }
}

/// Entity identity: integer for catalog/cart rows, string for vendor ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Int(value) => write!(f, "{}", value),
            EntityId::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Int(value as i64)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

/// A durable sync operation. Exactly one record exists per queued mutation
/// until it reaches `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    pub id: i32,
    pub operation: SyncOperationKind,
    pub entity_type: SyncEntity,
    pub entity_id: EntityId,
    pub data: serde_json::Value,
    /// Enqueue time, epoch milliseconds.
    pub timestamp: i64,
    pub status: SyncStatus,
    pub retry_count: i32,
    pub priority: SyncPriority,
}

/// Insert payload for a ledger record. The store assigns id, timestamp,
/// `Pending` status and a zero retry count. Each call produces an independent
/// record; duplicate intents are never coalesced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncOperation {
    pub operation: SyncOperationKind,
    pub entity_type: SyncEntity,
    pub entity_id: EntityId,
    pub data: serde_json::Value,
    pub priority: SyncPriority,
}

/// Merge-patch for a ledger record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperationPatch {
    pub status: Option<SyncStatus>,
    pub retry_count: Option<i32>,
    pub data: Option<serde_json::Value>,
}

/// HTTP method + path derived from a ledger record for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEndpoint {
    pub method: HttpMethod,
    pub path: String,
}

/// Methods the sync core sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Ledger operation kind mirroring this method. GET never reaches the
    /// ledger; it maps to `Update` only as a defaulting convenience.
    pub fn operation_kind(&self) -> SyncOperationKind {
        match self {
            HttpMethod::Post => SyncOperationKind::Create,
            HttpMethod::Delete => SyncOperationKind::Delete,
            _ => SyncOperationKind::Update,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the replay endpoint for a ledger record:
/// create -> POST /api/{collection}, update -> PUT /api/{collection}/{id},
/// delete -> DELETE /api/{collection}/{id}. Cart and profile mutations always
/// target the bare collection path.
pub fn derive_endpoint(
    operation: SyncOperationKind,
    entity: SyncEntity,
    entity_id: &EntityId,
) -> DerivedEndpoint {
    let collection = format!("/api/{}", entity.collection());
    let (method, path) = match (operation, entity) {
        (_, SyncEntity::Cart) | (_, SyncEntity::Profile) => {
            let method = match operation {
                SyncOperationKind::Create => HttpMethod::Post,
                SyncOperationKind::Update => HttpMethod::Put,
                SyncOperationKind::Delete => HttpMethod::Delete,
            };
            (method, collection)
        }
        (SyncOperationKind::Create, _) => (HttpMethod::Post, collection),
        (SyncOperationKind::Update, _) => {
            (HttpMethod::Put, format!("{}/{}", collection, entity_id))
        }
        (SyncOperationKind::Delete, _) => {
            (HttpMethod::Delete, format!("{}/{}", collection, entity_id))
        }
    };
    DerivedEndpoint { method, path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_wire_value() {
        for (priority, wire) in [
            (SyncPriority::High, 1),
            (SyncPriority::Normal, 2),
            (SyncPriority::Low, 3),
        ] {
            assert_eq!(i32::from(priority), wire);
            assert_eq!(SyncPriority::try_from(wire).unwrap(), priority);
        }
        assert!(SyncPriority::try_from(4).is_err());
    }

    #[test]
    fn entity_serialization_matches_ledger_contract() {
        let names = [
            SyncEntity::Product,
            SyncEntity::Cart,
            SyncEntity::Order,
            SyncEntity::Profile,
        ]
        .iter()
        .map(|entity| serde_json::to_string(entity).expect("serialize entity"))
        .collect::<Vec<_>>();
        assert_eq!(names, ["\"product\"", "\"cart\"", "\"order\"", "\"profile\""]);
    }

    #[test]
    fn endpoint_derivation_for_catalog_entities() {
        let create = derive_endpoint(
            SyncOperationKind::Create,
            SyncEntity::Product,
            &EntityId::Int(0),
        );
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.path, "/api/products");

        let update = derive_endpoint(
            SyncOperationKind::Update,
            SyncEntity::Order,
            &EntityId::Int(42),
        );
        assert_eq!(update.method, HttpMethod::Put);
        assert_eq!(update.path, "/api/orders/42");

        let delete = derive_endpoint(
            SyncOperationKind::Delete,
            SyncEntity::Product,
            &EntityId::Int(7),
        );
        assert_eq!(delete.method, HttpMethod::Delete);
        assert_eq!(delete.path, "/api/products/7");
    }

    #[test]
    fn cart_and_profile_target_bare_collection() {
        let cart = derive_endpoint(
            SyncOperationKind::Update,
            SyncEntity::Cart,
            &EntityId::Int(3),
        );
        assert_eq!(cart.path, "/api/cart");
        assert_eq!(cart.method, HttpMethod::Put);

        let profile = derive_endpoint(
            SyncOperationKind::Update,
            SyncEntity::Profile,
            &EntityId::Text("vendor1".to_string()),
        );
        assert_eq!(profile.path, "/api/profile");
    }

    #[test]
    fn entity_from_path_recognizes_collections() {
        assert_eq!(SyncEntity::from_path("/api/cart"), SyncEntity::Cart);
        assert_eq!(SyncEntity::from_path("/api/orders/9"), SyncEntity::Order);
        assert_eq!(SyncEntity::from_path("/api/profile"), SyncEntity::Profile);
        assert_eq!(SyncEntity::from_path("/api/products"), SyncEntity::Product);
        assert_eq!(SyncEntity::from_path("/api/unknown"), SyncEntity::Product);
    }
}
