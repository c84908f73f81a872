use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{Owner, OwnerId};

/// Lookup and persistence of clinic owners.
#[async_trait]
pub trait OwnerService: Send + Sync {
    /// Returns every owner whose last name matches a SQL `LIKE` pattern.
    async fn find_all_by_last_name_like(&self, pattern: &str) -> Result<Vec<Owner>>;
    async fn find_by_id(&self, owner_id: OwnerId) -> Result<Option<Owner>>;
    /// Persists `owner` and returns it with its assigned id.
    async fn save(&self, owner: Owner) -> Result<Owner>;
}
