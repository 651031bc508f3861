use async_trait::async_trait;
use miqat_core::repository::{GrantRepository, RepoResult};
use miqat_core::AllowedReseller;
use miqat_shared::{OrgId, RequestStatus};
use serde_json::Value;
use sqlx::PgPool;

pub struct PgGrantRepository {
    pool: PgPool,
}

impl PgGrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AllowedResellerRow {
    id: i64,
    inventory_owner_organization_id: i64,
    reseller_organization_id: i64,
    requested_status: String,
    allowed_types: Vec<String>,
    allowed_items: Option<Value>,
}

#[async_trait]
impl GrantRepository for PgGrantRepository {
    async fn list_grants_for_reseller(&self, reseller_org_id: OrgId) -> RepoResult<Vec<AllowedReseller>> {
        let rows: Vec<AllowedResellerRow> = sqlx::query_as(
            r#"
            SELECT id, inventory_owner_organization_id, reseller_organization_id,
                   requested_status, allowed_types, allowed_items
            FROM allowed_resellers
            WHERE reseller_organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(reseller_org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                AllowedReseller::from_legacy(
                    row.id,
                    row.inventory_owner_organization_id,
                    row.reseller_organization_id,
                    row.requested_status
                        .parse()
                        .unwrap_or(RequestStatus::Pending),
                    &row.allowed_types,
                    &row.allowed_items.unwrap_or(Value::Null),
                )
            })
            .collect())
    }
}
