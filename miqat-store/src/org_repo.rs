use async_trait::async_trait;
use miqat_core::repository::{OrganizationRepository, RepoResult};
use miqat_core::{Organization, OrganizationLink};
use miqat_shared::{OrgId, RequestStatus};
use sqlx::PgPool;

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    main_organization_id: i64,
    link_organization_id: i64,
    request_status: String,
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn get_organization(&self, id: OrgId) -> RepoResult<Option<Organization>> {
        let row: Option<OrganizationRow> =
            sqlx::query_as("SELECT id, name, is_active FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| Organization {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
        }))
    }

    async fn list_links(&self, org_id: OrgId) -> RepoResult<Vec<OrganizationLink>> {
        let rows: Vec<LinkRow> = sqlx::query_as(
            r#"
            SELECT id, main_organization_id, link_organization_id, request_status
            FROM organization_links
            WHERE main_organization_id = $1 OR link_organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrganizationLink {
                id: row.id,
                main_organization_id: row.main_organization_id,
                link_organization_id: row.link_organization_id,
                status: row
                    .request_status
                    .parse()
                    .unwrap_or(RequestStatus::Pending),
            })
            .collect())
    }
}
