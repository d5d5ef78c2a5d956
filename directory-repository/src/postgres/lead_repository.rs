use async_trait::async_trait;
use directory_shared::NewLead;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::LeadRepository;

/// PostgreSQL-backed lead store.
pub struct PostgresLeadRepository {
    pool: sqlx::PgPool,
}

impl PostgresLeadRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn insert_lead(&self, lead: &NewLead) -> Result<Uuid, RepositoryError> {
        let id = Uuid::new_v4();
        let utm = sqlx::types::Json(&lead.utm);

        sqlx::query(
            r#"
            INSERT INTO leads (id, listing_id, name, email, phone, zip, interest, timeline, budget, consent_ts, ip, utm)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(lead.listing_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.zip)
        .bind(&lead.interest)
        .bind(&lead.timeline)
        .bind(&lead.budget)
        .bind(lead.consent_ts)
        .bind(&lead.ip)
        .bind(utm)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}
