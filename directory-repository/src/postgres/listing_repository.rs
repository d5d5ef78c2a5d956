//! PostgreSQL implementation of the listing store.
//!
//! All writes of an ingestion batch share one transaction: category upserts,
//! listing upserts and join replacement either all commit or all roll back.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directory_shared::slug::{slug_candidate, MAX_SLUG_SUFFIX};
use directory_shared::{
    Category, CategorySeed, IngestChangeset, Listing, ListingUpsert, ListingWithCategories,
};
use tracing::debug;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::ListingRepository;
use crate::types::PersistedListing;

const LISTING_COLUMNS: &str = r#"
    l.id, l.slug, l.name, l.website, l.description, l.phone, l.email, l.address,
    l.city, l.state, l.postal_code, l.country, l.lat, l.lng, l.rating, l.review_count,
    l.brands, l.financing, l.plan_weight, l.created_at, l.updated_at,
    COALESCE(
        array_agg(c.slug ORDER BY c.slug) FILTER (WHERE c.slug IS NOT NULL),
        ARRAY[]::text[]
    ) AS categories
"#;

const LISTING_JOINS: &str = r#"
    FROM listings l
    LEFT JOIN listing_categories lc ON lc.listing_id = l.id
    LEFT JOIN categories c ON c.id = lc.category_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    slug: String,
    name: String,
    website: Option<String>,
    description: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    lat: Option<f64>,
    lng: Option<f64>,
    rating: Option<f64>,
    review_count: Option<i32>,
    brands: Vec<String>,
    financing: Vec<String>,
    plan_weight: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    categories: Vec<String>,
}

impl From<ListingRow> for ListingWithCategories {
    fn from(row: ListingRow) -> Self {
        ListingWithCategories {
            listing: Listing {
                id: row.id,
                slug: row.slug,
                name: row.name,
                website: row.website,
                description: row.description,
                phone: row.phone,
                email: row.email,
                address: row.address,
                city: row.city,
                state: row.state,
                postal_code: row.postal_code,
                country: row.country,
                lat: row.lat,
                lng: row.lng,
                rating: row.rating,
                review_count: row.review_count,
                brands: row.brands,
                financing: row.financing,
                plan_weight: row.plan_weight,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            categories: row.categories,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    slug: String,
    label: String,
}

/// PostgreSQL implementation of the listing store.
///
/// Provides database operations for listings, categories and their joins using
/// PostgreSQL with connection pooling and transaction support.
pub struct PostgresListingRepository {
    pool: sqlx::PgPool,
}

impl PostgresListingRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the schema migrated
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Upserts category seeds within an active transaction.
    async fn upsert_categories_tx(
        &self,
        categories: &[CategorySeed],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), RepositoryError> {
        for category in categories {
            sqlx::query(
                r#"
                INSERT INTO categories (id, slug, label)
                VALUES ($1, $2, $3)
                ON CONFLICT (slug) DO UPDATE SET label = EXCLUDED.label
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&category.slug)
            .bind(&category.label)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Picks the slug a listing is stored under.
    ///
    /// Supplied slugs are natural keys and are used as-is. A derived slug that
    /// belongs to a different business gets the first free `-n` suffix.
    ///
    /// Each candidate is guarded by a transaction-scoped advisory lock, so a
    /// concurrent batch deriving the same slug waits for this one to commit
    /// and then sees its row.
    async fn resolve_slug_tx(
        &self,
        listing: &ListingUpsert,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<String, RepositoryError> {
        if !listing.slug_derived {
            return Ok(listing.slug.clone());
        }

        for attempt in 1..=MAX_SLUG_SUFFIX {
            let candidate = slug_candidate(&listing.slug, attempt);
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(&candidate)
                .execute(&mut **tx)
                .await?;

            let owner: Option<(String, String, String)> =
                sqlx::query_as("SELECT name, city, state FROM listings WHERE slug = $1")
                    .bind(&candidate)
                    .fetch_optional(&mut **tx)
                    .await?;

            match owner {
                None => return Ok(candidate),
                Some((name, city, state)) if listing.same_identity(&name, &city, &state) => {
                    return Ok(candidate)
                }
                Some(_) => {
                    debug!(slug = %candidate, "Derived slug taken by another listing");
                }
            }
        }

        Err(RepositoryError::SlugExhausted {
            slug: listing.slug.clone(),
            attempts: MAX_SLUG_SUFFIX,
        })
    }

    /// Upserts one listing row keyed by slug.
    ///
    /// Optional scalars absent from the input keep their stored value on
    /// update. `plan_weight` is only ever set on insert.
    async fn upsert_listing_tx(
        &self,
        slug: &str,
        listing: &ListingUpsert,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(Uuid, bool), RepositoryError> {
        let row: (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO listings (
                id, slug, name, website, description, phone, email, address,
                city, state, postal_code, country, lat, lng, rating, review_count,
                brands, financing, plan_weight
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, 0)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                website = COALESCE(EXCLUDED.website, listings.website),
                description = COALESCE(EXCLUDED.description, listings.description),
                phone = COALESCE(EXCLUDED.phone, listings.phone),
                email = COALESCE(EXCLUDED.email, listings.email),
                address = COALESCE(EXCLUDED.address, listings.address),
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                postal_code = EXCLUDED.postal_code,
                country = EXCLUDED.country,
                lat = COALESCE(EXCLUDED.lat, listings.lat),
                lng = COALESCE(EXCLUDED.lng, listings.lng),
                rating = COALESCE(EXCLUDED.rating, listings.rating),
                review_count = COALESCE(EXCLUDED.review_count, listings.review_count),
                brands = EXCLUDED.brands,
                financing = EXCLUDED.financing,
                updated_at = now()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(&listing.name)
        .bind(&listing.website)
        .bind(&listing.description)
        .bind(&listing.phone)
        .bind(&listing.email)
        .bind(&listing.address)
        .bind(&listing.city)
        .bind(&listing.state)
        .bind(&listing.postal_code)
        .bind(&listing.country)
        .bind(listing.lat)
        .bind(listing.lng)
        .bind(listing.rating)
        .bind(listing.review_count)
        .bind(&listing.brands)
        .bind(&listing.financing)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Replaces the listing's category joins with the named categories.
    ///
    /// Slugs with no matching category are skipped.
    async fn replace_categories_tx(
        &self,
        listing_id: Uuid,
        slugs: &[String],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM listing_categories WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut **tx)
            .await?;

        if slugs.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO listing_categories (listing_id, category_id)
            SELECT $1, c.id FROM categories c WHERE c.slug = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(listing_id)
        .bind(slugs)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    async fn persist_changeset(
        &self,
        changeset: &IngestChangeset,
    ) -> Result<Vec<PersistedListing>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        self.upsert_categories_tx(&changeset.categories, &mut tx).await?;

        let mut persisted = Vec::with_capacity(changeset.listings.len());
        for listing in &changeset.listings {
            let slug = self.resolve_slug_tx(listing, &mut tx).await?;
            let (id, created) = self.upsert_listing_tx(&slug, listing, &mut tx).await?;
            if let Some(ref categories) = listing.categories {
                self.replace_categories_tx(id, categories, &mut tx).await?;
            }
            debug!(slug = %slug, created, "Upserted listing");
            persisted.push(PersistedListing { id, slug, created });
        }

        tx.commit().await?;
        Ok(persisted)
    }

    async fn upsert_categories(&self, categories: &[CategorySeed]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        self.upsert_categories_tx(categories, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, slug, label FROM categories ORDER BY slug")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.id,
                slug: r.slug,
                label: r.label,
            })
            .collect())
    }

    async fn find_listing_id_by_slug(&self, slug: &str) -> Result<Option<Uuid>, RepositoryError> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM listings WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get_listing(
        &self,
        slug: &str,
    ) -> Result<Option<ListingWithCategories>, RepositoryError> {
        let sql = format!(
            "SELECT {} {} WHERE l.slug = $1 GROUP BY l.id",
            LISTING_COLUMNS, LISTING_JOINS
        );
        let row: Option<ListingRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_listings_page(
        &self,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ListingWithCategories>, RepositoryError> {
        let sql = format!(
            "SELECT {} {} WHERE ($1::uuid IS NULL OR l.id > $1) GROUP BY l.id ORDER BY l.id LIMIT $2",
            LISTING_COLUMNS, LISTING_JOINS
        );
        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(after)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_listings(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
