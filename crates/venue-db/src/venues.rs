//! PostgreSQL venue store.
//!
//! The venue table is expected to carry `id`, `city`, `country`,
//! `enrichment_status` and the text signal columns read into
//! [`CandidateRecord`]. Only `city` and `country` are ever written.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use venue_core::{CandidateRecord, Error, Result, UpdateIntent, VenueStore};

use crate::pool::log_pool_metrics;

/// Row predicate for records that still need enrichment.
const PENDING_PREDICATE: &str =
    "enrichment_status = 'OK' AND (city IS NULL OR country IS NULL)";

/// Row predicate for every record that may be enriched.
const ELIGIBLE_PREDICATE: &str = "enrichment_status = 'OK'";

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: String,
    name: Option<String>,
    alt_name: Option<String>,
    address: Option<String>,
    website_url: Option<String>,
    domain: Option<String>,
    linkedin_url: Option<String>,
    phone: Option<String>,
    ticket_vendor: Option<String>,
    ticket_vendor_source: Option<String>,
    notes: Option<String>,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        CandidateRecord {
            id: row.id,
            name: row.name,
            alt_name: row.alt_name,
            address: row.address,
            website_url: row.website_url,
            domain: row.domain,
            linkedin_url: row.linkedin_url,
            phone: row.phone,
            ticket_vendor: row.ticket_vendor,
            ticket_vendor_source: row.ticket_vendor_source,
            notes: row.notes,
        }
    }
}

/// Quote a possibly schema-qualified table name.
///
/// Each dot-separated part must be a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn quote_table_name(table: &str) -> Result<String> {
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 {
        return Err(Error::Config(format!("Invalid venue table name: {}", table)));
    }
    let valid = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if !parts.iter().copied().all(valid) {
        return Err(Error::Config(format!("Invalid venue table name: {}", table)));
    }
    Ok(parts
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join("."))
}

/// PostgreSQL implementation of [`VenueStore`].
pub struct PgVenueStore {
    pool: Pool<Postgres>,
    table: String,
    quoted: String,
    /// SQL type of the `id` column, looked up on first update.
    id_type: OnceCell<String>,
}

impl PgVenueStore {
    /// Create a store over `table`, rejecting names that are not plain identifiers.
    pub fn new(pool: Pool<Postgres>, table: &str) -> Result<Self> {
        let quoted = quote_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
            quoted,
            id_type: OnceCell::new(),
        })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Declared type of the `id` column, e.g. `text`, `bigint` or `uuid`.
    pub async fn id_type(&self) -> Result<&str> {
        let id_type = self
            .id_type
            .get_or_try_init(|| async {
                let found: Option<String> = sqlx::query_scalar(
                    "SELECT format_type(a.atttypid, a.atttypmod) FROM pg_attribute a \
                     WHERE a.attrelid = $1::regclass AND a.attname = 'id' AND NOT a.attisdropped",
                )
                .bind(&self.quoted)
                .fetch_optional(&self.pool)
                .await?;
                found.ok_or_else(|| {
                    Error::Config(format!("Venue table {} has no id column", self.table))
                })
            })
            .await?;
        Ok(id_type.as_str())
    }
}

#[async_trait]
impl VenueStore for PgVenueStore {
    async fn fetch_candidates(
        &self,
        limit: usize,
        overwrite: bool,
    ) -> Result<Vec<CandidateRecord>> {
        let predicate = if overwrite {
            ELIGIBLE_PREDICATE
        } else {
            PENDING_PREDICATE
        };
        let sql = format!(
            "SELECT id::text AS id, name, alt_name, address, website_url, domain, \
             linkedin_url, phone, ticket_vendor, ticket_vendor_source, notes \
             FROM {} WHERE {} ORDER BY random() LIMIT $1",
            self.quoted, predicate
        );

        let rows: Vec<CandidateRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            subsystem = "database",
            component = "venues",
            op = "fetch_candidates",
            table = %self.table,
            limit,
            overwrite,
            fetched = rows.len(),
            "Fetched candidates"
        );
        Ok(rows.into_iter().map(CandidateRecord::from).collect())
    }

    async fn apply_conditional_update(
        &self,
        intents: &[UpdateIntent],
        overwrite: bool,
    ) -> Result<u64> {
        if intents.is_empty() {
            return Ok(0);
        }
        let start = Instant::now();
        let id_type = self.id_type().await?;

        let mut ids = Vec::with_capacity(intents.len());
        let mut cities = Vec::with_capacity(intents.len());
        let mut countries = Vec::with_capacity(intents.len());
        for intent in intents {
            ids.push(intent.id.clone());
            cities.push(intent.city.clone());
            countries.push(intent.country.clone());
        }

        // Empty values never overwrite; unchanged values never count.
        // The id array is cast to the column type so the key index applies.
        let sql = format!(
            r#"
            UPDATE {table} AS v
            SET city = COALESCE(NULLIF(u.city, ''), v.city),
                country = COALESCE(NULLIF(u.country, ''), v.country)
            FROM UNNEST($1::text[], $2::text[], $3::text[]) AS u(id, city, country)
            WHERE v.id = u.id::{id_type}
              AND (
                (NULLIF(u.city, '') IS NOT NULL AND v.city IS DISTINCT FROM u.city)
                OR (NULLIF(u.country, '') IS NOT NULL AND v.country IS DISTINCT FROM u.country)
              )
            "#,
            table = self.quoted,
            id_type = id_type
        );

        let result = sqlx::query(&sql)
            .bind(&ids)
            .bind(&cities)
            .bind(&countries)
            .execute(&self.pool)
            .await?;

        let affected = result.rows_affected();
        info!(
            subsystem = "database",
            component = "venues",
            op = "apply_conditional_update",
            table = %self.table,
            submitted = intents.len(),
            affected,
            overwrite,
            duration_ms = start.elapsed().as_millis() as u64,
            "Conditional update applied"
        );
        Ok(affected)
    }

    async fn count_pending(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", self.quoted, PENDING_PREDICATE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        log_pool_metrics(&self.pool);
        Ok(count.max(0) as u64)
    }

    fn describe(&self) -> String {
        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_and_qualified_names() {
        assert_eq!(quote_table_name("venues").unwrap(), "\"venues\"");
        assert_eq!(
            quote_table_name("crm.venue_master").unwrap(),
            "\"crm\".\"venue_master\""
        );
    }

    #[test]
    fn test_reject_injection_and_malformed_names() {
        for bad in [
            "",
            "venues; DROP TABLE venues",
            "a.b.c",
            "1venues",
            "ven\"ues",
            "crm.",
        ] {
            assert!(
                matches!(quote_table_name(bad), Err(Error::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
