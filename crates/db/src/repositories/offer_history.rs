use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use markwise_core::domain::offer::{CustomerNr, HistoricalOffer, ProductId};
use markwise_core::history::{HistoryError, OfferHistory, OutcomeFilter};
use sqlx::{sqlite::SqliteRow, Row};

use crate::DbPool;

/// Columns shared by every history query. `markup` prefers the precomputed
/// column and otherwise derives the percentage in SQL; a zero purchase basis
/// leaves it NULL so downstream filters can exclude it explicitly.
const OFFER_COLUMNS: &str = r#"
    offer_id,
    customer_nr,
    product_id,
    accepted,
    box_price,
    gross_purchase_price,
    exchange_rate,
    quantity,
    COALESCE(
        calculated_markup_percentage,
        CASE
            WHEN gross_purchase_price * exchange_rate != 0.0
            THEN (box_price - gross_purchase_price * exchange_rate)
                 / (gross_purchase_price * exchange_rate) * 100.0
        END
    ) AS markup,
    encoding_date
"#;

/// SQLite-backed offer history.
///
/// Every query is bounded, parameterized, and ordered by encoding date
/// descending (newest first; undated rows sort last).
#[derive(Clone)]
pub struct SqlOfferHistory {
    pool: DbPool,
}

impl SqlOfferHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        scope_clause: &str,
        bindings: &[&str],
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE {scope_clause}{} \
             ORDER BY encoding_date DESC LIMIT ?",
            outcome_clause(filter)
        );

        let mut query = sqlx::query(&sql);
        for binding in bindings {
            query = query.bind(*binding);
        }
        query = query.bind(i64::from(limit));

        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(offer_from_row).collect()
    }
}

#[async_trait]
impl OfferHistory for SqlOfferHistory {
    async fn pair_history(
        &self,
        customer: &CustomerNr,
        product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        self.fetch(
            "customer_nr = ? AND product_id = ?",
            &[customer.0.as_str(), product.0.as_str()],
            filter,
            limit,
        )
        .await
    }

    async fn product_history(
        &self,
        product: &ProductId,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        self.fetch("product_id = ?", &[product.0.as_str()], filter, limit).await
    }

    async fn customer_history(
        &self,
        customer: &CustomerNr,
        filter: OutcomeFilter,
        limit: u32,
    ) -> Result<Vec<HistoricalOffer>, HistoryError> {
        self.fetch("customer_nr = ?", &[customer.0.as_str()], filter, limit).await
    }
}

fn outcome_clause(filter: OutcomeFilter) -> &'static str {
    match filter {
        OutcomeFilter::Any => "",
        OutcomeFilter::AcceptedOnly => " AND accepted = 1",
    }
}

fn offer_from_row(row: &SqliteRow) -> Result<HistoricalOffer, HistoryError> {
    let accepted: i64 = row.try_get("accepted").map_err(db_error)?;
    let markup: Option<f64> = row.try_get("markup").map_err(db_error)?;
    let encoding_date: Option<String> = row.try_get("encoding_date").map_err(db_error)?;
    let product_id: Option<String> = row.try_get("product_id").map_err(db_error)?;

    Ok(HistoricalOffer {
        offer_id: row.try_get("offer_id").map_err(db_error)?,
        customer_nr: CustomerNr(row.try_get("customer_nr").map_err(db_error)?),
        product_id: product_id.map(ProductId),
        accepted: accepted != 0,
        box_price: row.try_get("box_price").map_err(db_error)?,
        gross_purchase_price: row.try_get("gross_purchase_price").map_err(db_error)?,
        exchange_rate: row.try_get("exchange_rate").map_err(db_error)?,
        quantity: row.try_get("quantity").map_err(db_error)?,
        markup: markup.filter(|value| value.is_finite()),
        encoded_at: encoding_date.as_deref().and_then(parse_encoding_date),
    })
}

/// Accepts full RFC 3339 timestamps and bare ISO dates; anything else is
/// treated as undated rather than failing the whole window.
fn parse_encoding_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn db_error(error: sqlx::Error) -> HistoryError {
    HistoryError::QueryFailed { reason: format!("database error: {error}") }
}
