use sqlx::Executor;

use crate::connection::DbPool;

/// Canonical demo pairs and the per-pair expectations `verify` checks.
const SEED_PAIRS: &[SeedPairContract] = &[
    SeedPairContract {
        customer_nr: "10042",
        product_id: "4711",
        expected_count: 6,
        expected_accepted: 4,
        description: "direct pair history with a NULL-markup and a precomputed-markup row",
    },
    SeedPairContract {
        customer_nr: "10042",
        product_id: "5833",
        expected_count: 2,
        expected_accepted: 1,
        description: "second product for the same customer",
    },
    SeedPairContract {
        customer_nr: "20107",
        product_id: "4711",
        expected_count: 3,
        expected_accepted: 2,
        description: "product-wide history from another customer",
    },
    SeedPairContract {
        customer_nr: "20339",
        product_id: "9001",
        expected_count: 2,
        expected_accepted: 1,
        description: "customer-only fallback history",
    },
];

#[derive(Debug)]
struct SeedPairContract {
    customer_nr: &'static str,
    product_id: &'static str,
    expected_count: i64,
    expected_accepted: i64,
    description: &'static str,
}

/// Deterministic demo dataset for the estimator branches.
pub struct DemoOfferDataset;

#[derive(Debug)]
pub struct SeedPairInfo {
    pub customer_nr: &'static str,
    pub product_id: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub pairs_seeded: Vec<SeedPairInfo>,
}

#[derive(Debug)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub checks: Vec<VerificationCheck>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

impl DemoOfferDataset {
    /// SQL fixture content for the demo offers.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_offers.sql");

    /// Load the demo dataset. Re-loading replaces the same rows, so the call
    /// is idempotent.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let pairs_seeded = SEED_PAIRS
            .iter()
            .map(|pair| SeedPairInfo {
                customer_nr: pair.customer_nr,
                product_id: pair.product_id,
                description: pair.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { pairs_seeded })
    }

    /// Verify that the seeded rows match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, sqlx::Error> {
        let mut checks = Vec::new();

        for pair in SEED_PAIRS {
            let label = format!("{}/{}", pair.customer_nr, pair.product_id);

            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM offers WHERE customer_nr = ?1 AND product_id = ?2",
            )
            .bind(pair.customer_nr)
            .bind(pair.product_id)
            .fetch_one(pool)
            .await?;
            checks.push(VerificationCheck {
                name: format!("{label} count"),
                passed: count == pair.expected_count,
            });

            let accepted: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM offers WHERE customer_nr = ?1 AND product_id = ?2 AND accepted = 1",
            )
            .bind(pair.customer_nr)
            .bind(pair.product_id)
            .fetch_one(pool)
            .await?;
            checks.push(VerificationCheck {
                name: format!("{label} accepted"),
                passed: accepted == pair.expected_accepted,
            });
        }

        // The zero-purchase-basis row must stay NULL-markup after derivation
        // and the precomputed column must survive as-is.
        let null_basis: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM offers
             WHERE offer_id = 'off-10042-4711-005' AND gross_purchase_price = 0.0",
        )
        .fetch_one(pool)
        .await?;
        checks.push(VerificationCheck {
            name: "zero-purchase-basis row".to_string(),
            passed: null_basis == 1,
        });

        let precomputed: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM offers
             WHERE offer_id = 'off-10042-4711-006' AND calculated_markup_percentage = 40.0",
        )
        .fetch_one(pool)
        .await?;
        checks.push(VerificationCheck {
            name: "precomputed markup row".to_string(),
            passed: precomputed == 1,
        });

        Ok(VerificationResult { checks })
    }
}
