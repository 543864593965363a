use clap::Args;

use crate::commands::CommandResult;
use markwise_core::config::{AppConfig, LoadOptions};
use markwise_core::{MarkupEstimator, OfferTerms, ReliabilityEstimator};
use markwise_db::{connect_with_settings, SqlOfferHistory};

#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[arg(long, help = "Customer number the offer is addressed to")]
    pub customer: String,
    #[arg(long, help = "Product identifier being offered")]
    pub product: String,
    #[arg(long, default_value_t = 1.0, help = "Requested order quantity")]
    pub quantity: f64,
    #[arg(long, default_value_t = 0.0, help = "Gross purchase price per unit")]
    pub purchase_price: f64,
    #[arg(long, default_value_t = 1.0, help = "Exchange rate applied to the purchase price")]
    pub rate: f64,
}

pub fn run(args: EstimateArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "estimate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "estimate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let correlation_id = format!("cli-{}", uuid::Uuid::new_v4());

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let history = SqlOfferHistory::new(pool.clone());
        let terms = OfferTerms::new(args.customer.clone(), args.product.clone())
            .with_quantity(args.quantity)
            .with_purchase_price(args.purchase_price)
            .with_exchange_rate(args.rate);

        // Neither estimator depends on the other's output.
        let markup_estimator = MarkupEstimator::new(history.clone());
        let reliability_estimator = ReliabilityEstimator::new(history);
        let (suggestion, reliability) = tokio::join!(
            markup_estimator.estimate(&terms),
            reliability_estimator.estimate(&terms.customer_nr, &terms.product_id),
        );

        tracing::info!(
            event_name = "estimator.markup.suggested",
            correlation_id = %correlation_id,
            customer_nr = %args.customer,
            product_id = %args.product,
            suggested_markup = suggestion.suggested_markup,
            probability = suggestion.probability,
            history_count = suggestion.history_count,
            reliability = reliability.score,
            "markup suggestion computed"
        );

        pool.close().await;
        Ok::<serde_json::Value, (&'static str, String, u8)>(serde_json::json!({
            "suggestion": suggestion,
            "reliability": reliability,
        }))
    });

    match result {
        Ok(data) => CommandResult::success_with_data("estimate", "markup suggestion computed", data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("estimate", error_class, message, exit_code)
        }
    }
}
