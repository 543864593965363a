use clap::Args;

use crate::commands::CommandResult;
use markwise_core::config::{AppConfig, LoadOptions};
use markwise_core::{OfferTerms, ProbabilityEstimator};
use markwise_db::{connect_with_settings, SqlOfferHistory};

#[derive(Debug, Args)]
pub struct ProbabilityArgs {
    #[arg(long, help = "Customer number the offer is addressed to")]
    pub customer: String,
    #[arg(long, help = "Product identifier being offered")]
    pub product: String,
    #[arg(long, help = "Proposed markup percentage to score")]
    pub markup: f64,
    #[arg(long, default_value_t = 1.0, help = "Requested order quantity")]
    pub quantity: f64,
    #[arg(long, default_value_t = 0.0, help = "Gross purchase price per unit")]
    pub purchase_price: f64,
    #[arg(long, default_value_t = 1.0, help = "Exchange rate applied to the purchase price")]
    pub rate: f64,
}

pub fn run(args: ProbabilityArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "probability",
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
                "probability",
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

        let probability = ProbabilityEstimator::new(history).estimate(&terms, args.markup).await;

        tracing::info!(
            event_name = "estimator.probability.scored",
            correlation_id = %correlation_id,
            customer_nr = %args.customer,
            product_id = %args.product,
            proposed_markup = args.markup,
            probability,
            "acceptance probability scored"
        );

        pool.close().await;
        Ok::<serde_json::Value, (&'static str, String, u8)>(serde_json::json!({
            "proposed_markup": args.markup,
            "probability": probability,
        }))
    });

    match result {
        Ok(data) => {
            CommandResult::success_with_data("probability", "acceptance probability scored", data)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("probability", error_class, message, exit_code)
        }
    }
}
