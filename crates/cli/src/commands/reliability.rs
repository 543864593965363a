use clap::Args;

use crate::commands::CommandResult;
use markwise_core::config::{AppConfig, LoadOptions};
use markwise_core::{CustomerNr, ProductId, ReliabilityEstimator};
use markwise_db::{connect_with_settings, SqlOfferHistory};

#[derive(Debug, Args)]
pub struct ReliabilityArgs {
    #[arg(long, help = "Customer number the offer is addressed to")]
    pub customer: String,
    #[arg(long, help = "Product identifier being offered")]
    pub product: String,
}

pub fn run(args: ReliabilityArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "reliability",
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
                "reliability",
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
        let customer = CustomerNr(args.customer.clone());
        let product = ProductId(args.product.clone());

        let report = ReliabilityEstimator::new(history).estimate(&customer, &product).await;

        tracing::info!(
            event_name = "estimator.reliability.scored",
            correlation_id = %correlation_id,
            customer_nr = %args.customer,
            product_id = %args.product,
            reliability = report.score,
            direct_history = report.factors.direct_history,
            data_recency = report.factors.data_recency,
            data_consistency = report.factors.data_consistency,
            fallbacks_used = report.factors.fallbacks_used,
            "estimate reliability scored"
        );

        pool.close().await;
        Ok::<serde_json::Value, (&'static str, String, u8)>(serde_json::json!(report))
    });

    match result {
        Ok(data) => {
            CommandResult::success_with_data("reliability", "estimate reliability scored", data)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reliability", error_class, message, exit_code)
        }
    }
}
