use crate::commands::CommandResult;
use markwise_core::config::{AppConfig, LoadOptions};
use markwise_db::{connect_with_settings, migrations, DemoOfferDataset};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = DemoOfferDataset::load(&pool)
            .await
            .map_err(|error| ("seed_load", error.to_string(), 6u8))?;

        let verification = DemoOfferDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verify", error.to_string(), 6u8))?;
        if !verification.passed() {
            let failed = verification
                .checks
                .iter()
                .filter(|check| !check.passed)
                .map(|check| check.name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(("seed_contract", format!("seed verification failed: {failed}"), 7u8));
        }

        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(seeded.pairs_seeded.len())
    });

    match result {
        Ok(pair_count) => CommandResult::success(
            "seed",
            format!("loaded demo offers for {pair_count} customer/product pairs"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
