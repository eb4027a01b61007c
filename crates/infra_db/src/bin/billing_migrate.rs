//! Shop Billing - migration runner
//!
//! Applies the embedded SQL migrations and reports adapter health.
//!
//! # Usage
//!
//! ```bash
//! BILLING__DATABASE__URL=postgres://localhost/shop_billing cargo run --bin billing-migrate
//! ```
//!
//! # Environment Variables
//!
//! * `BILLING__DATABASE__URL` - PostgreSQL connection string
//! * `BILLING__DATABASE__MAX_CONNECTIONS` - Pool size (default: 10)
//! * `BILLING__LOG_LEVEL` - Log filter (default: info)
//! * `BILLING__LOG_FORMAT` - `pretty` or `json` (default: pretty)

use anyhow::{bail, Context};
use core_kernel::AdapterHealth;
use infra_db::{init_tracing, run_migrations, AppSettings, BillingRuntime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::load().context("loading settings")?;
    init_tracing(&settings.log_level, settings.log_format);

    tracing::info!(
        prefix = %settings.billing.bill_number_prefix,
        currency = %settings.billing.currency,
        "Starting billing migrations"
    );

    let runtime = BillingRuntime::connect(&settings)
        .await
        .context("connecting to database")?;

    run_migrations(&runtime.pool)
        .await
        .context("applying migrations")?;

    let mut unhealthy = 0;
    for result in runtime.health().await {
        match result.status {
            AdapterHealth::Healthy => tracing::info!(
                adapter = %result.adapter_id,
                latency_ms = result.latency_ms,
                "Adapter healthy"
            ),
            _ => {
                unhealthy += 1;
                tracing::error!(
                    adapter = %result.adapter_id,
                    latency_ms = result.latency_ms,
                    message = result.message.as_deref().unwrap_or(""),
                    "Adapter unhealthy"
                );
            }
        }
    }

    runtime.pool.close().await;

    if unhealthy > 0 {
        bail!("{} adapter(s) failed their health check", unhealthy);
    }
    tracing::info!("Database ready");
    Ok(())
}
