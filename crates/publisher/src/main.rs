//! Interactive configuration check: send one sample notification using the
//! global defaults from the environment and report the result.

use tracing_subscriber::EnvFilter;

use notifo_common::config::GlobalConfig;
use notifo_publisher::{Validation, send_sample_notification};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("notifo_publisher=debug,notifo_client=debug")
        }))
        .init();

    let config = GlobalConfig::from_env()?;
    tracing::info!(service_user = %config.service_user, "Sending sample notification");

    match send_sample_notification(&config.service_user, &config.api_token, &config.user_names)
        .await
    {
        Validation::Ok => {
            tracing::info!("Sample notification delivered");
            Ok(())
        }
        Validation::Error(detail) => {
            tracing::error!(%detail, "Sample notification failed");
            std::process::exit(1);
        }
    }
}
