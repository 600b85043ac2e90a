use order_service::{config::OrderConfig, Application};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OrderConfig::load()?;

    init_tracing(
        "order-service",
        &config.server.log_level,
        config.server.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
