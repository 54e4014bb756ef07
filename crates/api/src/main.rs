use anyhow::Context;

use courierflow_infra::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    courierflow_observability::init();

    let config = EngineConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;

    let app = courierflow_api::app::build_app(config).context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
