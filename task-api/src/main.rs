use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("task_api=debug,tower_http=debug")),
        )
        .init();
    let config = task_api::config::Config::from_env()?;
    task_api::web::start_web_server(config).await
}
