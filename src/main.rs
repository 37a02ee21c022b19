use clap::Parser;
use tracing::{error, info};
use tvhguide::{config::Settings, create_app, setup};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Listen port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings = Settings::load(&args.config)?;
    info!("Configuration loaded from {}: {:?}", args.config, settings);

    let (client, server_info) = match setup::connect(&settings.tvheadend).await {
        Ok(v) => v,
        Err(e) => {
            error!("Tvheadend setup failed: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Tvheadend server {} ready (api_version {})",
        server_info.name.as_deref().unwrap_or("<unnamed>"),
        server_info.api_version
    );

    let app = create_app(client, settings.index_options(), settings.display_options());

    let port = args.port.unwrap_or(settings.listen.port);
    let addr = format!("{}:{}", settings.listen.host, port);
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
