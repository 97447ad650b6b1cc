use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use shared::ModuleConfig;

use api::config::ServerConfig;
use api::observability::Observability;
use api::routes;

#[derive(Parser, Debug)]
#[command(name = "api", version, about = "Form dispatch server")]
struct Args {
    /// Module configuration file (overrides MODULE_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides API_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Validate the module configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(path) = args.config {
        config.module_config_path = path;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let obs = Observability::init(config.log_format)?;
    config.log_summary();

    let module = ModuleConfig::load(&config.module_config_path)?;
    if args.check {
        tracing::info!(
            mappings = module.mappings.len(),
            form_beans = module.form_beans.len(),
            "Module configuration is valid"
        );
        return Ok(());
    }

    let app = routes::build_router(api::build_state(module, obs.registry));

    let addr = config.socket_addr()?;
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
