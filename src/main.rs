use plotmap::server::{self, ServerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    if let Err(e) = server::serve(config).await {
        tracing::error!(error = %e, "plot registry server failed");
        std::process::exit(1);
    }
}
