#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use rfp_schedule::{PlannerConfig, http_api, load_config};

    env_logger::init();

    let addr: SocketAddr = std::env::var("RFP_SCHEDULE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = match std::env::var("RFP_SCHEDULE_CONFIG") {
        Ok(path) => load_config(path)?,
        Err(_) => PlannerConfig::default(),
    };

    log::info!("rfp-schedule HTTP API listening on http://{addr}");
    http_api::serve(addr, config).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
