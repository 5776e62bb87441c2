use hemmer_provider_random::{init_logging, serve_with_options, RandomProvider, ServeOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let options = ServeOptions::from_env()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting random provider");
    serve_with_options(RandomProvider::new(), options).await
}
