#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = sigea_rust::run().await {
        eprintln!("sigea-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
