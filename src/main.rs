#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = campus_lms::run().await {
        eprintln!("campus-lms fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
