use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    racer_client::run_client().await
}
