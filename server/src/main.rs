use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    racer_relay::run_server().await
}
