#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cosmea_client::run().await
}
