#[tokio::main]
async fn main() -> anyhow::Result<()> {
    flock_server::run().await
}
