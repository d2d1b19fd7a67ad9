use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    phototagger::run().await
}
