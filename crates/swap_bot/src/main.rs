use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(swap_bot::DEFAULT_CONFIG_PATH));
    swap_bot::run(&config_path).await
}
