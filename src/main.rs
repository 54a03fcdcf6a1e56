use lexicon_rater::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}
