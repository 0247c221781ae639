use storefront_ranker::api::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run_server().await
}
