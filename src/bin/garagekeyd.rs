#[tokio::main]
async fn main() -> Result<(), ()> {
    garagekey::provider::main().await
}
