//! Binary entry point for the Tactix session server.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_tactix::init().await
}
