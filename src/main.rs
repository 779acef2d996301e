#[tokio::main]
async fn main() {
    match uc_cli::run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("update-client: {e:#}");
            std::process::exit(1);
        }
    }
}
