use clap::Parser;
use dehasher_cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = dehasher_cli::run(cli).await {
        eprintln!("dehasher error: {error:#}");
        std::process::exit(1);
    }
}
