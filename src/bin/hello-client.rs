use std::time::Duration;

use clap::Parser;

#[derive(Parser)]
#[command(name = "hello-client")]
#[command(about = "Continuously request a greeting from the hello service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://hello.service.consul:8080/hello")]
    url: String,

    /// Keep requesting on an interval instead of once.
    #[arg(long = "loop", default_value_t = true, action = clap::ArgAction::Set)]
    repeat: bool,

    #[arg(long, default_value_t = 2)]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Err(e) = request_hello(&client, &cli.url).await {
            tracing::error!(url = %cli.url, error = %e, "Failed to reach hello service");
        }
        if !cli.repeat {
            break;
        }
    }

    Ok(())
}

async fn request_hello(client: &reqwest::Client, url: &str) -> Result<(), reqwest::Error> {
    let res = client.get(url).send().await?.error_for_status()?;
    let body = res.text().await?;
    tracing::info!("{} says: {}", url, body.trim_end());
    Ok(())
}
