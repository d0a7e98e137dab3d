mod cli;

use clap::Parser;
use cli::Cli;
use simple_http::server::Server;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let server = Server::builder()
        .address((cli.host.as_str(), cli.port))
        .read_timeout(cli.read_timeout())
        .write_timeout(cli.write_timeout())
        .max_body_size(cli.max_body_size)
        .build()?;

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("receive ctrl-c, shutting down"),
            Err(e) => error!(cause = %e, "can't listen for ctrl-c, shutting down"),
        }
    };

    server.run(shutdown).await?;
    Ok(())
}
