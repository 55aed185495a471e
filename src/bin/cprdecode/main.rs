use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use clap::{ArgGroup, Parser};
use rusty_compact_expfmt::DecodeOptions;
use tracing::error;

mod file_mode;
mod http_mode;
mod logging;

use self::logging::{fatal_and_exit, initialize_logging};

#[derive(Parser, Debug)]
#[command(
    name = "cprdecode",
    version,
    about = "Decode compact Prometheus exposition payloads",
    long_about = "Turns payloads made of an optional metadata block and a value block back into \
                  the Prometheus text format, either from a file or by proxying an HTTP endpoint."
)]
#[command(group(ArgGroup::new("mode").required(true).args(["file", "remote_url"])))]
struct Cli {
    /// Payload file to decode and print.
    #[arg(short = 'f', long, env = "CPRDECODE_FILE", conflicts_with = "remote_url")]
    file: Option<PathBuf>,

    /// URL of the endpoint producing compact payloads.
    #[arg(short = 's', long, env = "CPRDECODE_REMOTE_URL", requires = "port")]
    remote_url: Option<String>,

    /// Local port serving the decoded payloads.
    #[arg(short = 'p', long, env = "CPRDECODE_PORT", requires = "remote_url")]
    port: Option<u16>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "CPRDECODE_LISTEN_ADDR", default_value = "0.0.0.0")]
    listen_addr: IpAddr,

    /// End every histogram bucket line with a newline.
    ///
    /// By default bucket lines run together, as existing
    /// consumers of this output expect.
    #[arg(long, env = "CPRDECODE_BUCKET_NEWLINES")]
    bucket_newlines: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(None) {
        fatal_and_exit(format!("failed to initialize logging: {}", e));
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = DecodeOptions {
        bucket_newlines: cli.bucket_newlines,
    };

    match (cli.file, cli.remote_url, cli.port) {
        (Some(path), _, _) => file_mode::run(&path, &options).await,
        (None, Some(remote_url), Some(port)) => {
            let listen_addr = SocketAddr::new(cli.listen_addr, port);
            http_mode::run(remote_url, listen_addr, options).await
        }
        _ => anyhow::bail!("either --file, or --remote-url with --port, is required"),
    }
}
