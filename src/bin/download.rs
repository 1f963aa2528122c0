/*!
 * download - write an object's bytes to stdout
 */

use clap::Parser;
use s3_utils::cli::{self, ObjectArgs, S3Args};
use s3_utils::{logging, s3};
use tracing::debug;

#[derive(Parser)]
#[command(name = "download")]
#[command(version, about = "Download an object from an S3-compatible store to stdout", long_about = None)]
struct Cli {
    #[command(flatten)]
    s3: S3Args,

    #[command(flatten)]
    target: ObjectArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.s3.verbosity);
    cli::exit_with(run(cli).await);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = cli.s3.client(true)?;
    let cancel = cli::cancel_on_ctrl_c();

    let mut stdout = tokio::io::stdout();
    let bytes = s3::download(
        &client,
        &cli.target.bucket,
        &cli.target.key,
        &mut stdout,
        &cancel,
    )
    .await?;

    debug!(bytes, "download {} completed", cli.target.key);
    Ok(())
}
