/*!
 * upload - store a file (or stdin) as an object
 */

use anyhow::Context;
use clap::Parser;
use s3_utils::cli::{self, ObjectArgs, S3Args};
use s3_utils::s3::{self, Payload, UploadOptions};
use s3_utils::logging;
use std::path::PathBuf;
use tracing::debug;

const MIB: usize = 1024 * 1024;

#[derive(Parser)]
#[command(name = "upload")]
#[command(version, about = "Upload an object to an S3-compatible store", long_about = None)]
struct Cli {
    #[command(flatten)]
    s3: S3Args,

    #[command(flatten)]
    target: ObjectArgs,

    /// File to upload; reads stdin when omitted
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Part size in MiB for multipart uploads (minimum 5)
    #[arg(long, default_value_t = 5)]
    part_size_mib: usize,

    /// Parts uploaded in parallel (1-16)
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.s3.verbosity);
    cli::exit_with(run(cli).await);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = cli.s3.client(true)?;
    let options = UploadOptions::new(cli.part_size_mib.saturating_mul(MIB), cli.concurrency);
    options.validate()?;

    let payload = match &cli.file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open {}", path.display()))?;
            Payload::reader(file)
        }
        None => Payload::reader(tokio::io::stdin()),
    };

    let cancel = cli::cancel_on_ctrl_c();
    let summary = s3::upload(
        &client,
        &cli.target.bucket,
        &cli.target.key,
        payload,
        &options,
        &cancel,
    )
    .await?;

    debug!(
        key = %cli.target.key,
        bytes = summary.bytes,
        parts = summary.parts,
        "upload {} completed",
        cli.target.key
    );
    Ok(())
}
