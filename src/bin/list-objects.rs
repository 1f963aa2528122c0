/*!
 * list-objects - print the keys of a bucket, optionally under a prefix
 */

use clap::Parser;
use futures::TryStreamExt;
use s3_utils::cli::{self, BucketArgs, OutputFormat, S3Args};
use s3_utils::{logging, s3};
use std::io::Write;

#[derive(Parser)]
#[command(name = "list-objects")]
#[command(version, about = "List objects of a bucket in an S3-compatible store", long_about = None)]
struct Cli {
    #[command(flatten)]
    s3: S3Args,

    #[command(flatten)]
    target: BucketArgs,

    /// Only list keys starting with this prefix
    #[arg(long, env = "PREFIX")]
    prefix: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.s3.verbosity);
    cli::exit_with(run(cli).await);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = cli.s3.client(false)?;
    let cancel = cli::cancel_on_ctrl_c();

    let mut objects = s3::list_objects(
        &client,
        &cli.target.bucket,
        cli.prefix.as_deref(),
        &cancel,
    );

    // Entries are printed as pages arrive
    let mut out = std::io::stdout().lock();
    while let Some(object) = objects.try_next().await? {
        cli::write_entry(&mut out, cli.output, "key", &object.key, &object)?;
    }
    out.flush()?;
    Ok(())
}
