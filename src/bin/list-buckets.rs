/*!
 * list-buckets - print every bucket visible to the given credentials
 */

use clap::Parser;
use s3_utils::cli::{self, OutputFormat, S3Args};
use s3_utils::{logging, s3};
use std::io::Write;

#[derive(Parser)]
#[command(name = "list-buckets")]
#[command(version, about = "List buckets of an S3-compatible store", long_about = None)]
struct Cli {
    #[command(flatten)]
    s3: S3Args,

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

    let buckets = s3::list_buckets(&client, &cancel).await?;

    let mut out = std::io::stdout().lock();
    for bucket in &buckets {
        cli::write_entry(&mut out, cli.output, "name", &bucket.name, bucket)?;
    }
    out.flush()?;
    Ok(())
}
