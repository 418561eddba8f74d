use anyhow::Result;
use clap::Parser;
use docsearch::{run, Cli};
use std::io::{self, BufWriter, Write};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // logs go to stderr so stdout stays machine readable
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}
