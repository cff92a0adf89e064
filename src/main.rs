use clap::Parser;
use weather_analyzer::cli::{run, Cli};
use weather_analyzer::error::Result;
use weather_analyzer::utils::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    run(cli)
}
