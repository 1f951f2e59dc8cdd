use clap::{CommandFactory, Parser};
use friendtracker::cli::{self, Cli};
use friendtracker::config::Config;
use friendtracker::{Error, FileStore, SystemClock};
use std::io;
use std::process::ExitCode;

fn setup_logging(config: &Config) {
    // A logger can only be installed once; a second attempt is harmless.
    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(&config.log_filter)
        .try_init();
}

fn try_main(cli: Cli, config: &Config) -> friendtracker::Result<()> {
    let mut stdout = io::stdout().lock();
    if cli.command.is_none() {
        return Cli::command().write_help(&mut stdout).map_err(Error::Output);
    }

    let mut store = FileStore::open(&config.data_dir)?;
    cli::run(cli.command, &mut store, &SystemClock, &mut stdout)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env().with_data_dir(cli.data_dir.clone());
    setup_logging(&config);

    match try_main(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
