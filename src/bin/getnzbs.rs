use std::process::ExitCode;

use clap::Parser;

use getnzbs::tui::{self, Outcome};
use getnzbs::{AppConfig, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = getnzbs::logging::init(cli.log_file.as_deref()) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let config = match AppConfig::discover(cli.config.as_deref(), &AppConfig::user_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };
    let options = match cli.run_options(&config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match tui::run(options) {
        Ok(Outcome::Quit) => ExitCode::SUCCESS,
        Ok(Outcome::NoResults) => {
            println!("No Results.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
