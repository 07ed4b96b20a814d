use clap::Parser;
use log::{error, info};

use content_mapper::cli::{Cli, Command};
use content_mapper::logging;
use content_mapper::orchestrator;
use content_mapper::util::envfile::{load_dotenv_if_present, write_env_template};

fn main() {
    // .env must be in place before clap reads env-backed flags
    let dotenv = load_dotenv_if_present();
    logging::init_from_env();
    if let Err(e) = dotenv {
        error!("failed to read .env: {:#}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    if let Some(Command::EnvTemplate { ref path }) = cli.command {
        match write_env_template(path) {
            Ok(()) => {
                println!(
                    "Wrote {}. Copy to .env and edit values as needed.",
                    path.display()
                );
                return;
            }
            Err(e) => {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }

    let cfg = match cli.to_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("configuration error: {}", e);
            std::process::exit(2);
        }
    };
    info!(
        "profile={}, layout={}, format={}",
        cfg.input.profile, cfg.mapping.layout, cfg.export.format
    );

    if let Err(e) = orchestrator::run(&cfg) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
