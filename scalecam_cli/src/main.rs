//! `scalecam`: smart scale that publishes weight changes and uploads photos.

mod assemble;
mod cli;
mod commands;
mod error_fmt;
mod logging;

use std::rc::Rc;

use clap::Parser;
use scalecam_config::{Config, Credentials, LoadCellCalibration};
use scalecam_core::ScaleError;
use scalecam_traits::{Clock, SystemClock};

use crate::assemble::{SimKnobs, build_device};
use crate::cli::{Cli, Commands, JSON_MODE, json_mode};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if json_mode() {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::error!(error = %e, "exiting with error");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre already installed: {e}");
    }

    let cfg = load_config(&cli)?;
    let calibration = load_calibration(&cli)?;
    let _log_guard = logging::init_tracing(&cli.log_level, cli.json, &cfg.logging)?;

    let creds = Credentials::from_env();
    tracing::debug!(?creds, kind = cfg.device.kind.as_str(), "configuration loaded");

    if let Commands::Health = cli.cmd {
        commands::health(&cfg, &creds, &cli.config);
        return Ok(());
    }

    let knobs = SimKnobs::from_env();
    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let mut device = build_device(&cfg, calibration, &creds, &knobs, clock, cli.json)?;

    match cli.cmd {
        Commands::Run { ticks } => commands::run(&mut device, ticks, cli.json).map(|_| ()),
        Commands::Capture => commands::capture(&mut device, cli.json),
        Commands::SelfCheck => commands::self_check(&mut device, cli.json),
        Commands::Health => Ok(()),
    }
}

fn load_config(cli: &Cli) -> eyre::Result<Config> {
    scalecam_config::load_file(&cli.config)
        .map_err(|e| eyre::Report::new(ScaleError::Config(format!("{e:#}"))))
}

fn load_calibration(cli: &Cli) -> eyre::Result<Option<LoadCellCalibration>> {
    let Some(path) = cli.calibration.as_deref() else {
        return Ok(None);
    };
    let cal = scalecam_config::load_calibration_csv(path)
        .map_err(|e| eyre::Report::new(ScaleError::Config(format!("{e:#}"))))?;
    Ok(Some(cal))
}
