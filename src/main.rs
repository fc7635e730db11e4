mod cli;

use urlvideo::app::{App, RunOptions};
use urlvideo::{config, logging, menu, ui};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ui::error(&format!("Error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config_path, config) =
        tracing::subscriber::with_default(logging::bootstrap_subscriber(cli.verbose), || {
            config::load_config_or_default(cli.config.as_deref())
        });
    logging::init_logging(cli.verbose, Some(&config.logs_dir()));

    let options = RunOptions {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };
    let mut app = App::new(config_path, config, options);

    let Some(command) = cli.command else {
        return menu::run(&mut app);
    };

    match command {
        Commands::Setup => app.setup(),
        Commands::Video {
            quality,
            url,
            target,
        } => {
            ui::report(&url, &app.video(&quality, &url, &target.into()));
            Ok(())
        }
        Commands::Audio {
            format,
            bitrate,
            url,
            target,
        } => {
            ui::report(&url, &app.audio(&format, &bitrate, &url, &target.into()));
            Ok(())
        }
        Commands::Playlist {
            kind,
            quality,
            url,
            bitrate,
            target,
        } => {
            let result = app.playlist(kind.into(), &quality, &url, &bitrate, &target.into());
            ui::report(&url, &result);
            Ok(())
        }
        Commands::Batch {
            kind,
            option,
            file,
            target,
        } => app
            .batch(kind.into(), &option, &file, &target.into())
            .map(|_| ()),
        Commands::CheckTools => {
            ui::heading("Checking external tools");
            if app.check_tools() {
                ui::success("All required tools are available");
            } else {
                ui::warn("Some tools are missing. Install them to enable all features.");
            }
            Ok(())
        }
        Commands::Update => app.update(),
        Commands::Config { action } => match action {
            ConfigAction::Show => app.show_config(),
            ConfigAction::SetPath { dir } => {
                app.set_default_path(&dir)?;
                ui::success(&format!(
                    "Default download path set to {}",
                    app.config().download_root().display()
                ));
                Ok(())
            }
        },
    }
}
