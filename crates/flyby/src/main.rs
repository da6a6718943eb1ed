use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::Parser;
use flyby::cli::{self, Args};
use flyby::plugins::campaign::CampaignPlugin;

fn main() -> AppExit {
    let args = Args::parse();

    if args.list_integrators {
        cli::handle_list_integrators();
        return AppExit::Success;
    }

    let config = match cli::load_and_apply_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return AppExit::error();
        }
    };

    if let Some(path) = &args.write_default_config {
        return match config.save(path) {
            Ok(()) => {
                println!("Wrote configuration to {}", path.display());
                AppExit::Success
            }
            Err(e) => {
                eprintln!("Failed to write {}: {e}", path.display());
                AppExit::error()
            }
        };
    }

    println!(
        "flyby {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATE")
    );

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    App::new()
        .add_plugins((
            MinimalPlugins,
            LogPlugin {
                level,
                ..default()
            },
            CampaignPlugin::with_config(config),
        ))
        .run()
}
