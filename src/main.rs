use clap::ArgMatches;
use std::error::Error;

use bhxh_portal::bootstrap::app_bootstrap::{AppBootstrap, AppConfig};
use bhxh_portal::bootstrap::command_registry::{build_app, handle_command};
use bhxh_portal::cmd::handle_version_command;
use bhxh_portal::comm::config::get_global_config_manager;
use bhxh_portal::{init_commands, init_routes};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_commands();

    let matches: ArgMatches = build_app().get_matches();

    match matches.subcommand() {
        Some(("server", sub_matches)) => {
            handle_server_command(sub_matches).await?;
        }
        Some(("version", _)) => {
            handle_version_command();
        }
        Some((command_name, sub_matches)) => {
            if let Err(e) = handle_command(command_name, sub_matches) {
                eprintln!("Lỗi khi xử lý lệnh '{}': {}", command_name, e);
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Lệnh không hợp lệ, dùng --help để xem danh sách lệnh");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn handle_server_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    init_routes();

    let config_manager = get_global_config_manager()?;
    config_manager.validate_required_config()?;

    // CLI arguments override file and environment configuration.
    let host = matches
        .get_one::<String>("host")
        .cloned()
        .unwrap_or_else(|| config_manager.get_or("server.host", "0.0.0.0".to_string()));
    let port = matches
        .get_one::<String>("port")
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or_else(|| config_manager.get_or("server.port", 3000u16));
    let workers = matches
        .get_one::<String>("workers")
        .and_then(|w| w.parse::<usize>().ok())
        .or_else(|| config_manager.get::<usize>("server.workers").ok());
    let debug = config_manager.get_or("server.debug", false);

    let config = AppConfig {
        host,
        port,
        workers,
        debug,
    };
    AppBootstrap::new().with_config(config).run().await?;

    Ok(())
}
