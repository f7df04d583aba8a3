//! CLI commands contributed by the declaration module.

use crate::bootstrap::command_registry::CommandModule;
use crate::comm::config::get_global_config_manager;
use crate::db;
use crate::modules::declaration::service::batch_service;
use clap::Command;

/// Offline maintenance commands for declaration data.
pub struct DeclarationCommands;

impl CommandModule for DeclarationCommands {
    fn module_name(&self) -> &'static str {
        "declaration"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![Command::new("reconcile-totals")
            .about("Tính lại tổng tiền của tất cả đợt kê khai từ hồ sơ hiện có")]
    }

    fn handle_command(
        &self,
        command_name: &str,
        _matches: &clap::ArgMatches,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match command_name {
            "reconcile-totals" => {
                // The dispatcher runs inside the actix runtime, which cannot
                // be re-entered with block_on. Run the work on its own
                // thread with a dedicated runtime.
                let handle = std::thread::spawn(
                    || -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
                        let runtime = tokio::runtime::Runtime::new()?;
                        runtime.block_on(async {
                            let config_manager = get_global_config_manager()?;
                            let url = config_manager.get_string("database.url")?;
                            let max_connections =
                                config_manager.get_or("database.max_connections", 10u32);
                            db::init_pool(&url, max_connections).await?;
                            let count = batch_service::reconcile_totals(db::get_pool()?).await?;
                            Ok(count)
                        })
                    },
                );
                let count = handle
                    .join()
                    .map_err(|_| "Luồng đối soát kết thúc bất thường")??;
                println!("Đã đối soát tổng tiền của {} đợt kê khai", count);
                Ok(())
            }
            _ => Err(format!("Không hỗ trợ lệnh: {}", command_name).into()),
        }
    }
}
