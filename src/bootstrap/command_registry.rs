use clap::{Arg, Command};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Modules implement this trait to contribute CLI subcommands.
pub trait CommandModule {
    fn module_name(&self) -> &'static str;

    fn register_commands(&self) -> Vec<Command>;

    fn handle_command(
        &self,
        command_name: &str,
        matches: &clap::ArgMatches,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Singleton command registry.
pub struct CommandRegistry {
    modules: HashMap<String, Box<dyn CommandModule + Send + Sync>>,
}

impl CommandRegistry {
    fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    pub fn instance() -> &'static Arc<Mutex<CommandRegistry>> {
        static INSTANCE: OnceLock<Arc<Mutex<CommandRegistry>>> = OnceLock::new();
        INSTANCE.get_or_init(|| Arc::new(Mutex::new(CommandRegistry::new())))
    }

    pub fn register_module(&mut self, module: Box<dyn CommandModule + Send + Sync>) {
        let module_name = module.module_name().to_string();
        self.modules.insert(module_name, module);
    }

    /// Build the complete CLI: built-in `server`/`version` plus whatever the
    /// modules registered.
    pub fn build_app(&self) -> Command {
        let mut app = Command::new("bhxh-portal")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Cổng tiếp nhận hồ sơ kê khai BHXH/BHYT")
            .subcommand_required(true)
            .arg_required_else_help(true);

        app = app.subcommand(
            Command::new("server")
                .about("Khởi động máy chủ web")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Địa chỉ lắng nghe"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Cổng lắng nghe"),
                )
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("WORKERS")
                        .help("Số luồng xử lý"),
                ),
        );

        app = app.subcommand(Command::new("version").about("Hiển thị thông tin phiên bản"));

        for module in self.modules.values() {
            for command in module.register_commands() {
                app = app.subcommand(command);
            }
        }

        app
    }

    pub fn handle_command(
        &self,
        command_name: &str,
        matches: &clap::ArgMatches,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for module in self.modules.values() {
            for command in module.register_commands() {
                if command.get_name() == command_name {
                    return module.handle_command(command_name, matches);
                }
            }
        }

        Err(format!("Không tìm thấy lệnh '{}'", command_name).into())
    }
}

pub fn register_module(module: Box<dyn CommandModule + Send + Sync>) {
    let registry = CommandRegistry::instance();
    let mut registry = registry.lock().unwrap();
    registry.register_module(module);
}

pub fn build_app() -> Command {
    let registry = CommandRegistry::instance();
    let registry = registry.lock().unwrap();
    registry.build_app()
}

pub fn handle_command(
    command_name: &str,
    matches: &clap::ArgMatches,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = CommandRegistry::instance();
    let registry = registry.lock().unwrap();
    registry.handle_command(command_name, matches)
}
