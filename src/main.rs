use crate::cli::Shell;

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod log;

fn main() {
    let config = config::get_config().unwrap_or_else(|e| {
        crate::warn!(format!("falling back to defaults: {}", e));
        config::Config::default()
    });

    crate::info!("treedex shell starting");
    let mut shell = Shell::new(config);
    std::process::exit(shell.run());
}
