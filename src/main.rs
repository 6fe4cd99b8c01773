use clap::Parser;
use colored::Colorize;

use prometheus_exporter::cli::{Cli, Commands};
use prometheus_exporter::config::StaticConfig;
use prometheus_exporter::errors::ExporterError;
use prometheus_exporter::runtime::run_server;
use prometheus_exporter::system::logging::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.command() == &Commands::Config {
        println!("{}", StaticConfig::generate_sample_config());
        return;
    }

    let config = StaticConfig::load(cli.config.as_deref());

    // Guard must live until exit so buffered log lines are flushed
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(config).await {
        tracing::error!("Server exited with error: {:#}", e);
        match e.downcast_ref::<ExporterError>() {
            Some(exporter_error) => eprintln!("{}", exporter_error.format_colored()),
            None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
        }
        std::process::exit(1);
    }
}
