use tracing::{error, info};

use tablegate::{AppContext, Config, DriverRegistry};

fn main() {
    // Load configuration
    let config = match Config::load_with_env("tablegate.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load tablegate.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = tablegate::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        if let Err(e) = tablegate::logging::init_console_only(&config.logging.level) {
            eprintln!("Console logging unavailable: {e}");
        }
    }

    let ctx = match AppContext::from_config(&config, &DriverRegistry::default()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to build application context: {e}");
            std::process::exit(1);
        }
    };

    info!("Connections: {:?}", ctx.connections().names());

    // Resolve each name given on the command line
    for name in std::env::args().skip(1) {
        match ctx.table(&name) {
            Ok(gateway) => info!(
                "{} -> table '{}' via {} (records: {}, backend: {})",
                name,
                gateway.name(),
                gateway.class_name(),
                gateway.record_class(&[]),
                gateway.db().backend_name()
            ),
            Err(e) => error!("{name}: {e}"),
        }
    }
}
