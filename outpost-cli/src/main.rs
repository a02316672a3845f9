use clap::{Parser, Subcommand};
use outpost::{
    AppOptions, ConfigError, Deployment, DeploymentOptions, RouterOptions, ServerOverrides,
};

mod demo;

use demo::demo_application;

#[derive(Parser, Debug)]
#[command(name = "outpost", version)]
#[command(about = "Outpost CLI - serve AI application components over HTTP")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy the demo application
    Serve {
        /// Application name; also its URL namespace
        #[arg(long, default_value = "Demo")]
        name: String,
        /// Bind address (overrides OUTPOST_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides OUTPOST_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the routes the demo application would mount
    Routes {
        /// Application name; also its URL namespace
        #[arg(long, default_value = "Demo")]
        name: String,
        /// Path prefix for every route
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn init_logging(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Environment first, then command-line flags.
fn server_overrides(
    host: Option<String>,
    port: Option<u16>,
) -> Result<ServerOverrides, ConfigError> {
    let mut flags = ServerOverrides::new();
    if let Some(host) = host {
        flags = flags.host(host);
    }
    if let Some(port) = port {
        flags = flags.port(port);
    }
    Ok(ServerOverrides::from_env()?.merge(flags))
}

fn serve(name: &str, host: Option<String>, port: Option<u16>) -> Result<(), String> {
    let options = DeploymentOptions {
        app: AppOptions::from_env().map_err(|e| e.to_string())?,
        router: RouterOptions::default(),
        server: server_overrides(host, port).map_err(|e| e.to_string())?,
    };
    let deployment =
        Deployment::new(&demo_application(name), options).map_err(|e| e.to_string())?;
    deployment.try_serve().map_err(|e| e.to_string())
}

fn print_routes(name: &str, prefix: Option<String>) -> Result<(), String> {
    let router = match prefix {
        Some(prefix) => RouterOptions::default().with_prefix(prefix),
        None => RouterOptions::default(),
    };
    let options = DeploymentOptions {
        router,
        ..DeploymentOptions::default()
    };
    let deployment =
        Deployment::new(&demo_application(name), options).map_err(|e| e.to_string())?;

    for route in deployment.routes() {
        println!("{:<6} {:<40} [{}]", route.method, route.path, route.tags.join(", "));
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let result = match cli.command {
        Commands::Serve { name, host, port } => serve(&name, host, port),
        Commands::Routes { name, prefix } => print_routes(&name, prefix),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
