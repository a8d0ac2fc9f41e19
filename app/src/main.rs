mod controllers;
mod models;
mod repositories;
mod startup;

use clap::{Parser, Subcommand};
use kit::{Environment, FrameworkError, HostingEnvironment, WebHost};
use startup::AppStartup;
use std::path::PathBuf;
use std::process::ExitCode;

const APPLICATION_NAME: &str = "ucubot";

#[derive(Parser)]
#[command(name = "ucubot")]
#[command(about = "Lesson feedback bot backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Directory holding the settings files and wwwroot
        #[arg(long, default_value = ".")]
        content_root: PathBuf,

        /// Environment name, overrides APP_ENV
        #[arg(long, short = 'e')]
        environment: Option<String>,

        /// Overrides Server:Host
        #[arg(long)]
        host: Option<String>,

        /// Overrides Server:Port
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// Print the merged configuration
    Config {
        /// Directory holding the settings files
        #[arg(long, default_value = ".")]
        content_root: PathBuf,

        /// Environment name, overrides APP_ENV
        #[arg(long, short = 'e')]
        environment: Option<String>,
    },
}

fn hosting_environment(content_root: PathBuf, environment: Option<String>) -> HostingEnvironment {
    let detected = HostingEnvironment::detect(APPLICATION_NAME, &content_root);
    match environment {
        Some(name) => HostingEnvironment::new(APPLICATION_NAME, Environment::parse(&name), content_root),
        None => detected,
    }
}

async fn serve(
    env: HostingEnvironment,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), FrameworkError> {
    let mut web_host = WebHost::new(env);
    if let Some(host) = host {
        web_host = web_host.host(host);
    }
    if let Some(port) = port {
        web_host = web_host.port(port);
    }
    web_host.run::<AppStartup>().await
}

fn print_config(env: &HostingEnvironment) -> Result<(), FrameworkError> {
    let configuration = startup::load_configuration(env)?;
    println!("# {} ({})", env.application_name, env.environment_name());
    for (key, value) in configuration.iter() {
        if key.to_ascii_lowercase().starts_with("connectionstrings:") {
            println!("{} = ****", key);
        } else {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    kit::logging::init();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Serve {
        content_root: PathBuf::from("."),
        environment: None,
        host: None,
        port: None,
    }) {
        Commands::Serve {
            content_root,
            environment,
            host,
            port,
        } => serve(hosting_environment(content_root, environment), host, port).await,
        Commands::Config {
            content_root,
            environment,
        } => print_config(&hosting_environment(content_root, environment)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ucubot stopped");
            ExitCode::FAILURE
        }
    }
}
