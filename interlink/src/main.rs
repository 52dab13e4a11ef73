use anyhow::Result;
use domain::discovery::PeerService;
use harness::ModuleRunner;
use library::communication::discovery::ServiceDescriptor;
use library::logging::{LogForwardingLayer, LogRecordReceiver};
use modules::logger::Logger;
use modules::products::Products;
use modules::users::Users;
use options::{Command, LogFormat, MainOptions};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner, log_records) = init()?;

    let clean = match command {
        Command::Users(options) => runner.run(Users::new(options, log_records)).await,
        Command::Products(options) => runner.run(Products::new(options, log_records)).await,
        Command::Logger(options) => runner.run(Logger::new(options)).await,
        Command::Call(options) => {
            let response = modules::call::execute(options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            true
        }
    };

    if !clean {
        std::process::exit(1);
    }

    Ok(())
}

fn init() -> Result<(Command, ModuleRunner, Option<LogRecordReceiver>)> {
    let options = MainOptions::from_args();

    let forwarded_service = match &options.command {
        Command::Users(o) if !o.log_forwarding.no_log_forwarding => Some(PeerService::Users),
        Command::Products(o) if !o.log_forwarding.no_log_forwarding => Some(PeerService::Products),
        _ => None,
    };

    let (forwarding, log_records) = match forwarded_service {
        Some(service) => {
            let (layer, records) = LogForwardingLayer::new(service.service_identifier());
            (Some(layer), Some(records))
        }
        None => (None, None),
    };

    let console: Box<dyn Layer<Registry> + Send + Sync> = match options.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(forwarding)
        .with(EnvFilter::try_new(&options.log)?)
        .try_init()?;

    let runner = match options.status_server {
        Some(port) => ModuleRunner::new_with_status_server(port),
        None => ModuleRunner::default(),
    };

    info!("Interlink {}", env!("CARGO_PKG_VERSION"));

    Ok((options.command, runner, log_records))
}
