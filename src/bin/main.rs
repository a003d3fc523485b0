//! HCN CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hcn_gateway::hcn::{Resource, Status};
use hcn_gateway::hns::{self, Method};
use hcn_gateway::{Endpoint, Gateway, GatewayConfig, LoadBalancer, Namespace, Network, SdnRoute};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "hcn")]
#[command(about = "Inspect and manage Host Compute Network objects", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which HCN entry points are available
    Info,
    /// List objects of a kind
    List {
        kind: Kind,
        /// Enumeration query document
        #[arg(short, long, default_value = "{}")]
        query: String,
    },
    /// Show the properties of one object
    Show {
        kind: Kind,
        id: Uuid,
        /// Property query document
        #[arg(short, long, default_value = "{}")]
        query: String,
    },
    /// Delete an object
    Delete { kind: Kind, id: Uuid },
    /// Thread network compartment
    Compartment {
        #[command(subcommand)]
        action: CompartmentAction,
    },
    /// Send a legacy HNS request
    Hns {
        /// GET, POST or DELETE
        method: String,
        /// Request path, e.g. /networks/
        path: String,
        /// Request body
        #[arg(short, long, default_value = "")]
        body: String,
    },
}

#[derive(Subcommand)]
enum CompartmentAction {
    /// Print the current thread's compartment id
    Get,
    /// Switch the current thread to another compartment, then print it
    Set { id: u32 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Network,
    Endpoint,
    Namespace,
    LoadBalancer,
    Route,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hcn_gateway=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    let gateway = Gateway::with_config(config);

    match cli.command {
        Some(Commands::Info) | None => cmd_info(&gateway),
        Some(Commands::List { kind, query }) => match kind {
            Kind::Network => cmd_list::<Network>(&gateway, &query)?,
            Kind::Endpoint => cmd_list::<Endpoint>(&gateway, &query)?,
            Kind::Namespace => cmd_list::<Namespace>(&gateway, &query)?,
            Kind::LoadBalancer => cmd_list::<LoadBalancer>(&gateway, &query)?,
            Kind::Route => cmd_list::<SdnRoute>(&gateway, &query)?,
        },
        Some(Commands::Show { kind, id, query }) => match kind {
            Kind::Network => cmd_show::<Network>(&gateway, &id, &query)?,
            Kind::Endpoint => cmd_show::<Endpoint>(&gateway, &id, &query)?,
            Kind::Namespace => cmd_show::<Namespace>(&gateway, &id, &query)?,
            Kind::LoadBalancer => cmd_show::<LoadBalancer>(&gateway, &id, &query)?,
            Kind::Route => cmd_show::<SdnRoute>(&gateway, &id, &query)?,
        },
        Some(Commands::Delete { kind, id }) => match kind {
            Kind::Network => cmd_delete::<Network>(&gateway, &id)?,
            Kind::Endpoint => cmd_delete::<Endpoint>(&gateway, &id)?,
            Kind::Namespace => cmd_delete::<Namespace>(&gateway, &id)?,
            Kind::LoadBalancer => cmd_delete::<LoadBalancer>(&gateway, &id)?,
            Kind::Route => cmd_delete::<SdnRoute>(&gateway, &id)?,
        },
        Some(Commands::Compartment { action }) => cmd_compartment(&gateway, action)?,
        Some(Commands::Hns { method, path, body }) => cmd_hns(&gateway, &method, &path, &body)?,
    }

    Ok(())
}

fn cmd_info(gateway: &Gateway) {
    let report = gateway.probe();
    let available = report.iter().filter(|(_, ok)| *ok).count();

    println!("HCN entry points: {}/{} available", available, report.len());
    for (proc, ok) in &report {
        println!(
            "  {:<34} {:<20} {}",
            proc.symbol(),
            proc.library().file_name(),
            if *ok { "ok" } else { "missing" }
        );
    }
    if available == 0 {
        println!("\nThe Host Compute Network feature does not appear to be installed.");
    }
}

fn print_result(result: &Option<String>) {
    if let Some(text) = result {
        eprintln!("result: {}", text);
    }
}

fn print_json(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    if text.is_empty() {
        return Ok(());
    }
    let value: serde_json::Value = serde_json::from_str(text)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_list<R: Resource>(gateway: &Gateway, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = gateway.enumerate::<R>(query)?;
    print_result(&response.result);
    print_json(&response.value)
}

fn cmd_show<R: Resource>(
    gateway: &Gateway,
    id: &Uuid,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let opened = gateway.open::<R>(id)?;
    print_result(&opened.result);
    let handle = opened.into_value();

    let queried = gateway.query(&handle, query);
    gateway.close(handle)?;
    let queried = queried?;
    print_result(&queried.result);
    print_json(&queried.value)
}

fn cmd_delete<R: Resource>(gateway: &Gateway, id: &Uuid) -> Result<(), Box<dyn std::error::Error>> {
    match gateway.delete::<R>(id) {
        Ok(response) => {
            print_result(&response.result);
            println!("Deleted {} {}", R::KIND, id);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("No {} with id {}", R::KIND, id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_compartment(
    gateway: &Gateway,
    action: CompartmentAction,
) -> Result<(), Box<dyn std::error::Error>> {
    if let CompartmentAction::Set { id } = action {
        gateway.set_thread_compartment_id(id)?;
    }
    println!("{}", gateway.thread_compartment_id()?);
    Ok(())
}

fn cmd_hns(
    gateway: &Gateway,
    method: &str,
    path: &str,
    body: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let method: Method = method.parse()?;
    match hns::request_raw(gateway, method, path, body) {
        Ok(Some(output)) => println!("{}", serde_json::to_string_pretty(&output)?),
        Ok(None) => println!("ok"),
        Err(e) => {
            if let Some(status @ Status::Errno(_)) = e.status() {
                eprintln!("HNS returned {}", status);
            }
            return Err(e.into());
        }
    }
    Ok(())
}
