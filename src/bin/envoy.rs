use clap::{Parser, Subcommand};
use envoy_monitor::refresh::Gateway;
use envoy_monitor::{api, auth, model, settings};

#[derive(Parser)]
#[command(author, version, about = "Read the Envoy gateway once", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full production.json, pretty printed
    Prod,
    /// Current production, consumption and net power
    Now,
    /// Energy produced, consumed and exchanged since midnight
    Today,
    Home,
    Inventory,
    Inverters,
    /// Serial number, part number and firmware of the gateway
    Info,
}

async fn execute(envoy: &model::Envoy, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Prod => {
            let production = api::production(envoy).await?;
            println!("{}", serde_json::to_string_pretty(&production)?);
        }
        Command::Now => {
            let now = api::now(envoy).await?;
            let max = match api::system_max(envoy).await {
                Ok(max) => max,
                Err(e) => {
                    log::warn!("{}", e);
                    0
                }
            };
            println!(
                "Production: {:.2}W / {}W\tConsumption: {:.2}W\tNet: {:.2}W",
                now.production, max, now.consumption, now.net
            );
        }
        Command::Today => {
            let today = api::today(envoy).await?;
            println!(
                "Production: {:.2}kWh\tConsumption: {:.2}kWh\tNet: {:.2}kWh",
                today.production / 1000.0,
                today.consumption / 1000.0,
                today.net / 1000.0
            );
        }
        Command::Home => {
            let home = api::home(envoy).await?;
            println!("{:#?}", home);
            if let Some(bytes) = home.db_size_bytes() {
                println!("Database: {} bytes ({} full)", bytes, home.db_percent_full);
            }
        }
        Command::Inventory => println!("{:#?}", api::inventory(envoy).await?),
        Command::Inverters => println!("{:#?}", api::inverters(envoy).await?),
        Command::Info => {
            let info = api::info(envoy).await?;
            println!("Serial Number: {}", info.device.sn);
            println!("Part Number: {}", info.device.pn);
            println!("Software Version: {}", info.device.software);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = settings::read_settings()?;
    let (store, credentials) = settings::load_credentials(&settings)?;
    let mut envoy = settings::envoy(&settings, credentials)?;

    envoy.locate().await?;
    let result = match auth::try_login(&mut envoy).await {
        Ok(()) => execute(&envoy, cli.command).await,
        Err(e) => Err(e.into()),
    };

    store.save(&envoy.credentials);
    result
}
