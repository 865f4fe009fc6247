use clap::Parser;
use log::info;

use censorship_proxy::{init_logging, AppConfig, ErrorLogger, LogContext, Proxy, ProxySettings};

#[derive(Parser, Debug)]
#[command(name = "censorship-proxy")]
#[command(about = "Ethereum JSON-RPC relay that drops raw transactions signed by censored senders")]
#[command(version)]
struct Args {
    /// Address the control plane listens on (host:port)
    #[arg(required_unless_present = "print_config")]
    control_addr: Option<String>,

    /// Address clients connect to (host:port)
    #[arg(required_unless_present = "print_config")]
    listen_addr: Option<String>,

    /// Upstream JSON-RPC node (host:port)
    #[arg(required_unless_present = "print_config")]
    target_addr: Option<String>,

    /// Sender address censored from startup, repeatable
    #[arg(long = "censor", value_name = "ADDR")]
    censor: Vec<String>,

    /// Print a sample configuration file with the default settings and exit
    #[arg(long, conflicts_with_all = ["control_addr", "listen_addr", "target_addr", "censor"])]
    print_config: bool,
}

impl Args {
    fn settings(&self) -> Option<ProxySettings> {
        Some(ProxySettings {
            control_addr: self.control_addr.clone()?,
            listen_addr: self.listen_addr.clone()?,
            target_addr: self.target_addr.clone()?,
            initial_censored: self.censor.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }
    let settings = args.settings().ok_or("control, listen and target addresses are required")?;

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.logging)?;

    info!("Starting censorship proxy");

    let proxy = match Proxy::bind(&settings, &config).await {
        Ok(proxy) => proxy,
        Err(e) => {
            ErrorLogger::log_error(&e, Some(LogContext::new("proxy", "startup")));
            eprintln!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    proxy.run().await;
    info!("Censorship proxy stopped");

    Ok(())
}
