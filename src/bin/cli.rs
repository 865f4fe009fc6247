use clap::{ArgGroup, Parser};

use censorship_proxy::api::ControlUpdate;
use censorship_proxy::config::MIN_CONTROL_BUFFER_SIZE;

#[derive(Parser, Debug)]
#[command(name = "censorctl")]
#[command(about = "Push a censorship configuration to a running censorship-proxy")]
#[command(version)]
#[command(group(ArgGroup::new("deny_list").required(true).args(["censor", "clear"])))]
struct Cli {
    /// Control-plane address of the proxy (host:port)
    control_addr: String,

    /// New upstream node; the current one is kept when omitted
    #[arg(long, value_name = "HOST:PORT")]
    target: Option<String>,

    /// Sender address to censor, repeatable; replaces the whole deny-list
    #[arg(long = "censor", value_name = "ADDR")]
    censor: Vec<String>,

    /// Send an empty deny-list
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn update(&self) -> ControlUpdate {
        let update = if self.clear {
            ControlUpdate::clear()
        } else {
            ControlUpdate::censor(self.censor.clone())
        };

        match &self.target {
            Some(target) => update.with_target(target.clone()),
            None => update,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let update = cli.update();

    let size = update.to_bytes().len();
    if size > MIN_CONTROL_BUFFER_SIZE {
        eprintln!(
            "Warning: document is {} bytes; proxies with the default control buffer read only {}",
            size, MIN_CONTROL_BUFFER_SIZE
        );
    }

    if let Err(e) = update.send(&cli.control_addr).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("Configuration sent to {}", cli.control_addr);
}
