use clap::{Parser, Subcommand};
use std::io::{self, Write};

use alloy_primitives::{Address, Bytes, U256};
use zkpass_wallet::client::{BundlerClient, NodeClient, PaymasterClient};
use zkpass_wallet::config::WalletConfig;
use zkpass_wallet::error::WalletError;
use zkpass_wallet::operation::CallIntent;
use zkpass_wallet::prover::{PasswordProver, RemoteProver, SimulatedProver};
use zkpass_wallet::session::WalletSession;

#[derive(Parser)]
#[command(name = "zkpass-wallet")]
#[command(about = "Password-proof smart-contract wallet client")]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "wallet.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and show the resolved account
    Login { username: String },
    /// Send a contract call through the entry point
    Send {
        username: String,
        #[arg(long)]
        target: String,
        /// Attached value in wei (decimal)
        #[arg(long, default_value = "0")]
        value: String,
        /// Encoded call data, 0x-hex
        #[arg(long, default_value = "0x")]
        data: String,
    },
    /// Anchor an email guardian on the account
    Guard {
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Generate the email recovery message
    Recover { username: String },
}

fn prompt_password() -> Result<String, WalletError> {
    print!("Password: ");
    io::stdout()
        .flush()
        .map_err(|e| WalletError::Format(e.to_string()))?;
    let mut password = String::new();
    io::stdin()
        .read_line(&mut password)
        .map_err(|e| WalletError::Format(e.to_string()))?;
    Ok(password.trim().to_string())
}

fn build_prover(config: &WalletConfig) -> Box<dyn PasswordProver> {
    match &config.prover.endpoint {
        Some(endpoint) => Box::new(RemoteProver::new(
            endpoint.clone(),
            config.prover.wasm.clone(),
            config.prover.zkey.clone(),
        )),
        None => {
            tracing::warn!("no prover endpoint configured; using the simulated backend");
            Box::new(SimulatedProver)
        }
    }
}

fn parse_intent(target: &str, value: &str, data: &str) -> Result<CallIntent, WalletError> {
    let target: Address = target
        .parse()
        .map_err(|e| WalletError::Format(format!("bad target address: {}", e)))?;
    let value = U256::from_str_radix(value, 10)
        .map_err(|e| WalletError::Format(format!("bad value: {}", e)))?;
    let data: Bytes = hex::decode(data.trim_start_matches("0x"))
        .map_err(|e| WalletError::Format(format!("bad call data: {}", e)))?
        .into();
    Ok(CallIntent {
        target,
        value,
        call_data: data,
    })
}

async fn run(cli: Cli) -> Result<(), WalletError> {
    let config = WalletConfig::load_or_default(&cli.config);
    let chain = NodeClient::new(config.network.endpoint.clone());
    let paymaster = PaymasterClient::new(config.network.paymaster.clone());
    let bundler = BundlerClient::new(config.network.bundler.clone());
    let prover = build_prover(&config);
    let suffix = config.network.name_suffix.clone();
    let mut session = WalletSession::new(config, chain, prover, paymaster, bundler);

    match cli.command {
        Commands::Login { username } => {
            let password = prompt_password()?;
            let record = session.login(&username, &password).await?;
            let (name, address, deployed) =
                (record.username.clone(), record.address, record.deployed);
            println!("Account {}{}", name, suffix);
            println!("  address:  {}", address);
            println!("  deployed: {}", deployed);
            if deployed {
                let balance = session.balance().await?;
                println!("  balance:  {} wei", balance);
            }
        }
        Commands::Send {
            username,
            target,
            value,
            data,
        } => {
            let intent = parse_intent(&target, &value, &data)?;
            let password = prompt_password()?;
            session.login(&username, &password).await?;
            let op_hash = session.submit(&intent).await?;
            println!("Operation submitted, opHash: {}", op_hash);
        }
        Commands::Guard { username, email } => {
            let password = prompt_password()?;
            session.login(&username, &password).await?;
            let op_hash = session.add_email_guardian(&email).await?;
            println!("Guardian operation submitted, opHash: {}", op_hash);
        }
        Commands::Recover { username } => {
            let password = prompt_password()?;
            let message = session.generate_recovery(&username, &password).await?;
            println!("Send an email with the text below as subject to the recovery address:");
            println!("{}", message);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if e.offers_recovery() {
            eprintln!("{} (run the `recover` command to start recovery)", e);
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(1);
    }
}
