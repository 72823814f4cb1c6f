//! `secret-tx`: submit and query encrypted Secret Network contract calls.

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use secret_tx::blockchain::wallet::PRIVATE_KEY_ENV_VAR;
use secret_tx::blockchain::{LocalWallet, WalletKeyProvider};
use secret_tx::config::loader::load_config;
use secret_tx::config::validation::validate_config;
use secret_tx::config::PipelineConfig;
use secret_tx::encoding::address;
use secret_tx::lifecycle::{signals, Cancellation};
use secret_tx::observability::logging;
use secret_tx::pipeline::{ContractCall, ExecuteRequest, Pipeline, QueryRequest};

#[derive(Parser)]
#[command(name = "secret-tx")]
#[command(about = "Confidential transaction client for Secret Network", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LCD base URL (overrides config)
    #[arg(long)]
    lcd: Option<String>,

    /// Chain ID (overrides config; otherwise fetched from the node)
    #[arg(long)]
    chain_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct KeyArgs {
    /// Hex secp256k1 private key
    #[arg(long = "private-key", env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    private_key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a contract handle message
    Execute {
        #[command(flatten)]
        key: KeyArgs,
        /// Contract address
        #[arg(long)]
        contract: String,
        /// Plaintext JSON message
        #[arg(long)]
        msg: String,
        /// Contract code hash (looked up when omitted)
        #[arg(long)]
        code_hash: Option<String>,
        /// Funds to send, e.g. 1000uscrt
        #[arg(long)]
        funds: Option<String>,
        #[arg(long, default_value = "")]
        memo: String,
        /// Return after broadcast without waiting for inclusion
        #[arg(long)]
        no_confirm: bool,
    },
    /// Run an encrypted contract query
    Query {
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        contract: String,
        /// Plaintext JSON query
        #[arg(long)]
        query: String,
        #[arg(long)]
        code_hash: Option<String>,
    },
    /// Show account number and sequence
    Account {
        /// Address to look up
        address: String,
    },
    /// Look up a contract's code hash
    CodeHash {
        contract: String,
    },
    /// Decode an address to hex, or print the wallet address
    Address {
        /// Address to decode; prints the key's address when omitted
        address: Option<String>,
        #[arg(long = "private-key", env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
        private_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(lcd) = cli.lcd {
        config.lcd.url = lcd;
    }
    if let Some(chain_id) = cli.chain_id {
        config.network.chain_id = Some(chain_id);
    }
    if let Commands::Execute { no_confirm: true, .. } = cli.command {
        config.confirmation.enabled = false;
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("config error: {}", e);
        }
        return Err("invalid configuration".into());
    }

    logging::init(&config.observability)?;
    tracing::debug!(lcd_url = %config.lcd.url, "Configuration loaded");

    let cancellation = Cancellation::new();
    signals::cancel_on_ctrl_c(cancellation.clone());

    let pipeline = Pipeline::from_config(&config)?;
    let prefix = config.network.address_prefix.as_str();

    let output = match cli.command {
        Commands::Execute {
            key,
            contract,
            msg,
            code_hash,
            funds,
            memo,
            ..
        } => {
            let wallet = LocalWallet::from_private_key(&key.private_key, prefix)?;
            let mut call = ContractCall::new(contract, msg);
            call.code_hash = code_hash;
            call.funds = funds;

            let ctx = pipeline.new_context().cancelled_by(&cancellation);
            let outcome = pipeline
                .execute(&ctx, &wallet, ExecuteRequest::single(call).with_memo(memo))
                .await?;
            serde_json::to_value(outcome)?
        }
        Commands::Query {
            key,
            contract,
            query,
            code_hash,
        } => {
            let wallet = LocalWallet::from_private_key(&key.private_key, prefix)?;
            let mut request = QueryRequest::new(contract, query);
            request.code_hash = code_hash;

            let ctx = pipeline.new_context().cancelled_by(&cancellation);
            pipeline.query(&ctx, &wallet, request).await?
        }
        Commands::Account { address } => {
            let ctx = pipeline.new_context().cancelled_by(&cancellation);
            let account = pipeline.client().fetch_account(&ctx, &address).await?;
            json!({
                "address": address,
                "account_number": account.account_number,
                "sequence": account.sequence,
            })
        }
        Commands::CodeHash { contract } => {
            let ctx = pipeline.new_context().cancelled_by(&cancellation);
            let code_hash = pipeline.client().fetch_code_hash(&ctx, &contract).await?;
            json!({ "contract": contract, "code_hash": code_hash })
        }
        Commands::Address { address, private_key } => address_info(address, private_key, prefix)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn address_info(
    address: Option<String>,
    private_key: Option<String>,
    prefix: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    let address = match (address, private_key) {
        (Some(address), _) => address,
        (None, Some(key)) => LocalWallet::from_private_key(&key, prefix)?.address().to_string(),
        (None, None) => {
            return Err(format!("pass an address or set {}", PRIVATE_KEY_ENV_VAR).into());
        }
    };
    let bytes = address::decode(&address, prefix)?;
    Ok(json!({ "address": address, "hex": hex::encode(bytes) }))
}
