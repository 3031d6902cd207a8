use std::env;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use wallet_keyring::{Keyring, Storage, Wallet, WalletConfig, WalletUpdateCoordinator};

const USAGE: &str = "usage: wallet-keyring <init [mnemonic words...] | add-account | switch <index> | rename <index> <name> | list>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WalletConfig::from_env();
    let storage = Storage::new_with_base_dir(config.wallet_dir.clone());
    let coordinator = WalletUpdateCoordinator::new(config, Arc::new(storage));

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    coordinator.load().await?;

    match command {
        "init" => {
            let keyring = if args.len() > 1 {
                Keyring::hd_wallet(&args[1..].join(" "))?
            } else {
                let keyring = Keyring::generate_hd_wallet()?;
                println!("Mnemonic (write it down): {}", keyring.export_secret()?);
                keyring
            };
            let account = coordinator.create_wallet(keyring, None).await?;
            println!("Created {} ({})", account.name, account.address);
        }
        "add-account" => {
            let account = coordinator
                .add_account()
                .await
                .context("could not add account")?;
            println!("Added {} ({})", account.name, account.address);
        }
        "switch" => {
            let wallet = coordinator.wallet().ok_or_else(|| anyhow!("no wallet"))?;
            let id = account_id_at(&wallet, args.get(1))?;
            let account = coordinator
                .switch_account(id)
                .await
                .context("could not switch account")?;
            println!("Switched to {} ({})", account.name, account.address);
        }
        "rename" => {
            let wallet = coordinator.wallet().ok_or_else(|| anyhow!("no wallet"))?;
            let id = account_id_at(&wallet, args.get(1))?;
            let name = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            let account = coordinator.rename_account(id, &name).await?;
            println!("Renamed account {} to {}", account.index, account.name);
        }
        "list" => match coordinator.wallet() {
            Some(wallet) => {
                for account in wallet.accounts() {
                    let marker = if wallet.current_account_id() == Some(account.id) {
                        "*"
                    } else {
                        " "
                    };
                    let kind = wallet
                        .keyring_of(account)
                        .map(|keyring| keyring.kind().as_str())
                        .unwrap_or("?");
                    println!(
                        "{} {:>3}  {:<12} {:<11} {}",
                        marker, account.index, account.name, kind, account.address
                    );
                }
            }
            None => println!("No wallet. Run `wallet-keyring init` first."),
        },
        _ => bail!(USAGE),
    }

    Ok(())
}

fn account_id_at(wallet: &Wallet, raw: Option<&String>) -> anyhow::Result<uuid::Uuid> {
    let index: u32 = raw
        .ok_or_else(|| anyhow!(USAGE))?
        .parse()
        .context("account index must be a number")?;
    wallet
        .accounts()
        .iter()
        .find(|account| account.index == index)
        .map(|account| account.id)
        .ok_or_else(|| anyhow!("no account with index {}", index))
}
