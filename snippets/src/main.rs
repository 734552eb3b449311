// Shardnet session snippets
//
// Drives a test session against the proxy named in a session profile.
//
// Usage:
//   cargo run -p shardnet_snippets -- --profile devnet sync
//   cargo run -p shardnet_snippets -- --profile devnet \
//       airdrop --from alice --group players --amount 0.5
//   cargo run -p shardnet_snippets -- --profile devnet report

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use shardnet_common::transaction::TokenPayment;
use shardnet_testing_framework::airdrop::{AirdropService, DeliveryMode};
use shardnet_testing_framework::config::DispatchOptions;
use shardnet_testing_framework::users::TestUser;
use shardnet_testing_framework::{TestSession, TestSessionBuilder};

#[derive(Parser, Debug)]
#[command(name = "shardnet_snippets")]
#[command(about = "Run session snippets against a sharded network proxy")]
struct Args {
    /// Session profile name (<dir>/<profile>.session.json)
    #[arg(short, long, default_value = "devnet")]
    profile: String,

    /// Session directory
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the on-chain nonce of every profile user
    Sync,

    /// Print address, shard, nonce and balance of every profile user
    Accounts,

    /// Send the same payment to every member of a group
    Airdrop {
        /// Funding user
        #[arg(short, long)]
        from: String,

        /// Recipient group
        #[arg(short, long)]
        group: String,

        /// Amount in denominated units (e.g. 0.5)
        #[arg(short, long)]
        amount: String,

        /// Token identifier; native coin when omitted
        #[arg(short, long)]
        token: Option<String>,

        /// Token decimals
        #[arg(long, default_value_t = 18)]
        decimals: u32,

        /// Send one transaction at a time instead of a bulk submit
        #[arg(long)]
        individually: bool,

        /// Transactions per bulk call
        #[arg(long, default_value_t = 1024)]
        chunk_size: usize,

        /// Pause between bulk calls (ms)
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
    },

    /// Write the audit report of the session directory
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("=== Shardnet snippets ===");
    info!("Profile: {}", args.profile);
    info!("Directory: {}", args.dir.display());

    let mut session = TestSessionBuilder::new(args.profile.as_str(), &args.dir)
        .build()
        .await
        .with_context(|| format!("Failed to open session '{}'", args.profile))?;

    let result = run(&mut session, args.command).await;
    if let Err(e) = session.destroy().await {
        warn!("Session not closed cleanly: {}", e);
    }
    result
}

async fn run(session: &mut TestSession, command: Command) -> Result<()> {
    match command {
        Command::Sync => {
            session.set_step("sync");
            let users = all_users(session)?;
            session.sync_users(&users).await.context("Failed to sync nonces")?;
            for user in &users {
                info!("{:<16} nonce {}", user.name(), session.nonces().get_nonce(user)?);
            }
        }
        Command::Accounts => {
            let num_shards = session.network_config().num_shards;
            for user in all_users(session)? {
                let account = session
                    .provider()
                    .get_account(&user.address())
                    .await
                    .with_context(|| format!("Failed to fetch account of {}", user.name()))?;
                info!(
                    "{:<16} {} shard {} nonce {} balance {}",
                    user.name(),
                    account.address,
                    user.shard(num_shards),
                    account.nonce,
                    account.balance
                );
            }
        }
        Command::Airdrop {
            from,
            group,
            amount,
            token,
            decimals,
            individually,
            chunk_size,
            wait_ms,
        } => {
            let payment = match token {
                Some(identifier) => {
                    TokenPayment::fungible_from_amount(identifier, &amount, decimals)
                }
                None => TokenPayment::native_from_amount(&amount),
            }
            .with_context(|| format!("Invalid amount '{}'", amount))?;
            if chunk_size == 0 {
                bail!("--chunk-size must be at least 1");
            }

            let funder = session.user(&from)?;
            let recipients: Vec<_> = session.group(&group)?.iter().map(TestUser::address).collect();
            if recipients.is_empty() {
                bail!("Group '{}' has no members", group);
            }

            let mode = if individually {
                DeliveryMode::Individually
            } else {
                DeliveryMode::Batch(DispatchOptions {
                    chunk_size,
                    wait_between_chunks: Duration::from_millis(wait_ms),
                })
            };

            info!("Airdrop of {} from {} to {} recipients", payment, from, recipients.len());
            session.set_step(format!("airdrop {}", group));
            session.sync_users(&[funder.clone()]).await.context("Failed to sync funder")?;

            let service = AirdropService::new(mode);
            let report = service
                .send_to_each_user(session, &funder, &recipients, &[payment])
                .await
                .context("Airdrop failed")?;
            for entry in report.rejected() {
                error!(
                    "Rejected for {}: {}",
                    entry.recipient,
                    entry.rejection.as_deref().unwrap_or("unknown reason")
                );
            }

            let outcomes = service
                .await_delivery(session, &report)
                .await
                .context("Failed to await delivery")?;
            let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
            info!("{}/{} deliveries succeeded", succeeded, recipients.len());
            if succeeded != recipients.len() {
                bail!("{} deliveries did not succeed", recipients.len() - succeeded);
            }
        }
        Command::Report => {
            let report = session.generate_report().await.context("Failed to write report")?;
            info!(
                "Wrote {} events to {}",
                report.events.len(),
                session.audit().report_path().display()
            );
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }
    Ok(())
}

// Group members are registered as users too
fn all_users(session: &TestSession) -> Result<Vec<TestUser>> {
    Ok(session.session().users()?.users().cloned().collect())
}
