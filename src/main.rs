use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crmvault::{
    Account, Activity, BackupConfig, BackupEngine, ClosedDeal, EntityCollections,
    InMemoryRepository, Lead,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "crmvault")]
#[command(about = "Administrative tooling for the CRM backup/restore engine")]
struct Cli {
    /// Snapshot directory
    #[arg(long, default_value = "./crm-backups")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored snapshots, newest first
    List,
    /// Aggregate stats over the snapshot directory
    Stats,
    /// Decode one artifact and report its contents
    Inspect {
        id: String,
    },
    /// Export one artifact's raw bytes to a file
    Download {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Delete one artifact (missing artifact is an error)
    Delete {
        id: String,
    },
    /// Keep only the newest N snapshots
    Retention {
        #[arg(long, default_value_t = 30)]
        keep: usize,
        /// Treat an incomplete sweep as a failure
        #[arg(long)]
        strict: bool,
    },
    /// Run a seeded create -> wipe -> restore cycle against an in-memory
    /// repository
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let repo = Arc::new(InMemoryRepository::new());
    let engine = BackupEngine::new(repo.clone(), BackupConfig::new(&cli.dir));

    match cli.command {
        Command::List => {
            let entries = engine.list_snapshots().await?;
            if entries.is_empty() {
                println!("No snapshots in '{}'", cli.dir.display());
                return Ok(());
            }
            for entry in entries {
                println!(
                    "{}  {:>10} bytes  {}",
                    entry.id,
                    entry.size_bytes,
                    entry.modified_at.to_rfc3339()
                );
            }
        }
        Command::Stats => {
            let stats = engine.stats().await?;
            println!("Snapshots:   {}", stats.total_snapshots);
            println!("Total size:  {} bytes", stats.total_size_bytes);
            if let Some(oldest) = stats.oldest {
                println!("Oldest:      {}", oldest.to_rfc3339());
            }
            if let Some(newest) = stats.newest {
                println!("Newest:      {}", newest.to_rfc3339());
            }
        }
        Command::Inspect { id } => {
            let summary = engine.inspect_snapshot(&id).await?;
            println!("Artifact:       {}", summary.id);
            println!("Schema version: {}", summary.schema_version);
            println!("Created at:     {}", summary.created_at.to_rfc3339());
            println!("Total records:  {}", summary.record_count);
            println!("  accounts:     {}", summary.accounts);
            println!("  leads:        {}", summary.leads);
            println!("  activities:   {}", summary.activities);
            println!("  closed_deals: {}", summary.closed_deals);
            println!("  audit_log:    {}", summary.audit_log);
        }
        Command::Download { id, out } => {
            let bytes = engine.download_snapshot(&id).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("Failed to write '{}'", out.display()))?;
            println!("Wrote {} bytes to '{}'", bytes.len(), out.display());
        }
        Command::Delete { id } => {
            engine.delete_snapshot(&id).await?;
            println!("Deleted '{}'", id);
        }
        Command::Retention { keep, strict } => {
            let sweep = engine.apply_retention(keep).await?;
            let sweep = if strict { sweep.ensure_complete()? } else { sweep };
            println!("Deleted {} snapshot(s), {} failure(s)", sweep.deleted, sweep.failed);
        }
        Command::Demo => run_demo(&repo, &engine).await?,
    }

    Ok(())
}

async fn run_demo(
    repo: &Arc<InMemoryRepository>,
    engine: &BackupEngine<InMemoryRepository>,
) -> Result<()> {
    println!("Seeding in-memory CRM...");
    let mut collections = EntityCollections::default();
    let owner = Account::new("Ada Lovelace", "ada@crm.test", "admin");
    let lead_a = Lead::new(owner.id.clone(), "Grace Hopper", "Hopper Computing")
        .status("Qualified")
        .estimated_value(120_000);
    let lead_b = Lead::new(owner.id.clone(), "Alan Kay", "Dynabook Labs").estimated_value(45_000);
    collections
        .activities
        .push(Activity::new(lead_a.id.clone(), "call", "Intro call, strong interest"));
    collections
        .closed_deals
        .push(ClosedDeal::new(lead_a.id.clone(), 120_000, "Won"));
    collections.accounts.push(owner);
    collections.leads.push(lead_a);
    collections.leads.push(lead_b);
    repo.seed(collections).await;

    let receipt = engine.create_snapshot().await?;
    println!(
        "Created snapshot '{}' ({} bytes)",
        receipt.id, receipt.size_bytes
    );

    println!("Wiping non-identity collections...");
    let mut wiped = repo.dump().await;
    wiped.leads.clear();
    wiped.activities.clear();
    wiped.closed_deals.clear();
    wiped.audit_log.clear();
    repo.seed(wiped).await;

    let outcome = engine.restore_snapshot(&receipt.id).await?;
    println!(
        "Restored {} record(s) (expected {})",
        outcome.restored_count, outcome.expected_count
    );
    if outcome.count_discrepancy() {
        println!("WARNING: restored count differs from the artifact's stated count");
    }

    let after = repo.dump().await;
    println!(
        "Store now holds {} lead(s), {} activit(ies), {} closed deal(s), {} account(s)",
        after.leads.len(),
        after.activities.len(),
        after.closed_deals.len(),
        after.accounts.len()
    );
    Ok(())
}
