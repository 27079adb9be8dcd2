//! Questline CLI - operate the quest game from the venue side.
//!
//! Stands in for the admin console and the scan-capture layer: catalog
//! editing, player inspection and reset, simulated scans, and coupon
//! redemption, all over the JSON storage backend.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use questline_core::{AdvanceOutcome, AvatarVariant, RedeemOutcome, UserId};
use questline_engine::{AdminRegistry, CatalogStore, ProgressEngine, RedemptionGate};
use questline_storage::{JsonStorage, Storage};
use tracing::Level;

#[derive(Parser)]
#[command(name = "questline")]
#[command(about = "QR quest game operations", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, default_value = ".questline", global = true)]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default catalog if none exists
    Init,
    /// Inspect or edit the quest catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// List all players and their progress
    Users,
    /// Delete a player's progress (full reset to stage 0)
    Reset {
        /// Player ID
        user: String,
    },
    /// Start a session for a player, creating the record if needed
    Session {
        /// Player ID
        user: String,
        /// Display name for first creation
        #[arg(long)]
        name: Option<String>,
    },
    /// Submit a scanned (or typed) code for a stage
    Scan {
        /// Player ID
        user: String,
        /// 0-indexed stage being attempted
        stage: usize,
        /// Scanned payload
        code: String,
    },
    /// Change a player's avatar
    Avatar {
        /// Player ID
        user: String,
        /// Avatar variant (female | male)
        variant: String,
    },
    /// Show a player's completion and coupon status
    Status {
        /// Player ID
        user: String,
    },
    /// Redeem a player's coupon with the admin code
    Redeem {
        /// Player ID
        user: String,
        /// Admin code (exact match)
        code: String,
    },
    /// Manage the admin allow-list
    Admins {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Print the catalog
    Show,
    /// Change the number of stages
    Resize {
        /// New stage count
        count: usize,
    },
    /// Edit one stage's description and/or secret code
    SetStage {
        /// 0-indexed stage
        index: usize,
        /// New quest text
        #[arg(long)]
        description: Option<String>,
        /// New secret code
        #[arg(long)]
        code: Option<String>,
    },
    /// Edit global settings
    SetSettings {
        /// Admin code for coupon redemption
        #[arg(long)]
        admin_code: Option<String>,
        /// Start code gating login
        #[arg(long)]
        start_code: Option<String>,
        /// Coupon headline
        #[arg(long)]
        coupon_title: Option<String>,
        /// Coupon sub-line
        #[arg(long)]
        coupon_subtitle: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Add an identity to the allow-list
    Grant {
        /// Identity-layer ID
        identity: String,
        /// Display name
        name: String,
    },
    /// List allow-list entries
    List,
    /// Check whether an identity is an admin
    Check {
        /// Identity-layer ID
        identity: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let storage = Arc::new(JsonStorage::new(&cli.data_dir).await?);
    let catalog_store = CatalogStore::new(storage.clone());
    let engine = ProgressEngine::new(storage.clone());
    let gate = RedemptionGate::new(storage.clone());
    let registry = AdminRegistry::new(storage.clone());

    match cli.command {
        Commands::Init => {
            let catalog = catalog_store.load_or_init().await?;
            println!("Catalog ready: {} stages", catalog.stage_count);
        }
        Commands::Catalog { command } => match command {
            CatalogCommands::Show => {
                let catalog = catalog_store.load_or_init().await?;
                println!("Stages: {}", catalog.stage_count);
                for (index, stage) in catalog.stages.iter().enumerate() {
                    println!("  [{}] {} | {}", index, stage.secret_code, stage.description);
                }
                println!("Admin code: {}", catalog.admin_code);
                println!("Start code: {}", catalog.start_code);
                println!("Coupon: {} / {}", catalog.coupon_title, catalog.coupon_subtitle);
            }
            CatalogCommands::Resize { count } => {
                let catalog = catalog_store.resize(count).await?;
                println!("Catalog resized to {} stages", catalog.stage_count);
            }
            CatalogCommands::SetStage { index, description, code } => {
                let catalog = catalog_store
                    .set_stage(index, description.as_deref(), code.as_deref())
                    .await?;
                let stage = &catalog.stages[index];
                println!("Stage {} updated: {} | {}", index, stage.secret_code, stage.description);
            }
            CatalogCommands::SetSettings {
                admin_code,
                start_code,
                coupon_title,
                coupon_subtitle,
            } => {
                catalog_store
                    .set_settings(
                        admin_code.as_deref(),
                        start_code.as_deref(),
                        coupon_title.as_deref(),
                        coupon_subtitle.as_deref(),
                    )
                    .await?;
                println!("Settings saved");
            }
        },
        Commands::Users => {
            let catalog = catalog_store.load_or_init().await?;
            let records = storage.list_progress().await?;
            println!("Players ({})", records.len());
            for record in records {
                println!(
                    "  {} | {} | {}/{} | last active {} | coupon {}",
                    record.user_id,
                    record.display_name,
                    record.unlocked_stages,
                    catalog.stage_count,
                    record.last_active_at,
                    record
                        .coupon_redeemed_at
                        .map(|ts| ts.to_string())
                        .unwrap_or_else(|| "unused".to_string()),
                );
            }
        }
        Commands::Reset { user } => {
            let user = UserId::new(user);
            storage.delete_progress(&user).await?;
            println!("Progress reset for {user}");
        }
        Commands::Session { user, name } => {
            let user = UserId::new(user);
            let progress = engine.begin_session(&user, name.as_deref()).await?;
            println!(
                "Session for {} ({}) at stage {}",
                progress.user_id, progress.display_name, progress.unlocked_stages
            );
        }
        Commands::Scan { user, stage, code } => {
            let user = UserId::new(user);
            match engine.attempt_advance(&user, stage, &code).await? {
                AdvanceOutcome::Advanced(n) => println!("Stage cleared! Unlocked stages: {n}"),
                AdvanceOutcome::AlreadyCompleted => println!("Stage already completed"),
                AdvanceOutcome::OutOfOrder => println!("Complete the earlier stages first"),
                AdvanceOutcome::WrongCode => println!("Incorrect code"),
                AdvanceOutcome::UnknownStage => println!("No such stage"),
            }
        }
        Commands::Avatar { user, variant } => {
            let user = UserId::new(user);
            let variant = match variant.to_lowercase().as_str() {
                "female" => AvatarVariant::Female,
                "male" => AvatarVariant::Male,
                other => anyhow::bail!("unknown avatar variant: {other}"),
            };
            let progress = engine.set_avatar(&user, variant).await?;
            println!("Avatar set to {}", progress.avatar.as_str());
        }
        Commands::Status { user } => {
            let user = UserId::new(user);
            let status = gate.validate_completion(&user).await?;
            println!("Eligible for coupon: {}", status.eligible);
            println!("Already claimed today: {}", status.already_claimed_today);
        }
        Commands::Redeem { user, code } => {
            let user = UserId::new(user);
            match gate.redeem(&user, &code).await? {
                RedeemOutcome::Redeemed(ts) => println!("Coupon redeemed at {ts}"),
                RedeemOutcome::AlreadyRedeemed(ts) => {
                    println!("Already used today (at {ts})")
                }
                RedeemOutcome::InvalidCode => println!("Invalid admin code"),
            }
        }
        Commands::Admins { command } => match command {
            AdminCommands::Grant { identity, name } => {
                let entry = registry.grant(&identity, &name).await?;
                println!("Granted admin to {} ({})", entry.identity_id, entry.key);
            }
            AdminCommands::List => {
                for entry in registry.list().await? {
                    println!("  {} | {} | {}", entry.key, entry.identity_id, entry.name);
                }
            }
            AdminCommands::Check { identity } => {
                println!("{}", registry.is_admin(&identity).await?);
            }
        },
    }

    Ok(())
}
