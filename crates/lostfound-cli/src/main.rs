//! `lostfound`: command-line client for the lost-and-found registry.
//!
//! # Usage
//!
//! ```text
//! lostfound report --name "Blue umbrella" --description "Wooden handle" --contact "front office"
//! lostfound list --query umbrella
//! lostfound --admin-key "$KEY" dashboard
//! lostfound --config ~/.config/lostfound/config.toml approve-claim 12
//! ```

mod client;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use lostfound_core::{
  claim::{ClaimId, ClaimStatus},
  item::{Item, ItemId, ItemStatus},
  lifecycle::Dashboard,
  store::FoundOrder,
};
use serde::Deserialize;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lostfound", about = "Client for the lost-and-found registry")]
struct Args {
  /// Path to a TOML config file (url, admin_key).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the registry server (default: http://localhost:3000).
  #[arg(long, env = "LOSTFOUND_URL")]
  url: Option<String>,

  /// Admin key, required by review commands.
  #[arg(long, env = "LOSTFOUND_ADMIN_KEY", hide_env_values = true)]
  admin_key: Option<String>,

  /// Print the server's response as pretty JSON instead of a table.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Report a found item; it stays hidden until an administrator approves it.
  Report {
    #[arg(long)]
    name:        String,
    #[arg(long)]
    description: String,
    /// How the finder or the office can be reached.
    #[arg(long)]
    contact:     String,
    #[arg(long)]
    location:    Option<String>,
    #[arg(long)]
    photo_url:   Option<String>,
    /// Day the item was found, as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date:        Option<NaiveDate>,
  },

  /// File an ownership claim against an item.
  Claim {
    item_id: ItemId,
    #[arg(long)]
    name:    String,
    #[arg(long)]
    email:   String,
    /// Proof of ownership: marks, contents, serial numbers.
    #[arg(long)]
    details: String,
  },

  /// List approved items.
  List {
    #[arg(short, long)]
    query:  Option<String>,
    /// Oldest finds first.
    #[arg(long)]
    oldest: bool,
    #[arg(long)]
    limit:  Option<usize>,
  },

  /// Show every item and claim (admin).
  Dashboard,

  /// Approve a pending item for public listing (admin).
  ApproveItem { id: ItemId },
  /// Reject a pending item (admin).
  RejectItem { id: ItemId },
  /// Approve a claim; its item is marked claimed (admin).
  ApproveClaim { id: ClaimId },
  /// Reject a claim (admin).
  RejectClaim { id: ClaimId },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:       String,
  #[serde(default)]
  admin_key: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url:  args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:3000".to_string()),
    admin_key: args
      .admin_key
      .or_else(|| (!file_cfg.admin_key.is_empty()).then(|| file_cfg.admin_key.clone()))
      .unwrap_or_default(),
  };
  tracing::debug!(url = %api_config.base_url, "using registry");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command, args.json).await
}

async fn run(client: &ApiClient, command: Command, json_out: bool) -> Result<()> {
  match command {
    Command::Report { name, description, contact, location, photo_url, date } => {
      let item = client
        .report_item(&json!({
          "name":           name,
          "description":    description,
          "contact_info":   contact,
          "location_found": location,
          "photo_url":      photo_url,
          "date_found":     date,
        }))
        .await?;
      if json_out {
        return print_json(&item);
      }
      println!("Reported item #{}, pending admin review.", item.id);
    }

    Command::Claim { item_id, name, email, details } => {
      let created = client
        .submit_claim(&json!({
          "item_id":       item_id,
          "claimer_name":  name,
          "claimer_email": email,
          "match_details": details,
        }))
        .await?;
      if json_out {
        return print_json(&created);
      }
      println!("Claim #{}: {}", created.claim.id, created.message);
    }

    Command::List { query, oldest, limit } => {
      let sort = if oldest { FoundOrder::Oldest } else { FoundOrder::Newest };
      let items = client.list_items(query.as_deref(), sort, limit).await?;
      if json_out {
        return print_json(&items);
      }
      if items.is_empty() {
        println!("No matching items.");
      }
      for item in &items {
        print_item(item);
      }
    }

    Command::Dashboard => {
      let dashboard = client.dashboard().await?;
      if json_out {
        return print_json(&dashboard);
      }
      print_dashboard(&dashboard);
    }

    Command::ApproveItem { id } => {
      let decided = client.review_item(id, ItemStatus::Approved).await?;
      if json_out {
        return print_json(&decided);
      }
      println!("{}", decided.message);
      print_item(&decided.item);
    }
    Command::RejectItem { id } => {
      let decided = client.review_item(id, ItemStatus::Rejected).await?;
      if json_out {
        return print_json(&decided);
      }
      println!("{}", decided.message);
      print_item(&decided.item);
    }
    Command::ApproveClaim { id } => {
      let decided = client.review_claim(id, ClaimStatus::Approved).await?;
      if json_out {
        return print_json(&decided);
      }
      println!("{}", decided.message);
      if let Some(item) = decided.item.filter(|_| decided.cascaded) {
        println!("  item #{} \"{}\" is now {}", item.id, item.name, item.status);
      }
    }
    Command::RejectClaim { id } => {
      let decided = client.review_claim(id, ClaimStatus::Rejected).await?;
      if json_out {
        return print_json(&decided);
      }
      println!("{} (claim #{} by {})", decided.message, id, decided.claim.claimer_name);
    }
  }
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value).context("serialising output")?);
  Ok(())
}

fn print_item(item: &Item) {
  println!(
    "#{:<5} {:<14} {}  {}",
    item.id,
    item.status.to_string(),
    item.date_found,
    item.name
  );
  if let Some(location) = &item.location_found {
    println!("       found at {location}; contact {}", item.contact_info);
  }
}

fn print_dashboard(d: &Dashboard) {
  println!(
    "{} item(s), {} pending review; {} claim(s), {} new",
    d.items.len(),
    d.pending_items,
    d.claims.len(),
    d.new_claims
  );

  println!("\nItems");
  for item in &d.items {
    print_item(item);
  }

  println!("\nClaims");
  for s in &d.claims {
    println!(
      "#{:<5} {:<10} item #{} \"{}\" ({}) by {} <{}>",
      s.claim.id,
      s.claim.status.to_string(),
      s.claim.item_id,
      s.item_name,
      s.item_status,
      s.claim.claimer_name,
      s.claim.claimer_email
    );
  }
}
