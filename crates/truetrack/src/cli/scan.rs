//! `truetrack scan`: one headless scan session against the simulated camera.

use anyhow::{anyhow, Result};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use truetrack::repository::{InventoryEntry, RecentVerification, RetailerAlert};
use truetrack::{build_context, simulated_decoder, Repository, Settings};
use truetrack_audit::{AuditObserver, AuditWriter};
use truetrack_scan::{
    DecodeAdapter, ErrorKind, ScriptedDecoder, SessionId, SessionObserver, SessionState,
    VerificationOutcome, Verifier,
};

use crate::cli::error::HelpfulError;
use crate::cli::output::print_table_colored;
use crate::cli::output::{plain, status};
use crate::cli::verify::print_outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanRole {
    /// Verify a purchase and add it to the customer's history
    Customer,
    /// Scan stock into inventory
    Retailer,
}

#[derive(Debug, clap::Args)]
pub struct ScanArgs {
    /// Decode these codes in order instead of running the simulated decoder.
    /// Only the first decoded code is used.
    #[arg(long = "payload", value_name = "CODE")]
    pub payloads: Vec<String>,

    /// Refuse camera access, as if the permission prompt was declined
    #[arg(long)]
    pub deny_camera: bool,

    /// Who is scanning
    #[arg(long, value_enum, default_value_t = ScanRole::Customer)]
    pub role: ScanRole,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Recorded {
    Verification(RecentVerification),
    Inventory {
        inventory: InventoryEntry,
        alert: Option<RetailerAlert>,
    },
}

#[derive(Debug, Serialize)]
struct ScanReport {
    session_id: SessionId,
    state: SessionState,
    role: ScanRole,
    outcome: VerificationOutcome,
    recorded: Recorded,
}

pub async fn run(args: ScanArgs, audit: Option<Arc<AuditWriter>>) -> Result<()> {
    let mut settings = Settings::load().map_err(HelpfulError::from)?;
    if args.deny_camera {
        settings.camera.deny_permission = true;
    }

    let decoder: Arc<dyn DecodeAdapter> = if args.payloads.is_empty() {
        Arc::new(simulated_decoder(&settings))
    } else {
        Arc::new(ScriptedDecoder::payloads(args.payloads.clone()).ending())
    };
    let observer = audit
        .clone()
        .map(|writer| Arc::new(AuditObserver::new(writer)) as Arc<dyn SessionObserver>);
    let ctx = build_context(&settings, decoder, observer);

    let mut session = ctx.session();
    if !args.json {
        println!("Scanning with the {} camera...", settings.scan.facing);
    }
    session.start().await?;
    let state = session.drive().await;
    if state != SessionState::Resulted {
        let kind = session.error().unwrap_or(ErrorKind::Unknown);
        return Err(HelpfulError::scan_failed(kind).into());
    }
    let payload = session
        .payload()
        .cloned()
        .ok_or_else(|| anyhow!("session {} finished without a payload", session.id()))?;
    info!(session_id = %session.id(), "scan finished");

    let mut repo = Repository::seeded();
    let outcome = repo
        .verifier()
        .verify(&payload)
        .map_err(|err| HelpfulError::invalid_payload(payload.as_str(), &err))?;
    if let Some(writer) = &audit {
        if let Err(err) = writer.record_verification(Some(session.id()), &outcome) {
            warn!(error = %err, "audit write failed");
        }
    }

    let recorded = match args.role {
        ScanRole::Customer => Recorded::Verification(repo.record_verification(&outcome, Local::now())),
        ScanRole::Retailer => {
            let (inventory, alert) = repo.record_retail_scan(&outcome, Local::now());
            Recorded::Inventory { inventory, alert }
        }
    };

    let report = ScanReport {
        session_id: session.id().clone(),
        state,
        role: args.role,
        outcome,
        recorded,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!("Session {} decoded a code.", report.session_id.short());
    println!();
    print_outcome(&report.outcome);

    match &report.recorded {
        Recorded::Verification(entry) => {
            println!();
            println!("Added to your verification history ({}).", entry.date);
        }
        Recorded::Inventory { inventory, alert } => {
            println!();
            print_table_colored(
                &["Code", "Product", "Batch", "Status", "Scanned", "Location"],
                vec![vec![
                    plain(&inventory.id),
                    plain(&inventory.product),
                    plain(&inventory.batch),
                    status(inventory.status.as_str()),
                    plain(&inventory.scanned_at),
                    plain(&inventory.location),
                ]],
            );
            if let Some(alert) = alert {
                println!("ALERT: {} ({})", alert.message, alert.product);
            }
        }
    }
}
