//! `truetrack verify <payload>`: verification without a camera.

use anyhow::Result;
use std::sync::Arc;
use truetrack::Repository;
use truetrack_audit::AuditWriter;
use truetrack_scan::{DecodedPayload, VerificationOutcome, Verifier};

use crate::cli::error::HelpfulError;
use crate::cli::output::{plain, print_table_colored, status};

#[derive(Debug, clap::Args)]
pub struct VerifyArgs {
    /// Decoded code text, e.g. TT-12345
    pub payload: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: VerifyArgs, audit: Option<Arc<AuditWriter>>) -> Result<()> {
    let repo = Repository::seeded();
    let payload = DecodedPayload::new(args.payload);
    let outcome = repo
        .verifier()
        .verify(&payload)
        .map_err(|err| HelpfulError::invalid_payload(payload.as_str(), &err))?;

    if let Some(writer) = &audit {
        if let Err(err) = writer.record_verification(None, &outcome) {
            tracing::warn!(error = %err, "audit write failed");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

/// Headline plus product details, shared with `truetrack scan`.
pub fn print_outcome(outcome: &VerificationOutcome) {
    let verdict = if outcome.is_authentic {
        "authentic"
    } else {
        "counterfeit"
    };
    println!("{}", outcome.verdict.headline());
    println!("{}", outcome.verdict.detail());
    println!();

    let product = &outcome.product;
    print_table_colored(
        &["Field", "Value"],
        vec![
            vec![plain("Code"), plain(outcome.payload.as_str())],
            vec![plain("Status"), status(verdict)],
            vec![plain("Product"), plain(&product.name)],
            vec![plain("Manufacturer"), plain(&product.manufacturer)],
            vec![plain("Batch"), plain(&product.batch_number)],
            vec![plain("Expiry"), plain(&product.expiry_date)],
            vec![plain("Purchase location"), plain(&product.purchase_location)],
            vec![plain("Scan location"), plain(&product.scan_location)],
            vec![plain("Verified by"), plain(&outcome.verified_by)],
        ],
    );
}
