//! `truetrack journey <product-id>`

use anyhow::Result;
use truetrack::repository::StepStatus;
use truetrack::Repository;

use crate::cli::output::{plain, print_table_colored, status};

#[derive(Debug, clap::Args)]
pub struct JourneyArgs {
    /// Product id, e.g. TT-12345
    pub product_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: JourneyArgs) -> Result<()> {
    let repo = Repository::seeded();
    let journey = repo.journey(&args.product_id);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&journey)?);
        return Ok(());
    }

    println!("PRODUCT JOURNEY: {}", journey.product_id);
    if let Some(product) = repo.product(&journey.product_id) {
        println!("{} by {}", product.name, product.manufacturer);
    }
    print_table_colored(
        &["#", "Stage", "Location", "Date", "Status", "Details"],
        journey
            .steps
            .iter()
            .map(|step| {
                let state = match step.status {
                    StepStatus::Completed => "completed",
                    StepStatus::Current => "current",
                };
                vec![
                    plain(step.step.to_string()),
                    plain(step.title),
                    plain(step.location),
                    plain(format!("{} {}", step.date, step.time)),
                    status(state),
                    plain(step.description),
                ]
            })
            .collect(),
    );
    Ok(())
}
