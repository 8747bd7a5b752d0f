//! `truetrack dashboard <view>`: the dashboard tables without the TUI.

use anyhow::Result;
use serde::Serialize;
use truetrack::repository::{
    AdminSummary, Anomaly, InventoryEntry, QrBatch, RecentVerification, RetailerAlert, ScanLog,
};
use truetrack::Repository;

use crate::cli::output::{format_number, plain, print_table, print_table_colored, status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DashboardView {
    Customer,
    Retailer,
    Admin,
}

#[derive(Debug, clap::Args)]
pub struct DashboardArgs {
    /// Which dashboard to print
    #[arg(value_enum)]
    pub view: DashboardView,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct CustomerDashboard<'a> {
    recent_verifications: &'a [RecentVerification],
}

#[derive(Serialize)]
struct RetailerDashboard<'a> {
    inventory: &'a [InventoryEntry],
    alerts: &'a [RetailerAlert],
}

#[derive(Serialize)]
struct AdminDashboard<'a> {
    summary: AdminSummary,
    qr_batches: &'a [QrBatch],
    scan_logs: &'a [ScanLog],
    anomalies: &'a [Anomaly],
}

pub fn run(args: DashboardArgs) -> Result<()> {
    let repo = Repository::seeded();
    match args.view {
        DashboardView::Customer => {
            let data = CustomerDashboard {
                recent_verifications: repo.list_recent_verifications(),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_customer(&data);
            }
        }
        DashboardView::Retailer => {
            let data = RetailerDashboard {
                inventory: repo.list_inventory(),
                alerts: repo.list_alerts(),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_retailer(&data);
            }
        }
        DashboardView::Admin => {
            let data = AdminDashboard {
                summary: repo.admin_summary(),
                qr_batches: repo.list_qr_batches(),
                scan_logs: repo.list_scan_logs(),
                anomalies: repo.list_anomalies(),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_admin(&data);
            }
        }
    }
    Ok(())
}

fn print_customer(data: &CustomerDashboard<'_>) {
    println!("RECENT VERIFICATIONS");
    print_table_colored(
        &["Code", "Product", "Status", "When", "Where"],
        data.recent_verifications
            .iter()
            .map(|v| {
                vec![
                    plain(&v.id),
                    plain(&v.product),
                    status(v.status.as_str()),
                    plain(&v.date),
                    plain(&v.location),
                ]
            })
            .collect(),
    );
}

fn print_retailer(data: &RetailerDashboard<'_>) {
    println!("INVENTORY");
    print_table_colored(
        &["Code", "Product", "Batch", "Status", "Scanned", "Location"],
        data.inventory
            .iter()
            .map(|e| {
                vec![
                    plain(&e.id),
                    plain(&e.product),
                    plain(&e.batch),
                    status(e.status.as_str()),
                    plain(&e.scanned_at),
                    plain(&e.location),
                ]
            })
            .collect(),
    );
    println!();
    println!("ALERTS ({})", data.alerts.len());
    print_table(
        &["Time", "Message", "Product"],
        data.alerts
            .iter()
            .map(|a| vec![a.time.clone(), a.message.clone(), a.product.clone()])
            .collect(),
    );
}

fn print_admin(data: &AdminDashboard<'_>) {
    let s = &data.summary;
    println!("SYSTEM OVERVIEW");
    print_table(
        &["Total Products", "Active QR Codes", "Flagged Counterfeits", "Anomaly Alerts"],
        vec![vec![
            format_number(s.total_products),
            format_number(s.active_qr_codes),
            format_number(s.flagged_counterfeits),
            format_number(s.anomaly_alerts),
        ]],
    );
    println!();
    println!("QR BATCHES");
    print_table(
        &["ID", "Batch", "Product", "Quantity", "Generated"],
        data.qr_batches
            .iter()
            .map(|b| {
                vec![
                    b.id.clone(),
                    b.batch.clone(),
                    b.product.clone(),
                    format_number(u64::from(b.quantity)),
                    b.generated.to_string(),
                ]
            })
            .collect(),
    );
    println!();
    println!("SCAN LOGS");
    print_table_colored(
        &["Product", "Location", "Time", "Status", "Retailer"],
        data.scan_logs
            .iter()
            .map(|l| {
                vec![
                    plain(&l.product_id),
                    plain(&l.location),
                    plain(&l.timestamp),
                    status(l.status.as_str()),
                    plain(&l.retailer),
                ]
            })
            .collect(),
    );
    println!();
    println!("ANOMALIES");
    print_table_colored(
        &["Type", "Description", "Location", "Severity", "Count"],
        data.anomalies
            .iter()
            .map(|a| {
                vec![
                    plain(a.kind.label()),
                    plain(&a.description),
                    plain(&a.location),
                    status(a.severity.as_str()),
                    plain(a.count.to_string()),
                ]
            })
            .collect(),
    );
}
