//! In-memory data behind the dashboards.
//!
//! Seeded with demonstration records on construction and mutated by scans,
//! batch generation and counterfeit reports. Nothing is persisted. Every list
//! is kept newest first.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use truetrack_ids::{AlertId, ReportId};
use truetrack_scan::{CatalogVerifier, DecodedPayload, ProductMetadata, VerificationOutcome};

/// Product shown in the home page demo.
pub const DEMO_PRODUCT_ID: &str = "TT-2024-001";

const GENERATED_PRODUCT: &str = "New Medicine Batch";
const GENERATED_QUANTITY: u32 = 1000;
const UNKNOWN_PRODUCT: &str = "Medicine Sample";
const CURRENT_STORE: &str = "Current Store";

const BASE_TOTAL_PRODUCTS: u64 = 125_430;
const BASE_ACTIVE_QR_CODES: u64 = 124_987;
const BASE_FLAGGED_COUNTERFEITS: u64 = 443;
const BASE_ANOMALY_ALERTS: u64 = 26;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{payload} has already been reported as {report_id}")]
    AlreadyReported { payload: String, report_id: ReportId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Authentic,
    Counterfeit,
}

impl ProductStatus {
    pub fn from_authentic(is_authentic: bool) -> Self {
        if is_authentic {
            ProductStatus::Authentic
        } else {
            ProductStatus::Counterfeit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Authentic => "authentic",
            ProductStatus::Counterfeit => "counterfeit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Verified,
    Counterfeit,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Verified => "verified",
            ScanStatus::Counterfeit => "counterfeit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrBatch {
    pub id: String,
    pub batch: String,
    pub product: String,
    pub quantity: u32,
    pub generated: NaiveDate,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanLog {
    pub id: u64,
    pub product_id: String,
    pub location: String,
    pub timestamp: String,
    pub status: ScanStatus,
    pub retailer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    DuplicateScan,
    LocationMismatch,
    TimeAnomaly,
}

impl AnomalyKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::DuplicateScan => "Duplicate scan",
            AnomalyKind::LocationMismatch => "Location mismatch",
            AnomalyKind::TimeAnomaly => "Time anomaly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub id: u64,
    pub kind: AnomalyKind,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub id: String,
    pub product: String,
    pub batch: String,
    pub status: ProductStatus,
    pub scanned_at: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Suspicious,
    Counterfeit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetailerAlert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub message: String,
    pub time: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentVerification {
    pub id: String,
    pub product: String,
    pub status: ProductStatus,
    pub date: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterfeitReport {
    pub id: ReportId,
    pub payload: DecodedPayload,
    pub product_id: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyStep {
    pub step: u8,
    pub title: &'static str,
    pub location: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub status: StepStatus,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Journey {
    pub product_id: String,
    pub steps: Vec<JourneyStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    pub total_products: u64,
    pub active_qr_codes: u64,
    pub flagged_counterfeits: u64,
    pub anomaly_alerts: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatCard {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HowItWorksStep {
    pub step: u8,
    pub title: &'static str,
    pub description: &'static str,
}

pub const STATS: &[StatCard] = &[
    StatCard {
        value: "99.9%",
        label: "Security Accuracy",
        description: "Unbreakable encryption",
    },
    StatCard {
        value: "<100ms",
        label: "Verification Speed",
        description: "Real-time processing",
    },
    StatCard {
        value: "150+",
        label: "Countries Supported",
        description: "Global tracking network",
    },
    StatCard {
        value: "10K+",
        label: "Products Tracked",
        description: "Across all industries",
    },
];

pub const FEATURES: &[Feature] = &[
    Feature {
        title: "Cryptographic Security",
        description: "Each QR code is unique and tamper-proof.",
    },
    Feature {
        title: "Real-time Location",
        description: "Location verification prevents fraudulent scanning attempts.",
    },
    Feature {
        title: "Timestamp Verification",
        description: "Immutable time-stamping prevents backdated entries.",
    },
    Feature {
        title: "Single-Use Technology",
        description: "Each scan invalidates the QR code, preventing duplicate scans.",
    },
    Feature {
        title: "Zero Physical Duplication",
        description: "Digital-only QR codes that cannot be physically replicated.",
    },
    Feature {
        title: "Instant Verification",
        description: "Instant alerts for any suspicious activity.",
    },
];

pub const HOW_IT_WORKS: &[HowItWorksStep] = &[
    HowItWorksStep {
        step: 1,
        title: "Product Registration",
        description: "Register your product with unique identifiers and metadata",
    },
    HowItWorksStep {
        step: 2,
        title: "QR Generation",
        description: "Cryptographic QR code is generated with timestamp and location data",
    },
    HowItWorksStep {
        step: 3,
        title: "Secure Scanning",
        description: "Each scan validates authenticity and updates tracking status",
    },
    HowItWorksStep {
        step: 4,
        title: "Verification Complete",
        description: "Real-time status updates with tamper-proof audit trail",
    },
];

const JOURNEY_STEPS: &[JourneyStep] = &[
    JourneyStep {
        step: 1,
        title: "Manufacturing",
        location: "Pharma Corp Ltd, Mumbai",
        date: "2024-01-10",
        time: "09:00 AM",
        status: StepStatus::Completed,
        description: "Product manufactured and quality tested",
    },
    JourneyStep {
        step: 2,
        title: "Distribution Center",
        location: "Central Warehouse, Delhi",
        date: "2024-01-12",
        time: "02:30 PM",
        status: StepStatus::Completed,
        description: "Received at distribution center, inventory updated",
    },
    JourneyStep {
        step: 3,
        title: "Regional Hub",
        location: "South Regional Hub, Bangalore",
        date: "2024-01-13",
        time: "11:15 AM",
        status: StepStatus::Completed,
        description: "Transferred to regional distribution hub",
    },
    JourneyStep {
        step: 4,
        title: "Retail Store",
        location: "HealthPlus Pharmacy, Bangalore",
        date: "2024-01-14",
        time: "04:20 PM",
        status: StepStatus::Completed,
        description: "Delivered to retail pharmacy, ready for sale",
    },
    JourneyStep {
        step: 5,
        title: "Customer Purchase",
        location: "HealthPlus Pharmacy, Bangalore",
        date: "2024-01-15",
        time: "02:30 PM",
        status: StepStatus::Current,
        description: "Product verified and purchased by customer",
    },
];

fn product(
    product_id: &str,
    name: &str,
    manufacturer: &str,
    batch_number: &str,
    expiry_date: &str,
    purchase_location: &str,
    scan_location: &str,
) -> ProductMetadata {
    ProductMetadata {
        product_id: product_id.to_string(),
        name: name.to_string(),
        manufacturer: manufacturer.to_string(),
        batch_number: batch_number.to_string(),
        expiry_date: expiry_date.to_string(),
        purchase_location: purchase_location.to_string(),
        scan_location: scan_location.to_string(),
    }
}

/// Record used for codes that are not in the catalog.
fn fallback_product() -> ProductMetadata {
    product(
        "",
        "Amoxicillin 500mg Capsules",
        "PharmaCorp Ltd.",
        "AMX-2024-0156",
        "2025-12-31",
        "City Pharmacy, 123 Main St, San Francisco, CA",
        "San Francisco, CA",
    )
}

fn seeded_catalog() -> Vec<ProductMetadata> {
    vec![
        product(
            "TT-001",
            "Paracetamol 500mg",
            "Pharma Corp Ltd",
            "B2024001",
            "2026-01-31",
            "HealthPlus Pharmacy",
            "Mumbai, India",
        ),
        product(
            "TT-002",
            "Insulin Pen",
            "Pharma Corp Ltd",
            "B2024002",
            "2025-06-30",
            "MediCare Store",
            "Delhi, India",
        ),
        product(
            "TT-003",
            "Vitamin D3",
            "Pharma Corp Ltd",
            "B2024003",
            "2026-03-31",
            "Apollo Pharmacy",
            "Bangalore, India",
        ),
        product(
            "TT-12345",
            "Paracetamol 500mg",
            "Pharma Corp Ltd",
            "B2024001",
            "2026-01-31",
            "Apollo Pharmacy",
            "Bangalore, India",
        ),
        product(
            "TT-12346",
            "Vitamin D3",
            "Pharma Corp Ltd",
            "B2024003",
            "2026-03-31",
            "MedPlus",
            "Bangalore, India",
        ),
        product(
            "TT-12347",
            "Insulin Pen",
            "Pharma Corp Ltd",
            "B2024002",
            "2025-06-30",
            "Local Store",
            "Bangalore, India",
        ),
        product(
            DEMO_PRODUCT_ID,
            "Paracetamol 500mg",
            "Pharma Corp Ltd",
            "B2024001",
            "2026-01-31",
            "HealthPlus Pharmacy, Bangalore",
            "Bangalore, India",
        ),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
struct SeedCounts {
    qr_batches: usize,
    scan_logs: usize,
    anomalies: usize,
}

#[derive(Debug, Clone)]
pub struct Repository {
    catalog: Vec<ProductMetadata>,
    counterfeits: Vec<String>,
    qr_batches: Vec<QrBatch>,
    scan_logs: Vec<ScanLog>,
    anomalies: Vec<Anomaly>,
    inventory: Vec<InventoryEntry>,
    alerts: Vec<RetailerAlert>,
    recent: Vec<RecentVerification>,
    reports: Vec<CounterfeitReport>,
    next_scan_log_id: u64,
    seeded: SeedCounts,
}

impl Default for Repository {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Repository {
    pub fn seeded() -> Self {
        let qr_batches = vec![
            QrBatch {
                id: "QR-001".into(),
                batch: "B2024001".into(),
                product: "Paracetamol 500mg".into(),
                quantity: 1000,
                generated: date(2024, 1, 15),
                status: BatchStatus::Active,
            },
            QrBatch {
                id: "QR-002".into(),
                batch: "B2024002".into(),
                product: "Insulin Pen".into(),
                quantity: 500,
                generated: date(2024, 1, 14),
                status: BatchStatus::Active,
            },
        ];
        let scan_logs = vec![
            scan_log(1, "TT-001", "Mumbai, India", "2024-01-15 14:30", ScanStatus::Verified, "HealthPlus Pharmacy"),
            scan_log(2, "TT-002", "Delhi, India", "2024-01-15 14:25", ScanStatus::Counterfeit, "MediCare Store"),
            scan_log(3, "TT-003", "Bangalore, India", "2024-01-15 14:20", ScanStatus::Verified, "Apollo Pharmacy"),
        ];
        let anomalies = vec![
            Anomaly {
                id: 1,
                kind: AnomalyKind::DuplicateScan,
                description: "Same QR code scanned multiple times".into(),
                location: "Mumbai".into(),
                severity: Severity::High,
                count: 15,
            },
            Anomaly {
                id: 2,
                kind: AnomalyKind::LocationMismatch,
                description: "Product scanned far from expected location".into(),
                location: "Kolkata".into(),
                severity: Severity::Medium,
                count: 3,
            },
            Anomaly {
                id: 3,
                kind: AnomalyKind::TimeAnomaly,
                description: "Scanning pattern indicates automated activity".into(),
                location: "Chennai".into(),
                severity: Severity::High,
                count: 8,
            },
        ];
        let inventory = vec![
            inventory_entry("TT-001", "Paracetamol 500mg", "B2024001", ProductStatus::Authentic, "2024-01-15 14:30"),
            inventory_entry("TT-002", "Insulin Pen", "B2024002", ProductStatus::Counterfeit, "2024-01-15 14:25"),
            inventory_entry("TT-003", "Vitamin D3", "B2024003", ProductStatus::Authentic, "2024-01-15 14:20"),
        ];
        let alerts = vec![
            RetailerAlert {
                id: AlertId::new(),
                kind: AlertKind::Suspicious,
                message: "Duplicate QR code detected".into(),
                time: "10:30 AM".into(),
                product: "Paracetamol 500mg".into(),
            },
            RetailerAlert {
                id: AlertId::new(),
                kind: AlertKind::Counterfeit,
                message: "Counterfeit product scanned".into(),
                time: "09:15 AM".into(),
                product: "Insulin Pen".into(),
            },
        ];
        let recent = vec![
            recent("TT-12345", "Paracetamol 500mg", ProductStatus::Authentic, "Today, 2:30 PM", "Apollo Pharmacy"),
            recent("TT-12346", "Vitamin D3", ProductStatus::Authentic, "Yesterday, 4:15 PM", "MedPlus"),
            recent("TT-12347", "Insulin Pen", ProductStatus::Counterfeit, "2 days ago, 10:20 AM", "Local Store"),
        ];

        let seeded = SeedCounts {
            qr_batches: qr_batches.len(),
            scan_logs: scan_logs.len(),
            anomalies: anomalies.len(),
        };
        Self {
            catalog: seeded_catalog(),
            counterfeits: vec!["TT-002".into(), "TT-12347".into()],
            next_scan_log_id: scan_logs.len() as u64 + 1,
            qr_batches,
            scan_logs,
            anomalies,
            inventory,
            alerts,
            recent,
            reports: Vec::new(),
            seeded,
        }
    }

    /// Verifier over this repository's catalog and counterfeit registry.
    pub fn verifier(&self) -> CatalogVerifier {
        self.counterfeits.iter().fold(
            CatalogVerifier::new(fallback_product()).with_products(self.catalog.iter().cloned()),
            |verifier, id| verifier.with_counterfeit(id.clone()),
        )
    }

    pub fn product(&self, product_id: &str) -> Option<&ProductMetadata> {
        self.catalog.iter().find(|p| p.product_id == product_id)
    }

    pub fn list_products(&self) -> &[ProductMetadata] {
        &self.catalog
    }

    pub fn list_qr_batches(&self) -> &[QrBatch] {
        &self.qr_batches
    }

    pub fn list_scan_logs(&self) -> &[ScanLog] {
        &self.scan_logs
    }

    pub fn list_anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn list_inventory(&self) -> &[InventoryEntry] {
        &self.inventory
    }

    pub fn list_alerts(&self) -> &[RetailerAlert] {
        &self.alerts
    }

    pub fn list_recent_verifications(&self) -> &[RecentVerification] {
        &self.recent
    }

    pub fn list_reports(&self) -> &[CounterfeitReport] {
        &self.reports
    }

    pub fn stats(&self) -> &'static [StatCard] {
        STATS
    }

    pub fn features(&self) -> &'static [Feature] {
        FEATURES
    }

    pub fn how_it_works(&self) -> &'static [HowItWorksStep] {
        HOW_IT_WORKS
    }

    /// Next batch of 1000 codes, numbered after the existing batches.
    pub fn generate_batch(&mut self, today: NaiveDate) -> QrBatch {
        let n = self.qr_batches.len() + 1;
        let batch = QrBatch {
            id: format!("QR-{:03}", n),
            batch: format!("B2024{:03}", n),
            product: GENERATED_PRODUCT.to_string(),
            quantity: GENERATED_QUANTITY,
            generated: today,
            status: BatchStatus::Active,
        };
        tracing::info!(id = %batch.id, batch = %batch.batch, "generated QR batch");
        self.qr_batches.insert(0, batch.clone());
        batch
    }

    /// Add a retailer's scan to inventory. Inauthentic products also raise an
    /// alert, returned alongside the entry.
    pub fn record_retail_scan(
        &mut self,
        outcome: &VerificationOutcome,
        now: DateTime<Local>,
    ) -> (InventoryEntry, Option<RetailerAlert>) {
        let product = self
            .product(&outcome.product.product_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        let entry = InventoryEntry {
            id: outcome.payload.as_str().to_string(),
            product,
            batch: format!("B{}", now.timestamp_millis()),
            status: ProductStatus::from_authentic(outcome.is_authentic),
            scanned_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            location: CURRENT_STORE.to_string(),
        };
        self.inventory.insert(0, entry.clone());

        let alert = (!outcome.is_authentic).then(|| RetailerAlert {
            id: AlertId::new(),
            kind: AlertKind::Counterfeit,
            message: "Counterfeit product detected in scan".to_string(),
            time: now.format("%I:%M:%S %p").to_string(),
            product: entry.product.clone(),
        });
        if let Some(alert) = &alert {
            tracing::warn!(product = %alert.product, "counterfeit detected in retail scan");
            self.alerts.insert(0, alert.clone());
        }
        (entry, alert)
    }

    /// Add a customer's verification to their history and to the scan log.
    pub fn record_verification(
        &mut self,
        outcome: &VerificationOutcome,
        now: DateTime<Local>,
    ) -> RecentVerification {
        let status = ProductStatus::from_authentic(outcome.is_authentic);
        let entry = RecentVerification {
            id: outcome.payload.as_str().to_string(),
            product: outcome.product.name.clone(),
            status,
            date: now.format("%Y-%m-%d %H:%M").to_string(),
            location: outcome.product.purchase_location.clone(),
        };
        self.recent.insert(0, entry.clone());

        let log = scan_log(
            self.next_scan_log_id,
            &outcome.product.product_id,
            &outcome.product.scan_location,
            &now.format("%Y-%m-%d %H:%M").to_string(),
            match status {
                ProductStatus::Authentic => ScanStatus::Verified,
                ProductStatus::Counterfeit => ScanStatus::Counterfeit,
            },
            &outcome.product.purchase_location,
        );
        self.next_scan_log_id += 1;
        self.scan_logs.insert(0, log);
        entry
    }

    pub fn report_counterfeit(
        &mut self,
        payload: &DecodedPayload,
        now: DateTime<Utc>,
    ) -> Result<ReportId, RepositoryError> {
        if let Some(existing) = self.reports.iter().find(|r| &r.payload == payload) {
            return Err(RepositoryError::AlreadyReported {
                payload: payload.as_str().to_string(),
                report_id: existing.id.clone(),
            });
        }
        let report = CounterfeitReport {
            id: ReportId::new(),
            payload: payload.clone(),
            product_id: payload.product_id().unwrap_or(payload.as_str()).to_string(),
            reported_at: now,
        };
        tracing::info!(report_id = %report.id, product_id = %report.product_id, "counterfeit reported");
        let id = report.id.clone();
        self.reports.push(report);
        Ok(id)
    }

    /// Supply chain history of a product. Every product follows the same
    /// five-step route.
    pub fn journey(&self, product_id: &str) -> Journey {
        Journey {
            product_id: product_id.to_string(),
            steps: JOURNEY_STEPS.to_vec(),
        }
    }

    pub fn admin_summary(&self) -> AdminSummary {
        let generated: u64 = self.qr_batches[..self.qr_batches.len() - self.seeded.qr_batches]
            .iter()
            .map(|b| u64::from(b.quantity))
            .sum();
        let live_logs = &self.scan_logs[..self.scan_logs.len() - self.seeded.scan_logs];
        let live_counterfeits = live_logs
            .iter()
            .filter(|log| log.status == ScanStatus::Counterfeit)
            .count() as u64;

        AdminSummary {
            total_products: BASE_TOTAL_PRODUCTS + generated,
            active_qr_codes: BASE_ACTIVE_QR_CODES + generated,
            flagged_counterfeits: BASE_FLAGGED_COUNTERFEITS
                + live_counterfeits
                + self.reports.len() as u64,
            anomaly_alerts: BASE_ANOMALY_ALERTS
                + (self.anomalies.len() - self.seeded.anomalies) as u64,
        }
    }
}

fn scan_log(
    id: u64,
    product_id: &str,
    location: &str,
    timestamp: &str,
    status: ScanStatus,
    retailer: &str,
) -> ScanLog {
    ScanLog {
        id,
        product_id: product_id.to_string(),
        location: location.to_string(),
        timestamp: timestamp.to_string(),
        status,
        retailer: retailer.to_string(),
    }
}

fn inventory_entry(
    id: &str,
    product: &str,
    batch: &str,
    status: ProductStatus,
    scanned_at: &str,
) -> InventoryEntry {
    InventoryEntry {
        id: id.to_string(),
        product: product.to_string(),
        batch: batch.to_string(),
        status,
        scanned_at: scanned_at.to_string(),
        location: "Store A".to_string(),
    }
}

fn recent(
    id: &str,
    product: &str,
    status: ProductStatus,
    date: &str,
    location: &str,
) -> RecentVerification {
    RecentVerification {
        id: id.to_string(),
        product: product.to_string(),
        status,
        date: date.to_string(),
        location: location.to_string(),
    }
}
