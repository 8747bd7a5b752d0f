//! Application state for the TUI
//!
//! A scan runs on spawned tasks so the screen keeps drawing: camera
//! acquisition is awaited on its own task, then decode attempts are forwarded
//! to a channel and drained on every tick. Leaving the screen that owns a scan
//! tears it down.

use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use truetrack::repository::{Journey, DEMO_PRODUCT_ID};
use truetrack::{
    build_context, simulated_decoder, Credentials, Repository, RepositoryError, Role, Settings,
};
use truetrack_audit::{AuditObserver, AuditWriter};
use truetrack_ids::ReportId;
use truetrack_scan::{
    CatalogVerifier, DecodedPayload, ErrorKind, ScanContext, ScanSession, SessionObserver,
    SessionState, SingleUseVerifier, Verdict, VerificationOutcome, Verifier,
};

use super::nav;

#[path = "views/admin.rs"]
mod admin;
#[path = "views/customer.rs"]
mod customer;
#[path = "views/home.rs"]
mod home;
#[path = "views/journey.rs"]
mod journey;
#[path = "views/login.rs"]
mod login;
#[path = "views/retailer.rs"]
mod retailer;

const STATUS_TTL: Duration = Duration::from_secs(4);

/// Current TUI mode/screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TuiMode {
    #[default]
    Home,
    Login,
    Customer,
    Retailer,
    Admin,
    Journey,
}

impl TuiMode {
    pub fn title(&self) -> &'static str {
        match self {
            TuiMode::Home => "Home",
            TuiMode::Login => "Sign In",
            TuiMode::Customer => "Verify Product",
            TuiMode::Retailer => "Retailer Dashboard",
            TuiMode::Admin => "Admin Dashboard",
            TuiMode::Journey => "Product Journey",
        }
    }

    /// Role a user must be signed in as to open this screen.
    fn required_role(&self) -> Option<Role> {
        match self {
            TuiMode::Retailer => Some(Role::Retailer),
            TuiMode::Admin => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Who a scan is for; decides what happens with the decoded code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPurpose {
    Customer,
    Retailer,
}

enum ScanPhase {
    /// Camera acquisition in flight on its own task.
    Starting(JoinHandle<ScanSession>),
    Running(ScanSession),
}

pub struct ActiveScan {
    pub purpose: ScanPurpose,
    pub started_at: Instant,
    phase: ScanPhase,
}

impl ActiveScan {
    /// `Acquiring` until the acquisition task reports back.
    pub fn state(&self) -> SessionState {
        match &self.phase {
            ScanPhase::Starting(_) => SessionState::Acquiring,
            ScanPhase::Running(session) => session.state(),
        }
    }
}

/// Result modal for a customer scan. Holds the `Resulted` session until the
/// user dismisses it.
pub struct VerificationModal {
    pub outcome: VerificationOutcome,
    pub report: Option<ReportStatus>,
    session: ScanSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Filed(ReportId),
    AlreadyFiled(ReportId),
}

/// Dismissible failure notice for a `Closed` session.
pub struct ScanNotice {
    pub error: ErrorKind,
    session: ScanSession,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    Role,
    #[default]
    Email,
    Password,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Role => LoginField::Email,
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Role,
        }
    }

    fn prev(self) -> Self {
        match self {
            LoginField::Role => LoginField::Password,
            LoginField::Email => LoginField::Role,
            LoginField::Password => LoginField::Email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub role: Role,
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            role: Role::Retailer,
            email: String::new(),
            password: String::new(),
            focus: LoginField::default(),
            error: None,
        }
    }
}

/// Last run of the home page single-use demo.
#[derive(Debug, Clone)]
pub struct DemoResult {
    pub outcome: VerificationOutcome,
    pub attempt: usize,
}

impl DemoResult {
    pub fn label(&self) -> &'static str {
        match self.outcome.verdict {
            Verdict::Genuine => "Verified",
            Verdict::DuplicateScan => "Blocked",
            Verdict::KnownCounterfeit | Verdict::ChecksumMismatch => "Counterfeit",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub demo: Option<DemoResult>,
    pub attempts: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerState {
    pub selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetailerTab {
    #[default]
    Scan,
    Inventory,
    Alerts,
}

#[derive(Debug, Clone, Default)]
pub struct RetailerState {
    pub tab: RetailerTab,
    pub selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Dashboard,
    Generate,
    Tracking,
    Anomalies,
}

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub tab: AdminTab,
}

#[derive(Debug, Clone)]
pub struct JourneyState {
    pub journey: Journey,
    pub return_to: TuiMode,
}

pub struct App {
    pub running: bool,
    pub mode: TuiMode,
    pub show_help: bool,
    pub settings: Settings,
    pub repo: Repository,
    pub signed_in: Option<Role>,
    pub login: LoginState,
    pub home: HomeState,
    pub customer: CustomerState,
    pub retailer: RetailerState,
    pub admin: AdminState,
    pub journey: Option<JourneyState>,
    pub scan: Option<ActiveScan>,
    pub verification: Option<VerificationModal>,
    pub notice: Option<ScanNotice>,
    pub status: Option<StatusLine>,
    ctx: ScanContext,
    audit: Option<Arc<AuditWriter>>,
    customer_verifier: SingleUseVerifier<CatalogVerifier>,
    retail_verifier: CatalogVerifier,
    demo_verifier: SingleUseVerifier<CatalogVerifier>,
}

impl App {
    /// App wired to the simulated camera and decoder from `settings`.
    pub fn new(settings: Settings, audit: Option<Arc<AuditWriter>>) -> Self {
        let observer = audit
            .clone()
            .map(|writer| Arc::new(AuditObserver::new(writer)) as Arc<dyn SessionObserver>);
        let ctx = build_context(&settings, Arc::new(simulated_decoder(&settings)), observer);
        Self::with_context(settings, ctx, audit)
    }

    pub fn with_context(
        settings: Settings,
        ctx: ScanContext,
        audit: Option<Arc<AuditWriter>>,
    ) -> Self {
        let repo = Repository::seeded();
        let customer_verifier = SingleUseVerifier::new(repo.verifier());
        let retail_verifier = repo.verifier();
        let demo_verifier = SingleUseVerifier::new(repo.verifier());
        Self {
            running: true,
            mode: TuiMode::Home,
            show_help: false,
            settings,
            repo,
            signed_in: None,
            login: LoginState::default(),
            home: HomeState::default(),
            customer: CustomerState::default(),
            retailer: RetailerState::default(),
            admin: AdminState::default(),
            journey: None,
            scan: None,
            verification: None,
            notice: None,
            status: None,
            ctx,
            audit,
            customer_verifier,
            retail_verifier,
            demo_verifier,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    /// Keys are typed into a field rather than treated as commands.
    pub fn in_text_input_mode(&self) -> bool {
        self.mode == TuiMode::Login && self.login.focus != LoginField::Role
    }

    /// Protected screens route through sign-in first.
    fn navigate_to_mode(&mut self, mode: TuiMode) {
        if let Some(role) = mode.required_role() {
            if self.signed_in != Some(role) {
                self.login.role = role;
                self.login.focus = LoginField::Email;
                self.login.error = None;
                self.set_mode(TuiMode::Login);
                return;
            }
        }
        self.set_mode(mode);
    }

    fn set_mode(&mut self, mode: TuiMode) {
        if self.mode != mode {
            self.teardown_scan();
            debug!(from = ?self.mode, to = ?mode, "switching screen");
        }
        self.mode = mode;
    }

    fn go_back(&mut self) {
        match self.mode {
            TuiMode::Home => {}
            TuiMode::Journey => {
                let target = self
                    .journey
                    .take()
                    .map(|state| state.return_to)
                    .unwrap_or(TuiMode::Customer);
                self.set_mode(target);
            }
            TuiMode::Login | TuiMode::Customer | TuiMode::Retailer | TuiMode::Admin => {
                self.set_mode(TuiMode::Home)
            }
        }
    }

    fn quit(&mut self) {
        self.teardown_scan();
        self.running = false;
    }

    fn sign_out(&mut self) {
        if let Some(role) = self.signed_in.take() {
            info!(role = %role, "signed out");
            self.set_status(format!("Signed out of the {} dashboard", role.label()), false);
        }
        self.set_mode(TuiMode::Home);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        // Modals own the keyboard until dismissed.
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.dismiss_notice();
            }
            return;
        }
        if self.verification.is_some() {
            self.handle_verification_key(key);
            return;
        }

        if self.scan.is_some() && key.code == KeyCode::Esc {
            self.cancel_scan();
            return;
        }

        if !self.in_text_input_mode() {
            match key.code {
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return;
                }
                KeyCode::Char('q') => {
                    self.quit();
                    return;
                }
                KeyCode::Char(c) => {
                    if let Some(mode) = nav::nav_mode_for_key(c) {
                        self.navigate_to_mode(mode);
                        return;
                    }
                }
                _ => {}
            }
        }

        // While scanning only navigation and cancel apply.
        if self.scan.is_some() {
            return;
        }

        match self.mode {
            TuiMode::Home => self.handle_home_key(key),
            TuiMode::Login => self.handle_login_key(key),
            TuiMode::Customer => self.handle_customer_key(key),
            TuiMode::Retailer => self.handle_retailer_key(key),
            TuiMode::Admin => self.handle_admin_key(key),
            TuiMode::Journey => self.handle_journey_key(key),
        }
    }

    pub async fn tick(&mut self) {
        if let Some(status) = &self.status {
            if status.expires_at <= Instant::now() {
                self.status = None;
            }
        }
        self.poll_scan().await;
    }

    fn start_scan(&mut self, purpose: ScanPurpose) {
        if self.scan.is_some() {
            self.set_status("A scan is already running", true);
            return;
        }
        let mut session = self.ctx.session();
        info!(session_id = %session.id(), ?purpose, "starting scan");
        let task = tokio::spawn(async move {
            if let Err(err) = session.start().await {
                warn!(session_id = %session.id(), error = %err, "scan did not start");
            }
            session
        });
        self.scan = Some(ActiveScan {
            purpose,
            started_at: Instant::now(),
            phase: ScanPhase::Starting(task),
        });
    }

    fn cancel_scan(&mut self) {
        self.teardown_scan();
        self.set_status("Scan cancelled", false);
    }

    /// Stop any scan in progress and release the camera. Safe to call when
    /// nothing is running.
    pub fn teardown_scan(&mut self) {
        let Some(scan) = self.scan.take() else {
            return;
        };
        match scan.phase {
            // Aborting drops the session inside the task, which releases
            // whatever it had claimed.
            ScanPhase::Starting(task) => {
                debug!("abandoning camera acquisition");
                task.abort();
            }
            ScanPhase::Running(mut session) => session.teardown(),
        }
    }

    async fn poll_scan(&mut self) {
        if let Some(ActiveScan {
            phase: ScanPhase::Starting(task),
            ..
        }) = &self.scan
        {
            if !task.is_finished() {
                return;
            }
        }
        let Some(scan) = self.scan.take() else {
            return;
        };
        let purpose = scan.purpose;
        let started_at = scan.started_at;

        let mut session = match scan.phase {
            ScanPhase::Starting(task) => match task.await {
                Ok(session) => session,
                Err(err) => {
                    warn!(error = %err, "camera acquisition task failed");
                    self.set_status(ErrorKind::Unknown.notice(), true);
                    return;
                }
            },
            ScanPhase::Running(session) => session,
        };

        if session.state() == SessionState::Active {
            session.forward_decodes();
            session.pump();
        }

        match session.state() {
            SessionState::Active | SessionState::Acquiring => {
                self.scan = Some(ActiveScan {
                    purpose,
                    started_at,
                    phase: ScanPhase::Running(session),
                });
            }
            SessionState::Resulted => self.finish_scan(purpose, session),
            SessionState::Closed => {
                let error = session.error().unwrap_or(ErrorKind::Unknown);
                self.notice = Some(ScanNotice { error, session });
            }
            SessionState::Idle => {}
        }
    }

    fn finish_scan(&mut self, purpose: ScanPurpose, mut session: ScanSession) {
        let Some(payload) = session.payload().cloned() else {
            warn!(session_id = %session.id(), "resulted session has no payload");
            self.notice = Some(ScanNotice {
                error: ErrorKind::Unknown,
                session,
            });
            return;
        };

        let verified = match purpose {
            ScanPurpose::Customer => self.customer_verifier.verify(&payload),
            ScanPurpose::Retailer => self.retail_verifier.verify(&payload),
        };
        let outcome = match verified {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "decoded code failed validation");
                self.notice = Some(ScanNotice {
                    error: err.kind(),
                    session,
                });
                return;
            }
        };
        if let Some(writer) = &self.audit {
            if let Err(err) = writer.record_verification(Some(session.id()), &outcome) {
                warn!(error = %err, "audit write failed");
            }
        }

        match purpose {
            ScanPurpose::Customer => {
                self.repo.record_verification(&outcome, Local::now());
                self.customer.selected = 0;
                self.verification = Some(VerificationModal {
                    outcome,
                    report: None,
                    session,
                });
            }
            ScanPurpose::Retailer => {
                let (entry, alert) = self.repo.record_retail_scan(&outcome, Local::now());
                self.retailer.selected = 0;
                match alert {
                    Some(alert) => self.set_status(format!("ALERT: {}", alert.message), true),
                    None => self.set_status(format!("{} added to inventory", entry.id), false),
                }
                if let Err(err) = session.dismiss() {
                    warn!(error = %err, "could not dismiss retail scan");
                }
            }
        }
    }

    fn dismiss_notice(&mut self) {
        if let Some(mut notice) = self.notice.take() {
            if let Err(err) = notice.session.dismiss() {
                warn!(error = %err, "could not dismiss scan notice");
            }
        }
    }

    fn close_verification(&mut self) {
        if let Some(mut modal) = self.verification.take() {
            if let Err(err) = modal.session.dismiss() {
                warn!(error = %err, "could not dismiss verification result");
            }
        }
    }

    fn report_counterfeit(&mut self) {
        let Some(modal) = self.verification.as_mut() else {
            return;
        };
        if modal.outcome.is_authentic {
            return;
        }
        modal.report = Some(
            match self
                .repo
                .report_counterfeit(&modal.outcome.payload, Utc::now())
            {
                Ok(id) => ReportStatus::Filed(id),
                Err(RepositoryError::AlreadyReported { report_id, .. }) => {
                    ReportStatus::AlreadyFiled(report_id)
                }
            },
        );
    }

    fn open_journey(&mut self, code: &str) {
        let payload = DecodedPayload::new(code);
        let product_id = payload.product_id().unwrap_or(code);
        let journey = self.repo.journey(product_id);
        let return_to = self.mode;
        self.set_mode(TuiMode::Journey);
        self.journey = Some(JourneyState { journey, return_to });
    }

    fn run_demo_scan(&mut self) {
        let payload = DecodedPayload::new(DEMO_PRODUCT_ID);
        match self.demo_verifier.verify(&payload) {
            Ok(outcome) => {
                self.home.attempts += 1;
                self.home.demo = Some(DemoResult {
                    outcome,
                    attempt: self.home.attempts,
                });
            }
            Err(err) => {
                warn!(error = %err, "demo verification failed");
                self.set_status(err.to_string(), true);
            }
        }
    }

    fn reset_demo(&mut self) {
        self.demo_verifier = SingleUseVerifier::new(self.repo.verifier());
        self.home = HomeState::default();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown_scan();
    }
}
