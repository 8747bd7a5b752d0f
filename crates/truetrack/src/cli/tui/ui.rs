//! UI rendering for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use truetrack::repository::{ProductStatus, StepStatus, DEMO_PRODUCT_ID};
use truetrack_scan::{SessionState, Verdict};

use super::app::{AdminTab, App, LoginField, ReportStatus, RetailerTab, ScanPurpose, TuiMode};
use super::components::modal::{centered_area, render_modal};
use super::nav::{nav_index_for_mode, NAV_ITEMS};
use crate::cli::output::format_number;

const ACCENT: Color = Color::Cyan;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title + navigation
            Constraint::Min(0),    // Screen
            Constraint::Length(1), // Status / key hints
        ])
        .split(area);

    draw_top_bar(frame, app, chunks[0]);
    match app.mode {
        TuiMode::Home => draw_home_screen(frame, app, chunks[1]),
        TuiMode::Login => draw_login_screen(frame, app, chunks[1]),
        TuiMode::Customer => draw_customer_screen(frame, app, chunks[1]),
        TuiMode::Retailer => draw_retailer_screen(frame, app, chunks[1]),
        TuiMode::Admin => draw_admin_screen(frame, app, chunks[1]),
        TuiMode::Journey => draw_journey_screen(frame, app, chunks[1]),
    }
    draw_footer(frame, app, chunks[2]);

    if app.scan.is_some() {
        draw_scan_overlay(frame, app, area);
    }
    if app.verification.is_some() {
        draw_verification_modal(frame, app, area);
    }
    if app.notice.is_some() {
        draw_notice(frame, app, area);
    }
    if app.show_help {
        draw_help_overlay(frame, area);
    }
}

fn status_style(status: ProductStatus) -> Style {
    match status {
        ProductStatus::Authentic => Style::default().fg(Color::Green),
        ProductStatus::Counterfeit => Style::default().fg(Color::Red),
    }
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Genuine => Style::default().fg(Color::Green),
        Verdict::DuplicateScan => Style::default().fg(Color::Yellow),
        Verdict::KnownCounterfeit | Verdict::ChecksumMismatch => Style::default().fg(Color::Red),
    }
}

fn word_style(word: &str) -> Style {
    match word {
        "verified" | "active" | "completed" | "low" => Style::default().fg(Color::Green),
        "counterfeit" | "high" => Style::default().fg(Color::Red),
        "medium" | "current" => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    }
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(Style::default().fg(ACCENT).bold())
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn tab_line<'a>(labels: impl IntoIterator<Item = String>, active: usize) -> Line<'a> {
    let mut spans = Vec::new();
    for (idx, label) in labels.into_iter().enumerate() {
        let style = if idx == active {
            Style::default().fg(Color::Black).bg(ACCENT).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn draw_top_bar(frame: &mut Frame, app: &App, area: Rect) {
    let active = nav_index_for_mode(app.mode);
    let mut spans = Vec::new();
    for (idx, item) in NAV_ITEMS.iter().enumerate() {
        let style = if Some(idx) == active {
            Style::default().fg(ACCENT).bold().reversed()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" [{}] {} ", item.key, item.label), style));
    }
    if active.is_none() {
        spans.push(Span::styled(
            format!("  > {}", app.mode.title()),
            Style::default().fg(ACCENT),
        ));
    }

    let signed_in = match app.signed_in {
        Some(role) => format!(" {} ", role.label()),
        None => " Guest ".to_string(),
    };
    let block = Block::default()
        .title(" TrueTrack ")
        .title_style(Style::default().fg(ACCENT).bold())
        .title(Line::from(signed_in).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        frame.render_widget(
            Paragraph::new(format!(" {}", status.text)).style(Style::default().fg(color)),
            area,
        );
        return;
    }

    let hints = match app.mode {
        TuiMode::Home => "[d] Try demo scan  [r] Reset demo  [Enter] Verify a product  [?] Help  [q] Quit",
        TuiMode::Login => "[Tab] Next field  [Enter] Sign in  [Esc] Back",
        TuiMode::Customer => "[s] Scan  [↑↓] Select  [Enter] Journey  [Esc] Home  [?] Help",
        TuiMode::Retailer => "[s] Scan stock  [Tab] Switch tab  [l] Sign out  [Esc] Home",
        TuiMode::Admin => "[g] Generate batch  [Tab] Switch tab  [l] Sign out  [Esc] Home",
        TuiMode::Journey => "[Esc] Back",
    };
    frame.render_widget(
        Paragraph::new(format!(" {}", hints)).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

// ============================================================================
// Home
// ============================================================================

fn draw_home_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Hero
            Constraint::Length(5), // Stats
            Constraint::Min(0),    // Features / how it works
            Constraint::Length(7), // Demo
        ])
        .split(area);

    let hero = Paragraph::new(vec![
        Line::from(""),
        Line::from("Secure Product Authentication with QR codes".bold()),
        Line::from(
            "Single-use codes, real-time tracking and instant counterfeit detection."
                .fg(Color::Gray),
        ),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(hero, chunks[0]);

    let stats = app.repo.stats();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, stats.len().max(1) as u32); stats.len()])
        .split(chunks[1]);
    for (card, column) in stats.iter().zip(columns.iter()) {
        let text = vec![
            Line::from(card.value.fg(ACCENT).bold()),
            Line::from(card.label),
            Line::from(card.description.fg(Color::DarkGray)),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(panel("")),
            *column,
        );
    }

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    let features: Vec<Line> = app
        .repo
        .features()
        .iter()
        .flat_map(|f| {
            [
                Line::from(f.title.bold()),
                Line::from(format!("  {}", f.description).fg(Color::Gray)),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(features)
            .wrap(Wrap { trim: false })
            .block(panel(" Features ")),
        middle[0],
    );
    let steps: Vec<Line> = app
        .repo
        .how_it_works()
        .iter()
        .flat_map(|s| {
            [
                Line::from(vec![
                    Span::styled(format!("{}. ", s.step), Style::default().fg(ACCENT)),
                    Span::styled(s.title, Style::default().bold()),
                ]),
                Line::from(format!("   {}", s.description).fg(Color::Gray)),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(steps)
            .wrap(Wrap { trim: false })
            .block(panel(" How It Works ")),
        middle[1],
    );

    let mut demo = vec![Line::from(vec![
        Span::raw("Product code: "),
        Span::styled(DEMO_PRODUCT_ID, Style::default().bold()),
    ])];
    match &app.home.demo {
        Some(result) => {
            demo.push(Line::from(vec![
                Span::raw(format!("Scan #{}: ", result.attempt)),
                Span::styled(result.label(), verdict_style(result.outcome.verdict).bold()),
            ]));
            demo.push(Line::from(result.outcome.verdict.detail().fg(Color::Gray)));
        }
        None => {
            demo.push(Line::from(
                "Press d to scan. The first scan verifies; every scan after that is blocked."
                    .fg(Color::Gray),
            ));
        }
    }
    frame.render_widget(
        Paragraph::new(demo)
            .wrap(Wrap { trim: true })
            .block(panel(" Single-use QR demo ")),
        chunks[3],
    );
}

// ============================================================================
// Login
// ============================================================================

fn draw_login_screen(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_area(area, 60, 14);
    let login = &app.login;

    let focus_style = |field: LoginField| {
        if login.focus == field {
            Style::default().fg(ACCENT).bold()
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let cursor = |field: LoginField| if login.focus == field { "_" } else { "" };

    let roles: Vec<Span> = [truetrack::Role::Retailer, truetrack::Role::Admin]
        .iter()
        .map(|role| {
            if *role == login.role {
                Span::styled(format!("({}) ", role.label()), Style::default().fg(ACCENT).bold())
            } else {
                Span::raw(format!(" {}  ", role.label()))
            }
        })
        .collect();

    let mut lines = vec![
        Line::from(""),
        Line::from([vec![Span::styled("  Role:     ", focus_style(LoginField::Role))], roles].concat()),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Email:    ", focus_style(LoginField::Email)),
            Span::raw(format!("{}{}", login.email, cursor(LoginField::Email))),
        ]),
        Line::from(vec![
            Span::styled("  Password: ", focus_style(LoginField::Password)),
            Span::raw(format!(
                "{}{}",
                "*".repeat(login.password.chars().count()),
                cursor(LoginField::Password)
            )),
        ]),
        Line::from(""),
    ];
    if let Some(error) = &login.error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "  Demo credentials: any email/password combination".fg(Color::DarkGray),
    ));

    let title = format!(" Sign in to the {} dashboard ", login.role.label());
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        ),
        dialog,
    );
}

// ============================================================================
// Customer
// ============================================================================

fn draw_customer_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let intro = Paragraph::new(vec![
        Line::from("Verify that a product is genuine before you use it.".bold()),
        Line::from(format!(
            "Press s to scan its code with the {} camera.",
            app.settings.scan.facing
        )),
    ])
    .block(panel(" Scan a product "));
    frame.render_widget(intro, chunks[0]);

    let rows: Vec<Row> = app
        .repo
        .list_recent_verifications()
        .iter()
        .map(|v| {
            Row::new(vec![
                Cell::from(v.id.clone()),
                Cell::from(v.product.clone()),
                Cell::from(v.status.as_str()).style(status_style(v.status)),
                Cell::from(v.date.clone()),
                Cell::from(v.location.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Min(12),
        ],
    )
    .header(header_row(&["Code", "Product", "Status", "When", "Where"]))
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(panel(" Recent verifications "));
    let mut state = TableState::default().with_selected(Some(app.customer.selected));
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

// ============================================================================
// Retailer
// ============================================================================

fn draw_retailer_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let alerts = app.repo.list_alerts().len();
    let labels = RetailerTab::ALL.iter().map(|tab| match tab {
        RetailerTab::Alerts => format!("{} ({})", tab.label(), alerts),
        _ => tab.label().to_string(),
    });
    let active = RetailerTab::ALL
        .iter()
        .position(|tab| *tab == app.retailer.tab)
        .unwrap_or(0);
    frame.render_widget(Paragraph::new(tab_line(labels, active)), chunks[0]);

    match app.retailer.tab {
        RetailerTab::Scan => {
            let inner = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(4), Constraint::Min(0)])
                .split(chunks[1]);
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from("Scan incoming stock to add it to inventory."),
                    Line::from("Counterfeit products raise an alert.".fg(Color::Gray)),
                ])
                .block(panel(" Scan stock ")),
                inner[0],
            );
            draw_inventory_table(frame, app, inner[1], " Latest scans ");
        }
        RetailerTab::Inventory => draw_inventory_table(frame, app, chunks[1], " Inventory "),
        RetailerTab::Alerts => {
            let rows: Vec<Row> = app
                .repo
                .list_alerts()
                .iter()
                .map(|a| {
                    Row::new(vec![
                        Cell::from(a.time.clone()),
                        Cell::from(a.message.clone()).style(Style::default().fg(Color::Red)),
                        Cell::from(a.product.clone()),
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [Constraint::Length(12), Constraint::Min(30), Constraint::Min(16)],
            )
            .header(header_row(&["Time", "Message", "Product"]))
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .block(panel(" Alerts "));
            let mut state = TableState::default().with_selected(Some(app.retailer.selected));
            frame.render_stateful_widget(table, chunks[1], &mut state);
        }
    }
}

fn draw_inventory_table(frame: &mut Frame, app: &App, area: Rect, title: &str) {
    let rows: Vec<Row> = app
        .repo
        .list_inventory()
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.id.clone()),
                Cell::from(e.product.clone()),
                Cell::from(e.batch.clone()),
                Cell::from(e.status.as_str()).style(status_style(e.status)),
                Cell::from(e.scanned_at.clone()),
                Cell::from(e.location.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Min(16),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Min(12),
        ],
    )
    .header(header_row(&["Code", "Product", "Batch", "Status", "Scanned", "Location"]))
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(panel(title));
    let mut state = TableState::default().with_selected(Some(app.retailer.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Admin
// ============================================================================

fn draw_admin_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let active = AdminTab::ALL
        .iter()
        .position(|tab| *tab == app.admin.tab)
        .unwrap_or(0);
    let labels = AdminTab::ALL.iter().map(|tab| tab.label().to_string());
    frame.render_widget(Paragraph::new(tab_line(labels, active)), chunks[0]);

    match app.admin.tab {
        AdminTab::Dashboard => {
            let inner = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(4), Constraint::Min(0)])
                .split(chunks[1]);
            draw_admin_summary(frame, app, inner[0]);
            draw_scan_logs(frame, app, inner[1], " Recent scans ");
        }
        AdminTab::Generate => {
            let inner = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(chunks[1]);
            frame.render_widget(
                Paragraph::new("Press g to generate a batch of 1,000 single-use codes.")
                    .block(panel(" Generate QR codes ")),
                inner[0],
            );
            let rows: Vec<Row> = app
                .repo
                .list_qr_batches()
                .iter()
                .map(|b| {
                    Row::new(vec![
                        Cell::from(b.id.clone()),
                        Cell::from(b.batch.clone()),
                        Cell::from(b.product.clone()),
                        Cell::from(format_number(u64::from(b.quantity))),
                        Cell::from(b.generated.to_string()),
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [
                    Constraint::Length(8),
                    Constraint::Length(10),
                    Constraint::Min(20),
                    Constraint::Length(10),
                    Constraint::Length(12),
                ],
            )
            .header(header_row(&["ID", "Batch", "Product", "Quantity", "Generated"]))
            .block(panel(" QR batches "));
            frame.render_widget(table, inner[1]);
        }
        AdminTab::Tracking => draw_scan_logs(frame, app, chunks[1], " Scan logs "),
        AdminTab::Anomalies => {
            let rows: Vec<Row> = app
                .repo
                .list_anomalies()
                .iter()
                .map(|a| {
                    Row::new(vec![
                        Cell::from(a.kind.label()),
                        Cell::from(a.description.clone()),
                        Cell::from(a.location.clone()),
                        Cell::from(a.severity.as_str()).style(word_style(a.severity.as_str())),
                        Cell::from(a.count.to_string()),
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [
                    Constraint::Length(22),
                    Constraint::Min(30),
                    Constraint::Length(18),
                    Constraint::Length(8),
                    Constraint::Length(6),
                ],
            )
            .header(header_row(&["Type", "Description", "Location", "Severity", "Count"]))
            .block(panel(" Anomalies "));
            frame.render_widget(table, chunks[1]);
        }
    }
}

fn draw_admin_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.repo.admin_summary();
    let cards = [
        ("Total Products", summary.total_products, ACCENT),
        ("Active QR Codes", summary.active_qr_codes, Color::Green),
        ("Flagged Counterfeits", summary.flagged_counterfeits, Color::Red),
        ("Anomaly Alerts", summary.anomaly_alerts, Color::Yellow),
    ];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    for ((label, value, color), column) in cards.into_iter().zip(columns.iter()) {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(format_number(value).fg(color).bold()),
                Line::from(label.fg(Color::Gray)),
            ])
            .alignment(Alignment::Center)
            .block(panel("")),
            *column,
        );
    }
}

fn draw_scan_logs(frame: &mut Frame, app: &App, area: Rect, title: &str) {
    let rows: Vec<Row> = app
        .repo
        .list_scan_logs()
        .iter()
        .map(|l| {
            Row::new(vec![
                Cell::from(l.product_id.clone()),
                Cell::from(l.location.clone()),
                Cell::from(l.timestamp.clone()),
                Cell::from(l.status.as_str()).style(word_style(l.status.as_str())),
                Cell::from(l.retailer.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Min(16),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Min(16),
        ],
    )
    .header(header_row(&["Product", "Location", "Time", "Status", "Retailer"]))
    .block(panel(title));
    frame.render_widget(table, area);
}

// ============================================================================
// Journey
// ============================================================================

fn draw_journey_screen(frame: &mut Frame, app: &App, area: Rect) {
    let Some(state) = &app.journey else {
        frame.render_widget(Paragraph::new("No product selected").block(panel("")), area);
        return;
    };
    let journey = &state.journey;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let heading = match app.repo.product(&journey.product_id) {
        Some(product) => format!("{}  {} by {}", journey.product_id, product.name, product.manufacturer),
        None => journey.product_id.clone(),
    };
    frame.render_widget(
        Paragraph::new(heading.bold()).block(panel(" Supply chain journey ")),
        chunks[0],
    );

    let rows: Vec<Row> = journey
        .steps
        .iter()
        .map(|step| {
            let (marker, state) = match step.status {
                StepStatus::Completed => ("●", "completed"),
                StepStatus::Current => ("◉", "current"),
            };
            Row::new(vec![
                Cell::from(format!("{} {}", marker, step.step)).style(word_style(state)),
                Cell::from(step.title).style(Style::default().bold()),
                Cell::from(step.location),
                Cell::from(format!("{} {}", step.date, step.time)),
                Cell::from(step.description).style(Style::default().fg(Color::Gray)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(22),
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["#", "Stage", "Location", "When", "Details"]))
    .block(panel(""));
    frame.render_widget(table, chunks[1]);
}

// ============================================================================
// Overlays
// ============================================================================

fn draw_scan_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let Some(scan) = &app.scan else {
        return;
    };
    let title = match scan.purpose {
        ScanPurpose::Customer => " Scan product ",
        ScanPurpose::Retailer => " Scan stock ",
    };
    let layout = render_modal(frame, area, 54, 9, 1, 1, title, Style::default().fg(ACCENT));

    let (headline, detail) = match scan.state() {
        SessionState::Acquiring => (
            "Requesting camera access...".to_string(),
            "Allow the camera when prompted.".to_string(),
        ),
        _ => (
            "Scanning...".to_string(),
            format!(
                "Point the {} camera at a TrueTrack code ({}s)",
                app.settings.scan.facing,
                scan.started_at.elapsed().as_secs()
            ),
        ),
    };
    frame.render_widget(
        Paragraph::new(headline.bold()).alignment(Alignment::Center),
        layout.header,
    );
    frame.render_widget(
        Paragraph::new(detail)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        layout.body,
    );
    frame.render_widget(
        Paragraph::new("[Esc] Cancel".fg(Color::DarkGray)).alignment(Alignment::Center),
        layout.footer,
    );
}

fn draw_verification_modal(frame: &mut Frame, app: &App, area: Rect) {
    let Some(modal) = &app.verification else {
        return;
    };
    let outcome = &modal.outcome;
    let style = verdict_style(outcome.verdict);
    let layout = render_modal(frame, area, 64, 18, 2, 1, " Verification Result ", style);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(outcome.verdict.headline(), style.bold())),
            Line::from(outcome.verdict.detail().fg(Color::Gray)),
        ])
        .alignment(Alignment::Center),
        layout.header,
    );

    let product = &outcome.product;
    let field = |label: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", label), Style::default().fg(Color::Gray)),
            Span::raw(value.to_string()),
        ])
    };
    let mut lines = vec![
        Line::from(""),
        field("Product", &product.name),
        field("Manufacturer", &product.manufacturer),
        field("Batch", &product.batch_number),
        field("Expires", &product.expiry_date),
        field("Purchased at", &product.purchase_location),
        field("Scanned in", &product.scan_location),
        field("Code", outcome.payload.as_str()),
        field("Verified by", &outcome.verified_by),
    ];
    match &modal.report {
        Some(ReportStatus::Filed(id)) => lines.push(Line::from(Span::styled(
            format!("  Reported as {}. Thank you.", id.short()),
            Style::default().fg(Color::Green),
        ))),
        Some(ReportStatus::AlreadyFiled(id)) => lines.push(Line::from(Span::styled(
            format!("  Already reported as {}.", id.short()),
            Style::default().fg(Color::Yellow),
        ))),
        None => {}
    }
    frame.render_widget(Paragraph::new(lines), layout.body);

    let hints = if outcome.is_authentic {
        "[Enter] Close  [t] Journey"
    } else {
        "[Enter] Close  [t] Journey  [r] Report counterfeit"
    };
    frame.render_widget(
        Paragraph::new(hints.fg(Color::DarkGray)).alignment(Alignment::Center),
        layout.footer,
    );
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };
    let style = Style::default().fg(Color::Red);
    let layout = render_modal(frame, area, 58, 7, 0, 1, " Scan failed ", style);
    frame.render_widget(
        Paragraph::new(notice.error.notice())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        layout.body,
    );
    frame.render_widget(
        Paragraph::new("[Enter] Dismiss".fg(Color::DarkGray)).alignment(Alignment::Center),
        layout.footer,
    );
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_area(
        area,
        60.min(area.width.saturating_sub(4)),
        22.min(area.height.saturating_sub(4)),
    );
    frame.render_widget(Clear, help_area);

    let mut help_text = vec![
        "".to_string(),
        "  NAVIGATION".to_string(),
        "  ──────────".to_string(),
    ];
    for item in NAV_ITEMS {
        help_text.push(format!("  {:<9} {}", item.key, item.description));
    }
    help_text.extend(
        [
            "  Esc       Back / Cancel scan / Close dialog",
            "",
            "  SCANNING",
            "  ────────",
            "  s         Scan a code (Verify, Retailer)",
            "  r         Report counterfeit (result dialog)",
            "  t         Product journey (result dialog)",
            "",
            "  GLOBAL ACTIONS",
            "  ──────────────",
            "  ?         Toggle this help",
            "  q         Quit application",
            "",
            "  Press ? or Esc to close",
        ]
        .map(String::from),
    );

    let help_paragraph = Paragraph::new(help_text.join("\n"))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(ACCENT).bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );

    frame.render_widget(help_paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use truetrack::{Role, Settings};
    use truetrack_scan::{ManualDecoder, ScanContext, SimulatedCamera};

    fn render(app: &App) -> String {
        let backend = TestBackend::new(110, 36);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_home_renders_demo_result() {
        let mut app = App::new(Settings::default(), None);
        let before = render(&app);
        assert!(before.contains("TrueTrack"));
        assert!(before.contains("Single-use QR demo"));

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('d'));
        let after = render(&app);
        assert!(after.contains("Scan #2"));
        assert!(after.contains("Blocked"));
    }

    #[test]
    fn test_login_shows_validation_error() {
        let mut app = App::new(Settings::default(), None);
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);

        let text = render(&app);
        assert!(text.contains("Sign in to the Admin dashboard"));
        assert!(text.contains("Please enter both email and password"));
    }

    #[test]
    fn test_admin_dashboard_shows_summary() {
        let mut app = App::new(Settings::default(), None);
        app.signed_in = Some(Role::Admin);
        press(&mut app, KeyCode::Char('3'));

        let text = render(&app);
        assert!(text.contains("125,430"));
        assert!(text.contains("Flagged Counterfeits"));
    }

    #[test]
    fn test_journey_lists_every_stage() {
        let mut app = App::new(Settings::default(), None);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);

        let text = render(&app);
        assert!(text.contains("TT-12345"));
        for step in &app.journey.as_ref().unwrap().journey.steps {
            assert!(text.contains(step.title), "missing stage {}", step.title);
        }
    }

    #[test]
    fn test_help_overlay_lists_navigation() {
        let mut app = App::new(Settings::default(), None);
        press(&mut app, KeyCode::Char('?'));
        let text = render(&app);
        assert!(text.contains("Help"));
        assert!(text.contains("Quit application"));
    }

    #[tokio::test]
    async fn test_scan_overlay_while_acquiring() {
        let camera = Arc::new(SimulatedCamera::granting());
        let ctx = ScanContext::new(camera, Arc::new(ManualDecoder::new()));
        let mut app = App::with_context(Settings::default(), ctx, None);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('s'));

        let text = render(&app);
        assert!(text.contains("Requesting camera access"));
        assert!(text.contains("[Esc] Cancel"));
    }
}
