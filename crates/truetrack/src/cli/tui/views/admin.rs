use super::*;

impl AdminTab {
    pub const ALL: [AdminTab; 4] = [
        AdminTab::Dashboard,
        AdminTab::Generate,
        AdminTab::Tracking,
        AdminTab::Anomalies,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AdminTab::Dashboard => "Dashboard",
            AdminTab::Generate => "Generate QR",
            AdminTab::Tracking => "Track Scans",
            AdminTab::Anomalies => "Anomalies",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }
}

impl App {
    pub(super) fn handle_admin_key(&mut self, key: KeyEvent) {
        let tabs = AdminTab::ALL.len();
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Tab => {
                self.admin.tab = AdminTab::ALL[(self.admin.tab.position() + 1) % tabs];
            }
            KeyCode::BackTab => {
                self.admin.tab = AdminTab::ALL[(self.admin.tab.position() + tabs - 1) % tabs];
            }
            KeyCode::Char('g') => {
                self.admin.tab = AdminTab::Generate;
                let batch = self.repo.generate_batch(Local::now().date_naive());
                self.set_status(
                    format!("Generated {} codes in batch {}", batch.quantity, batch.batch),
                    false,
                );
            }
            KeyCode::Char('l') => self.sign_out(),
            _ => {}
        }
    }
}
