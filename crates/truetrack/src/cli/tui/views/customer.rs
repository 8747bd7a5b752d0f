use super::*;

impl App {
    pub(super) fn handle_customer_key(&mut self, key: KeyEvent) {
        let count = self.repo.list_recent_verifications().len();
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Char('s') => self.start_scan(ScanPurpose::Customer),
            KeyCode::Up | KeyCode::Char('k') => {
                self.customer.selected = self.customer.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.customer.selected + 1 < count {
                    self.customer.selected += 1;
                }
            }
            KeyCode::Enter => {
                let code = self
                    .repo
                    .list_recent_verifications()
                    .get(self.customer.selected)
                    .map(|entry| entry.id.clone());
                if let Some(code) = code {
                    self.open_journey(&code);
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_verification_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.close_verification(),
            KeyCode::Char('r') => self.report_counterfeit(),
            KeyCode::Char('t') => {
                let code = self
                    .verification
                    .as_ref()
                    .map(|modal| modal.outcome.payload.as_str().to_string());
                self.close_verification();
                if let Some(code) = code {
                    self.open_journey(&code);
                }
            }
            _ => {}
        }
    }
}
