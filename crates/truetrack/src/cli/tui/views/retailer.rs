use super::*;

impl RetailerTab {
    pub const ALL: [RetailerTab; 3] = [RetailerTab::Scan, RetailerTab::Inventory, RetailerTab::Alerts];

    pub fn label(&self) -> &'static str {
        match self {
            RetailerTab::Scan => "Scan & Activate",
            RetailerTab::Inventory => "Inventory",
            RetailerTab::Alerts => "Alerts",
        }
    }

    fn next(self) -> Self {
        match self {
            RetailerTab::Scan => RetailerTab::Inventory,
            RetailerTab::Inventory => RetailerTab::Alerts,
            RetailerTab::Alerts => RetailerTab::Scan,
        }
    }

    fn prev(self) -> Self {
        match self {
            RetailerTab::Scan => RetailerTab::Alerts,
            RetailerTab::Inventory => RetailerTab::Scan,
            RetailerTab::Alerts => RetailerTab::Inventory,
        }
    }
}

impl App {
    pub(super) fn handle_retailer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Tab => self.set_retailer_tab(self.retailer.tab.next()),
            KeyCode::BackTab => self.set_retailer_tab(self.retailer.tab.prev()),
            KeyCode::Char('s') => {
                self.set_retailer_tab(RetailerTab::Scan);
                self.start_scan(ScanPurpose::Retailer);
            }
            KeyCode::Char('l') => self.sign_out(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.retailer.selected = self.retailer.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = match self.retailer.tab {
                    RetailerTab::Alerts => self.repo.list_alerts().len(),
                    RetailerTab::Scan | RetailerTab::Inventory => {
                        self.repo.list_inventory().len()
                    }
                };
                if self.retailer.selected + 1 < count {
                    self.retailer.selected += 1;
                }
            }
            _ => {}
        }
    }

    fn set_retailer_tab(&mut self, tab: RetailerTab) {
        if self.retailer.tab != tab {
            self.retailer.tab = tab;
            self.retailer.selected = 0;
        }
    }
}
