use super::*;

impl App {
    pub(super) fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('d') => self.run_demo_scan(),
            KeyCode::Char('r') => self.reset_demo(),
            KeyCode::Enter => self.navigate_to_mode(TuiMode::Customer),
            _ => {}
        }
    }
}
