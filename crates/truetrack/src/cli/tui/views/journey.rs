use super::*;

impl App {
    pub(super) fn handle_journey_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Backspace) {
            self.go_back();
        }
    }
}
