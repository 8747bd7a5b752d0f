use super::*;

impl App {
    pub(super) fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Tab | KeyCode::Down => self.login.focus = self.login.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.login.focus = self.login.focus.prev(),
            KeyCode::Enter => self.submit_login(),
            _ => match self.login.focus {
                LoginField::Role => {
                    if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                        self.login.role = self.login.role.toggled();
                    }
                }
                LoginField::Email => edit_field(&mut self.login.email, key),
                LoginField::Password => edit_field(&mut self.login.password, key),
            },
        }
    }

    fn submit_login(&mut self) {
        let credentials = Credentials {
            email: self.login.email.clone(),
            password: self.login.password.clone(),
        };
        match truetrack::login(self.login.role, &credentials) {
            Ok(role) => {
                self.signed_in = Some(role);
                self.login.password.clear();
                self.login.error = None;
                self.set_status(format!("Signed in as {}", role.label()), false);
                let target = match role {
                    Role::Retailer => TuiMode::Retailer,
                    Role::Admin => TuiMode::Admin,
                };
                self.set_mode(target);
            }
            Err(err) => self.login.error = Some(err.to_string()),
        }
    }
}

fn edit_field(field: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => field.push(c),
        KeyCode::Backspace => {
            field.pop();
        }
        _ => {}
    }
}
