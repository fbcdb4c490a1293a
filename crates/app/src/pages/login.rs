//! Login form shown in the sidebar until the session is authenticated.

use crate::auth::{self, LoginError};
use crate::secrets::DeploymentSecrets;
use crate::session::SessionContext;
use eframe::egui;
use zeroize::Zeroizing;

#[derive(Default)]
pub struct LoginPage {
    credential: Zeroizing<String>,
    error: Option<String>,
}

impl LoginPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try the typed credential. The field is wiped after every attempt.
    pub fn submit(
        &mut self,
        session: &mut SessionContext,
        secrets: &DeploymentSecrets,
    ) -> Result<(), LoginError> {
        let result = auth::login(session, &self.credential, secrets).map(|_| ());
        self.credential = Zeroizing::new(String::new());
        self.error = result.as_ref().err().map(ToString::to_string);
        result
    }

    pub fn render(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut SessionContext,
        secrets: &DeploymentSecrets,
    ) {
        ui.heading("🔐 Log in");
        ui.add_space(6.0);
        ui.label("Enter your Perplexity API key or the team password.");
        ui.add_space(6.0);

        let response = ui.add(
            egui::TextEdit::singleline(&mut *self.credential)
                .password(true)
                .desired_width(f32::INFINITY)
                .hint_text("pplx-... or password"),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if enter || ui.button("Log in").clicked() {
            let _ = self.submit(session, secrets);
        }

        if let Some(error) = &self.error {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::RED, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::in_memory_session;

    #[test]
    fn test_failed_then_successful_login() {
        let mut session = in_memory_session();
        let secrets = DeploymentSecrets::new(Some("opensesame"), Some("pplx-default"));
        let mut page = LoginPage::new();

        *page.credential = "wrong".to_string();
        assert_eq!(
            page.submit(&mut session, &secrets),
            Err(LoginError::InvalidCredential)
        );
        assert_eq!(page.error.as_deref(), Some("Invalid key or password"));
        assert!(page.credential.is_empty());
        assert!(!session.authenticated);

        *page.credential = "opensesame".to_string();
        assert_eq!(page.submit(&mut session, &secrets), Ok(()));
        assert!(page.error.is_none());
        assert!(session.authenticated);
        assert_eq!(session.api_key(), Some("pplx-default"));
    }
}
