//! Settings: model choice, API key replacement and clearing the current
//! conversation.

use super::chat::ChatPage;
use super::Flash;
use crate::session::SessionContext;
use eframe::egui;
use services::StoreError;
use shared::models::PerplexityModel;
use zeroize::Zeroizing;

#[derive(Default)]
pub struct SettingsPage {
    key_input: Zeroizing<String>,
    flash: Option<Flash>,
}

impl SettingsPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the typed key if it is non-empty and differs from the current
    /// one. The input is wiped either way.
    pub fn apply_api_key(&mut self, session: &mut SessionContext) -> bool {
        let changed = session.set_api_key(&self.key_input);
        self.key_input = Zeroizing::new(String::new());
        if changed {
            self.flash = Some(Flash::Success("API key updated ✅".to_string()));
        }
        changed
    }

    /// Empty the current conversation. A request still running for it is
    /// dropped so its reply cannot bring the old exchange back.
    pub fn clear_current(
        &mut self,
        session: &mut SessionContext,
        chat: &mut ChatPage,
    ) -> Result<(), StoreError> {
        let result = session
            .conversations
            .current()
            .map(|c| c.id.clone())
            .and_then(|id| {
                chat.discard_pending(&id);
                session.conversations.clear_messages(&id)
            });
        self.flash = Some(match &result {
            Ok(()) => Flash::Success("Conversation cleared".to_string()),
            Err(e) => Flash::Error(e.to_string()),
        });
        result
    }

    pub fn render(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut SessionContext,
        chat: &mut ChatPage,
    ) {
        ui.heading("⚙ Settings");
        ui.add_space(10.0);

        ui.label(egui::RichText::new("Model").strong());
        egui::ComboBox::from_id_source("model_select")
            .selected_text(session.model.as_str())
            .show_ui(ui, |ui| {
                for model in PerplexityModel::ALL {
                    ui.selectable_value(&mut session.model, model, model.as_str());
                }
            });

        ui.add_space(14.0);
        ui.label(egui::RichText::new("Perplexity API key").strong());
        ui.label(egui::RichText::new(key_status(session.api_key())).weak());
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut *self.key_input)
                    .password(true)
                    .desired_width(260.0)
                    .hint_text("pplx-..."),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if enter || ui.button("Update key").clicked() {
                self.apply_api_key(session);
            }
        });

        ui.add_space(14.0);
        ui.label(egui::RichText::new("Conversation").strong());
        if ui.button("🗑 Clear current conversation").clicked() {
            let _ = self.clear_current(session, chat);
        }

        if let Some(flash) = &self.flash {
            ui.add_space(8.0);
            flash.show(ui);
        }
    }
}

/// Masked description of the active key.
fn key_status(key: Option<&str>) -> String {
    match key {
        None => "No key set".to_string(),
        Some(key) => {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 8 {
                "Key set".to_string()
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("Key set (…{})", tail)
            }
        }
    }
}
