//! Instruction presets: pick one, edit its text, save it back or save the
//! edit as a new preset.

use super::Flash;
use crate::session::SessionContext;
use eframe::egui;
use shared::instructions::PresetError;

#[derive(Default)]
pub struct InstructionsPage {
    editor: String,
    /// Preset the editor was last loaded from.
    loaded: Option<String>,
    new_name: String,
    flash: Option<Flash>,
}

impl InstructionsPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload the editor when the active preset changed underneath it.
    fn sync(&mut self, session: &SessionContext) {
        if self.loaded.as_deref() != Some(session.current_instruction_name.as_str()) {
            self.editor = session.instructions.clone();
            self.loaded = Some(session.current_instruction_name.clone());
        }
    }

    pub fn select(&mut self, session: &mut SessionContext, name: &str) -> Result<(), PresetError> {
        session.select_preset(name)?;
        self.editor = session.instructions.clone();
        self.loaded = Some(name.to_string());
        self.flash = None;
        Ok(())
    }

    pub fn save(&mut self, session: &mut SessionContext) -> Result<(), PresetError> {
        self.sync_guard(session);
        let result = session.save_current_preset(&self.editor);
        self.flash = Some(match &result {
            Ok(()) => Flash::Success("Instructions saved 📝".to_string()),
            Err(e) => Flash::Error(e.to_string()),
        });
        result
    }

    pub fn save_as_new(&mut self, session: &mut SessionContext) -> Result<String, PresetError> {
        self.sync_guard(session);
        match session.create_preset(&self.new_name, &self.editor) {
            Ok(name) => {
                self.loaded = Some(name.clone());
                self.flash = Some(Flash::Success(format!("Preset \"{}\" created", name)));
                self.new_name.clear();
                Ok(name)
            }
            Err(e) => {
                self.flash = Some(Flash::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// First use of the page without a render pass still needs editor text.
    fn sync_guard(&mut self, session: &SessionContext) {
        if self.loaded.is_none() {
            self.sync(session);
        }
    }

    pub fn render(&mut self, ui: &mut egui::Ui, session: &mut SessionContext) {
        self.sync(session);

        ui.heading("📝 Instructions");
        ui.label(
            egui::RichText::new(
                "The active preset is sent as the system message with every question.",
            )
            .weak(),
        );
        ui.add_space(8.0);

        let names: Vec<String> = session.presets.names().map(str::to_string).collect();
        let mut chosen = session.current_instruction_name.clone();
        egui::ComboBox::from_label("Preset")
            .selected_text(chosen.as_str())
            .show_ui(ui, |ui| {
                for name in &names {
                    ui.selectable_value(&mut chosen, name.clone(), name.as_str());
                }
            });
        if chosen != session.current_instruction_name {
            if let Err(e) = self.select(session, &chosen) {
                self.flash = Some(Flash::Error(e.to_string()));
            }
        }

        ui.add_space(6.0);
        let editor_height = (ui.available_height() - 110.0).max(160.0);
        egui::ScrollArea::vertical()
            .max_height(editor_height)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.editor)
                        .desired_width(f32::INFINITY)
                        .desired_rows(16)
                        .font(egui::TextStyle::Monospace),
                );
            });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("💾 Save").clicked() {
                let _ = self.save(session);
            }
            ui.separator();
            ui.add(
                egui::TextEdit::singleline(&mut self.new_name)
                    .hint_text("New preset name")
                    .desired_width(180.0),
            );
            if ui.button("Save as new preset").clicked() {
                let _ = self.save_as_new(session);
            }
        });

        if let Some(flash) = &self.flash {
            flash.show(ui);
        }
    }
}
