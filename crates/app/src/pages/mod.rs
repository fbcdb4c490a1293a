//! One module per page. Each page owns its transient UI state and works on
//! the shared [`SessionContext`](crate::session::SessionContext).

pub mod chat;
pub mod instructions;
pub mod login;
pub mod report_card;
pub mod settings;

use eframe::egui;

/// One-shot status line shown under a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub fn show(&self, ui: &mut egui::Ui) {
        match self {
            Flash::Success(msg) => {
                ui.colored_label(egui::Color32::from_rgb(80, 170, 100), msg);
            }
            Flash::Error(msg) => {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), msg);
            }
        }
    }
}
