use crate::nav::{self, Page, Screen};
use crate::pages::chat::ChatPage;
use crate::pages::instructions::InstructionsPage;
use crate::pages::login::LoginPage;
use crate::pages::settings::SettingsPage;
use crate::secrets::DeploymentSecrets;
use crate::session::SessionContext;
use eframe::egui;
use providers::CompletionClient;
use std::sync::Arc;
use std::time::Duration;

pub struct ResearchAssistantApp {
    session: SessionContext,
    secrets: DeploymentSecrets,
    page: Page,
    login: LoginPage,
    chat: ChatPage,
    instructions: InstructionsPage,
    settings: SettingsPage,
}

impl ResearchAssistantApp {
    pub fn new(
        session: SessionContext,
        secrets: DeploymentSecrets,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            session,
            secrets,
            page: Page::default(),
            login: LoginPage::new(),
            chat: ChatPage::new(client),
            instructions: InstructionsPage::new(),
            settings: SettingsPage::new(),
        }
    }
}

impl eframe::App for ResearchAssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll for the chat reply (non-blocking)
        if self.chat.poll(&mut self.session) {
            ctx.request_repaint();
        }
        // Keep polling and animating while a request is out.
        if self.chat.is_waiting() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(250.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.heading("🌿 Research Assistant");
                ui.separator();

                if !self.session.authenticated {
                    self.login.render(ui, &mut self.session, &self.secrets);
                    return;
                }

                for page in Page::ALL {
                    ui.selectable_value(
                        &mut self.page,
                        page,
                        format!("{} {}", page.icon(), page.label()),
                    );
                }
                ui.separator();

                if ui.button("➕ New Conversation").clicked() {
                    self.session.conversations.create_new();
                    self.page = Page::Chat;
                }
                ui.add_space(4.0);
                conversation_list(ui, &mut self.session, &mut self.page);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            match nav::resolve(&self.session, self.page) {
                Screen::Login => {
                    ui.add_space(40.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("🤖 AI Research Assistant");
                        ui.add_space(8.0);
                        ui.label("Log in from the sidebar to start researching strains.");
                    });
                }
                Screen::Page(Page::Chat) => self.chat.render(ui, &mut self.session),
                Screen::Page(Page::Instructions) => self.instructions.render(ui, &mut self.session),
                Screen::Page(Page::Settings) => {
                    self.settings.render(ui, &mut self.session, &mut self.chat)
                }
            }
        });
    }
}

fn conversation_list(ui: &mut egui::Ui, session: &mut SessionContext, page: &mut Page) {
    let current = session.conversations.current_id().map(str::to_string);
    let mut clicked: Option<String> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for conv in session.conversations.conversations() {
                let selected = current.as_deref() == Some(conv.id.as_str());
                if ui.selectable_label(selected, conv.display_title()).clicked() {
                    clicked = Some(conv.id.clone());
                }
            }
        });

    if let Some(id) = clicked {
        match session.conversations.select(&id) {
            Ok(()) => *page = Page::Chat,
            Err(e) => tracing::warn!(error = %e, "could not switch conversation"),
        }
    }
}
