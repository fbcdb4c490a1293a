//! Chat page: conversation transcript, input box and the in-flight request.
//!
//! A submitted prompt is staged, not appended. The request runs on a worker
//! thread with its own tokio runtime and reports back over a channel that
//! [`ChatPage::poll`] drains once per frame. Only a successful reply commits
//! the prompt and the reply to the conversation; a failure leaves the
//! conversation untouched and hands the prompt back to the input box.

use super::report_card;
use crate::session::SessionContext;
use crate::simple_md::render_markdown;
use eframe::egui;
use providers::{CompletionClient, CompletionRequest};
use shared::agent_api::{ChatMessage, Role};
use shared::error::ApiError;
use shared::strain_report::StrainReport;
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;
use zeroize::Zeroizing;

pub const CONVERSATION_NOT_FOUND: &str = "Conversation not found.";

/// Quick picks offered while a conversation is empty.
pub const SUGGESTED_STRAINS: [&str; 4] = ["Blue Dream", "OG Kush", "Girl Scout Cookies", "Gelato"];

struct PendingExchange {
    conversation_id: String,
    prompt: ChatMessage,
    started_at: Instant,
    rx: Receiver<Result<String, ApiError>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    /// A request is already in flight.
    Busy,
    Empty,
    NoConversation,
}

pub struct ChatPage {
    client: Arc<dyn CompletionClient>,
    pub input: String,
    pending: Option<PendingExchange>,
    error: Option<String>,
    /// Report cards the user expanded, by conversation id and message index.
    open_reports: HashSet<(String, usize)>,
    rename: Option<String>,
}

impl ChatPage {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            input: String::new(),
            pending: None,
            error: None,
            open_reports: HashSet::new(),
            rename: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop the in-flight request for `conversation_id`, if any. Its reply is
    /// never appended. Returns whether a request was dropped.
    pub fn discard_pending(&mut self, conversation_id: &str) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.conversation_id == conversation_id)
        {
            self.pending = None;
            tracing::info!(conversation = %conversation_id, "discarded in-flight request");
            return true;
        }
        false
    }

    /// Stage the input as a user message and start the completion request.
    pub fn submit(&mut self, session: &SessionContext) -> SubmitOutcome {
        if self.pending.is_some() {
            return SubmitOutcome::Busy;
        }
        let text = self.input.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }
        let conv = match session.conversations.current() {
            Ok(conv) => conv,
            Err(e) => {
                tracing::warn!(error = %e, "no conversation to send to");
                self.error = Some(CONVERSATION_NOT_FOUND.to_string());
                return SubmitOutcome::NoConversation;
            }
        };

        let prompt = ChatMessage::user(text);
        let mut history = conv.messages.clone();
        history.push(prompt.clone());
        let request = CompletionRequest::new(session.model, &session.instructions, &history);
        tracing::info!(
            conversation = %conv.id,
            model = %session.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        let rx = spawn_completion(self.client.clone(), request, session.api_key_owned());
        self.pending = Some(PendingExchange {
            conversation_id: conv.id.clone(),
            prompt,
            started_at: Instant::now(),
            rx,
        });
        self.input.clear();
        self.error = None;
        SubmitOutcome::Sent
    }

    /// Send a suggested strain as if it had been typed.
    pub fn pick_suggestion(&mut self, session: &SessionContext, strain: &str) -> SubmitOutcome {
        if self.pending.is_some() {
            return SubmitOutcome::Busy;
        }
        self.input = strain.to_string();
        self.submit(session)
    }

    /// Check for a finished request (called each frame). Returns true when
    /// the in-flight request completed during this call.
    pub fn poll(&mut self, session: &mut SessionContext) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(ApiError::Transport(
                "request worker exited without a reply".to_string(),
            )),
        };
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let elapsed_ms = pending.started_at.elapsed().as_millis() as u64;

        match result {
            Ok(reply) => {
                tracing::info!(elapsed_ms, chars = reply.len(), "reply received");
                if let Err(e) = session.conversations.append_exchange(
                    &pending.conversation_id,
                    pending.prompt,
                    ChatMessage::assistant(reply),
                ) {
                    tracing::warn!(error = %e, "dropping reply for a missing conversation");
                    self.error = Some(CONVERSATION_NOT_FOUND.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(
                    elapsed_ms,
                    request_error = e.is_request_error(),
                    error = %e,
                    "chat request failed"
                );
                self.error = Some(format_api_error(&e));
                if self.input.trim().is_empty() {
                    self.input = pending.prompt.content;
                }
            }
        }
        true
    }

    pub fn render(&mut self, ui: &mut egui::Ui, session: &mut SessionContext) {
        let dark = ui.visuals().dark_mode;
        let conv = match session.conversations.current() {
            Ok(conv) => conv.clone(),
            Err(_) => {
                ui.add_space(20.0);
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), CONVERSATION_NOT_FOUND);
                return;
            }
        };

        // Header with inline rename.
        ui.horizontal(|ui| match &mut self.rename {
            Some(buffer) => {
                let response = ui.add(egui::TextEdit::singleline(buffer).desired_width(280.0));
                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if enter || ui.button("Save").clicked() {
                    if let Err(e) = session.conversations.rename(&conv.id, buffer) {
                        tracing::warn!(error = %e, "rename failed");
                    }
                    self.rename = None;
                } else if ui.button("Cancel").clicked() {
                    self.rename = None;
                }
            }
            None => {
                ui.heading(conv.display_title());
                if ui.small_button("✏").on_hover_text("Rename").clicked() {
                    self.rename = Some(conv.title.clone());
                }
            }
        });
        ui.label(
            egui::RichText::new(format!("🤖 AI Research Assistant · {}", session.model))
                .small()
                .weak(),
        );
        ui.separator();

        let staged = self
            .pending
            .as_ref()
            .filter(|p| p.conversation_id == conv.id)
            .map(|p| (p.prompt.content.clone(), p.started_at));

        let chat_height = (ui.available_height() - 80.0).max(120.0);
        egui::ScrollArea::vertical()
            .max_height(chat_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if conv.messages.is_empty() && staged.is_none() {
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new("Enter a strain name to get a structured report.")
                            .weak(),
                    );
                    ui.add_space(6.0);
                    ui.horizontal_wrapped(|ui| {
                        for strain in SUGGESTED_STRAINS {
                            if ui.button(strain).clicked() {
                                self.pick_suggestion(session, strain);
                            }
                        }
                    });
                }
                for (idx, msg) in conv.messages.iter().enumerate() {
                    ui.add_space(6.0);
                    self.render_message(ui, &conv.id, idx, msg, dark);
                }
                if let Some((prompt, started_at)) = &staged {
                    ui.add_space(6.0);
                    bubble(ui, Role::User, dark, |ui| {
                        ui.label(prompt.as_str());
                    });
                    ui.add_space(6.0);
                    thinking(ui, *started_at, dark);
                }
            });

        if let Some(error) = &self.error {
            ui.add_space(4.0);
            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), error);
        }

        ui.add_space(6.0);
        let waiting = self.is_waiting();
        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                !waiting,
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Ask your question...")
                    .desired_width(ui.available_width() - 70.0),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let can_send = !waiting && !self.input.trim().is_empty();
            let clicked = ui
                .add_enabled(can_send, egui::Button::new("Send ➤"))
                .clicked();
            if (enter || clicked) && self.submit(session) == SubmitOutcome::Sent {
                response.request_focus();
            }
        });
    }

    fn render_message(
        &mut self,
        ui: &mut egui::Ui,
        conversation_id: &str,
        idx: usize,
        msg: &ChatMessage,
        dark: bool,
    ) {
        let text_color = if dark {
            egui::Color32::from_rgb(230, 230, 235)
        } else {
            egui::Color32::from_rgb(30, 30, 35)
        };

        match msg.role {
            Role::Assistant => {
                bubble(ui, Role::Assistant, dark, |ui| {
                    render_markdown(ui, &msg.content, text_color);
                });
                let report = StrainReport::parse(&msg.content);
                if report.looks_like_report() {
                    let key = (conversation_id.to_string(), idx);
                    let open = self.open_reports.contains(&key);
                    let label = if open { "Hide report card" } else { "📋 Report card" };
                    if ui.small_button(label).clicked() {
                        if open {
                            self.open_reports.remove(&key);
                        } else {
                            self.open_reports.insert(key);
                        }
                    }
                    if open {
                        let id = egui::Id::new(("report", conversation_id, idx));
                        report_card::show(ui, id, &report);
                    }
                }
            }
            role => {
                bubble(ui, role, dark, |ui| {
                    ui.label(egui::RichText::new(&msg.content).color(text_color));
                });
            }
        }
    }
}

fn bubble(ui: &mut egui::Ui, role: Role, dark: bool, add_contents: impl FnOnce(&mut egui::Ui)) {
    let fill = match (role, dark) {
        (Role::User, true) => egui::Color32::from_rgb(45, 70, 110),
        (Role::User, false) => egui::Color32::from_rgb(215, 230, 250),
        (_, true) => egui::Color32::from_rgb(50, 50, 58),
        (_, false) => egui::Color32::from_rgb(238, 238, 242),
    };
    let who = match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::System => "System",
    };
    egui::Frame::none()
        .fill(fill)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(who).small().strong());
            add_contents(ui);
        });
}

fn thinking(ui: &mut egui::Ui, started_at: Instant, dark: bool) {
    let time = ui.input(|i| i.time);
    let dots = match ((time * 2.0) as i32) % 4 {
        0 => "   ",
        1 => ".  ",
        2 => ".. ",
        _ => "...",
    };
    let secs = started_at.elapsed().as_secs();
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(
            egui::RichText::new(format!("Thinking & researching{} ({}s)", dots, secs))
                .color(if dark {
                    egui::Color32::from_rgb(160, 160, 180)
                } else {
                    egui::Color32::from_rgb(60, 60, 70)
                })
                .italics(),
        );
    });
}

fn spawn_completion(
    client: Arc<dyn CompletionClient>,
    request: CompletionRequest,
    api_key: Option<Zeroizing<String>>,
) -> Receiver<Result<String, ApiError>> {
    let (tx, rx) = channel();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(Err(ApiError::Transport(format!(
                    "could not start async runtime: {}",
                    e
                ))));
                return;
            }
        };
        let key = api_key.as_deref().map(String::as_str);
        let result = rt.block_on(client.complete(request, key));
        let _ = tx.send(result);
    });
    rx
}

/// Turn an API failure into a message for the chat page.
pub fn format_api_error(error: &ApiError) -> String {
    let detail = match error {
        ApiError::MissingCredential => {
            return "No Perplexity API key is set. Log in again or add a key under Settings."
                .to_string();
        }
        ApiError::MalformedResponse(detail) => {
            return format!(
                "Perplexity sent a reply that could not be read.\n\nError: {}",
                detail
            );
        }
        ApiError::Transport(detail) => detail,
    };
    let lower = detail.to_lowercase();

    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
    {
        return format!(
            "Perplexity rejected the API key. Check it under Settings.\n\nError: {}",
            detail
        );
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        return format!(
            "Perplexity is temporarily busy. Please wait a moment and try again.\n\nError: {}",
            detail
        );
    }

    if lower.contains("error sending request")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("dns")
    {
        return format!(
            "I'm having trouble reaching Perplexity. \
             Please check your network connection.\n\nError: {}",
            detail
        );
    }

    format!("Error querying Perplexity API: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::in_memory_session;
    use providers::PerplexityClient;
    use shared::instructions::DEFAULT_INSTRUCTIONS;
    use shared::models::PerplexityModel;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedClient {
        reply: Result<String, ApiError>,
        delay: Duration,
        seen: Mutex<Vec<(CompletionRequest, Option<String>)>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<&str, ApiError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                delay,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<(CompletionRequest, Option<String>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            request: CompletionRequest,
            api_key: Option<&str>,
        ) -> Result<String, ApiError> {
            self.seen
                .lock()
                .unwrap()
                .push((request, api_key.map(str::to_string)));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone()
        }
    }

    fn wait_for_reply(page: &mut ChatPage, session: &mut SessionContext) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !page.poll(session) {
            assert!(Instant::now() < deadline, "request never finished");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn logged_in() -> SessionContext {
        let mut session = in_memory_session();
        session.authenticated = true;
        session.set_api_key("pplx-test");
        session
    }

    fn send(page: &mut ChatPage, session: &mut SessionContext, text: &str) {
        page.input = text.to_string();
        assert_eq!(page.submit(session), SubmitOutcome::Sent);
        wait_for_reply(page, session);
    }

    #[test]
    fn test_successful_exchange_appends_prompt_and_reply() {
        let client = ScriptedClient::new(Ok("Strain Name: Blue Dream"));
        let mut page = ChatPage::new(client.clone());
        let mut session = logged_in();

        page.input = "Blue Dream".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Sent);
        assert!(page.is_waiting());
        assert!(page.input.is_empty());
        // Staged only until the reply lands.
        assert!(session.conversations.current().unwrap().messages.is_empty());

        wait_for_reply(&mut page, &mut session);
        assert!(!page.is_waiting());
        assert_eq!(page.error(), None);

        let conv = session.conversations.current().unwrap();
        assert_eq!(conv.title, "Blue Dream");
        assert_eq!(
            conv.messages,
            vec![
                ChatMessage::user("Blue Dream"),
                ChatMessage::assistant("Strain Name: Blue Dream"),
            ]
        );

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let (request, key) = &requests[0];
        assert_eq!(request.model, PerplexityModel::Sonar);
        assert_eq!(request.messages[0], ChatMessage::system(DEFAULT_INSTRUCTIONS));
        assert_eq!(request.messages[1], ChatMessage::user("Blue Dream"));
        assert_eq!(key.as_deref(), Some("pplx-test"));
    }

    #[test]
    fn test_history_and_settings_are_sent() {
        let client = ScriptedClient::new(Ok("ok"));
        let mut page = ChatPage::new(client.clone());
        let mut session = logged_in();
        session.model = PerplexityModel::SonarPro;
        session.instructions = "Be terse.".to_string();

        send(&mut page, &mut session, "OG Kush");
        send(&mut page, &mut session, "and its lineage?");

        let requests = client.requests();
        let (second, _) = &requests[1];
        assert_eq!(second.model, PerplexityModel::SonarPro);
        assert_eq!(
            second.messages,
            vec![
                ChatMessage::system("Be terse."),
                ChatMessage::user("OG Kush"),
                ChatMessage::assistant("ok"),
                ChatMessage::user("and its lineage?"),
            ]
        );
        assert_eq!(session.conversations.current().unwrap().messages.len(), 4);
    }

    #[test]
    fn test_failure_leaves_conversation_untouched() {
        let client = ScriptedClient::new(Err(ApiError::Transport(
            "perplexity error: 429 Too Many Requests".to_string(),
        )));
        let mut page = ChatPage::new(client);
        let mut session = logged_in();
        let before = session.conversations.current().unwrap().clone();

        send(&mut page, &mut session, "Blue Dream");

        assert_eq!(session.conversations.current().unwrap(), &before);
        assert!(page.error().unwrap().contains("busy"));
        assert_eq!(page.input, "Blue Dream");
        assert!(!page.is_waiting());
    }

    #[test]
    fn test_missing_key_blocks_request() {
        let client = Arc::new(PerplexityClient::with_endpoint("http://127.0.0.1:9").unwrap());
        let mut page = ChatPage::new(client);
        let mut session = in_memory_session();
        session.authenticated = true;

        send(&mut page, &mut session, "Gelato");

        assert_eq!(
            page.error(),
            Some(format_api_error(&ApiError::MissingCredential).as_str())
        );
        assert!(session.conversations.current().unwrap().messages.is_empty());
    }

    #[test]
    fn test_blank_and_concurrent_submits_ignored() {
        let client = ScriptedClient::slow("ok", Duration::from_millis(300));
        let mut page = ChatPage::new(client.clone());
        let mut session = logged_in();

        page.input = "   ".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Empty);

        page.input = "Gorilla Glue".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Sent);
        page.input = "Sour Diesel".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Busy);
        assert_eq!(page.input, "Sour Diesel");

        wait_for_reply(&mut page, &mut session);
        assert_eq!(client.requests().len(), 1);
        assert_eq!(session.conversations.current().unwrap().messages.len(), 2);
    }

    #[test]
    fn test_reply_lands_in_its_own_conversation() {
        let client = ScriptedClient::new(Ok("report"));
        let mut page = ChatPage::new(client);
        let mut session = logged_in();
        let first = session.conversations.current_id().unwrap().to_string();

        page.input = "Zkittlez".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Sent);
        let second = session.conversations.create_new();
        wait_for_reply(&mut page, &mut session);

        assert_eq!(session.conversations.get(&first).unwrap().messages.len(), 2);
        assert!(session.conversations.get(&second).unwrap().messages.is_empty());
        assert_eq!(session.conversations.current_id(), Some(second.as_str()));
    }

    #[test]
    fn test_clearing_drops_in_flight_reply() {
        let client = ScriptedClient::slow("Strain Name: Blue Dream", Duration::from_millis(200));
        let mut page = ChatPage::new(client);
        let mut session = logged_in();

        page.input = "Blue Dream".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Sent);
        crate::pages::settings::SettingsPage::new()
            .clear_current(&mut session, &mut page)
            .unwrap();
        assert!(!page.is_waiting());

        std::thread::sleep(Duration::from_millis(400));
        assert!(!page.poll(&mut session));
        assert!(session.conversations.current().unwrap().messages.is_empty());
        assert!(page.error().is_none());
    }

    #[test]
    fn test_discard_ignores_other_conversations() {
        let client = ScriptedClient::slow("ok", Duration::from_millis(50));
        let mut page = ChatPage::new(client);
        let mut session = logged_in();
        let first = session.conversations.current_id().unwrap().to_string();

        page.input = "Zkittlez".to_string();
        assert_eq!(page.submit(&session), SubmitOutcome::Sent);
        let second = session.conversations.create_new();
        assert!(!page.discard_pending(&second));
        assert!(page.is_waiting());

        wait_for_reply(&mut page, &mut session);
        assert_eq!(session.conversations.get(&first).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_suggestion_submits_strain() {
        let client = ScriptedClient::slow("ok", Duration::from_millis(200));
        let mut page = ChatPage::new(client.clone());
        let mut session = logged_in();

        assert_eq!(page.pick_suggestion(&session, SUGGESTED_STRAINS[1]), SubmitOutcome::Sent);
        page.input = "draft".to_string();
        assert_eq!(page.pick_suggestion(&session, SUGGESTED_STRAINS[0]), SubmitOutcome::Busy);
        assert_eq!(page.input, "draft");

        wait_for_reply(&mut page, &mut session);
        assert_eq!(client.requests().len(), 1);
        assert_eq!(
            session.conversations.current().unwrap().messages[0],
            ChatMessage::user("OG Kush")
        );
    }

    #[test]
    fn test_format_api_error_hints() {
        let unauthorized = format_api_error(&ApiError::Transport(
            "perplexity error: 401 Unauthorized".into(),
        ));
        assert!(unauthorized.contains("rejected the API key"));

        let offline = format_api_error(&ApiError::Transport(
            "error sending request for url (https://api.perplexity.ai/chat/completions)".into(),
        ));
        assert!(offline.contains("network"));

        let other = format_api_error(&ApiError::Transport("perplexity error: 500".into()));
        assert_eq!(other, "Error querying Perplexity API: perplexity error: 500");

        let malformed = format_api_error(&ApiError::MalformedResponse("missing field".into()));
        assert!(malformed.contains("missing field"));
    }
}
