//! Per-run session context.
//!
//! Holds everything the pages share: login state, the active API key, the
//! selected model, the active instruction text with its presets, and the
//! conversation store.

use services::ConversationStore;
use shared::instructions::{InstructionPresets, PresetError, DEFAULT_PRESET_NAME};
use shared::models::PerplexityModel;
use zeroize::Zeroizing;

pub struct SessionContext {
    pub authenticated: bool,
    api_key: Option<Zeroizing<String>>,
    pub model: PerplexityModel,
    /// Instruction text sent as the system message.
    pub instructions: String,
    pub presets: InstructionPresets,
    pub current_instruction_name: String,
    pub conversations: ConversationStore,
}

impl SessionContext {
    pub fn new(conversations: ConversationStore) -> Self {
        let presets = InstructionPresets::default();
        let instructions = presets
            .get(DEFAULT_PRESET_NAME)
            .unwrap_or_default()
            .to_string();
        Self {
            authenticated: false,
            api_key: None,
            model: PerplexityModel::default(),
            instructions,
            presets,
            current_instruction_name: DEFAULT_PRESET_NAME.to_string(),
            conversations,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(String::as_str)
    }

    /// Owned copy for handing to a worker thread.
    pub fn api_key_owned(&self) -> Option<Zeroizing<String>> {
        self.api_key.clone()
    }

    /// Replace the key with a trimmed non-empty value. Returns whether the
    /// stored key changed.
    pub fn set_api_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || self.api_key() == Some(key) {
            return false;
        }
        self.api_key = Some(Zeroizing::new(key.to_string()));
        tracing::info!("api key updated");
        true
    }

    /// Store a login key exactly as entered.
    pub fn store_login_key(&mut self, key: &str) {
        self.api_key = Some(Zeroizing::new(key.to_string()));
    }

    /// Make `name` the active preset and copy its text into the active
    /// instructions.
    pub fn select_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let text = self
            .presets
            .get(name)
            .ok_or_else(|| PresetError::UnknownPreset(name.to_string()))?
            .to_string();
        self.current_instruction_name = name.to_string();
        self.instructions = text;
        Ok(())
    }

    /// Overwrite the active preset and the active instructions with `text`.
    pub fn save_current_preset(&mut self, text: &str) -> Result<(), PresetError> {
        let name = self.current_instruction_name.clone();
        self.presets.save(&name, text)?;
        self.instructions = text.to_string();
        tracing::info!(preset = %name, "instructions saved");
        Ok(())
    }

    /// Add a new preset holding `text` and make it active.
    pub fn create_preset(&mut self, name: &str, text: &str) -> Result<String, PresetError> {
        let name = self.presets.create(name, text)?;
        self.select_preset(&name)?;
        tracing::info!(preset = %name, "instruction preset created");
        Ok(name)
    }
}

#[cfg(test)]
pub(crate) fn in_memory_session() -> SessionContext {
    use services::{LocalStore, MemoryStore};
    SessionContext::new(ConversationStore::open(LocalStore::new(Box::new(
        MemoryStore::new(),
    ))))
}
