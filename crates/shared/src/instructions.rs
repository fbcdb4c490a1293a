//! System-instruction presets.
//!
//! A preset is a named system prompt. The "Default" preset is seeded from
//! [`DEFAULT_INSTRUCTIONS`] at session start and always stays first.

pub const DEFAULT_PRESET_NAME: &str = "Default";

pub const DEFAULT_INSTRUCTIONS: &str = r#"You are a cannabis industry research assistant powered by Perplexity AI tools. Your role is to help report on strain-specific data points. You will be provided with the name of a cannabis strain. Your task is to return a structured report containing 14 specific data fields, all in plain text Markdown format, as outlined below.

### If the strain is well-known
If the strain is established and information is available, conduct intelligent research using all tools at your disposal. Cross-reference reputable sources (Leafly.com (primary), CannaDB.org, Strainsdb.org, etc.) to ensure accuracy. Return the most up-to-date and complete information for the following 14 fields:

---

1. **Strain Name**
2. **Alt Name(s)**
3. **Nickname(s)**
4. **Hybridization** (Indica, Sativa or Hybrid)
5. **Lineage/Genetics**
6. **Trivia** (Interesting facts about the strain)
7. **Reported Flavors (Top 3)**
8. **Reported Effects (Top 3)**
9. **Availability by State (U.S. states where it's sold)**
10. **Awards (if any)**
11. **Original Release Date (if known)**
12. **Physical Characteristics (Color, Bud Structure, Trichomes)**
13. **Similar Strains (Top 3 by effect/genetics)**
14. **User Rating (Average Score, # of Reviews, Common Comments)**

---
### If the strain is a new hybrid and/or information is limited

If full information is not available about the strain (e.g., it's a new hybrid or rare cross). Clearly state that the original strain had insufficient data.

---
### Tone and format

- Professional, neutral, data-focused.
- Use **bullet points or line breaks** where appropriate for readability.
- If a data point is **unknown or unavailable**, state: Unknown.
"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("no preset named '{0}'")]
    UnknownPreset(String),
    #[error("a preset named '{0}' already exists")]
    DuplicatePreset(String),
    #[error("preset name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPreset {
    pub name: String,
    pub text: String,
}

/// Name-to-text mapping that keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPresets {
    presets: Vec<InstructionPreset>,
}

impl InstructionPresets {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.text.as_str())
    }

    /// Overwrite the text of an existing preset.
    pub fn save(&mut self, name: &str, text: impl Into<String>) -> Result<(), PresetError> {
        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PresetError::UnknownPreset(name.to_string()))?;
        preset.text = text.into();
        Ok(())
    }

    /// Add a new preset at the end. Returns the stored (trimmed) name.
    pub fn create(&mut self, name: &str, text: impl Into<String>) -> Result<String, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        if self.contains(name) {
            return Err(PresetError::DuplicatePreset(name.to_string()));
        }
        self.presets.push(InstructionPreset {
            name: name.to_string(),
            text: text.into(),
        });
        Ok(name.to_string())
    }
}

impl Default for InstructionPresets {
    fn default() -> Self {
        Self {
            presets: vec![InstructionPreset {
                name: DEFAULT_PRESET_NAME.to_string(),
                text: DEFAULT_INSTRUCTIONS.to_string(),
            }],
        }
    }
}
