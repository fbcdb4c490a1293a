pub mod conversation;
pub mod error;
pub mod instructions;
pub mod strain_report;

pub mod agent_api {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        System,
        User,
        Assistant,
    }

    impl Role {
        pub fn as_str(&self) -> &'static str {
            match self {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            }
        }
    }

    impl fmt::Display for Role {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// One entry of a conversation. Immutable once appended.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: Role,
        pub content: String,
    }

    impl ChatMessage {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                role,
                content: content.into(),
            }
        }

        pub fn system(content: impl Into<String>) -> Self {
            Self::new(Role::System, content)
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self::new(Role::User, content)
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self::new(Role::Assistant, content)
        }
    }
}

pub mod models {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    /// Perplexity model identifiers offered in Settings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub enum PerplexityModel {
        #[default]
        #[serde(rename = "sonar")]
        Sonar,
        #[serde(rename = "sonar-pro")]
        SonarPro,
        #[serde(rename = "sonar-deep-research")]
        SonarDeepResearch,
        #[serde(rename = "sonar-reasoning-pro")]
        SonarReasoningPro,
        #[serde(rename = "mistral-7b-instruct")]
        Mistral7bInstruct,
    }

    impl PerplexityModel {
        pub const ALL: [PerplexityModel; 5] = [
            PerplexityModel::Sonar,
            PerplexityModel::SonarPro,
            PerplexityModel::SonarDeepResearch,
            PerplexityModel::SonarReasoningPro,
            PerplexityModel::Mistral7bInstruct,
        ];

        pub fn as_str(&self) -> &'static str {
            match self {
                PerplexityModel::Sonar => "sonar",
                PerplexityModel::SonarPro => "sonar-pro",
                PerplexityModel::SonarDeepResearch => "sonar-deep-research",
                PerplexityModel::SonarReasoningPro => "sonar-reasoning-pro",
                PerplexityModel::Mistral7bInstruct => "mistral-7b-instruct",
            }
        }
    }

    impl fmt::Display for PerplexityModel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for PerplexityModel {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::ALL
                .into_iter()
                .find(|m| m.as_str() == s.trim())
                .ok_or_else(|| format!("unknown model: {}", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::agent_api::{ChatMessage, Role};
    use super::models::PerplexityModel;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let msg = ChatMessage::assistant("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);

        let back: ChatMessage = serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert_eq!(back.role, Role::System);
    }

    #[test]
    fn test_model_identifiers() {
        assert_eq!(PerplexityModel::default(), PerplexityModel::Sonar);
        for model in PerplexityModel::ALL {
            assert_eq!(model.as_str().parse::<PerplexityModel>().unwrap(), model);
            assert_eq!(
                serde_json::to_string(&model).unwrap(),
                format!("\"{}\"", model.as_str())
            );
        }
        assert!("gpt-4".parse::<PerplexityModel>().is_err());
    }
}
