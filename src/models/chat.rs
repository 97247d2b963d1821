use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// Follow-up questions derived from the latest model turn. Each list is
/// capped at three entries and the whole set is replaced wholesale; it is
/// only non-empty while no response is in flight.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub specific: Vec<String>,
    pub general: Vec<String>,
}

impl SuggestionSet {
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.general.is_empty()
    }

    pub fn clear(&mut self) {
        self.specific.clear();
        self.general.clear();
    }
}
