use serde::{Deserialize, Serialize};

/// Position of a lead in the qualification flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    #[default]
    Initial,
    WaitingForName,
    WaitingForEmail,
    WaitingForInterest,
    Completed,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Initial => "INITIAL",
            Step::WaitingForName => "WAITING_FOR_NAME",
            Step::WaitingForEmail => "WAITING_FOR_EMAIL",
            Step::WaitingForInterest => "WAITING_FOR_INTEREST",
            Step::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers collected so far. Fields are only ever set, except on reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
}

impl LeadData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.interest.is_none()
    }
}

/// The `conversation_state` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: Step,
    #[serde(default)]
    pub data: LeadData,
}

/// A row of the `leads` table, keyed by `phone_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub phone_number: String,
    #[serde(default)]
    pub conversation_state: ConversationState,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interest: Option<String>,
}

impl LeadRecord {
    /// A lead seen for the first time.
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            conversation_state: ConversationState::default(),
            name: None,
            email: None,
            interest: None,
        }
    }

    pub fn apply(&mut self, update: &LeadUpdate) {
        self.conversation_state = update.conversation_state.clone();
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(email) = &update.email {
            self.email = Some(email.clone());
        }
        if let Some(interest) = &update.interest {
            self.interest = Some(interest.clone());
        }
    }
}

/// Columns written after a message is processed. The flattened copies are
/// only present once the flow reaches [`Step::Completed`]; absent columns are
/// left untouched by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadUpdate {
    pub conversation_state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
}

impl From<&ConversationState> for LeadUpdate {
    fn from(state: &ConversationState) -> Self {
        let completed = state.step == Step::Completed;
        let flat = |v: &Option<String>| if completed { v.clone() } else { None };
        Self {
            conversation_state: state.clone(),
            name: flat(&state.data.name),
            email: flat(&state.data.email),
            interest: flat(&state.data.interest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_wire_names() {
        assert_eq!(
            serde_json::to_value(Step::WaitingForInterest).unwrap(),
            json!("WAITING_FOR_INTEREST")
        );
        let step: Step = serde_json::from_value(json!("COMPLETED")).unwrap();
        assert_eq!(step, Step::Completed);
        assert_eq!(Step::WaitingForEmail.to_string(), "WAITING_FOR_EMAIL");
    }

    #[test]
    fn state_without_data_decodes_empty() {
        let state: ConversationState = serde_json::from_value(json!({ "step": "INITIAL" })).unwrap();
        assert!(state.data.is_empty());
    }

    #[test]
    fn empty_data_serializes_as_empty_object() {
        let value = serde_json::to_value(ConversationState::default()).unwrap();
        assert_eq!(value, json!({ "step": "INITIAL", "data": {} }));
    }

    #[test]
    fn record_ignores_extra_columns() {
        let record: LeadRecord = serde_json::from_value(json!({
            "id": 7,
            "created_at": "2024-01-01T00:00:00Z",
            "phone_number": "521",
            "conversation_state": { "step": "WAITING_FOR_EMAIL", "data": { "name": "Ana" } },
            "name": null
        }))
        .unwrap();
        assert_eq!(record.conversation_state.step, Step::WaitingForEmail);
        assert_eq!(record.conversation_state.data.name.as_deref(), Some("Ana"));
        assert!(record.name.is_none());
    }

    #[test]
    fn update_flattens_only_when_completed() {
        let mut state = ConversationState {
            step: Step::WaitingForInterest,
            data: LeadData {
                name: Some("Ana".into()),
                email: Some("ana@x.com".into()),
                interest: None,
            },
        };
        let partial = LeadUpdate::from(&state);
        assert!(partial.name.is_none() && partial.email.is_none());
        assert_eq!(
            serde_json::to_value(&partial).unwrap().as_object().unwrap().len(),
            1
        );

        state.step = Step::Completed;
        state.data.interest = Some("Consulta de precios".into());
        let full = LeadUpdate::from(&state);
        assert_eq!(full.name.as_deref(), Some("Ana"));
        assert_eq!(full.interest.as_deref(), Some("Consulta de precios"));
    }

    #[test]
    fn apply_keeps_flattened_columns_when_absent() {
        let mut record = LeadRecord::new("521");
        record.name = Some("Ana".into());
        record.apply(&LeadUpdate::from(&ConversationState {
            step: Step::WaitingForName,
            data: LeadData::default(),
        }));
        assert_eq!(record.conversation_state.step, Step::WaitingForName);
        assert_eq!(record.name.as_deref(), Some("Ana"));
    }
}
