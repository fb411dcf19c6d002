//! The qualification flow as a pure transition function.

use std::sync::LazyLock;

use kapso_core::{KapsoError, OutboundMessage, ReplyButton};
use regex::Regex;

use crate::state::{ConversationState, LeadData, Step};

const ASK_NAME: &str = "¡Bienvenido! 👋 Para ayudarte mejor, ¿cuál es tu nombre?";
const INVALID_EMAIL: &str =
    "Por favor, proporciona un correo electrónico válido (ejemplo: usuario@dominio.com)";
const THANKS: &str = "¡Gracias! Hemos registrado tu información. Un miembro de nuestro equipo se pondrá en contacto contigo pronto. ✅";
const ALREADY_REGISTERED: &str = "Ya hemos registrado tu información. Si necesitas algo más, escríbenos \"reset\" para empezar de nuevo.";
const WELCOME_BACK: &str = "¡Bienvenido de nuevo! 👋 Para ayudarte mejor, ¿cuál es tu nombre?";

const RESET_KEYWORD: &str = "reset";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Button ids offered after the email step, with their display titles.
const INTEREST_BUTTONS: [(&str, &str); 3] = [
    ("productos", "🛍️ Productos"),
    ("precios", "💰 Precios"),
    ("llamada", "📞 Llamada"),
];

/// Human-readable interest for a button id; `soporte` has no button but is
/// still recognized when typed.
pub fn interest_label(id: &str) -> Option<&'static str> {
    match id {
        "productos" => Some("Información sobre productos"),
        "precios" => Some("Consulta de precios"),
        "llamada" => Some("Agendar una llamada"),
        "soporte" => Some("Soporte técnico"),
        _ => None,
    }
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL.is_match(input)
}

/// What to send back after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Buttons {
        body: String,
        buttons: Vec<ReplyButton>,
    },
}

impl Reply {
    pub fn body(&self) -> &str {
        match self {
            Reply::Text(body) | Reply::Buttons { body, .. } => body,
        }
    }

    /// Address the reply to `to`.
    pub fn into_message(self, to: &str) -> Result<OutboundMessage, KapsoError> {
        match self {
            Reply::Text(body) => Ok(OutboundMessage::text(to, body)),
            Reply::Buttons { body, buttons } => OutboundMessage::buttons(to, body, buttons),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConversationState,
    pub reply: Reply,
}

impl Transition {
    fn text(state: ConversationState, body: impl Into<String>) -> Self {
        Self {
            state,
            reply: Reply::Text(body.into()),
        }
    }
}

/// Advance `current` by one user input.
pub fn advance(current: &ConversationState, input: &str) -> Transition {
    let mut next = current.clone();

    match current.step {
        Step::Initial => {
            next.step = Step::WaitingForName;
            Transition::text(next, ASK_NAME)
        }
        Step::WaitingForName => {
            next.data.name = Some(input.to_string());
            next.step = Step::WaitingForEmail;
            Transition::text(
                next,
                format!("Encantado, {input}. ¿Cuál es tu correo electrónico?"),
            )
        }
        Step::WaitingForEmail if !is_valid_email(input) => Transition::text(next, INVALID_EMAIL),
        Step::WaitingForEmail => {
            next.data.email = Some(input.to_string());
            next.step = Step::WaitingForInterest;
            let name = next.data.name.clone().unwrap_or_default();
            Transition {
                state: next,
                reply: Reply::Buttons {
                    body: format!("Perfecto, {name}. ¿En qué podemos ayudarte?"),
                    buttons: INTEREST_BUTTONS
                        .iter()
                        .map(|(id, title)| ReplyButton::new(*id, *title))
                        .collect(),
                },
            }
        }
        Step::WaitingForInterest => {
            let interest = interest_label(input).map_or_else(|| input.to_string(), str::to_string);
            next.data.interest = Some(interest);
            next.step = Step::Completed;
            Transition::text(next, THANKS)
        }
        Step::Completed if input.to_lowercase() == RESET_KEYWORD => Transition::text(
            ConversationState {
                step: Step::WaitingForName,
                data: LeadData::default(),
            },
            WELCOME_BACK,
        ),
        Step::Completed => Transition::text(next, ALREADY_REGISTERED),
    }
}
