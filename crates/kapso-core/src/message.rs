//! Outbound message kinds and their WhatsApp Cloud API wire shape.

use serde::{Serialize, Serializer};

use crate::KapsoError;

/// Interactive button messages carry at most this many reply buttons.
pub const MAX_BUTTONS: usize = 3;
/// Longest button title WhatsApp renders without rejecting the message.
pub const MAX_BUTTON_TITLE_CHARS: usize = 20;

/// A quick-reply button; `id` comes back in the inbound `button_reply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    /// Title is kept as given.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Title is cut to [`MAX_BUTTON_TITLE_CHARS`] characters.
    pub fn truncated(id: impl Into<String>, title: &str) -> Self {
        Self {
            id: id.into(),
            title: title.chars().take(MAX_BUTTON_TITLE_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text {
        body: String,
    },
    Buttons {
        body: String,
        buttons: Vec<ReplyButton>,
    },
    Image {
        link: String,
        caption: Option<String>,
    },
}

/// A message addressed to one recipient. Constructors validate the content,
/// so every value serializes to a payload the provider accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    to: String,
    content: MessageContent,
}

impl OutboundMessage {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            content: MessageContent::Text { body: body.into() },
        }
    }

    pub fn buttons(
        to: impl Into<String>,
        body: impl Into<String>,
        buttons: Vec<ReplyButton>,
    ) -> Result<Self, KapsoError> {
        if buttons.is_empty() {
            return Err(KapsoError::Invalid(
                "interactive button messages require at least 1 button".into(),
            ));
        }
        if buttons.len() > MAX_BUTTONS {
            return Err(KapsoError::Invalid(format!(
                "interactive button messages support at most {} buttons, got {}",
                MAX_BUTTONS,
                buttons.len()
            )));
        }
        if let Some(button) = buttons
            .iter()
            .find(|b| b.id.is_empty() || b.title.is_empty())
        {
            return Err(KapsoError::Invalid(format!(
                "button id and title must be non-empty (id: {:?})",
                button.id
            )));
        }
        Ok(Self {
            to: to.into(),
            content: MessageContent::Buttons {
                body: body.into(),
                buttons,
            },
        })
    }

    pub fn image(
        to: impl Into<String>,
        link: impl Into<String>,
        caption: Option<String>,
    ) -> Result<Self, KapsoError> {
        let link = link.into();
        if link.trim().is_empty() {
            return Err(KapsoError::Invalid("image link must be non-empty".into()));
        }
        Ok(Self {
            to: to.into(),
            content: MessageContent::Image {
                link,
                caption: caption.filter(|c| !c.is_empty()),
            },
        })
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Short name of the message kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self.content {
            MessageContent::Text { .. } => "text",
            MessageContent::Buttons { .. } => "interactive",
            MessageContent::Image { .. } => "image",
        }
    }
}

#[derive(Serialize)]
struct WirePayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(flatten)]
    body: WireBody<'a>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireBody<'a> {
    Text { text: WireText<'a> },
    Interactive { interactive: WireInteractive<'a> },
    Image { image: WireImage<'a> },
}

#[derive(Serialize)]
struct WireText<'a> {
    preview_url: bool,
    body: &'a str,
}

#[derive(Serialize)]
struct WireInteractive<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    body: WireInteractiveBody<'a>,
    action: WireAction<'a>,
}

#[derive(Serialize)]
struct WireInteractiveBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct WireAction<'a> {
    buttons: Vec<WireButton<'a>>,
}

#[derive(Serialize)]
struct WireButton<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    reply: WireReply<'a>,
}

#[derive(Serialize)]
struct WireReply<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Serialize)]
struct WireImage<'a> {
    link: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
}

impl<'a> From<&'a OutboundMessage> for WirePayload<'a> {
    fn from(m: &'a OutboundMessage) -> Self {
        let body = match &m.content {
            MessageContent::Text { body } => WireBody::Text {
                text: WireText {
                    preview_url: false,
                    body,
                },
            },
            MessageContent::Buttons { body, buttons } => WireBody::Interactive {
                interactive: WireInteractive {
                    kind: "button",
                    body: WireInteractiveBody { text: body },
                    action: WireAction {
                        buttons: buttons
                            .iter()
                            .map(|b| WireButton {
                                kind: "reply",
                                reply: WireReply {
                                    id: &b.id,
                                    title: &b.title,
                                },
                            })
                            .collect(),
                    },
                },
            },
            MessageContent::Image { link, caption } => WireBody::Image {
                image: WireImage {
                    link,
                    caption: caption.as_deref(),
                },
            },
        };
        WirePayload {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &m.to,
            body,
        }
    }
}

impl Serialize for OutboundMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WirePayload::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_payload_shape() {
        let msg = OutboundMessage::text("5215512345678", "Hola");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "5215512345678",
                "type": "text",
                "text": { "preview_url": false, "body": "Hola" }
            })
        );
    }

    #[test]
    fn button_payload_shape() {
        let msg = OutboundMessage::buttons(
            "5215512345678",
            "¿En qué podemos ayudarte?",
            vec![
                ReplyButton::new("productos", "🛍️ Productos"),
                ReplyButton::new("precios", "💰 Precios"),
            ],
        )
        .unwrap();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "interactive");
        assert_eq!(value["interactive"]["type"], "button");
        assert_eq!(value["interactive"]["body"]["text"], "¿En qué podemos ayudarte?");
        let buttons = value["interactive"]["action"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(
            buttons[1],
            json!({ "type": "reply", "reply": { "id": "precios", "title": "💰 Precios" } })
        );
    }

    #[test]
    fn image_caption_is_optional() {
        let with = OutboundMessage::image("1", "https://x.test/a.png", Some("hi".into())).unwrap();
        let value = serde_json::to_value(&with).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["image"], json!({ "link": "https://x.test/a.png", "caption": "hi" }));

        let without = OutboundMessage::image("1", "https://x.test/a.png", None).unwrap();
        let value = serde_json::to_value(&without).unwrap();
        assert!(value["image"].get("caption").is_none());
    }

    #[test]
    fn rejects_too_many_buttons() {
        let buttons = (0..4)
            .map(|i| ReplyButton::new(format!("b{i}"), "x"))
            .collect();
        let err = OutboundMessage::buttons("1", "pick", buttons).unwrap_err();
        assert!(matches!(err, KapsoError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_buttons_and_blank_image() {
        assert!(OutboundMessage::buttons("1", "pick", vec![]).is_err());
        assert!(OutboundMessage::buttons("1", "pick", vec![ReplyButton::new("", "t")]).is_err());
        assert!(OutboundMessage::image("1", "  ", None).is_err());
    }

    #[test]
    fn long_titles_are_kept_unless_truncated() {
        let title = "Más información sobre productos";
        assert_eq!(ReplyButton::new("info", title).title, title);

        let cut = ReplyButton::truncated("info", title);
        assert_eq!(cut.title.chars().count(), MAX_BUTTON_TITLE_CHARS);
        assert_eq!(cut.title, "Más información sobr");
    }
}
