use super::action::Action;

/// An inline button: a label and the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    #[must_use]
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    /// Data the transport sends back when the button is pressed.
    #[must_use]
    pub fn data(&self) -> String {
        self.action.encode()
    }
}

/// One message to deliver, with an optional keyboard of button rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl OutgoingMessage {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Vec<Vec<Button>>) -> Self {
        self.keyboard = keyboard;
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        self.keyboard.push(row);
        self
    }
}

/// Everything sent back for one inbound event, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub messages: Vec<OutgoingMessage>,
}

impl Reply {
    #[must_use]
    pub fn one(message: OutgoingMessage) -> Self {
        Self {
            messages: vec![message],
        }
    }

    #[must_use]
    pub fn then(mut self, message: OutgoingMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// All message texts joined by blank lines, handy for assertions and logs.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Every button across all messages.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.messages
            .iter()
            .flat_map(|m| m.keyboard.iter().flatten())
    }
}
