use serde::{Deserialize, Serialize};

/// Action offered in a swipe tray. Every one of them is simulated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailAction {
    Archive,
    Delete,
    ToggleRead,
    ToggleFlag,
    Reply,
}

impl MailAction {
    pub fn label(self) -> &'static str {
        match self {
            MailAction::Archive => "Archive",
            MailAction::Delete => "Delete",
            MailAction::ToggleRead => "Read",
            MailAction::ToggleFlag => "Flag",
            MailAction::Reply => "Reply",
        }
    }
}

/// Represents an action that can be undone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoableAction {
    /// Message was moved to the archive folder
    Archive { message_id: String, from_folder: String },
    /// Message was moved to the trash folder
    Delete { message_id: String, from_folder: String },
}

impl UndoableAction {
    /// Returns a human-readable description for status messages
    pub fn description(&self) -> &'static str {
        match self {
            UndoableAction::Delete { .. } => "delete",
            UndoableAction::Archive { .. } => "archive",
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            UndoableAction::Archive { message_id, .. }
            | UndoableAction::Delete { message_id, .. } => message_id,
        }
    }

    pub fn from_folder(&self) -> &str {
        match self {
            UndoableAction::Archive { from_folder, .. }
            | UndoableAction::Delete { from_folder, .. } => from_folder,
        }
    }
}
