use crate::error::SeedError;
use crate::models::{
    Attachment, Folder, INBOX_ALIAS_FOLDER_ID, Message, MessageCategory, Recipients, Sender,
};
use inflections::case::to_title_case;
use serde::Deserialize;
use std::collections::HashMap;

const MAILBOX_JSON: &str = include_str!("../seed/mailbox.json");

#[derive(Debug, Deserialize)]
struct SeedFile {
    folders: Vec<Folder>,
    messages: Vec<SeedMessage>,
}

/// Message record as stored in the seed file; the date is relative to startup.
#[derive(Debug, Deserialize)]
struct SeedMessage {
    id: String,
    sender: Sender,
    #[serde(default)]
    recipients: Recipients,
    subject: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    body_html: String,
    minutes_ago: i64,
    #[serde(default)]
    is_read: Option<bool>,
    #[serde(default)]
    is_flagged: bool,
    #[serde(default)]
    is_answered: bool,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    is_thread: bool,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    attachments: Vec<Attachment>,
    folder: String,
    #[serde(default)]
    category: Option<MessageCategory>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
    pub messages: Vec<Message>,
}

pub fn load_seed(now_ms: i64) -> Result<Mailbox, SeedError> {
    parse_mailbox(MAILBOX_JSON, now_ms)
}

pub fn parse_mailbox(json: &str, now_ms: i64) -> Result<Mailbox, SeedError> {
    let seed: SeedFile = serde_json::from_str(json)?;

    let mut folders = seed.folders;
    for folder in &mut folders {
        if folder.display_name.is_empty() {
            folder.display_name = to_title_case(&folder.id);
        }
    }

    let mut thread_sizes: HashMap<&str, u32> = HashMap::new();
    for m in &seed.messages {
        if let Some(thread_id) = m.thread_id.as_deref() {
            *thread_sizes.entry(thread_id).or_default() += 1;
        }
    }

    let mut messages = Vec::with_capacity(seed.messages.len());
    for m in &seed.messages {
        let known = m.folder == INBOX_ALIAS_FOLDER_ID || folders.iter().any(|f| f.id == m.folder);
        if !known {
            return Err(SeedError::UnknownFolder {
                message: m.id.clone(),
                folder: m.folder.clone(),
            });
        }

        let timestamp = m
            .minutes_ago
            .checked_mul(60_000)
            .and_then(|offset| now_ms.checked_sub(offset))
            .ok_or_else(|| SeedError::DateOutOfRange {
                message: m.id.clone(),
                minutes_ago: m.minutes_ago,
            })?;

        let thread_count = m
            .thread_id
            .as_deref()
            .and_then(|t| thread_sizes.get(t).copied());

        messages.push(Message {
            id: m.id.clone(),
            sender: m.sender.clone(),
            recipients: m.recipients.clone(),
            subject: m.subject.clone(),
            snippet: m.snippet.clone(),
            body_html: m.body_html.clone(),
            timestamp,
            is_read: m.is_read.unwrap_or(true),
            is_flagged: m.is_flagged,
            is_answered: m.is_answered,
            is_favorite: m.is_favorite,
            is_thread: m.is_thread,
            thread_id: m.thread_id.clone(),
            thread_count,
            attachments: m.attachments.clone(),
            folder: m.folder.clone(),
            category: m.category,
            labels: m.labels.clone(),
        });
    }

    tracing::debug!(
        folders = folders.len(),
        messages = messages.len(),
        "loaded seed mailbox"
    );
    Ok(Mailbox { folders, messages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FolderIcon;

    const NOW_MS: i64 = 1_000_000_000_000;

    #[test]
    fn test_bundled_seed_parses() {
        let mailbox = load_seed(NOW_MS).unwrap();
        assert!(mailbox.folders.iter().any(|f| f.is_inbox()));
        assert!(!mailbox.messages.is_empty());
        let vip = mailbox.folders.iter().find(|f| f.id == "vip").unwrap();
        assert!(vip.is_vip);
        assert_eq!(vip.icon, FolderIcon::Star);
    }

    #[test]
    fn test_seed_timestamps_and_thread_counts() {
        let json = r#"{
            "folders": [{ "id": "inbox", "icon": "inbox" }],
            "messages": [
                { "id": "a", "sender": { "name": "A", "email": "a@x" }, "subject": "s",
                  "minutes_ago": 2, "thread_id": "t", "folder": "inbox" },
                { "id": "b", "sender": { "name": "B", "email": "b@x" }, "subject": "s",
                  "minutes_ago": 1, "thread_id": "t", "is_read": false, "folder": "primary" }
            ]
        }"#;
        let mailbox = parse_mailbox(json, NOW_MS).unwrap();
        assert_eq!(mailbox.folders[0].display_name, "Inbox");
        assert_eq!(mailbox.messages[0].timestamp, NOW_MS - 120_000);
        assert_eq!(mailbox.messages[0].thread_count, Some(2));
        assert!(mailbox.messages[0].is_read);
        assert!(!mailbox.messages[1].is_read);
    }

    #[test]
    fn test_seed_rejects_unknown_folder() {
        let json = r#"{
            "folders": [{ "id": "inbox" }],
            "messages": [
                { "id": "a", "sender": { "name": "A", "email": "a@x" }, "subject": "s",
                  "minutes_ago": 2, "folder": "nowhere" }
            ]
        }"#;
        let err = parse_mailbox(json, NOW_MS).unwrap_err();
        assert!(matches!(err, SeedError::UnknownFolder { ref folder, .. } if folder == "nowhere"));
    }

    #[test]
    fn test_seed_rejects_out_of_range_date() {
        let json = r#"{
            "folders": [{ "id": "inbox" }],
            "messages": [
                { "id": "a", "sender": { "name": "A", "email": "a@x" }, "subject": "s",
                  "minutes_ago": 9223372036854775807, "folder": "inbox" }
            ]
        }"#;
        let err = parse_mailbox(json, NOW_MS).unwrap_err();
        assert!(matches!(err, SeedError::DateOutOfRange { ref message, .. } if message == "a"));
    }

    #[test]
    fn test_seed_folder_unread_count_is_optional() {
        let json = r#"{
            "folders": [{ "id": "inbox", "unread_count": 99 }, { "id": "sent" }],
            "messages": []
        }"#;
        let mailbox = parse_mailbox(json, NOW_MS).unwrap();
        assert_eq!(mailbox.folders[0].unread_count, Some(99));
        assert_eq!(mailbox.folders[1].unread_count, None);
    }
}
