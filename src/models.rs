use chrono::{DateTime, Local, TimeZone};
use inflections::case::to_title_case;
use serde::{Deserialize, Serialize};

pub const INBOX_FOLDER_ID: &str = "inbox";
/// Internal folder tag that is listed together with the inbox.
pub const INBOX_ALIAS_FOLDER_ID: &str = "primary";
pub const ARCHIVE_FOLDER_ID: &str = "archive";
pub const TRASH_FOLDER_ID: &str = "trash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Option<Vec<String>>,
    #[serde(default)]
    pub bcc: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    #[default]
    Primary,
    Promotions,
    Social,
    Updates,
    Forums,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 5] = [
        MessageCategory::Primary,
        MessageCategory::Promotions,
        MessageCategory::Social,
        MessageCategory::Updates,
        MessageCategory::Forums,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MessageCategory::Primary => "Primary",
            MessageCategory::Promotions => "Promotions",
            MessageCategory::Social => "Social",
            MessageCategory::Updates => "Updates",
            MessageCategory::Forums => "Forums",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.title().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub recipients: Recipients,
    pub subject: String,
    pub snippet: String,
    pub body_html: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub is_read: bool,
    pub is_flagged: bool,
    pub is_answered: bool,
    pub is_favorite: bool,
    /// Marks the member shown in the list for a collapsed thread.
    pub is_thread: bool,
    pub thread_id: Option<String>,
    pub thread_count: Option<u32>,
    pub attachments: Vec<Attachment>,
    pub folder: String,
    pub category: Option<MessageCategory>,
    pub labels: Vec<String>,
}

impl Message {
    pub fn category_or_default(&self) -> MessageCategory {
        self.category.unwrap_or_default()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_default()
            .with_timezone(tz)
    }

    pub fn local_date(&self) -> DateTime<Local> {
        self.date_in(&Local)
    }
}

/// Symbolic glyph reference for a folder; resolved by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderIcon {
    Inbox,
    Star,
    Send,
    Draft,
    Archive,
    Trash,
    Spam,
    #[default]
    Folder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub icon: FolderIcon,
    /// Fixed badge count; when absent the count is derived from the messages.
    #[serde(default)]
    pub unread_count: Option<u32>,
    #[serde(default)]
    pub is_vip: bool,
}

impl Folder {
    pub fn new(id: &str, icon: FolderIcon) -> Self {
        Self {
            id: id.to_string(),
            display_name: to_title_case(id),
            icon,
            unread_count: None,
            is_vip: false,
        }
    }

    pub fn is_inbox(&self) -> bool {
        self.id == INBOX_FOLDER_ID
    }

    /// Whether a message's folder key lists under this folder.
    pub fn contains_key(&self, folder_key: &str) -> bool {
        folder_key == self.id || (self.is_inbox() && folder_key == INBOX_ALIAS_FOLDER_ID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterFlag {
    Unread,
    Starred,
    Attachments,
    Unanswered,
    Favorites,
    Personal,
    Social,
    Updates,
    Forums,
}

impl FilterFlag {
    pub const ALL: [FilterFlag; 9] = [
        FilterFlag::Unread,
        FilterFlag::Starred,
        FilterFlag::Attachments,
        FilterFlag::Unanswered,
        FilterFlag::Favorites,
        FilterFlag::Personal,
        FilterFlag::Social,
        FilterFlag::Updates,
        FilterFlag::Forums,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterFlag::Unread => "unread",
            FilterFlag::Starred => "starred",
            FilterFlag::Attachments => "attachments",
            FilterFlag::Unanswered => "unanswered",
            FilterFlag::Favorites => "favorites",
            FilterFlag::Personal => "personal",
            FilterFlag::Social => "social",
            FilterFlag::Updates => "updates",
            FilterFlag::Forums => "forums",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActiveFilters {
    pub unread: bool,
    pub starred: bool,
    pub attachments: bool,
    pub unanswered: bool,
    pub favorites: bool,
    pub personal: bool,
    pub social: bool,
    pub updates: bool,
    pub forums: bool,
}

impl ActiveFilters {
    pub fn get(&self, flag: FilterFlag) -> bool {
        match flag {
            FilterFlag::Unread => self.unread,
            FilterFlag::Starred => self.starred,
            FilterFlag::Attachments => self.attachments,
            FilterFlag::Unanswered => self.unanswered,
            FilterFlag::Favorites => self.favorites,
            FilterFlag::Personal => self.personal,
            FilterFlag::Social => self.social,
            FilterFlag::Updates => self.updates,
            FilterFlag::Forums => self.forums,
        }
    }

    fn slot(&mut self, flag: FilterFlag) -> &mut bool {
        match flag {
            FilterFlag::Unread => &mut self.unread,
            FilterFlag::Starred => &mut self.starred,
            FilterFlag::Attachments => &mut self.attachments,
            FilterFlag::Unanswered => &mut self.unanswered,
            FilterFlag::Favorites => &mut self.favorites,
            FilterFlag::Personal => &mut self.personal,
            FilterFlag::Social => &mut self.social,
            FilterFlag::Updates => &mut self.updates,
            FilterFlag::Forums => &mut self.forums,
        }
    }

    pub fn set(&mut self, flag: FilterFlag, on: bool) {
        *self.slot(flag) = on;
    }

    pub fn toggle(&mut self, flag: FilterFlag) {
        let slot = self.slot(flag);
        *slot = !*slot;
    }

    pub fn any(&self) -> bool {
        FilterFlag::ALL.iter().any(|f| self.get(*f))
    }

    pub fn active(&self) -> Vec<FilterFlag> {
        FilterFlag::ALL
            .into_iter()
            .filter(|f| self.get(*f))
            .collect()
    }

    /// General flags AND-ed, label flags OR-ed, the two results AND-ed.
    pub fn matches(&self, m: &Message) -> bool {
        let general = (!self.unread || !m.is_read)
            && (!self.starred || m.is_flagged)
            && (!self.attachments || !m.attachments.is_empty())
            && (!self.unanswered || !m.is_answered)
            && (!self.favorites || m.is_favorite);
        if !general {
            return false;
        }

        let label_flags = [
            (self.personal, "personal"),
            (self.social, "social"),
            (self.updates, "updates"),
            (self.forums, "forums"),
        ];
        if !label_flags.iter().any(|(on, _)| *on) {
            return true;
        }
        label_flags
            .iter()
            .any(|(on, label)| *on && m.has_label(label))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Sender,
    Subject,
    Unread,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Date => SortKey::Sender,
            SortKey::Sender => SortKey::Subject,
            SortKey::Subject => SortKey::Unread,
            SortKey::Unread => SortKey::Date,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Sender => "sender",
            SortKey::Subject => "subject",
            SortKey::Unread => "unread",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn multiplier(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Parses `key` or `key:asc` / `key:desc`.
    pub fn parse(s: &str) -> Option<Self> {
        let (key, dir) = match s.split_once(':') {
            Some((k, d)) => (k, Some(d)),
            None => (s, None),
        };
        let key = match key.to_lowercase().as_str() {
            "date" => SortKey::Date,
            "sender" => SortKey::Sender,
            "subject" => SortKey::Subject,
            "unread" => SortKey::Unread,
            _ => return None,
        };
        let direction = match dir.map(|d| d.to_lowercase()) {
            None => SortDirection::Desc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(_) => return None,
        };
        Some(Self { key, direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_display_name_is_title_cased() {
        let folder = Folder::new("sent", FolderIcon::Send);
        assert_eq!(folder.display_name, "Sent");
    }

    #[test]
    fn test_inbox_contains_alias_key() {
        let inbox = Folder::new(INBOX_FOLDER_ID, FolderIcon::Inbox);
        let sent = Folder::new("sent", FolderIcon::Send);
        assert!(inbox.contains_key("inbox"));
        assert!(inbox.contains_key(INBOX_ALIAS_FOLDER_ID));
        assert!(!sent.contains_key(INBOX_ALIAS_FOLDER_ID));
    }

    #[test]
    fn test_filter_toggle_and_active_list() {
        let mut filters = ActiveFilters::default();
        assert!(!filters.any());
        filters.toggle(FilterFlag::Starred);
        filters.toggle(FilterFlag::Forums);
        assert_eq!(filters.active(), vec![FilterFlag::Starred, FilterFlag::Forums]);
        filters.toggle(FilterFlag::Starred);
        assert_eq!(filters.active(), vec![FilterFlag::Forums]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("date"), Some(SortOrder::default()));
        assert_eq!(
            SortOrder::parse("Subject:ASC"),
            Some(SortOrder::new(SortKey::Subject, SortDirection::Asc))
        );
        assert_eq!(SortOrder::parse("size"), None);
        assert_eq!(SortOrder::parse("date:sideways"), None);
    }

    #[test]
    fn test_category_cycles_through_all_tabs() {
        let mut c = MessageCategory::Primary;
        for _ in 0..MessageCategory::ALL.len() {
            c = c.next();
        }
        assert_eq!(c, MessageCategory::Primary);
        assert_eq!(MessageCategory::parse("social"), Some(MessageCategory::Social));
    }
}
