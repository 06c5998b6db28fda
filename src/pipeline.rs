//! Derives the rendered message list from the full mailbox and the current
//! view parameters.
//!
//! Every function here is pure: the same messages and [`ListQuery`] always
//! produce the same output, so callers simply re-run [`build_view`] whenever
//! anything changes.

use crate::models::{ActiveFilters, Folder, Message, MessageCategory, SortKey, SortOrder};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// View parameters for one pass of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    pub folder: Option<&'a Folder>,
    pub category: MessageCategory,
    pub filters: ActiveFilters,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateBucket {
    Today,
    Yesterday,
    LastWeek,
    Older,
}

impl DateBucket {
    pub fn title(self) -> &'static str {
        match self {
            DateBucket::Today => "Today",
            DateBucket::Yesterday => "Yesterday",
            DateBucket::LastWeek => "Last week",
            DateBucket::Older => "Older",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageGroup<'a> {
    /// `None` for the single unlabeled group used by non-date sorts.
    pub bucket: Option<DateBucket>,
    pub messages: Vec<&'a Message>,
}

pub fn scope_to_folder<'a>(messages: &'a [Message], folder: &Folder) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| folder.contains_key(&m.folder))
        .collect()
}

pub fn scope_to_category<'a>(
    messages: Vec<&'a Message>,
    folder: &Folder,
    category: MessageCategory,
) -> Vec<&'a Message> {
    if !folder.is_inbox() {
        return messages;
    }
    messages
        .into_iter()
        .filter(|m| m.category_or_default() == category)
        .collect()
}

pub fn apply_filters<'a>(messages: Vec<&'a Message>, filters: &ActiveFilters) -> Vec<&'a Message> {
    if !filters.any() {
        return messages;
    }
    messages.into_iter().filter(|m| filters.matches(m)).collect()
}

/// Case-insensitive comparison with an ordinal tie-break so the order is total.
fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

fn apply_direction(ord: Ordering, sort: SortOrder) -> Ordering {
    if sort.direction.multiplier() < 0 {
        ord.reverse()
    } else {
        ord
    }
}

pub fn compare(a: &Message, b: &Message, sort: SortOrder) -> Ordering {
    match sort.key {
        SortKey::Date => apply_direction(a.timestamp.cmp(&b.timestamp), sort),
        SortKey::Sender => apply_direction(compare_text(&a.sender.name, &b.sender.name), sort),
        SortKey::Subject => apply_direction(compare_text(&a.subject, &b.subject), sort),
        // Ascending puts unread (is_read == false) first; ties are newest first
        // whatever the direction.
        SortKey::Unread => apply_direction(a.is_read.cmp(&b.is_read), sort)
            .then_with(|| b.timestamp.cmp(&a.timestamp)),
    }
}

pub fn sort_messages(messages: &mut [&Message], sort: SortOrder) {
    // slice::sort_by is stable
    messages.sort_by(|a, b| compare(a, b, sort));
}

/// Keeps one representative per thread, at the position of the thread's first
/// occurrence in `sorted`.
pub fn collapse_threads<'a>(sorted: &[&'a Message]) -> Vec<&'a Message> {
    let mut marked: HashMap<&str, &'a Message> = HashMap::new();
    for &m in sorted {
        if let (Some(thread_id), true) = (m.thread_id.as_deref(), m.is_thread) {
            marked.entry(thread_id).or_insert(m);
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(sorted.len());
    for &m in sorted {
        let Some(thread_id) = m.thread_id.as_deref() else {
            out.push(m);
            continue;
        };
        if seen.insert(thread_id) {
            out.push(marked.get(thread_id).copied().unwrap_or(m));
        }
    }

    out
}

pub fn bucket_for<Tz: TimeZone>(message: &Message, now: &DateTime<Tz>) -> DateBucket {
    let date = message.date_in(&now.timezone());
    let calendar_days = (now.date_naive() - date.date_naive()).num_days();
    match calendar_days {
        // future-dated mail is shown with today's
        d if d <= 0 => DateBucket::Today,
        1 => DateBucket::Yesterday,
        _ => {
            let elapsed = now.timestamp_millis() - message.timestamp;
            let days = (elapsed + DAY_MS - 1).div_euclid(DAY_MS);
            if days <= 7 {
                DateBucket::LastWeek
            } else {
                DateBucket::Older
            }
        }
    }
}

/// Groups keep the order of their first member in `messages`.
pub fn group_by_date<'a, Tz: TimeZone>(
    messages: Vec<&'a Message>,
    now: &DateTime<Tz>,
) -> Vec<MessageGroup<'a>> {
    let mut groups: Vec<MessageGroup<'a>> = Vec::new();
    for m in messages {
        let bucket = bucket_for(m, now);
        match groups.iter_mut().find(|g| g.bucket == Some(bucket)) {
            Some(group) => group.messages.push(m),
            None => groups.push(MessageGroup {
                bucket: Some(bucket),
                messages: vec![m],
            }),
        }
    }
    groups
}

/// Folder, category and filter scope, sort, then thread collapse.
pub fn collapse<'a>(messages: &'a [Message], query: &ListQuery<'_>) -> Vec<&'a Message> {
    let Some(folder) = query.folder else {
        return Vec::new();
    };

    let scoped = scope_to_folder(messages, folder);
    let scoped = scope_to_category(scoped, folder, query.category);
    let mut filtered = apply_filters(scoped, &query.filters);
    sort_messages(&mut filtered, query.sort);
    let collapsed = collapse_threads(&filtered);

    tracing::trace!(
        folder = %folder.id,
        total = messages.len(),
        filtered = filtered.len(),
        shown = collapsed.len(),
        "list pipeline"
    );
    collapsed
}

pub fn build_view<'a, Tz: TimeZone>(
    messages: &'a [Message],
    query: &ListQuery<'_>,
    now: &DateTime<Tz>,
) -> Vec<MessageGroup<'a>> {
    let collapsed = collapse(messages, query);
    if collapsed.is_empty() {
        return Vec::new();
    }
    if query.sort.key == SortKey::Date {
        group_by_date(collapsed, now)
    } else {
        vec![MessageGroup {
            bucket: None,
            messages: collapsed,
        }]
    }
}

/// Unread messages filed under `folder`, counted per message.
pub fn unread_count(messages: &[Message], folder: &Folder) -> usize {
    messages
        .iter()
        .filter(|m| folder.contains_key(&m.folder) && !m.is_read)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Attachment, FilterFlag, FolderIcon, INBOX_ALIAS_FOLDER_ID, INBOX_FOLDER_ID, Recipients,
        Sender, SortDirection,
    };
    use chrono::{Duration, Utc};

    const NOW_MS: i64 = 1_760_000_000_000; // 2025-10-09T08:53:20Z

    fn msg(id: &str, minutes_ago: i64) -> Message {
        Message {
            id: id.to_string(),
            sender: Sender {
                name: format!("Sender {}", id),
                email: format!("{}@example.com", id),
                avatar: None,
            },
            recipients: Recipients {
                to: vec!["me@example.com".to_string()],
                ..Default::default()
            },
            subject: format!("Subject {}", id),
            snippet: String::new(),
            body_html: String::new(),
            timestamp: NOW_MS - minutes_ago * 60_000,
            is_read: true,
            is_flagged: false,
            is_answered: false,
            is_favorite: false,
            is_thread: false,
            thread_id: None,
            thread_count: None,
            attachments: Vec::new(),
            folder: INBOX_FOLDER_ID.to_string(),
            category: None,
            labels: Vec::new(),
        }
    }

    fn threaded(id: &str, minutes_ago: i64, thread: &str, representative: bool) -> Message {
        Message {
            thread_id: Some(thread.to_string()),
            is_thread: representative,
            ..msg(id, minutes_ago)
        }
    }

    fn inbox() -> Folder {
        Folder::new(INBOX_FOLDER_ID, FolderIcon::Inbox)
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(NOW_MS).unwrap()
    }

    fn query(folder: &Folder) -> ListQuery<'_> {
        ListQuery {
            folder: Some(folder),
            category: MessageCategory::Primary,
            filters: ActiveFilters::default(),
            sort: SortOrder::default(),
        }
    }

    fn ids(list: &[&Message]) -> Vec<String> {
        list.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let folder = inbox();
        assert!(collapse(&[], &query(&folder)).is_empty());
        assert!(build_view(&[], &query(&folder), &now()).is_empty());
    }

    #[test]
    fn test_no_folder_yields_empty_output() {
        let messages = vec![msg("a", 1)];
        let q = ListQuery {
            folder: None,
            ..query(&inbox())
        };
        assert!(collapse(&messages, &q).is_empty());
    }

    #[test]
    fn test_folder_scope_includes_inbox_alias() {
        let mut archived = msg("b", 2);
        archived.folder = "archive".to_string();
        let mut aliased = msg("c", 3);
        aliased.folder = INBOX_ALIAS_FOLDER_ID.to_string();
        let messages = vec![msg("a", 1), archived, aliased];

        let folder = inbox();
        assert_eq!(ids(&collapse(&messages, &query(&folder))), vec!["a", "c"]);

        let archive = Folder::new("archive", FolderIcon::Archive);
        assert_eq!(ids(&collapse(&messages, &query(&archive))), vec!["b"]);
    }

    #[test]
    fn test_category_scope_only_applies_to_inbox() {
        let mut social = msg("s", 1);
        social.category = Some(MessageCategory::Social);
        let mut promo_sent = msg("p", 2);
        promo_sent.folder = "sent".to_string();
        promo_sent.category = Some(MessageCategory::Promotions);
        let messages = vec![social, msg("plain", 3), promo_sent];

        let folder = inbox();
        assert_eq!(ids(&collapse(&messages, &query(&folder))), vec!["plain"]);

        let q = ListQuery {
            category: MessageCategory::Social,
            ..query(&folder)
        };
        assert_eq!(ids(&collapse(&messages, &q)), vec!["s"]);

        let sent = Folder::new("sent", FolderIcon::Send);
        assert_eq!(ids(&collapse(&messages, &query(&sent))), vec!["p"]);
    }

    #[test]
    fn test_general_filters_are_and_combined() {
        let mut both = msg("both", 1);
        both.is_read = false;
        both.is_flagged = true;
        let mut unread_only = msg("unread", 2);
        unread_only.is_read = false;
        let mut starred_only = msg("starred", 3);
        starred_only.is_flagged = true;
        let messages = vec![both, unread_only, starred_only];

        let folder = inbox();
        let mut q = query(&folder);
        q.filters.set(FilterFlag::Unread, true);
        q.filters.set(FilterFlag::Starred, true);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["both"]);
    }

    #[test]
    fn test_label_filters_are_or_combined_then_and_with_general() {
        let mut social = msg("social", 1);
        social.labels = vec!["Social".to_string()];
        social.attachments = vec![Attachment {
            name: "a.pdf".to_string(),
            size_bytes: 10,
            mime_type: None,
        }];
        let mut forums = msg("forums", 2);
        forums.labels = vec!["forums".to_string()];
        let mut personal = msg("personal", 3);
        personal.labels = vec!["personal".to_string()];
        let messages = vec![social, forums, personal, msg("none", 4)];

        let folder = inbox();
        let mut q = query(&folder);
        q.filters.set(FilterFlag::Social, true);
        q.filters.set(FilterFlag::Forums, true);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["social", "forums"]);

        q.filters.set(FilterFlag::Attachments, true);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["social"]);
    }

    #[test]
    fn test_all_filtered_out_is_empty_not_error() {
        let messages = vec![msg("a", 1), msg("b", 2)];
        let folder = inbox();
        let mut q = query(&folder);
        q.filters.set(FilterFlag::Unread, true);
        assert!(collapse(&messages, &q).is_empty());
        assert!(build_view(&messages, &q, &now()).is_empty());
    }

    #[test]
    fn test_no_filters_matches_vacuous_filter_pass() {
        let mut a = msg("a", 1);
        a.is_read = false;
        let messages = vec![a, msg("b", 2), msg("c", 3)];
        let folder = inbox();
        let q = query(&folder);

        let unfiltered = collapse(&messages, &q);
        assert!(unfiltered.iter().all(|m| q.filters.matches(m)));
        assert_eq!(unfiltered.len(), messages.len());
    }

    #[test]
    fn test_date_desc_then_asc_reverses_order() {
        let messages = vec![msg("a", 30), msg("b", 10), msg("c", 20)];
        let folder = inbox();
        let mut q = query(&folder);
        let desc = ids(&collapse(&messages, &q));
        assert_eq!(desc, vec!["b", "c", "a"]);

        q.sort = SortOrder::new(SortKey::Date, SortDirection::Asc);
        let mut asc = ids(&collapse(&messages, &q));
        asc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_sender_and_subject_sort_ignore_case() {
        let mut a = msg("a", 1);
        a.sender.name = "bob".to_string();
        a.subject = "Zebra".to_string();
        let mut b = msg("b", 2);
        b.sender.name = "Alice".to_string();
        b.subject = "apple".to_string();
        let mut c = msg("c", 3);
        c.sender.name = "carol".to_string();
        c.subject = "Mango".to_string();
        let messages = vec![a, b, c];
        let folder = inbox();

        let mut q = query(&folder);
        q.sort = SortOrder::new(SortKey::Sender, SortDirection::Asc);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["b", "a", "c"]);

        q.sort = SortOrder::new(SortKey::Subject, SortDirection::Desc);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_unread_sort_puts_unread_first_with_newest_tiebreak() {
        let mut u_old = msg("u_old", 50);
        u_old.is_read = false;
        let mut u_new = msg("u_new", 5);
        u_new.is_read = false;
        let messages = vec![msg("r_old", 40), u_old, msg("r_new", 1), u_new];
        let folder = inbox();

        let mut q = query(&folder);
        q.sort = SortOrder::new(SortKey::Unread, SortDirection::Asc);
        assert_eq!(
            ids(&collapse(&messages, &q)),
            vec!["u_new", "u_old", "r_new", "r_old"]
        );

        q.sort = SortOrder::new(SortKey::Unread, SortDirection::Desc);
        assert_eq!(
            ids(&collapse(&messages, &q)),
            vec!["r_new", "r_old", "u_new", "u_old"]
        );
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut a = msg("a", 1);
        a.subject = "same".to_string();
        let mut b = msg("b", 2);
        b.subject = "same".to_string();
        let mut c = msg("c", 3);
        c.subject = "same".to_string();
        let messages = vec![a, b, c];
        let folder = inbox();
        let mut q = query(&folder);
        q.sort = SortOrder::new(SortKey::Subject, SortDirection::Asc);
        assert_eq!(ids(&collapse(&messages, &q)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_thread_collapse_prefers_flagged_representative() {
        let messages = vec![
            threaded("t1_newest", 1, "T1", false),
            threaded("t1_rep", 30, "T1", true),
            msg("solo", 10),
        ];
        let folder = inbox();
        let out = collapse(&messages, &query(&folder));
        // the thread ranks where its newest member ranks
        assert_eq!(ids(&out), vec!["t1_rep", "solo"]);
    }

    #[test]
    fn test_thread_without_flagged_member_uses_first_occurrence() {
        let messages = vec![
            threaded("older", 20, "T2", false),
            threaded("newer", 2, "T2", false),
        ];
        let folder = inbox();
        assert_eq!(ids(&collapse(&messages, &query(&folder))), vec!["newer"]);
    }

    #[test]
    fn test_interleaved_threads_pick_first_flagged_member_in_sort_order() {
        let messages = vec![
            threaded("a1", 1, "A", false),
            threaded("b1", 2, "B", true),
            threaded("a2", 3, "A", true),
            threaded("b2", 4, "B", false),
            threaded("a3", 5, "A", true),
            msg("x", 6),
        ];
        let folder = inbox();
        assert_eq!(
            ids(&collapse(&messages, &query(&folder))),
            vec!["a2", "b1", "x"]
        );
    }

    #[test]
    fn test_orphan_thread_id_is_a_singleton() {
        let messages = vec![threaded("lonely", 5, "T9", false), msg("solo", 1)];
        let folder = inbox();
        assert_eq!(
            ids(&collapse(&messages, &query(&folder))),
            vec!["solo", "lonely"]
        );
    }

    #[test]
    fn test_no_duplicate_thread_ids_in_output() {
        let messages = vec![
            threaded("a1", 1, "A", false),
            threaded("b1", 2, "B", true),
            threaded("a2", 3, "A", true),
            threaded("b2", 4, "B", false),
            threaded("a3", 5, "A", false),
            msg("x", 6),
        ];
        let folder = inbox();
        for key in [SortKey::Date, SortKey::Sender, SortKey::Subject, SortKey::Unread] {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let mut q = query(&folder);
                q.sort = SortOrder::new(key, direction);
                let out = collapse(&messages, &q);
                let mut threads: Vec<&str> =
                    out.iter().filter_map(|m| m.thread_id.as_deref()).collect();
                let total = threads.len();
                threads.sort();
                threads.dedup();
                assert_eq!(threads.len(), total);
                assert_eq!(out.len(), 3);
                assert!(out.iter().any(|m| m.id == "x"));
            }
        }
    }

    #[test]
    fn test_filtered_representative_falls_back_to_unread_sibling() {
        let mut sibling = threaded("t1_sibling", 10, "T1", false);
        sibling.is_read = false;
        let rep = threaded("t1_rep", 5, "T1", true);
        let mut s1 = msg("s1", 20);
        s1.is_read = false;
        let mut s2 = msg("s2", 1);
        s2.is_read = false;
        let s3 = msg("s3", 3);
        let messages = vec![sibling, rep, s1, s2, s3];

        let folder = inbox();
        let mut q = query(&folder);
        q.filters.set(FilterFlag::Unread, true);
        assert_eq!(
            ids(&collapse(&messages, &q)),
            vec!["s2", "t1_sibling", "s1"]
        );
    }

    #[test]
    fn test_category_scope_can_drop_thread_representative() {
        let mut rep = threaded("rep", 1, "T1", true);
        rep.category = Some(MessageCategory::Updates);
        let sibling = threaded("sibling", 2, "T1", false);
        let messages = vec![rep, sibling];
        let folder = inbox();
        assert_eq!(ids(&collapse(&messages, &query(&folder))), vec!["sibling"]);
    }

    #[test]
    fn test_date_buckets_use_calendar_days() {
        let now = now(); // 08:53 UTC
        let just_before_midnight = msg("yesterday_late", 9 * 60);
        let earlier_today = msg("today", 8 * 60);
        let three_days = msg("three", 3 * 24 * 60);
        let seven_days = msg("seven", 7 * 24 * 60);
        let eight_days = msg("eight", 8 * 24 * 60);

        assert_eq!(bucket_for(&earlier_today, &now), DateBucket::Today);
        assert_eq!(bucket_for(&just_before_midnight, &now), DateBucket::Yesterday);
        assert_eq!(bucket_for(&three_days, &now), DateBucket::LastWeek);
        assert_eq!(bucket_for(&seven_days, &now), DateBucket::LastWeek);
        assert_eq!(bucket_for(&eight_days, &now), DateBucket::Older);
    }

    #[test]
    fn test_seven_day_boundary_uses_ceiling() {
        let now = now();
        let mut just_over = msg("over", 0);
        just_over.timestamp = (now - Duration::days(7) - Duration::minutes(1)).timestamp_millis();
        assert_eq!(bucket_for(&just_over, &now), DateBucket::Older);
    }

    #[test]
    fn test_build_view_groups_only_for_date_sort() {
        let messages = vec![msg("today", 5), msg("yesterday", 24 * 60), msg("old", 30 * 24 * 60)];
        let folder = inbox();
        let mut q = query(&folder);

        let groups = build_view(&messages, &q, &now());
        let buckets: Vec<_> = groups.iter().map(|g| g.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                Some(DateBucket::Today),
                Some(DateBucket::Yesterday),
                Some(DateBucket::Older)
            ]
        );

        q.sort = SortOrder::new(SortKey::Subject, SortDirection::Asc);
        let groups = build_view(&messages, &q, &now());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].bucket, None);
        assert_eq!(groups[0].messages.len(), 3);
    }

    #[test]
    fn test_unread_count_includes_alias() {
        let mut a = msg("a", 1);
        a.is_read = false;
        let mut b = msg("b", 2);
        b.is_read = false;
        b.folder = INBOX_ALIAS_FOLDER_ID.to_string();
        let messages = vec![a, b, msg("c", 3)];
        assert_eq!(unread_count(&messages, &inbox()), 2);
    }
}
