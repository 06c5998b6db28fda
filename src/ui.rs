use crate::app::{App, FocusedPanel, RowHitbox};
use crate::models::{FolderIcon, Message, SortDirection};
use crate::pipeline::{DateBucket, MessageGroup};
use crate::undo::MailAction;
use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

const ROW_HEIGHT: u16 = 2;

fn panel_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn folder_glyph(icon: FolderIcon) -> &'static str {
    match icon {
        FolderIcon::Inbox => "📥",
        FolderIcon::Star => "⭐",
        FolderIcon::Send => "📤",
        FolderIcon::Draft => "📝",
        FolderIcon::Archive => "🗄",
        FolderIcon::Trash => "🗑",
        FolderIcon::Spam => "⚠",
        FolderIcon::Folder => "📁",
    }
}

fn action_color(action: MailAction) -> Color {
    match action {
        MailAction::Archive => Color::Green,
        MailAction::Delete => Color::Red,
        MailAction::ToggleRead => Color::Blue,
        MailAction::ToggleFlag => Color::Yellow,
        MailAction::Reply => Color::Cyan,
    }
}

pub fn render(f: &mut Frame, app: &mut App, now: DateTime<Local>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(18), // Folders
            Constraint::Percentage(42), // Message list
            Constraint::Percentage(40), // Selected message
        ])
        .split(f.area());

    render_folders(f, app, chunks[0]);
    let (hitboxes, scroll) = render_messages(f, app, chunks[1], &now);
    app.hitboxes = hitboxes;
    app.list_scroll = scroll;
    render_details(f, app, chunks[2]);
}

fn render_folders(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .folders
        .iter()
        .enumerate()
        .map(|(i, folder)| {
            let unread = app.unread_count(folder);
            let mut label = format!("{} {}", folder_glyph(folder.icon), folder.display_name);
            if folder.is_vip {
                label.push_str(" ★");
            }
            if unread > 0 {
                label.push_str(&format!(" ({})", unread));
            }
            let style = if i == app.selected_folder {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(label).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Folders")
        .border_style(panel_style(app.focused_panel == FocusedPanel::Folders));
    f.render_widget(List::new(items).block(block), area);
}

fn summary_line(app: &App) -> Line<'static> {
    let arrow = match app.sort.direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    let filters: Vec<&str> = app.filters.active().iter().map(|f| f.name()).collect();
    let filters = if filters.is_empty() {
        "none".to_string()
    } else {
        filters.join(",")
    };

    let mut spans = vec![
        Span::styled("Sort: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} {}", app.sort.key.name(), arrow)),
        Span::styled("  Filters: ", Style::default().fg(Color::DarkGray)),
        Span::raw(filters),
    ];
    if app.selection_mode {
        spans.push(Span::styled(
            format!("  [SELECT {}]", app.selected.len()),
            Style::default().fg(Color::Magenta),
        ));
    }
    Line::from(spans)
}

fn category_line(app: &App) -> Line<'static> {
    let spans: Vec<Span> = crate::models::MessageCategory::ALL
        .iter()
        .map(|c| {
            let style = if *c == app.category {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {} ", c.title()), style)
        })
        .collect();
    Line::from(spans)
}

fn format_row_date(m: &Message, now: &DateTime<Local>) -> String {
    let date = m.local_date();
    if date.date_naive() == now.date_naive() {
        date.format("%-I:%M%p").to_string()
    } else {
        date.format("%b %d").to_string()
    }
}

fn row_lines(m: &Message, now: &DateTime<Local>, marker: &str) -> Vec<Line<'static>> {
    let mut top = vec![Span::raw(marker.to_string())];
    if m.is_flagged {
        top.push(Span::styled("⚑ ", Style::default().fg(Color::Red)));
    }
    let sender_style = if m.is_read {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    top.push(Span::styled(m.sender.name.clone(), sender_style));
    if let Some(count) = m.thread_count.filter(|c| *c > 1) {
        top.push(Span::styled(
            format!(" ({})", count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if !m.attachments.is_empty() {
        top.push(Span::raw(" 📎"));
    }
    top.push(Span::styled(
        format!("  {}", format_row_date(m, now)),
        Style::default().fg(Color::DarkGray),
    ));

    let bottom = vec![
        Span::raw(marker.to_string()),
        Span::styled(m.subject.clone(), sender_style),
        Span::styled(
            format!(" - {}", m.snippet),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    vec![Line::from(top), Line::from(bottom)]
}

enum Entry<'a> {
    Header(DateBucket),
    Row(&'a Message),
}

impl Entry<'_> {
    fn height(&self) -> u16 {
        match self {
            Entry::Header(_) => 1,
            Entry::Row(_) => ROW_HEIGHT,
        }
    }
}

fn flatten<'a>(groups: &[MessageGroup<'a>]) -> Vec<Entry<'a>> {
    let mut entries = Vec::new();
    for group in groups {
        if let Some(bucket) = group.bucket {
            entries.push(Entry::Header(bucket));
        }
        entries.extend(group.messages.iter().copied().map(Entry::Row));
    }
    entries
}

/// Scroll offset (in lines) that keeps the cursor row on screen.
fn scroll_for_cursor(
    tops: &[(usize, u16)],
    cursor_top: Option<usize>,
    current: usize,
    height: usize,
) -> usize {
    let Some(top) = cursor_top else {
        return 0;
    };
    let total: usize = tops.iter().map(|(_, h)| *h as usize).sum();
    let mut scroll = current.min(total.saturating_sub(height));
    if top < scroll {
        scroll = top;
    } else if top + ROW_HEIGHT as usize > scroll + height {
        scroll = (top + ROW_HEIGHT as usize).saturating_sub(height);
    }
    scroll
}

fn render_messages(
    f: &mut Frame,
    app: &App,
    area: Rect,
    now: &DateTime<Local>,
) -> (Vec<RowHitbox>, usize) {
    let title = match (&app.status_message, app.current_folder()) {
        (Some(status), _) => format!("Messages - {}", status),
        (None, Some(folder)) => format!("Messages - {}", folder.display_name),
        (None, None) => "Messages".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(panel_style(app.focused_panel == FocusedPanel::Messages));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let is_inbox = app.current_folder().is_some_and(|folder| folder.is_inbox());
    let mut header = vec![summary_line(app)];
    if is_inbox {
        header.insert(0, category_line(app));
    }
    let header_height = (header.len() as u16).min(inner.height);
    f.render_widget(
        Paragraph::new(header),
        Rect {
            height: header_height,
            ..inner
        },
    );
    let list_area = Rect {
        y: inner.y + header_height,
        height: inner.height.saturating_sub(header_height),
        ..inner
    };

    let groups = app.view(now);
    if groups.is_empty() {
        f.render_widget(
            Paragraph::new("No messages").style(Style::default().fg(Color::DarkGray)),
            list_area,
        );
        return (Vec::new(), 0);
    }

    let entries = flatten(&groups);
    let mut tops = Vec::with_capacity(entries.len());
    let mut y = 0usize;
    let mut cursor_top = None;
    let mut row_index = 0usize;
    for entry in &entries {
        tops.push((y, entry.height()));
        if let Entry::Row(_) = entry {
            if row_index == app.cursor {
                cursor_top = Some(y);
            }
            row_index += 1;
        }
        y += entry.height() as usize;
    }
    let height = list_area.height as usize;
    let scroll = scroll_for_cursor(&tops, cursor_top, app.list_scroll, height);

    let mut hitboxes = Vec::new();
    let mut row_index = 0usize;
    for (entry, (top, h)) in entries.iter().zip(&tops) {
        let is_row = matches!(entry, Entry::Row(_));
        let visible = *top >= scroll && top + *h as usize <= scroll + height;
        if visible {
            let rect = Rect {
                x: list_area.x,
                y: list_area.y + (top - scroll) as u16,
                width: list_area.width,
                height: *h,
            };
            match entry {
                Entry::Header(bucket) => f.render_widget(
                    Paragraph::new(bucket.title()).style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    rect,
                ),
                Entry::Row(m) => {
                    render_row(f, app, m, row_index == app.cursor, rect, now);
                    hitboxes.push(RowHitbox {
                        message_id: m.id.clone(),
                        x: rect.x,
                        y: rect.y,
                        width: rect.width,
                        height: rect.height,
                    });
                }
            }
        }
        if is_row {
            row_index += 1;
        }
    }

    (hitboxes, scroll)
}

fn render_row(
    f: &mut Frame,
    app: &App,
    m: &Message,
    is_cursor: bool,
    rect: Rect,
    now: &DateTime<Local>,
) {
    let marker = if app.selection_mode {
        if app.selected.contains(&m.id) { "[x] " } else { "[ ] " }
    } else if is_cursor {
        "█ "
    } else {
        "  "
    };
    let mut style = Style::default();
    if is_cursor {
        style = style.fg(Color::Yellow);
    }

    let settings = &app.config.swipe;
    let offset = app
        .swipe(&m.id)
        .map(|c| settings.px_to_columns(c.displayed_offset()))
        .unwrap_or(0);
    let shift = (offset.unsigned_abs() as u16).min(rect.width);

    let content = Paragraph::new(row_lines(m, now, marker)).style(style);
    if offset >= 0 {
        let content_rect = Rect {
            x: rect.x + shift,
            width: rect.width - shift,
            ..rect
        };
        f.render_widget(content, content_rect);
        render_tray(f, app, &settings.right_actions, Rect { width: shift, ..rect });
    } else {
        let content_rect = Rect {
            width: rect.width - shift,
            ..rect
        };
        f.render_widget(content.scroll((0, shift)), content_rect);
        render_tray(
            f,
            app,
            &settings.left_actions,
            Rect {
                x: rect.x + rect.width - shift,
                width: shift,
                ..rect
            },
        );
    }
}

fn render_tray(f: &mut Frame, app: &App, actions: &[MailAction], tray: Rect) {
    if tray.width == 0 {
        return;
    }
    let item_cols = app
        .config
        .swipe
        .px_to_columns(app.config.swipe.item_width)
        .max(1) as u16;
    for (i, action) in actions.iter().enumerate() {
        let x = tray.x + i as u16 * item_cols;
        if x >= tray.x + tray.width {
            break;
        }
        let width = item_cols.min(tray.x + tray.width - x);
        let button = Paragraph::new(action.label()).style(
            Style::default()
                .bg(action_color(*action))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(button, Rect { x, width, ..tray });
    }
}

fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Message Details")
        .border_style(panel_style(app.focused_panel == FocusedPanel::Details));
    let body_width = block.inner(area).width as usize;

    let thread = app.opened_thread();
    let mut content = String::new();
    if thread.is_empty() {
        content.push_str("No message selected");
    }
    for m in thread {
        let date = m.local_date().format("%Y-%m-%d %H:%M");
        content.push_str(&format!(
            "From: {} <{}>\nTo: {}\n",
            m.sender.name,
            m.sender.email,
            m.recipients.to.join(", ")
        ));
        if let Some(cc) = m.recipients.cc.as_ref().filter(|cc| !cc.is_empty()) {
            content.push_str(&format!("Cc: {}\n", cc.join(", ")));
        }
        content.push_str(&format!("Date: {}\nSubject: {}\n", date, m.subject));
        if !m.attachments.is_empty() {
            let names: Vec<String> = m
                .attachments
                .iter()
                .map(|a| format!("{} ({} KB)", a.name, a.size_bytes.div_ceil(1024)))
                .collect();
            content.push_str(&format!("Attachments: {}\n", names.join(", ")));
        }
        content.push('\n');
        content.push_str(&html_to_text(&m.body_html, body_width));
        content.push_str("\n\n────────────────────────────────────────\n\n");
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, area);
}

/// Narrowest wrap width handed to the HTML renderer.
const MIN_BODY_WIDTH: usize = 20;

/// Renders an HTML body as plain text wrapped to `width` columns.
pub fn html_to_text(html: &str, width: usize) -> String {
    let text = html2text::from_read(html.as_bytes(), width.max(MIN_BODY_WIDTH))
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to render message body");
            html.to_string()
        });
    collapse_blank_lines(&text)
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut pending_blank = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push("");
            pending_blank = false;
        }
        out.push(line);
    }
    out.join("\n")
}
