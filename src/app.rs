use crate::config::{Config, matches_key};
use crate::error::SwipeConfigError;
use crate::models::{
    ARCHIVE_FOLDER_ID, ActiveFilters, FilterFlag, Folder, INBOX_FOLDER_ID, Message,
    MessageCategory, SortOrder, TRASH_FOLDER_ID,
};
use crate::pipeline::{self, ListQuery, MessageGroup};
use crate::seed::Mailbox;
use crate::swipe::{PointerButton, PointerEvent, RowTap, SwipeController, SwipeSide};
use crate::undo::{MailAction, UndoableAction};
use chrono::{DateTime, TimeZone};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use std::collections::{HashMap, HashSet};

/// The terminal has a single mouse.
const MOUSE_POINTER_ID: u64 = 1;
/// Share of the remaining distance a settling row covers per tick.
const SETTLE_STEP: f32 = 0.5;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FocusedPanel {
    Folders,
    #[default]
    Messages,
    Details,
}

/// Screen area occupied by one message row, recorded at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHitbox {
    pub message_id: String,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl RowHitbox {
    fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && column < self.x.saturating_add(self.width)
            && row >= self.y
            && row < self.y.saturating_add(self.height)
    }
}

pub struct App {
    pub config: Config,
    pub folders: Vec<Folder>,
    pub messages: Vec<Message>,
    pub selected_folder: usize,
    pub category: MessageCategory,
    pub filters: ActiveFilters,
    pub sort: SortOrder,
    pub focused_panel: FocusedPanel,
    /// Ids of the rows currently listed, in display order.
    pub visible: Vec<String>,
    pub cursor: usize,
    pub opened: Option<String>,
    pub selection_mode: bool,
    pub selected: HashSet<String>,
    pub hitboxes: Vec<RowHitbox>,
    pub list_scroll: usize,
    pub detail_scroll: u16,
    pub undo_stack: Vec<UndoableAction>,
    pub status_message: Option<String>,
    pub should_quit: bool,
    swipe_template: SwipeController,
    swipes: HashMap<String, SwipeController>,
    /// Row the primary button went down on; it receives the gesture.
    pressed: Option<String>,
}

impl App {
    pub fn new(config: Config, mailbox: Mailbox) -> Result<Self, SwipeConfigError> {
        let swipe_template = SwipeController::new(config.swipe.controller_config())?;
        let selected_folder = mailbox
            .folders
            .iter()
            .position(|f| f.id == INBOX_FOLDER_ID)
            .unwrap_or(0);
        let sort = config.view.default_sort;

        let mut app = Self {
            config,
            folders: mailbox.folders,
            messages: mailbox.messages,
            selected_folder,
            category: MessageCategory::Primary,
            filters: ActiveFilters::default(),
            sort,
            focused_panel: FocusedPanel::Messages,
            visible: Vec::new(),
            cursor: 0,
            opened: None,
            selection_mode: false,
            selected: HashSet::new(),
            hitboxes: Vec::new(),
            list_scroll: 0,
            detail_scroll: 0,
            undo_stack: Vec::new(),
            status_message: None,
            should_quit: false,
            swipe_template,
            swipes: HashMap::new(),
            pressed: None,
        };
        app.refresh_view();
        Ok(app)
    }

    pub fn current_folder(&self) -> Option<&Folder> {
        self.folders.get(self.selected_folder)
    }

    pub fn query(&self) -> ListQuery<'_> {
        ListQuery {
            folder: self.current_folder(),
            category: self.category,
            filters: self.filters,
            sort: self.sort,
        }
    }

    pub fn view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<MessageGroup<'_>> {
        pipeline::build_view(&self.messages, &self.query(), now)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn cursor_id(&self) -> Option<&str> {
        self.visible.get(self.cursor).map(String::as_str)
    }

    pub fn opened_message(&self) -> Option<&Message> {
        self.opened.as_deref().and_then(|id| self.message(id))
    }

    /// Messages of the opened message's thread, oldest first.
    pub fn opened_thread(&self) -> Vec<&Message> {
        let Some(opened) = self.opened_message() else {
            return Vec::new();
        };
        let Some(thread_id) = opened.thread_id.as_deref() else {
            return vec![opened];
        };
        let mut thread: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.thread_id.as_deref() == Some(thread_id))
            .collect();
        thread.sort_by_key(|m| m.timestamp);
        thread
    }

    pub fn unread_count(&self, folder: &Folder) -> usize {
        match folder.unread_count {
            Some(count) => count as usize,
            None => pipeline::unread_count(&self.messages, folder),
        }
    }

    pub fn swipe(&self, id: &str) -> Option<&SwipeController> {
        self.swipes.get(id)
    }

    /// Re-derives the visible rows and drops gesture state of rows that left.
    pub fn refresh_view(&mut self) {
        let visible: Vec<String> = pipeline::collapse(&self.messages, &self.query())
            .into_iter()
            .map(|m| m.id.clone())
            .collect();
        self.visible = visible;

        let visible: HashSet<&str> = self.visible.iter().map(String::as_str).collect();
        self.swipes.retain(|id, _| visible.contains(id.as_str()));
        self.selected.retain(|id| visible.contains(id.as_str()));
        if let Some(pressed) = &self.pressed {
            if !visible.contains(pressed.as_str()) {
                self.pressed = None;
            }
        }

        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }

    fn controller(&mut self, id: &str) -> &mut SwipeController {
        let template = &self.swipe_template;
        let selection_mode = self.selection_mode;
        self.swipes.entry(id.to_string()).or_insert_with(|| {
            let mut c = template.clone();
            c.set_selection_mode(selection_mode);
            c
        })
    }

    /// Advances settling rows; returns whether anything moved.
    pub fn tick(&mut self) -> bool {
        let mut moved = false;
        for c in self.swipes.values_mut() {
            if c.is_settling() {
                c.advance(SETTLE_STEP);
                moved = true;
            }
        }
        moved
    }

    pub fn select_folder(&mut self, index: usize) {
        if index >= self.folders.len() || index == self.selected_folder {
            return;
        }
        self.selected_folder = index;
        self.cursor = 0;
        self.list_scroll = 0;
        self.detail_scroll = 0;
        self.refresh_view();
        tracing::debug!(folder = %self.folders[index].id, "folder selected");
    }

    pub fn next_category(&mut self) {
        self.category = self.category.next();
        self.cursor = 0;
        self.refresh_view();
    }

    pub fn toggle_filter(&mut self, flag: FilterFlag) {
        self.filters.toggle(flag);
        self.refresh_view();
    }

    pub fn clear_filters(&mut self) {
        self.filters = ActiveFilters::default();
        self.refresh_view();
    }

    pub fn cycle_sort(&mut self) {
        self.sort.key = self.sort.key.next();
        self.refresh_view();
    }

    pub fn flip_sort(&mut self) {
        self.sort.direction = self.sort.direction.flipped();
        self.refresh_view();
    }

    pub fn set_selection_mode(&mut self, enabled: bool) {
        self.selection_mode = enabled;
        self.pressed = None;
        for c in self.swipes.values_mut() {
            c.set_selection_mode(enabled);
        }
        if !enabled {
            self.selected.clear();
        }
    }

    pub fn toggle_selected(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Row tapped without a drag: toggle selection or open the message.
    pub fn activate_row(&mut self, id: &str) {
        if let Some(pos) = self.visible.iter().position(|v| v == id) {
            self.cursor = pos;
        }
        if self.selection_mode {
            self.toggle_selected(id);
            return;
        }

        self.opened = Some(id.to_string());
        self.detail_scroll = 0;
        if let Some(m) = self.message_mut(id) {
            m.is_read = true;
        }
        self.refresh_view();
    }

    pub fn perform(&mut self, action: MailAction, id: &str) {
        let Some(message) = self.message(id) else {
            return;
        };
        let subject = message.subject.clone();
        let from_folder = message.folder.clone();
        let sender = message.sender.name.clone();

        match action {
            MailAction::Archive | MailAction::Delete => {
                let (target, undo) = if action == MailAction::Archive {
                    (
                        ARCHIVE_FOLDER_ID,
                        UndoableAction::Archive {
                            message_id: id.to_string(),
                            from_folder: from_folder.clone(),
                        },
                    )
                } else {
                    (
                        TRASH_FOLDER_ID,
                        UndoableAction::Delete {
                            message_id: id.to_string(),
                            from_folder: from_folder.clone(),
                        },
                    )
                };
                if from_folder == target {
                    self.status_message = Some(format!("Already in {}", target));
                    return;
                }
                if let Some(m) = self.message_mut(id) {
                    m.folder = target.to_string();
                }
                if self.opened.as_deref() == Some(id) {
                    self.opened = None;
                }
                tracing::info!(message = id, from = %from_folder, to = target, "moved message");
                let verb = if action == MailAction::Archive {
                    "Archived"
                } else {
                    "Deleted"
                };
                self.status_message = Some(format!("{} \"{}\" (u to undo)", verb, subject));
                self.undo_stack.push(undo);
            }
            MailAction::ToggleRead => {
                if let Some(m) = self.message_mut(id) {
                    m.is_read = !m.is_read;
                    let state = if m.is_read { "read" } else { "unread" };
                    self.status_message = Some(format!("Marked as {}", state));
                }
            }
            MailAction::ToggleFlag => {
                if let Some(m) = self.message_mut(id) {
                    m.is_flagged = !m.is_flagged;
                    let state = if m.is_flagged { "Flagged" } else { "Unflagged" };
                    self.status_message = Some(state.to_string());
                }
            }
            MailAction::Reply => {
                self.status_message = Some(format!("Replying to {} (simulated)", sender));
            }
        }
        self.refresh_view();
    }

    pub fn undo(&mut self) {
        let Some(action) = self.undo_stack.pop() else {
            self.status_message = Some("Nothing to undo".to_string());
            return;
        };
        let from = action.from_folder().to_string();
        if let Some(m) = self.message_mut(action.message_id()) {
            m.folder = from;
        }
        self.status_message = Some(format!("Undid {}", action.description()));
        self.refresh_view();
    }

    fn move_cursor(&mut self, down: bool) {
        match self.focused_panel {
            FocusedPanel::Folders => {
                let next = if down {
                    (self.selected_folder + 1).min(self.folders.len().saturating_sub(1))
                } else {
                    self.selected_folder.saturating_sub(1)
                };
                self.select_folder(next);
            }
            FocusedPanel::Messages => {
                self.cursor = if down {
                    (self.cursor + 1).min(self.visible.len().saturating_sub(1))
                } else {
                    self.cursor.saturating_sub(1)
                };
            }
            FocusedPanel::Details => {
                self.detail_scroll = if down {
                    self.detail_scroll.saturating_add(1)
                } else {
                    self.detail_scroll.saturating_sub(1)
                };
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let kb = self.config.keybindings.clone();

        if matches_key(key, &kb.quit) {
            self.should_quit = true;
        } else if key.code == KeyCode::Esc {
            if self.selection_mode {
                self.set_selection_mode(false);
            } else {
                for c in self.swipes.values_mut() {
                    c.close();
                }
            }
        } else if matches_key(key, &kb.prev_panel) {
            self.focused_panel = match self.focused_panel {
                FocusedPanel::Details => FocusedPanel::Messages,
                FocusedPanel::Messages | FocusedPanel::Folders => FocusedPanel::Folders,
            };
        } else if matches_key(key, &kb.next_panel) {
            self.focused_panel = match self.focused_panel {
                FocusedPanel::Folders => FocusedPanel::Messages,
                FocusedPanel::Messages | FocusedPanel::Details => FocusedPanel::Details,
            };
        } else if matches_key(key, &kb.move_down) {
            self.move_cursor(true);
        } else if matches_key(key, &kb.move_up) {
            self.move_cursor(false);
        } else if matches_key(key, &kb.open) {
            if let Some(id) = self.cursor_id().map(str::to_string) {
                self.activate_row(&id);
            }
        } else if matches_key(key, &kb.toggle_select) {
            if self.selection_mode {
                if let Some(id) = self.cursor_id().map(str::to_string) {
                    self.toggle_selected(&id);
                }
            }
        } else if matches_key(key, &kb.selection_mode) {
            self.set_selection_mode(!self.selection_mode);
        } else if matches_key(key, &kb.cycle_sort) {
            self.cycle_sort();
        } else if matches_key(key, &kb.flip_sort) {
            self.flip_sort();
        } else if matches_key(key, &kb.next_category) {
            self.next_category();
        } else if matches_key(key, &kb.clear_filters) {
            self.clear_filters();
        } else if matches_key(key, &kb.undo) {
            self.undo();
        } else {
            let filter_keys = [
                (&kb.filter_unread, FilterFlag::Unread),
                (&kb.filter_starred, FilterFlag::Starred),
                (&kb.filter_attachments, FilterFlag::Attachments),
                (&kb.filter_unanswered, FilterFlag::Unanswered),
                (&kb.filter_favorites, FilterFlag::Favorites),
                (&kb.filter_personal, FilterFlag::Personal),
                (&kb.filter_social, FilterFlag::Social),
                (&kb.filter_updates, FilterFlag::Updates),
                (&kb.filter_forums, FilterFlag::Forums),
            ];
            if let Some((_, flag)) = filter_keys.iter().find(|(b, _)| matches_key(key, b)) {
                self.toggle_filter(*flag);
            }
        }
    }

    fn pointer(&self, column: u16, button: PointerButton) -> PointerEvent {
        PointerEvent {
            pointer_id: MOUSE_POINTER_ID,
            button,
            x: self.config.swipe.columns_to_px(column as f32),
        }
    }

    fn row_at(&self, column: u16, row: u16) -> Option<&RowHitbox> {
        self.hitboxes.iter().find(|h| h.contains(column, row))
    }

    /// Which tray button, if any, lies under `column` on a revealed row.
    pub fn tray_hit(&self, hitbox: &RowHitbox, column: u16) -> Option<(SwipeSide, usize)> {
        let c = self.swipes.get(&hitbox.message_id)?;
        let side = c.revealed()?;
        let settings = &self.config.swipe;
        let columns =
            |px: f32| u16::try_from(settings.px_to_columns(px).max(0)).unwrap_or(u16::MAX);
        let tray_cols = columns(c.displayed_offset().abs());
        let item_cols = columns(settings.item_width).max(1);

        let start = match side {
            SwipeSide::Right => hitbox.x,
            SwipeSide::Left => hitbox
                .x
                .saturating_add(hitbox.width)
                .saturating_sub(tray_cols),
        };
        if column < start || column >= start.saturating_add(tray_cols) {
            return None;
        }
        let index = ((column - start) / item_cols) as usize;
        (index < c.config().action_count(side)).then_some((side, index))
    }

    fn tray_action(&self, side: SwipeSide, index: usize) -> Option<MailAction> {
        let actions = match side {
            SwipeSide::Right => &self.config.swipe.right_actions,
            SwipeSide::Left => &self.config.swipe.left_actions,
        };
        actions.get(index).copied()
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::Down(button) => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Auxiliary,
                };
                let Some(hitbox) = self.row_at(event.column, event.row).cloned() else {
                    return;
                };
                self.focused_panel = FocusedPanel::Messages;

                // tray buttons handle the press themselves
                if button == PointerButton::Primary {
                    if let Some((side, index)) = self.tray_hit(&hitbox, event.column) {
                        let invoked = self.controller(&hitbox.message_id).invoke_action(side, index);
                        if let Some(action) = invoked.and_then(|i| self.tray_action(side, i)) {
                            self.perform(action, &hitbox.message_id);
                        }
                        return;
                    }
                }

                let pointer = self.pointer(event.column, button);
                self.controller(&hitbox.message_id).pointer_down(pointer);
                if button == PointerButton::Primary {
                    self.pressed = Some(hitbox.message_id);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let pointer = self.pointer(event.column, PointerButton::Primary);
                if let Some(id) = self.pressed.clone() {
                    self.controller(&id).pointer_move(pointer);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let pointer = self.pointer(event.column, PointerButton::Primary);
                let Some(id) = self.pressed.take() else {
                    return;
                };
                let controller = self.controller(&id);
                controller.pointer_up(pointer);
                match controller.tap() {
                    RowTap::Select => self.activate_row(&id),
                    RowTap::CloseTray | RowTap::Consumed => {}
                }
            }
            MouseEventKind::ScrollDown => {
                self.focused_panel = FocusedPanel::Messages;
                self.move_cursor(true);
            }
            MouseEventKind::ScrollUp => {
                self.focused_panel = FocusedPanel::Messages;
                self.move_cursor(false);
            }
            _ => {}
        }
    }
}
