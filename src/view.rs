// View-binding layer.
//
// The client never builds markup itself. It describes what a region
// should show as a `Fragment` and hands it to a `View`, which decides
// how to present it (HTML strings, styled terminal text, ...).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{Book, ReadingListEntry};
use crate::session::Role;

/// Display regions the client renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Catalog,
    SearchResult,
    ToRead,
    ReadBooks,
}

/// Status areas. `General` is the default target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusTarget {
    #[default]
    General,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

/// A transient message. Views hide it once `ttl` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub target: StatusTarget,
    pub kind: StatusKind,
    pub text: String,
    pub ttl: Duration,
}

/// Text inputs the client reads defaults from or clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Username,
    Password,
    AddIsbn,
    SearchIsbn,
    UpdateIsbn,
    UpdateTitle,
    UpdateAuthor,
    UserIsbn,
}

/// Controls that can be disabled while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    UpdateBook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardIcon {
    Book,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Delete,
    MarkRead,
    MarkUnread,
    Remove,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Edit => "Edit",
            CardAction::Delete => "Delete",
            CardAction::MarkRead => "Mark read",
            CardAction::MarkUnread => "Mark unread",
            CardAction::Remove => "Remove",
        }
    }
}

/// One book as displayed, with the affordances offered on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub icon: CardIcon,
    pub actions: Vec<CardAction>,
}

impl Card {
    /// Catalog card; admins get edit and delete.
    pub fn catalog(book: &Book, role: Role) -> Self {
        let actions = if role == Role::Admin {
            vec![CardAction::Edit, CardAction::Delete]
        } else {
            Vec::new()
        };
        Card {
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            icon: CardIcon::Book,
            actions,
        }
    }

    /// Reading-list card offering the opposite read state and removal.
    pub fn to_read(entry: &ReadingListEntry) -> Self {
        let toggle = if entry.is_read {
            CardAction::MarkUnread
        } else {
            CardAction::MarkRead
        };
        Card {
            isbn: entry.isbn.clone(),
            title: entry.title.clone(),
            author: entry.author.clone(),
            icon: CardIcon::Book,
            actions: vec![toggle, CardAction::Remove],
        }
    }

    /// Completed-list card, display only.
    pub fn finished(entry: &ReadingListEntry) -> Self {
        Card {
            isbn: entry.isbn.clone(),
            title: entry.title.clone(),
            author: entry.author.clone(),
            icon: CardIcon::Check,
            actions: Vec::new(),
        }
    }
}

/// What a region shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Loading(String),
    Empty(String),
    Error(String),
    Grid(Vec<Card>),
    Single(Card),
}

impl Fragment {
    pub fn cards(&self) -> &[Card] {
        match self {
            Fragment::Grid(cards) => cards,
            Fragment::Single(card) => std::slice::from_ref(card),
            _ => &[],
        }
    }
}

/// Signed-in state shown in the header and which panel is open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPanel {
    #[default]
    LoggedOut,
    LoggedIn { username: String, role: Role },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    ConfirmDelete(Book),
}

/// Presentation seam between the client and whatever shows its output.
pub trait View {
    /// Replace a region's content and make it visible.
    fn render(&mut self, region: Region, fragment: Fragment);
    fn hide(&mut self, region: Region);
    fn show_status(&mut self, message: StatusMessage);
    fn show_auth(&mut self, panel: AuthPanel);
    fn open_dialog(&mut self, dialog: Dialog);
    fn close_dialog(&mut self);
    fn set_enabled(&mut self, control: Control, enabled: bool);
    fn set_input(&mut self, input: Input, value: &str);
    fn input(&self, input: Input) -> String;
}

/// Form state shared by the concrete views: input values and disabled
/// controls.
#[derive(Debug, Default, Clone)]
pub struct FormState {
    inputs: HashMap<Input, String>,
    disabled: HashMap<Control, bool>,
}

impl FormState {
    pub fn set(&mut self, input: Input, value: &str) {
        if value.is_empty() {
            self.inputs.remove(&input);
        } else {
            self.inputs.insert(input, value.to_string());
        }
    }

    pub fn get(&self, input: Input) -> String {
        self.inputs.get(&input).cloned().unwrap_or_default()
    }

    pub fn set_enabled(&mut self, control: Control, enabled: bool) {
        self.disabled.insert(control, !enabled);
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        !self.disabled.get(&control).copied().unwrap_or(false)
    }
}

/// A status message with the moment it was shown.
#[derive(Debug, Clone)]
pub struct ShownStatus {
    pub message: StatusMessage,
    pub shown_at: Instant,
}

impl ShownStatus {
    pub fn new(message: StatusMessage) -> Self {
        ShownStatus {
            message,
            shown_at: Instant::now(),
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < self.message.ttl
    }
}
