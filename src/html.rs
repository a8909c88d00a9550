// HTML rendering of view fragments. `HtmlView` keeps the markup per
// region together with visibility, statuses, the open dialog and form
// state; with `echoing()` it also prints each rendered fragment.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Instant;

use crate::view::{
    AuthPanel, Card, CardAction, CardIcon, Control, Dialog, FormState, Fragment, Input, Region,
    ShownStatus, StatusMessage, StatusTarget, View,
};

/// Escape text for element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn action_html(action: CardAction, isbn: &str) -> String {
    let (class, icon) = match action {
        CardAction::Edit => ("btn btn-small", "fa-pen"),
        CardAction::Delete => ("btn btn-small btn-danger", "fa-trash"),
        CardAction::MarkRead => ("btn btn-small btn-secondary", "fa-check"),
        CardAction::MarkUnread => ("btn btn-small btn-outline", "fa-rotate-left"),
        CardAction::Remove => ("btn btn-small btn-danger", "fa-trash"),
    };
    let name = match action {
        CardAction::Edit => "edit",
        CardAction::Delete => "delete",
        CardAction::MarkRead => "mark-read",
        CardAction::MarkUnread => "mark-unread",
        CardAction::Remove => "remove",
    };
    format!(
        r#"<button class="{}" data-action="{}" data-isbn="{}"><i class="fas {}"></i> {}</button>"#,
        class,
        name,
        escape(isbn),
        icon,
        action.label()
    )
}

pub fn card_html(card: &Card) -> String {
    let icon = match card.icon {
        CardIcon::Book => "fa-book",
        CardIcon::Check => "fa-check",
    };
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="book-card" data-isbn="{isbn}"><div class="book-header"><div class="book-icon"><i class="fas {icon}"></i></div><h3 class="book-title">{title}</h3></div><div class="book-details"><div class="book-author"><span>{author}</span></div><div class="book-isbn"><span>{isbn}</span></div></div>"#,
        isbn = escape(&card.isbn),
        icon = icon,
        title = escape(&card.title),
        author = escape(&card.author),
    );
    if !card.actions.is_empty() {
        html.push_str(r#"<div class="book-actions">"#);
        for action in &card.actions {
            html.push_str(&action_html(*action, &card.isbn));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

pub fn fragment_html(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Loading(msg) => format!(r#"<div class="loading">{}</div>"#, escape(msg)),
        Fragment::Empty(msg) => format!(r#"<div class="empty-state">{}</div>"#, escape(msg)),
        Fragment::Error(msg) => format!(r#"<div class="error-state">{}</div>"#, escape(msg)),
        Fragment::Grid(cards) => {
            let inner: String = cards.iter().map(card_html).collect();
            format!(r#"<div class="books-grid">{}</div>"#, inner)
        }
        Fragment::Single(card) => card_html(card),
    }
}

pub fn status_html(message: &StatusMessage) -> String {
    format!(
        r#"<div class="status-message {}">{}</div>"#,
        message.kind.as_str(),
        escape(&message.text)
    )
}

#[derive(Debug, Default, Clone)]
struct RegionState {
    fragment: Option<Fragment>,
    visible: bool,
}

#[derive(Debug, Default)]
pub struct HtmlView {
    regions: HashMap<Region, RegionState>,
    statuses: HashMap<StatusTarget, ShownStatus>,
    status_log: Vec<StatusMessage>,
    auth: AuthPanel,
    dialog: Option<Dialog>,
    form: FormState,
    echo: bool,
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print every fragment and status to stdout as it is rendered.
    pub fn echoing() -> Self {
        HtmlView {
            echo: true,
            ..Self::default()
        }
    }

    /// Markup of a region, or `None` while it is hidden or never rendered.
    pub fn html(&self, region: Region) -> Option<String> {
        self.fragment(region).map(fragment_html)
    }

    pub fn fragment(&self, region: Region) -> Option<&Fragment> {
        self.regions
            .get(&region)
            .filter(|r| r.visible)
            .and_then(|r| r.fragment.as_ref())
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.regions.get(&region).map(|r| r.visible).unwrap_or(false)
    }

    /// ISBNs of the cards currently shown in a region.
    pub fn card_isbns(&self, region: Region) -> Vec<String> {
        self.fragment(region)
            .map(|f| f.cards().iter().map(|c| c.isbn.clone()).collect())
            .unwrap_or_default()
    }

    /// The status shown on `target`, unless it has auto-hidden.
    pub fn status(&self, target: StatusTarget) -> Option<&StatusMessage> {
        self.status_at(target, Instant::now())
    }

    pub fn status_at(&self, target: StatusTarget, now: Instant) -> Option<&StatusMessage> {
        self.statuses
            .get(&target)
            .filter(|s| s.is_visible_at(now))
            .map(|s| &s.message)
    }

    /// Every status shown so far, oldest first.
    pub fn status_log(&self) -> &[StatusMessage] {
        &self.status_log
    }

    pub fn auth(&self) -> &AuthPanel {
        &self.auth
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.form.is_enabled(control)
    }
}

impl View for HtmlView {
    fn render(&mut self, region: Region, fragment: Fragment) {
        if self.echo {
            println!("<!-- {:?} -->\n{}", region, fragment_html(&fragment));
        }
        self.regions.insert(
            region,
            RegionState {
                fragment: Some(fragment),
                visible: true,
            },
        );
    }

    fn hide(&mut self, region: Region) {
        if let Some(state) = self.regions.get_mut(&region) {
            state.visible = false;
        }
    }

    fn show_status(&mut self, message: StatusMessage) {
        if self.echo {
            println!("{}", status_html(&message));
        }
        self.status_log.push(message.clone());
        self.statuses.insert(message.target, ShownStatus::new(message));
    }

    fn show_auth(&mut self, panel: AuthPanel) {
        self.auth = panel;
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
    }

    fn set_enabled(&mut self, control: Control, enabled: bool) {
        self.form.set_enabled(control, enabled);
    }

    fn set_input(&mut self, input: Input, value: &str) {
        self.form.set(input, value);
    }

    fn input(&self, input: Input) -> String {
        self.form.get(input)
    }
}
