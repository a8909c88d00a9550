// Terminal presentation: prints each rendered region as a short styled
// listing. Status lines are colored by kind; an expired status is not
// repeated when the header is redrawn.

use crossterm::style::Stylize;
use std::collections::HashMap;
use std::time::Instant;

use crate::view::{
    AuthPanel, Card, CardIcon, Control, Dialog, FormState, Fragment, Input, Region, ShownStatus,
    StatusKind, StatusMessage, StatusTarget, View,
};

#[derive(Debug, Default)]
pub struct TerminalView {
    statuses: HashMap<StatusTarget, ShownStatus>,
    auth: AuthPanel,
    dialog: Option<Dialog>,
    form: FormState,
    last: HashMap<Region, Fragment>,
}

fn heading(region: Region) -> &'static str {
    match region {
        Region::Catalog => "Catalog",
        Region::SearchResult => "Search result",
        Region::ToRead => "To read",
        Region::ReadBooks => "Finished",
    }
}

fn print_card(card: &Card) {
    let mark = match card.icon {
        CardIcon::Book => "•",
        CardIcon::Check => "✓",
    };
    println!(
        "  {} {} by {} [{}]",
        mark,
        card.title.as_str().bold(),
        card.author,
        card.isbn.as_str().dim()
    );
    if !card.actions.is_empty() {
        let labels: Vec<&str> = card.actions.iter().map(|a| a.label()).collect();
        println!("      {}", labels.join(" | ").dim());
    }
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a control currently accepts input.
    pub fn is_enabled(&self, control: Control) -> bool {
        self.form.is_enabled(control)
    }

    pub fn auth(&self) -> &AuthPanel {
        &self.auth
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Last fragment rendered into a region, unless hidden since.
    pub fn fragment(&self, region: Region) -> Option<&Fragment> {
        self.last.get(&region)
    }

    /// One-line header: who is signed in plus any live status.
    pub fn header(&self) -> String {
        let who = match &self.auth {
            AuthPanel::LoggedOut => "Not signed in".to_string(),
            AuthPanel::LoggedIn { username, role } => format!("Signed in as {} ({})", username, role),
        };
        let now = Instant::now();
        let live: Vec<String> = self
            .statuses
            .values()
            .filter(|s| s.is_visible_at(now))
            .map(|s| s.message.text.clone())
            .collect();
        if live.is_empty() {
            who
        } else {
            format!("{} · {}", who, live.join(" · "))
        }
    }
}

impl View for TerminalView {
    fn render(&mut self, region: Region, fragment: Fragment) {
        match &fragment {
            Fragment::Loading(_) => {}
            Fragment::Empty(msg) => println!("{}: {}", heading(region).bold(), msg.as_str().italic()),
            Fragment::Error(msg) => println!("{}: {}", heading(region).bold(), msg.as_str().red()),
            Fragment::Grid(cards) => {
                println!("{} ({})", heading(region).bold(), cards.len());
                cards.iter().for_each(print_card);
            }
            Fragment::Single(card) => {
                println!("{}", heading(region).bold());
                print_card(card);
            }
        }
        self.last.insert(region, fragment);
    }

    fn hide(&mut self, region: Region) {
        self.last.remove(&region);
    }

    fn show_status(&mut self, message: StatusMessage) {
        let text = message.text.as_str();
        match message.kind {
            StatusKind::Info => println!("{}", text.cyan()),
            StatusKind::Success => println!("{} {}", "✓".green(), text.green()),
            StatusKind::Error => println!("{} {}", "✗".red(), text.red()),
        }
        self.statuses.insert(message.target, ShownStatus::new(message));
    }

    fn show_auth(&mut self, panel: AuthPanel) {
        self.auth = panel;
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        let Dialog::ConfirmDelete(book) = &dialog;
        println!(
            "{} {} by {} [{}]",
            "Delete".red().bold(),
            book.title,
            book.author,
            book.isbn
        );
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
