use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Selector of the element whose headings feed the table of contents.
    pub root_selector: String,
    /// Selector of the element that receives the generated links.
    pub nav_selector: String,
    pub back_top_threshold: f64,
    pub toast_duration_ms: u64,
    /// Where the back action goes when there is no history to return to.
    pub fallback_back_url: String,
    pub toc_width: u16,
    pub show_toc: bool,
    pub mouse_support: bool,
    pub text_width: Option<usize>,
}

impl Settings {
    pub fn merge(&mut self, other: Self) {
        self.root_selector = other.root_selector;
        self.nav_selector = other.nav_selector;
        self.back_top_threshold = other.back_top_threshold;
        self.toast_duration_ms = other.toast_duration_ms;
        if !other.fallback_back_url.is_empty() {
            self.fallback_back_url = other.fallback_back_url;
        }
        self.toc_width = other.toc_width;
        self.show_toc = other.show_toc;
        self.mouse_support = other.mouse_support;
        if other.text_width.is_some() {
            self.text_width = other.text_width;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_selector: "body".to_string(),
            nav_selector: "nav".to_string(),
            back_top_threshold: 280.0,
            toast_duration_ms: 1400,
            fallback_back_url: String::new(),
            toc_width: 32,
            show_toc: true,
            mouse_support: false,
            text_width: None,
        }
    }
}

/// Actions the viewer binds keys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    BackToTop,
    End,
    TableOfContents,
    Follow,
    CopySectionLink,
    CopyPageLink,
    Back,
    Help,
    Quit,
}

/// User-editable key names, one per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgDefaultKeymaps {
    pub scroll_up: String,
    pub scroll_down: String,
    pub page_up: String,
    pub page_down: String,
    pub back_to_top: String,
    pub end: String,
    pub table_of_contents: String,
    pub follow: String,
    pub copy_section_link: String,
    pub copy_page_link: String,
    pub back: String,
    pub help: String,
    pub quit: String,
}

impl Default for CfgDefaultKeymaps {
    fn default() -> Self {
        Self {
            scroll_up: "k".to_string(),
            scroll_down: "j".to_string(),
            page_up: "PageUp".to_string(),
            page_down: "PageDown".to_string(),
            back_to_top: "g".to_string(),
            end: "G".to_string(),
            table_of_contents: "t".to_string(),
            follow: "Enter".to_string(),
            copy_section_link: "y".to_string(),
            copy_page_link: "Y".to_string(),
            back: "Backspace".to_string(),
            help: "?".to_string(),
            quit: "q".to_string(),
        }
    }
}

impl CfgDefaultKeymaps {
    pub fn merge(&mut self, other: Self) {
        self.scroll_up = other.scroll_up;
        self.scroll_down = other.scroll_down;
        self.page_up = other.page_up;
        self.page_down = other.page_down;
        self.back_to_top = other.back_to_top;
        self.end = other.end;
        self.table_of_contents = other.table_of_contents;
        self.follow = other.follow;
        self.copy_section_link = other.copy_section_link;
        self.copy_page_link = other.copy_page_link;
        self.back = other.back;
        self.help = other.help;
        self.quit = other.quit;
    }

    fn bindings(&self) -> [(Action, &str); 13] {
        [
            (Action::ScrollUp, self.scroll_up.as_str()),
            (Action::ScrollDown, self.scroll_down.as_str()),
            (Action::PageUp, self.page_up.as_str()),
            (Action::PageDown, self.page_down.as_str()),
            (Action::BackToTop, self.back_to_top.as_str()),
            (Action::End, self.end.as_str()),
            (Action::TableOfContents, self.table_of_contents.as_str()),
            (Action::Follow, self.follow.as_str()),
            (Action::CopySectionLink, self.copy_section_link.as_str()),
            (Action::CopyPageLink, self.copy_page_link.as_str()),
            (Action::Back, self.back.as_str()),
            (Action::Help, self.help.as_str()),
            (Action::Quit, self.quit.as_str()),
        ]
    }
}

/// Keys that work regardless of the user keymap.
pub const BUILTIN_KEYS: &[(Action, &str)] = &[
    (Action::ScrollUp, "Up"),
    (Action::ScrollDown, "Down"),
    (Action::PageDown, "Space"),
    (Action::BackToTop, "Home"),
    (Action::End, "End"),
    (Action::TableOfContents, "Tab"),
    (Action::Quit, "Esc"),
];

/// Resolved key name to action table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keymap {
    bindings: Vec<(String, Action)>,
}

impl Keymap {
    pub fn from_user(user: &CfgDefaultKeymaps) -> Self {
        let mut bindings: Vec<(String, Action)> = user
            .bindings()
            .iter()
            .filter(|(_, key)| !key.is_empty())
            .map(|(action, key)| (key.to_string(), *action))
            .collect();
        for (action, key) in BUILTIN_KEYS {
            if !bindings.iter().any(|(bound, _)| bound == key) {
                bindings.push((key.to_string(), *action));
            }
        }
        Self { bindings }
    }

    pub fn action(&self, key: &str) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == key)
            .map(|(_, action)| *action)
    }

    /// Every key bound to `action`, user keys first.
    pub fn keys(&self, action: Action) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, bound)| *bound == action)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
