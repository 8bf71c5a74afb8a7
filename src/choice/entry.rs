//! Choice log entries and their compact text encoding

/// Prefix byte that marks a button ordinal in the encoded log.
///
/// Free text never starts with it, so a typed `"2"` and button 2 stay
/// distinct.
pub const BUTTON_PREFIX: char = '\u{8}';

/// Encoded marker that opens a log owned by a user setting up a game.
/// It is never fed to the game program.
const SETUP_MARKER: &str = "\u{8}setup";

/// One selection made in a dialog chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChoiceEntry {
    /// Press the button with this 1-based ordinal
    Button(usize),
    /// Type text into the dialog's input field
    Input(String),
}

impl ChoiceEntry {
    pub fn encode(&self) -> String {
        match self {
            ChoiceEntry::Button(ordinal) => format!("{BUTTON_PREFIX}{ordinal}"),
            ChoiceEntry::Input(text) => text.clone(),
        }
    }

    /// Decode one log item; empty items carry nothing.
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix(BUTTON_PREFIX) {
            Some(ordinal) => ordinal.parse().ok().map(ChoiceEntry::Button),
            None => Some(ChoiceEntry::Input(raw.to_string())),
        }
    }
}

/// Ordered selections made since the last terminal state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceLog {
    /// User who started the game and owns the dialogs until setup ends
    pub setup_owner: Option<String>,
    pub entries: Vec<ChoiceEntry>,
}

impl ChoiceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_setup(owner: impl Into<String>) -> Self {
        Self {
            setup_owner: Some(owner.into()),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(mut self, entries: Vec<ChoiceEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn push(&mut self, entry: ChoiceEntry) {
        self.entries.push(entry);
    }

    /// Drop up to `count` entries from the end; returns how many went.
    pub fn truncate_last(&mut self, count: usize) -> usize {
        let dropped = count.min(self.entries.len());
        self.entries.truncate(self.entries.len() - dropped);
        dropped
    }

    /// Forget every selection; setup ownership survives.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Encoded items, setup marker first when present
    pub fn encode_items(&self) -> Vec<String> {
        let mut items = Vec::with_capacity(self.entries.len() + 2);
        if let Some(owner) = &self.setup_owner {
            items.push(SETUP_MARKER.to_string());
            items.push(owner.clone());
        }
        items.extend(self.entries.iter().map(ChoiceEntry::encode));
        items
    }

    /// Inverse of [`ChoiceLog::encode_items`], skipping empty items
    pub fn decode_items<'a>(items: impl IntoIterator<Item = &'a str>) -> Self {
        let items: Vec<&str> = items.into_iter().filter(|item| !item.is_empty()).collect();
        let (setup_owner, rest) = match items.as_slice() {
            [SETUP_MARKER, owner, rest @ ..] => (Some(owner.to_string()), rest),
            rest => (None, rest),
        };
        Self {
            setup_owner,
            entries: rest.iter().filter_map(|item| ChoiceEntry::decode(item)).collect(),
        }
    }
}
