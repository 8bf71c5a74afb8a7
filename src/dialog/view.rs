//! Structured view of the dialog the game program is currently showing

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Errors while reading a rendered prompt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogError {
    /// The program shows no dialog; it settled into a terminal state instead.
    #[error("no dialog present")]
    NoDialogPresent,
}

/// The prompt currently visible in the game program.
///
/// Produced fresh after every round trip and never persisted; only its
/// [`DialogMeta`] survives in the topic string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub message: String,
    pub buttons: Vec<String>,
    pub has_input: bool,
    /// Button value and visible text, both mapped to the 1-based ordinal
    pub option_index: BTreeMap<String, usize>,
}

/// The part of a dialog needed to compile the next command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogMeta {
    pub button_count: usize,
    pub option_index: BTreeMap<String, usize>,
    pub has_input: bool,
}

impl DialogMeta {
    /// Whether the dialog is the main menu, which offers "Save and Quit"
    pub fn is_main_menu(&self) -> bool {
        self.option_index.contains_key(SAVE_AND_QUIT)
    }
}

/// Label of the button that commits a private series of actions
pub const SAVE_AND_QUIT: &str = "Save and Quit";

struct Patterns {
    dialog: Regex,
    message: Regex,
    button: Regex,
    class_attr: Regex,
    input: Regex,
    line_break: Regex,
    tag: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        dialog: Regex::new(r#"<[a-zA-Z]+[^>]*\bclass="(?:[^"]*\s)?dialog(?:\s[^"]*)?"[^>]*>"#)
            .expect("valid regex"),
        message: Regex::new(
            r#"(?s)<(?:div|p|span)[^>]*\bclass="(?:[^"]*\s)?msg(?:\s[^"]*)?"[^>]*>(.*?)</(?:div|p|span)>"#,
        )
        .expect("valid regex"),
        button: Regex::new(r"(?s)<button([^>]*)>(.*?)</button>").expect("valid regex"),
        class_attr: Regex::new(r#"\bclass="([^"]*)""#).expect("valid regex"),
        input: Regex::new(r#"<input[^>]*\btype="text"[^>]*>"#).expect("valid regex"),
        line_break: Regex::new(r"<br\s*/?>").expect("valid regex"),
        tag: Regex::new(r"<[^>]+>").expect("valid regex"),
    })
}

impl DialogView {
    /// Parse the program's rendered prompt markup.
    ///
    /// Returns [`DialogError::NoDialogPresent`] when the markup holds no
    /// dialog element.
    pub fn parse(markup: &str) -> Result<Self, DialogError> {
        let p = patterns();
        let start = p
            .dialog
            .find(markup)
            .ok_or(DialogError::NoDialogPresent)?
            .end();
        let body = &markup[start..];

        let message = p
            .message
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| p.line_break.replace_all(m.as_str(), "\n").into_owned())
            .unwrap_or_default();

        let mut buttons = Vec::new();
        let mut option_index = BTreeMap::new();
        for (index, caps) in p.button.captures_iter(body).enumerate() {
            let ordinal = index + 1;
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let text = inner_text(&p.tag.replace_all(inner, ""));

            if let Some(value) = p.class_attr.captures(attrs).and_then(|c| c.get(1)) {
                let value = value.as_str().trim();
                if !value.is_empty() {
                    option_index.insert(value.to_string(), ordinal);
                }
            }
            if !text.is_empty() {
                option_index.insert(text.clone(), ordinal);
            }
            buttons.push(text);
        }

        Ok(Self {
            message,
            buttons,
            has_input: p.input.is_match(body),
            option_index,
        })
    }

    pub fn meta(&self) -> DialogMeta {
        DialogMeta {
            button_count: self.buttons.len(),
            option_index: self.option_index.clone(),
            has_input: self.has_input,
        }
    }

    /// Whether the user has a real decision to make in this dialog
    pub fn has_options(&self) -> bool {
        self.buttons.len() > 1 || self.has_input
    }

    pub fn is_main_menu(&self) -> bool {
        self.option_index.contains_key(SAVE_AND_QUIT)
    }
}

fn inner_text(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
