//! The short topic string that carries a stalled dialog chain across restarts
//!
//! Format: `{gameId}:{buttonCount}:{base64(json(optionIndex))}:{hasInput}:{entry}:...`

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::choice::entry::ChoiceLog;
use crate::dialog::DialogMeta;

/// Topic of a public game channel with no pending chain
pub const IDLE_TOPIC: &str = "By Your Command game";

/// Everything needed to compile the next command of a chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceTopic {
    pub game_id: u64,
    pub dialog: DialogMeta,
    pub log: ChoiceLog,
}

impl ChoiceTopic {
    pub fn new(game_id: u64, dialog: DialogMeta, log: ChoiceLog) -> Self {
        Self {
            game_id,
            dialog,
            log,
        }
    }

    pub fn encode(&self) -> String {
        let options = serde_json::to_vec(&self.dialog.option_index).unwrap_or_default();
        let mut parts = vec![
            self.game_id.to_string(),
            self.dialog.button_count.to_string(),
            STANDARD.encode(options),
            if self.dialog.has_input { "1" } else { "" }.to_string(),
        ];
        parts.extend(self.log.encode_items().iter().map(|item| escape(item)));
        parts.join(":")
    }

    /// Parse a topic; anything that is not a choice topic yields `None`.
    pub fn decode(topic: &str) -> Option<Self> {
        let mut parts = topic.split(':');
        let game_id = parts.next()?.parse().ok()?;
        let button_count = parts.next()?.parse().ok()?;
        let options_raw = parts.next()?;
        let has_input = !parts.next()?.is_empty();

        let option_index: BTreeMap<String, usize> = if options_raw.is_empty() {
            BTreeMap::new()
        } else {
            match STANDARD
                .decode(options_raw)
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            {
                Some(index) => index,
                None => {
                    tracing::warn!(topic = %topic, "Ignoring topic with malformed option index");
                    return None;
                }
            }
        };

        let items: Vec<String> = parts.map(unescape).collect();
        Some(Self {
            game_id,
            dialog: DialogMeta {
                button_count,
                option_index,
                has_input,
            },
            log: ChoiceLog::decode_items(items.iter().map(String::as_str)),
        })
    }
}

fn escape(item: &str) -> String {
    item.replace('%', "%25").replace(':', "%3A")
}

fn unescape(item: &str) -> String {
    let mut out = String::with_capacity(item.len());
    let mut rest = item;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("%25") {
            out.push('%');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%3A") {
            out.push(':');
            rest = after;
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
