//! Reading and writing the seed fragment embedded in a game state blob
//!
//! A fragment looks like `[seed v=1]eyJyb3VuZCI6MX0=[/seed]`: base64 of the
//! compact JSON document, split into [`CHUNK_WIDTH`]-character segments
//! joined with `-`. Everything outside the fragment is narrative text that
//! must survive untouched.

use std::ops::Range;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::seed::document::Seed;

/// Persisted format version, written into the fragment delimiter.
///
/// Changing [`CHUNK_WIDTH`] or the payload encoding requires a new version.
pub const FORMAT_VERSION: u32 = 1;

/// Width of each dash-joined payload segment
pub const CHUNK_WIDTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SeedDecodeError {
    #[error("unsupported seed format version {0}")]
    UnsupportedVersion(String),

    #[error("seed payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("seed payload is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

fn fragment_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[seed v=([^\]]*)\](.*?)\[/seed\]").expect("valid regex"))
}

struct Fragment<'a> {
    range: Range<usize>,
    version: &'a str,
    payload: &'a str,
}

fn find_fragment(blob: &str) -> Option<Fragment<'_>> {
    let caps = fragment_pattern().captures(blob)?;
    let whole = caps.get(0)?;
    Some(Fragment {
        range: whole.range(),
        version: caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        payload: caps.get(2).map(|m| m.as_str()).unwrap_or_default(),
    })
}

/// Codec for the seed embedded in a game state
pub struct StateCodec;

impl StateCodec {
    /// Whether the blob carries a seed fragment at all
    pub fn has_seed(blob: &str) -> bool {
        find_fragment(blob).is_some()
    }

    /// Decode the embedded seed; a blob without a fragment has an empty seed.
    pub fn decode(blob: &str) -> Result<Seed, SeedDecodeError> {
        match find_fragment(blob) {
            Some(fragment) => decode_fragment(&fragment),
            None => Ok(Seed::new()),
        }
    }

    /// Write `seed` into the blob.
    ///
    /// The existing fragment is replaced in place. When it already decodes to
    /// `seed` the blob is returned byte-for-byte. Without a fragment an empty
    /// seed leaves the blob alone and a non-empty one is appended at the end.
    /// An existing fragment that does not decode is an error.
    pub fn encode(blob: &str, seed: &Seed) -> Result<String, SeedDecodeError> {
        match find_fragment(blob) {
            Some(fragment) => {
                if &decode_fragment(&fragment)? == seed {
                    return Ok(blob.to_string());
                }
                let replacement = fragment_text(seed)?;
                let mut out = String::with_capacity(blob.len() + replacement.len());
                out.push_str(&blob[..fragment.range.start]);
                out.push_str(&replacement);
                out.push_str(&blob[fragment.range.end..]);
                Ok(out)
            }
            None if seed.is_empty() => Ok(blob.to_string()),
            None => Ok(format!("{blob}{}", fragment_text(seed)?)),
        }
    }

    /// The paragraph that holds the seed fragment, without the fragment.
    ///
    /// This is the game-state board that gets rendered into a screenshot.
    pub fn game_state_section(blob: &str) -> Option<String> {
        let fragment = find_fragment(blob)?;
        let start = blob[..fragment.range.start]
            .rfind("\n\n")
            .map(|pos| pos + 2)
            .unwrap_or(0);
        let end = blob[fragment.range.end..]
            .find("\n\n")
            .map(|pos| fragment.range.end + pos)
            .unwrap_or(blob.len());

        let mut section = String::new();
        section.push_str(&blob[start..fragment.range.start]);
        section.push_str(&blob[fragment.range.end..end]);
        let section = section.trim();
        if section.is_empty() {
            None
        } else {
            Some(section.to_string())
        }
    }
}

fn decode_fragment(fragment: &Fragment<'_>) -> Result<Seed, SeedDecodeError> {
    if fragment.version.trim() != FORMAT_VERSION.to_string() {
        return Err(SeedDecodeError::UnsupportedVersion(
            fragment.version.to_string(),
        ));
    }

    let compact: String = fragment
        .payload
        .chars()
        .filter(|c| *c != '-' && !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn fragment_text(seed: &Seed) -> Result<String, SeedDecodeError> {
    let json = serde_json::to_vec(seed)?;
    let payload = STANDARD.encode(json);
    // Base64 output is ASCII, so byte chunks are character chunks
    let chunks: Vec<&str> = payload
        .as_bytes()
        .chunks(CHUNK_WIDTH)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect();
    Ok(format!(
        "[seed v={FORMAT_VERSION}]{}[/seed]",
        chunks.join("-")
    ))
}
