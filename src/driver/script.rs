//! The game program's script: download, extraction and hot-update checks

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::driver::DriverError;

/// Segment tags the script is split into on its hosting page
const SEGMENT_TAGS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Reassemble the script from the page that hosts it.
///
/// The page carries the script in six segments, each wrapped in
/// `STARTBYC{tag}` and `ENDBYC{tag}`. A segment must not contain another
/// marker.
pub fn extract_script(page: &str) -> Result<String, DriverError> {
    let mut script = String::new();
    for tag in SEGMENT_TAGS {
        let segment = find_segment(page, tag)
            .ok_or_else(|| DriverError::Script(format!("segment {tag} not found")))?;
        script.push_str(segment);
    }
    Ok(script.replace("&gt;", ">").replace("&amp;", "&"))
}

fn find_segment(page: &str, tag: char) -> Option<&str> {
    let start_marker = format!("STARTBYC{tag}");
    let end_marker = format!("ENDBYC{tag}");
    let mut offset = 0;
    while let Some(pos) = page[offset..].find(&start_marker) {
        let body_start = offset + pos + start_marker.len();
        let rest = &page[body_start..];
        let next_marker = [rest.find("STARTBYC"), rest.find("ENDBYC")]
            .into_iter()
            .flatten()
            .min();
        if let Some(end) = next_marker {
            if rest[end..].starts_with(&end_marker) {
                return Some(&rest[..end]);
            }
        }
        offset = body_start;
    }
    None
}

/// The script file the game program runs, with the digest it was loaded at
pub struct ScriptSource {
    url: Option<String>,
    path: PathBuf,
    loaded_digest: Option<Vec<u8>>,
}

impl ScriptSource {
    pub fn new(url: Option<String>, path: PathBuf) -> Self {
        Self {
            url,
            path,
            loaded_digest: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the script exists on disk, downloading it if needed, and
    /// remember its digest.
    pub async fn ensure(&mut self) -> Result<(), DriverError> {
        if !self.path.exists() {
            let script = self.download().await?;
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, script)?;
            tracing::info!(path = %self.path.display(), "Downloaded game script");
        }
        self.mark_loaded()
    }

    /// Fetch the hosting page and extract the script from it
    pub async fn download(&self) -> Result<String, DriverError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| DriverError::Script("no script URL configured".to_string()))?;
        let response = reqwest::get(url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DriverError::Script(format!("failed to fetch {url}: {e}")))?;
        let page = response
            .text()
            .await
            .map_err(|e| DriverError::Script(format!("failed to read {url}: {e}")))?;
        extract_script(&page)
    }

    /// Record the current file contents as the loaded version
    pub fn mark_loaded(&mut self) -> Result<(), DriverError> {
        self.loaded_digest = Some(file_digest(&self.path)?);
        Ok(())
    }

    /// Whether the file on disk differs from the loaded version
    pub fn has_changed(&self) -> Result<bool, DriverError> {
        let Some(loaded) = &self.loaded_digest else {
            return Ok(false);
        };
        if !self.path.exists() {
            return Ok(false);
        }
        Ok(&file_digest(&self.path)? != loaded)
    }
}

fn file_digest(path: &Path) -> Result<Vec<u8>, DriverError> {
    let contents = fs::read(path)?;
    Ok(Sha256::digest(&contents).to_vec())
}
