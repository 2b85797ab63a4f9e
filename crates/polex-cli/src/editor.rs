//! Interactive text entry through the user's editor.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Editors tried, in order, when `$EDITOR` is unset.
const FALLBACK_EDITORS: &[&str] = &["vim", "nano", "pico", "emacs"];

/// Pick the editor: `$EDITOR` if set, else the first fallback on `PATH`.
pub fn find_editor() -> Result<PathBuf> {
    choose_editor(std::env::var_os("EDITOR"), |name| which::which(name).ok())
}

fn choose_editor(
    from_env: Option<OsString>,
    lookup: impl Fn(&str) -> Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(editor) = from_env.filter(|e| !e.is_empty()) {
        return Ok(PathBuf::from(editor));
    }
    FALLBACK_EDITORS
        .iter()
        .find_map(|name| lookup(name))
        .with_context(|| {
            format!(
                "EDITOR is unset and none of {} is on PATH",
                FALLBACK_EDITORS.join(", ")
            )
        })
}

/// Open the editor on an empty temporary file and return what was saved.
pub fn read_from_editor() -> Result<String> {
    let editor = find_editor()?;
    let file = tempfile::Builder::new()
        .prefix("exception-comment-")
        .suffix(".txt")
        .tempfile()
        .context("could not create a temporary file for the editor")?;

    tracing::debug!(editor = %editor.display(), path = %file.path().display(), "opening editor");
    let status = Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("could not run editor {}", editor.display()))?;
    if !status.success() {
        bail!("editor {} exited with {status}", editor.display());
    }

    let text = std::fs::read_to_string(file.path()).context("could not read back the edited text")?;
    Ok(text)
}
