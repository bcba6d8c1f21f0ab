use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

/// Errors from opening a document in the user's editor
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to prepare review file: {0}")]
    TempFileError(#[from] std::io::Error),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("No editor found. Set $EDITOR or $VISUAL environment variable")]
    NoEditorFound,
    #[error("Edited document is empty; review aborted")]
    EmptyDocument,
}

/// Opens a document for review; mockable in tests.
pub trait Editor {
    /// Open `initial` for editing and return the result.
    ///
    /// `comment_help` is shown as `#` lines above the document and stripped
    /// from what comes back.
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError>;
}

/// Runs `$EDITOR`, then `$VISUAL`, then the first common editor on PATH.
#[derive(Debug, Default)]
pub struct SystemEditor;

impl SystemEditor {
    pub fn new() -> Self {
        Self
    }

    fn find_editor() -> Result<String, EditorError> {
        for var in ["EDITOR", "VISUAL"] {
            if let Ok(editor) = env::var(var) {
                if !editor.trim().is_empty() {
                    return Ok(editor);
                }
            }
        }

        ["vim", "vi", "nano"]
            .iter()
            .find(|editor| {
                Command::new("which")
                    .arg(editor)
                    .output()
                    .map(|o| o.status.success())
                    .unwrap_or(false)
            })
            .map(|editor| editor.to_string())
            .ok_or(EditorError::NoEditorFound)
    }
}

impl Editor for SystemEditor {
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError> {
        let editor = Self::find_editor()?;

        let mut file = tempfile::Builder::new()
            .prefix("readiness-review-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(render_with_help(initial, comment_help).as_bytes())?;
        file.flush()?;

        // Closes the handle but keeps the file until `path` drops
        let path = file.into_temp_path();

        // Support editor commands with arguments, e.g. "code --wait"
        let mut parts = editor.split_whitespace();
        let cmd = parts.next().ok_or(EditorError::NoEditorFound)?;

        let status = Command::new(cmd)
            .args(parts)
            .arg(&path)
            .status()
            .map_err(|e| EditorError::EditorFailed(e.to_string()))?;

        if !status.success() {
            return Err(EditorError::EditorFailed(format!(
                "{} exited with status: {}",
                cmd, status
            )));
        }

        let edited = strip_comments(&fs::read_to_string(&path)?);
        if edited.is_empty() {
            return Err(EditorError::EmptyDocument);
        }
        Ok(edited)
    }
}

fn render_with_help(initial: &str, comment_help: &str) -> String {
    let mut content = String::new();
    for line in comment_help.lines() {
        content.push_str("# ");
        content.push_str(line);
        content.push('\n');
    }
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(initial);
    content.push('\n');
    content
}

/// Drop `#` lines and surrounding whitespace.
pub fn strip_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
