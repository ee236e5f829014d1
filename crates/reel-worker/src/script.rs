//! Script loading.

use std::path::Path;

use crate::error::{WorkerError, WorkerResult};

/// A non-empty script line and its segment index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub index: usize,
    pub text: String,
}

/// Trimmed non-empty lines, indexed in order.
pub fn parse_script(content: &str) -> Vec<ScriptLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, text)| ScriptLine {
            index,
            text: text.to_string(),
        })
        .collect()
}

pub async fn read_script(path: &Path) -> WorkerResult<Vec<ScriptLine>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WorkerError::ScriptNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let lines = parse_script(&content);
    if lines.is_empty() {
        return Err(WorkerError::EmptyScript(path.to_path_buf()));
    }
    Ok(lines)
}
