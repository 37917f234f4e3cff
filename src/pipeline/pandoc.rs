//! Driving the external parser/serializer: pandoc as a subprocess.
//!
//! pandoc owns the markup syntax on both ends of the pipeline — extended
//! Markdown in, structured JSON tree out, and back again. The call contract
//! is fixed: a non-zero exit surfaces pandoc's stderr verbatim as the
//! failure payload, and a zero exit whose output is not a parseable tree is
//! its own error, distinct from a process failure.

use crate::ast::Doc;
use crate::error::PostError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Parse a Markdown file into a document tree.
///
/// Runs `pandoc --no-highlight -f gfm -t json` with the file on stdin.
pub fn markdown_to_ast(file: &Path) -> Result<Doc, PostError> {
    let source = std::fs::File::open(file).map_err(|e| PostError::Io {
        path: file.to_path_buf(),
        source: e,
    })?;

    let output = Command::new("pandoc")
        .args(["--no-highlight", "-f", "gfm", "-t", "json"])
        .stdin(Stdio::from(source))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| PostError::PandocSpawn { source: e })?;

    if !output.status.success() {
        return Err(PostError::Pandoc {
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    debug!(bytes = output.stdout.len(), "parsed document tree");
    serde_json::from_slice(&output.stdout).map_err(|e| PostError::AstParse {
        detail: e.to_string(),
    })
}

/// Serialize a document tree back into Markdown.
///
/// Runs `pandoc -f json -t gfm` with the tree JSON on stdin.
pub fn ast_to_markdown(doc: &Doc) -> Result<String, PostError> {
    let payload = serde_json::to_vec(doc).map_err(|e| PostError::AstParse {
        detail: e.to_string(),
    })?;

    let mut child = Command::new("pandoc")
        .args(["-f", "json", "-t", "gfm"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PostError::PandocSpawn { source: e })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&payload)
            .map_err(|e| PostError::PandocSpawn { source: e })?;
        // dropping stdin closes the pipe so pandoc sees EOF
    }

    let output = child
        .wait_with_output()
        .map_err(|e| PostError::PandocSpawn { source: e })?;

    if !output.status.success() {
        return Err(PostError::Pandoc {
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
