//! Subprocess invoker for nmap.
//!
//! Runs `<tool> <args...> -oA <staging> <target>` and waits for it. Output
//! goes to a per-run staging base in the same folder and is renamed onto
//! `<folder>/<file>.*` once the tool exits cleanly, so a reader never sees a
//! report another run is still writing.
//! The child is killed if the owning task is aborted, so cancelling a worker
//! never leaves an orphaned scan behind.

use super::traits::{Invocation, ToolInvoker};
use crate::error::{InvokeError, InvokeResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Files written by `-oA`.
const OUTPUT_EXTENSIONS: [&str; 3] = ["gnmap", "nmap", "xml"];

fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Unique hidden base next to the final output.
fn staging_base(invocation: &Invocation) -> PathBuf {
    invocation.output_folder.join(format!(
        ".{}.{}",
        invocation.output_file,
        Uuid::new_v4().simple()
    ))
}

/// Move every staged output file onto the final base.
async fn publish(staging: &Path, output_base: &Path) -> InvokeResult<()> {
    for extension in OUTPUT_EXTENSIONS {
        let from = with_extension(staging, extension);
        let to = with_extension(output_base, extension);
        match tokio::fs::rename(&from, &to).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(InvokeError::OutputFolder { path: to, source }),
        }
    }
    Ok(())
}

/// Remove whatever a failed run left under the staging base.
async fn discard(staging: &Path) {
    for extension in OUTPUT_EXTENSIONS {
        let path = with_extension(staging, extension);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove staged output"),
        }
    }
}

/// Invokes the scanning tool as a child process.
#[derive(Debug, Clone)]
pub struct NmapInvoker {
    tool: String,
}

impl NmapInvoker {
    /// Create an invoker for the given executable name or path.
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Full argument vector for an invocation writing under `output_base`.
    pub fn command_args(invocation: &Invocation, output_base: &Path) -> Vec<String> {
        let mut args: Vec<String> = invocation
            .args
            .split_whitespace()
            .map(str::to_string)
            .collect();
        args.push("-oA".to_string());
        args.push(output_base.to_string_lossy().into_owned());
        args.push(invocation.target.clone());
        args
    }
}

impl Default for NmapInvoker {
    fn default() -> Self {
        Self::new("nmap")
    }
}

#[async_trait]
impl ToolInvoker for NmapInvoker {
    fn tool(&self) -> &str {
        &self.tool
    }

    async fn invoke(&self, invocation: &Invocation) -> InvokeResult<()> {
        tokio::fs::create_dir_all(&invocation.output_folder)
            .await
            .map_err(|source| InvokeError::OutputFolder {
                path: invocation.output_folder.clone(),
                source,
            })?;

        let staging = staging_base(invocation);
        let args = Self::command_args(invocation, &staging);
        debug!(tool = %self.tool, args = ?args, "spawning scanner");

        let output = Command::new(&self.tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| InvokeError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            discard(&staging).await;
            return Err(InvokeError::Failed {
                tool: self.tool.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        publish(&staging, &invocation.output_base()).await
    }
}
