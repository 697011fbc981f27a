//! Seams between the engine and its collaborators.
//!
//! The engine never shells out or reads tool output directly; it goes through
//! [`ToolInvoker`] and [`ReportParser`] so tests can substitute both.

use super::report::Report;
use crate::error::InvokeResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One run of the scanning tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Rendered argument string (placeholders already filled in).
    pub args: String,
    /// Address handed to the tool as its final argument.
    pub target: String,
    /// Folder receiving the tool's output files.
    pub output_folder: PathBuf,
    /// Base file name, without extension.
    pub output_file: String,
}

impl Invocation {
    /// Path prefix the tool writes its outputs under.
    pub fn output_base(&self) -> PathBuf {
        self.output_folder.join(&self.output_file)
    }
}

/// Runs the external scanning tool.
///
/// Implementations may block for the full duration of the scan; they must
/// only block the calling task.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Executable name or path, for logs.
    fn tool(&self) -> &str;

    /// Run the tool to completion. Non-zero exits are errors.
    async fn invoke(&self, invocation: &Invocation) -> InvokeResult<()>;
}

/// Turns tool output into a [`Report`].
pub trait ReportParser: Send + Sync {
    /// File this parser reads for an invocation written under `output_base`.
    fn report_path(&self, output_base: &Path) -> PathBuf;

    /// Parse a report. `None` means no structured data was available, which
    /// callers treat as zero discovered hosts.
    fn parse(&self, path: &Path) -> Option<Report>;
}
