//! Recursive directory conversion.
//!
//! The driver is written against the [`Workspace`] trait so that the batch
//! logic (matching, output naming, overwrite policy, failure isolation) can be
//! exercised without touching the disk. [`FsWorkspace`] is the real
//! filesystem implementation.
//!
//! ```text
//! run_batch(root)
//!  └─ workspace.files(root)          sorted, recursive
//!       └─ for each matching input
//!            ├─ read                 Io error  → Failed
//!            ├─ convert              Convert   → Failed
//!            └─ write sibling        Io error  → Failed
//!                                    ok        → Converted
//! ```

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::convert::convert;
use crate::error::BatchError;
use crate::format::Format;

/// Minimal file access needed by [`run_batch`].
pub trait Workspace {
    /// Every file below `root`, recursively, in a stable order.
    fn files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of `path`. Implementations must not leave a
    /// partially written file behind on failure.
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// [`Workspace`] backed by the local filesystem.
///
/// Writes go to a hidden temporary sibling which is then renamed over the
/// destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWorkspace;

impl FsWorkspace {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                Self::walk(&path, out)?;
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl Workspace for FsWorkspace {
    fn files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        Self::walk(root, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(contents)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Settings for one [`run_batch`] invocation.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub from: Format,
    pub to: Format,
    /// Input file extensions, without the leading dot. Matched exactly.
    pub extensions: Vec<String>,
    /// Replace outputs that already exist. When `false` such inputs are skipped.
    pub overwrite: bool,
    /// Convert and report, but write nothing.
    pub dry_run: bool,
    /// Stop at the first failing file instead of continuing with the rest.
    pub fail_fast: bool,
}

impl BatchOptions {
    pub fn new(from: Format, to: Format) -> Self {
        Self {
            from,
            to,
            extensions: from
                .input_extensions()
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            overwrite: true,
            dry_run: false,
            fail_fast: false,
        }
    }

    /// Replace the extension list. Leading dots are stripped.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    /// Sibling path the converted document for `input` is written to.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(self.to.extension())
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new(Format::Yaml, Format::Toml)
    }
}

/// Why an input was left unconverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The output exists and overwriting is off.
    OutputExists,
    /// Source and target extensions coincide, so the output is the input.
    OutputIsInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::OutputExists => "already exists",
            SkipReason::OutputIsInput => "would overwrite its input",
        })
    }
}

/// Progress notifications emitted by [`run_batch`], one per matching input.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Converted {
        input: &'a Path,
        output: &'a Path,
    },
    Skipped {
        input: &'a Path,
        output: &'a Path,
        reason: SkipReason,
    },
    Failed {
        input: &'a Path,
        error: &'a BatchError,
    },
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output paths that were written (or would have been, in dry-run mode).
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<BatchError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert every matching file below `root`, writing each result next to its
/// input.
///
/// A failing file never prevents the others from being converted unless
/// `options.fail_fast` is set. Only a failure to enumerate `root` itself is
/// returned as `Err`.
pub fn run_batch<W, F>(
    workspace: &mut W,
    root: &Path,
    options: &BatchOptions,
    mut on_event: F,
) -> Result<BatchReport, BatchError>
where
    W: Workspace + ?Sized,
    F: FnMut(BatchEvent<'_>),
{
    let files = workspace.files(root).map_err(|source| BatchError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    info!(root = %root.display(), files = files.len(), "scanning");

    let mut report = BatchReport::default();
    for input in files.iter().filter(|path| options.matches(path)) {
        let output = options.output_path(input);

        let skip = if output == *input {
            Some(SkipReason::OutputIsInput)
        } else if !options.overwrite && workspace.exists(&output) {
            Some(SkipReason::OutputExists)
        } else {
            None
        };
        if let Some(reason) = skip {
            debug!(input = %input.display(), %reason, "skipping");
            on_event(BatchEvent::Skipped {
                input,
                output: &output,
                reason,
            });
            report.skipped.push(output);
            continue;
        }

        match convert_file(workspace, input, &output, options) {
            Ok(()) => {
                debug!(input = %input.display(), output = %output.display(), "converted");
                on_event(BatchEvent::Converted {
                    input,
                    output: &output,
                });
                report.converted.push(output);
            }
            Err(error) => {
                warn!(input = %input.display(), %error, "conversion failed");
                on_event(BatchEvent::Failed {
                    input,
                    error: &error,
                });
                report.failed.push(error);
                if options.fail_fast {
                    break;
                }
            }
        }
    }
    Ok(report)
}

fn convert_file<W: Workspace + ?Sized>(
    workspace: &mut W,
    input: &Path,
    output: &Path,
    options: &BatchOptions,
) -> Result<(), BatchError> {
    let source = workspace.read(input).map_err(|source| BatchError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let converted =
        convert(&source, options.from, options.to).map_err(|source| BatchError::Convert {
            path: input.to_path_buf(),
            source,
        })?;
    if !options.dry_run {
        workspace
            .write(output, &converted)
            .map_err(|source| BatchError::Io {
                path: output.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}
