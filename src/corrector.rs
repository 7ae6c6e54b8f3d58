use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use filetime::FileTime;

use crate::date::{guess, DateCandidates, DateSource};
use crate::metadata::{self, MetadataBackend};

pub const EDIT_DIR: &str = "EDIT";
pub const ERROR_DIR: &str = "ERROR";
const EDIT_SUFFIX: &str = "_edit";

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub corrected: u64,
    pub failed: u64,
}

/// `<dir>/EDIT/<stem>_edit<ext>` next to the input file.
pub fn edited_path(input: &Path) -> Result<PathBuf> {
    let dir = input
        .parent()
        .context("input file has no parent directory")?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("non-UTF-8 file name: {}", input.display()))?;
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{EDIT_SUFFIX}.{ext}"),
        None => format!("{stem}{EDIT_SUFFIX}"),
    };
    Ok(dir.join(EDIT_DIR).join(name))
}

/// `<dir>/ERROR/<original name>`.
pub fn error_path(input: &Path) -> Result<PathBuf> {
    let dir = input
        .parent()
        .context("input file has no parent directory")?;
    let name = input.file_name().context("input path has no file name")?;
    Ok(dir.join(ERROR_DIR).join(name))
}

/// Correct one photo: resolve its date, write a corrected copy into `EDIT/`,
/// and stamp the copy's filesystem times. The original is never modified.
/// Returns the resolved date and where it came from.
pub fn correct_file(
    input: &Path,
    backend: &dyn MetadataBackend,
) -> Result<(NaiveDateTime, DateSource)> {
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("non-UTF-8 file name: {}", input.display()))?;

    let candidates = DateCandidates {
        origin: backend.origin_date(),
        filename: guess::date_from_filename(filename)?,
        digitized: backend.digitized_date(),
        taken: backend.taken_date(),
    };
    let Some((date, source)) = candidates.resolve() else {
        bail!("no usable date in metadata or filename");
    };

    let dest = edited_path(input)?;
    let edit_dir = dest
        .parent()
        .context("edited path has no parent directory")?;
    fs::create_dir_all(edit_dir)
        .with_context(|| format!("creating {}", edit_dir.display()))?;
    fs::copy(input, &dest)
        .with_context(|| format!("copying to {}", dest.display()))?;

    let written = backend
        .write_dates(&dest, date)
        .and_then(|()| set_file_dates(&dest, date));
    if let Err(e) = written {
        // Don't leave a half-written copy behind.
        fs::remove_file(&dest).ok();
        return Err(e);
    }

    Ok((date, source))
}

/// Stamp atime and mtime on the corrected copy. Creation time is not
/// portably settable on Unix. No-op if the copy does not exist yet.
fn set_file_dates(dest: &Path, date: NaiveDateTime) -> Result<()> {
    if !dest.exists() {
        return Ok(());
    }
    // EXIF datetimes are local time; convert to a UTC epoch for the fs.
    // A DST-ambiguous time stamps the earlier instant; a nonexistent one
    // (spring-forward gap) leaves the times alone rather than failing the
    // whole file.
    let Some(local) = date.and_local_timezone(chrono::Local).earliest() else {
        return Ok(());
    };
    let ft = FileTime::from_unix_time(local.timestamp(), 0);
    filetime::set_file_times(dest, ft, ft)
        .with_context(|| format!("setting file times on {}", dest.display()))
}

fn process_one(path: &Path, backend_kind: &str) -> Result<(NaiveDateTime, DateSource)> {
    let is_image = mime_guess::from_path(path)
        .first()
        .map_or(false, |mime| mime.type_() == mime_guess::mime::IMAGE);
    if !is_image {
        bail!("not an image file");
    }
    // Backend lives for exactly one file and is dropped on every exit path.
    let backend = metadata::open_backend(backend_kind, path)?;
    correct_file(path, backend.as_ref())
}

/// Process every file directly inside `dir`, one at a time. Subdirectories
/// are not entered, so `EDIT/` and `ERROR/` from earlier runs are left
/// alone. A failing file is moved to `ERROR/` and the batch continues.
pub fn process_directory(
    dir: &Path,
    backend_kind: &str,
    report: &dyn Fn(u64, u64, &str),
) -> Result<BatchSummary> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    let total = files.len() as u64;
    let mut summary = BatchSummary::default();

    for (i, path) in files.iter().enumerate() {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        match process_one(path, backend_kind) {
            Ok((date, source)) => {
                summary.corrected += 1;
                report(i as u64, total, &format!("{name}: corrected to {date} (from {source})"));
            }
            Err(e) => {
                summary.failed += 1;
                report(i as u64, total, &format!("{name}: {e:#}; moving to {ERROR_DIR}/"));
                if let Err(e) = move_to_error(path) {
                    report(i as u64, total, &format!("{name}: {e:#}"));
                }
            }
        }
    }

    Ok(summary)
}

fn move_to_error(input: &Path) -> Result<()> {
    let dest = error_path(input)?;
    let error_dir = dest
        .parent()
        .context("error path has no parent directory")?;
    fs::create_dir_all(error_dir)
        .with_context(|| format!("creating {}", error_dir.display()))?;
    fs::rename(input, &dest)
        .with_context(|| format!("moving {} to {}", input.display(), dest.display()))
}
