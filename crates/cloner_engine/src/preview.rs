use std::io::Write;
use std::path::Path;

use tempfile::{Builder, TempPath};

use crate::PersistError;

const PREVIEW_PREFIX: &str = "cloned-website-";
const PREVIEW_SUFFIX: &str = ".html";

/// Stages `html` as a standalone document in the system temp dir so a browser can open it.
///
/// The file lives as long as the returned [`TempPath`].
pub fn stage_preview_document(html: &str) -> Result<TempPath, PersistError> {
    stage_preview_document_in(&std::env::temp_dir(), html)
}

pub fn stage_preview_document_in(dir: &Path, html: &str) -> Result<TempPath, PersistError> {
    let mut file = Builder::new()
        .prefix(PREVIEW_PREFIX)
        .suffix(PREVIEW_SUFFIX)
        .tempfile_in(dir)?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}
