//! Locates and extracts the GPIF score document from a `.gpx`/`.gp` ZIP
//! container. Unlike some zipped XML container formats, GPIF carries
//! `score.gpif` directly rather than pointing to it through a manifest
//! rootfile entry, so there is no indirection step to resolve first.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::errors::DecodeError;

const CANDIDATE_PATHS: [&str; 2] = ["score.gpif", "Content/score.gpif"];

/// Open `bytes` as a ZIP archive and return the UTF-8 contents of whichever
/// candidate path is present, searched in `CANDIDATE_PATHS` order.
pub fn load_score_document(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let found_path = CANDIDATE_PATHS
        .iter()
        .find(|&&path| archive.by_name(path).is_ok());

    let path = found_path.ok_or_else(|| {
        DecodeError::InvalidContainer(
            "neither score.gpif nor Content/score.gpif found in archive".to_string(),
        )
    })?;

    let mut entry = archive.by_name(path)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}
