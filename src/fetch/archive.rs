use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::FetchError;

/// The World Bank bundles name their data file `API_<indicator>_DS2_...csv`;
/// the other entries are metadata.
pub const DATA_ENTRY_PREFIX: &str = "API";

/// Pull the first entry whose name starts with `prefix` out of a ZIP payload
/// and decode it as UTF-8 text.
pub fn extract_entry(bytes: &[u8], prefix: &str) -> Result<String, FetchError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let index = (0..archive.len())
        .find(|&i| {
            archive
                .by_index(i)
                .map(|entry| entry.name().starts_with(prefix))
                .unwrap_or(false)
        })
        .ok_or_else(|| FetchError::MissingEntry {
            prefix: prefix.to_string(),
        })?;

    let mut entry = archive.by_index(index)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
