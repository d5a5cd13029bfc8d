use crate::utils::error::{Result, ViewerError};
use std::io::Cursor;
use zip::ZipArchive;

/// 確認上傳的 ZIP 內含指定的 entrypoint（例如 `assembly/main.iam`）
pub fn ensure_entrypoint(content: &[u8], entrypoint: &str) -> Result<()> {
    let archive = ZipArchive::new(Cursor::new(content))?;
    let wanted = normalize(entrypoint);

    if archive.file_names().any(|name| normalize(name) == wanted) {
        return Ok(());
    }

    Err(ViewerError::invalid_request(format!(
        "entrypoint '{}' was not found in the uploaded archive ({} entries)",
        entrypoint,
        archive.len()
    )))
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}
