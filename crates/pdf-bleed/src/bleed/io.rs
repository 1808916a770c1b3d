//! Document I/O for callers working with files

use crate::types::*;
use std::path::Path;

/// Read a document's bytes from disk
pub async fn load_pdf_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(bytes)
}

/// Write corrected document bytes to disk
pub async fn save_pdf_bytes(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    Ok(())
}
