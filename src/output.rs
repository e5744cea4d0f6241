//! Result naming and delivery

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::intake::base_name;

/// Serialized output of one tool run
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
}

impl ToolResult {
    pub fn new(bytes: Vec<u8>, suggested_filename: impl Into<String>) -> Self {
        Self {
            bytes,
            suggested_filename: suggested_filename.into(),
        }
    }

    /// Write the bytes under the suggested name inside `dir`
    pub async fn deliver(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.suggested_filename);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved result");
        Ok(path)
    }
}

/// `<base>_<suffix>.pdf`
pub fn suffixed_filename(name: &str, suffix: &str) -> String {
    format!("{}_{}.pdf", base_name(name), suffix)
}

/// Name for a merge result, built from the first inputs' names
///
/// One input gives `a_merged.pdf`, two give `a_b_merged.pdf`, and more give
/// `a_b_and_<k>_more_merged.pdf`.
pub fn merged_filename<S: AsRef<str>>(names: &[S]) -> String {
    let bases: Vec<&str> = names.iter().map(|n| base_name(n.as_ref())).collect();
    match bases.as_slice() {
        [] => "merged.pdf".to_string(),
        [only] => format!("{only}_merged.pdf"),
        [first, second] => format!("{first}_{second}_merged.pdf"),
        [first, second, rest @ ..] => format!("{first}_{second}_and_{}_more_merged.pdf", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_filename() {
        assert_eq!(suffixed_filename("report.pdf", "numbered"), "report_numbered.pdf");
        assert_eq!(suffixed_filename("scan", "compressed"), "scan_compressed.pdf");
    }

    #[test]
    fn test_merged_filename() {
        assert_eq!(merged_filename(&["a.pdf"]), "a_merged.pdf");
        assert_eq!(merged_filename(&["a.pdf", "b.pdf"]), "a_b_merged.pdf");
        assert_eq!(merged_filename(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]), "a_b_and_2_more_merged.pdf");
        assert_eq!(merged_filename::<&str>(&[]), "merged.pdf");
    }

    #[tokio::test]
    async fn test_deliver_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        let result = ToolResult::new(b"%PDF-1.5".to_vec(), "a_numbered.pdf");

        let path = result.deliver(&target).await.unwrap();
        assert_eq!(path, target.join("a_numbered.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.5");
    }
}
