//! JSON diagnostics sidecar for a processed document.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::params::ProcessingParams;
use crate::core::processing::pipeline::{CroppedPage, PageRunAccumulator};
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    /// 1-based page numbers worth a manual look.
    pub blank_candidates: Vec<usize>,
    pub cropped_pages: Vec<CroppedPage>,
    pub uncropped_pages: usize,
    /// Sum of encoded page image sizes.
    pub image_bytes: u64,
    pub output_bytes: u64,
    pub params: ProcessingParams,
}

impl DocumentReport {
    pub fn from_run(
        input: &Path,
        output: &Path,
        page_count: usize,
        run: &PageRunAccumulator,
        output_bytes: u64,
        params: &ProcessingParams,
    ) -> Self {
        let cropped_pages = run.cropped_pages().to_vec();
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            created_at: Utc::now(),
            page_count,
            blank_candidates: run.blank_candidates().iter().copied().collect(),
            uncropped_pages: page_count.saturating_sub(cropped_pages.len()),
            cropped_pages,
            image_bytes: run.estimated_bytes(),
            output_bytes,
            params: params.clone(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Created report sidecar: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::pipeline::BlankReason;

    #[test]
    fn test_report_reflects_run() {
        let mut run = PageRunAccumulator::new();
        run.record_crop(1, 100, 150, 90);
        run.flag_blank(2, BlankReason::SparseInterior);
        run.add_encoded_bytes(1234);
        let params = ProcessingParams::default();
        let report = DocumentReport::from_run(Path::new("in"), Path::new("out.pdf"), 2, &run, 4000, &params);
        assert_eq!(report.blank_candidates, vec![2]);
        assert_eq!(report.uncropped_pages, 1);
        assert_eq!(report.image_bytes, 1234);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["cropped_pages"][0]["width"], 100);
    }
}
