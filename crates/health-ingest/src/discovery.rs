//! Locating export sources under a base directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use health_model::SourceKind;

use crate::error::{IngestError, Result};

/// File name prefix of ECG session exports.
pub const ECG_FILE_PREFIX: &str = "ecg_";

/// File extension of ECG session exports.
pub const ECG_FILE_EXTENSION: &str = "csv";

/// Read buffer capacity for multi-gigabyte exports.
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Opens `path` for buffered streaming reads.
pub(crate) fn open_buffered(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    Ok(BufReader::with_capacity(READ_BUFFER_BYTES, file))
}

/// Where each export source is expected to live.
///
/// Defaults to the conventional names under a base directory; any source can
/// be pointed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocations {
    export_xml: PathBuf,
    clinical_document: PathBuf,
    electrocardiograms: PathBuf,
}

impl SourceLocations {
    /// Conventional locations relative to `base`.
    pub fn under(base: &Path) -> Self {
        Self {
            export_xml: base.join(SourceKind::ExportXml.relative_path()),
            clinical_document: base.join(SourceKind::ClinicalDocument.relative_path()),
            electrocardiograms: base.join(SourceKind::Electrocardiograms.relative_path()),
        }
    }

    /// Replaces the location of one source.
    #[must_use]
    pub fn with_path(mut self, kind: SourceKind, path: PathBuf) -> Self {
        *self.slot_mut(kind) = path;
        self
    }

    pub fn path(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::ExportXml => &self.export_xml,
            SourceKind::ClinicalDocument => &self.clinical_document,
            SourceKind::Electrocardiograms => &self.electrocardiograms,
        }
    }

    /// Returns the location if the source exists with the expected kind
    /// (a file for XML exports, a directory for ECG sessions).
    pub fn resolve(&self, kind: SourceKind) -> Option<&Path> {
        let path = self.path(kind);
        let present = if kind.is_directory() {
            path.is_dir()
        } else {
            path.is_file()
        };
        present.then_some(path)
    }

    fn slot_mut(&mut self, kind: SourceKind) -> &mut PathBuf {
        match kind {
            SourceKind::ExportXml => &mut self.export_xml,
            SourceKind::ClinicalDocument => &mut self.clinical_document,
            SourceKind::Electrocardiograms => &mut self.electrocardiograms,
        }
    }
}

/// Lists `ecg_*.csv` files in a directory.
///
/// Returns files sorted by filename.
pub fn list_ecg_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_ecg_file_name(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

fn is_ecg_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let extension = path.extension().and_then(|ext| ext.to_str());
    name.starts_with(ECG_FILE_PREFIX) && extension == Some(ECG_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in &[
            "ecg_2024-02-01.csv",
            "ecg_2023-01-15.csv",
            "ecg_notes.txt",
            "summary.csv",
            "ECG_2023-05-05.csv",
        ] {
            std::fs::write(dir.path().join(name), "Name,Test\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("ecg_archive.csv")).unwrap();
        dir
    }

    #[test]
    fn test_list_ecg_files() {
        let dir = create_test_dir();
        let files = list_ecg_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["ecg_2023-01-15.csv", "ecg_2024-02-01.csv"]);
    }

    #[test]
    fn test_list_ecg_files_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("ecg_1.csv");
        std::fs::write(&file_path, "data").unwrap();
        assert!(matches!(
            list_ecg_files(&file_path),
            Err(IngestError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_checks_kind() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("export.xml"), "<HealthData/>").unwrap();
        std::fs::create_dir(dir.path().join("export_cda.xml")).unwrap();
        let locations = SourceLocations::under(dir.path());
        assert!(locations.resolve(SourceKind::ExportXml).is_some());
        assert!(locations.resolve(SourceKind::ClinicalDocument).is_none());
        assert!(locations.resolve(SourceKind::Electrocardiograms).is_none());
    }

    #[test]
    fn test_with_path_overrides_location() {
        let locations = SourceLocations::under(Path::new("/exports"))
            .with_path(SourceKind::Electrocardiograms, PathBuf::from("/elsewhere/ecg"));
        assert_eq!(
            locations.path(SourceKind::Electrocardiograms),
            Path::new("/elsewhere/ecg")
        );
        assert_eq!(
            locations.path(SourceKind::ExportXml),
            Path::new("/exports/export.xml")
        );
    }
}
