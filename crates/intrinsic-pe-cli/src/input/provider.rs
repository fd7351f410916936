use std::path::{Path, PathBuf};

use intrinsic_pe_core::metrics::{MetricsProvider, RawMetrics};
use intrinsic_pe_core::{ValuationError, ValuationResult};

use super::file;

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Serves `<dir>/<SYMBOL>.json` (or `.yaml`/`.yml`) as raw metrics.
#[derive(Debug, Clone)]
pub struct DirectoryMetricsProvider {
    dir: PathBuf,
}

impl DirectoryMetricsProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn locate(&self, symbol: &str) -> Option<PathBuf> {
        let stem = symbol.trim().to_ascii_uppercase();
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl MetricsProvider for DirectoryMetricsProvider {
    fn fetch(&self, symbol: &str) -> ValuationResult<RawMetrics> {
        let path = self
            .locate(symbol)
            .ok_or_else(|| ValuationError::MissingInput {
                field: "symbol".into(),
                sentinel: format!("no metrics file for {symbol} in {}", self.dir.display()),
            })?;
        tracing::debug!(%symbol, path = %path.display(), "loading metrics");
        file::read_input(&path_str(&path)).map_err(|e| ValuationError::Serialization(e.to_string()))
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intrinsic_pe_core::error::ErrorKind;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ipe-provider-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fetch_by_uppercased_symbol() {
        let dir = temp_dir("hit");
        std::fs::write(
            dir.join("HAVELLS.json"),
            r#"{ "company_name": "Havells India", "current_pe": "68.2" }"#,
        )
        .unwrap();
        let provider = DirectoryMetricsProvider::new(&dir);
        let raw = provider.fetch("havells").unwrap();
        assert_eq!(raw.company_name, "Havells India");
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unknown_symbol_is_missing_input() {
        let dir = temp_dir("miss");
        let err = DirectoryMetricsProvider::new(&dir).fetch("TCS").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Missing);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let dir = temp_dir("bad");
        std::fs::write(dir.join("BAD.json"), "{ not json").unwrap();
        let err = DirectoryMetricsProvider::new(&dir).fetch("bad").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        std::fs::remove_dir_all(dir).ok();
    }
}
