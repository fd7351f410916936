use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (chosen by extension) into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_contents(&canonical, &contents)
}

fn parse_contents<T: DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let value: T = if is_yaml(path) {
        serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    } else {
        serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    // Basic existence check
    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intrinsic_pe_core::valuation::ValuationParameters;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ipe-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_yaml_by_extension() {
        let path = temp_file(
            "params.yaml",
            "cost_of_capital: '0.12'\nroce: '0.2'\ngrowth_rate: '0.12'\nhigh_growth_years: 15\nfade_years: 15\nterminal_growth_rate: '0.05'\ntax_rate: '0.25'\n",
        );
        let params: ValuationParameters = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(params, ValuationParameters::default());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_reads_json() {
        let path = temp_file("raw.json", r#"{ "company_name": "X" }"#);
        let value: serde_json::Value = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(value["company_name"], "X");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_error() {
        let result: Result<serde_json::Value, _> = read_input("/definitely/not/here.json");
        assert!(result.is_err());
    }
}
