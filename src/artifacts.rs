// src/artifacts.rs
// Locating hvigor build outputs under a project directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

/// A located (or expected-but-missing) build artifact.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub path: String,
    pub exists: bool,
    // Serialized as explicit nulls when the artifact is missing, so the
    // payload shape stays constant for clients
    pub size_bytes: Option<u64>,
    pub modified_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_mode: Option<String>,
}

/// Find the signed HAP a hvigor module build produces.
///
/// DevEco Studio's standard layout is
/// `{module}/build/{product}/outputs/{product}/{module}-{product}-signed.hap`;
/// a few older/alternate layouts are probed as fallbacks. When nothing
/// exists, the standard path is reported with `exists: false` so callers can
/// tell the user where the artifact was expected.
pub fn find_hap_output(
    project_dir: &Path,
    module: &str,
    build_mode: &str,
    product: &str,
) -> BuildOutput {
    let signed_name = format!("{}-{}-signed.hap", module, product);
    let module_build = project_dir.join(module).join("build");

    let standard_path = module_build
        .join(product)
        .join("outputs")
        .join(product)
        .join(&signed_name);

    let alternative_paths = [
        // Layout keyed by build mode instead of product
        module_build
            .join(product)
            .join("outputs")
            .join(build_mode)
            .join(&signed_name),
        // Layout without a product level
        module_build
            .join("outputs")
            .join(format!("{}-signed.hap", module)),
        module_build
            .join("outputs")
            .join(build_mode)
            .join(format!("{}-signed.hap", module)),
        // Legacy layout
        module_build
            .join("outputs")
            .join("hap")
            .join(build_mode)
            .join(format!("{}.hap", module)),
    ];

    if standard_path.exists() {
        return describe(&standard_path, Some(module), product, build_mode);
    }
    for alt in &alternative_paths {
        if alt.exists() {
            return describe(alt, Some(module), product, build_mode);
        }
    }

    BuildOutput {
        path: standard_path.to_string_lossy().into_owned(),
        exists: false,
        size_bytes: None,
        modified_time: None,
        module: Some(module.to_string()),
        product: Some(product.to_string()),
        build_mode: Some(build_mode.to_string()),
    }
}

/// Find the signed APP package a project-level hvigor build produces.
/// The file name carries the app name, so each candidate directory is
/// scanned for matching suffixes and the newest match wins.
pub fn find_app_output(project_dir: &Path, build_mode: &str, product: &str) -> BuildOutput {
    let signed_suffix = format!("-{}-signed.app", product);
    let candidates = [
        (
            project_dir.join("build").join(product).join("outputs").join(product),
            Some(signed_suffix.as_str()),
        ),
        (
            project_dir
                .join("build")
                .join(product)
                .join("outputs")
                .join(build_mode),
            Some(signed_suffix.as_str()),
        ),
        (
            project_dir.join("build").join("outputs").join("app").join(build_mode),
            None, // any *.app
        ),
    ];

    for (dir, suffix) in &candidates {
        if let Some(latest) = newest_match(dir, suffix.as_deref()) {
            return describe(&latest, None, product, build_mode);
        }
    }

    let expected = project_dir
        .join("build")
        .join(product)
        .join("outputs")
        .join(product)
        .join("app-signed.app");
    BuildOutput {
        path: expected.to_string_lossy().into_owned(),
        exists: false,
        size_bytes: None,
        modified_time: None,
        module: None,
        product: Some(product.to_string()),
        build_mode: Some(build_mode.to_string()),
    }
}

/// Newest regular file in `dir` whose name matches the suffix (or any
/// `*.app` when no suffix is given).
fn newest_match(dir: &Path, suffix: Option<&str>) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let matches = match suffix {
            Some(suffix) => name.ends_with(suffix),
            None => name.ends_with(".app"),
        };
        if !matches {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        if best.as_ref().is_none_or(|(t, _)| mtime > *t) {
            best = Some((mtime, path));
        }
    }

    best.map(|(_, path)| path)
}

fn describe(path: &Path, module: Option<&str>, product: &str, build_mode: &str) -> BuildOutput {
    let metadata = fs::metadata(path).ok();
    let size_bytes = metadata.as_ref().map(|m| m.len());
    let modified_time = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .map(|t| DateTime::<Local>::from(t).to_rfc3339());

    BuildOutput {
        path: path.to_string_lossy().into_owned(),
        exists: true,
        size_bytes,
        modified_time,
        module: module.map(str::to_string),
        product: Some(product.to_string()),
        build_mode: Some(build_mode.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_hap_standard_path() {
        let dir = tempfile::tempdir().unwrap();
        let hap = dir
            .path()
            .join("entry/build/default/outputs/default/entry-default-signed.hap");
        fs::create_dir_all(hap.parent().unwrap()).unwrap();
        fs::write(&hap, b"hap-bytes").unwrap();

        let output = find_hap_output(dir.path(), "entry", "debug", "default");
        assert!(output.exists);
        assert_eq!(output.path, hap.to_string_lossy());
        assert_eq!(output.size_bytes, Some(9));
        assert!(output.modified_time.is_some());
        assert_eq!(output.module.as_deref(), Some("entry"));
    }

    #[test]
    fn test_hap_legacy_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let hap = dir.path().join("entry/build/outputs/hap/release/entry.hap");
        fs::create_dir_all(hap.parent().unwrap()).unwrap();
        fs::write(&hap, b"x").unwrap();

        let output = find_hap_output(dir.path(), "entry", "release", "default");
        assert!(output.exists);
        assert_eq!(output.path, hap.to_string_lossy());
    }

    #[test]
    fn test_hap_missing_reports_standard_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = find_hap_output(dir.path(), "entry", "debug", "default");
        assert!(!output.exists);
        assert!(output.path.ends_with("entry-default-signed.hap"));
        assert!(output.size_bytes.is_none());
    }

    #[test]
    fn test_app_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("build/default/outputs/default");
        fs::create_dir_all(&outputs).unwrap();
        let older = outputs.join("Old-default-signed.app");
        let newer = outputs.join("New-default-signed.app");
        fs::write(&older, b"a").unwrap();
        fs::write(&newer, b"b").unwrap();
        // Ensure distinct mtimes regardless of filesystem resolution
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let file = fs::File::options().write(true).open(&older).unwrap();
        file.set_modified(past).unwrap();

        let output = find_app_output(dir.path(), "debug", "default");
        assert!(output.exists);
        assert_eq!(output.path, newer.to_string_lossy());
    }

    #[test]
    fn test_app_any_suffix_fallback_dir() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("build/outputs/app/debug");
        fs::create_dir_all(&outputs).unwrap();
        let app = outputs.join("whatever.app");
        fs::write(&app, b"x").unwrap();

        let output = find_app_output(dir.path(), "debug", "default");
        assert!(output.exists);
        assert_eq!(output.path, app.to_string_lossy());
    }

    #[test]
    fn test_app_missing_reports_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = find_app_output(dir.path(), "debug", "default");
        assert!(!output.exists);
        assert!(output.path.ends_with("app-signed.app"));
    }
}
