//! Implementation of `berth editor-config`.
//!
//! Collects the `include` directories of cached packages named in a
//! requirements file and merges them into an editor's C/C++ configuration
//! document (`c_cpp_properties.json` layout).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::core::requirement::Requirement;
use crate::util::fs::{read_to_string, slash_path, write_string};

/// `name/version[@qualifier]` on a line of its own.
static REQUIREMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_.+-]+/[A-Za-z0-9_.+-]+(?:@[A-Za-z0-9_.+/-]+)?)\s*$")
        .expect("requirement pattern is valid")
});

const INCLUDE_DIR_NAME: &str = "include";

/// Placeholder the editor expands to its built-in include path.
const DEFAULT_INCLUDE: &str = "${default}";

/// Extract requirements from a requirements file.
///
/// Section headers, comments and anything else that is not a bare
/// `name/version[@qualifier]` line are ignored.
pub fn parse_requirements(text: &str) -> Vec<Requirement> {
    text.lines()
        .filter_map(|line| REQUIREMENT_LINE.captures(line))
        .filter_map(|caps| caps[1].parse::<Requirement>().ok())
        .collect()
}

/// First `include` directory under `cache_root/name/version`, in sorted
/// walk order.
pub fn find_include_dir(cache_root: &Path, requirement: &Requirement) -> Option<PathBuf> {
    let package_dir = cache_root.join(&requirement.name).join(&requirement.version);
    if !package_dir.is_dir() {
        return None;
    }

    WalkDir::new(&package_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_dir() && e.file_name() == INCLUDE_DIR_NAME)
        .map(|e| e.into_path())
}

/// Every `include` directory under `root`, sorted.
pub fn scan_include_dirs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::debug!("extra include root {} does not exist", root.display());
        return Vec::new();
    }

    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == INCLUDE_DIR_NAME)
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    dirs
}

/// Configuration name the editor uses for the host platform.
fn host_configuration_name() -> &'static str {
    if cfg!(windows) {
        "Win32"
    } else if cfg!(target_os = "macos") {
        "Mac"
    } else {
        "Linux"
    }
}

/// A fresh configuration document.
pub fn default_document() -> Value {
    json!({
        "configurations": [
            {
                "name": host_configuration_name(),
                "includePath": [DEFAULT_INCLUDE]
            }
        ],
        "version": 4
    })
}

/// Comparison key for include entries.
fn normalize_entry(entry: &str) -> String {
    let slashed = entry.replace('\\', "/");
    let trimmed = slashed.trim_end_matches('/');
    if trimmed.is_empty() {
        slashed
    } else {
        trimmed.to_string()
    }
}

/// Append `paths` to the first configuration's `includePath`.
///
/// Existing entries are kept as they are. A new path is skipped when it
/// matches an existing entry or an earlier new path.
pub fn merge_include_paths(document: Option<Value>, paths: &[PathBuf]) -> Result<Value> {
    let mut document = document.unwrap_or_else(default_document);

    let Some(root) = document.as_object_mut() else {
        bail!("editor configuration must be a JSON object");
    };

    let configurations = root
        .entry("configurations")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(configurations) = configurations.as_array_mut() else {
        bail!("`configurations` must be an array");
    };
    if configurations.is_empty() {
        configurations.push(json!({ "name": host_configuration_name() }));
    }

    let Some(first) = configurations[0].as_object_mut() else {
        bail!("`configurations[0]` must be an object");
    };
    let include_path = first
        .entry("includePath")
        .or_insert_with(|| json!([DEFAULT_INCLUDE]));
    let Some(include_path) = include_path.as_array_mut() else {
        bail!("`configurations[0].includePath` must be an array");
    };

    let mut seen: Vec<String> = include_path
        .iter()
        .filter_map(Value::as_str)
        .map(normalize_entry)
        .collect();

    for path in paths {
        let entry = slash_path(path);
        let key = normalize_entry(&entry);
        if seen.contains(&key) {
            tracing::debug!("include path already present: {}", entry);
            continue;
        }
        seen.push(key);
        include_path.push(Value::String(entry));
    }

    Ok(document)
}

/// Build the merged editor configuration.
///
/// Reads the requirements file, looks each requirement up in
/// `cache_root`, adds every include directory under `extra_roots`, and
/// merges the result into the document at `output_path` if one exists.
/// Nothing is written.
pub fn generate(
    requirements_path: &Path,
    cache_root: &Path,
    extra_roots: &[PathBuf],
    output_path: &Path,
) -> Result<Value> {
    let text = read_to_string(requirements_path)?;
    let requirements = parse_requirements(&text);
    tracing::debug!(
        "{} requirements in {}",
        requirements.len(),
        requirements_path.display()
    );

    let mut paths = Vec::new();
    for requirement in &requirements {
        match find_include_dir(cache_root, requirement) {
            Some(dir) => paths.push(dir),
            None => tracing::warn!(
                "no include directory for {} under {}",
                requirement,
                cache_root.display()
            ),
        }
    }

    for root in extra_roots {
        paths.extend(scan_include_dirs(root));
    }

    let existing = if output_path.is_file() {
        let content = read_to_string(output_path)?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse editor configuration: {}", output_path.display()))?;
        Some(value)
    } else {
        None
    };

    merge_include_paths(existing, &paths)
}

/// Write `document` with two-space indentation.
pub fn write_document(path: &Path, document: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(document).context("failed to serialize editor configuration")?;
    write_string(path, &format!("{}\n", json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn include_path(doc: &Value) -> Vec<String> {
        doc["configurations"][0]["includePath"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_requirements() {
        let text = "\
[requires]
expat/2.4.8
openexr/3.1.5@studio/stable
# pystring/1.1.3

[generators]
CMakeDeps
not a requirement/1.0
";
        let reqs = parse_requirements(text);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0], Requirement::new("expat", "2.4.8"));
        assert_eq!(reqs[1].channel.as_deref(), Some("studio/stable"));
    }

    #[test]
    fn test_find_include_dir() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("expat/2.4.8");
        fs::create_dir_all(pkg.join("package/b/include")).unwrap();
        fs::create_dir_all(pkg.join("package/a/include")).unwrap();

        let found = find_include_dir(tmp.path(), &Requirement::new("expat", "2.4.8")).unwrap();
        assert_eq!(found, pkg.join("package/a/include"));

        assert!(find_include_dir(tmp.path(), &Requirement::new("expat", "9.9.9")).is_none());
    }

    #[test]
    fn test_scan_include_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("z/include")).unwrap();
        fs::create_dir_all(tmp.path().join("a/1/include")).unwrap();
        fs::create_dir_all(tmp.path().join("a/lib")).unwrap();

        assert_eq!(
            scan_include_dirs(tmp.path()),
            vec![tmp.path().join("a/1/include"), tmp.path().join("z/include")]
        );
        assert!(scan_include_dirs(&tmp.path().join("missing")).is_empty());
    }

    #[test]
    fn test_merge_into_new_document() {
        let doc = merge_include_paths(None, &[PathBuf::from("/cache/expat/include")]).unwrap();
        assert_eq!(doc["version"], 4);
        assert_eq!(doc["configurations"][0]["name"], host_configuration_name());
        assert_eq!(include_path(&doc), vec!["${default}", "/cache/expat/include"]);
    }

    #[test]
    fn test_merge_skips_duplicates_and_keeps_existing() {
        let existing = json!({
            "configurations": [{
                "name": "Win32",
                "includePath": ["${default}", "C:\\cache\\expat\\include", "${workspaceFolder}/include"],
                "defines": ["_DEBUG"]
            }],
            "version": 4
        });
        let paths = vec![
            PathBuf::from("C:/cache/expat/include/"),
            PathBuf::from("C:/cache/pystring/include"),
            PathBuf::from("C:/cache/pystring/include"),
        ];

        let doc = merge_include_paths(Some(existing), &paths).unwrap();
        assert_eq!(
            include_path(&doc),
            vec![
                "${default}",
                "C:\\cache\\expat\\include",
                "${workspaceFolder}/include",
                "C:/cache/pystring/include"
            ]
        );
        assert_eq!(doc["configurations"][0]["defines"][0], "_DEBUG");
    }

    #[test]
    fn test_merge_rejects_malformed_document() {
        assert!(merge_include_paths(Some(json!([])), &[]).is_err());
        assert!(merge_include_paths(Some(json!({"configurations": {}})), &[]).is_err());
    }

    #[test]
    fn test_generate_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(cache.join("expat/2.4.8/p/include")).unwrap();
        let extra = tmp.path().join("short");
        fs::create_dir_all(extra.join("x1/p/include")).unwrap();

        let requirements = tmp.path().join("conanfile.txt");
        fs::write(&requirements, "[requires]\nexpat/2.4.8\nmissing/1.0\n").unwrap();
        let output = tmp.path().join(".vscode/c_cpp_properties.json");

        let doc = generate(&requirements, &cache, &[extra.clone()], &output).unwrap();
        assert_eq!(
            include_path(&doc),
            vec![
                "${default}".to_string(),
                slash_path(&cache.join("expat/2.4.8/p/include")),
                slash_path(&extra.join("x1/p/include")),
            ]
        );
        assert!(!output.exists());

        // Regenerating over the written document adds nothing
        write_document(&output, &doc).unwrap();
        let again = generate(&requirements, &cache, &[extra], &output).unwrap();
        assert_eq!(again, doc);
        assert!(fs::read_to_string(&output).unwrap().contains("\n  \"configurations\""));
    }
}
