//! Gzip tarball sources, downloaded over HTTP(S) or read from disk.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use url::Url;

use crate::core::errors::PackageError;
use crate::sources::{SourceFetcher, SourceSpec};
use crate::util::fs::{ensure_dir, move_dir_contents};
use crate::util::hash::sha256_bytes;

/// Fetches `.tar.gz` archives.
#[derive(Debug, Clone, Default)]
pub struct TarballFetcher;

impl TarballFetcher {
    pub fn new() -> Self {
        TarballFetcher
    }

    fn read_archive(&self, location: &str) -> Result<Vec<u8>> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => download(&url),
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow::anyhow!("invalid file URL: {}", url))?;
                read_local(&path)
            }
            // Bare paths, including Windows drive paths that parse as a scheme
            _ => read_local(Path::new(location)),
        }
    }
}

impl SourceFetcher for TarballFetcher {
    fn describe(&self, spec: &SourceSpec) -> String {
        spec.url.clone()
    }

    fn fetch(&self, spec: &SourceSpec, dest: &Path) -> Result<PathBuf> {
        let fail = |e: anyhow::Error| -> anyhow::Error { PackageError::fetch(&spec.url, format!("{:#}", e)).into() };

        tracing::info!("Fetching tarball from {}", spec.url);
        let data = self.read_archive(&spec.url).map_err(fail)?;

        let actual = sha256_bytes(&data);
        if let Some(expected) = &spec.sha256 {
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(PackageError::fetch(
                    &spec.url,
                    format!("hash mismatch\n  expected: {}\n  actual:   {}", expected, actual),
                )
                .into());
            }
            tracing::debug!("Tarball hash verified: {}", &actual[..16]);
        } else {
            tracing::debug!("Tarball sha256 (not pinned): {}", actual);
        }

        // Extract into a sibling staging directory so a broken archive
        // never leaves a half-populated destination
        let parent = dest.parent().unwrap_or(dest);
        ensure_dir(parent).map_err(fail)?;
        let staging = tempfile::Builder::new()
            .prefix(".berth-extract-")
            .tempdir_in(parent)
            .context("failed to create staging directory")
            .map_err(fail)?;

        extract_tarball(&data, staging.path()).map_err(fail)?;
        move_dir_contents(staging.path(), dest).map_err(fail)?;

        tracing::info!("Extracted tarball to {}", dest.display());
        Ok(dest.to_path_buf())
    }
}

fn download(url: &Url) -> Result<Vec<u8>> {
    // Archives can be large; no overall deadline
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("berth/", env!("CARGO_PKG_VERSION")))
        .timeout(None::<std::time::Duration>)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url.as_str())
        .send()
        .with_context(|| format!("failed to download tarball from {}", url))?;

    if !response.status().is_success() {
        bail!("HTTP {}", response.status());
    }

    let bytes = response.bytes().context("failed to read tarball response body")?;
    Ok(bytes.to_vec())
}

fn read_local(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read archive: {}", path.display()))
}

/// Whether an archive entry path stays inside the extraction directory.
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Extract a gzip-compressed tarball into `dest`.
///
/// Entries that would land outside `dest` are rejected: absolute paths,
/// `..` components, and writes through a symlink that points outside.
/// Hard link targets resolve against `dest`.
pub fn extract_tarball(data: &[u8], dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        if !is_contained(&entry_path) {
            bail!(
                "tarball entry escapes destination directory: {}",
                entry_path.display()
            );
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory
            | tar::EntryType::Regular
            | tar::EntryType::Continuous
            | tar::EntryType::Link => {}
            tar::EntryType::Symlink if cfg!(windows) => {
                tracing::debug!("Skipping symlink on Windows: {}", entry_path.display());
                continue;
            }
            tar::EntryType::Symlink => {}
            // GitHub archives carry a pax global header with the commit id
            tar::EntryType::XGlobalHeader | tar::EntryType::XHeader => continue,
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
                continue;
            }
        }

        let unpacked = entry
            .unpack_in(dest)
            .with_context(|| format!("failed to extract entry: {}", entry_path.display()))?;
        if !unpacked {
            bail!(
                "tarball entry escapes destination directory: {}",
                entry_path.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::make_tarball;
    use tempfile::TempDir;

    #[test]
    fn test_extract_tarball() {
        let data = make_tarball(&[
            ("OpenColorIO-2.1.2/LICENSE", "BSD"),
            ("OpenColorIO-2.1.2/src/OpenColorIO/Op.cpp", "int x;"),
        ]);
        let tmp = TempDir::new().unwrap();
        extract_tarball(&data, tmp.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(tmp.path().join("OpenColorIO-2.1.2/src/OpenColorIO/Op.cpp")).unwrap(),
            "int x;"
        );
    }

    #[test]
    fn test_escaping_entries_are_rejected() {
        assert!(is_contained(Path::new("a/b/c.txt")));
        assert!(is_contained(Path::new("./a")));
        assert!(!is_contained(Path::new("../evil")));
        assert!(!is_contained(Path::new("a/../../evil")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }

    /// A `.tar.gz` whose entries are built by `fill`.
    fn build_tarball(fill: impl FnOnce(&mut tar::Builder<flate2::write::GzEncoder<&mut Vec<u8>>>)) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let encoder = flate2::write::GzEncoder::new(&mut data, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            fill(&mut builder);
            builder.into_inner().unwrap().finish().unwrap();
        }
        data
    }

    fn link_header(kind: tar::EntryType) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(0);
        header.set_mode(0o777);
        header
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_outside_symlink_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let dest = tmp.path().join("dest");

        let data = build_tarball(|builder| {
            builder
                .append_link(&mut link_header(tar::EntryType::Symlink), "pkg/link", &outside)
                .unwrap();
            let content = b"owned";
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, "pkg/link/pwned.txt", &content[..]).unwrap();
        });

        assert!(extract_tarball(&data, &dest).is_err());
        assert!(!outside.join("pwned.txt").exists());
    }

    #[test]
    fn test_hard_links_resolve_inside_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");

        let data = build_tarball(|builder| {
            let content = b"BSD";
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, "pkg/LICENSE", &content[..]).unwrap();
            builder
                .append_link(&mut link_header(tar::EntryType::Link), "pkg/COPYING", "pkg/LICENSE")
                .unwrap();
        });

        extract_tarball(&data, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("pkg/COPYING")).unwrap(), "BSD");
    }

    #[test]
    fn test_fetch_local_archive_with_hash() {
        let tmp = TempDir::new().unwrap();
        let data = make_tarball(&[("OpenColorIO-2.1.2/LICENSE", "BSD")]);
        let archive = tmp.path().join("ocio.tar.gz");
        std::fs::write(&archive, &data).unwrap();

        let spec = SourceSpec::new(archive.to_string_lossy()).with_sha256(sha256_bytes(&data));
        let dest = tmp.path().join("work/src");
        let out = TarballFetcher::new().fetch(&spec, &dest).unwrap();

        assert_eq!(out, dest);
        assert!(dest.join("OpenColorIO-2.1.2/LICENSE").is_file());
        // Staging directory is gone
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("work"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".berth-extract-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_fetch_file_url() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("ocio.tar.gz");
        std::fs::write(&archive, make_tarball(&[("x/README", "hi")])).unwrap();

        let url = Url::from_file_path(&archive).unwrap();
        let dest = tmp.path().join("src");
        TarballFetcher::new().fetch(&SourceSpec::new(url.as_str()), &dest).unwrap();
        assert!(dest.join("x/README").is_file());
    }

    #[test]
    fn test_fetch_errors_are_fetch_errors() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("ocio.tar.gz");
        std::fs::write(&archive, make_tarball(&[("x/README", "hi")])).unwrap();

        let spec = SourceSpec::new(archive.to_string_lossy()).with_sha256("0".repeat(64));
        let err = TarballFetcher::new().fetch(&spec, &tmp.path().join("a")).unwrap_err();
        match err.downcast_ref::<PackageError>() {
            Some(PackageError::Fetch { message, .. }) => assert!(message.contains("hash mismatch")),
            other => panic!("unexpected error: {:?}", other),
        }

        let spec = SourceSpec::new(tmp.path().join("missing.tar.gz").to_string_lossy());
        let err = TarballFetcher::new().fetch(&spec, &tmp.path().join("b")).unwrap_err();
        assert!(matches!(err.downcast_ref::<PackageError>(), Some(PackageError::Fetch { .. })));

        std::fs::write(&archive, b"not a tarball").unwrap();
        let spec = SourceSpec::new(archive.to_string_lossy());
        let err = TarballFetcher::new().fetch(&spec, &tmp.path().join("c")).unwrap_err();
        assert!(matches!(err.downcast_ref::<PackageError>(), Some(PackageError::Fetch { .. })));
    }
}
