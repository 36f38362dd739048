//! Snapshot Writer
//!
//! Writes target groups in the JSON layout Prometheus reads through
//! `file_sd_configs`. The file is replaced atomically: the snapshot is written
//! to a temporary file next to the destination and renamed over it, so a reader
//! sees either the previous snapshot or the new one in full.

use crate::discovery::TargetGroup;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `groups` with 4-space indentation
pub fn render(groups: &[TargetGroup]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    groups
        .serialize(&mut serializer)
        .context("Failed to serialize target groups")?;
    buf.push(b'\n');
    Ok(buf)
}

/// Replace the contents of `path` with `groups`
pub fn write_snapshot(path: &Path, groups: &[TargetGroup]) -> Result<()> {
    let content = render(groups)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(&content)
        .context("Failed to write snapshot")?;
    file.as_file()
        .sync_all()
        .context("Failed to flush snapshot")?;

    // Temporary files are created owner-only; the scraping system usually runs
    // as another user.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .context("Failed to set snapshot permissions")?;
    }

    file.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::TargetLabels;

    fn group(family: &str, targets: &[&str]) -> TargetGroup {
        TargetGroup {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            labels: TargetLabels {
                family: family.to_string(),
            },
        }
    }

    #[test]
    fn test_render_layout() {
        let rendered = render(&[group("web", &["10.0.0.5:9090"])]).unwrap();
        let expected = concat!(
            "[\n",
            "    {\n",
            "        \"targets\": [\n",
            "            \"10.0.0.5:9090\"\n",
            "        ],\n",
            "        \"labels\": {\n",
            "            \"family\": \"web\"\n",
            "        }\n",
            "    }\n",
            "]\n",
        );
        assert_eq!(String::from_utf8(rendered).unwrap(), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]).unwrap(), b"[]\n");
    }

    #[test]
    fn test_write_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.json");
        std::fs::write(&path, "stale contents that are much longer than the new snapshot").unwrap();

        write_snapshot(&path, &[group("api", &["10.0.1.1:8080", "10.0.1.2:8080"])]).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([{
                "targets": ["10.0.1.1:8080", "10.0.1.2:8080"],
                "labels": {"family": "api"}
            }])
        );

        // Only the destination remains; the temporary file was renamed
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.json");
        write_snapshot(&path, &[]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("targets.json");

        let err = write_snapshot(&path, &[]).unwrap_err();
        assert!(err.to_string().contains("Failed to create temporary file"));
        assert!(!path.exists());
    }
}
