//! Per-device verification artifacts.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::ReportError;

/// Writes verification output to `<dir>/<device>.txt`.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact for `device`.
    pub fn path_for(&self, device: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", file_stem(device)))
    }

    /// Write every verification command and its output, replacing any
    /// earlier artifact for the device.
    pub fn write(&self, device: &str, captures: &[(String, String)]) -> Result<PathBuf, ReportError> {
        let path = self.path_for(device);
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let file = fs::File::create(&path).map_err(io_err)?;
        let mut out = BufWriter::new(file);

        for (command, output) in captures {
            writeln!(out, "{command}")
                .and_then(|()| writeln!(out, "{output}"))
                .and_then(|()| writeln!(out))
                .map_err(io_err)?;
        }
        out.flush().map_err(io_err)?;

        debug!("wrote {} verification output(s) to {}", captures.len(), path.display());
        Ok(path)
    }
}

/// Device names are hostnames or addresses; anything else is replaced so
/// the name stays a single path component. A replaced name gets a digest
/// of the original appended, so `a/b` and `a_b` get different files.
fn file_stem(device: &str) -> String {
    let stem: String = device
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if stem == device {
        return stem;
    }

    let mut hasher = Sha256::new();
    hasher.update(device.as_bytes());
    let digest = hasher.finalize();
    let suffix: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{stem}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("verify"));

        let captures = vec![(
            "show vlan brief".to_string(),
            "10   users    active    Gi0/1".to_string(),
        )];
        let path = writer.write("10.0.0.1", &captures).unwrap();

        assert_eq!(path, dir.path().join("verify").join("10.0.0.1.txt"));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "show vlan brief\n10   users    active    Gi0/1\n\n");
    }

    #[test]
    fn test_rewrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        writer
            .write("sw1", &[("show clock".to_string(), "old".to_string())])
            .unwrap();
        let path = writer
            .write("sw1", &[("show clock".to_string(), "new".to_string())])
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("new"));
        assert!(!contents.contains("old"));
    }

    #[test]
    fn test_file_stem_keeps_single_component() {
        assert_eq!(file_stem("core-sw1.example.net"), "core-sw1.example.net");
        assert!(file_stem("fe80::1").starts_with("fe80__1-"));
        assert!(file_stem("../etc/passwd").starts_with(".._etc_passwd-"));
        assert!(!file_stem("../etc/passwd").contains('/'));
    }

    #[test]
    fn test_replaced_names_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        assert_ne!(writer.path_for("a/b"), writer.path_for("a_b"));
        assert_ne!(writer.path_for("fe80::1"), writer.path_for("fe80__1"));
        assert_eq!(writer.path_for("a_b"), dir.path().join("a_b.txt"));

        let slashed = writer.write("a/b", &[("show clock".to_string(), "one".to_string())]).unwrap();
        let plain = writer.write("a_b", &[("show clock".to_string(), "two".to_string())]).unwrap();
        assert!(fs::read_to_string(slashed).unwrap().contains("one"));
        assert!(fs::read_to_string(plain).unwrap().contains("two"));
    }
}
