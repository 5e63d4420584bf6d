// ─── Archive Extraction ───
// Blocking helpers; async callers run them on `spawn_blocking`.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::core::error::{LauncherError, LauncherResult};

fn extraction_error(archive: &Path, message: impl ToString) -> LauncherError {
    LauncherError::Extraction {
        archive: archive.to_path_buf(),
        message: message.to_string(),
    }
}

/// Drop `strip` leading components; refuse anything that is not a plain
/// relative path. `None` means "nothing left after stripping".
fn stripped_path(archive: &Path, entry: &Path, strip: usize) -> LauncherResult<Option<PathBuf>> {
    let mut rel = PathBuf::new();
    for component in entry.components().skip(strip) {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            _ => {
                return Err(extraction_error(
                    archive,
                    format!("entry escapes target: {}", entry.display()),
                ))
            }
        }
    }
    Ok((!rel.as_os_str().is_empty()).then_some(rel))
}

fn create_dir(path: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract every file of a zip archive into `dest`, overwriting existing files.
/// Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path, strip: usize) -> LauncherResult<usize> {
    let zip_file = File::open(archive_path).map_err(|source| LauncherError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive =
        zip::ZipArchive::new(zip_file).map_err(|e| extraction_error(archive_path, e))?;

    create_dir(dest)?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut zipped = archive
            .by_index(index)
            .map_err(|e| extraction_error(archive_path, e))?;

        let enclosed = zipped.enclosed_name().ok_or_else(|| {
            extraction_error(archive_path, format!("invalid entry path: {}", zipped.name()))
        })?;
        let Some(rel_path) = stripped_path(archive_path, &enclosed, strip)? else {
            continue;
        };

        let out_path = dest.join(rel_path);
        if zipped.is_dir() {
            create_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            create_dir(parent)?;
        }

        let mut out = File::create(&out_path).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|e| extraction_error(archive_path, e))?;
        written += 1;
    }

    Ok(written)
}

/// Extract a `.tar.gz` into `dest`, stripping `strip` leading components.
/// Returns the number of entries unpacked.
pub fn extract_tar_gz(archive_path: &Path, dest: &Path, strip: usize) -> LauncherResult<usize> {
    let file = File::open(archive_path).map_err(|source| LauncherError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    create_dir(dest)?;

    let mut written = 0;
    let entries = archive
        .entries()
        .map_err(|e| extraction_error(archive_path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| extraction_error(archive_path, e))?;
        let entry_path = entry
            .path()
            .map_err(|e| extraction_error(archive_path, e))?
            .into_owned();

        let Some(rel_path) = stripped_path(archive_path, &entry_path, strip)? else {
            continue;
        };

        let out_path = dest.join(rel_path);
        if let Some(parent) = out_path.parent() {
            create_dir(parent)?;
        }
        entry
            .unpack(&out_path)
            .map_err(|e| extraction_error(archive_path, e))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) mod test_archives {
    use std::io::Write;
    use std::path::Path;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    /// Write a zip containing `files` (name, contents).
    pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Gzipped tar bytes containing `files` (name, contents, mode).
    pub fn tar_gz(files: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, contents, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(*mode);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder
                .append_data(&mut header, name, contents.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_archives::{tar_gz, write_zip};
    use super::*;

    #[test]
    fn zip_extracts_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("natives.jar");
        write_zip(
            &archive,
            &[("liblwjgl.so", "elf"), ("META-INF/MANIFEST.MF", "Manifest")],
        );

        let dest = dir.path().join("out");
        assert_eq!(extract_zip(&archive, &dest, 0).unwrap(), 2);
        assert_eq!(std::fs::read(dest.join("liblwjgl.so")).unwrap(), b"elf");
        assert!(dest.join("META-INF/MANIFEST.MF").exists());
    }

    #[test]
    fn zip_strip_drops_top_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("jre.zip");
        write_zip(&archive, &[("jdk-21.0.2+13-jre/bin/java.exe", "exe")]);

        let dest = dir.path().join("java-21");
        extract_zip(&archive, &dest, 1).unwrap();
        assert!(dest.join("bin/java.exe").exists());
    }

    #[test]
    fn corrupt_zip_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.jar");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let err = extract_zip(&archive, &dir.path().join("out"), 0).unwrap_err();
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Extraction);
    }

    #[test]
    fn tar_gz_strip_one_component() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("jre.tar.gz");
        std::fs::write(
            &archive,
            tar_gz(&[
                ("jdk-21.0.2+13-jre/bin/java", "#!java", 0o644),
                ("jdk-21.0.2+13-jre/release", "JAVA_VERSION=\"21\"", 0o644),
            ]),
        )
        .unwrap();

        let dest = dir.path().join("java-21");
        assert_eq!(extract_tar_gz(&archive, &dest, 1).unwrap(), 2);
        assert_eq!(std::fs::read(dest.join("bin/java")).unwrap(), b"#!java");
        assert!(dest.join("release").exists());
    }
}
