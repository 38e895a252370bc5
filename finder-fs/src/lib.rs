//! Filesystem helpers for the game finder tools, built on `cap-std` and
//! `camino`.
//!
//! Paths given on the command line are resolved through an ambient
//! directory capability: the directory holding the target is opened first
//! and every access goes through it.
#![forbid(unsafe_code)]

use std::{io, io::Read, path::Component};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Open the directory containing `path` and return it with the file name.
fn containing_dir(path: &Utf8Path) -> io::Result<(Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Read a UTF-8 text file such as a GeoJSON export.
///
/// # Errors
/// Fails when the containing directory cannot be opened, the file is
/// missing, or its contents are not valid UTF-8.
pub fn read_text_file(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = containing_dir(path)?;
    let mut file = dir.open(&name)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Whether `path` names an existing regular file.
///
/// A missing file or missing parent directory reports `false`; other
/// failures are returned.
///
/// # Errors
/// Propagates IO errors other than "not found".
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match containing_dir(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(&name) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Create the directory that will hold `path`, such as a database file,
/// when it does not exist yet.
///
/// # Errors
/// Fails when an ancestor cannot be opened or a directory cannot be
/// created.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (anchor, relative) = split_anchor(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    let dir = Dir::open_ambient_dir(&anchor, ambient_authority())?;
    dir.create_dir_all(&relative)
}

/// Split a directory path into the anchor it is resolved from (a root,
/// drive prefix, or the current directory) and the remainder below it.
fn split_anchor(path: &Utf8Path) -> io::Result<(Utf8PathBuf, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let mut components = std_path.components();
    let anchor = match components.next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let root = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR_STR);
            if matches!(components.clone().next(), Some(Component::RootDir)) {
                components.next();
            }
            root
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR),
        _ => {
            return Ok((Utf8PathBuf::from("."), path.to_path_buf()));
        }
    };
    let relative = Utf8PathBuf::from_path_buf(components.as_path().to_path_buf())
        .map_err(|_| io::Error::other("non-UTF-8 directory path"))?;
    Ok((anchor, relative))
}
