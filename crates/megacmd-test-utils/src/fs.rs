// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Local filesystem helpers for preparing and inspecting test trees.
//!
//! Absent paths are not errors here: removing, clearing or listing something
//! that does not exist is a no-op (or an empty listing). Every other I/O
//! failure is returned to the caller.

use filetime::FileTime;
use fs_extra::dir::CopyOptions;
use glob::Pattern;
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Remove a single file if it exists.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Remove a directory tree or a file, whichever `path` is.
pub fn remove_if_exists(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Empty an existing directory, keeping the directory itself.
///
/// Anything that is not an existing directory is left alone.
pub fn clear_dir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        fs::remove_dir_all(path)?;
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Create `path` and any missing parents unless it already exists.
pub fn make_dir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Copy the regular files of `origin` whose names match `pattern` into `dest`.
pub fn copy_by_file_pattern(
    origin: impl AsRef<Path>,
    pattern: &str,
    dest: impl AsRef<Path>,
) -> io::Result<()> {
    let dest = dest.as_ref();
    for entry in matching_entries(origin.as_ref(), pattern)? {
        if entry.is_file() {
            copy_file_into(&entry, dest)?;
        }
    }
    Ok(())
}

/// Copy the entries of `origin` whose names match `pattern` into `dest`.
///
/// Files are copied directly; directories are copied as whole subtrees.
pub fn copy_by_pattern(
    origin: impl AsRef<Path>,
    pattern: &str,
    dest: impl AsRef<Path>,
) -> io::Result<()> {
    let dest = dest.as_ref();
    for entry in matching_entries(origin.as_ref(), pattern)? {
        if entry.is_dir() {
            copy_folder(&entry, dest)?;
        } else {
            copy_file_into(&entry, dest)?;
        }
    }
    Ok(())
}

/// Copy the tree at `origin` to `dest/<name of origin>`.
///
/// Fails if the target already exists.
pub fn copy_folder(origin: impl AsRef<Path>, dest: impl AsRef<Path>) -> io::Result<()> {
    let origin = origin.as_ref();
    let dest = dest.as_ref();
    let name = origin.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot copy {}: no final path segment", origin.display()),
        )
    })?;

    let target = dest.join(name);
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        ));
    }

    fs::create_dir_all(dest)?;
    // fs_extra returns its own error type; map it to io::Error for callers.
    fs_extra::dir::copy(origin, dest, &CopyOptions::new()).map_err(io::Error::other)?;
    copy_times_recursive(origin, &target)
}

fn matching_entries(origin: &Path, pattern: &str) -> io::Result<Vec<std::path::PathBuf>> {
    let pattern = Pattern::new(pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut matches = Vec::new();
    for entry in fs::read_dir(origin)? {
        let entry = entry?;
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            matches.push(entry.path());
        }
    }
    Ok(matches)
}

/// Copy one file into a directory, keeping permissions and timestamps.
fn copy_file_into(src: &Path, dest_dir: &Path) -> io::Result<()> {
    let target = match src.file_name() {
        Some(name) if dest_dir.is_dir() => dest_dir.join(name),
        _ => dest_dir.to_path_buf(),
    };
    fs::copy(src, &target)?;
    copy_times(src, &target)
}

fn copy_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
}

fn copy_times_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).contents_first(true) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        copy_times(entry.path(), &dst.join(rel))?;
    }
    Ok(())
}

/// Value of an environment variable, if set and valid Unicode.
pub fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Value of an environment variable, or an empty string.
pub fn env_or_empty(name: &str) -> String {
    env_var(name).unwrap_or_default()
}

/// Sort newline-separated lines by their raw bytes.
///
/// Accepts text or bytes alike; the result is always text.
pub fn sort_lines(text: impl AsRef<[u8]>) -> String {
    let mut lines: Vec<&[u8]> = text.as_ref().split(|&b| b == b'\n').collect();
    lines.sort_unstable();
    String::from_utf8_lossy(&lines.join(&b'\n')).into_owned()
}

/// Recursive listing of `root`, one entry per line.
///
/// The first line is `.` (or `prefix`, when one is given), followed by every
/// entry below `root` in depth-first order, each as its path relative to
/// `root` joined onto `prefix`. Iteration order within a directory is whatever
/// the filesystem yields. A missing `root` gives an empty string; a plain file
/// gives just `prefix`.
pub fn find(root: impl AsRef<Path>, prefix: &str) -> io::Result<String> {
    let root = root.as_ref();
    if !root.exists() {
        debug!("file not found in find: {}", root.display());
        return Ok(String::new());
    }
    if !root.is_dir() {
        return Ok(prefix.to_string());
    }

    let entry_prefix = match prefix {
        "" | "." => String::new(),
        p if p.ends_with('/') => p.to_string(),
        p => format!("{}/", p),
    };

    let mut listing = if prefix.is_empty() {
        ".".to_string()
    } else {
        prefix.to_string()
    };

    for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(root).map_err(io::Error::other)?;
        listing.push('\n');
        listing.push_str(&entry_prefix);
        listing.push_str(&slash_path(rel));
    }

    Ok(listing.trim().to_string())
}

/// Immediate children of `root`, one per line, after a leading `.` line.
///
/// Every line, the last included, ends with a newline. A missing `root` gives
/// an empty string.
pub fn ls(root: impl AsRef<Path>, prefix: &str) -> io::Result<String> {
    let root = root.as_ref();
    if !root.exists() {
        debug!("file not found in ls: {}", root.display());
        return Ok(String::new());
    }

    let mut listing = String::from(".\n");
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        listing.push_str(prefix);
        listing.push_str(&entry.file_name().to_string_lossy());
        listing.push('\n');
    }
    Ok(listing)
}

/// Create `path` if needed and set its access and modification times.
///
/// `times` is `(accessed, modified)`; `None` means now.
pub fn touch(path: impl AsRef<Path>, times: Option<(FileTime, FileTime)>) -> io::Result<()> {
    let path = path.as_ref();
    OpenOptions::new().append(true).create(true).open(path)?;
    let (atime, mtime) = times.unwrap_or_else(|| {
        let now = FileTime::now();
        (now, now)
    });
    filetime::set_file_times(path, atime, mtime)
}

/// Replace the whole content of `path` with `text`.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> io::Result<()> {
    fs::write(path, text)
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(listing: &str) -> Vec<&str> {
        let mut v: Vec<&str> = listing.lines().collect();
        v.sort_unstable();
        v
    }

    fn sample_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        fs::create_dir_all(a.join("b")).unwrap();
        fs::write(a.join("b").join("c"), b"c").unwrap();
        fs::write(a.join("d"), b"d").unwrap();
        tmp
    }

    #[test]
    fn test_find_with_dot_prefix() {
        let tmp = sample_tree();
        let listing = find(tmp.path().join("a"), ".").unwrap();
        assert_eq!(listing.lines().next(), Some("."));
        assert_eq!(lines(&listing), vec![".", "b", "b/c", "d"]);
    }

    #[test]
    fn test_find_with_named_prefix() {
        let tmp = sample_tree();
        let listing = find(tmp.path().join("a"), "a").unwrap();
        assert_eq!(lines(&listing), vec!["a", "a/b", "a/b/c", "a/d"]);

        let slashed = find(tmp.path().join("a"), "a/").unwrap();
        assert_eq!(lines(&slashed), vec!["a/", "a/b", "a/b/c", "a/d"]);
    }

    #[test]
    fn test_find_empty_prefix_uses_dot_marker() {
        let tmp = sample_tree();
        let listing = find(tmp.path().join("a"), "").unwrap();
        assert_eq!(lines(&listing), vec![".", "b", "b/c", "d"]);
    }

    #[test]
    fn test_find_directory_before_its_children() {
        let tmp = sample_tree();
        let listing = find(tmp.path().join("a"), ".").unwrap();
        let order: Vec<&str> = listing.lines().collect();
        let b = order.iter().position(|l| *l == "b").unwrap();
        let bc = order.iter().position(|l| *l == "b/c").unwrap();
        assert!(b < bc);
    }

    #[test]
    fn test_find_missing_and_file_roots() {
        let tmp = sample_tree();
        assert_eq!(find(tmp.path().join("nope"), ".").unwrap(), "");
        assert_eq!(find(tmp.path().join("a").join("d"), "d").unwrap(), "d");
    }

    #[test]
    fn test_ls_lists_immediate_children() {
        let tmp = sample_tree();
        let listing = ls(tmp.path().join("a"), "").unwrap();
        assert!(listing.starts_with(".\n"));
        assert!(listing.ends_with('\n'));
        assert_eq!(lines(&listing), vec![".", "b", "d"]);

        let prefixed = ls(tmp.path().join("a"), "x/").unwrap();
        assert_eq!(lines(&prefixed), vec![".", "x/b", "x/d"]);

        assert_eq!(ls(tmp.path().join("nope"), "").unwrap(), "");
    }

    #[test]
    fn test_clear_dir() {
        let tmp = sample_tree();
        let a = tmp.path().join("a");
        clear_dir(&a).unwrap();
        assert!(a.is_dir());
        assert_eq!(fs::read_dir(&a).unwrap().count(), 0);

        clear_dir(tmp.path().join("missing")).unwrap();
        assert!(!tmp.path().join("missing").exists());
    }

    #[test]
    fn test_clear_dir_leaves_files_alone() {
        let tmp = sample_tree();
        let file = tmp.path().join("a").join("d");
        clear_dir(&file).unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"d");
    }

    #[test]
    fn test_remove_helpers() {
        let tmp = sample_tree();
        let a = tmp.path().join("a");

        remove_file_if_exists(a.join("d")).unwrap();
        assert!(!a.join("d").exists());
        remove_file_if_exists(a.join("d")).unwrap();

        remove_dir_if_exists(a.join("b")).unwrap();
        assert!(!a.join("b").exists());
        remove_dir_if_exists(a.join("b")).unwrap();

        fs::write(a.join("f"), b"f").unwrap();
        remove_if_exists(a.join("f")).unwrap();
        remove_if_exists(&a).unwrap();
        assert!(!a.exists());
        remove_if_exists(&a).unwrap();
    }

    #[test]
    fn test_make_dir_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let deep = tmp.path().join("x").join("y").join("z");
        make_dir(&deep).unwrap();
        assert!(deep.is_dir());
        make_dir(&deep).unwrap();
    }

    #[test]
    fn test_copy_by_pattern_mirrors_matches() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(src.join("file_dir").join("inner")).unwrap();
        fs::write(src.join("file_dir").join("inner").join("deep.txt"), b"deep").unwrap();
        fs::write(src.join("file1.txt"), b"one").unwrap();
        fs::write(src.join("other.txt"), b"other").unwrap();
        fs::create_dir_all(src.join("skip_dir")).unwrap();
        fs::create_dir_all(&dst).unwrap();

        copy_by_pattern(&src, "file*", &dst).unwrap();

        assert_eq!(fs::read(dst.join("file1.txt")).unwrap(), b"one");
        assert_eq!(
            fs::read(dst.join("file_dir").join("inner").join("deep.txt")).unwrap(),
            b"deep"
        );
        assert!(!dst.join("other.txt").exists());
        assert!(!dst.join("skip_dir").exists());
        assert_eq!(
            lines(&find(&dst, ".").unwrap()),
            vec![".", "file1.txt", "file_dir", "file_dir/inner", "file_dir/inner/deep.txt"]
        );
    }

    #[test]
    fn test_copy_by_file_pattern_skips_directories() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(src.join("sub.txt")).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        fs::write(src.join("b.dat"), b"b").unwrap();
        fs::create_dir_all(&dst).unwrap();

        copy_by_file_pattern(&src, "*.txt", &dst).unwrap();

        assert!(dst.join("a.txt").is_file());
        assert!(!dst.join("b.dat").exists());
        assert!(!dst.join("sub.txt").exists());
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        touch(src.join("old.txt"), Some((old, old))).unwrap();

        copy_by_file_pattern(&src, "old.txt", &dst).unwrap();

        let meta = fs::metadata(dst.join("old.txt")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
    }

    #[test]
    fn test_copy_folder_refuses_existing_target() {
        let tmp = sample_tree();
        let dst = tmp.path().join("dst");
        copy_folder(tmp.path().join("a"), &dst).unwrap();
        assert!(dst.join("a").join("b").join("c").is_file());
        assert!(copy_folder(tmp.path().join("a"), &dst).is_err());
    }

    #[test]
    fn test_sort_lines() {
        assert_eq!(sort_lines("b\na\nc"), "a\nb\nc");
        assert_eq!(sort_lines(b"b\nB\na".as_slice()), "B\na\nb");
        assert_eq!(sort_lines("only"), "only");
        assert_eq!(sort_lines("z\n"), "\nz");
    }

    #[test]
    fn test_touch_creates_and_sets_times() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("t");
        touch(&path, None).unwrap();
        assert!(path.is_file());

        fs::write(&path, b"keep").unwrap();
        let when = FileTime::from_unix_time(1_500_000_000, 0);
        touch(&path, Some((when, when))).unwrap();
        let meta = fs::metadata(&path).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), when);
        assert_eq!(fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn test_touch_without_times_moves_to_now() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stale");
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        touch(&path, Some((old, old))).unwrap();

        touch(&path, None).unwrap();

        let meta = fs::metadata(&path).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert!(mtime > old, "mtime {mtime:?} should be later than {old:?}");
        assert!(mtime.unix_seconds() > 1_600_000_000);
    }

    #[test]
    fn test_write_text_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w");
        write_text(&path, "a much longer first version").unwrap();
        write_text(&path, "short").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_env_lookup_defaults() {
        assert_eq!(env_var("MEGACMD_TEST_UTILS_SURELY_UNSET"), None);
        assert_eq!(env_or_empty("MEGACMD_TEST_UTILS_SURELY_UNSET"), "");
    }
}
