//! File-system helpers for the output tree: emptying it and copying assets
//! and static files into it unmodified.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove everything inside `dir`, creating it when missing.
pub fn empty_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

/// Recursively copy `src` into `dest`, returning the number of files copied.
///
/// `dest` is created if needed; existing files are overwritten.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;

    fs::create_dir_all(dest)?;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy the named files from `root` into `dest` when they exist.
///
/// Returns the number of files copied; missing files are skipped.
pub fn copy_static_files(root: &Path, names: &[String], dest: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for name in names {
        let source = root.join(name);
        if !source.is_file() {
            continue;
        }

        fs::copy(&source, dest.join(name))?;
        tracing::debug!("Copied {}", name);
        copied += 1;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empties_existing_dir() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("dist");
        fs::create_dir_all(out.join("old/nested")).unwrap();
        fs::write(out.join("stale.html"), "old").unwrap();
        fs::write(out.join("old/nested/page.html"), "old").unwrap();

        empty_dir(&out).unwrap();

        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn creates_missing_dir() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("a/b/dist");

        empty_dir(&out).unwrap();

        assert!(out.is_dir());
    }

    #[test]
    fn copies_tree() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("assets");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::create_dir_all(src.join("js")).unwrap();
        fs::write(src.join("css/main.css"), "body {}").unwrap();
        fs::write(src.join("js/theme.js"), "//").unwrap();

        let dest = temp.path().join("dist/assets");
        let copied = copy_dir(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("css/main.css")).unwrap(), "body {}");
        assert!(dest.join("js/theme.js").is_file());
    }

    #[test]
    fn skips_missing_static_files() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("dist");
        fs::create_dir_all(&dest).unwrap();
        fs::write(temp.path().join("CNAME"), "book.example.org").unwrap();

        let names = vec![
            "CNAME".to_string(),
            "robots.txt".to_string(),
            ".nojekyll".to_string(),
        ];
        let copied = copy_static_files(temp.path(), &names, &dest).unwrap();

        assert_eq!(copied, 1);
        assert_eq!(fs::read_to_string(dest.join("CNAME")).unwrap(), "book.example.org");
        assert!(!dest.join("robots.txt").exists());
    }
}
