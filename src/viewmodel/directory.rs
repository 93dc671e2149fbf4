use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const FITS_EXTENSIONS: &[&str] = &["fits", "fit", "fts", "fz"];

/// A FITS file and the modification time it had when the directory was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

pub fn is_fits_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FITS_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// FITS files in `dir`, oldest first (file name breaks ties).
pub fn scan(dir: &Path) -> io::Result<Vec<FitsEntry>> {
    let mut entries: Vec<FitsEntry> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_fits_file(p))
        .filter_map(|path| {
            let modified = path.metadata().and_then(|m| m.modified()).ok()?;
            Some(FitsEntry { path, modified })
        })
        .collect();
    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(entries)
}

/// Sub-directories and FITS files of `dir`, each sorted by name, for browsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

pub fn list(dir: &Path) -> io::Result<DirListing> {
    let mut listing = DirListing::default();
    for path in std::fs::read_dir(dir)?.flatten().map(|e| e.path()) {
        if path.is_dir() {
            listing.dirs.push(path);
        } else if is_fits_file(&path) {
            listing.files.push(path);
        }
    }
    listing.dirs.sort();
    listing.files.sort();
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_fits_file(Path::new("a.FITS")));
        assert!(is_fits_file(Path::new("b.fit")));
        assert!(is_fits_file(Path::new("c.fz")));
        assert!(!is_fits_file(Path::new("d.png")));
        assert!(!is_fits_file(Path::new("fits")));
    }

    #[test]
    fn scan_orders_by_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(100);
        for (name, age) in [("b.fits", 10), ("a.fits", 50), ("c.fits", 30)] {
            let f = File::create(dir.path().join(name)).unwrap();
            f.set_modified(base + Duration::from_secs(age)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.fits")).unwrap();

        let names: Vec<_> = scan(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.fits", "c.fits", "a.fits"]);
    }

    #[test]
    fn listing_separates_dirs_and_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("night1")).unwrap();
        File::create(dir.path().join("z.fits")).unwrap();
        File::create(dir.path().join("a.fit")).unwrap();
        File::create(dir.path().join("readme.md")).unwrap();
        let listing = list(dir.path()).unwrap();
        assert_eq!(listing.dirs, vec![dir.path().join("night1")]);
        assert_eq!(listing.files, vec![dir.path().join("a.fit"), dir.path().join("z.fits")]);
    }
}
