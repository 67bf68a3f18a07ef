use crate::report::FileError;
use dicom_object::DefaultDicomObject;
use log::warn;
use std::cmp::Ordering;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Lists the names of the regular files directly inside `dir` whose extension matches `extension`
/// (case-insensitively), in natural-sort order.
///
/// The directory is read in file name order, so names with the same sort key always end up in
/// lexical order. Sub directories are not descended into. Entries that cannot be read are skipped with a
/// warning, but failing to read `dir` itself is an error.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
    let dir = dir.as_ref();
    // an unreadable root only shows up as a walkdir entry error, so check it up front
    let _ = dir.read_dir()?;

    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_owned()),
            None => warn!("skipping non UTF-8 file name {}", entry.path().display()),
        }
    }

    natural_sort(&mut names);
    Ok(names)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Sort key of a file name: the first run of ASCII digits without its leading zeros.
///
/// Names without digits get `None`, which orders before every number.
fn sort_key(name: &str) -> Option<&str> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let rest = &name[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(rest[..end].trim_start_matches('0'))
}

fn compare_keys(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        // without leading zeros, a longer digit run is a larger number
        (Some(a), Some(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Sorts file names by the number formed by the first run of digits in each name.
///
/// The sort is stable, so names with the same number keep their relative order.
///
/// # Example
///
/// ```
/// use dicom_deidentify::files::natural_sort;
///
/// let mut names = vec!["img2.dcm".to_string(), "img10.dcm".into(), "img1.dcm".into()];
/// natural_sort(&mut names);
/// assert_eq!(names, ["img1.dcm", "img2.dcm", "img10.dcm"]);
/// ```
pub fn natural_sort(names: &mut [String]) {
    names.sort_by(|a, b| compare_keys(sort_key(a), sort_key(b)));
}

/// Replaces the file at `path` with whatever `write` puts into a temporary file next to it.
///
/// The temporary file is only moved into place when `write` succeeds, so a failure never leaves
/// a partially written file at `path`.
pub fn persist_atomically<F, E>(path: &Path, write: F) -> Result<(), E>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), E>,
    E: From<io::Error>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| E::from(e.error))?;
    Ok(())
}

/// Encodes `obj` as a DICOM file at `path`, atomically.
pub(crate) fn write_dicom_atomically(
    path: &Path,
    obj: &DefaultDicomObject,
) -> Result<(), FileError> {
    persist_atomically(path, |file| {
        obj.write_all(file)
            .map_err(|e| FileError::Encode(e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_natural_sort() {
        let mut names = strings(&["img2.dcm", "img10.dcm", "img1.dcm"]);
        natural_sort(&mut names);
        assert_eq!(names, strings(&["img1.dcm", "img2.dcm", "img10.dcm"]));
    }

    #[test]
    fn test_natural_sort_names_without_digits_first() {
        let mut names = strings(&["scan3.dcm", "b.dcm", "scan1.dcm", "a.dcm"]);
        natural_sort(&mut names);
        assert_eq!(
            names,
            strings(&["b.dcm", "a.dcm", "scan1.dcm", "scan3.dcm"])
        );
    }

    #[test]
    fn test_natural_sort_leading_zeros() {
        let mut names = strings(&["x8.dcm", "x007.dcm", "x0.dcm", "x10.dcm"]);
        natural_sort(&mut names);
        assert_eq!(
            names,
            strings(&["x0.dcm", "x007.dcm", "x8.dcm", "x10.dcm"])
        );
    }

    #[test]
    fn test_natural_sort_ties_keep_order() {
        let mut names = strings(&["b07.dcm", "a7.dcm", "c007_2.dcm", "a1.dcm"]);
        natural_sort(&mut names);
        assert_eq!(
            names,
            strings(&["a1.dcm", "b07.dcm", "a7.dcm", "c007_2.dcm"])
        );
    }

    #[test]
    fn test_natural_sort_huge_numbers() {
        let mut names = strings(&[
            "n100000000000000000000000000001.dcm",
            "n99999999999999999999999999999.dcm",
            "n2.dcm",
        ]);
        natural_sort(&mut names);
        assert_eq!(
            names,
            strings(&[
                "n2.dcm",
                "n99999999999999999999999999999.dcm",
                "n100000000000000000000000000001.dcm",
            ])
        );
    }

    #[test]
    fn test_natural_sort_only_first_digit_run_counts() {
        let mut names = strings(&["s2_img1.dcm", "s1_img9.dcm"]);
        natural_sort(&mut names);
        assert_eq!(names, strings(&["s1_img9.dcm", "s2_img1.dcm"]));
    }

    #[test]
    fn test_list_files() {
        let dir = TempDir::new().unwrap();
        for name in ["img10.dcm", "img2.DCM", "notes.txt", "img1.dcm"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.dcm")).unwrap();
        fs::write(dir.path().join("nested.dcm").join("img0.dcm"), b"").unwrap();

        let names = list_files(dir.path(), "dcm").unwrap();
        assert_eq!(names, strings(&["img1.dcm", "img2.DCM", "img10.dcm"]));
    }

    #[test]
    fn test_list_files_ties_in_name_order() {
        let dir = TempDir::new().unwrap();
        for name in ["c.dcm", "a.dcm", "e.dcm", "b.dcm", "d.dcm"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names = list_files(dir.path(), "dcm").unwrap();
        assert_eq!(
            names,
            strings(&["a.dcm", "b.dcm", "c.dcm", "d.dcm", "e.dcm"])
        );
    }

    #[test]
    fn test_list_files_ties_on_shared_digit_run() {
        let dir = TempDir::new().unwrap();
        // every name sorts by the 01 of the site code
        for name in ["DS01_knee.dcm", "DS01_hip.dcm", "DS01_ankle.dcm", "DS00_wrist.dcm"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names = list_files(dir.path(), "dcm").unwrap();
        assert_eq!(
            names,
            strings(&["DS00_wrist.dcm", "DS01_ankle.dcm", "DS01_hip.dcm", "DS01_knee.dcm"])
        );
    }

    #[test]
    fn test_list_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = list_files(dir.path().join("missing"), "dcm");
        assert!(result.is_err());
    }

    #[test]
    fn test_persist_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"old").unwrap();

        persist_atomically(&path, |file| {
            use std::io::Write;
            file.write_all(b"new")
        })
        .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_persist_atomically_failure_keeps_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"old").unwrap();

        let result: io::Result<()> = persist_atomically(&path, |file| {
            use std::io::Write;
            file.write_all(b"partial")?;
            Err(io::Error::other("encoding failed"))
        });
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"old");
        // the temporary file is cleaned up
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
