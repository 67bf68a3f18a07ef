use crate::files::write_dicom_atomically;
use crate::ledger::{Ledger, LedgerRow};
use crate::report::{FileError, Stage, StageReport};
use crate::tags;
use dicom_core::VR;
use dicom_core::value::PrimitiveValue;
use dicom_object::mem::InMemElement;
use dicom_object::{DefaultDicomObject, open_file};
use log::warn;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Sets the Patient ID of `obj` to `id`.
///
/// An existing Patient ID keeps its VR, a missing one is added as `LO`.
pub(crate) fn set_subject_id(obj: &mut DefaultDicomObject, id: &str) {
    let vr = obj
        .element(tags::PATIENT_ID)
        .map(|elem| elem.vr())
        .unwrap_or(VR::LO);
    obj.put(InMemElement::new(
        tags::PATIENT_ID,
        vr,
        PrimitiveValue::from(id),
    ));
}

/// Relabels and renames the files in `working_dir` according to `ledger`, row by row.
///
/// Files that are missing or cannot be decoded or written are reported and skipped. Nothing
/// done for earlier rows is rolled back.
pub fn relabel<P: AsRef<Path>>(working_dir: P, ledger: &Ledger) -> StageReport {
    let working_dir = working_dir.as_ref();
    let mut report = StageReport::new(Stage::Relabel);
    for row in ledger.rows() {
        let result = relabel_file(working_dir, row);
        report.record(&row.original_file_name, result);
    }
    report
}

/// Sets the Patient ID of the file named by `row` to its surrogate id and renames the file to
/// `<surrogate id>.<original extension>`.
///
/// The original file is deleted once the relabeled file has been written, unless both have the
/// same path. Failing to delete it is only logged, the relabeled file counts.
pub fn relabel_file(working_dir: &Path, row: &LedgerRow) -> Result<PathBuf, FileError> {
    let source = working_dir.join(&row.original_file_name);
    if !source.is_file() {
        return Err(FileError::MissingFile(row.original_file_name.clone()));
    }

    let mut obj = open_file(&source).map_err(|e| FileError::Decode(e.to_string()))?;
    set_subject_id(&mut obj, row.surrogate_id.as_ref());

    // the prefix may contain dots, so the extension is appended rather than set
    let mut target_name = OsString::from(row.surrogate_id.as_ref());
    if let Some(extension) = source.extension() {
        target_name.push(".");
        target_name.push(extension);
    }
    let target = working_dir.join(target_name);

    write_dicom_atomically(&target, &obj)?;
    if target != source {
        if let Err(e) = fs::remove_file(&source) {
            warn!("relabeled {} but unable to remove it: {e}", source.display());
        }
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::OriginalSubject;
    use dicom_core::header::Header;
    use crate::test_utils::write_dicom_file;
    use tempfile::TempDir;

    fn ledger(file_names: &[&str]) -> Ledger {
        Ledger::assign(
            file_names.iter().map(|s| s.to_string()).collect(),
            &"PFX".parse().unwrap(),
            1,
            |_| OriginalSubject::Unknown,
        )
    }

    fn patient_id(path: &Path) -> String {
        open_file(path)
            .unwrap()
            .element(tags::PATIENT_ID)
            .unwrap()
            .to_str()
            .unwrap()
            .trim_end_matches(['\0', ' '])
            .to_string()
    }

    #[test]
    fn test_relabel_renames_and_deletes() {
        let dir = TempDir::new().unwrap();
        write_dicom_file(&dir.path().join("a.DCM"), Some("203087"));

        let report = relabel(dir.path(), &ledger(&["a.DCM"]));

        assert_eq!(report.succeeded(), 1);
        let target = dir.path().join("PFX_00001.DCM");
        assert_eq!(report.outcomes()[0].result, Ok(target.clone()));
        assert_eq!(patient_id(&target), "PFX_00001");
        assert!(!dir.path().join("a.DCM").exists());
    }

    #[test]
    fn test_relabel_adds_missing_patient_id() {
        let dir = TempDir::new().unwrap();
        write_dicom_file(&dir.path().join("a.dcm"), None);

        let report = relabel(dir.path(), &ledger(&["a.dcm"]));

        assert_eq!(report.succeeded(), 1);
        let obj = open_file(dir.path().join("PFX_00001.dcm")).unwrap();
        let elem = obj.element(tags::PATIENT_ID).unwrap();
        assert_eq!(elem.vr(), VR::LO);
    }

    #[test]
    fn test_relabel_same_name_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PFX_00001.dcm");
        write_dicom_file(&path, Some("203087"));

        let report = relabel(dir.path(), &ledger(&["PFX_00001.dcm"]));

        assert_eq!(report.succeeded(), 1);
        assert!(path.exists());
        assert_eq!(patient_id(&path), "PFX_00001");
    }

    #[test]
    fn test_relabel_prefix_with_dot() {
        let dir = TempDir::new().unwrap();
        write_dicom_file(&dir.path().join("a.dcm"), Some("1"));
        let ledger = Ledger::assign(vec!["a.dcm".into()], &"site.3".parse().unwrap(), 1, |_| {
            OriginalSubject::Unknown
        });

        let report = relabel(dir.path(), &ledger);

        assert_eq!(report.succeeded(), 1);
        assert!(dir.path().join("site.3_00001.dcm").exists());
    }

    #[test]
    fn test_relabel_missing_file() {
        let dir = TempDir::new().unwrap();
        write_dicom_file(&dir.path().join("b.dcm"), Some("2"));

        let report = relabel(dir.path(), &ledger(&["a.dcm", "b.dcm"]));

        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            report.outcomes()[0].result,
            Err(FileError::MissingFile("a.dcm".into()))
        );
        assert!(dir.path().join("PFX_00002.dcm").exists());
    }

    #[test]
    fn test_relabel_undecodable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.dcm");
        fs::write(&path, b"not a DICOM file").unwrap();

        let report = relabel(dir.path(), &ledger(&["a.dcm"]));

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcomes()[0].result,
            Err(FileError::Decode(_))
        ));
        // the file is left as is
        assert!(path.exists());
        assert!(!dir.path().join("PFX_00001.dcm").exists());
    }
}
