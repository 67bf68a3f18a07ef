use crate::Anonymizer;
use crate::files::{list_files, write_dicom_atomically};
use crate::relabel::set_subject_id;
use crate::report::{FileError, Stage, StageReport};
use dicom_object::open_file;
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Copies the files of `input_dir` with the given extension into `working_dir`.
///
/// With `stamp_file_names`, the Patient ID of every copy is set to its file name stem. The input
/// directory is only read.
///
/// # Errors
///
/// Fails when `working_dir` cannot be created or `input_dir` cannot be listed. Problems with
/// single files are only reported.
pub fn stage_inputs<P, Q>(
    input_dir: P,
    working_dir: Q,
    extension: &str,
    stamp_file_names: bool,
) -> io::Result<StageReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_dir = input_dir.as_ref();
    let working_dir = working_dir.as_ref();

    fs::create_dir_all(working_dir)?;
    let file_names = list_files(input_dir, extension)?;
    info!(
        "staging {} files from {} into {}",
        file_names.len(),
        input_dir.display(),
        working_dir.display()
    );

    let mut report = StageReport::new(Stage::Staging);
    for name in file_names {
        let result = stage_file(
            &input_dir.join(&name),
            &working_dir.join(&name),
            stamp_file_names,
        );
        report.record(&name, result);
    }
    Ok(report)
}

fn stage_file(source: &Path, target: &Path, stamp_file_name: bool) -> Result<PathBuf, FileError> {
    fs::copy(source, target)?;

    if stamp_file_name {
        let stem = target
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut obj = open_file(target).map_err(|e| FileError::Decode(e.to_string()))?;
        set_subject_id(&mut obj, &stem);
        write_dicom_atomically(target, &obj)?;
    }

    Ok(target.to_path_buf())
}

/// Anonymizes every file of `input_dir` with the given extension into `output_dir`, keeping the
/// file names.
///
/// Files are processed one after the other in natural-sort order. A file that fails is reported
/// and skipped, and never leaves a partial output file behind.
///
/// # Errors
///
/// Fails when `output_dir` cannot be created or `input_dir` cannot be listed.
pub fn anonymize_dir<P, Q>(
    anonymizer: &Anonymizer,
    input_dir: P,
    output_dir: Q,
    extension: &str,
) -> io::Result<StageReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    fs::create_dir_all(output_dir)?;
    let file_names = list_files(input_dir, extension)?;
    info!(
        "anonymizing {} files from {} into {}",
        file_names.len(),
        input_dir.display(),
        output_dir.display()
    );

    anonymize_files(
        anonymizer,
        file_names.iter().map(|name| input_dir.join(name)),
        output_dir,
    )
}

/// Anonymizes the given files into `output_dir`, in the given order, keeping their file names.
///
/// A file that fails is reported and skipped, and never leaves a partial output file behind.
///
/// # Errors
///
/// Fails when `output_dir` cannot be created.
pub fn anonymize_files<I, P, Q>(
    anonymizer: &Anonymizer,
    sources: I,
    output_dir: Q,
) -> io::Result<StageReport>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut report = StageReport::new(Stage::Anonymize);
    for source in sources {
        let source = source.as_ref();
        let Some(name) = source.file_name() else {
            warn!("skipping {}, it has no file name", source.display());
            continue;
        };
        let result = anonymize_file(anonymizer, source, &output_dir.join(name));
        report.record(&name.to_string_lossy(), result);
    }
    Ok(report)
}

/// Decodes the file at `source`, anonymizes it and writes the result to `target`.
pub fn anonymize_file(
    anonymizer: &Anonymizer,
    source: &Path,
    target: &Path,
) -> Result<PathBuf, FileError> {
    let obj = open_file(source).map_err(|e| FileError::Decode(e.to_string()))?;
    let anonymized = anonymizer
        .anonymize_object(&obj)
        .map_err(|e| FileError::Transform(e.to_string()))?;
    write_dicom_atomically(target, &anonymized)?;
    Ok(target.to_path_buf())
}
