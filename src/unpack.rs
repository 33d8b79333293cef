use crate::{decode_entry, ArchiveEntry, Config, SizeMismatch, TextureError};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnpackError {
    #[error("Entry name {0:?} does not name a file")]
    InvalidName(String),
    #[error("Failed to decode {name}")]
    Decode { name: String, source: TextureError },
    #[error("Failed to create directory {path:?}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to save {path:?}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// A texture written to disk.
#[derive(Debug, Clone)]
pub struct Exported {
    pub path: PathBuf,
    pub size_mismatch: Option<SizeMismatch>,
}

#[derive(Debug, Default)]
pub struct UnpackReport {
    pub exported: Vec<Exported>,
    /// Entries that failed, by name, in archive order.
    pub failures: Vec<(String, UnpackError)>,
}

impl UnpackReport {
    pub fn mismatched(&self) -> usize {
        self.exported
            .iter()
            .filter(|exported| exported.size_mismatch.is_some())
            .count()
    }
}

/// Where the PNG for an entry called `name` goes.
///
/// Root, prefix and `..` components are dropped, so the result always lies
/// inside `out_dir`.
pub fn output_path(out_dir: &Path, name: &str, flatten: bool) -> Result<PathBuf, UnpackError> {
    let name = if flatten {
        name.replace('/', "_")
    } else {
        name.to_owned()
    };

    let relative: PathBuf = Path::new(&name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(UnpackError::InvalidName(name));
    }

    let mut file = relative.into_os_string();
    file.push(".png");

    Ok(out_dir.join(file))
}

/// Decode one entry and save it as PNG below `out_dir`.
pub fn export_entry(
    entry: &ArchiveEntry,
    out_dir: &Path,
    config: &Config,
) -> Result<Exported, UnpackError> {
    let name = entry.name();
    let path = output_path(out_dir, &name, config.unpack.flatten_paths)?;

    let texture = decode_entry(entry.data, &config.decode)
        .map_err(|source| UnpackError::Decode { name, source })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| UnpackError::CreateDir {
            path: parent.to_owned(),
            source,
        })?;
    }

    texture
        .image
        .save(&path)
        .map_err(|source| UnpackError::Save {
            path: path.clone(),
            source,
        })?;
    log::debug!("> {}", path.display());

    Ok(Exported {
        path,
        size_mismatch: texture.size_mismatch,
    })
}

/// Export every entry in parallel.
///
/// Failed entries are collected in the report unless `fail_fast` is set, in
/// which case the first failure is returned. The progress bar is cleared
/// either way.
pub fn unpack_entries(
    entries: &[ArchiveEntry],
    out_dir: &Path,
    config: &Config,
    progress: &ProgressBar,
) -> Result<UnpackReport, UnpackError> {
    let report = if config.unpack.fail_fast {
        entries
            .par_iter()
            .progress_with(progress.clone())
            .map(|entry| export_entry(entry, out_dir, config))
            .collect::<Result<Vec<_>, _>>()
            .map(|exported| UnpackReport {
                exported,
                failures: Vec::new(),
            })
    } else {
        let results = entries
            .par_iter()
            .progress_with(progress.clone())
            .map(|entry| (entry.name(), export_entry(entry, out_dir, config)))
            .collect::<Vec<_>>();

        let mut report = UnpackReport::default();
        for (name, result) in results {
            match result {
                Ok(exported) => report.exported.push(exported),
                Err(err) => report.failures.push((name, err)),
            }
        }

        Ok(report)
    };

    progress.finish_and_clear();
    report
}
