use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::TryRngCore;

use super::errors::ConfigError;
use super::load::config_path;
use super::types::Settings;

const TEMP_ATTEMPTS: usize = 5;

/// Persist settings to the app directory, overwriting any previous contents.
pub fn save(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    save_to_path(settings, &path)?;
    Ok(path)
}

/// Save settings to a specific path, creating parent directories as needed.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

/// Write through a uniquely named sibling and rename it over `path`, so a
/// crash never leaves a half-written config behind.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_err = |path: &Path, source: io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .ok_or_else(|| write_err(path, io::Error::other("config path has no parent directory")))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| write_err(path, io::Error::other("config path has no file name")))?
        .to_string_lossy()
        .into_owned();

    let (tmp_path, mut file) = create_temp(dir, &file_name).map_err(|err| write_err(path, err))?;
    let written = file.write_all(data).and_then(|()| file.sync_all());
    drop(file);
    if let Err(err) = written.and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(path, err));
    }
    sync_dir(dir).map_err(|err| write_err(dir, err))
}

fn create_temp(dir: &Path, file_name: &str) -> io::Result<(PathBuf, File)> {
    let mut last_err = None;
    for _ in 0..TEMP_ATTEMPTS {
        let mut bytes = [0u8; 6];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| io::Error::other(format!("failed to generate temp suffix: {err}")))?;
        let suffix: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        let tmp_path = dir.join(format!("{file_name}.tmp-{suffix}"));
        match OpenOptions::new().write(true).create_new(true).open(&tmp_path) {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => last_err = Some(err),
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::other("no temporary file name available")))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
