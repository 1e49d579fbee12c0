//! Anonymous-temp-file-backed data file creation and the initialization
//! flag file sentinel (§3 Lifecycle, §10.6).
//!
//! Creation tries `O_TMPFILE`: open the containing directory for write with
//! no name, write the file's contents, then `linkat` the anonymous inode
//! into the namespace under its final name. Filesystems that don't support
//! `O_TMPFILE` return `ENOTSUP`/`EOPNOTSUPP`, at which point a named
//! temporary file plus `rename` is used instead.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::config::TEMP_FILE_EXTENSION;
use crate::error::{Result, StorageError};

/// Creates `final_path` with `size` bytes, preferring an anonymous temp file
/// linked into place, falling back to a named temp file plus rename.
/// Returns the open file handle positioned for random access.
pub fn create_data_file(dir: &Path, final_path: &Path, size: u64, sync: bool) -> Result<File> {
    let extra_flags = if sync { libc::O_DSYNC } else { 0 };

    match create_anonymous(dir, extra_flags, size) {
        Ok(file) => {
            link_anonymous(&file, final_path)?;
            Ok(file)
        }
        Err(errno) if errno == libc::ENOTSUP || errno == libc::EOPNOTSUPP => {
            create_named_and_rename(final_path, extra_flags, size)
        }
        Err(errno) => Err(StorageError::CannotCreateIndexFile {
            path: final_path.to_path_buf(),
            source: io::Error::from_raw_os_error(errno),
        }),
    }
}

fn create_anonymous(dir: &Path, extra_flags: i32, size: u64) -> std::result::Result<File, i32> {
    let dir_c = CString::new(dir.as_os_str().as_bytes()).map_err(|_| libc::EINVAL)?;
    let fd = unsafe {
        libc::open(
            dir_c.as_ptr(),
            libc::O_TMPFILE | libc::O_RDWR | extra_flags,
            0o600,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error().raw_os_error().unwrap_or(-1));
    }
    use std::os::unix::io::FromRawFd;
    let file = unsafe { File::from_raw_fd(fd) };
    file.set_len(size).map_err(|e| e.raw_os_error().unwrap_or(-1))?;
    Ok(file)
}

fn link_anonymous(file: &File, final_path: &Path) -> Result<()> {
    let fd_path = format!("/proc/self/fd/{}", file.as_raw_fd());
    let fd_path_c = CString::new(fd_path).unwrap();
    let final_path_c = CString::new(final_path.as_os_str().as_bytes()).map_err(|_| {
        StorageError::CannotLinkIndexFile {
            path: final_path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::InvalidInput),
        }
    })?;
    let ret = unsafe {
        libc::linkat(
            libc::AT_FDCWD,
            fd_path_c.as_ptr(),
            libc::AT_FDCWD,
            final_path_c.as_ptr(),
            libc::AT_SYMLINK_FOLLOW,
        )
    };
    if ret < 0 {
        return Err(StorageError::CannotLinkIndexFile {
            path: final_path.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

fn create_named_and_rename(final_path: &Path, extra_flags: i32, size: u64) -> Result<File> {
    let tmp_path = path_with_appended_extension(final_path, TEMP_FILE_EXTENSION);
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(true);
    options.custom_flags(extra_flags);
    let file = options
        .open(&tmp_path)
        .map_err(|source| StorageError::CannotCreateIndexFile {
            path: tmp_path.clone(),
            source,
        })?;
    file.set_len(size)
        .map_err(|source| StorageError::CannotCreateIndexFile {
            path: tmp_path.clone(),
            source,
        })?;
    fs::rename(&tmp_path, final_path).map_err(|source| StorageError::CannotRenameIndexFile {
        from: tmp_path,
        to: final_path.to_path_buf(),
        source,
    })?;
    Ok(file)
}

fn path_with_appended_extension(path: &Path, extra_ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(extra_ext);
    PathBuf::from(s)
}

/// Opens an existing data file, optionally with synchronous-data-write semantics.
pub fn open_data_file(path: &Path, sync: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true);
    if sync {
        options.custom_flags(libc::O_DSYNC);
    }
    options
        .open(path)
        .map_err(|source| StorageError::CannotCreateIndexFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes the zero-length initialization flag file after a successful create.
pub fn write_init_flag(path: &Path) -> Result<()> {
    File::create(path)?;
    Ok(())
}

/// Returns whether the initialization flag file is present.
pub fn is_initialized(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_open_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("data1.dat");
        let file = create_data_file(dir.path(), &final_path, 8192 * 3, true).unwrap();
        drop(file);
        assert!(final_path.exists());
        assert_eq!(fs::metadata(&final_path).unwrap().len(), 8192 * 3);
        let _reopened = open_data_file(&final_path, true).unwrap();
    }

    #[test]
    fn test_init_flag_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join(".initialized");
        assert!(!is_initialized(&flag));
        write_init_flag(&flag).unwrap();
        assert!(is_initialized(&flag));
    }
}
