//! Atomic file publication
//!
//! New content is written to an unnamed file in the target's directory and
//! only given a name right before it is renamed over the target. Readers see
//! the old file or the new file, never a partial one, and a crash before the
//! link leaves nothing behind. The file carries a `.<name>.<pid>.tmp` name
//! only between link and rename; the next publish removes such leftovers.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Atomically replace `target` with `contents`
pub fn publish(target: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = parent_dir(target);
    fs::create_dir_all(&dir)?;

    #[cfg(target_os = "linux")]
    {
        remove_stale_staging(&dir, target)?;
        if publish_anonymous(&dir, target, contents)? {
            return Ok(());
        }
    }

    publish_named(&dir, target, contents)
}

/// Returns `false`, having published nothing, when unnamed files are
/// unavailable in `dir`
#[cfg(target_os = "linux")]
fn publish_anonymous(dir: &Path, target: &Path, contents: &[u8]) -> io::Result<bool> {
    let file = match anonymous::open(dir) {
        Ok(file) => file,
        Err(e) if anonymous::unsupported(&e) => {
            tracing::debug!("O_TMPFILE unavailable in {}: {}", dir.display(), e);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    let file = write_contents(file, contents)?;

    let staging = staging_path(dir, target);
    match anonymous::link(&file, &staging) {
        Ok(()) => {}
        Err(e) if anonymous::unsupported(&e) => {
            tracing::debug!("cannot link unnamed file into {}: {}", dir.display(), e);
            return Ok(false);
        }
        Err(e) => return Err(e),
    }
    drop(file);

    if let Err(e) = fs::rename(&staging, target) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    sync_dir(dir)?;
    Ok(true)
}

/// Remove staging names left by a writer that died between link and rename
#[cfg(target_os = "linux")]
fn remove_stale_staging(dir: &Path, target: &Path) -> io::Result<()> {
    let Some(name) = target.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(());
    };
    let prefix = format!(".{}.", name);
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        let Some(pid) = file_name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".tmp"))
        else {
            continue;
        };
        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => tracing::debug!("Removed stale {}", entry.path().display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn publish_named(dir: &Path, target: &Path, contents: &[u8]) -> io::Result<()> {
    let (file, temp_path) = tempfile::NamedTempFile::new_in(dir)?.into_parts();
    // temp_path removes the file on drop if anything below fails
    let file = write_contents(file, contents)?;
    drop(file);
    temp_path.persist(target).map_err(|e| e.error)?;
    sync_dir(dir)
}

fn write_contents(file: File, contents: &[u8]) -> io::Result<File> {
    let mut writer = BufWriter::new(file);
    writer.write_all(contents)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(file)
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Name the unnamed file carries between link and rename
#[cfg(target_os = "linux")]
fn staging_path(dir: &Path, target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(target_os = "linux")]
mod anonymous {
    use std::ffi::CString;
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    /// Open an unnamed file on the filesystem holding `dir`
    pub fn open(dir: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .mode(0o644)
            .custom_flags(libc::O_TMPFILE)
            .open(dir)
    }

    /// Unnamed files cannot be created or linked here: old kernel,
    /// unsupported filesystem or no /proc. Only meaningful for errors from
    /// `open` and `link`.
    pub fn unsupported(err: &io::Error) -> bool {
        matches!(
            err.raw_os_error(),
            Some(libc::EOPNOTSUPP) | Some(libc::EISDIR) | Some(libc::EINVAL) | Some(libc::ENOENT)
        )
    }

    /// Link an unnamed file into the namespace at `dest`
    pub fn link(file: &File, dest: &Path) -> io::Result<()> {
        let src = CString::new(format!("/proc/self/fd/{}", file.as_raw_fd()))?;
        let dest = CString::new(dest.as_os_str().as_bytes())?;
        // SAFETY: both paths are valid NUL-terminated strings that outlive the call.
        let rc = unsafe {
            libc::linkat(
                libc::AT_FDCWD,
                src.as_ptr(),
                libc::AT_FDCWD,
                dest.as_ptr(),
                libc::AT_SYMLINK_FOLLOW,
            )
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}
