//! ファイル書き込み
//!
//! 同じディレクトリの一時ファイルに書いてから置き換える。
//! 置き換えに失敗しても既存ファイルはそのまま残る。

use crate::error::{MedoctorError, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Windows: ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
const SHARING_VIOLATION_CODES: &[i32] = &[32, 33];

/// 書き込みエラーを分類（ロック・権限は FileLocked）
pub fn classify_write_error(path: &Path, err: std::io::Error) -> MedoctorError {
    let locked = err.kind() == std::io::ErrorKind::PermissionDenied
        || (cfg!(windows)
            && err
                .raw_os_error()
                .map(|code| SHARING_VIOLATION_CODES.contains(&code))
                .unwrap_or(false));
    if locked {
        MedoctorError::FileLocked(path.display().to_string())
    } else {
        MedoctorError::Io(err)
    }
}

/// 既存ファイルが他プロセスに開かれていないか（書き込みで開けるか）
fn ensure_writable(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    OpenOptions::new()
        .write(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| classify_write_error(path, e))
}

/// 一時ファイル経由で書き込む
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    ensure_writable(target)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| classify_write_error(dir, e))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .map_err(|e| classify_write_error(target, e.error))?;

    tracing::debug!("wrote {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

/// 追記用に開く（親ディレクトリも作る）
pub fn open_append(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| classify_write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        // 一時ファイルが残っていない
        let count = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_append_keeps_previous_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app").join("log.txt");

        writeln!(open_append(&path).unwrap(), "first").unwrap();
        writeln!(open_append(&path).unwrap(), "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_permission_denied_is_locked() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let classified = classify_write_error(Path::new("report.xlsx"), err);
        assert!(matches!(classified, MedoctorError::FileLocked(ref p) if p == "report.xlsx"));
    }

    #[cfg(windows)]
    #[test]
    fn test_sharing_violation_is_locked() {
        let err = std::io::Error::from_raw_os_error(32);
        let classified = classify_write_error(Path::new("a.docx"), err);
        assert!(matches!(classified, MedoctorError::FileLocked(_)));
    }

    #[test]
    fn test_other_errors_stay_io() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let classified = classify_write_error(Path::new("a.docx"), err);
        assert!(matches!(classified, MedoctorError::Io(_)));
    }
}
