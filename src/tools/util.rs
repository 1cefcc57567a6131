use std::path::{Path, PathBuf};

pub fn yt_dlp_file_name() -> &'static str {
    if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" }
}

pub fn ffmpeg_file_name() -> &'static str {
    if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" }
}

pub fn is_executable_present(path: &Path) -> bool {
    path.exists() && is_executable(path)
}

pub fn is_executable(path: &Path) -> bool {
    #[cfg(windows)]
    {
        path.extension().map_or(false, |ext| ext == "exe")
    }
    #[cfg(not(windows))]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).map_or(false, |metadata| {
            let permissions = metadata.permissions();
            permissions.mode() & 0o111 != 0
        })
    }
}

/// Depth-first search for a regular file named `file_name` under `base_dir`.
/// Archives do not all place the tool binary at their root, so after a
/// generic unpack the binary may sit inside a versioned subdirectory.
pub fn find_in_tree(base_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let mut stack = vec![base_dir.to_path_buf()];

    while let Some(current_dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&current_dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.file_name().is_some_and(|name| name == file_name) {
                return Some(path);
            } else if path.is_dir() {
                stack.push(path);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_is_executable_present() {
        let temp_dir = TempDir::new().unwrap();

        // Test with a file that doesn't exist
        let non_existent = temp_dir.path().join("non_existent.exe");
        assert!(!is_executable_present(&non_existent));

        // Create a file
        let test_file = temp_dir.path().join("test.exe");
        {
            File::create(&test_file).unwrap();
        }

        // For Windows, any file with .exe extension is considered executable
        #[cfg(windows)]
        {
            assert!(is_executable_present(&test_file));
        }

        // For Unix systems, we need to test with a properly permissioned file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&test_file).unwrap().permissions();
            perms.set_mode(0o755); // Make executable
            std::fs::set_permissions(&test_file, perms).unwrap();
            assert!(is_executable_present(&test_file));
        }
    }

    #[test]
    fn find_in_tree_descends_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("ffmpeg-git-20240101-amd64-static");
        std::fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("ffmpeg")).unwrap();

        let found = find_in_tree(temp_dir.path(), "ffmpeg").unwrap();
        assert_eq!(found, nested.join("ffmpeg"));

        assert!(find_in_tree(temp_dir.path(), "ffprobe").is_none());
    }
}
