use std::path::PathBuf;

use anyhow::Result;

use crate::error::SetupError;

/// Environment variable overriding the workspace root location.
pub const ROOT_ENV_VAR: &str = "YTGRAB_ROOT";

/// Name of the workspace directory placed under the user's Documents folder.
const ROOT_DIR_NAME: &str = "YTGRAB";

pub fn find_dotenv() -> Result<Option<PathBuf>> {
    // 1. Check directory where the executable is located
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(exe_dir) = current_exe.parent() {
            let exe_dir_dotenv = exe_dir.join(".env");
            if exe_dir_dotenv.exists() {
                return Ok(Some(exe_dir_dotenv));
            }
        }
    }

    // 2. Check current working directory (for cargo run compatibility)
    let current_dir = std::env::current_dir()?;
    let current_dotenv = current_dir.join(".env");
    if current_dotenv.exists() {
        return Ok(Some(current_dotenv));
    }

    Ok(None)
}

pub fn load_environment() -> Result<()> {
    match find_dotenv()? {
        Some(path) => {
            dotenv::from_path(&path)?;
            log::info!("Loaded environment variables from {:?}", path);
        }
        None => {
            log::debug!("No .env file found. Using system environment variables.");
        }
    }
    Ok(())
}

/// Filesystem layout shared by every job: a root directory with a `bin`
/// subdirectory holding the downloader and transcoder binaries.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub bin: PathBuf,
}

impl Workspace {
    /// Resolves the workspace location: `YTGRAB_ROOT` if set, otherwise
    /// `<Documents>/YTGRAB`.
    pub fn resolve() -> Result<Self, SetupError> {
        let root = match std::env::var_os(ROOT_ENV_VAR) {
            Some(root) => PathBuf::from(root),
            None => dirs::document_dir()
                .ok_or(SetupError::NoDocumentsDir)?
                .join(ROOT_DIR_NAME),
        };
        Ok(Self::at(root))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin = root.join("bin");
        Self { root, bin }
    }

    /// Creates the root and bin directories with intermediates. The binaries
    /// inside `bin` are never deleted by this program.
    pub fn create(&self) -> Result<(), SetupError> {
        for path in [&self.root, &self.bin] {
            std::fs::create_dir_all(path).map_err(|source| SetupError::CreateDir {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn create_makes_root_and_bin() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::at(temp_dir.path().join("YTGRAB"));

        workspace.create().unwrap();

        assert!(workspace.root.is_dir());
        assert!(workspace.bin.is_dir());

        // Re-creating an existing workspace is a no-op
        workspace.create().unwrap();
    }

    #[test]
    #[serial]
    fn resolve_honors_root_override() {
        let temp_dir = TempDir::new().unwrap();
        unsafe { std::env::set_var(ROOT_ENV_VAR, temp_dir.path()) };

        let workspace = Workspace::resolve().unwrap();
        assert_eq!(workspace.root, temp_dir.path());
        assert_eq!(workspace.bin, temp_dir.path().join("bin"));

        unsafe { std::env::remove_var(ROOT_ENV_VAR) };
    }
}
