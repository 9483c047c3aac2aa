use relative_path::RelativePathBuf;
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf so that store and config paths are always interpreted
against the PAL's base directory. RealPal resolves them against the working directory,
MockPal uses them as keys, and both see the same separators on every platform.
*/

/// Type-safe wrapper for file paths relative to the PAL base directory.
///
/// # Examples
///
/// ```
/// use quirknotes_base::FilePath;
///
/// let config = FilePath::from("quirknotes.toml");
/// let data = FilePath::from(String::from("data/notes.json"));
/// assert_eq!(data.parent(), Some(FilePath::from("data")));
/// assert_eq!(config.parent(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Converts to a regular Path for use with std::fs operations.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }

    /// The containing directory, if the path has a non-empty one.
    pub fn parent(&self) -> Option<FilePath> {
        self.0
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(|parent| Self(parent.to_relative_path_buf()))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
