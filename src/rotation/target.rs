//! Where output files go and what they are called

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use tracing::debug;

use super::sequence::{read_dir_names, SequenceAllocator};
use crate::reporter::{ReporterError, ReporterResult};
use crate::utils::time::{format_utc, unix_millis};

/// Extension used for timestamp-named files
pub const DEFAULT_EXTENSION: &str = "good";

/// Extension used when files are named after a formatted date
pub const DEFAULT_DATED_EXTENSION: &str = "log";

/// Output location of one reporter instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationTarget {
    /// Fixed base name; files are `<path>.<NNN>`
    File { path: PathBuf },
    /// Directory of files named `[<prefix>-]<stem>-<tag>.<extension>`, where
    /// the stem is the epoch milliseconds or the UTC date rendered with
    /// `name_format` and the tag is random hex
    Directory {
        directory: PathBuf,
        prefix: Option<String>,
        extension: String,
        name_format: Option<String>,
    },
}

impl RotationTarget {
    /// Fixed-name target
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        RotationTarget::File {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Directory target with timestamp names and the default extension
    pub fn directory<P: AsRef<Path>>(directory: P) -> Self {
        RotationTarget::Directory {
            directory: directory.as_ref().to_path_buf(),
            prefix: None,
            extension: DEFAULT_EXTENSION.to_string(),
            name_format: None,
        }
    }

    /// Directory that is listed at startup and receives the files
    pub fn parent_dir(&self) -> PathBuf {
        match self {
            RotationTarget::File { path } => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
            RotationTarget::Directory { directory, .. } => directory.clone(),
        }
    }
}

/// Replace path separators so a name component cannot escape its directory
pub fn sanitize_component(component: &str) -> String {
    component.replace(['/', MAIN_SEPARATOR], "-")
}

/// Normalize a configured extension: no leading dot, no separators
pub fn normalize_extension(extension: &str) -> String {
    sanitize_component(extension.strip_prefix('.').unwrap_or(extension))
}

/// Number of random bytes in a directory-target file name
pub const RANDOM_TAG_BYTES: usize = 5;

/// Lowercase hex of [`RANDOM_TAG_BYTES`] random bytes
fn random_tag() -> String {
    let bytes: [u8; RANDOM_TAG_BYTES] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Produces the path of every file a reporter opens, in order
#[derive(Debug, Clone)]
pub struct FileNamer {
    target: RotationTarget,
    sequence: Option<SequenceAllocator>,
}

impl FileNamer {
    /// Inspect the target directory and prepare the naming state
    ///
    /// Fails if the directory cannot be listed or the fixed path has no
    /// file name.
    pub async fn discover(target: RotationTarget) -> ReporterResult<Self> {
        let directory = target.parent_dir();

        let sequence = match &target {
            RotationTarget::File { path } => {
                let base_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        ReporterError::Config(format!(
                            "file target {} has no file name",
                            path.display()
                        ))
                    })?;
                Some(SequenceAllocator::discover(&directory, &base_name).await?)
            }
            RotationTarget::Directory { .. } => {
                let existing = read_dir_names(&directory).await?;
                debug!(directory = %directory.display(), entries = existing.len(), "directory target ready");
                None
            }
        };

        Ok(Self {
            target,
            sequence,
        })
    }

    /// The target this namer was built for
    pub fn target(&self) -> &RotationTarget {
        &self.target
    }

    /// Path of the next file to open
    pub fn next_path(&mut self) -> PathBuf {
        match &self.target {
            RotationTarget::File { path } => {
                let suffix = self
                    .sequence
                    .get_or_insert_with(|| SequenceAllocator::starting_after(0))
                    .next();
                let mut name = OsString::from(path.as_os_str());
                name.push(".");
                name.push(suffix);
                PathBuf::from(name)
            }
            RotationTarget::Directory {
                directory,
                prefix,
                extension,
                name_format,
            } => {
                let stem = name_format
                    .as_deref()
                    .and_then(format_utc)
                    .map(|date| sanitize_component(&date))
                    .unwrap_or_else(|| unix_millis().to_string());
                // Other instances and earlier runs may share the directory and
                // the date, so every name carries its own random tag
                let name = match prefix {
                    Some(prefix) => format!("{prefix}-{stem}-{}", random_tag()),
                    None => format!("{stem}-{}", random_tag()),
                };

                directory.join(format!("{name}.{extension}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parent_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(RotationTarget::file("app").parent_dir(), PathBuf::from("."));
        assert_eq!(
            RotationTarget::file("logs/app").parent_dir(),
            PathBuf::from("logs")
        );
    }

    #[test]
    fn test_sanitize_and_normalize() {
        assert_eq!(sanitize_component("2024/01/02"), "2024-01-02");
        assert_eq!(normalize_extension(".log"), "log");
        assert_eq!(normalize_extension("a/b"), "a-b");
        assert_eq!(normalize_extension("good"), "good");
    }

    #[tokio::test]
    async fn test_file_target_names_follow_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("base");
        fs::write(temp_dir.path().join("base.010"), "old").unwrap();

        let mut namer = FileNamer::discover(RotationTarget::file(&base)).await.unwrap();
        assert_eq!(namer.next_path(), temp_dir.path().join("base.011"));
        assert_eq!(namer.next_path(), temp_dir.path().join("base.012"));
    }

    #[tokio::test]
    async fn test_directory_target_timestamp_names() {
        let temp_dir = TempDir::new().unwrap();
        let mut namer = FileNamer::discover(RotationTarget::directory(temp_dir.path()))
            .await
            .unwrap();

        let path = namer.next_path();
        assert_eq!(path.parent().unwrap(), temp_dir.path());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let (stem, extension) = name.split_once('.').unwrap();
        assert_eq!(extension, "good");

        let (millis, tag) = stem.split_once('-').unwrap();
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert_tag(tag);
    }

    #[tokio::test]
    async fn test_directory_target_dated_names_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let target = RotationTarget::Directory {
            directory: temp_dir.path().to_path_buf(),
            prefix: Some("good-file".to_string()),
            extension: "log".to_string(),
            name_format: Some("%Y".to_string()),
        };
        let mut namer = FileNamer::discover(target).await.unwrap();

        let first = namer.next_path();
        let second = namer.next_path();
        let third = namer.next_path();

        let year = format_utc("%Y").unwrap();
        let expected_prefix = format!("good-file-{year}-");
        for path in [&first, &second, &third] {
            assert_eq!(path.parent().unwrap(), temp_dir.path());
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let tag = name
                .strip_prefix(&expected_prefix)
                .and_then(|rest| rest.strip_suffix(".log"))
                .unwrap();
            assert_tag(tag);
        }
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn test_instances_sharing_directory_and_date_get_distinct_files() {
        let temp_dir = TempDir::new().unwrap();
        let target = RotationTarget::Directory {
            directory: temp_dir.path().to_path_buf(),
            prefix: None,
            extension: "log".to_string(),
            name_format: Some("%Y-%m-%d".to_string()),
        };
        let mut first = FileNamer::discover(target.clone()).await.unwrap();
        let mut second = FileNamer::discover(target).await.unwrap();

        assert_ne!(first.next_path(), second.next_path());
    }

    fn assert_tag(tag: &str) {
        assert_eq!(tag.len(), RANDOM_TAG_BYTES * 2, "tag: {tag}");
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_missing_directory_fails_discovery() {
        let temp_dir = TempDir::new().unwrap();
        let target = RotationTarget::directory(temp_dir.path().join("missing"));

        let err = FileNamer::discover(target).await.unwrap_err();
        assert!(matches!(err, ReporterError::DirectoryUnreadable { .. }));
    }
}
