use crate::error::{Result, ValidationError};
use crate::validator::Upload;
use futures::future::try_join_all;
use globset::{GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Async discovery of the documents making up one batch
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["xml"])
    extensions: Vec<String>,
    /// Include patterns set
    include_set: Option<GlobSet>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
    /// Maximum depth for directory traversal (None = unlimited)
    max_depth: Option<usize>,
}

fn build_glob_set(kind: &str, patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                ValidationError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| ValidationError::Config(format!("Failed to build {} glob set: {}", kind, e)))
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
        }
    }

    /// Set file extensions to discover (matched case-insensitively)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Add include patterns
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set("include", &patterns)?;
        Ok(self)
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set("exclude", &patterns)?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Discover documents under every root, sorted and deduplicated
    pub async fn discover_all(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for root in roots {
            files.extend(self.discover_files(root).await?);
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Discover files in the given path (file or directory), sorted by path
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| ValidationError::FileSystemTraversal {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if metadata.is_file() {
            if self.should_process(path) {
                return Ok(vec![path.to_path_buf()]);
            }
            warn!(path = %path.display(), "Skipping file that does not match the document filters");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        self.discover_files_recursive(path, 0, &mut files).await?;
        files.sort();

        debug!(root = %path.display(), found = files.len(), "Directory scanned");
        Ok(files)
    }

    /// Recursive helper; `depth` is the depth of the entries inside `dir`
    fn discover_files_recursive<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            let mut read_dir = fs::read_dir(dir).await?;

            while let Some(entry) = read_dir.next_entry().await? {
                let entry_path = entry.path();

                // Links inside a walked directory are never followed
                if entry_path.is_symlink() {
                    continue;
                }

                let metadata = match fs::metadata(&entry_path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = %entry_path.display(), error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };

                if metadata.is_file() {
                    if self.should_process(&entry_path) {
                        files.push(entry_path);
                    }
                } else if metadata.is_dir() {
                    if let Some(max_depth) = self.max_depth
                        && depth >= max_depth
                    {
                        continue;
                    }

                    if let Err(e) = self
                        .discover_files_recursive(&entry_path, depth + 1, files)
                        .await
                    {
                        // Keep going with the other entries
                        warn!(path = %entry_path.display(), error = %e, "Error processing directory");
                    }
                }
            }

            Ok(())
        })
    }

    /// Check if a file should be processed based on extensions and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(extension) if self.extensions.contains(&extension.to_lowercase()) => {}
            _ => return false,
        }

        // Exclusions win over inclusions
        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        // If any include pattern is given, at least one must match
        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one file into an upload named after its final path component
pub async fn read_upload(path: &Path) -> Result<Upload> {
    let content = fs::read(path)
        .await
        .map_err(|e| ValidationError::FileSystemTraversal {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Upload::new(upload_name(path), content))
}

/// Read every file concurrently, preserving the input order
pub async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    try_join_all(paths.iter().map(|path| read_upload(path))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("subdir1")).await.unwrap();
        fs::create_dir_all(root.join("subdir2/nested"))
            .await
            .unwrap();

        fs::write(root.join("order1.xml"), "<order/>").await.unwrap();
        fs::write(root.join("order2.XML"), "<order/>").await.unwrap();
        fs::write(root.join("notes.txt"), "text file").await.unwrap();
        fs::write(root.join("subdir1/nested.xml"), "<order/>")
            .await
            .unwrap();
        fs::write(root.join("subdir2/nested/deep.xml"), "<order/>")
            .await
            .unwrap();
        fs::write(root.join("subdir2/nested/order.xsd"), "<xs:schema/>")
            .await
            .unwrap();

        temp_dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_discover_documents_sorted() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new();

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();

        assert_eq!(
            names(&files),
            vec!["order1.xml", "order2.XML", "nested.xml", "deep.xml"]
        );
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[tokio::test]
    async fn test_discover_multiple_extensions() {
        let temp_dir = create_test_directory().await;
        let discovery =
            FileDiscovery::new().with_extensions(vec!["xml".to_string(), "XSD".to_string()]);

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 5);
    }

    #[tokio::test]
    async fn test_max_depth_limit() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new().with_max_depth(Some(1));

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();

        // subdir2/nested/deep.xml sits at depth 2
        assert!(!names(&files).contains(&"deep.xml".to_string()));
        assert_eq!(files.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_in_directories_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("linked.xml");
        std::fs::write(&target, "<order/>").unwrap();
        std::fs::write(temp_dir.path().join("real.xml"), "<order/>").unwrap();
        std::os::unix::fs::symlink(&target, temp_dir.path().join("link.xml")).unwrap();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("linked_dir")).unwrap();

        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(names(&files), vec!["real.xml"]);
    }

    #[tokio::test]
    async fn test_include_and_exclude_patterns() {
        let temp_dir = create_test_directory().await;

        let discovery = FileDiscovery::new()
            .with_include_patterns(vec!["**/order*".to_string()])
            .unwrap();
        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(names(&files), vec!["order1.xml", "order2.XML"]);

        let discovery = FileDiscovery::new()
            .with_exclude_patterns(vec!["**/subdir2/**".to_string()])
            .unwrap();
        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 3);
        assert!(!names(&files).contains(&"deep.xml".to_string()));
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let result = FileDiscovery::new().with_include_patterns(vec!["a[".to_string()]);
        assert!(matches!(result, Err(ValidationError::Config(_))));
    }

    #[test]
    fn test_should_process() {
        let discovery = FileDiscovery::new();

        assert!(discovery.should_process(Path::new("test.xml")));
        assert!(discovery.should_process(Path::new("TEST.XML")));
        assert!(!discovery.should_process(Path::new("test.txt")));
        assert!(!discovery.should_process(Path::new("test")));
    }

    #[tokio::test]
    async fn test_explicit_file_and_missing_path() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new();

        let files = discovery
            .discover_files(&temp_dir.path().join("order1.xml"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);

        let files = discovery
            .discover_files(&temp_dir.path().join("notes.txt"))
            .await
            .unwrap();
        assert!(files.is_empty());

        let result = discovery
            .discover_files(&temp_dir.path().join("missing"))
            .await;
        assert!(matches!(
            result,
            Err(ValidationError::FileSystemTraversal { .. })
        ));
    }

    #[tokio::test]
    async fn test_discover_all_deduplicates() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new();
        let roots = vec![
            temp_dir.path().join("subdir1"),
            temp_dir.path().join("order1.xml"),
            temp_dir.path().join("subdir1/nested.xml"),
        ];

        let files = discovery.discover_all(&roots).await.unwrap();
        assert_eq!(names(&files), vec!["order1.xml", "nested.xml"]);
    }

    #[tokio::test]
    async fn test_read_uploads_preserves_order() {
        let temp_dir = create_test_directory().await;
        let paths = vec![
            temp_dir.path().join("subdir1/nested.xml"),
            temp_dir.path().join("notes.txt"),
        ];

        let uploads = read_uploads(&paths).await.unwrap();
        assert_eq!(uploads[0].filename, "nested.xml");
        assert_eq!(uploads[1].filename, "notes.txt");
        assert_eq!(uploads[1].content, b"text file");

        let missing = read_uploads(&[temp_dir.path().join("missing.xml")]).await;
        assert!(missing.is_err());
    }
}
