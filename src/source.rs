use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

/// Where task-source files come from. Each file is one scrape batch.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Names of the available task files, in processing order.
    async fn list(&self) -> anyhow::Result<Vec<String>>;

    async fn download(&self, name: &str) -> anyhow::Result<String>;
}

/// Task files stored as `*.json` in one local directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TaskSource for DirectorySource {
    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("reading task directory {}", self.root.display()))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file()
                || path.extension().is_none_or(|ext| ext != "json")
            {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn download(&self, name: &str) -> anyhow::Result<String> {
        let path = self.root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading task file {}", path.display()))
    }
}
