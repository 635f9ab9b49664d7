use crate::error::Res;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Res<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Copies `from` -> `to`, replacing `to` if it exists.
pub(crate) async fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Res<()> {
    tokio::fs::copy(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to copy file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })?;
    Ok(())
}

/// Creates a directory and any missing parents. Does nothing if it already exists.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory {}", path.display()))
}

/// Resolves `path` to an absolute path. The path must exist.
pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> Res<PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[tokio::test]
    async fn test_write_read_deserialize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thing.json");
        write(&path, r#"{"name": "caixa"}"#).await.unwrap();
        let thing: Thing = deserialize(&path).await.unwrap();
        assert_eq!(thing.name, "caixa");
    }

    #[tokio::test]
    async fn test_copy_and_make_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        make_dir(&nested).await.unwrap();
        make_dir(&nested).await.unwrap();

        let from = dir.path().join("from.txt");
        write(&from, "hello").await.unwrap();
        copy(&from, nested.join("to.txt")).await.unwrap();
        assert_eq!(read(&nested.join("to.txt")).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_file_errors_name_the_path() {
        let dir = TempDir::new().unwrap();
        let err = read(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(err.to_string().contains("nope.json"));
        assert!(canonicalize(dir.path().join("nope")).await.is_err());
    }
}
