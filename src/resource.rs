use std::path::{Path, PathBuf};

use crate::error::ClientError;
use crate::protocol::split_lines;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Ordered bus-stop names, one per resource line.
pub type StopList = Vec<String>;

/// Where stop-list resources live: `<root>/<prefix><name><extension>`.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
    prefix: String,
    extension: String,
}

impl ResourceStore {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}{}{}", self.prefix, name, self.extension))
    }

    /// Load the stop list stored under a logical name.
    pub async fn read_lines(&self, name: &str) -> Result<StopList, ClientError> {
        let path = self.resolve(name);
        read_stop_list(&path).await.map_err(|source| {
            tracing::warn!(resource = %path.display(), error = %source, "stop list unavailable");
            ClientError::ResourceUnavailable {
                name: name.to_string(),
                source,
            }
        })
    }
}

async fn read_stop_list(path: &Path) -> std::io::Result<StopList> {
    let bytes = tokio::fs::read(path).await?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(decode_stop_list(text))
}

/// Split resource text into trimmed lines, dropping a leading byte-order
/// mark. Empty lines stay as empty entries.
pub fn decode_stop_list(text: &str) -> StopList {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    split_lines(text)
        .into_iter()
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch_dir(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "journey-client-{}-{}",
            test_name,
            std::process::id()
        ));
        std::fs::create_dir_all(dir.join("buses")).unwrap();
        dir
    }

    #[test]
    fn test_decode_strips_bom_and_trims() {
        let stops = decode_stop_list("\u{feff}  Duomo \r\n\nCadorna\t\n");
        assert_eq!(stops, vec!["Duomo", "", "Cadorna"]);
    }

    #[test]
    fn test_decode_without_bom_is_unchanged() {
        let stops = decode_stop_list("Duomo\nCadorna");
        assert_eq!(stops, vec!["Duomo", "Cadorna"]);
    }

    #[test]
    fn test_decode_splits_on_carriage_returns() {
        assert_eq!(decode_stop_list("Lotto\rFiera\r"), vec!["Lotto", "Fiera"]);
        assert_eq!(
            decode_stop_list("\u{feff}Lotto \r\rFiera\r\nCertosa"),
            vec!["Lotto", "", "Fiera", "Certosa"]
        );
    }

    #[test]
    fn test_decode_only_first_bom_is_special() {
        let stops = decode_stop_list("Duomo\n\u{feff}Cadorna");
        assert_eq!(stops, vec!["Duomo".to_string(), "\u{feff}Cadorna".to_string()]);
    }

    #[test]
    fn test_resolve_joins_prefix_name_extension() {
        let store = ResourceStore::new("/data", "buses/", ".txt");
        assert_eq!(store.resolve("90"), PathBuf::from("/data/buses/90.txt"));
    }

    #[tokio::test]
    async fn test_read_lines_from_disk() {
        let dir = scratch_dir("read-lines");
        std::fs::write(dir.join("buses/42.txt"), "\u{feff}Lotto\n Fiera \n").unwrap();

        let store = ResourceStore::new(&dir, "buses/", ".txt");
        assert_eq!(store.read_lines("42").await.unwrap(), vec!["Lotto", "Fiera"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_resources_look_the_same() {
        let dir = scratch_dir("unavailable");
        std::fs::write(dir.join("buses/bad.txt"), [0x66, 0xff, 0xfe, 0x0a]).unwrap();

        let store = ResourceStore::new(&dir, "buses/", ".txt");
        let missing = store.read_lines("absent").await.unwrap_err();
        let corrupt = store.read_lines("bad").await.unwrap_err();
        assert_eq!(missing.to_string(), corrupt.to_string());
        assert!(matches!(corrupt, ClientError::ResourceUnavailable { ref name, .. } if name == "bad"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
