use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClipsightError, Result};

pub const VIDEO_MIME_PREFIX: &str = "video/";
const FALLBACK_MIME: &str = "application/octet-stream";

/// 待上传的本地媒体文件
#[derive(Clone)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub display_name: String,
}

impl Asset {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            display_name: display_name.into(),
        }
    }

    /// 从磁盘读取文件；未显式给出 MIME 类型时按扩展名推断
    pub async fn from_path(path: impl AsRef<Path>, mime_type: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = match mime_type {
            Some(mime) => mime.to_string(),
            None => mime_from_extension(path).to_string(),
        };
        Ok(Self::new(bytes, mime_type, display_name))
    }

    pub fn is_video(&self) -> bool {
        self.mime_type
            .to_ascii_lowercase()
            .starts_with(VIDEO_MIME_PREFIX)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_video() {
            return Err(ClipsightError::InvalidInput(format!(
                "`{}` has media type `{}`, expected {}*",
                self.display_name, self.mime_type, VIDEO_MIME_PREFIX
            )));
        }
        Ok(())
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("display_name", &self.display_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        Some("3gp") => "video/3gpp",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        _ => FALLBACK_MIME,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    Ready,
    Failed,
}

/// 远端资源句柄
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetHandle {
    pub id: String,
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
    pub state: ProcessingState,
}

/// 处于 Ready 状态的句柄，只能通过 `TryFrom<AssetHandle>` 构造
#[derive(Clone, Debug, PartialEq)]
pub struct ReadyAsset(AssetHandle);

impl ReadyAsset {
    pub fn handle(&self) -> &AssetHandle {
        &self.0
    }

    pub fn into_handle(self) -> AssetHandle {
        self.0
    }
}

impl TryFrom<AssetHandle> for ReadyAsset {
    type Error = ClipsightError;

    fn try_from(handle: AssetHandle) -> Result<Self> {
        match handle.state {
            ProcessingState::Ready => Ok(Self(handle)),
            _ => Err(ClipsightError::AssetNotReady(handle.id)),
        }
    }
}

impl std::ops::Deref for ReadyAsset {
    type Target = AssetHandle;

    fn deref(&self) -> &AssetHandle {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(state: ProcessingState) -> AssetHandle {
        AssetHandle {
            id: "files/abc".into(),
            uri: "https://example.test/files/abc".into(),
            mime_type: "video/mp4".into(),
            display_name: "clip.mp4".into(),
            state,
        }
    }

    #[test]
    fn video_mime_is_accepted_case_insensitively() {
        assert!(Asset::new(vec![1], "Video/MP4", "a").validate().is_ok());
        assert!(matches!(
            Asset::new(vec![1], "image/png", "a").validate(),
            Err(ClipsightError::InvalidInput(_))
        ));
    }

    #[test]
    fn media_type_must_begin_with_video() {
        assert!(!Asset::new(vec![1], " video/mp4", "a").is_video());
        assert!(!Asset::new(vec![1], "application/video/mp4", "a").is_video());
    }

    #[test]
    fn ready_asset_requires_ready_state() {
        assert!(ReadyAsset::try_from(handle(ProcessingState::Ready)).is_ok());
        assert!(matches!(
            ReadyAsset::try_from(handle(ProcessingState::Pending)),
            Err(ClipsightError::AssetNotReady(id)) if id == "files/abc"
        ));
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(mime_from_extension(Path::new("a/b/clip.MOV")), "video/quicktime");
        assert_eq!(mime_from_extension(Path::new("notes.txt")), FALLBACK_MIME);
    }
}
