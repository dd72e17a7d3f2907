pub mod poller;
pub mod types;
pub mod uploader;

pub use poller::{AssetReadinessPoller, PollConfig, DEFAULT_POLL_INTERVAL};
pub use types::{
    mime_from_extension, Asset, AssetHandle, ProcessingState, ReadyAsset, VIDEO_MIME_PREFIX,
};
pub use uploader::AssetUploader;
