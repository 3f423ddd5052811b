use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::media::{AssetKind, AssetSpec, ResizePlan};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResizePlanQuery {
    pub kind: AssetKind,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetSpecList {
    pub items: Vec<AssetSpec>,
}

/// Multipart fields of an upload after extraction.
#[derive(Debug)]
pub struct UploadForm {
    pub kind: AssetKind,
    pub width: u32,
    pub height: u32,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub key: String,
    pub url: String,
    pub kind: AssetKind,
    pub size: u64,
    pub plan: ResizePlan,
}
