//! Image assets: per-kind size limits, resize planning, and local bucket storage.
//!
//! Resampling happens in the admin client before upload; the service only
//! enforces the bounds and stores the bytes under `MEDIA_ROOT/<bucket>/`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    BrandLogo,
    CategoryImage,
    ProductImage,
    Banner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AssetSpec {
    pub kind: AssetKind,
    #[schema(value_type = String)]
    pub bucket: &'static str,
    pub max_width: u32,
    pub max_height: u32,
    pub max_bytes: u64,
    /// Longest edge of the generated thumbnail, if the kind has one.
    pub thumbnail_edge: Option<u32>,
}

const MIB: u64 = 1024 * 1024;

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::BrandLogo,
        AssetKind::CategoryImage,
        AssetKind::ProductImage,
        AssetKind::Banner,
    ];

    pub fn spec(self) -> AssetSpec {
        match self {
            AssetKind::BrandLogo => AssetSpec {
                kind: self,
                bucket: "brand-logos",
                max_width: 512,
                max_height: 512,
                max_bytes: MIB,
                thumbnail_edge: None,
            },
            AssetKind::CategoryImage => AssetSpec {
                kind: self,
                bucket: "category-images",
                max_width: 1024,
                max_height: 1024,
                max_bytes: 2 * MIB,
                thumbnail_edge: None,
            },
            AssetKind::ProductImage => AssetSpec {
                kind: self,
                bucket: "product-images",
                max_width: 1600,
                max_height: 1600,
                max_bytes: 3 * MIB,
                thumbnail_edge: Some(400),
            },
            AssetKind::Banner => AssetSpec {
                kind: self,
                bucket: "banners",
                max_width: 1920,
                max_height: 800,
                max_bytes: 4 * MIB,
                thumbnail_edge: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResizePlan {
    pub original: Dimensions,
    pub target: Dimensions,
    pub thumbnail: Option<Dimensions>,
    pub needs_resize: bool,
}

/// Largest size with the same aspect ratio that fits in `max_w` x `max_h`.
/// Never upscales.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> Dimensions {
    if width <= max_w && height <= max_h {
        return Dimensions { width, height };
    }
    let scale = f64::min(
        f64::from(max_w) / f64::from(width),
        f64::from(max_h) / f64::from(height),
    );
    Dimensions {
        width: ((f64::from(width) * scale).round() as u32).clamp(1, max_w),
        height: ((f64::from(height) * scale).round() as u32).clamp(1, max_h),
    }
}

pub fn plan_resize(kind: AssetKind, width: u32, height: u32) -> Result<ResizePlan, FieldErrors> {
    let mut errors = FieldErrors::new();
    if width == 0 {
        errors.add("width", "must be positive");
    }
    if height == 0 {
        errors.add("height", "must be positive");
    }
    errors.into_field_result()?;

    let spec = kind.spec();
    let target = fit_within(width, height, spec.max_width, spec.max_height);
    let thumbnail = spec
        .thumbnail_edge
        .map(|edge| fit_within(target.width, target.height, edge, edge));
    Ok(ResizePlan {
        original: Dimensions { width, height },
        target,
        thumbnail,
        needs_resize: target.width != width || target.height != height,
    })
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.split(';').next().map(str::trim) {
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/png") => Some("png"),
        Some("image/webp") => Some("webp"),
        _ => None,
    }
}

/// Check an already-resized upload against its kind's limits and return the
/// file extension to store it under.
pub fn validate_upload(
    kind: AssetKind,
    content_type: &str,
    size: u64,
    width: u32,
    height: u32,
) -> Result<&'static str, FieldErrors> {
    let spec = kind.spec();
    let mut errors = FieldErrors::new();
    let ext = extension_for(content_type);
    if ext.is_none() {
        errors.add("file", "must be a JPEG, PNG or WebP image");
    }
    if size == 0 {
        errors.add("file", "is empty");
    } else if size > spec.max_bytes {
        errors.add(
            "file",
            format!("must be at most {} KiB", spec.max_bytes / 1024),
        );
    }
    if width == 0 || width > spec.max_width {
        errors.add("width", format!("must be between 1 and {}", spec.max_width));
    }
    if height == 0 || height > spec.max_height {
        errors.add("height", format!("must be between 1 and {}", spec.max_height));
    }
    errors.into_field_result()?;
    Ok(ext.unwrap_or("bin"))
}

/// Public URL for a stored image reference. Absolute URLs pass through.
pub fn public_url(base_url: &str, value: &str) -> String {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    format!(
        "{}/media/{}",
        base_url.trim_end_matches('/'),
        value.trim_start_matches('/')
    )
}

pub fn public_url_opt(base_url: &str, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| public_url(base_url, v))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredMedia {
    pub key: String,
    pub url: String,
}

/// Filesystem-backed buckets served under `/media`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub async fn save(
        &self,
        kind: AssetKind,
        ext: &str,
        bytes: &[u8],
    ) -> std::io::Result<StoredMedia> {
        let bucket = kind.spec().bucket;
        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let key = format!("{bucket}/{file_name}");
        Ok(StoredMedia {
            url: public_url(&self.base_url, &key),
            key,
        })
    }

    /// Remove a stored key; absolute URLs and missing files are ignored.
    pub async fn remove(&self, key: &str) -> std::io::Result<()> {
        if key.contains("://") || key.contains("..") {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(key)).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
