//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“用户选择的原图”“归一化后的上传图”“服务返回的增强图”拆成独立类型：
//! - `SourceImage`：选图时捕获，之后不可变
//! - `NormalizedImage`：缩放 + 重新编码后的 JPEG
//! - `SessionImage`：会话里“待提交的图”，归一化失败时回退为原图
//! - `EnhancedImage`：一次成功往返的结果
//!
//! 字节统一使用 `bytes::Bytes`，句柄与渲染共享同一缓冲时只增加引用计数。

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// 用户选择的原始图片。
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    file_name: String,
    media_type: String,
    bytes: Bytes,
}

impl SourceImage {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// 从本地文件捕获原图。
    ///
    /// 没有浏览器提供的“声明类型”，这里用文件签名推断；无法识别时记为
    /// `application/octet-stream`，交由预处理阶段拒绝。
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let media_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(FALLBACK_MEDIA_TYPE);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        log::debug!(
            "📁 已读取本地图片 - 文件: {} 类型: {} 大小: {} bytes",
            file_name,
            media_type,
            bytes.len()
        );

        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 声明类型是否属于 `image/*`（忽略大小写与参数部分）。
    pub fn is_declared_image(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

/// 归一化后的上传图：尺寸受限、固定 JPEG 编码。
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub(crate) file_name: String,
    pub(crate) bytes: Bytes,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) last_modified: DateTime<Utc>,
}

impl NormalizedImage {
    pub const MEDIA_TYPE: &'static str = "image/jpeg";

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}

/// 会话中待提交的图片。
#[derive(Debug, Clone, PartialEq)]
pub enum SessionImage {
    Normalized(NormalizedImage),
    /// 预处理失败时的回退值：原图原样上传。
    Original(SourceImage),
}

impl SessionImage {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Normalized(image) => image.file_name(),
            Self::Original(image) => image.file_name(),
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            Self::Normalized(_) => NormalizedImage::MEDIA_TYPE,
            Self::Original(image) => image.media_type(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Normalized(image) => image.bytes(),
            Self::Original(image) => image.bytes(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::Normalized(_))
    }
}

/// 增强服务返回的结果图。
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedImage {
    bytes: Bytes,
}

impl EnhancedImage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_image_check_ignores_case_and_params() {
        assert!(SourceImage::new("a.png", "IMAGE/PNG", vec![1]).is_declared_image());
        assert!(SourceImage::new("a.jpg", "image/jpeg; q=1", vec![1]).is_declared_image());
        assert!(!SourceImage::new("a.txt", "text/plain", vec![1]).is_declared_image());
        assert!(!SourceImage::new("a", "", vec![1]).is_declared_image());
    }

    #[test]
    fn original_fallback_keeps_declared_media_type() {
        let image = SessionImage::Original(SourceImage::new("photo.png", "image/png", vec![0; 12]));

        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.byte_size(), 12);
        assert!(!image.is_normalized());
    }

    #[tokio::test]
    async fn from_path_sniffs_media_type_from_signature() {
        let path = std::env::temp_dir().join(format!("photo-enhance-src-{}.bin", std::process::id()));
        let png_signature = [137_u8, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82];
        std::fs::write(&path, png_signature).unwrap();

        let image = SourceImage::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(image.media_type(), "image/png");
        assert!(image.file_name().starts_with("photo-enhance-src-"));
    }

    #[tokio::test]
    async fn from_path_marks_unknown_content_as_octet_stream() {
        let path = std::env::temp_dir().join(format!("photo-enhance-txt-{}.txt", std::process::id()));
        std::fs::write(&path, b"just some notes").unwrap();

        let image = SourceImage::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(image.media_type(), "application/octet-stream");
        assert!(!image.is_declared_image());
    }
}
