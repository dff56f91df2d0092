//! # 预处理流水线模块（ImagePreprocessor）
//!
//! ## 设计思路
//!
//! 上传前把图片“归一化”：限制尺寸、统一编码为 JPEG，降低上传体积与服务端耗时。
//! 归一化只是优化而非正确性要求，因此解码/编码失败统一映射为
//! `ValidationError::ProcessingFailed`，由会话层回退为上传原图。
//!
//! ## 实现思路
//!
//! 1. 校验声明类型（`image/*`）与文件体积
//! 2. 读取图片头尺寸，按像素上限快速拒绝
//! 3. 完整解码，计算目标尺寸（长边不超过 `max_dimension`，等比缩放）
//! 4. 需要时降采样（`fast_image_resize`，失败回退 `resize_exact`）
//! 5. 按固定质量编码 JPEG，并校验输出确实是 JPEG
//!
//! 解码/编码在阻塞线程池中执行，调用方按顺序 `await`；
//! 解码缓冲随闭包作用域结束而释放，成功与各失败分支都不会遗留。

use std::io::Cursor;
use std::time::Instant;

use chrono::Utc;
use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, ImageReader, Rgb};

use super::source::{NormalizedImage, SourceImage};
use super::{EnhanceConfig, ValidationError};

/// 按长边上限计算目标尺寸。
///
/// 宽高都不超过上限时原样返回；否则两边按同一比例
/// `min(max/width, max/height)` 缩放，四舍五入且不小于 1。
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let ratio = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let scale = |side: u32| ((side as f64 * ratio).round() as u32).clamp(1, max_dimension);

    (scale(width), scale(height))
}

/// 图片归一化处理器。
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: EnhanceConfig,
}

struct Transcoded {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    source_width: u32,
    source_height: u32,
}

impl ImagePreprocessor {
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }

    /// 只做“选图即拒绝”的两项检查，不触碰像素数据。
    pub fn validate_source(&self, source: &SourceImage) -> Result<(), ValidationError> {
        if !source.is_declared_image() {
            return Err(ValidationError::NotAnImage(source.media_type().to_string()));
        }

        if source.byte_size() > self.config.max_file_size {
            return Err(ValidationError::TooLarge {
                size: source.byte_size(),
                limit: self.config.max_file_size,
            });
        }

        Ok(())
    }

    /// 归一化入口：校验 → 解码 → 缩放 → 编码。
    pub async fn normalize(&self, source: &SourceImage) -> Result<NormalizedImage, ValidationError> {
        self.validate_source(source)?;

        let start = Instant::now();
        let bytes = source.bytes().clone();
        let config = self.config.clone();

        let transcoded = tokio::task::spawn_blocking(move || Self::transcode(&bytes, &config))
            .await
            .map_err(|e| ValidationError::ProcessingFailed(format!("预处理任务异常终止：{}", e)))??;

        log::info!(
            "✅ 图片归一化完成 - 文件: {} 尺寸: {}x{} -> {}x{} 体积: {} -> {} bytes 耗时: {}ms",
            source.file_name(),
            transcoded.source_width,
            transcoded.source_height,
            transcoded.width,
            transcoded.height,
            source.byte_size(),
            transcoded.bytes.len(),
            start.elapsed().as_millis()
        );

        Ok(NormalizedImage {
            file_name: source.file_name().to_string(),
            bytes: transcoded.bytes.into(),
            width: transcoded.width,
            height: transcoded.height,
            last_modified: Utc::now(),
        })
    }

    fn transcode(bytes: &[u8], config: &EnhanceConfig) -> Result<Transcoded, ValidationError> {
        let (header_width, header_height) = Self::inspect_dimensions(bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ValidationError::ProcessingFailed(format!("图片解码失败：{}", e)))?;
        let (source_width, source_height) = decoded.dimensions();

        let (width, height) = target_dimensions(source_width, source_height, config.max_dimension);
        let resized = if (width, height) == (source_width, source_height) {
            decoded
        } else {
            Self::downscale(decoded, width, height, config.resampling.filter())
        };

        let encoded = Self::encode_jpeg(&resized, config.jpeg_quality)?;

        Ok(Transcoded {
            bytes: encoded,
            width,
            height,
            source_width,
            source_height,
        })
    }

    /// 仅通过图片头读取宽高，用于完整解码前的像素检查。
    fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), ValidationError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ValidationError::ProcessingFailed(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| ValidationError::ProcessingFailed(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(
        config: &EnhanceConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ValidationError> {
        let pixels = (width as u64) * (height as u64);

        if pixels > config.max_decoded_pixels {
            return Err(ValidationError::ProcessingFailed(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn downscale(image: DynamicImage, width: u32, height: u32, filter: FilterType) -> DynamicImage {
        log::debug!(
            "🧩 降采样：{}x{} -> {}x{}（filter={:?}）",
            image.width(),
            image.height(),
            width,
            height,
            filter
        );

        match Self::resize_with_fast_image_resize(&image, width, height, filter) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                image.resize_exact(width, height, filter)
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<DynamicImage, ValidationError> {
        let src = image.to_rgb8();
        let (src_width, src_height) = src.dimensions();

        let src_image =
            fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x3)
                .map_err(|e| ValidationError::ProcessingFailed(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x3);

        let mut resizer = fr::Resizer::new();
        let options =
            fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ValidationError::ProcessingFailed(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgb = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| {
                ValidationError::ProcessingFailed("fast_image_resize 输出缓冲长度异常".to_string())
            })?;

        Ok(DynamicImage::ImageRgb8(rgb))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest => fr::FilterType::Box,
            FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    /// JPEG 不支持透明通道，编码前统一转为 RGB。
    fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ValidationError> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buffer = Cursor::new(Vec::new());

        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
            .map_err(|e| ValidationError::ProcessingFailed(format!("JPEG 编码失败：{}", e)))?;

        let encoded = buffer.into_inner();
        if encoded.is_empty() || image::guess_format(&encoded).ok() != Some(ImageFormat::Jpeg) {
            return Err(ValidationError::ProcessingFailed("编码输出不是有效的 JPEG".to_string()));
        }

        Ok(encoded)
    }
}
