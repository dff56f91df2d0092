//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `EnhanceConfig`：服务地址、体积上限、尺寸上限、
//! 编码质量与缩放滤镜。默认值即生产口径（10 MiB / 2048px / JPEG 85）。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用配置，`#[serde(default)]` 允许 JSON 只写部分字段。
//! - `ResamplingProfile` 负责档位字符串解析与反向输出，并映射到具体滤镜。
//! - `load_from_path` 读取 JSON 配置文件，解析失败返回 `ConfigError`。

use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// 远端增强接口的固定路径。
pub const ENHANCE_ENDPOINT_PATH: &str = "/api/enhance_image";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("读取配置文件失败：{0}")]
    Io(#[from] std::io::Error),

    #[error("解析配置文件失败：{0}")]
    Parse(#[from] serde_json::Error),

    #[error("未知缩放档位：{0}（可选：quality / balanced / speed）")]
    UnknownProfile(String),

    #[error("配置项无效：{0}")]
    Invalid(String),
}

/// 客户端处理配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// 增强服务根地址，请求会发往 `{base_url}/api/enhance_image`。
    pub base_url: String,
    /// 选图时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 归一化后宽/高单边最大值。
    pub max_dimension: u32,
    /// 重新编码的 JPEG 质量（1~100）。
    pub jpeg_quality: u8,
    /// 解码前按图片头尺寸做的像素上限检查，防止解压炸弹。
    /// 默认值需容纳 200 MP 级别的相机原图。
    pub max_decoded_pixels: u64,
    pub resampling: ResamplingProfile,
    /// 是否读取系统代理环境变量（`HTTP_PROXY` 等）。
    pub use_system_proxy: bool,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            max_file_size: 10 * 1024 * 1024,
            max_dimension: 2048,
            jpeg_quality: 85,
            max_decoded_pixels: 250_000_000,
            resampling: ResamplingProfile::Balanced,
            use_system_proxy: true,
        }
    }
}

impl EnhanceConfig {
    /// 从 JSON 文件加载配置，缺省字段取默认值。
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("⚙️ 已加载配置文件：{}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality 必须在 1~100 之间（当前：{}）",
                self.jpeg_quality
            )));
        }
        if self.max_dimension == 0 {
            return Err(ConfigError::Invalid("max_dimension 不能为 0".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Invalid("max_file_size 不能为 0".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url 仅支持 HTTP/HTTPS：{}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// 拼接完整的增强接口地址。
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), ENHANCE_ENDPOINT_PATH)
    }
}

/// 缩放档位（面向用户语义）。
///
/// - `Quality`：CatmullRom，尽量保真
/// - `Balanced`：Triangle，质量与速度平衡
/// - `Speed`：Nearest，优先速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingProfile {
    Quality,
    Balanced,
    Speed,
}

impl ResamplingProfile {
    pub fn parse(profile: &str) -> Result<Self, ConfigError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    pub fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::CatmullRom,
            Self::Balanced => FilterType::Triangle,
            Self::Speed => FilterType::Nearest,
        }
    }
}
