//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 按“出错阶段”拆成四类错误，而不是一个大而全的字符串错误：
//! - `ValidationError`：选图/预处理阶段（类型、体积、解码编码、参数）
//! - `RequestError`：远端增强服务的往返
//! - `PreconditionError`：用户操作与会话状态不匹配
//! - `ResourceError`：句柄生命周期被违反
//!
//! `SessionError` 汇总以上四类，作为会话控制器的统一返回类型；
//! 每个错误都提供稳定的 `code()`，供展示层做分支处理。

/// 选图与预处理阶段的错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("请选择有效的图片文件（声明类型：{0}）")]
    NotAnImage(String),

    #[error("文件过大：{:.2} MB（限制：{:.2} MB）", mib(.size), mib(.limit))]
    TooLarge { size: u64, limit: u64 },

    /// 唯一带自动恢复路径的错误：调用方应回退为上传原图。
    #[error("图片预处理失败：{0}")]
    ProcessingFailed(String),

    #[error("增强参数无效：{0}")]
    InvalidOption(String),
}

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

/// 远端增强请求失败。
///
/// `message` 保留服务端返回的原始文案（或通用兜底文案），不做二次包装。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 操作前置条件不满足。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("请先选择一张图片")]
    NoImage,

    #[error("已有增强请求在处理中")]
    AlreadySubmitting,

    #[error("当前没有可下载的增强结果")]
    NoResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("资源句柄 #{0} 已释放")]
    Released(u64),
}

/// 会话层统一错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl SessionError {
    /// 稳定错误码，展示层据此选择提示样式。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::NotAnImage(_)) => "not_an_image",
            Self::Validation(ValidationError::TooLarge { .. }) => "too_large",
            Self::Validation(ValidationError::ProcessingFailed(_)) => "processing_failed",
            Self::Validation(ValidationError::InvalidOption(_)) => "invalid_option",
            Self::Request(_) => "request_failed",
            Self::Precondition(PreconditionError::NoImage) => "no_image",
            Self::Precondition(PreconditionError::AlreadySubmitting) => "already_submitting",
            Self::Precondition(PreconditionError::NoResult) => "no_result",
            Self::Resource(_) => "resource_released",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message_reports_megabytes() {
        let err = ValidationError::TooLarge {
            size: 12 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };

        assert_eq!(err.to_string(), "文件过大：12.00 MB（限制：10.00 MB）");
    }

    #[test]
    fn request_error_displays_raw_message() {
        let err = SessionError::from(RequestError::new("model unavailable"));

        assert_eq!(err.to_string(), "model unavailable");
        assert_eq!(err.code(), "request_failed");
    }
}
