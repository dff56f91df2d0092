//! # 增强请求模块（EnhancementClient）
//!
//! ## 设计思路
//!
//! 网络边界只有这一处：把“待提交的图 + 增强参数”编码成 multipart 表单，
//! 单次 POST 到固定接口，拿回增强后的图片字节。
//!
//! 远端算法不在本仓库范围内，因此会话层只依赖 `EnhancementTransport`
//! 这一能力接口：任何“收字节 + 参数、回字节 + 状态”的实现都可以替换 HTTP。
//!
//! ## 实现思路
//!
//! - 不重试、不设请求超时，失败直接上抛给会话层。
//! - 非 2xx：解析 JSON 错误体中的 `error` 字段，缺失或解析失败时使用通用文案。
//! - 2xx：响应体即结果图，原样包装为 `EnhancedImage`。
//! - 日志中的地址去掉 query/fragment，避免泄露签名参数。

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::source::{EnhancedImage, SessionImage};
use super::{EnhanceConfig, EnhancementOptions, RequestError};

/// 服务端没有给出可读错误时的通用文案。
pub const GENERIC_FAILURE_MESSAGE: &str = "增强失败";

/// 远端增强能力接口。
#[async_trait]
pub trait EnhancementTransport: Send + Sync {
    async fn submit(
        &self,
        image: &SessionImage,
        options: &EnhancementOptions,
    ) -> Result<EnhancedImage, RequestError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// 基于 `reqwest` 的 HTTP 实现。
#[derive(Debug, Clone)]
pub struct HttpEnhancementClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEnhancementClient {
    pub fn new(config: &EnhanceConfig) -> Result<Self, RequestError> {
        let mut builder = reqwest::Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| RequestError::new(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(image: &SessionImage, options: &EnhancementOptions) -> Result<Form, RequestError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.media_type())
            .map_err(|e| RequestError::new(format!("图片类型无效：{}", e)))?;

        let form = options
            .form_fields()
            .into_iter()
            .fold(Form::new().part("image", part), |form, (name, value)| {
                form.text(name, value)
            });

        Ok(form)
    }

    /// 从失败响应体中提取错误文案。
    pub(crate) fn parse_error_message(body: &[u8]) -> String {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }

    fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

        format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> RequestError {
        let redacted = Self::redact_url_for_log(&self.endpoint);
        let err_msg = e.to_string().replace(&self.endpoint, &redacted);

        if e.is_connect() {
            RequestError::new(format!("无法连接增强服务：{}", err_msg))
        } else {
            RequestError::new(format!("请求失败：{}", err_msg))
        }
    }
}

#[async_trait]
impl EnhancementTransport for HttpEnhancementClient {
    async fn submit(
        &self,
        image: &SessionImage,
        options: &EnhancementOptions,
    ) -> Result<EnhancedImage, RequestError> {
        let start = Instant::now();
        let form = Self::build_form(image, options)?;

        log::info!(
            "🌐 提交增强请求 - 地址: {} 文件: {} 大小: {} bytes",
            Self::redact_url_for_log(&self.endpoint),
            image.file_name(),
            image.byte_size()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            let message = Self::parse_error_message(&body);
            log::error!("❌ 增强服务返回 HTTP {}：{}", status.as_u16(), message);
            return Err(RequestError::new(message));
        }

        log::info!(
            "✅ 增强完成 - 结果大小: {} bytes 耗时: {}ms",
            body.len(),
            start.elapsed().as_millis()
        );

        Ok(EnhancedImage::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_reads_error_field() {
        assert_eq!(
            HttpEnhancementClient::parse_error_message(br#"{"error":"model unavailable"}"#),
            "model unavailable"
        );
    }

    #[test]
    fn parse_error_message_falls_back_to_generic_text() {
        assert_eq!(
            HttpEnhancementClient::parse_error_message(b"<html>502 Bad Gateway</html>"),
            GENERIC_FAILURE_MESSAGE
        );
        assert_eq!(
            HttpEnhancementClient::parse_error_message(br#"{"detail":"nope"}"#),
            GENERIC_FAILURE_MESSAGE
        );
        assert_eq!(
            HttpEnhancementClient::parse_error_message(br#"{"error":"   "}"#),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted = HttpEnhancementClient::redact_url_for_log(
            "https://enhance.example.com:8443/api/enhance_image?token=abc123#frag",
        );

        assert_eq!(redacted, "https://enhance.example.com:8443/api/enhance_image");
    }

    #[test]
    fn endpoint_is_built_from_base_url() {
        let config = EnhanceConfig {
            base_url: "http://10.0.0.7:5000/".to_string(),
            use_system_proxy: false,
            ..EnhanceConfig::default()
        };

        let client = HttpEnhancementClient::new(&config).expect("client init failed");

        assert_eq!(client.endpoint(), "http://10.0.0.7:5000/api/enhance_image");
    }
}
