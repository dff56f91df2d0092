//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 会话内的错误（`SessionError`）由控制器自己转为提示，不会冒泡到这里；
//! `AppError` 只承载进程入口会遇到的失败：配置、文件读写、结果输出，
//! 以及 CLI 单次运行时需要以非零状态码退出的会话错误。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为各子模块错误提供 `From` 转换，入口处直接 `?`。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 输出。

use serde::Serialize;

use crate::enhance::{ConfigError, SessionError};

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 会话操作失败（校验 / 请求 / 前置条件 / 句柄）
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 结果序列化失败
    #[error("输出序列化失败: {0}")]
    Output(#[from] serde_json::Error),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
