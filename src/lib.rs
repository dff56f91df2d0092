//! # 人像照片增强客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           展示层（CLI / 任意 UI，发送 SessionCommand）     │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ CommandReply / SessionEvent / SessionSnapshot
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (进程级统一错误)                │
//! │  │                                                       │
//! │  └─ enhance ──── SessionController 会话状态机             │
//! │      ├─ pipeline    校验 · 解码 · 降采样 · JPEG 编码       │
//! │      ├─ client      multipart 请求 (reqwest)              │
//! │      ├─ resources   对比句柄创建与统一释放                 │
//! │      └─ comparison  前后对比描述 · 滑块导航               │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ POST {base_url}/api/enhance_image
//!    远端增强服务（不在本仓库范围内）
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 进程级错误类型 `AppError`，CLI 入口的返回类型 |
//! | [`enhance`] | 选图归一化、增强请求、对比渲染、句柄生命周期、会话编排 |

pub mod enhance;
pub mod error;
