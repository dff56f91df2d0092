//! # 照片增强会话模块（enhance）
//!
//! ## 设计思路
//!
//! 把“选图 → 归一化 → 远端增强 → 前后对比 → 下载”按职责拆成子模块，
//! 由 `SessionController` 统一编排，展示层只与控制器交互。
//!
//! - `commands`：命令入口，错误统一转为提示（薄封装）
//! - `session`：会话状态机 + 事件推送
//! - `pipeline`：类型/体积校验、解码、降采样、JPEG 编码
//! - `client`：multipart 请求与错误体解析
//! - `resources`：对比视图句柄的创建与统一释放
//! - `comparison`：对比描述、滑块导航、体积文案
//! - `config/error/options/source`：配置、错误、增强参数、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! 展示层 SessionCommand
//!    ↓
//! commands.rs（dispatch，错误 → 提示）
//!    ↓
//! session.rs（状态机 + 代号校验）
//!    ├─ pipeline.rs（选图时归一化，失败回退原图）
//!    ├─ client.rs（提交增强请求）
//!    ├─ resources.rs（结果到达后创建句柄）
//!    └─ comparison.rs（生成对比描述）
//!    ↓
//! SessionEvent / SessionSnapshot 回到展示层
//! ```

pub mod commands;
mod client;
mod comparison;
mod config;
mod error;
mod options;
mod pipeline;
mod resources;
mod session;
mod source;

pub use client::{EnhancementTransport, HttpEnhancementClient, GENERIC_FAILURE_MESSAGE};
pub use commands::{failure_notice, CommandReply, SessionCommand};
pub use comparison::{
    format_file_size, next_position, ComparisonEntry, ComparisonRenderer,
    RenderedComparisonDescriptor, SliderSignal,
};
pub use config::{ConfigError, EnhanceConfig, ResamplingProfile, ENHANCE_ENDPOINT_PATH};
pub use error::{PreconditionError, RequestError, ResourceError, SessionError, ValidationError};
pub use options::EnhancementOptions;
pub use pipeline::{target_dimensions, ImagePreprocessor};
pub use resources::{ResourceHandle, ResourceLifecycleManager};
pub use session::{
    Completion, DownloadArtifact, Notification, NotificationKind, SessionController,
    SessionEvent, SessionSnapshot, SessionState, SubmissionTicket, DOWNLOAD_FILE_NAME,
};
pub use source::{EnhancedImage, NormalizedImage, SessionImage, SourceImage};
