//! # 会话编排模块（SessionController）
//!
//! ## 设计思路
//!
//! 一个 `SessionController` 实例持有“当前会话”的全部数据（当前图、结果、
//! 句柄、参数、滑块位置、提示），不使用任何进程级全局状态。
//!
//! 状态机：
//!
//! ```text
//! Idle ──选图──▶ ImageSelected ──enhance──▶ Submitting ──成功──▶ Resulted
//!   ▲                 ▲                         │
//!   │                 └──────── Failed ◀──失败──┘
//!   └──────────────── reset（任意状态） ─────────┘
//! ```
//!
//! ## 实现思路
//!
//! - 单线程协作式：预处理与网络请求是仅有的两个挂起点，互斥靠状态机拒绝重叠操作。
//! - 提交拆成 `begin_submission` / `complete_submission` 两段，中间由调用方 `await`
//!   远端请求；展示层可以在这期间发出 reset。
//! - 每次提交带一个代号（generation），reset 之后到达的旧结果按代号丢弃，不会渲染。
//! - 句柄只在结果到达后创建，并在渲染前完成；reset / teardown 统一 `release_all`。

use std::path::{Path, PathBuf};
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;

use super::client::EnhancementTransport;
use super::comparison::{
    next_position, ComparisonRenderer, RenderedComparisonDescriptor, SliderSignal, INITIAL_POSITION,
};
use super::pipeline::ImagePreprocessor;
use super::resources::ResourceLifecycleManager;
use super::source::{EnhancedImage, SessionImage, SourceImage};
use super::{
    EnhanceConfig, EnhancementOptions, PreconditionError, RequestError, SessionError, ValidationError,
};

/// 下载产物的固定文件名。
pub const DOWNLOAD_FILE_NAME: &str = "enhanced_image.webp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    ImageSelected,
    Submitting,
    Resulted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    Error,
    Success,
}

/// 面向用户的提示；新提示会替换旧提示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// 推送给展示层的会话事件。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    StateChanged { from: SessionState, to: SessionState },
    Resulted(RenderedComparisonDescriptor),
    Failed { message: String },
    Notified(Notification),
    NotificationsCleared,
    SliderMoved { position: f64 },
}

/// 一次在途提交的凭据。
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,
    image: SessionImage,
    options: EnhancementOptions,
}

impl SubmissionTicket {
    pub fn image(&self) -> &SessionImage {
        &self.image
    }

    pub fn options(&self) -> &EnhancementOptions {
        &self.options
    }
}

/// `complete_submission` 的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Rendered,
    /// 会话在请求途中被重置，结果已丢弃。
    Discarded,
}

/// 可导出的增强结果文件。
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub bytes: Bytes,
}

impl DownloadArtifact {
    /// 写入指定目录，返回完整路径。
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// 会话快照，展示层据此整体刷新。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub file_name: Option<String>,
    pub image_size: Option<u64>,
    pub normalized: bool,
    pub result_size: Option<u64>,
    pub options: EnhancementOptions,
    pub slider_position: f64,
    pub comparison: Option<RenderedComparisonDescriptor>,
    pub live_handles: usize,
    pub notification: Option<Notification>,
}

type Listener = Box<dyn FnMut(&SessionEvent) + Send>;

pub struct SessionController<T> {
    transport: T,
    preprocessor: ImagePreprocessor,
    renderer: ComparisonRenderer,
    resources: ResourceLifecycleManager,
    state: SessionState,
    current_image: Option<SessionImage>,
    result: Option<EnhancedImage>,
    comparison: Option<RenderedComparisonDescriptor>,
    options: EnhancementOptions,
    slider_position: f64,
    generation: u64,
    in_flight: Option<u64>,
    notification: Option<Notification>,
    listeners: Vec<Listener>,
}

impl<T: EnhancementTransport> SessionController<T> {
    pub fn new(transport: T, config: EnhanceConfig) -> Self {
        Self {
            transport,
            preprocessor: ImagePreprocessor::new(config),
            renderer: ComparisonRenderer::new(),
            resources: ResourceLifecycleManager::new(),
            state: SessionState::Idle,
            current_image: None,
            result: None,
            comparison: None,
            options: EnhancementOptions::default(),
            slider_position: INITIAL_POSITION,
            generation: 0,
            in_flight: None,
            notification: None,
            listeners: Vec::new(),
        }
    }

    /// 注册事件监听（展示层入口）。
    pub fn subscribe(&mut self, listener: impl FnMut(&SessionEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_image(&self) -> Option<&SessionImage> {
        self.current_image.as_ref()
    }

    pub fn result(&self) -> Option<&EnhancedImage> {
        self.result.as_ref()
    }

    pub fn comparison(&self) -> Option<&RenderedComparisonDescriptor> {
        self.comparison.as_ref()
    }

    pub fn options(&self) -> &EnhancementOptions {
        &self.options
    }

    pub fn slider_position(&self) -> f64 {
        self.slider_position
    }

    pub fn resources(&self) -> &ResourceLifecycleManager {
        &self.resources
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            file_name: self.current_image.as_ref().map(|image| image.file_name().to_string()),
            image_size: self.current_image.as_ref().map(SessionImage::byte_size),
            normalized: self
                .current_image
                .as_ref()
                .is_some_and(SessionImage::is_normalized),
            result_size: self.result.as_ref().map(EnhancedImage::byte_size),
            options: self.options,
            slider_position: self.slider_position,
            comparison: self.comparison.clone(),
            live_handles: self.resources.len(),
            notification: self.notification.clone(),
        }
    }

    /// 选图：校验 → 归一化（失败回退原图）→ 成为当前图。
    ///
    /// 类型或体积不合格时直接返回错误，会话保持原状。
    pub async fn select_image(&mut self, source: SourceImage) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(PreconditionError::AlreadySubmitting.into());
        }

        self.preprocessor.validate_source(&source)?;

        let image = match self.preprocessor.normalize(&source).await {
            Ok(normalized) => SessionImage::Normalized(normalized),
            Err(ValidationError::ProcessingFailed(reason)) => {
                log::warn!(
                    "⚠️ 图片归一化失败，回退上传原图 - 文件: {} 原因: {}",
                    source.file_name(),
                    reason
                );
                SessionImage::Original(source)
            }
            Err(err) => return Err(err.into()),
        };

        self.discard_outputs();
        self.current_image = Some(image);
        self.transition(SessionState::ImageSelected);
        Ok(())
    }

    pub fn set_options(&mut self, options: EnhancementOptions) -> Result<(), SessionError> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// 进入 Submitting，返回本次提交凭据。
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, SessionError> {
        if self.in_flight.is_some() {
            return Err(PreconditionError::AlreadySubmitting.into());
        }

        let image = self
            .current_image
            .clone()
            .ok_or(PreconditionError::NoImage)?;

        self.discard_outputs();
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.transition(SessionState::Submitting);

        Ok(SubmissionTicket {
            generation: self.generation,
            image,
            options: self.options,
        })
    }

    /// 处理远端返回。
    ///
    /// 失败时短暂进入 Failed 并上抛错误，随后回到 ImageSelected 以便重试。
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<EnhancedImage, RequestError>,
    ) -> Result<Completion, SessionError> {
        if self.in_flight != Some(ticket.generation) {
            log::warn!(
                "⚠️ 会话已重置，丢弃过期的增强结果（generation={}）",
                ticket.generation
            );
            return Ok(Completion::Discarded);
        }
        self.in_flight = None;

        let enhanced = match outcome {
            Ok(enhanced) => enhanced,
            Err(err) => {
                self.transition(SessionState::Failed);
                self.emit(SessionEvent::Failed {
                    message: err.message.clone(),
                });
                self.transition(SessionState::ImageSelected);
                return Err(err.into());
            }
        };

        let before = self.resources.create(ticket.image.bytes().clone());
        let after = self.resources.create(enhanced.bytes().clone());

        match self.renderer.render(&self.resources, &before, &after) {
            Ok(descriptor) => {
                self.result = Some(enhanced);
                self.comparison = Some(descriptor.clone());
                self.slider_position = descriptor.initial_position;
                self.transition(SessionState::Resulted);
                self.emit(SessionEvent::Resulted(descriptor));
                Ok(Completion::Rendered)
            }
            Err(err) => {
                self.resources.release_all();
                self.transition(SessionState::ImageSelected);
                Err(err.into())
            }
        }
    }

    /// 完整增强流程：begin → 远端请求 → complete。
    ///
    /// 整个往返期间持有 `&mut self`，这期间无法插入 reset 或第二次提交。
    /// 需要在请求途中响应用户操作的展示层应改用
    /// `begin_submission` / `complete_submission`，自行 `await` 传输层。
    pub async fn enhance(&mut self) -> Result<Completion, SessionError> {
        let ticket = self.begin_submission()?;
        let start = Instant::now();

        let outcome = self.transport.submit(&ticket.image, &ticket.options).await;
        log::info!(
            "⏱️ 增强往返结束 - 成功: {} 耗时: {}ms",
            outcome.is_ok(),
            start.elapsed().as_millis()
        );

        self.complete_submission(ticket, outcome)
    }

    pub fn download(&mut self) -> Result<DownloadArtifact, SessionError> {
        let result = self.result.as_ref().ok_or(PreconditionError::NoResult)?;

        let artifact = DownloadArtifact {
            file_name: DOWNLOAD_FILE_NAME,
            bytes: result.bytes().clone(),
        };
        self.notify(NotificationKind::Success, "图片下载成功");
        Ok(artifact)
    }

    /// 滑块键盘导航；没有对比视图时保持不动。
    pub fn navigate(&mut self, signal: SliderSignal) -> f64 {
        if self.comparison.is_none() {
            return self.slider_position;
        }

        self.slider_position = next_position(self.slider_position, signal);
        self.emit(SessionEvent::SliderMoved {
            position: self.slider_position,
        });
        self.slider_position
    }

    /// 回到 Idle：释放全部句柄、丢弃图片与结果、恢复默认参数、清空提示。
    pub fn reset(&mut self) {
        if self.in_flight.take().is_some() {
            log::warn!("⚠️ 请求途中重置会话，结果到达后将被丢弃");
        }

        self.discard_outputs();
        self.current_image = None;
        self.options = EnhancementOptions::default();
        self.clear_notifications();
        self.transition(SessionState::Idle);
    }

    /// 进程/页面退出时调用：释放全部句柄并回到 Idle，
    /// 快照中不再出现指向已释放句柄的对比视图。
    pub fn teardown(&mut self) {
        let live = self.resources.len();
        self.reset();
        log::info!("👋 会话关闭，释放资源句柄 {} 个", live);
    }

    pub(crate) fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
        };
        self.notification = Some(notification.clone());
        self.emit(SessionEvent::Notified(notification));
    }

    fn clear_notifications(&mut self) {
        if self.notification.take().is_some() {
            self.emit(SessionEvent::NotificationsCleared);
        }
    }

    fn discard_outputs(&mut self) {
        self.resources.release_all();
        self.result = None;
        self.comparison = None;
        self.slider_position = INITIAL_POSITION;
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        log::debug!("🔀 会话状态：{:?} -> {:?}", from, to);
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn emit(&mut self, event: SessionEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
