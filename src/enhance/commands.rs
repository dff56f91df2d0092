//! # 会话命令入口
//!
//! 展示层只发送 `SessionCommand`，不直接调用控制器的细粒度方法。
//! `dispatch` 永不返回错误：所有失败都被转换成一条错误提示，
//! 并附在回执中，会话不会因为某条命令失败而卡住。

use super::comparison::SliderSignal;
use super::session::{DownloadArtifact, NotificationKind, SessionController, SessionSnapshot};
use super::source::SourceImage;
use super::{EnhancementOptions, EnhancementTransport, SessionError};

/// 增强失败提示的前缀。
pub const FAILURE_NOTICE_PREFIX: &str = "增强失败：";

#[derive(Debug, Clone)]
pub enum SessionCommand {
    FileChosen(SourceImage),
    SetOptions(EnhancementOptions),
    Enhance,
    Download,
    Navigate(SliderSignal),
    Reset,
    Teardown,
}

impl SessionCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::FileChosen(_) => "file_chosen",
            Self::SetOptions(_) => "set_options",
            Self::Enhance => "enhance",
            Self::Download => "download",
            Self::Navigate(_) => "navigate",
            Self::Reset => "reset",
            Self::Teardown => "teardown",
        }
    }
}

/// 命令回执。
#[derive(Debug, Clone)]
pub struct CommandReply {
    pub snapshot: SessionSnapshot,
    pub artifact: Option<DownloadArtifact>,
    pub error: Option<SessionError>,
}

/// 面向用户的失败文案。
pub fn failure_notice(err: &SessionError) -> String {
    match err {
        SessionError::Request(request) => format!("{}{}", FAILURE_NOTICE_PREFIX, request.message),
        other => other.to_string(),
    }
}

impl<T: EnhancementTransport> SessionController<T> {
    pub async fn dispatch(&mut self, command: SessionCommand) -> CommandReply {
        let name = command.name();
        log::debug!("📨 处理会话命令：{}", name);

        let outcome: Result<Option<DownloadArtifact>, SessionError> = match command {
            SessionCommand::FileChosen(source) => self.select_image(source).await.map(|_| None),
            SessionCommand::SetOptions(options) => self.set_options(options).map(|_| None),
            SessionCommand::Enhance => self.enhance().await.map(|_| None),
            SessionCommand::Download => self.download().map(Some),
            SessionCommand::Navigate(signal) => {
                self.navigate(signal);
                Ok(None)
            }
            SessionCommand::Reset => {
                self.reset();
                Ok(None)
            }
            SessionCommand::Teardown => {
                self.teardown();
                Ok(None)
            }
        };

        let (artifact, error) = match outcome {
            Ok(artifact) => (artifact, None),
            Err(err) => {
                log::warn!("⚠️ 命令 {} 失败 [{}]：{}", name, err.code(), err);
                self.notify(NotificationKind::Error, failure_notice(&err));
                (None, Some(err))
            }
        };

        CommandReply {
            snapshot: self.snapshot(),
            artifact,
            error,
        }
    }
}
