//! # 人像照片增强客户端 — 命令行入口
//!
//! 本文件仅负责参数解析、配置装配与单次会话驱动。
//! 业务逻辑分布在 `enhance` 子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use photo_enhance::enhance::{
    EnhanceConfig, EnhancementOptions, HttpEnhancementClient, ResamplingProfile, SessionCommand,
    SessionController, SessionError, SessionEvent, SourceImage,
};
use photo_enhance::error::AppError;

#[derive(Parser)]
#[command(name = "photo-enhance")]
#[command(about = "Normalize a portrait photo, send it to an enhancement service and save the result")]
struct Cli {
    /// Image file to enhance
    image: PathBuf,

    /// JSON config file (missing fields fall back to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enhancement service base URL, e.g. http://127.0.0.1:5000
    #[arg(long)]
    base_url: Option<String>,

    /// Directory the enhanced image is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Resampling profile: quality, balanced or speed
    #[arg(long)]
    resampling: Option<String>,

    /// Disable face alignment
    #[arg(long)]
    no_face_align: bool,

    /// Disable background enhancement
    #[arg(long)]
    no_background_enhance: bool,

    /// Disable face upsampling
    #[arg(long)]
    no_face_upsample: bool,

    /// Upscale factor (1-4)
    #[arg(long, default_value_t = 2)]
    upscale: u8,

    /// CodeFormer fidelity weight (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    fidelity: f32,
}

impl Cli {
    fn load_config(&self) -> Result<EnhanceConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => EnhanceConfig::load_from_path(path)?,
            None => EnhanceConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(profile) = &self.resampling {
            config.resampling = ResamplingProfile::parse(profile)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn options(&self) -> EnhancementOptions {
        EnhancementOptions {
            face_align: !self.no_face_align,
            background_enhance: !self.no_background_enhance,
            face_upsample: !self.no_face_upsample,
            upscale: self.upscale,
            codeformer_fidelity: self.fidelity,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    log::info!(
        "⚙️ 增强服务: {} 缩放档位: {}",
        config.endpoint_url(),
        config.resampling.as_str()
    );

    let transport = HttpEnhancementClient::new(&config).map_err(SessionError::from)?;
    let mut session = SessionController::new(transport, config);
    session.subscribe(|event| match event {
        SessionEvent::StateChanged { from, to } => log::info!("🔀 {:?} -> {:?}", from, to),
        SessionEvent::Failed { message } => log::warn!("⚠️ 增强失败：{}", message),
        other => log::debug!("📣 {:?}", other),
    });

    let source = SourceImage::from_path(&cli.image).await?;
    let options = cli.options();

    let outcome = tokio::select! {
        outcome = drive(&mut session, source, options, &cli.output_dir) => outcome,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("⚠️ 收到中断信号，结束会话");
            Ok(())
        }
    };

    session.teardown();
    outcome
}

/// 单次会话：选图 → 设置参数 → 增强 → 下载。
async fn drive(
    session: &mut SessionController<HttpEnhancementClient>,
    source: SourceImage,
    options: EnhancementOptions,
    output_dir: &Path,
) -> Result<(), AppError> {
    let commands = [
        SessionCommand::FileChosen(source),
        SessionCommand::SetOptions(options),
        SessionCommand::Enhance,
        SessionCommand::Download,
    ];

    for command in commands {
        let reply = session.dispatch(command).await;
        if let Some(err) = reply.error {
            return Err(err.into());
        }

        if let Some(artifact) = reply.artifact {
            let path = artifact.write_to(output_dir)?;
            log::info!("📁 结果已保存：{}", path.display());
            println!("{}", serde_json::to_string_pretty(&reply.snapshot)?);
        }
    }

    Ok(())
}
