//! # 对比视图模块（ComparisonRenderer）
//!
//! ## 设计思路
//!
//! 核心不直接绘制界面，只产出一份 `RenderedComparisonDescriptor`：
//! 两个句柄 + 标签 + 体积统计，交给展示层绘制“前后对比”滑块。
//!
//! 滑块的键盘导航是纯函数 `next_position(当前位置, 信号)`，
//! 与任何状态无关，可独立测试。

use serde::Serialize;

use super::resources::{ResourceHandle, ResourceLifecycleManager};
use super::ResourceError;

pub const ORIGINAL_LABEL: &str = "Original";
pub const ENHANCED_LABEL: &str = "Enhanced";
/// 增强服务固定返回 WebP。
pub const RESULT_FORMAT_LABEL: &str = "WebP";

pub const POSITION_FLOOR: f64 = 0.0;
pub const POSITION_CEILING: f64 = 100.0;
pub const POSITION_STEP: f64 = 5.0;
pub const INITIAL_POSITION: f64 = 50.0;

/// 滑块导航信号：四个方向 + 两个边界。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SliderSignal {
    Left,
    Down,
    Right,
    Up,
    Home,
    End,
}

impl SliderSignal {
    /// 键名映射，非导航键返回 `None`。
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::Left),
            "ArrowDown" => Some(Self::Down),
            "ArrowRight" => Some(Self::Right),
            "ArrowUp" => Some(Self::Up),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            _ => None,
        }
    }
}

/// 根据导航信号计算滑块新位置。
pub fn next_position(current: f64, signal: SliderSignal) -> f64 {
    match signal {
        SliderSignal::Left | SliderSignal::Down => (current - POSITION_STEP).max(POSITION_FLOOR),
        SliderSignal::Right | SliderSignal::Up => (current + POSITION_STEP).min(POSITION_CEILING),
        SliderSignal::Home => POSITION_FLOOR,
        SliderSignal::End => POSITION_CEILING,
    }
}

/// 人类可读的体积文案（1024 进制，最多两位小数）。
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", trimmed, UNITS[exponent])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub label: &'static str,
    pub handle: ResourceHandle,
    pub byte_size: u64,
    pub display_size: String,
}

impl ComparisonEntry {
    fn new(label: &'static str, handle: &ResourceHandle) -> Self {
        Self {
            label,
            handle: handle.clone(),
            byte_size: handle.byte_size(),
            display_size: format_file_size(handle.byte_size()),
        }
    }
}

/// 交给展示层的对比视图描述。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedComparisonDescriptor {
    pub before: ComparisonEntry,
    pub after: ComparisonEntry,
    pub format: &'static str,
    pub initial_position: f64,
}

impl RenderedComparisonDescriptor {
    pub fn entries(&self) -> [&ComparisonEntry; 2] {
        [&self.before, &self.after]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ComparisonRenderer;

impl ComparisonRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 构建对比描述；任一句柄已释放时拒绝渲染。
    pub fn render(
        &self,
        resources: &ResourceLifecycleManager,
        before: &ResourceHandle,
        after: &ResourceHandle,
    ) -> Result<RenderedComparisonDescriptor, ResourceError> {
        resources.resolve(before)?;
        resources.resolve(after)?;

        Ok(RenderedComparisonDescriptor {
            before: ComparisonEntry::new(ORIGINAL_LABEL, before),
            after: ComparisonEntry::new(ENHANCED_LABEL, after),
            format: RESULT_FORMAT_LABEL,
            initial_position: INITIAL_POSITION,
        })
    }
}
