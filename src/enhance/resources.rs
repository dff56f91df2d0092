//! # 资源句柄生命周期（ResourceLifecycleManager）
//!
//! ## 设计思路
//!
//! 预览与对比视图需要“可被展示层引用的字节缓冲”，这里用 `ResourceHandle`
//! 表示（类 `blob:` 地址）。所有句柄只能由本管理器创建与释放：
//! - 创建顺序即追踪顺序，释放时按创建顺序返回，便于测试断言
//! - `release_all` 幂等，空集合上调用不做任何事
//! - 句柄编号单调递增且不复用，已释放的句柄永远无法再解析
//!
//! 会话重置与进程退出（`Drop`）都会触发整体释放，反复使用不会积累内存。

use bytes::Bytes;
use serde::Serialize;

use super::ResourceError;

const HANDLE_URL_PREFIX: &str = "blob:photo-enhance/";

/// 指向内存缓冲的不透明句柄。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceHandle {
    id: u64,
    url: String,
    byte_size: u64,
}

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

#[derive(Debug, Default)]
pub struct ResourceLifecycleManager {
    next_id: u64,
    live: Vec<(ResourceHandle, Bytes)>,
}

impl ResourceLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为缓冲创建句柄并纳入追踪。
    pub fn create(&mut self, buffer: Bytes) -> ResourceHandle {
        self.next_id += 1;
        let handle = ResourceHandle {
            id: self.next_id,
            url: format!("{}{}", HANDLE_URL_PREFIX, self.next_id),
            byte_size: buffer.len() as u64,
        };

        log::debug!("🔗 创建资源句柄 {}（{} bytes）", handle.url, handle.byte_size);
        self.live.push((handle.clone(), buffer));
        handle
    }

    /// 解析句柄对应的缓冲；已释放的句柄返回错误。
    pub fn resolve(&self, handle: &ResourceHandle) -> Result<&Bytes, ResourceError> {
        self.live
            .iter()
            .find(|(live, _)| live.id == handle.id)
            .map(|(_, buffer)| buffer)
            .ok_or(ResourceError::Released(handle.id))
    }

    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.live.iter().any(|(live, _)| live.id == handle.id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.live.iter().map(|(handle, _)| handle)
    }

    /// 释放全部句柄，按创建顺序返回被释放的句柄。
    pub fn release_all(&mut self) -> Vec<ResourceHandle> {
        if self.live.is_empty() {
            return Vec::new();
        }

        let released: Vec<ResourceHandle> = self.live.drain(..).map(|(handle, _)| handle).collect();
        log::debug!("🧹 已释放 {} 个资源句柄", released.len());
        released
    }
}

impl Drop for ResourceLifecycleManager {
    fn drop(&mut self) {
        if !self.live.is_empty() {
            log::debug!("🧹 退出前释放残留资源句柄：{} 个", self.live.len());
            self.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_tracks_handles_in_creation_order() {
        let mut manager = ResourceLifecycleManager::new();

        let first = manager.create(Bytes::from_static(b"original"));
        let second = manager.create(Bytes::from_static(b"enhanced!"));

        assert_eq!(manager.len(), 2);
        assert_eq!(first.byte_size(), 8);
        assert_eq!(second.byte_size(), 9);
        assert_ne!(first.url(), second.url());
        assert!(first.url().starts_with("blob:"));
        assert_eq!(manager.handles().cloned().collect::<Vec<_>>(), vec![first, second]);
    }

    #[test]
    fn release_all_invalidates_every_handle() {
        let mut manager = ResourceLifecycleManager::new();
        let first = manager.create(Bytes::from_static(b"a"));
        let second = manager.create(Bytes::from_static(b"b"));

        let released = manager.release_all();

        assert_eq!(released, vec![first.clone(), second.clone()]);
        assert!(manager.is_empty());
        assert!(!manager.is_live(&first));
        assert_eq!(manager.resolve(&second), Err(ResourceError::Released(second.id())));
    }

    #[test]
    fn release_all_twice_is_noop() {
        let mut manager = ResourceLifecycleManager::new();
        manager.create(Bytes::from_static(b"a"));

        assert_eq!(manager.release_all().len(), 1);
        assert!(manager.release_all().is_empty());
        assert!(manager.is_empty());
    }

    #[test]
    fn handle_ids_are_never_reused_after_release() {
        let mut manager = ResourceLifecycleManager::new();
        let old = manager.create(Bytes::from_static(b"a"));
        manager.release_all();

        let fresh = manager.create(Bytes::from_static(b"a"));

        assert_ne!(old.id(), fresh.id());
        assert!(!manager.is_live(&old));
        assert_eq!(manager.resolve(&fresh).map(|b| b.len()), Ok(1));
    }
}
