// secure_share_client/src/token.rs

//! 会话令牌存储抽象。
//!
//! 连接管理器在连接建立后需要读取当前会话令牌来发送 `authenticate` 消息。
//! 令牌本身由认证子系统颁发与刷新，不属于本 Crate 的职责范围，
//! 因此这里只定义一个读取/更新接口 (`TokenStore` trait)，由宿主应用注入
//! 具体实现。同时提供一个基于内存的默认实现 (`InMemoryTokenStore`)，
//! 供测试和简单场景使用。

use std::sync::RwLock as StdRwLock;

/// 会话令牌存储接口。
///
/// 实现必须是线程安全的 (`Send + Sync`)：连接生命周期任务会在独立的
/// Tokio 任务中读取令牌。
pub trait TokenStore: Send + Sync {
    /// 读取当前会话令牌。无令牌 (未登录) 时返回 `None`，
    /// 此时连接管理器跳过 `authenticate` 消息，连接保持未认证状态。
    fn get_token(&self) -> Option<String>;

    /// 更新当前会话令牌。传入 `None` 表示清除令牌 (登出)。
    /// 更新只影响之后建立的连接，不会重新认证已有连接。
    fn set_token(&self, token: Option<String>);
}

/// 基于进程内存的 `TokenStore` 实现。
pub struct InMemoryTokenStore {
    token: StdRwLock<Option<String>>,
}

impl InMemoryTokenStore {
    /// 创建一个空的令牌存储。
    pub fn new() -> Self {
        Self { token: StdRwLock::new(None) }
    }

    /// 创建一个携带初始令牌的存储。
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: StdRwLock::new(Some(token.into())) }
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(), // 锁中毒时仍返回当前值
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 测试内存令牌存储的读写与清除。
    fn test_in_memory_token_store_set_get_clear() {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.get_token(), None);

        store.set_token(Some("session-abc".to_string()));
        assert_eq!(store.get_token().as_deref(), Some("session-abc"));

        store.set_token(None);
        assert_eq!(store.get_token(), None);

        let seeded = InMemoryTokenStore::with_token("t1");
        assert_eq!(seeded.get_token().as_deref(), Some("t1"));
    }
}
