// secure_share_client/src/reconnect.rs

//! 重连退避策略。
//!
//! 连接管理器在连接失败或意外断开后按指数退避序列安排重连：
//! 首次延迟为基础延迟，其后每次乘以增长系数，可选上限封顶；
//! 达到尝试次数上限后策略耗尽，连接管理器转入终态 `Unavailable`。
//! 连接成功建立时调用 [`ReconnectPolicy::reset`]，计数与延迟全部归零。

use std::time::Duration;

/// 指数退避重连策略。
///
/// 非线程安全，由连接生命周期任务独占持有 (通常包在 `TokioMutex` 里)。
#[derive(Debug)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    factor: f64,
    max_attempts: u32,
    max_delay: Option<Duration>,
    attempts: u32,
    current_delay: Duration,
}

impl ReconnectPolicy {
    /// 创建一个新的退避策略。
    ///
    /// # 参数
    /// * `base_delay`: 首次重连前的延迟。
    /// * `factor`: 每次失败后延迟的增长系数。
    /// * `max_attempts`: 尝试次数上限，超过后 [`next_delay`](Self::next_delay) 返回 `None`。
    /// * `max_delay`: 延迟上限，`None` 表示不封顶。
    pub fn new(
        base_delay: Duration,
        factor: f64,
        max_attempts: u32,
        max_delay: Option<Duration>,
    ) -> Self {
        Self {
            base_delay,
            factor,
            max_attempts,
            max_delay,
            attempts: 0,
            current_delay: base_delay,
        }
    }

    /// 重置策略：清零尝试计数，延迟回到基础值。连接成功建立时调用。
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_delay = self.base_delay;
    }

    /// 已消耗的重连尝试次数。
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 策略是否已耗尽 (尝试次数达到上限)。
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// 取出下一次重连前应等待的延迟，并推进内部状态。
    ///
    /// 返回 `None` 表示策略已耗尽，调用方不应再安排重连。
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;

        let delay = self.current_delay;
        let mut grown = self.current_delay.mul_f64(self.factor);
        if let Some(cap) = self.max_delay {
            if grown > cap {
                grown = cap;
            }
        }
        self.current_delay = grown;
        Some(delay)
    }
}
