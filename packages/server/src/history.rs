//! Bounded in-memory chat history.
//!
//! ## 責務
//!
//! - 過去のチャットメッセージを追記順に保持する
//! - 新規参加クライアントへ送る履歴スナップショットを提供する
//!
//! 履歴は容量上限付きのリングとして保持し、上限を超えたら最古のメッセージを
//! 捨てます（プロセス存続期間のみ、再起動をまたぐ永続化はしません）。
//! 参加・退出通知は履歴に残さず、Chat のみを追記するのは呼び出し側の規約です。

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::domain::ChatMessage;

/// Bounded, append-only log of past chat messages
pub struct MessageHistory {
    capacity: usize,
    inner: Mutex<VecDeque<ChatMessage>>,
}

impl MessageHistory {
    /// Default maximum number of retained messages
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a history with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a history bounded to `capacity` messages (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append one message, evicting the oldest entry when full
    pub async fn append(&self, message: ChatMessage) {
        let mut messages = self.inner.lock().await;
        if messages.len() == self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    /// Copy the current contents in append order
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        let messages = self.inner.lock().await;
        messages.iter().cloned().collect()
    }

    /// Number of retained messages
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the history is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}
