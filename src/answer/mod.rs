//! # 回答模块（answer）
//!
//! ## 设计思路
//!
//! 回答服务被视为一个不透明的“请求 → 响应”边界：
//! 输入 `(系统提示词, 问题文本)`，输出回答文本或分类后的 `ServiceError`。
//! 重试、流式输出与限流退避都不在这一层实现。
//!
//! - `mod.rs`：`Answer` / `ErrorKind` / `ServiceError` 与 `AnswerService` trait
//! - `openai`：基于 chat-completions 协议的 reqwest 实现

pub mod openai;

use std::future::Future;

use chrono::{DateTime, Local};

use crate::settings::Credential;

/// 失败回答的分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 未配置密钥，未发起网络请求
    MissingCredential,
    /// 远程调用失败（网络、鉴权、额度、响应格式等）
    ServiceError,
}

/// 每个问题产生且只产生一个回答，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    text: String,
    error_kind: Option<ErrorKind>,
    created_at: DateTime<Local>,
}

impl Answer {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error_kind: None,
            created_at: Local::now(),
        }
    }

    pub fn failure(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error_kind: Some(kind),
            created_at: Local::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn succeeded(&self) -> bool {
        self.error_kind.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}

/// 回答服务错误。处理器会把所有分支折叠为 `ErrorKind::ServiceError`。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("service returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// 回答服务契约：一次阻塞式远程调用，超时由实现方决定。
pub trait AnswerService {
    fn complete(
        &self,
        credential: &Credential,
        system_prompt: &str,
        question: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}
