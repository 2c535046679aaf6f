//! # chat-completions 回答服务
//!
//! ## 实现思路
//!
//! - 请求体：`{model, messages: [system, user]}`，密钥走 Bearer 头。
//! - 回答取第一个 choice 的 `message.content`。
//! - 非 2xx 状态按语义分类：401/403 鉴权、429 额度，其余保留状态码与摘要。
//! - 超时与连接失败由 reqwest 错误类型区分，错误消息中不会出现密钥。
//! - HTTP 客户端只构建一次并复用。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AnswerService, ServiceError};
use crate::settings::Credential;

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// 回答服务配置，随 `settings.json` 一起持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerServiceConfig {
    /// API 根地址，末尾的 `/` 会被忽略。
    pub base_url: String,
    pub model: String,
    /// 单次请求总超时（秒）。
    pub request_timeout_secs: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout_secs: u64,
}

impl Default for AnswerServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// 基于 reqwest 的 chat-completions 客户端。
pub struct OpenAiAnswerService {
    client: reqwest::Client,
    config: AnswerServiceConfig,
}

impl OpenAiAnswerService {
    pub fn new(config: AnswerServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.config.request_timeout_secs)
        } else if e.is_connect() {
            ServiceError::Network(format!("cannot connect: {}", e))
        } else if e.is_decode() {
            ServiceError::MalformedResponse(e.to_string())
        } else {
            ServiceError::Network(format!("request failed: {}", e))
        }
    }
}

impl AnswerService for OpenAiAnswerService {
    async fn complete(
        &self,
        credential: &Credential,
        system_prompt: &str,
        question: &str,
    ) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        log::debug!("🌐 请求回答服务 model={}", self.config.model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;
        extract_answer(body)
    }
}

fn classify_status(status: u16, body: &str) -> ServiceError {
    let message = error_message_from_body(body);
    match status {
        401 | 403 => ServiceError::Authentication(message),
        429 => ServiceError::Quota(message),
        _ => ServiceError::Http {
            status,
            body: message,
        },
    }
}

fn error_message_from_body(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > ERROR_BODY_PREVIEW_CHARS {
        let preview: String = trimmed.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        format!("{preview}…")
    } else {
        trimmed.to_string()
    }
}

fn extract_answer(body: ChatResponse) -> Result<String, ServiceError> {
    body.choices
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("response has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| ServiceError::MalformedResponse("first choice has no text content".to_string()))
}
