//! # 问题处理器
//!
//! ## 设计思路
//!
//! 把一个 `Question` 变成一个 `Answer`，不做投机执行，也不自动重试：
//! 问题文本是一次性的，而远程调用按次计费，失败直接暴露给用户。
//!
//! ## 实现思路
//!
//! 1. 从 `CredentialProvider` 取密钥；缺失时直接返回 `MissingCredential`，不发请求
//! 2. 用当前系统提示词与问题文本调用 `AnswerService`
//! 3. 服务错误转换为 `ServiceError` 类回答，消息中包含底层原因

use std::time::Instant;

use crate::answer::{Answer, AnswerService, ErrorKind};
use crate::clipboard::preview;
use crate::clipboard::watcher::Question;
use crate::settings::CredentialProvider;

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "No API key set. Run `clipboard-answer configure --api-key <KEY>` and restart.";

pub struct QuestionProcessor<S> {
    service: S,
    credentials: Box<dyn CredentialProvider>,
    system_prompt: String,
}

impl<S: AnswerService> QuestionProcessor<S> {
    pub fn new(
        service: S,
        credentials: Box<dyn CredentialProvider>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            service,
            credentials,
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn handle(&self, question: &Question) -> Answer {
        let Some(credential) = self.credentials.credential() else {
            log::warn!("未设置 API Key，跳过回答服务调用");
            return Answer::failure(ErrorKind::MissingCredential, MISSING_CREDENTIAL_MESSAGE);
        };

        let started = Instant::now();
        match self
            .service
            .complete(&credential, &self.system_prompt, &question.text)
            .await
        {
            Ok(text) => {
                log::info!(
                    "✅ 回答完成，耗时 {}ms（{} 字符）",
                    started.elapsed().as_millis(),
                    text.chars().count()
                );
                log::debug!("回答内容: {}", preview(&text));
                Answer::success(text)
            }
            Err(err) => {
                log::error!("回答服务调用失败（{}ms）: {}", started.elapsed().as_millis(), err);
                Answer::failure(ErrorKind::ServiceError, format!("An error occurred: {err}"))
            }
        }
    }
}
