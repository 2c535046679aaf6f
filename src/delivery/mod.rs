//! # 回答投递模块（delivery）
//!
//! ## 设计思路
//!
//! 一个 `Answer` 按固定顺序扇出到最多三个互相独立的出口：
//! 1. 最近回答展示（始终更新，是用户可以重新查看的记录）
//! 2. 桌面通知（成功回答受 `notify_on_answer` 控制，失败回答总是提示）
//! 3. 写回剪贴板（仅成功回答，且 `write_answer_to_clipboard` 打开时）
//!
//! 任一出口失败只记录日志，不影响其他出口，也不向调用方传播。
//!
//! ## 实现思路
//!
//! - 写剪贴板通过 `ClipboardWatcher::write_suppressed` 完成：先设置抑制再写入，
//!   期间持有状态锁，监听线程不会把这次写入当成新问题。
//! - `label_clipboard_answers` 打开时写入 `Answer: <回答>`，
//!   即使平台对同一次写入重复通知，标记前缀也能挡住回流。

pub mod notify;

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::answer::{Answer, ErrorKind};
use crate::clipboard::watcher::ClipboardWatcher;
use crate::clipboard::{ClipboardBackend, label_answer, preview};
use crate::error::AppError;
use crate::settings::Preferences;

pub const ANSWER_NOTIFICATION_TITLE: &str = "Answer";
pub const ERROR_NOTIFICATION_TITLE: &str = "Error";
pub const ANSWER_NOTIFICATION_DURATION: Duration = Duration::from_millis(5_000);
pub const MISSING_CREDENTIAL_NOTIFICATION_DURATION: Duration = Duration::from_millis(3_000);
pub const SERVICE_ERROR_NOTIFICATION_DURATION: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// 一条桌面通知，发出即忘，没有送达确认。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    pub fn info(title: impl Into<String>, body: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity: Severity::Info,
            duration,
        }
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity: Severity::Warning,
            duration,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), AppError>;
}

/// 单个出口的失败，只记录不传播。
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("last-answer display update failed: {0}")]
    Display(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

/// 最近一次回答。
///
/// 内存中保存完整 `Answer`，并尽力镜像到数据目录下的文本文件，
/// 供 `last` 子命令在进程外查看。
#[derive(Debug, Default)]
pub struct LastAnswerDisplay {
    current: RwLock<Option<Answer>>,
    mirror_path: Option<PathBuf>,
    echo: bool,
}

impl LastAnswerDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同时写入镜像文件。
    pub fn with_mirror(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_path = Some(path.into());
        self
    }

    /// 同时打印到标准输出（前台运行时使用）。
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn current(&self) -> Option<Answer> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn show(&self, answer: &Answer) -> Result<(), DeliveryError> {
        {
            let mut current = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    log::warn!("最近回答锁中毒，继续使用恢复数据");
                    poisoned.into_inner()
                }
            };
            *current = Some(answer.clone());
        }

        if self.echo {
            println!("{}", render_record(answer));
        }

        if let Some(path) = &self.mirror_path {
            fs::write(path, render_record(answer))
                .map_err(|e| DeliveryError::Display(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }
}

fn status_label(answer: &Answer) -> &'static str {
    match answer.error_kind() {
        None => "ok",
        Some(ErrorKind::MissingCredential) => "missing-credential",
        Some(ErrorKind::ServiceError) => "service-error",
    }
}

/// 展示/镜像文件的文本格式：首行为时间与状态，其后为回答正文。
pub fn render_record(answer: &Answer) -> String {
    format!(
        "[{}] {}\n{}\n",
        answer.created_at().format("%Y-%m-%d %H:%M:%S"),
        status_label(answer),
        answer.text()
    )
}

/// 投递开关，来自 `Preferences`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub notify_on_answer: bool,
    pub write_answer_to_clipboard: bool,
    pub label_clipboard_answers: bool,
}

impl From<&Preferences> for DeliveryOptions {
    fn from(preferences: &Preferences) -> Self {
        Self {
            notify_on_answer: preferences.notify_on_answer,
            write_answer_to_clipboard: preferences.write_answer_to_clipboard,
            label_clipboard_answers: preferences.label_clipboard_answers,
        }
    }
}

/// 单次投递结果，主要供测试与日志使用。
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub notified: bool,
    pub clipboard_written: bool,
    pub failures: Vec<DeliveryError>,
}

pub struct DeliverySink {
    watcher: Arc<ClipboardWatcher>,
    clipboard: Arc<dyn ClipboardBackend>,
    notifier: Arc<dyn Notifier>,
    display: Arc<LastAnswerDisplay>,
    options: DeliveryOptions,
}

impl DeliverySink {
    pub fn new(
        watcher: Arc<ClipboardWatcher>,
        clipboard: Arc<dyn ClipboardBackend>,
        notifier: Arc<dyn Notifier>,
        display: Arc<LastAnswerDisplay>,
        options: DeliveryOptions,
    ) -> Self {
        Self {
            watcher,
            clipboard,
            notifier,
            display,
            options,
        }
    }

    pub fn deliver(&self, answer: &Answer) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if let Err(err) = self.display.show(answer) {
            log::warn!("更新最近回答失败: {}", err);
            report.failures.push(err);
        }

        if let Some(notification) = self.notification_for(answer) {
            match self.notifier.notify(&notification) {
                Ok(()) => report.notified = true,
                Err(err) => {
                    log::warn!("发送通知失败: {}", err);
                    report.failures.push(DeliveryError::Notification(err.to_string()));
                }
            }
        }

        if self.options.write_answer_to_clipboard && answer.succeeded() {
            let text = if self.options.label_clipboard_answers {
                label_answer(answer.text())
            } else {
                answer.text().to_string()
            };
            match self
                .watcher
                .write_suppressed(|| self.clipboard.write_text(&text))
            {
                Ok(()) => {
                    log::debug!("📋 回答已写入剪贴板: {}", preview(&text));
                    report.clipboard_written = true;
                }
                Err(err) => {
                    log::warn!("写入剪贴板失败: {}", err);
                    report.failures.push(DeliveryError::Clipboard(err.to_string()));
                }
            }
        }

        report
    }

    fn notification_for(&self, answer: &Answer) -> Option<Notification> {
        match answer.error_kind() {
            None if self.options.notify_on_answer => Some(Notification::info(
                ANSWER_NOTIFICATION_TITLE,
                answer.text(),
                ANSWER_NOTIFICATION_DURATION,
            )),
            None => None,
            Some(ErrorKind::MissingCredential) => Some(Notification::warning(
                ERROR_NOTIFICATION_TITLE,
                answer.text(),
                MISSING_CREDENTIAL_NOTIFICATION_DURATION,
            )),
            Some(ErrorKind::ServiceError) => Some(Notification::warning(
                ERROR_NOTIFICATION_TITLE,
                answer.text(),
                SERVICE_ERROR_NOTIFICATION_DURATION,
            )),
        }
    }
}
