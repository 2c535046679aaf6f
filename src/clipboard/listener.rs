use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clipboard_master::{CallbackResult, ClipboardHandler, Master};
use tokio::sync::mpsc;

use super::ClipboardBackend;
use super::watcher::{ClipboardWatcher, Question};

const MONITOR_RESTART_BASE_DELAY_MS: u64 = 100;
const MONITOR_RESTART_MAX_DELAY_MS: u64 = 5_000;

/// 问题队列容量。处理链路忙时生产者阻塞，不会并行处理。
pub const QUESTION_QUEUE_CAPACITY: usize = 1;

fn compute_restart_backoff_ms(restart_attempt: u32) -> u64 {
    let exp = 1_u64 << restart_attempt.saturating_sub(1).min(6);
    MONITOR_RESTART_BASE_DELAY_MS
        .saturating_mul(exp)
        .min(MONITOR_RESTART_MAX_DELAY_MS)
}

/// 创建监听器与处理链路之间的单槽队列。
pub fn question_queue() -> (mpsc::Sender<Question>, mpsc::Receiver<Question>) {
    mpsc::channel(QUESTION_QUEUE_CAPACITY)
}

/// 剪贴板事件处理器
///
/// 每次系统通知剪贴板变化时交给状态机判断，
/// 通过过滤的问题阻塞式送入队列。
pub struct Handler {
    watcher: Arc<ClipboardWatcher>,
    clipboard: Arc<dyn ClipboardBackend>,
    questions: mpsc::Sender<Question>,
}

impl Handler {
    pub fn new(
        watcher: Arc<ClipboardWatcher>,
        clipboard: Arc<dyn ClipboardBackend>,
        questions: mpsc::Sender<Question>,
    ) -> Self {
        Self {
            watcher,
            clipboard,
            questions,
        }
    }
}

impl ClipboardHandler for Handler {
    fn on_clipboard_change(&mut self) -> CallbackResult {
        let clipboard = &self.clipboard;
        let question = self.watcher.observe_with(|| match clipboard.read_text() {
            Ok(text) => text,
            Err(err) => {
                log::warn!("读取剪贴板失败，按空内容处理: {}", err);
                String::new()
            }
        });

        if let Some(question) = question {
            if self.questions.blocking_send(question).is_err() {
                log::info!("📋 问题队列已关闭，停止剪贴板监听");
                return CallbackResult::Stop;
            }
        }

        CallbackResult::Next
    }

    fn on_clipboard_error(&mut self, error: std::io::Error) -> CallbackResult {
        log::error!("剪贴板错误：{}", error);
        CallbackResult::Next
    }
}

/// 在后台线程启动剪贴板监控
///
/// 监控退出或创建失败时按指数退避重启；问题队列关闭后线程结束。
pub fn start_monitoring(
    watcher: Arc<ClipboardWatcher>,
    clipboard: Arc<dyn ClipboardBackend>,
    questions: mpsc::Sender<Question>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut restart_attempt: u32 = 0;
        loop {
            let handler = Handler::new(
                Arc::clone(&watcher),
                Arc::clone(&clipboard),
                questions.clone(),
            );
            match Master::new(handler) {
                Ok(mut master) => {
                    restart_attempt = 0;
                    log::info!("📋 剪贴板监听已启动");
                    if let Err(err) = master.run() {
                        log::warn!("📋 剪贴板监听异常退出: {}", err);
                    }
                }
                Err(err) => {
                    log::error!("📋 创建剪贴板监听失败: {}", err);
                }
            }

            if questions.is_closed() {
                log::info!("📋 剪贴板监听已停止");
                break;
            }

            restart_attempt = restart_attempt.saturating_add(1);
            let backoff_ms = compute_restart_backoff_ms(restart_attempt);
            log::warn!("📋 剪贴板监听 {}ms 后重试（attempt={}）", backoff_ms, restart_attempt);
            thread::sleep(Duration::from_millis(backoff_ms));
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clipboard_master::{CallbackResult, ClipboardHandler};

    use super::{Handler, compute_restart_backoff_ms, question_queue};
    use crate::clipboard::ClipboardBackend;
    use crate::clipboard::watcher::ClipboardWatcher;
    use crate::error::AppError;

    #[derive(Default)]
    struct FakeClipboard {
        text: Mutex<Option<String>>,
    }

    impl FakeClipboard {
        fn set(&self, text: &str) {
            *self.text.lock().expect("lock") = Some(text.to_string());
        }
    }

    impl ClipboardBackend for FakeClipboard {
        fn read_text(&self) -> Result<String, AppError> {
            self.text
                .lock()
                .expect("lock")
                .clone()
                .ok_or_else(|| AppError::Clipboard("unavailable".to_string()))
        }

        fn write_text(&self, text: &str) -> Result<(), AppError> {
            self.set(text);
            Ok(())
        }
    }

    #[test]
    fn restart_backoff_grows_then_caps() {
        assert_eq!(compute_restart_backoff_ms(1), 100);
        assert_eq!(compute_restart_backoff_ms(2), 200);
        assert_eq!(compute_restart_backoff_ms(3), 400);
        assert_eq!(compute_restart_backoff_ms(7), 5_000);
        assert_eq!(compute_restart_backoff_ms(20), 5_000);
    }

    #[test]
    fn accepted_change_is_queued() {
        let watcher = Arc::new(ClipboardWatcher::new());
        watcher.activate();
        let clipboard = Arc::new(FakeClipboard::default());
        let (tx, mut rx) = question_queue();
        let mut handler = Handler::new(watcher, clipboard.clone(), tx);

        clipboard.set("What is 2+2?");
        assert!(matches!(handler.on_clipboard_change(), CallbackResult::Next));

        let question = rx.try_recv().expect("queued question");
        assert_eq!(question.text, "What is 2+2?");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unreadable_clipboard_is_treated_as_empty() {
        let watcher = Arc::new(ClipboardWatcher::new());
        watcher.activate();
        let (tx, mut rx) = question_queue();
        let mut handler = Handler::new(watcher, Arc::new(FakeClipboard::default()), tx);

        assert!(matches!(handler.on_clipboard_change(), CallbackResult::Next));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_stops_the_handler() {
        let watcher = Arc::new(ClipboardWatcher::new());
        watcher.activate();
        let clipboard = Arc::new(FakeClipboard::default());
        let (tx, rx) = question_queue();
        drop(rx);
        let mut handler = Handler::new(watcher, clipboard.clone(), tx);

        clipboard.set("question");
        assert!(matches!(handler.on_clipboard_change(), CallbackResult::Stop));
    }
}
