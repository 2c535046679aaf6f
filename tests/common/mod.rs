// Shared fakes for the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clipboard_answer::answer::{AnswerService, ServiceError};
use clipboard_answer::clipboard::ClipboardBackend;
use clipboard_answer::clipboard::watcher::ClipboardWatcher;
use clipboard_answer::delivery::{
    DeliveryOptions, DeliverySink, LastAnswerDisplay, Notification, Notifier,
};
use clipboard_answer::error::AppError;
use clipboard_answer::settings::Credential;

#[derive(Default)]
pub struct FakeClipboard {
    text: Mutex<String>,
    writes: Mutex<Vec<String>>,
    fail_writes: bool,
}

impl FakeClipboard {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn current(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardBackend for FakeClipboard {
    fn read_text(&self) -> Result<String, AppError> {
        Ok(self.current())
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::Clipboard("write denied".to_string()));
        }
        *self.text.lock().unwrap() = text.to_string();
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Notification("no notification daemon".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// 回答服务桩：记录调用次数、收到的问题与最大并发数。
#[derive(Clone)]
pub struct StubService {
    reply: Result<String, ServiceError>,
    pub calls: Arc<AtomicUsize>,
    pub questions: Arc<Mutex<Vec<(String, String)>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl StubService {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub fn failing(err: ServiceError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: Result<String, ServiceError>) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            questions: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnswerService for StubService {
    async fn complete(
        &self,
        _credential: &Credential,
        system_prompt: &str,
        question: &str,
    ) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.questions
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), question.to_string()));

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub struct Harness {
    pub watcher: Arc<ClipboardWatcher>,
    pub clipboard: Arc<FakeClipboard>,
    pub notifier: Arc<RecordingNotifier>,
    pub display: Arc<LastAnswerDisplay>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(FakeClipboard::default(), RecordingNotifier::default())
    }

    pub fn with_parts(clipboard: FakeClipboard, notifier: RecordingNotifier) -> Self {
        let watcher = Arc::new(ClipboardWatcher::new());
        watcher.activate();
        Self {
            watcher,
            clipboard: Arc::new(clipboard),
            notifier: Arc::new(notifier),
            display: Arc::new(LastAnswerDisplay::new()),
        }
    }

    pub fn sink(&self, options: DeliveryOptions) -> DeliverySink {
        DeliverySink::new(
            Arc::clone(&self.watcher),
            self.clipboard.clone(),
            self.notifier.clone(),
            Arc::clone(&self.display),
            options,
        )
    }
}

pub fn options(notify: bool, write: bool, label: bool) -> DeliveryOptions {
    DeliveryOptions {
        notify_on_answer: notify,
        write_answer_to_clipboard: write,
        label_clipboard_answers: label,
    }
}
