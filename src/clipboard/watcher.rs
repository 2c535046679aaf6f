//! 剪贴板变化状态机
//!
//! 三个状态：
//!
//! ```text
//!            activate()
//! Uninitialized ───────────► Idle ◄──────────┐
//!   │  ▲                      │  │            │ 下一次变化（丢弃）
//!   └──┘ 任何变化都丢弃        │  └─► SuppressedOnce
//!                              │  request_suppression()
//!                              └─ 新颖性过滤通过 → 发出 Question
//! ```
//!
//! 抑制只有一次额度：写入前连续多次请求抑制，也只会吞掉下一次变化。
//! 平台若对一次写入发出多次变化通知，多出的通知由标记前缀规则兜底。

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};

use super::{ANSWER_SENTINEL_PREFIX, preview};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// 尚未完成配置，所有变化都视为噪声
    Uninitialized,
    Idle,
    /// 下一次变化来自本程序自身的写入
    SuppressedOnce,
}

/// 一次观察到的剪贴板内容，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub text: String,
    pub observed_at: DateTime<Local>,
}

impl ClipboardSnapshot {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            observed_at: Local::now(),
        }
    }
}

/// 通过新颖性过滤的剪贴板文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub observed_at: DateTime<Local>,
}

impl From<ClipboardSnapshot> for Question {
    fn from(snapshot: ClipboardSnapshot) -> Self {
        Self {
            text: snapshot.text,
            observed_at: snapshot.observed_at,
        }
    }
}

/// 新颖性过滤：与上次接受的文本不同、去空白后非空、不以回答标记开头。
pub fn is_novel(text: &str, previous_accepted: &str) -> bool {
    text != previous_accepted
        && !text.trim().is_empty()
        && !text.starts_with(ANSWER_SENTINEL_PREFIX)
}

#[derive(Debug)]
struct WatcherState {
    phase: WatchPhase,
    previous_accepted: String,
}

/// 剪贴板监听状态机。
///
/// 监听线程调用 `observe_with`，投递链路调用 `write_suppressed`；
/// 两者共用一把锁，保证“设置抑制 → 写入”期间监听线程无法读到未抑制的状态。
#[derive(Debug)]
pub struct ClipboardWatcher {
    state: Mutex<WatcherState>,
}

impl Default for ClipboardWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardWatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WatcherState {
                phase: WatchPhase::Uninitialized,
                previous_accepted: String::new(),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, WatcherState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("剪贴板状态锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn phase(&self) -> WatchPhase {
        self.lock_state().phase
    }

    /// 设置保存后调用，开始接受剪贴板变化。重复调用无副作用。
    pub fn activate(&self) {
        let mut state = self.lock_state();
        if state.phase == WatchPhase::Uninitialized {
            state.phase = WatchPhase::Idle;
            log::info!("📋 剪贴板监听已激活");
        }
    }

    /// 请求忽略下一次剪贴板变化。
    ///
    /// 只在 `Idle` 时生效：未激活时本来就丢弃所有变化，
    /// 已处于抑制状态时额度不会叠加。
    pub fn request_suppression(&self) {
        let mut state = self.lock_state();
        Self::suppress_locked(&mut state);
    }

    fn suppress_locked(state: &mut WatcherState) {
        if state.phase == WatchPhase::Idle {
            state.phase = WatchPhase::SuppressedOnce;
            log::debug!("🚫 已设置剪贴板抑制 - 下一次剪贴板变化将被忽略");
        }
    }

    /// 先设置抑制再执行写入，整个过程持有状态锁。
    ///
    /// 写入失败时恢复写入前的状态，避免吞掉用户的下一次复制。
    pub fn write_suppressed<T, E>(&self, write: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut state = self.lock_state();
        let before = state.phase;
        Self::suppress_locked(&mut state);

        let result = write();
        if result.is_err() {
            state.phase = before;
            log::debug!("剪贴板写入失败，已撤销抑制");
        }
        result
    }

    /// 处理一次变化通知，文本已经读出。
    pub fn observe(&self, text: &str) -> Option<Question> {
        self.observe_with(|| text.to_string())
    }

    /// 处理一次变化通知。
    ///
    /// 只有在 `Idle` 状态下才会调用 `read` 读取剪贴板，
    /// 读取与判断在同一把锁内完成。
    pub fn observe_with(&self, read: impl FnOnce() -> String) -> Option<Question> {
        let mut state = self.lock_state();
        match state.phase {
            WatchPhase::Uninitialized => {
                log::debug!("⏭️  尚未完成配置，忽略剪贴板变化");
                None
            }
            WatchPhase::SuppressedOnce => {
                state.phase = WatchPhase::Idle;
                log::debug!("⏭️  忽略应用主动触发的剪贴板变化");
                None
            }
            WatchPhase::Idle => {
                let snapshot = ClipboardSnapshot::now(read());
                if !is_novel(&snapshot.text, &state.previous_accepted) {
                    log::trace!("剪贴板内容未通过新颖性过滤");
                    return None;
                }
                state.previous_accepted = snapshot.text.clone();
                log::info!("📋 捕获新问题（{} 字符）", snapshot.text.chars().count());
                log::debug!("问题内容: {}", preview(&snapshot.text));
                Some(Question::from(snapshot))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    use super::{ClipboardWatcher, WatchPhase, is_novel};

    fn active_watcher() -> ClipboardWatcher {
        let watcher = ClipboardWatcher::new();
        watcher.activate();
        watcher
    }

    #[test]
    fn novelty_filter_rules() {
        assert!(is_novel("What is 2+2?", ""));
        assert!(!is_novel("What is 2+2?", "What is 2+2?"));
        assert!(!is_novel("   \n\t", ""));
        assert!(!is_novel("", ""));
        assert!(!is_novel("Answer: 4", ""));
        assert!(is_novel(" Answer: 4", ""));
    }

    #[test]
    fn starts_uninitialized_and_drops_everything() {
        let watcher = ClipboardWatcher::new();
        assert_eq!(watcher.phase(), WatchPhase::Uninitialized);

        assert!(watcher.observe("What is 2+2?").is_none());
        assert!(watcher.observe("Another question").is_none());
        assert_eq!(watcher.phase(), WatchPhase::Uninitialized);
    }

    #[test]
    fn pre_activation_text_is_not_remembered() {
        let watcher = ClipboardWatcher::new();
        assert!(watcher.observe("What is 2+2?").is_none());

        watcher.activate();
        let question = watcher.observe("What is 2+2?").expect("question after activation");
        assert_eq!(question.text, "What is 2+2?");
    }

    #[test]
    fn idle_emits_question_for_new_text() {
        let watcher = active_watcher();
        assert!(watcher.observe("").is_none());

        let question = watcher.observe("What is 2+2?").expect("question");
        assert_eq!(question.text, "What is 2+2?");
        assert_eq!(watcher.phase(), WatchPhase::Idle);
    }

    #[test]
    fn same_text_twice_yields_one_question() {
        let watcher = active_watcher();
        assert!(watcher.observe("q1").is_some());
        assert!(watcher.observe("q1").is_none());
    }

    #[test]
    fn suppression_swallows_exactly_one_change() {
        let watcher = active_watcher();
        watcher.request_suppression();
        assert_eq!(watcher.phase(), WatchPhase::SuppressedOnce);

        assert!(watcher.observe("q1").is_none());
        assert_eq!(watcher.phase(), WatchPhase::Idle);
        assert!(watcher.observe("q1").is_some());
    }

    #[test]
    fn repeated_suppression_requests_do_not_stack() {
        let watcher = active_watcher();
        watcher.request_suppression();
        watcher.request_suppression();

        assert!(watcher.observe("first").is_none());
        assert!(watcher.observe("second").is_some());
    }

    #[test]
    fn suppression_is_ignored_before_activation() {
        let watcher = ClipboardWatcher::new();
        watcher.request_suppression();
        assert_eq!(watcher.phase(), WatchPhase::Uninitialized);
    }

    #[test]
    fn suppressed_change_does_not_read_clipboard() {
        let watcher = active_watcher();
        watcher.request_suppression();

        let mut read_called = false;
        let result = watcher.observe_with(|| {
            read_called = true;
            "q".to_string()
        });

        assert!(result.is_none());
        assert!(!read_called);
    }

    #[test]
    fn write_suppressed_leaves_one_credit_after_success() {
        let watcher = active_watcher();

        let written: Result<&str, ()> = watcher.write_suppressed(|| Ok("Answer: 4"));

        assert_eq!(written, Ok("Answer: 4"));
        assert_eq!(watcher.phase(), WatchPhase::SuppressedOnce);
        assert!(watcher.observe("Answer: 4").is_none());
        assert_eq!(watcher.phase(), WatchPhase::Idle);
    }

    #[test]
    fn concurrent_observer_waits_for_write_and_sees_suppression() {
        let watcher = Arc::new(active_watcher());
        let (done_tx, done_rx) = mpsc::channel();

        let observer = watcher.write_suppressed(|| {
            let listener = Arc::clone(&watcher);
            let handle = thread::spawn(move || {
                let result = listener.observe_with(|| "4".to_string());
                done_tx.send(()).expect("signal done");
                result
            });

            // 写入期间监听线程拿不到锁
            let blocked = done_rx.recv_timeout(Duration::from_millis(100)).is_err();
            Ok::<_, ()>((handle, blocked))
        });

        let (handle, blocked_during_write) = observer.expect("write succeeds");
        assert!(blocked_during_write);
        assert!(handle.join().expect("observer thread").is_none());
        assert_eq!(watcher.phase(), WatchPhase::Idle);
        assert!(watcher.observe("next question").is_some());
    }

    #[test]
    fn failed_write_restores_previous_phase() {
        let watcher = active_watcher();

        let result: Result<(), &str> = watcher.write_suppressed(|| Err("denied"));

        assert_eq!(result, Err("denied"));
        assert_eq!(watcher.phase(), WatchPhase::Idle);
        assert!(watcher.observe("user copy").is_some());
    }
}
