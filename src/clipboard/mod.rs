//! 剪贴板模块
//!
//! # 设计思路
//!
//! 统一管理剪贴板相关的核心能力：
//! - **读写**：`ClipboardBackend` 抽象系统剪贴板，默认实现基于 `arboard`
//! - **状态机**：`watcher` 把连续的剪贴板变化转换为过滤后的问题事件，
//!   并负责“忽略本程序自身写入”的一次性抑制
//! - **监听**：`listener` 通过 `clipboard-master` 接收系统变化通知，
//!   把问题送入单槽队列
//!
//! # 实现思路
//!
//! - 抑制标志不再是全局 `AtomicBool`，而是 `ClipboardWatcher` 内部状态机的一个状态，
//!   由同一把锁保护“判断 + 读取”以及“设置抑制 + 写入”。
//! - 已投递的回答写入剪贴板时带 `ANSWER_SENTINEL_PREFIX` 前缀，
//!   监听器看到该前缀的文本不会再次当作问题。
//! - 非文本内容（图片、富文本）一律按空文本处理。

pub mod listener;
pub mod watcher;

use crate::error::AppError;

/// 已投递回答的标记前缀。以此开头的剪贴板文本不会被当作新问题。
pub const ANSWER_SENTINEL_PREFIX: &str = "Answer:";

const LOG_PREVIEW_CHARS: usize = 40;

/// 给回答加上标记前缀，用于写回剪贴板。
pub fn label_answer(text: &str) -> String {
    format!("{ANSWER_SENTINEL_PREFIX} {text}")
}

/// 日志用的文本摘要，避免整段问题/回答进入日志。
pub(crate) fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// 剪贴板读写抽象。
pub trait ClipboardBackend: Send + Sync {
    /// 读取当前文本；剪贴板为空或不是文本时返回空字符串。
    fn read_text(&self) -> Result<String, AppError>;

    fn write_text(&self, text: &str) -> Result<(), AppError>;
}

/// 基于 `arboard` 的系统剪贴板。
///
/// 每次操作单独打开剪贴板，不跨线程持有句柄。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn read_text(&self) -> Result<String, AppError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(AppError::Clipboard(e.to_string())),
        }
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }
}
