//! # 剪贴板答题工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  系统剪贴板 ── clipboard-master 变化通知                  │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ listener 线程
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  clipboard::watcher ── 状态机 + 新颖性过滤                │
//! │       │   Uninitialized / Idle / SuppressedOnce           │
//! │       ↓ mpsc 单槽队列（生产者阻塞，不并行）               │
//! │  pipeline ── 单消费者循环                                 │
//! │       ├─ processor ── 密钥检查 → AnswerService            │
//! │       │                 └─ answer::openai (reqwest)       │
//! │       └─ delivery ── 最近回答 → 通知 → 写回剪贴板         │
//! │                         └─ write_suppressed ↺ watcher     │
//! │                                                          │
//! │  settings ── api_key.txt + settings.json                 │
//! │  storage  ── 数据目录                                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`settings`] | 密钥与偏好的读写、`CredentialProvider` 抽象 |
//! | [`storage`] | 数据目录的获取与自动创建 |
//! | [`clipboard`] | 剪贴板读写、监听状态机、系统变化监听 |
//! | [`answer`] | `Answer` 模型与回答服务（chat-completions） |
//! | [`processor`] | 把问题转换为回答，失败转换为回答值 |
//! | [`delivery`] | 回答扇出：展示、通知、写回剪贴板 |
//! | [`pipeline`] | 队列到处理器/投递的串行循环 |
//! | [`cli`] | 命令行定义与设置合并 |

pub mod error;
pub mod answer;
pub mod cli;
pub mod clipboard;
pub mod delivery;
pub mod pipeline;
pub mod processor;
pub mod settings;
pub mod storage;
