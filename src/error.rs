//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError` 枚举，承载配置、持久化、剪贴板、通知等
//! 不属于“回答结果”的错误。回答服务的失败不走这里：它们被转换为
//! `Answer` 值（见 [`crate::answer`]），保证投递链路总有内容可投递。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` 与 `ServiceError` 提供 `From` 转换，无需手动 map。
//! - 只有配置阶段的错误（缺少密钥、设置文件不可读）会阻断启动。

use crate::answer::ServiceError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 设置或密钥文件读写失败
    #[error("settings persistence failed: {0}")]
    Persistence(String),

    /// 文件系统 I/O 错误
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// 剪贴板读写操作失败
    #[error("clipboard operation failed: {0}")]
    Clipboard(String),

    /// 通知子系统不可用
    #[error("notification failed: {0}")]
    Notification(String),

    /// 回答服务初始化失败（如 HTTP 客户端无法创建）
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// 配置不完整，需要用户修正后才能继续
    #[error("configuration error: {0}")]
    Config(String),
}
