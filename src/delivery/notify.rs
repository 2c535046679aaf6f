//! 桌面通知出口，基于 `notify-rust`。

use super::{Notification, Notifier, Severity};
use crate::error::AppError;

const APP_NAME: &str = "clipboard-answer";

#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        let mut toast = notify_rust::Notification::new();
        toast
            .appname(APP_NAME)
            .summary(&notification.title)
            .body(&notification.body);

        // 紧急程度与显示时长只在 XDG 通知服务上生效
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let urgency = match notification.severity {
                Severity::Info => notify_rust::Urgency::Normal,
                Severity::Warning => notify_rust::Urgency::Critical,
            };
            let millis = u32::try_from(notification.duration.as_millis()).unwrap_or(u32::MAX);
            toast
                .urgency(urgency)
                .timeout(notify_rust::Timeout::Milliseconds(millis));
        }

        toast
            .show()
            .map(|_| ())
            .map_err(|e| AppError::Notification(e.to_string()))
    }
}

/// 不弹出任何通知，只写日志。用于没有桌面会话的环境（`--no-desktop-notify`）。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        match notification.severity {
            Severity::Info => {
                log::info!("🔔 {}（{} 字符）", notification.title, notification.body.chars().count());
                log::debug!("🔔 {}: {}", notification.title, notification.body);
            }
            Severity::Warning => log::warn!("🔔 {}: {}", notification.title, notification.body),
        }
        Ok(())
    }
}
