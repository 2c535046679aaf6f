//! 数据目录管理模块
//!
//! # 设计思路
//!
//! 统一管理密钥、设置与“最近回答”记录的存放目录，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用用户通过 `--data-dir` / 环境变量指定的目录。
//! - 未设置时回退到平台数据目录下的 `clipboard-answer` 子目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const APP_DIR_NAME: &str = "clipboard-answer";

pub const CREDENTIAL_FILE_NAME: &str = "api_key.txt";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const LAST_ANSWER_FILE_NAME: &str = "last_answer.txt";

/// 获取数据目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的数据目录
/// - `Err(AppError::Persistence)`：无法获取或创建目录
pub fn resolve_data_dir(custom_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    // 优先使用用户自定义目录
    if let Some(dir) = custom_dir {
        if !dir.as_os_str().is_empty() {
            ensure_dir(dir)?;
            return Ok(dir.to_path_buf());
        }
    }

    let base = dirs::data_dir()
        .ok_or_else(|| AppError::Persistence("cannot determine platform data directory".to_string()))?;
    let dir = base.join(APP_DIR_NAME);
    ensure_dir(&dir)?;
    Ok(dir)
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::Persistence(format!("cannot create data directory '{}': {}", dir.display(), e))
        })?;
    }
    Ok(())
}
