//! 设置与密钥存储
//!
//! 密钥以明文保存在数据目录的 `api_key.txt` 首行，偏好设置保存在
//! `settings.json`。明文密钥只是简化实现，并非安全边界；需要真正的
//! 密钥管理时，替换 [`CredentialProvider`] 的实现即可，无需改动处理链路。

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::answer::openai::AnswerServiceConfig;
use crate::error::AppError;
use crate::storage::{CREDENTIAL_FILE_NAME, SETTINGS_FILE_NAME};

pub const CREDENTIAL_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You answer questions copied to the clipboard. \
If a question is multiple-choice, reply only with the correct options (e.g. 'A + B' or '1 + 4') \
without explanation. Otherwise reply with a concise, accurate text answer.";

/// 回答服务的访问密钥。
///
/// `Debug` 输出被遮蔽，避免密钥进入日志。
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// 去除首尾空白后为空则返回 `None`。
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// 仅保留末尾四个字符，用于 `show` 命令展示。
    pub fn masked(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// 用户偏好。只通过显式保存动作修改，监听器从不写入。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub notify_on_answer: bool,
    pub write_answer_to_clipboard: bool,
    /// 写入剪贴板时是否加上 `Answer:` 前缀。
    pub label_clipboard_answers: bool,
    pub system_prompt: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notify_on_answer: true,
            write_answer_to_clipboard: true,
            label_clipboard_answers: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// `settings.json` 的完整内容。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preferences: Preferences,
    pub service: AnswerServiceConfig,
}

/// 设置存储，绑定到一个数据目录。
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE_NAME)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE_NAME)
    }

    /// 读取密钥与设置。
    ///
    /// 文件不存在时返回空密钥与默认设置；设置文件内容损坏时回退默认值。
    /// 只有文件存在却无法读取时才返回错误。
    pub fn load(&self) -> Result<(Option<Credential>, Settings), AppError> {
        let credential = read_optional(&self.credential_path())?
            .and_then(|content| content.lines().next().and_then(Credential::new));
        let settings = match read_optional(&self.settings_path())? {
            Some(content) => parse_settings(&content),
            None => Settings::default(),
        };
        Ok((credential, settings))
    }

    /// 保存密钥与设置。
    pub fn save(&self, credential: &Credential, settings: &Settings) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::Persistence(format!("cannot create data directory '{}': {}", self.dir.display(), e))
        })?;

        fs::write(self.credential_path(), format!("{}\n", credential.expose()))
            .map_err(|e| AppError::Persistence(format!("cannot write credential file: {}", e)))?;

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Persistence(format!("cannot serialize settings: {}", e)))?;
        fs::write(self.settings_path(), content)
            .map_err(|e| AppError::Persistence(format!("cannot write settings file: {}", e)))?;

        log::info!("💾 设置已保存到 {}", self.dir.display());
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, AppError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Persistence(format!(
            "cannot read '{}': {}",
            path.display(),
            e
        ))),
    }
}

fn parse_settings(content: &str) -> Settings {
    match serde_json::from_str(content) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("解析设置文件失败，使用默认设置: {}", e);
            Settings::default()
        }
    }
}

/// 密钥来源。处理器每次处理问题时都会重新获取一次。
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// 启动时从设置文件读取到的密钥。
#[derive(Debug, Clone)]
pub struct StoredCredential(Option<Credential>);

impl StoredCredential {
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }
}

impl CredentialProvider for StoredCredential {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// 从环境变量读取密钥。
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(CREDENTIAL_ENV_VAR)
    }
}

impl CredentialProvider for EnvCredential {
    fn credential(&self) -> Option<Credential> {
        std::env::var(&self.var).ok().and_then(Credential::new)
    }
}
