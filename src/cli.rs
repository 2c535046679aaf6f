//! 命令行定义
//!
//! 子命令替代原先的设置窗口：`configure` 就是“保存设置”动作，
//! `run` 在设置已提交的前提下开始监听剪贴板。

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::AppError;
use crate::settings::{Credential, Settings};

#[derive(Debug, Parser)]
#[command(
    name = "clipboard-answer",
    version,
    about = "Answers questions copied to the clipboard with a chat-completions model"
)]
pub struct Cli {
    /// Directory holding api_key.txt, settings.json and last_answer.txt
    #[arg(long, global = true, env = "CLIPBOARD_ANSWER_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch the clipboard and answer new questions until interrupted
    Run(RunArgs),
    /// Save the API key and preferences
    Configure(ConfigureArgs),
    /// Print the effective settings with the API key masked
    Show,
    /// Print the last recorded answer
    Last,
}

#[derive(Debug, Args, Default)]
pub struct RunArgs {
    /// Log notifications instead of showing desktop notifications
    #[arg(long)]
    pub no_desktop_notify: bool,

    /// Do not print answers to stdout
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Args, Default)]
pub struct ConfigureArgs {
    /// API key for the answering service
    #[arg(long)]
    pub api_key: Option<String>,

    /// System prompt sent with every question
    #[arg(long)]
    pub prompt: Option<String>,

    /// Show answers as notifications
    #[arg(long, overrides_with = "no_notify")]
    pub notify: bool,
    #[arg(long, overrides_with = "notify")]
    pub no_notify: bool,

    /// Write answers back to the clipboard
    #[arg(long, overrides_with = "no_clipboard")]
    pub clipboard: bool,
    #[arg(long, overrides_with = "clipboard")]
    pub no_clipboard: bool,

    /// Prefix answers written to the clipboard with "Answer:"
    #[arg(long, overrides_with = "no_label")]
    pub label: bool,
    #[arg(long, overrides_with = "label")]
    pub no_label: bool,

    /// Model identifier sent to the service
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl ConfigureArgs {
    /// 把命令行参数合并进已加载的密钥与设置。
    ///
    /// 最终没有可用密钥时返回配置错误，什么都不保存。
    pub fn apply(
        self,
        stored: Option<Credential>,
        mut settings: Settings,
    ) -> Result<(Credential, Settings), AppError> {
        let credential = match self.api_key {
            Some(raw) => Credential::new(raw),
            None => stored,
        }
        .ok_or_else(|| AppError::Config("please enter a valid API key (--api-key)".to_string()))?;

        let preferences = &mut settings.preferences;
        if let Some(prompt) = self.prompt {
            preferences.system_prompt = prompt;
        }
        if let Some(value) = toggle(self.notify, self.no_notify) {
            preferences.notify_on_answer = value;
        }
        if let Some(value) = toggle(self.clipboard, self.no_clipboard) {
            preferences.write_answer_to_clipboard = value;
        }
        if let Some(value) = toggle(self.label, self.no_label) {
            preferences.label_clipboard_answers = value;
        }

        let service = &mut settings.service;
        if let Some(model) = self.model {
            service.model = model;
        }
        if let Some(base_url) = self.base_url {
            service.base_url = base_url;
        }
        if let Some(timeout) = self.timeout_secs {
            service.request_timeout_secs = timeout;
        }

        Ok((credential, settings))
    }
}
