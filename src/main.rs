//! # 剪贴板答题工具：程序入口
//!
//! 本文件只负责日志初始化、命令行分发与组件装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use clipboard_answer::answer::openai::OpenAiAnswerService;
use clipboard_answer::cli::{Cli, Commands, ConfigureArgs, RunArgs};
use clipboard_answer::clipboard::listener::{question_queue, start_monitoring};
use clipboard_answer::clipboard::watcher::ClipboardWatcher;
use clipboard_answer::clipboard::{ClipboardBackend, SystemClipboard};
use clipboard_answer::delivery::notify::{DesktopNotifier, LogNotifier};
use clipboard_answer::delivery::{
    DeliveryOptions, DeliverySink, LastAnswerDisplay, Notification, Notifier,
};
use clipboard_answer::error::AppError;
use clipboard_answer::pipeline::Pipeline;
use clipboard_answer::processor::QuestionProcessor;
use clipboard_answer::settings::{
    CREDENTIAL_ENV_VAR, CredentialProvider, EnvCredential, SettingsStore, StoredCredential,
};
use clipboard_answer::storage::{LAST_ANSWER_FILE_NAME, resolve_data_dir};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match resolve_data_dir(cli.data_dir.as_deref()) {
        Ok(data_dir) => match cli.command {
            Commands::Run(args) => cmd_run(&data_dir, args).await,
            Commands::Configure(args) => cmd_configure(&data_dir, args),
            Commands::Show => cmd_show(&data_dir),
            Commands::Last => cmd_last(&data_dir),
        },
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn cmd_run(data_dir: &Path, args: RunArgs) -> Result<(), AppError> {
    let store = SettingsStore::new(data_dir);
    let (stored, settings) = store.load()?;

    let credentials: Box<dyn CredentialProvider> = match stored {
        Some(credential) => Box::new(StoredCredential::new(Some(credential))),
        None => {
            let env = EnvCredential::default();
            if env.credential().is_none() {
                return Err(AppError::Config(format!(
                    "no API key found; run `clipboard-answer configure --api-key <KEY>` or set {CREDENTIAL_ENV_VAR}"
                )));
            }
            log::info!("使用环境变量 {} 中的 API Key", CREDENTIAL_ENV_VAR);
            Box::new(env)
        }
    };

    let watcher = Arc::new(ClipboardWatcher::new());
    let clipboard: Arc<dyn ClipboardBackend> = Arc::new(SystemClipboard);
    let notifier: Arc<dyn Notifier> = if args.no_desktop_notify {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DesktopNotifier)
    };
    let display = Arc::new(
        LastAnswerDisplay::new()
            .with_mirror(data_dir.join(LAST_ANSWER_FILE_NAME))
            .with_echo(!args.quiet),
    );

    let service = OpenAiAnswerService::new(settings.service.clone())?;
    let processor = QuestionProcessor::new(
        service,
        credentials,
        settings.preferences.system_prompt.clone(),
    );
    let sink = DeliverySink::new(
        Arc::clone(&watcher),
        Arc::clone(&clipboard),
        Arc::clone(&notifier),
        display,
        DeliveryOptions::from(&settings.preferences),
    );
    let pipeline = Pipeline::new(processor, sink);

    let (questions_tx, questions_rx) = question_queue();
    let _listener = start_monitoring(Arc::clone(&watcher), clipboard, questions_tx);

    // 设置已提交，开始接受剪贴板变化
    watcher.activate();
    if let Err(err) = notifier.notify(&Notification::info(
        "Ready",
        "Settings loaded; watching the clipboard for questions.",
        std::time::Duration::from_millis(3_000),
    )) {
        log::warn!("发送启动通知失败: {}", err);
    }

    tokio::select! {
        _ = pipeline.run(questions_rx) => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                log::warn!("监听退出信号失败: {}", err);
            }
            log::info!("收到退出信号，停止处理");
        }
    }
    Ok(())
}

fn cmd_configure(data_dir: &Path, args: ConfigureArgs) -> Result<(), AppError> {
    let store = SettingsStore::new(data_dir);
    let (stored, settings) = store.load()?;
    let (credential, settings) = args.apply(stored, settings)?;
    store.save(&credential, &settings)?;
    println!("Settings saved to {}", store.dir().display());
    Ok(())
}

fn cmd_show(data_dir: &Path) -> Result<(), AppError> {
    let store = SettingsStore::new(data_dir);
    let (credential, settings) = store.load()?;
    let rendered = serde_json::to_string_pretty(&settings)
        .map_err(|e| AppError::Persistence(format!("cannot serialize settings: {}", e)))?;

    println!("data dir: {}", store.dir().display());
    println!(
        "api key:  {}",
        credential
            .map(|c| c.masked())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("{rendered}");
    Ok(())
}

fn cmd_last(data_dir: &Path) -> Result<(), AppError> {
    match fs::read_to_string(data_dir.join(LAST_ANSWER_FILE_NAME)) {
        Ok(record) => print!("{record}"),
        Err(e) if e.kind() == ErrorKind::NotFound => println!("No answer recorded yet."),
        Err(e) => return Err(AppError::Io(e)),
    }
    Ok(())
}
