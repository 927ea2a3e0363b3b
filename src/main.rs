mod app_service;
mod app_state;
mod commands;
mod config;
mod evaluation;
mod jobs;
mod report;
mod session;
mod storage;
mod ui;
mod upload;

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::AppService;
use crate::app_state::{App, AppEvent};
use crate::commands::AppCommand;
use crate::config::{Backend, Config};
use crate::evaluation::{EvaluationRunner, ScriptedDriver};
use crate::jobs::JobService;
use crate::session::{Authenticator, HostedSession, LocalAuthenticator};
use crate::storage::{HostedJobStore, JobRepository, JobStore};
use crate::ui::draw;

/// 托管会话的请求重试参数
const HOSTED_MAX_TRIES: usize = 3;
const HOSTED_RETRY_DELAY_SECS: f64 = 2.0;

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("无法创建日志目录 {}", config.log_dir.display()))?;
    let log_path = config.log_dir.join(format!("app-{}.log", ts));
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("无法创建日志文件 {}", log_path.display()))?;
    // 终端由 TUI 占用，日志只写文件
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Warn)
        .filter_module("mleval", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();
    Ok(())
}

/// 按配置选择存储与认证：有托管地址时走 REST，否则使用本地 SQLite
async fn build_backend(
    config: &Config,
    startup_info: &mut Vec<String>,
) -> anyhow::Result<(Arc<dyn JobStore>, Arc<dyn Authenticator>)> {
    match &config.backend {
        Backend::Hosted(hosted) => {
            let session = Arc::new(
                HostedSession::new(hosted, HOSTED_MAX_TRIES, HOSTED_RETRY_DELAY_SECS)
                    .context("无法创建托管会话")?,
            );
            startup_info.push(format!("✓ 托管后端: {}", session.base_url()));
            let store: Arc<dyn JobStore> = Arc::new(HostedJobStore::new(session.clone()));
            let auth: Arc<dyn Authenticator> = session;
            Ok((store, auth))
        }
        Backend::Local {
            database_url,
            user_id,
        } => {
            startup_info.push("正在初始化数据库...".to_string());
            let db = storage::establish_connection(database_url)
                .await
                .with_context(|| format!("数据库连接失败: {}", database_url))?;
            startup_info.push(format!("✓ 本地数据库: {}", database_url));
            let store: Arc<dyn JobStore> = Arc::new(JobRepository::new(Arc::new(db)));
            let auth: Arc<dyn Authenticator> = Arc::new(LocalAuthenticator::new(user_id.clone()));
            Ok((store, auth))
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;
    log::info!("配置已加载: {:?}", config.backend);

    let mut startup_info = Vec::new();
    let current_dir = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    startup_info.push(format!("当前工作目录: {}", current_dir.display()));

    let (store, auth) = build_backend(&config, &mut startup_info).await?;
    if config.credentials().is_some() {
        startup_info.push("✓ 已读取 EVAL_EMAIL / EVAL_PASSWORD".to_string());
    }

    // 创建核心 Channel
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    let jobs = Arc::new(JobService::new(store, evt_tx.clone()));
    startup_info.push(format!("任务存储: {}", jobs.store_name()));
    let runner = Arc::new(EvaluationRunner::new(
        jobs.clone(),
        Arc::new(ScriptedDriver::new(config.step_scale)),
        evt_tx.clone(),
    ));
    let mut service = AppService::new(auth, jobs, runner, config.report_dir.clone(), evt_tx);
    let credentials = config.credentials();

    // 单后台任务模型 (Actor)
    tokio::spawn(async move {
        service.bootstrap(credentials).await;
        while let Some(cmd) = cmd_rx.recv().await {
            service.handle(cmd).await;
        }
    });

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(startup_info, cmd_tx, evt_rx);
    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("界面运行出错")
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.handle_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
