use crate::commands::AppCommand;
use crate::evaluation::{fresh_steps, EvaluationStep, MockResults, StepStatus, StepUpdate};
use crate::jobs::{EvaluationJob, JobStatus};
use crate::report::ExportKind;
use crate::session::{guard, AuthState, GuardOutcome};
use crate::upload::{select_file, FileKind, UploadForm};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use std::str::FromStr;
use tokio::sync::mpsc;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Section {
    Overview,
    Upload,
    Evaluation,
    Report,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::Upload,
        Section::Evaluation,
        Section::Report,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Upload => "Upload",
            Section::Evaluation => "Evaluation",
            Section::Report => "Report",
        }
    }

    pub fn index(&self) -> usize {
        Section::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn from_name(name: &str) -> Option<Section> {
        match name.to_ascii_lowercase().as_str() {
            "overview" | "home" => Some(Section::Overview),
            "upload" => Some(Section::Upload),
            "evaluation" | "eval" | "pipeline" => Some(Section::Evaluation),
            "report" => Some(Section::Report),
            _ => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// 用户可见的通知，显示在日志面板和状态栏
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    pub fn line(&self) -> String {
        let mark = match self.variant {
            ToastVariant::Default => "✓",
            ToastVariant::Destructive => "✗",
        };
        format!("{} {}: {}", mark, self.title, self.description)
    }
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Toast(Toast),
    Auth(AuthState),
    Jobs(Vec<EvaluationJob>),
    JobsLoading(bool),
    JobCreated(EvaluationJob),
    EvaluationStarted { job_id: String },
    Step(StepUpdate),
    Progress(f64),
    EvaluationComplete(MockResults),
    EvaluationFinished,
}

pub struct App {
    pub section: Section,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub auth: AuthState,
    pub upload: UploadForm,
    pub jobs: Vec<EvaluationJob>,
    pub jobs_loading: bool,
    pub selected_index: usize,
    pub job_list_state: ListState,
    pub active_job_id: Option<String>,
    pub steps: Vec<EvaluationStep>,
    pub current_step: Option<usize>,
    pub is_running: bool,
    /// 正在运行的任务，与 active_job_id 独立，选择其他任务不影响它
    pub running_job_id: Option<String>,
    pub progress: f64,
    pub report_data: Option<MockResults>,
    pub last_toast: Option<Toast>,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["应用已启动".to_string()];
        log_messages.extend(startup_info);

        App {
            section: Section::Overview,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            auth: AuthState::Resolving,
            upload: UploadForm::default(),
            jobs: Vec::new(),
            jobs_loading: false,
            selected_index: 0,
            job_list_state: {
                let mut s = ListState::default();
                s.select(Some(0));
                s
            },
            active_job_id: None,
            steps: fresh_steps(),
            current_step: None,
            is_running: false,
            running_job_id: None,
            progress: 0.0,
            report_data: None,
            last_toast: None,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    pub fn notify(&mut self, toast: Toast) {
        self.log_messages.push(toast.line());
        self.last_toast = Some(toast);
    }

    pub fn goto(&mut self, section: Section) {
        self.section = section;
        self.menu_selected_index = section.index();
    }

    /// 当前任务：优先 active_job_id，否则取最新的一条
    pub fn active_job(&self) -> Option<&EvaluationJob> {
        match &self.active_job_id {
            Some(id) => self.jobs.iter().find(|j| &j.id == id),
            None => self.jobs.first(),
        }
    }

    pub fn can_run(&self) -> bool {
        !self.is_running
            && self
                .active_job()
                .map(|j| j.status == JobStatus::Pending)
                .unwrap_or(false)
    }

    /// 路由守卫放行时才能操作页面
    pub fn page_visible(&self) -> bool {
        matches!(guard(&self.auth), GuardOutcome::Render(_))
    }

    pub fn has_report(&self) -> bool {
        self.report_data.is_some()
    }

    pub fn clamp_selection(&mut self) {
        if self.selected_index >= self.jobs.len() {
            self.selected_index = self.jobs.len().saturating_sub(1);
        }
        self.job_list_state.select(Some(self.selected_index));
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) => self.add_log(msg),
            AppEvent::Toast(toast) => self.notify(toast),
            AppEvent::Auth(state) => {
                let same_user = matches!(
                    (self.auth.user(), state.user()),
                    (Some(a), Some(b)) if a.id == b.id
                );
                // 换人或退出后，上一个会话的任务和报告不再展示
                if !same_user {
                    self.active_job_id = None;
                    self.running_job_id = None;
                    self.report_data = None;
                }
                self.auth = state;
            }
            AppEvent::Jobs(list) => {
                self.jobs = list;
                self.clamp_selection();
            }
            AppEvent::JobsLoading(loading) => self.jobs_loading = loading,
            AppEvent::JobCreated(job) => {
                self.active_job_id = Some(job.id);
                self.upload = UploadForm::default();
                self.goto(Section::Evaluation);
            }
            AppEvent::EvaluationStarted { job_id } => {
                self.active_job_id = Some(job_id.clone());
                self.running_job_id = Some(job_id);
                self.steps = fresh_steps();
                self.current_step = Some(0);
                self.is_running = true;
                self.progress = 0.0;
            }
            // 会话切换后，旧运行的事件只结束运行状态
            AppEvent::Step(_) | AppEvent::Progress(_) | AppEvent::EvaluationComplete(_)
                if self.running_job_id.is_none() => {}
            AppEvent::Step(update) => {
                if update.status == StepStatus::Running {
                    self.current_step = Some(update.index);
                }
                update.apply(&mut self.steps);
            }
            AppEvent::Progress(p) => self.progress = p,
            AppEvent::EvaluationComplete(results) => {
                self.report_data = Some(results);
                self.goto(Section::Report);
            }
            AppEvent::EvaluationFinished => {
                self.is_running = false;
                self.running_job_id = None;
            }
        }
    }

    /// 获取当前的预测建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = [
            "login", "logout", "name", "dataset", "model", "remove", "create", "run", "select",
            "delete", "refresh", "goto", "export", "view", "help", "quit",
        ];
        let input = self.command_input.trim().trim_start_matches('/');
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.len() == 1 {
            for cmd in commands {
                if cmd.starts_with(parts[0]) && cmd != parts[0] {
                    return Some(cmd[parts[0].len()..].to_string());
                }
            }
            return None;
        }

        let subs: &[&str] = match parts[0] {
            "goto" => &["overview", "upload", "evaluation", "report"],
            "export" => &["html", "summary"],
            "remove" => &["dataset", "model"],
            _ => return None,
        };
        let cur = parts.get(1).copied().unwrap_or("");
        subs.iter()
            .find(|s| s.starts_with(cur) && **s != cur)
            .map(|s| s[cur.len()..].to_string())
    }

    fn send(&self, cmd: AppCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// 执行一条命令：本地状态的命令直接处理，其余解析成具体请求发往后台。
    /// 返回 true 表示退出。
    pub fn dispatch(&mut self, cmd: AppCommand) -> bool {
        let allowed_signed_out = matches!(
            cmd,
            AppCommand::Login { .. } | AppCommand::Help | AppCommand::Quit | AppCommand::Unknown(_)
        );
        if !self.page_visible() && !allowed_signed_out {
            self.notify(Toast::error(
                "Sign in required",
                "Use login <email> <password> first.",
            ));
            return false;
        }
        match cmd {
            AppCommand::Quit => return true,
            AppCommand::SetName(name) => {
                self.upload.job_name = name;
            }
            AppCommand::SelectFile { kind, path } => self.select_upload(kind, &path),
            AppCommand::RemoveFile(kind) => self.upload.remove_file(kind),
            AppCommand::Create => self.request_create(),
            AppCommand::Run => self.request_run(),
            AppCommand::Select(n) => self.select_job(n.saturating_sub(1)),
            AppCommand::Delete(n) => {
                let index = n.map(|n| n.saturating_sub(1)).unwrap_or(self.selected_index);
                self.request_delete(index);
            }
            AppCommand::Goto(section) => self.goto(section),
            AppCommand::Export(kind) => self.request_export(kind),
            AppCommand::View => match &self.report_data {
                Some(results) => self.send(AppCommand::ViewReport(results.clone())),
                None => self.notify(no_report()),
            },
            other => self.send(other),
        }
        false
    }

    fn select_upload(&mut self, kind: FileKind, path: &str) {
        match select_file(kind, path) {
            Ok(file) => {
                let title = match kind {
                    FileKind::Dataset => "Dataset uploaded",
                    FileKind::Model => "Model uploaded",
                };
                let desc = format!("Successfully uploaded {}", file.name);
                self.upload.set_file(kind, file);
                self.notify(Toast::info(title, desc));
            }
            Err(e) => self.notify(Toast::error("Invalid file", e.to_string())),
        }
    }

    pub fn request_create(&mut self) {
        match self.upload.submission() {
            Some((name, dataset, model)) => self.send(AppCommand::CreateJob {
                name,
                dataset,
                model,
            }),
            None => self.notify(Toast::error(
                "Missing information",
                "Please select both files and enter a job name.",
            )),
        }
    }

    pub fn request_run(&mut self) {
        if self.is_running {
            self.add_log("评估正在进行中".to_string());
            return;
        }
        match self.active_job().filter(|_| self.can_run()).cloned() {
            Some(job) => self.send(AppCommand::RunJob(job)),
            None => self.notify(Toast::error(
                "Cannot start evaluation",
                "Please select a valid evaluation job first.",
            )),
        }
    }

    fn select_job(&mut self, index: usize) {
        if let Some(job) = self.jobs.get(index) {
            self.active_job_id = Some(job.id.clone());
            self.selected_index = index;
            self.job_list_state.select(Some(index));
        } else {
            self.add_log(format!("没有第 {} 个任务", index + 1));
        }
    }

    fn request_delete(&mut self, index: usize) {
        match self.jobs.get(index) {
            Some(job) => {
                if self.running_job_id.as_deref() == Some(job.id.as_str()) {
                    self.add_log("运行中的任务不能删除".to_string());
                    return;
                }
                if self.active_job_id.as_deref() == Some(job.id.as_str()) {
                    self.active_job_id = None;
                }
                self.send(AppCommand::DeleteJob(job.id.clone()));
            }
            None => self.add_log(format!("没有第 {} 个任务", index + 1)),
        }
    }

    fn request_export(&mut self, kind: ExportKind) {
        match &self.report_data {
            Some(results) => self.send(AppCommand::ExportReport {
                kind,
                results: results.clone(),
            }),
            None => self.notify(no_report()),
        }
    }

    fn reset_command_line(&mut self) {
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            return self.handle_command_key(key);
        }

        // 未登录时只允许命令行和退出
        if !self.page_visible() {
            return match key {
                KeyCode::Char('/') => {
                    self.input_mode = InputMode::Command;
                    self.command_input.clear();
                    self.command_cursor = 0;
                    false
                }
                KeyCode::Char('q') => true,
                _ => false,
            };
        }

        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
                false
            }
            KeyCode::Char('q') => true,
            KeyCode::Left => {
                self.focus_area = FocusArea::Menu;
                false
            }
            KeyCode::Right => {
                self.focus_area = FocusArea::MainView;
                false
            }
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else if self.section == Section::Evaluation && self.selected_index > 0 {
                    self.selected_index -= 1;
                    self.job_list_state.select(Some(self.selected_index));
                }
                false
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index < Section::ALL.len() - 1 {
                        self.menu_selected_index += 1;
                    }
                } else if self.section == Section::Evaluation
                    && self.selected_index < self.jobs.len().saturating_sub(1)
                {
                    self.selected_index += 1;
                    self.job_list_state.select(Some(self.selected_index));
                }
                false
            }
            KeyCode::Enter | KeyCode::Char('c') if self.focus_area == FocusArea::Menu => {
                self.goto(Section::ALL[self.menu_selected_index]);
                self.focus_area = FocusArea::MainView;
                false
            }
            _ => {
                self.handle_section_key(key);
                false
            }
        }
    }

    fn handle_section_key(&mut self, key: KeyCode) {
        match (self.section, key) {
            // Start Evaluation / View Pipeline
            (Section::Overview, KeyCode::Enter) => self.goto(Section::Upload),
            (Section::Overview, KeyCode::Char('p')) => self.goto(Section::Evaluation),
            (Section::Upload, KeyCode::Enter | KeyCode::Char('c')) => self.request_create(),
            (Section::Evaluation, KeyCode::Enter) => self.select_job(self.selected_index),
            (Section::Evaluation, KeyCode::Char('r')) => self.request_run(),
            (Section::Evaluation, KeyCode::Char('d')) => self.request_delete(self.selected_index),
            (Section::Report, KeyCode::Char('v')) => {
                self.dispatch(AppCommand::View);
            }
            (Section::Report, KeyCode::Char('h')) => self.request_export(ExportKind::Html),
            (Section::Report, KeyCode::Char('s')) => self.request_export(ExportKind::Summary),
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Enter => {
                let cmd_owned = self.command_input.trim().to_string();
                self.reset_command_line();
                if cmd_owned.is_empty() {
                    return false;
                }
                self.command_history.push(cmd_owned.clone());
                self.command_history_index = None;

                let cmd = AppCommand::from_str(&cmd_owned)
                    .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                self.dispatch(cmd)
            }
            KeyCode::Esc => {
                self.reset_command_line();
                false
            }
            KeyCode::Tab => {
                if let Some(hint) = self.get_completion_hint() {
                    let insert = format!("{} ", hint);
                    self.command_input.insert_str(self.command_cursor, &insert);
                    self.command_cursor += insert.len();
                }
                false
            }
            KeyCode::Up => {
                if self.command_history.is_empty() {
                    return false;
                }
                let next = match self.command_history_index {
                    None => self.command_history.len().saturating_sub(1),
                    Some(i) => i.saturating_sub(1),
                };
                self.command_history_index = Some(next);
                if let Some(cmd) = self.command_history.get(next) {
                    self.command_input = cmd.clone();
                    self.command_cursor = self.command_input.len();
                }
                false
            }
            KeyCode::Down => {
                let Some(i) = self.command_history_index else {
                    return false;
                };
                let next = i + 1;
                if next >= self.command_history.len() {
                    self.command_history_index = None;
                    self.command_input.clear();
                    self.command_cursor = 0;
                    return false;
                }
                self.command_history_index = Some(next);
                if let Some(cmd) = self.command_history.get(next) {
                    self.command_input = cmd.clone();
                    self.command_cursor = self.command_input.len();
                }
                false
            }
            KeyCode::Backspace => {
                if self.command_cursor > 0 {
                    let prev = prev_char_boundary(&self.command_input, self.command_cursor);
                    self.command_input.remove(prev);
                    self.command_cursor = prev;
                }
                false
            }
            KeyCode::Delete => {
                if self.command_cursor < self.command_input.len() {
                    self.command_input.remove(self.command_cursor);
                }
                false
            }
            KeyCode::Left => {
                if self.command_cursor > 0 {
                    self.command_cursor = prev_char_boundary(&self.command_input, self.command_cursor);
                }
                false
            }
            KeyCode::Right => {
                if let Some(c) = self.command_input[self.command_cursor..].chars().next() {
                    self.command_cursor += c.len_utf8();
                }
                false
            }
            KeyCode::Home => {
                self.command_cursor = 0;
                false
            }
            KeyCode::End => {
                self.command_cursor = self.command_input.len();
                false
            }
            KeyCode::Char(c) => {
                self.command_input.insert(self.command_cursor, c);
                self.command_cursor += c.len_utf8();
                false
            }
            _ => false,
        }
    }
}

fn no_report() -> Toast {
    Toast::error(
        "No Report Available",
        "Complete the evaluation pipeline to generate a report first.",
    )
}

fn prev_char_boundary(s: &str, cursor: usize) -> usize {
    s[..cursor]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}
