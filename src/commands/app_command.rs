use crate::app_state::Section;
use crate::evaluation::MockResults;
use crate::jobs::{EvaluationJob, FileInfo};
use crate::report::ExportKind;
use crate::upload::FileKind;
use std::str::FromStr;

pub const HELP_TEXT: &str = "可用命令: login <email> <password> | logout | name <job name> | dataset <path> | model <path> | remove dataset|model | create | run | select <n> | delete [n] | refresh | goto overview|upload|evaluation|report | export html|summary | view | help | quit";

#[derive(Debug, Clone)]
pub enum AppCommand {
    Login {
        email: String,
        password: String,
    },
    Logout,
    Refresh,
    SetName(String),
    SelectFile {
        kind: FileKind,
        path: String,
    },
    RemoveFile(FileKind),
    Create,
    Run,
    /// 列表中的序号，从 1 开始
    Select(usize),
    Delete(Option<usize>),
    Goto(Section),
    Export(ExportKind),
    View,
    Help,
    Quit,
    // 以下由 App 根据当前状态生成，交给后台任务执行
    CreateJob {
        name: String,
        dataset: FileInfo,
        model: FileInfo,
    },
    RunJob(EvaluationJob),
    DeleteJob(String),
    ExportReport {
        kind: ExportKind,
        results: MockResults,
    },
    ViewReport(MockResults),
    Unknown(String),
}

fn parse_kind(s: Option<&&str>) -> Option<FileKind> {
    match s.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("dataset") | Some("data") => Some(FileKind::Dataset),
        Some("model") => Some(FileKind::Model),
        _ => None,
    }
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 界面提示里写的是 `/login`，前导斜杠可有可无
        let s = s.trim_start().trim_start_matches('/');
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }
        let rest = parts[1..].join(" ");

        match parts[0] {
            "login" => match (parts.get(1), parts.get(2)) {
                (Some(email), Some(_)) => Ok(AppCommand::Login {
                    email: email.to_string(),
                    // 密码允许包含空格
                    password: parts[2..].join(" "),
                }),
                _ => Ok(AppCommand::Unknown("用法: login <email> <password>".to_string())),
            },
            "logout" => Ok(AppCommand::Logout),
            "refresh" => Ok(AppCommand::Refresh),
            "name" => {
                if rest.is_empty() {
                    Ok(AppCommand::Unknown("用法: name <job name>".to_string()))
                } else {
                    Ok(AppCommand::SetName(rest))
                }
            }
            "dataset" | "model" => {
                let kind = if parts[0] == "dataset" {
                    FileKind::Dataset
                } else {
                    FileKind::Model
                };
                if rest.is_empty() {
                    Ok(AppCommand::Unknown(format!("用法: {} <path>", parts[0])))
                } else {
                    Ok(AppCommand::SelectFile { kind, path: rest })
                }
            }
            "remove" => match parse_kind(parts.get(1)) {
                Some(kind) => Ok(AppCommand::RemoveFile(kind)),
                None => Ok(AppCommand::Unknown("用法: remove dataset|model".to_string())),
            },
            "create" => Ok(AppCommand::Create),
            "run" | "start" => Ok(AppCommand::Run),
            "select" => match parts.get(1).and_then(|s| s.parse::<usize>().ok()) {
                Some(n) if n > 0 => Ok(AppCommand::Select(n)),
                _ => Ok(AppCommand::Unknown("用法: select <n>".to_string())),
            },
            "delete" | "del" => match parts.get(1) {
                None => Ok(AppCommand::Delete(None)),
                Some(s) => match s.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(AppCommand::Delete(Some(n))),
                    _ => Ok(AppCommand::Unknown("用法: delete [n]".to_string())),
                },
            },
            "goto" | "go" => match parts.get(1).and_then(|s| Section::from_name(s)) {
                Some(section) => Ok(AppCommand::Goto(section)),
                None => Ok(AppCommand::Unknown(
                    "用法: goto overview|upload|evaluation|report".to_string(),
                )),
            },
            "export" | "download" => {
                match parts.get(1).map(|s| s.to_ascii_lowercase()).as_deref() {
                    Some("html") => Ok(AppCommand::Export(ExportKind::Html)),
                    Some("summary") | Some("txt") => Ok(AppCommand::Export(ExportKind::Summary)),
                    _ => Ok(AppCommand::Unknown("用法: export html|summary".to_string())),
                }
            }
            "view" => Ok(AppCommand::View),
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("未知命令: {}", parts[0]))),
        }
    }
}
