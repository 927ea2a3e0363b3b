mod auth;
mod evaluation;
mod overview;
mod report;
mod upload;

use crate::app_state::{App, FocusArea, InputMode, Section, ToastVariant};
use crate::session::{guard, GuardOutcome};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // 顶部标题栏
            Constraint::Min(0),     // 中间内容区域
            Constraint::Length(10), // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    // 路由守卫：会话解析中显示加载页，未登录显示登录页
    match guard(&app.auth) {
        GuardOutcome::Loading => auth::render_loading(f, chunks[1]),
        GuardOutcome::RedirectToLogin => auth::render_login(f, chunks[1]),
        GuardOutcome::Render(_) => {
            let middle_chunks = Layout::default()
                .direction(ratatui::layout::Direction::Horizontal)
                .constraints([Constraint::Length(20), Constraint::Min(0)])
                .split(chunks[1]);
            render_left_menu(f, middle_chunks[0], app);
            render_main_view(f, middle_chunks[1], app);
        }
    }

    render_bottom_bar(f, chunks[2], app);
}

/// 主视图的边框，获得焦点时高亮
pub(crate) fn panel(title: impl Into<String>, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.into())
        .style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        })
}

pub(crate) fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("--- {} ---", text),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let mut spans = vec![
        Span::styled(
            " ML Model Evaluator ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - Terminal TUI"),
    ];
    if let Some(user) = app.auth.user() {
        spans.push(Span::styled(
            format!("  [{}]", user),
            Style::default().fg(Color::Gray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(title)
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let menu_items: Vec<ListItem> = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = *section == app.section;

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            // 没有报告时给 Report 加个提示
            let suffix = if *section == Section::Report && !app.has_report() {
                " -"
            } else {
                ""
            };
            ListItem::new(format!("{}{}{}", prefix, section.title(), suffix)).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "菜单 (Enter/c 确认)"
    } else {
        "菜单 (← 切换)"
    };

    let menu = List::new(menu_items).block(panel(title, app.focus_area == FocusArea::Menu));
    f.render_widget(menu, area);
}

fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    match app.section {
        Section::Overview => overview::render(f, area, app),
        Section::Upload => upload::render(f, area, app),
        Section::Evaluation => evaluation::render(f, area, app),
        Section::Report => report::render(f, area, app),
    }
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let cur = app.command_cursor.min(app.command_input.len());
        let (left, right) = app.command_input.split_at(cur);
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    } else {
        match &app.last_toast {
            Some(toast) => {
                let color = match toast.variant {
                    ToastVariant::Default => Color::Green,
                    ToastVariant::Destructive => Color::Red,
                };
                Line::from(vec![
                    Span::styled(
                        format!("{} ", toast.title),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(toast.description.as_str()),
                ])
            }
            None => Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式, help 查看命令)"),
            ]),
        }
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式 (Enter执行 Esc取消 Tab补全 ↑↓历史)"
            } else {
                "命令输入 (/命令 ←→切换 ↑↓导航 Enter确认 q退出)"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    // 最新的在顶部，最多 20 条
    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with("✓") {
                Style::default().fg(Color::Green)
            } else if msg.starts_with("✗") {
                Style::default().fg(Color::Red)
            } else if msg.starts_with("⚠") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}
