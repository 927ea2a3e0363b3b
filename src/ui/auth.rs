use super::panel;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render_loading(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Checking session...",
            Style::default().fg(Color::Yellow),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel("加载中", false));
    f.render_widget(paragraph, area);
}

pub fn render_login(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Sign in required",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Sign in to access the evaluation workspace."),
        Line::from(""),
        Line::from(vec![
            Span::raw("按 / 后输入 "),
            Span::styled(
                "/login <email> <password>",
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from("或在 .env 中设置 EVAL_EMAIL / EVAL_PASSWORD 自动登录"),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel("登录", true));
    f.render_widget(paragraph, area);
}
