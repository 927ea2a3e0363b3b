use super::panel;
use crate::app_state::{App, FocusArea};
use crate::upload::{format_file_size, FileKind, UploadedFile};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn file_card(kind: FileKind, file: Option<&UploadedFile>) -> Paragraph<'static> {
    let (title, description) = match kind {
        FileKind::Dataset => ("Dataset", "Image dataset archive with class folders"),
        FileKind::Model => ("Keras Model", "Pre-trained Keras model file"),
    };

    let mut lines = vec![
        Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
        Line::from(""),
    ];
    match file {
        Some(file) => {
            lines.push(Line::from(Span::styled(
                format!("✓ {}", file.name),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!(
                "  {}  {}",
                format_file_size(file.size),
                file.mime
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("替换: /{} <path>   移除: /remove {}", kind, kind)));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No file selected",
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("选择: /{} <path>", kind)));
        }
    }
    lines.push(Line::from(Span::styled(
        format!("Accepted: {}", kind.accepted()),
        Style::default().fg(Color::DarkGray),
    )));

    let border = if file.is_some() {
        Color::Green
    } else {
        Color::White
    };
    Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(border)),
    )
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus_area == FocusArea::MainView;
    let title = if focused {
        "Upload Your Files (Enter/c 创建任务, ← 菜单)"
    } else {
        "Upload Your Files"
    };
    let block = panel(title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(
            "Upload your dataset and pre-trained Keras model to begin the comprehensive evaluation pipeline.",
        )
        .wrap(Wrap { trim: false }),
        rows[0],
    );

    let cards = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    f.render_widget(file_card(FileKind::Dataset, app.upload.dataset.as_ref()), cards[0]);
    f.render_widget(file_card(FileKind::Model, app.upload.model.as_ref()), cards[1]);

    let name = if app.upload.job_name.trim().is_empty() {
        Span::styled("(未设置, /name <job name>)", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            app.upload.job_name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };
    let status = if app.upload.can_create() {
        Span::styled("Ready to create evaluation job", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            "Upload both dataset and model files and name the job to continue",
            Style::default().fg(Color::Gray),
        )
    };
    let lines = vec![
        Line::from(vec![Span::raw("Job name: "), name]),
        Line::from(""),
        Line::from(status),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Create Evaluation Job")),
        rows[2],
    );
}
