use super::panel;
use crate::app_state::{App, FocusArea};
use crate::evaluation::{StepStatus, STEP_COUNT};
use crate::jobs::JobStatus;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

fn job_color(status: JobStatus) -> Color {
    match status {
        JobStatus::Pending => Color::Yellow,
        JobStatus::Running => Color::Cyan,
        JobStatus::Completed => Color::Green,
        JobStatus::Failed => Color::Red,
    }
}

fn step_style(status: StepStatus) -> (&'static str, Color) {
    match status {
        StepStatus::Pending => ("○", Color::Gray),
        StepStatus::Running => ("▶", Color::Yellow),
        StepStatus::Completed => ("✓", Color::Green),
        StepStatus::Error => ("✗", Color::Red),
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_jobs(f, columns[0], app);

    let right = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(columns[1]);
    render_controls(f, right[0], app);
    render_steps(f, right[1], app);
}

fn render_jobs(f: &mut Frame, area: Rect, app: &mut App) {
    let active_id = app.active_job().map(|j| j.id.clone());
    let items: Vec<ListItem> = app
        .jobs
        .iter()
        .enumerate()
        .map(|(i, job)| {
            let color = job_color(job.status);
            let marker = if active_id.as_deref() == Some(job.id.as_str()) {
                "★"
            } else {
                " "
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}{:>2}. ", marker, i + 1)),
                Span::styled(format!("{:<10}", job.status.as_str()), Style::default().fg(color)),
                Span::raw(job.name.clone()),
            ]))
        })
        .collect();

    let focused = app.focus_area == FocusArea::MainView;
    let mut title = format!("Jobs ({})", app.jobs.len());
    if app.jobs_loading {
        title.push_str(" 加载中...");
    }
    if focused {
        title.push_str(" Enter 选中 d 删除");
    }

    let list = List::new(items)
        .block(panel(title, focused))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    app.job_list_state.select(Some(app.selected_index));
    f.render_stateful_widget(list, area, &mut app.job_list_state);
}

fn render_controls(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Evaluation Controls (r 开始)");

    if app.is_running {
        let step = app.current_step.unwrap_or(0);
        let title = app.steps.get(step).map(|s| s.title).unwrap_or("");
        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan))
            .percent(app.progress.clamp(0.0, 100.0).round() as u16)
            .label(format!(
                "{}% Step {} of {}: {}",
                app.progress.round(),
                step + 1,
                STEP_COUNT,
                title
            ));
        f.render_widget(gauge, area);
        return;
    }

    let mut lines = Vec::new();
    match app.active_job() {
        Some(job) => {
            lines.push(Line::from(vec![
                Span::raw("Active job: "),
                Span::styled(job.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(job.status.as_str(), Style::default().fg(job_color(job.status))),
            ]));
            if let Some(err) = &job.error_message {
                lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
            }
        }
        None => lines.push(Line::from("No evaluation job yet")),
    }
    if app.can_run() {
        lines.push(Line::from(Span::styled(
            "Start Evaluation Pipeline: 按 r 或 /run",
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Upload both dataset and model files to enable evaluation",
            Style::default().fg(Color::Gray),
        )));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_steps(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let (symbol, color) = step_style(step.status);
            let duration = step
                .duration
                .map(|d| format!("{:.1}s", d.as_secs_f64()))
                .unwrap_or_default();
            let mut style = Style::default();
            if app.is_running && app.current_step == Some(i) {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", symbol), Style::default().fg(color)),
                Span::styled(format!("{:<26}", step.title), style),
                Span::styled(format!("{:<10}", step.status.label()), Style::default().fg(color)),
                Span::styled(format!("{:>6} ", duration), Style::default().fg(Color::Gray)),
                Span::styled(step.description, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pipeline Steps"),
    );
    f.render_widget(list, area);
}
