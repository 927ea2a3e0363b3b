use super::{heading, panel};
use crate::app_state::{App, FocusArea};
use crate::report::model::{corruption_label, percent, CardTone, EMPTY_TEXT, EMPTY_TITLE};
use crate::report::{report_view, ReportMetrics, ReportView};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus_area == FocusArea::MainView;
    match report_view(app.report_data.as_ref()) {
        ReportView::Empty => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    EMPTY_TITLE,
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(EMPTY_TEXT, Style::default().fg(Color::Gray))),
            ];
            let paragraph = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false })
                .block(panel("Evaluation Report", focused));
            f.render_widget(paragraph, area);
        }
        ReportView::Dashboard(metrics) => {
            let title = if focused {
                "Evaluation Report (v 查看, h 下载 HTML, s 下载摘要, ← 菜单)"
            } else {
                "Evaluation Report"
            };
            let block = panel(title, focused);
            let inner = block.inner(area);
            f.render_widget(block, area);
            render_dashboard(f, inner, metrics);
        }
    }
}

fn render_dashboard(f: &mut Frame, area: Rect, metrics: &ReportMetrics) {
    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(
            "Comprehensive analysis of your model's performance, robustness, and efficiency metrics.",
        )
        .wrap(Wrap { trim: false }),
        rows[0],
    );

    let cards = metrics.key_metrics();
    let card_areas = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[1]);
    for (card, area) in cards.iter().zip(card_areas.iter()) {
        let color = match card.tone {
            CardTone::Success => Color::Green,
            CardTone::Warning => Color::Yellow,
            CardTone::Default => Color::Cyan,
        };
        let lines = vec![
            Line::from(Span::styled(
                card.value.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(card.change, Style::default().fg(color))),
        ];
        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(card.title)
                .style(Style::default().fg(color)),
        );
        f.render_widget(widget, *area);
    }

    let grid = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    let mut left = vec![heading("Per-Class Performance")];
    for c in &metrics.per_class {
        left.push(Line::from(vec![
            Span::styled(
                format!("{:<8}", c.class),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                " P {:>6}  R {:>6}  F1 {:>6}  ",
                percent(c.precision),
                percent(c.recall),
                percent(c.f1)
            )),
            Span::styled(
                format!("{} samples", c.support),
                Style::default().fg(Color::Gray),
            ),
        ]));
    }
    left.push(Line::from(""));
    left.push(heading("Robustness Analysis"));
    for (key, acc) in &metrics.robustness {
        let filled = (acc * 20.0).round() as usize;
        left.push(Line::from(vec![
            Span::raw(format!("{:<18}", corruption_label(key))),
            Span::styled("█".repeat(filled), Style::default().fg(Color::Cyan)),
            Span::styled("░".repeat(20 - filled), Style::default().fg(Color::DarkGray)),
            Span::raw(format!(" {}", percent(*acc))),
        ]));
    }
    f.render_widget(Paragraph::new(left), grid[0]);

    let e = &metrics.efficiency;
    let cal = &metrics.calibration;
    let right = vec![
        heading("Model Efficiency"),
        Line::from(format!("Model Size:     {}", e.model_size)),
        Line::from(format!("Parameters:     {}", e.parameters)),
        Line::from(format!("Inference Time: {}", e.inference_time)),
        Line::from(format!("Memory Usage:   {}", e.memory_usage)),
        Line::from(""),
        heading("Model Calibration"),
        Line::from(format!("Brier Score:                {:.3}", cal.brier_score)),
        Line::from(format!("Expected Calibration Error: {:.3}", cal.ece)),
        Line::from(format!(
            "Confidence-Accuracy:        {}",
            percent(cal.confidence_accuracy)
        )),
    ];
    f.render_widget(Paragraph::new(right), grid[1]);
}
