use super::{heading, panel};
use crate::app_state::{App, FocusArea};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

struct Feature {
    title: &'static str,
    description: &'static str,
    items: [&'static str; 4],
}

const FEATURES: [Feature; 6] = [
    Feature {
        title: "Performance Metrics",
        description: "Comprehensive accuracy, precision, recall, and F1 scores with confidence intervals",
        items: ["Per-class metrics", "Macro/micro averages", "Bootstrap CI", "ROC/PR curves"],
    },
    Feature {
        title: "Robustness Testing",
        description: "Evaluate model stability under various corruption and perturbation types",
        items: ["Gaussian noise", "Motion blur", "JPEG compression", "Occlusion attacks"],
    },
    Feature {
        title: "Explainability Analysis",
        description: "Generate visual explanations and understand model decision-making",
        items: ["Grad-CAM heatmaps", "Integrated gradients", "Attention visualization", "Feature importance"],
    },
    Feature {
        title: "Efficiency Profiling",
        description: "Analyze computational requirements and optimization opportunities",
        items: ["Inference timing", "Memory usage", "Model size", "Parameter count"],
    },
    Feature {
        title: "Statistical Analysis",
        description: "Rigorous statistical testing and baseline comparisons",
        items: ["Significance testing", "Effect size", "Baseline comparison", "Calibration analysis"],
    },
    Feature {
        title: "Automated Reporting",
        description: "Generate publication-ready reports with all visualizations and metrics",
        items: ["Interactive HTML", "Summary export", "Reproducible results", "Professional formatting"],
    },
];

const PIPELINE_OUTLINE: [&str; 14] = [
    "Environment snapshot & reproducibility",
    "Dataset analysis & stratified splitting",
    "Model loading & validation",
    "Preprocessing & inference pipeline",
    "Core performance metrics",
    "Advanced visualizations",
    "Bootstrap confidence intervals",
    "Baseline model training",
    "Statistical significance testing",
    "Calibration & uncertainty analysis",
    "Robustness stress testing",
    "Explainability generation",
    "Efficiency profiling",
    "Comprehensive report generation",
];

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus_area == FocusArea::MainView;
    let title = if focused {
        "Overview (Enter 开始评估, p 查看流水线, ← 菜单)"
    } else {
        "Overview"
    };
    let block = panel(title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(inner);

    let mut left = vec![
        Line::from(Span::styled(
            "ML Model Evaluator",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(
            "Professional-grade model evaluation platform providing comprehensive performance analysis, robustness testing, and explainability insights for your machine learning models.",
        ),
        Line::from(""),
        heading("Comprehensive Evaluation Suite"),
    ];
    for feature in &FEATURES {
        left.push(Line::from(Span::styled(
            feature.title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        left.push(Line::from(Span::styled(
            feature.description,
            Style::default().fg(Color::Gray),
        )));
        left.push(Line::from(format!("  ✓ {}", feature.items.join("  ✓ "))));
    }
    f.render_widget(Paragraph::new(left).wrap(Wrap { trim: false }), columns[0]);

    let mut right = vec![heading("16-Step Evaluation Pipeline")];
    right.extend(
        PIPELINE_OUTLINE
            .iter()
            .enumerate()
            .map(|(i, step)| Line::from(format!("{:>2}. {}", i + 1, step))),
    );
    f.render_widget(Paragraph::new(right).wrap(Wrap { trim: false }), columns[1]);
}
