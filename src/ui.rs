use crate::app::App;
use crate::braille;
use crate::fractal::FitResult;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 46;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const ERROR_COLOR: Color = Color::Red;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
            .split(area);

        render_canvas(frame, layout[0], app);
        render_sidebar(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Fit summary
            Constraint::Min(10),   // Log-log chart
            Constraint::Length(3), // Key hints
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_chart(frame, sections[1], app);

    let hints = Paragraph::new(Line::from(Span::styled(
        "m method  v fullscreen  h help  q quit",
        Style::default().fg(DIM_TEXT_COLOR),
    )))
    .block(styled_block(""));
    frame.render_widget(hints, sections[2]);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Fractal Dimension ");

    let label = |text: &str| Span::styled(format!("{:<11}", text), Style::default().fg(DIM_TEXT_COLOR));
    let value = |text: String| Span::styled(text, Style::default().fg(TEXT_COLOR));

    let mut content = vec![
        Line::from(vec![label("Cluster"), value(app.source.clone())]),
        Line::from(vec![label("Points"), value(app.cluster.len().to_string())]),
        Line::from(vec![label("Method"), value(app.method.name().to_string())]),
    ];

    match &app.fit {
        Ok(fit) => {
            content.push(Line::from(vec![
                label("Dimension"),
                Span::styled(format!("{:.4}", fit.dimension), Style::default().fg(HIGHLIGHT_COLOR)),
            ]));
            content.push(Line::from(vec![label("R²"), value(format!("{:.4}", fit.r_squared))]));
            content.push(Line::from(vec![
                label("Scales"),
                value(format!("{:?}", app.scales())),
            ]));
        }
        Err(reason) => {
            content.push(Line::from(Span::styled(
                format!("No fit: {}", reason),
                Style::default().fg(ERROR_COLOR),
            )));
        }
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Axis bounds padded so points do not sit on the frame
fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(0.1);
    [lo - pad, hi + pad]
}

/// Endpoints of the fitted line across the sampled x range
fn fit_line(fit: &FitResult) -> Vec<(f64, f64)> {
    let [x0, x1] = padded_bounds(fit.log_points.iter().map(|&(x, _)| x));
    vec![(x0, fit.predict(x0)), (x1, fit.predict(x1))]
}

fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" log-log ");
    let fit = match &app.fit {
        Ok(fit) => fit,
        Err(_) => {
            let placeholder = Paragraph::new(Span::styled(
                "Fit unavailable",
                Style::default().fg(DIM_TEXT_COLOR),
            ))
            .block(block);
            frame.render_widget(placeholder, area);
            return;
        }
    };

    let line = fit_line(fit);
    let x_bounds = padded_bounds(fit.log_points.iter().map(|&(x, _)| x));
    let y_bounds = padded_bounds(
        fit.log_points
            .iter()
            .map(|&(_, y)| y)
            .chain(line.iter().map(|&(_, y)| y)),
    );
    let (x_label, y_label) = fit.method.axis_labels();

    let datasets = vec![
        Dataset::default()
            .name("samples")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(HIGHLIGHT_COLOR))
            .data(&fit.log_points),
        Dataset::default()
            .name(format!("slope {:.3}", fit.slope))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(BORDER_COLOR))
            .data(&line),
    ];

    let axis_labels = |[lo, hi]: [f64; 2]| vec![Span::raw(format!("{:.1}", lo)), Span::raw(format!("{:.1}", hi))];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(x_label)
                .style(Style::default().fg(DIM_TEXT_COLOR))
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title(y_label)
                .style(Style::default().fg(DIM_TEXT_COLOR))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    frame.render_widget(chart, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Cluster ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(&app.cluster, inner.width, inner.height);

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            frame.render_widget(Paragraph::new(Line::from(span)), cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 40.min(area.width.saturating_sub(4));
    let help_height = 10.min(area.height.saturating_sub(2));
    let help_area = Rect {
        x: area.x + (area.width.saturating_sub(help_width)) / 2,
        y: area.y + (area.height.saturating_sub(help_height)) / 2,
        width: help_width,
        height: help_height,
    };

    let key = |k: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<8}", k), Style::default().fg(HIGHLIGHT_COLOR)),
            Span::styled(desc.to_string(), Style::default().fg(TEXT_COLOR)),
        ])
    };

    let content = vec![
        key("m", "Toggle box counting / mass-radius"),
        key("v", "Toggle fullscreen cluster"),
        key("h", "Toggle this help"),
        key("q, Esc", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Colors run from seed (blue) to newest (pink)",
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Paragraph::new(content)
            .block(styled_block(" Help "))
            .wrap(Wrap { trim: false }),
        help_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, Point};
    use crate::fractal::EstimationMethod;
    use ratatui::{backend::TestBackend, Terminal};

    fn line_app(len: i32) -> App {
        let mut cluster = Cluster::new();
        for x in 0..len {
            cluster.insert(Point::new(x, 0));
        }
        App::new(cluster, "line", EstimationMethod::BoxCounting, vec![1, 2, 4, 8], vec![1, 2])
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_padded_bounds() {
        let [lo, hi] = padded_bounds([1.0, 3.0].into_iter());
        assert!((lo - 0.9).abs() < 1e-12 && (hi - 3.1).abs() < 1e-12);
        assert_eq!(padded_bounds(std::iter::empty()), [0.0, 1.0]);
    }

    #[test]
    fn test_fit_line_follows_fit() {
        let app = line_app(64);
        let fit = app.fit.as_ref().unwrap();
        for (x, y) in fit_line(fit) {
            assert!((fit.predict(x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_render_shows_dimension() {
        let app = line_app(64);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Fractal Dimension"));
        assert!(text.contains("1.0000"));
    }

    #[test]
    fn test_render_reports_failed_fit() {
        let app = App::new(
            Cluster::with_seed(Point::new(2, 2)),
            "dot",
            EstimationMethod::BoxCounting,
            vec![1, 2],
            vec![1, 2],
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("No fit"));
        assert!(text.contains("Fit unavailable"));
    }
}
