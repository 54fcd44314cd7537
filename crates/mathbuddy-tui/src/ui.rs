use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{self, Canvas, Points},
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem, Paragraph, Wrap,
    },
    Frame,
};

use mathbuddy_core::plot::{
    Bounds, LinePlot, Rgb, VectorPlot, REFERENCE_COLOR, VECTOR_LINE_COLOR, VECTOR_POINT_COLOR,
};
use mathbuddy_core::{Plot, Typesetter};

use crate::app::{App, InputMode};
use crate::markup;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.show_plot && app.plot.is_some() {
        let [chat_column, plot_area] = Layout::horizontal([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .areas(body_area);
        render_chat_column(app, frame, chat_column);
        render_plot(app, frame, plot_area);
    } else {
        render_chat_column(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Math Buddy ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.tutor.model()),
            Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INPUT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_model_picker {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        match app.input_mode {
            InputMode::Normal => {
                let mut hints = vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                ];
                if app.plot.is_some() {
                    hints.extend(vec![
                        Span::styled(" p ", key_style),
                        Span::styled(if app.show_plot { " hide plot " } else { " show plot " }, label_style),
                        Span::styled(" e ", key_style),
                        Span::styled(" export ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" M ", key_style),
                    Span::styled(" model ", label_style),
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
        }
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    spans.extend(hints);
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Green),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat_column(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area for mouse hit-testing and scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let you_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let tutor_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.session.messages() {
        let (label, style) = if msg.is_from_user {
            ("You:", you_style)
        } else {
            ("Tutor:", tutor_style)
        };
        lines.push(Line::from(Span::styled(label, style)));

        let text = app.typesetter.typeset(&msg.text);
        lines.extend(markup::to_lines(&text, Style::default()));
        lines.push(Line::default());
    }

    if app.is_busy() {
        lines.push(Line::from(Span::styled("Tutor:", tutor_style)));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let (title, border_color) = if app.is_busy() {
        (" Waiting for the tutor... ", Color::DarkGray)
    } else if editing {
        (" Your answer or question ", Color::Yellow)
    } else {
        (" Your answer or question (i to type) ", Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor visible by scrolling the input horizontally
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing && !app.is_busy() {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn axis_labels(range: [f64; 2]) -> Vec<Span<'static>> {
    let [lo, hi] = range;
    vec![
        Span::raw(format!("{}", lo)),
        Span::raw("0"),
        Span::raw(format!("{}", hi)),
    ]
}

fn reference_segments(bounds: &Bounds) -> Vec<Vec<(f64, f64)>> {
    bounds
        .reference_lines()
        .iter()
        .map(|&(from, to)| vec![from, to])
        .collect()
}

fn render_plot(app: &App, frame: &mut Frame, area: Rect) {
    let Some(plot) = app.plot.as_ref() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(format!(" {} ", plot.title()));

    match plot {
        Plot::Lines(lines) => render_line_plot(lines, block, frame, area),
        Plot::Vectors(vectors) => render_vector_plot(vectors, block, frame, area),
    }
}

fn render_line_plot(plot: &LinePlot, block: Block, frame: &mut Frame, area: Rect) {
    let references = reference_segments(&plot.bounds);

    let mut datasets: Vec<Dataset> = references
        .iter()
        .map(|segment| {
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color(REFERENCE_COLOR)))
                .data(segment)
        })
        .collect();

    datasets.extend(plot.series.iter().map(|series| {
        Dataset::default()
            .name(series.label.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color(series.color)))
            .data(&series.points)
    }));

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("x")
                .style(Style::default().fg(Color::Gray))
                .bounds(plot.bounds.x)
                .labels(axis_labels(plot.bounds.x)),
        )
        .y_axis(
            Axis::default()
                .title("y")
                .style(Style::default().fg(Color::Gray))
                .bounds(plot.bounds.y)
                .labels(axis_labels(plot.bounds.y)),
        );

    frame.render_widget(chart, area);
}

fn render_vector_plot(plot: &VectorPlot, block: Block, frame: &mut Frame, area: Rect) {
    let bounds = plot.bounds;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(|ctx| {
            for ((x1, y1), (x2, y2)) in bounds.reference_lines() {
                ctx.draw(&canvas::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: color(REFERENCE_COLOR),
                });
            }

            for v in plot.vectors() {
                ctx.draw(&canvas::Line {
                    x1: 0.0,
                    y1: 0.0,
                    x2: v.x,
                    y2: v.y,
                    color: color(VECTOR_LINE_COLOR),
                });
            }

            ctx.layer();

            for p in &plot.points {
                ctx.draw(&Points {
                    coords: &[(p.x, p.y)],
                    color: color(VECTOR_POINT_COLOR),
                });
                ctx.print(
                    p.x,
                    p.y,
                    Span::styled(
                        format!(" {} ({}, {})", p.name, p.x, p.y),
                        Style::default().fg(color(VECTOR_POINT_COLOR)).bold(),
                    ),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height = (app.available_models.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model ");

    let current = app.tutor.model().to_string();
    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if *model == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathbuddy_core::Config;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let config = Config {
            ollama_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::default()
        };
        let mut app = App::new(&config).unwrap();
        app.typesetter.init();
        app
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut text = String::new();
        for (i, cell) in buffer.content.iter().enumerate() {
            text.push_str(cell.symbol());
            if (i + 1) % width == 0 {
                text.push('\n');
            }
        }
        text
    }

    #[test]
    fn test_render_greeting_and_header() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Math Buddy"));
        assert!(text.contains("[qwen3]"));
        assert!(text.contains("Tutor:"));
        assert!(text.contains("Hi! I'm your math tutor."));
        assert_eq!(app.chat_width, 98);
    }

    #[test]
    fn test_render_typeset_reply_with_plot() {
        let mut app = app();
        app.session.begin_turn("what is half of 10?");
        app.session
            .complete_turn("<strong>Right</strong>, and 1/2 of the line 2x+3y=6 is a start");
        app.plot = Plot::for_message(&app.session.messages()[2].text);
        assert!(app.plot.is_some());

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("You:"));
        assert!(text.contains("1/2"));
        assert!(!text.contains("\\frac"));
        assert!(!text.contains("<strong>"));
        assert!(text.contains("Equations"));
    }

    #[test]
    fn test_render_vector_plot_and_picker() {
        let mut app = app();
        app.plot = Some(Plot::from_equations(&["vector A = (3, 4)".to_string()]));
        app.open_model_picker(vec!["qwen3".to_string(), "llama3.2".to_string()]);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Vectors"));
        assert!(text.contains("Select Model"));
        assert!(text.contains("llama3.2"));
    }

    #[test]
    fn test_scroll_to_bottom_shows_end_of_long_reply() {
        let mut app = app();
        app.session.begin_turn("ok");
        app.session.complete_turn(
            "here are plenty of plain words that keep going along this narrow pane \
             until the very last one shows up after a few more short filler bits at the \
             end FINALWORD",
        );

        let mut terminal = Terminal::new(TestBackend::new(22, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert_eq!(app.chat_width, 20);
        assert!(!screen_text(&terminal).contains("FINALWORD"));

        app.scroll_to_bottom();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen_text(&terminal).contains("FINALWORD"));
    }
}
