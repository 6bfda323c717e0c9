use genui::notify::NotificationLevel;
use genui::{preview, Framework, Phase, Provider, Tab};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, FocusPane, InputMode};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

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

    if app.session.view().fullscreen_open {
        render_fullscreen_preview(app, frame, body_area);
    } else {
        let [form_area, output_area] = Layout::horizontal([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .areas(body_area);
        render_form(app, frame, form_area);
        render_output(app, frame, output_area);
    }

    render_footer(app, frame, footer_area);
    render_notifications(app, frame, body_area);

    // Render popups (in order of priority)
    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    } else if app.show_provider_picker {
        render_provider_picker(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    } else if app.show_framework_picker {
        render_framework_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let loading_indicator = if app.models_loading {
        " [loading models] "
    } else {
        ""
    };

    let title = Line::from(vec![
        Span::styled(" GenUI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {}: {} ", app.current_provider.display_name(), app.selected_model),
            Style::default().fg(Color::White),
        ),
        Span::styled(loading_indicator, Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    if app.input_mode == InputMode::Editing {
        hints.extend(hint(" Enter ", " generate "));
        hints.extend(hint(" Esc ", " stop editing "));
        hints.extend(hint(" ^U ", " clear "));
    } else if app.session.view().fullscreen_open {
        hints.extend(hint(" Esc ", " close "));
        hints.extend(hint(" r ", " refresh "));
        hints.extend(hint(" o ", " open in browser "));
    } else if app.focus == FocusPane::Output && app.session.phase() == Phase::Ready {
        hints.extend(hint(" 1/2 ", " tab "));
        hints.extend(hint(" j/k ", " scroll "));
        hints.extend(hint(" c ", " copy "));
        hints.extend(hint(" s ", " export "));
        hints.extend(hint(" f ", " fullscreen "));
        hints.extend(hint(" o ", " browser "));
        hints.extend(hint(" n ", " new "));
    } else {
        hints.extend(hint(" i ", " edit "));
        hints.extend(hint(" g ", " generate "));
        hints.extend(hint(" F ", " framework "));
        hints.extend(hint(" P ", " provider "));
        hints.extend(hint(" M ", " model "));
        hints.extend(hint(" Tab ", " focus "));
    }
    hints.extend(hint(" q ", " quit "));

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn border_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn render_form(app: &mut App, frame: &mut Frame, area: Rect) {
    let [framework_area, prompt_area, submit_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(area);

    // Framework selector
    let framework_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app.focus == FocusPane::Framework)))
        .title(" Framework (F) ");
    let framework = Paragraph::new(Line::from(vec![
        Span::styled(
            app.session.framework.display_name(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" \u{25be}", Style::default().fg(Color::DarkGray)),
    ]))
    .block(framework_block);
    frame.render_widget(framework, framework_area);

    // Prompt
    app.prompt_area = Some(prompt_area);
    let editing = app.input_mode == InputMode::Editing;
    let prompt_border = if editing {
        Color::Yellow
    } else {
        border_color(app.focus == FocusPane::Prompt)
    };
    let prompt_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(prompt_border))
        .title(" Describe your component ");

    let inner_width = prompt_area.width.saturating_sub(2) as usize;
    let prompt_text = if app.session.prompt_input.is_empty() && !editing {
        Text::from(Span::styled(
            "e.g. a pricing table with three tiers",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(wrap_chars(&app.session.prompt_input, inner_width))
    };
    let prompt = Paragraph::new(prompt_text)
        .style(Style::default().fg(Color::Cyan))
        .block(prompt_block);
    frame.render_widget(prompt, prompt_area);

    if editing && inner_width > 0 {
        let row = (app.prompt_cursor / inner_width) as u16;
        let col = (app.prompt_cursor % inner_width) as u16;
        let max_row = prompt_area.height.saturating_sub(3);
        frame.set_cursor_position((prompt_area.x + 1 + col, prompt_area.y + 1 + row.min(max_row)));
    }

    // Submit control
    let (label, style) = if app.session.is_loading() {
        (
            format!(" {} Generating... ", SPINNER[app.animation_frame as usize % SPINNER.len()]),
            Style::default().fg(Color::DarkGray),
        )
    } else if app.session.can_submit() {
        (
            " Generate (g / Enter) ".to_string(),
            Style::default().fg(Color::Black).bg(Color::Green).bold(),
        )
    } else {
        (" Generate ".to_string(), Style::default().fg(Color::DarkGray))
    };
    let submit = Paragraph::new(Span::styled(label, style))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(submit, submit_area);
}

/// Hard-wraps on character count so the cursor arithmetic stays exact.
fn wrap_chars(text: &str, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![Line::default()];
    }
    chars
        .chunks(width)
        .map(|chunk| Line::from(chunk.iter().collect::<String>()))
        .collect()
}

fn render_output(app: &mut App, frame: &mut Frame, area: Rect) {
    app.output_area = Some(area);
    let focused = app.focus == FocusPane::Output;

    match app.session.phase() {
        Phase::Empty => {
            app.output_height = 0;
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color(focused)))
                .title(" Output ");
            let placeholder = Paragraph::new("Your component & code will appear here")
                .style(Style::default().fg(Color::DarkGray))
                .centered()
                .block(block);
            frame.render_widget(placeholder, area);
        }
        Phase::Loading => {
            app.output_height = 0;
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Output ");
            // Animated ellipsis: cycles through ".", "..", "...", "...."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            let loading = Paragraph::new(Span::styled(
                format!("{} Generating{}", SPINNER[app.animation_frame as usize % SPINNER.len()], dots),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ))
            .centered()
            .block(block);
            frame.render_widget(loading, area);
        }
        Phase::Ready => render_result(app, frame, area, focused),
    }
}

fn render_result(app: &mut App, frame: &mut Frame, area: Rect, focused: bool) {
    let view = app.session.view();
    let tabs = Line::from(
        [Tab::Code, Tab::Preview]
            .iter()
            .enumerate()
            .flat_map(|(i, tab)| {
                let style = if *tab == view.active_tab {
                    Style::default().fg(Color::Black).bg(Color::Cyan).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [Span::styled(format!(" {} {} ", i + 1, tab.title()), style), Span::raw(" ")]
            })
            .collect::<Vec<_>>(),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(tabs)
        .title_bottom(Line::from(" c copy  s export  f fullscreen  o browser ").right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.output_height = inner.height;

    match view.active_tab {
        Tab::Code => render_code(app, frame, inner),
        Tab::Preview => render_outline(app, frame, inner),
    }
}

fn render_code(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(code) = app.session.code() else {
        return;
    };
    let total = code.lines().count();
    let gutter = total.to_string().len();

    let lines: Vec<Line> = code
        .lines()
        .enumerate()
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} ", i + 1, width = gutter),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(line.to_string()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).scroll((app.code_scroll, 0));
    frame.render_widget(paragraph, area);

    if total > area.height as usize {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(area.height as usize))
            .position(app.code_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn outline_text(code: &str) -> Text<'static> {
    let outline = preview::outline(code);
    let mut lines: Vec<Line> = Vec::new();
    if let Some(title) = outline.title {
        lines.push(Line::from(Span::styled(
            title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    }
    if outline.lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no visible text; press 'o' to open in a browser)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend(outline.lines.into_iter().map(Line::from));
    Text::from(lines)
}

fn render_outline(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(code) = app.session.code() else {
        return;
    };
    let paragraph = Paragraph::new(outline_text(code))
        .wrap(Wrap { trim: true })
        .scroll((app.code_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_fullscreen_preview(app: &mut App, frame: &mut Frame, area: Rect) {
    app.output_area = Some(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " Preview (rev {}) - Esc to close ",
            app.session.preview_revision()
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.output_height = inner.height;

    let Some(code) = app.session.code() else {
        return;
    };
    let paragraph = Paragraph::new(outline_text(code))
        .wrap(Wrap { trim: true })
        .scroll((app.code_scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn render_notifications(app: &App, frame: &mut Frame, area: Rect) {
    let width = 48.min(area.width.saturating_sub(2));
    let mut y = area.y + 1;

    for notification in app.session.notifications.iter() {
        let (color, icon) = match notification.level {
            NotificationLevel::Success => (Color::Green, "\u{2713}"),
            NotificationLevel::Error => (Color::Red, "\u{2717}"),
            NotificationLevel::Info => (Color::Blue, "i"),
        };
        let inner_width = width.saturating_sub(4).max(1) as usize;
        let text_len = notification.message.chars().count() + 2;
        let height = (text_len.div_ceil(inner_width) as u16 + 2).min(5);
        if y + height > area.y + area.height {
            break;
        }

        let toast_area = Rect::new(area.x + area.width - width - 1, y, width, height);
        frame.render_widget(Clear, toast_area);
        let toast = Paragraph::new(format!("{} {}", icon, notification.message))
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        frame.render_widget(toast, toast_area);
        y += height;
    }
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn picker_list<'a>(items: Vec<ListItem<'a>>, title: &'a str) -> List<'a> {
    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

fn render_framework_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let frameworks = Framework::all();
    let popup_area = popup_rect(area, 40, frameworks.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = frameworks
        .iter()
        .map(|framework| {
            let style = if *framework == app.session.framework {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", framework.display_name())).style(style)
        })
        .collect();

    frame.render_stateful_widget(
        picker_list(items, " Select Framework "),
        popup_area,
        &mut app.framework_picker_state,
    );
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 40, app.available_models.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    frame.render_stateful_widget(
        picker_list(items, " Select Model (Enter to select, Esc to cancel) "),
        popup_area,
        &mut app.model_picker_state,
    );
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup_area = popup_rect(area, 45, providers.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.get_key_source(*provider);
            let is_current = *provider == app.current_provider;

            let status = match key_source {
                Some("env") => "(env var)",
                Some("config") => "(configured)",
                Some("local") => "(local)",
                _ => "(needs key)",
            };
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    frame.render_stateful_widget(
        picker_list(items, " Select Provider "),
        popup_area,
        &mut app.provider_picker_state,
    );
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let provider_name = app
        .api_key_target_provider
        .map(|p| p.display_name())
        .unwrap_or("Provider");

    let popup_area = popup_rect(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Enter API Key for {} ", provider_name));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    frame.render_widget(
        Paragraph::new(mask_key(&app.api_key_input)).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(format!("{} characters", app.api_key_input.chars().count()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}

/// Shows only the last four characters of a key.
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let masked_len = len - 4;
    let last_four: String = key.chars().skip(masked_len).collect();
    format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
}
