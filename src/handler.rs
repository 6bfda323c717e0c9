use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use genui::Tab;
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Generated { token, outcome } => app.on_generated(token, outcome),
        AppEvent::ModelsListed {
            provider,
            outcome,
            open_picker,
        } => app.on_models_listed(provider, outcome, open_picker),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.any_popup_open() {
        handle_popup(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_popup(app: &mut App, key: KeyEvent) {
    // Handle API key input if it's open
    if app.show_api_key_input {
        match key.code {
            KeyCode::Esc => app.cancel_api_key_input(),
            KeyCode::Enter => app.save_api_key(),
            KeyCode::Backspace => {
                if app.api_key_input_cursor > 0 {
                    app.api_key_input_cursor -= 1;
                    let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                    app.api_key_input.remove(byte_pos);
                }
            }
            KeyCode::Char(c) => {
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.insert(byte_pos, c);
                app.api_key_input_cursor += 1;
            }
            KeyCode::Left => {
                app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let char_count = app.api_key_input.chars().count();
                app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(char_count);
            }
            _ => {}
        }
        return;
    }

    if app.show_provider_picker {
        match key.code {
            KeyCode::Esc => app.show_provider_picker = false,
            KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
            KeyCode::Enter => app.choose_provider(),
            _ => {}
        }
        return;
    }

    if app.show_model_picker {
        match key.code {
            KeyCode::Esc => app.show_model_picker = false,
            KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
            KeyCode::Enter => app.select_model(),
            _ => {}
        }
        return;
    }

    if app.show_framework_picker {
        match key.code {
            KeyCode::Esc => app.show_framework_picker = false,
            KeyCode::Char('j') | KeyCode::Down => app.framework_picker_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.framework_picker_nav_up(),
            KeyCode::Enter => app.select_framework(),
            _ => {}
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Fullscreen preview swallows everything but its own keys
    if app.session.view().fullscreen_open {
        match key.code {
            KeyCode::Esc | KeyCode::Char('f') => app.session.close_fullscreen(),
            KeyCode::Char('o') => app.open_browser_preview(),
            KeyCode::Char('r') => app.session.refresh_preview(),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles: Framework -> Prompt -> Output -> Framework
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Framework => FocusPane::Prompt,
                FocusPane::Prompt => FocusPane::Output,
                FocusPane::Output => FocusPane::Framework,
            };
        }
        KeyCode::BackTab => {
            app.focus = match app.focus {
                FocusPane::Framework => FocusPane::Output,
                FocusPane::Prompt => FocusPane::Framework,
                FocusPane::Output => FocusPane::Prompt,
            };
        }

        // Form
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Prompt;
            app.input_mode = InputMode::Editing;
            app.prompt_cursor = app.session.prompt_input.chars().count();
        }
        KeyCode::Enter => match app.focus {
            FocusPane::Framework => app.open_framework_picker(),
            FocusPane::Prompt => {
                app.input_mode = InputMode::Editing;
                app.prompt_cursor = app.session.prompt_input.chars().count();
            }
            FocusPane::Output => app.session.toggle_tab(),
        },
        KeyCode::Char('F') => app.open_framework_picker(),
        KeyCode::Char('g') => app.submit(),
        KeyCode::Char('n') => app.reset(),

        // Provider and model
        KeyCode::Char('P') => app.open_provider_picker(),
        KeyCode::Char('M') => app.open_model_picker(),

        // Result viewer
        KeyCode::Char('1') => app.session.select_tab(Tab::Code),
        KeyCode::Char('2') => app.session.select_tab(Tab::Preview),
        KeyCode::Char('t') => app.session.toggle_tab(),
        KeyCode::Char('f') => {
            app.session.toggle_fullscreen();
        }
        KeyCode::Char('r') => app.session.refresh_preview(),
        KeyCode::Char('c') => app.copy_code(),
        KeyCode::Char('s') => app.export_code(),
        KeyCode::Char('o') => app.open_browser_preview(),

        // Scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Home => app.code_scroll = 0,
        KeyCode::End | KeyCode::Char('G') => app.scroll_to_bottom(),

        KeyCode::Esc => app.session.notifications.dismiss_all(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Output;
        }
        KeyCode::Enter => {
            // Submit is disabled while the prompt is blank or a request is pending
            if app.session.can_submit() {
                app.submit();
            }
        }
        KeyCode::Backspace => {
            if app.prompt_cursor > 0 {
                app.prompt_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.session.prompt_input, app.prompt_cursor);
                app.session.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.session.prompt_input.chars().count();
            if app.prompt_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.session.prompt_input, app.prompt_cursor);
                app.session.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.prompt_cursor = app.prompt_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.prompt_input.chars().count();
            app.prompt_cursor = (app.prompt_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.prompt_cursor = 0;
        }
        KeyCode::End => {
            app.prompt_cursor = app.session.prompt_input.chars().count();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.prompt_input.clear();
            app.prompt_cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.session.prompt_input, app.prompt_cursor);
            app.session.prompt_input.insert(byte_pos, c);
            app.prompt_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_output = app
        .output_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    let in_prompt = app
        .prompt_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_output => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_output => app.scroll_up(3),
        MouseEventKind::Down(_) if in_prompt && !app.any_popup_open() => {
            app.focus = FocusPane::Prompt;
            app.input_mode = InputMode::Editing;
            app.prompt_cursor = app.session.prompt_input.chars().count();
        }
        MouseEventKind::Down(_) if in_output && !app.any_popup_open() => {
            app.focus = FocusPane::Output;
            app.input_mode = InputMode::Normal;
        }
        _ => {}
    }
}
