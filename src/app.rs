use std::path::PathBuf;

use genui::ai::{self, GenerationClient};
use genui::clipboard::SystemClipboard;
use genui::preview;
use genui::{Completion, Config, Framework, Provider, RequestToken, Session};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Framework,
    Prompt,
    Output,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Form, result, and view flags
    pub session: Session,
    pub prompt_cursor: usize, // cursor position in session.prompt_input

    // Output state
    pub code_scroll: u16,
    pub output_height: u16,

    // Animation state
    pub animation_frame: u8,

    // Framework picker state
    pub show_framework_picker: bool,
    pub framework_picker_state: ListState,

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,
    pub models_loading: bool,

    // Provider state
    pub current_provider: Provider,
    pub client: Option<GenerationClient>,
    pub selected_model: String,
    pub show_provider_picker: bool,
    pub provider_picker_state: ListState,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub api_key_target_provider: Option<Provider>,

    // Panel areas for mouse hit-testing (updated during render)
    pub prompt_area: Option<Rect>,
    pub output_area: Option<Rect>,

    pub config: Config,
    /// Whether picker choices are written back to the config file.
    pub persist_config: bool,
    pub export_dir: PathBuf,
    pub preview_dir: PathBuf,
    clipboard: SystemClipboard,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        provider_override: Option<Provider>,
        model_override: Option<String>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let current_provider = provider_override.unwrap_or_else(|| config.provider());
        let client = match GenerationClient::from_config(current_provider, &config) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(provider = current_provider.as_str(), error = %e, "no client at startup");
                None
            }
        };

        // A stored default model only applies to the provider it was chosen for
        let selected_model = model_override
            .or_else(|| {
                config
                    .default_model
                    .clone()
                    .filter(|_| provider_override.map_or(true, |p| p == config.provider()))
            })
            .unwrap_or_else(|| ai::default_model(current_provider));

        let mut session = Session::new(config.framework());
        if client.is_none() {
            session.notifications.info(format!(
                "{} needs an API key. Press 'P' to set up.",
                current_provider.display_name()
            ));
        }

        let export_dir = config.export_dir();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Prompt,

            session,
            prompt_cursor: 0,

            code_scroll: 0,
            output_height: 0,

            animation_frame: 0,

            show_framework_picker: false,
            framework_picker_state: ListState::default(),

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),
            models_loading: false,

            current_provider,
            client,
            selected_model,
            show_provider_picker: false,
            provider_picker_state: ListState::default(),

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            api_key_target_provider: None,

            prompt_area: None,
            output_area: None,

            config,
            persist_config: true,
            export_dir,
            preview_dir: preview::default_preview_dir(),
            clipboard: SystemClipboard::new(),
            events,
        }
    }

    /// Validates the form and spawns the generation request.
    ///
    /// The response comes back as [`AppEvent::Generated`] and is applied by
    /// [`App::on_generated`]; the UI keeps running meanwhile.
    pub fn submit(&mut self) {
        if !self.session.can_submit() {
            return;
        }
        let Some(client) = self.client.clone() else {
            self.session.notifications.error(format!(
                "{} API key not configured. Press 'P' to set up.",
                self.current_provider.display_name()
            ));
            return;
        };
        let Ok(pending) = self.session.submit() else {
            return;
        };

        let token = pending.token;
        let prompt = pending.request.build_prompt();
        let model = self.selected_model.clone();
        let timeout = self.config.request_timeout();
        let tx = self.events.clone();

        tokio::spawn(async move {
            let outcome = client.generate(&model, &prompt, timeout).await;
            let _ = tx.send(AppEvent::Generated { token, outcome });
        });

        self.input_mode = InputMode::Normal;
        self.animation_frame = 0;
    }

    pub fn on_generated(&mut self, token: RequestToken, outcome: anyhow::Result<String>) {
        match self.session.complete(token, outcome) {
            Completion::Applied => {
                self.code_scroll = 0;
                self.focus = FocusPane::Output;
                self.input_mode = InputMode::Normal;
            }
            Completion::Failed => {
                self.code_scroll = 0;
                self.focus = FocusPane::Prompt;
            }
            Completion::Stale => {}
        }
    }

    /// Tick animation frame and toast timers (called by Tick event)
    pub fn tick(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
        self.session.notifications.tick();
    }

    /// New component: clears the form and result and abandons any pending response.
    pub fn reset(&mut self) {
        self.session.reset();
        self.prompt_cursor = 0;
        self.code_scroll = 0;
        self.focus = FocusPane::Prompt;
        self.input_mode = InputMode::Editing;
    }

    // Result actions
    pub fn copy_code(&mut self) {
        let _ = self.session.copy_code(&mut self.clipboard);
    }

    pub fn export_code(&mut self) {
        let _ = self.session.export_code(&self.export_dir);
    }

    pub fn open_browser_preview(&mut self) {
        let _ = self
            .session
            .open_preview(&self.preview_dir, preview::open_in_browser);
    }

    // Output scrolling
    pub fn code_line_count(&self) -> u16 {
        self.session
            .code()
            .map(|code| code.lines().count().min(u16::MAX as usize) as u16)
            .unwrap_or(0)
    }

    fn max_scroll(&self) -> u16 {
        self.code_line_count().saturating_sub(self.output_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.code_scroll = self.code_scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.code_scroll = self.code_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.output_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.output_height / 2).max(1));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.code_scroll = self.max_scroll();
    }

    // Framework picker methods
    pub fn open_framework_picker(&mut self) {
        let current_idx = Framework::all()
            .iter()
            .position(|f| *f == self.session.framework)
            .unwrap_or(0);
        self.framework_picker_state.select(Some(current_idx));
        self.show_framework_picker = true;
    }

    pub fn framework_picker_nav_down(&mut self) {
        let len = Framework::all().len();
        let i = self.framework_picker_state.selected().unwrap_or(0);
        self.framework_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn framework_picker_nav_up(&mut self) {
        let i = self.framework_picker_state.selected().unwrap_or(0);
        self.framework_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_framework(&mut self) {
        if let Some(framework) = self
            .framework_picker_state
            .selected()
            .and_then(|i| Framework::all().get(i).copied())
        {
            self.session.framework = framework;
            self.config.default_framework = Some(framework.as_str().to_string());
            self.persist(|c| c.default_framework = Some(framework.as_str().to_string()));
        }
        self.show_framework_picker = false;
    }

    // Model picker methods

    /// Fetches the model list in the background; the picker opens when it arrives.
    pub fn open_model_picker(&mut self) {
        if self.models_loading {
            return;
        }
        match self.client.clone() {
            Some(client) => {
                self.models_loading = true;
                self.spawn_model_listing(client, true);
            }
            None => self.show_models(ai::static_models(self.current_provider)),
        }
    }

    fn spawn_model_listing(&self, client: GenerationClient, open_picker: bool) {
        let tx = self.events.clone();
        tokio::spawn(async move {
            let provider = client.provider();
            let outcome = client.list_models(ai::LIST_MODELS_TIMEOUT).await;
            let _ = tx.send(AppEvent::ModelsListed {
                provider,
                outcome,
                open_picker,
            });
        });
    }

    pub fn on_models_listed(
        &mut self,
        provider: Provider,
        outcome: anyhow::Result<Vec<String>>,
        open_picker: bool,
    ) {
        if open_picker {
            self.models_loading = false;
        }
        // The user switched away while the list was loading
        if provider != self.current_provider {
            return;
        }
        match outcome {
            Ok(models) if open_picker => self.show_models(models),
            Ok(models) => {
                // After a provider switch, fall back to a model the provider actually has
                if !models.is_empty() && !models.contains(&self.selected_model) {
                    self.selected_model = models[0].clone();
                    let model = self.selected_model.clone();
                    self.persist(|c| c.default_model = Some(model));
                }
            }
            Err(e) if open_picker => self
                .session
                .notifications
                .error(format!("Could not list models: {}", e)),
            Err(e) => {
                tracing::warn!(provider = provider.as_str(), error = %e, "model listing failed")
            }
        }
    }

    fn show_models(&mut self, models: Vec<String>) {
        self.available_models = models;
        if self.available_models.is_empty() {
            self.session
                .notifications
                .info(format!("No models found for {}", self.current_provider.display_name()));
            return;
        }
        // Select current model if in list, otherwise first
        let current_idx = self
            .available_models
            .iter()
            .position(|m| m == &self.selected_model)
            .unwrap_or(0);
        self.model_picker_state.select(Some(current_idx));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.selected_model = model.clone();
                self.show_model_picker = false;
                let model = self.selected_model.clone();
                self.persist(|c| c.default_model = Some(model));
            }
        }
    }

    // Provider picker methods
    pub fn open_provider_picker(&mut self) {
        let current_idx = Provider::all()
            .iter()
            .position(|p| *p == self.current_provider)
            .unwrap_or(0);
        self.provider_picker_state.select(Some(current_idx));
        self.show_provider_picker = true;
    }

    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Switches to the highlighted provider, asking for a key first if it has none.
    pub fn choose_provider(&mut self) {
        let Some(provider) = self
            .provider_picker_state
            .selected()
            .and_then(|i| Provider::all().get(i).copied())
        else {
            return;
        };
        self.show_provider_picker = false;

        if self.config.key_source(provider).is_none() {
            self.api_key_target_provider = Some(provider);
            self.api_key_input.clear();
            self.api_key_input_cursor = 0;
            self.show_api_key_input = true;
            return;
        }
        self.switch_provider(provider);
    }

    pub fn switch_provider(&mut self, provider: Provider) {
        let client = match GenerationClient::from_config(provider, &self.config) {
            Ok(client) => client,
            Err(e) => {
                self.session.notifications.error(e.to_string());
                return;
            }
        };

        self.selected_model = ai::default_model(provider);
        self.current_provider = provider;
        self.client = Some(client.clone());
        self.spawn_model_listing(client, false);
        self.config.provider = Some(provider.as_str().to_string());

        let model = self.selected_model.clone();
        self.persist(|c| {
            c.provider = Some(provider.as_str().to_string());
            c.default_model = Some(model);
        });
        tracing::info!(provider = provider.as_str(), model = %self.selected_model, "provider switched");
        self.session
            .notifications
            .info(format!("Using {} ({})", provider.display_name(), self.selected_model));
    }

    /// Stores the typed key for the pending provider and switches to it.
    pub fn save_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        let target = self.api_key_target_provider.take();
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;

        let Some(provider) = target else { return };
        if key.is_empty() {
            return;
        }

        self.config.set_api_key(provider, &key);
        self.persist(|c| c.set_api_key(provider, &key));
        self.switch_provider(provider);
    }

    fn persist(&mut self, update: impl FnOnce(&mut Config)) {
        if !self.persist_config {
            return;
        }
        if let Err(e) = Config::update(update) {
            self.session
                .notifications
                .error(format!("Could not save settings: {}", e));
        }
    }

    pub fn cancel_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.api_key_target_provider = None;
    }

    /// Returns the source of the API key for a provider: "env", "config", "local", or None
    pub fn get_key_source(&self, provider: Provider) -> Option<&'static str> {
        self.config.key_source(provider)
    }

    pub fn any_popup_open(&self) -> bool {
        self.show_api_key_input
            || self.show_provider_picker
            || self.show_model_picker
            || self.show_framework_picker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genui::Phase;
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Duration};

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        // Nothing listens on the discard port, so requests fail fast
        config.ollama_url = Some("http://127.0.0.1:9".to_string());
        config.request_timeout_secs = Some(5);
        let mut app = App::new(config, Some(Provider::Ollama), Some("test-model".to_string()), tx);
        app.persist_config = false;
        (app, rx)
    }

    #[tokio::test]
    async fn test_blank_prompt_dispatches_nothing() {
        let (mut app, mut rx) = test_app();
        app.session.prompt_input = "   ".to_string();
        app.submit();
        assert_eq!(app.session.phase(), Phase::Empty);
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_one_request_per_generation() {
        let (mut app, mut rx) = test_app();
        app.session.prompt_input = "a pricing table".to_string();
        app.submit();
        app.submit();
        app.submit();
        assert!(app.session.is_loading());

        let first = timeout(Duration::from_secs(10), rx.recv()).await.unwrap().unwrap();
        let AppEvent::Generated { token, outcome } = first else {
            panic!("expected a generation event");
        };
        assert!(outcome.is_err());
        app.on_generated(token, outcome);
        assert_eq!(app.session.phase(), Phase::Empty);
        assert_eq!(app.focus, FocusPane::Prompt);

        assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_success_moves_focus_to_output() {
        let (mut app, _rx) = test_app();
        app.session.prompt_input = "hero".to_string();
        let pending = app.session.submit().unwrap();
        app.on_generated(pending.token, Ok("```html\n<h1>Hi</h1>\n```".to_string()));
        assert_eq!(app.focus, FocusPane::Output);
        assert_eq!(app.session.code(), Some("<h1>Hi</h1>"));
    }

    #[tokio::test]
    async fn test_reset_drops_late_response() {
        let (mut app, _rx) = test_app();
        app.session.prompt_input = "hero".to_string();
        let pending = app.session.submit().unwrap();
        app.reset();
        app.on_generated(pending.token, Ok("<p>late</p>".to_string()));
        assert_eq!(app.session.phase(), Phase::Empty);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn test_scroll_is_clamped() {
        let (mut app, _rx) = test_app();
        app.session.prompt_input = "list".to_string();
        let pending = app.session.submit().unwrap();
        let code = (0..50).map(|i| format!("<li>{}</li>", i)).collect::<Vec<_>>().join("\n");
        app.on_generated(pending.token, Ok(code));
        app.output_height = 20;

        app.scroll_down(100);
        assert_eq!(app.code_scroll, 30);
        app.scroll_half_page_up();
        assert_eq!(app.code_scroll, 20);
        app.scroll_up(100);
        assert_eq!(app.code_scroll, 0);
    }

    #[tokio::test]
    async fn test_framework_picker_selects() {
        let (mut app, _rx) = test_app();
        app.open_framework_picker();
        app.framework_picker_nav_down();
        app.framework_picker_nav_down();
        app.select_framework();
        assert_eq!(app.session.framework, Framework::HtmlBootstrap);
        assert!(!app.show_framework_picker);
    }

    async fn next_models_event(
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
        within: Duration,
    ) -> (Provider, anyhow::Result<Vec<String>>, bool) {
        loop {
            let event = timeout(within, rx.recv()).await.unwrap().unwrap();
            if let AppEvent::ModelsListed {
                provider,
                outcome,
                open_picker,
            } = event
            {
                return (provider, outcome, open_picker);
            }
        }
    }

    #[tokio::test]
    async fn test_model_picker_opens_when_list_arrives() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        config.set_api_key(Provider::Claude, "sk-test");
        let mut app = App::new(config, Some(Provider::Claude), None, tx);
        app.persist_config = false;

        app.open_model_picker();
        assert!(app.models_loading);
        assert!(!app.show_model_picker);

        let (provider, outcome, open_picker) = next_models_event(&mut rx, Duration::from_secs(2)).await;
        app.on_models_listed(provider, outcome, open_picker);
        assert!(!app.models_loading);
        assert!(app.show_model_picker);
        assert_eq!(app.available_models, ai::static_models(Provider::Claude));
    }

    #[tokio::test]
    async fn test_silent_ollama_does_not_block_events() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        config.ollama_url = Some(format!("http://{}", addr));
        let mut app = App::new(config, Some(Provider::Ollama), None, tx);
        app.persist_config = false;

        app.open_model_picker();
        // The app keeps handling input while the listing is pending
        app.open_framework_picker();
        assert!(app.show_framework_picker);
        app.open_model_picker();

        let (provider, outcome, open_picker) =
            next_models_event(&mut rx, ai::LIST_MODELS_TIMEOUT + Duration::from_secs(3)).await;
        assert!(outcome.is_err());
        app.on_models_listed(provider, outcome, open_picker);
        assert!(!app.models_loading);
        assert!(!app.show_model_picker);
        assert_eq!(app.session.notifications.count(genui::notify::NotificationLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_model_list_for_previous_provider_is_ignored() {
        let (mut app, _rx) = test_app();
        app.current_provider = Provider::Claude;
        app.on_models_listed(Provider::Ollama, Ok(vec!["llama3".to_string()]), true);
        assert!(!app.show_model_picker);
        assert!(app.available_models.is_empty());
    }

    #[tokio::test]
    async fn test_background_listing_corrects_unknown_model() {
        let (mut app, _rx) = test_app();
        app.on_models_listed(
            Provider::Ollama,
            Ok(vec!["llama3.2:latest".to_string(), "qwen2.5-coder:7b".to_string()]),
            false,
        );
        assert_eq!(app.selected_model, "llama3.2:latest");
        assert!(!app.show_model_picker);
    }
}
