//! Session state for one generation workflow.
//!
//! [`Session`] is the only mutable state behind the UI: the prompt form, the
//! latest result, the view flags, and the in-flight request. It performs no
//! I/O of its own apart from the copy/export/preview actions, which take their
//! side-effecting collaborators as arguments, so the whole state machine can
//! be driven in tests without a terminal or a network.
//!
//! Phases are derived, never stored:
//!
//! ```text
//!   Empty --submit--> Loading --ok--> Ready --submit--> Loading
//!                        |                                 |
//!                        +--------err--> Empty <----err----+
//! ```
//!
//! Every dispatched request carries a [`RequestToken`]. A completion is only
//! applied if its token is the one currently in flight; anything else is a
//! stale response from an abandoned request and is dropped.

use std::path::{Path, PathBuf};

use crate::clipboard::ClipboardSink;
use crate::error::{ActionError, SubmitError};
use crate::export;
use crate::extract::extract_code;
use crate::framework::Framework;
use crate::notify::Notifications;
use crate::preview;
use crate::prompt::GenerationRequest;

pub type RequestToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Code,
    Preview,
}

impl Tab {
    pub fn other(self) -> Tab {
        match self {
            Tab::Code => Tab::Preview,
            Tab::Preview => Tab::Code,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Code => "Code",
            Tab::Preview => "Preview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub active_tab: Tab,
    /// True exactly while a generation request is outstanding.
    pub is_loading: bool,
    pub fullscreen_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Loading,
    Ready,
}

/// A model response and the code recovered from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    raw_text: String,
    extracted_code: String,
}

impl GenerationResult {
    pub fn from_raw(raw_text: String) -> Self {
        let extracted_code = extract_code(&raw_text);
        Self {
            raw_text,
            extracted_code,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn extracted_code(&self) -> &str {
        &self.extracted_code
    }
}

/// A request the caller must now send, tagged with its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGeneration {
    pub token: RequestToken,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: RequestToken,
    tab_before: Tab,
}

#[derive(Debug, Default)]
pub struct Session {
    pub prompt_input: String,
    pub framework: Framework,
    pub notifications: Notifications,
    result: Option<GenerationResult>,
    view: ViewState,
    last_token: RequestToken,
    in_flight: Option<InFlight>,
    preview_revision: u64,
}

impl Session {
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Loading
        } else if self.result.is_some() {
            Phase::Ready
        } else {
            Phase::Empty
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn code(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.extracted_code())
    }

    pub fn in_flight_token(&self) -> Option<RequestToken> {
        self.in_flight.map(|f| f.token)
    }

    /// Bumped by [`Session::refresh_preview`] so views can re-render.
    pub fn preview_revision(&self) -> u64 {
        self.preview_revision
    }

    /// Whether submit is enabled: something to send and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.in_flight.is_none() && !self.prompt_input.trim().is_empty()
    }

    /// Validates the form and moves to Loading. The caller dispatches the returned request.
    pub fn submit(&mut self) -> Result<PendingGeneration, SubmitError> {
        if self.in_flight.is_some() {
            tracing::debug!("submit ignored: request already in flight");
            return Err(SubmitError::RequestInFlight);
        }
        let request = GenerationRequest::new(&self.prompt_input, self.framework)?;

        self.last_token += 1;
        let token = self.last_token;
        self.in_flight = Some(InFlight {
            token,
            tab_before: self.view.active_tab,
        });
        self.view.is_loading = true;

        tracing::info!(token, framework = request.framework().as_str(), "generation dispatched");
        Ok(PendingGeneration { token, request })
    }

    /// Applies the outcome of request `token`.
    ///
    /// A failure clears the previous result, restores the pre-submit tab,
    /// closes fullscreen, and posts exactly one error notification.
    pub fn complete(&mut self, token: RequestToken, outcome: anyhow::Result<String>) -> Completion {
        let in_flight = match self.in_flight {
            Some(f) if f.token == token => f,
            _ => {
                tracing::info!(token, active = ?self.in_flight_token(), "dropping stale response");
                return Completion::Stale;
            }
        };
        self.in_flight = None;
        self.view.is_loading = false;

        match outcome {
            Ok(raw) => {
                let result = GenerationResult::from_raw(raw);
                tracing::info!(
                    token,
                    raw_len = result.raw_text().len(),
                    code_len = result.extracted_code().len(),
                    "generation completed"
                );
                self.result = Some(result);
                self.preview_revision += 1;
                Completion::Applied
            }
            Err(e) => {
                tracing::warn!(token, error = %e, "generation failed");
                self.result = None;
                self.view.active_tab = in_flight.tab_before;
                self.view.fullscreen_open = false;
                self.notifications
                    .error(format!("Failed to generate component: {}", e));
                Completion::Failed
            }
        }
    }

    /// Starts over: abandons any in-flight request and clears the form and result.
    pub fn reset(&mut self) -> Option<RequestToken> {
        let abandoned = self.in_flight.take().map(|f| f.token);
        if let Some(token) = abandoned {
            tracing::info!(token, "abandoning in-flight request");
        }
        self.prompt_input.clear();
        self.result = None;
        self.view = ViewState::default();
        abandoned
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.view.active_tab = tab;
        if tab == Tab::Code {
            self.view.fullscreen_open = false;
        }
    }

    pub fn toggle_tab(&mut self) {
        self.select_tab(self.view.active_tab.other());
    }

    /// Opens or closes the fullscreen preview. Needs a result to show.
    pub fn toggle_fullscreen(&mut self) -> bool {
        if self.view.fullscreen_open {
            self.view.fullscreen_open = false;
            return true;
        }
        if self.result.is_none() {
            return false;
        }
        self.view.active_tab = Tab::Preview;
        self.view.fullscreen_open = true;
        true
    }

    pub fn close_fullscreen(&mut self) {
        self.view.fullscreen_open = false;
    }

    /// Re-renders the preview from the same code.
    pub fn refresh_preview(&mut self) {
        if self.result.is_some() {
            self.preview_revision += 1;
        }
    }

    fn ready_code(&self) -> Result<&str, ActionError> {
        match self.phase() {
            Phase::Ready => Ok(self.code().unwrap_or_default()),
            Phase::Loading => Err(ActionError::Busy),
            Phase::Empty => Err(ActionError::NoResult),
        }
    }

    fn report<T>(&mut self, outcome: Result<T, ActionError>, success: impl FnOnce(&T) -> String) -> Result<T, ActionError> {
        match &outcome {
            Ok(value) => self.notifications.success(success(value)),
            Err(e) => self.notifications.error(e.to_string()),
        }
        outcome
    }

    /// Copies the extracted code. Success and failure each post one notification.
    pub fn copy_code(&mut self, clipboard: &mut dyn ClipboardSink) -> Result<(), ActionError> {
        let outcome = self
            .ready_code()
            .and_then(|code| clipboard.set_text(code).map_err(ActionError::Clipboard));
        self.report(outcome, |_| "Code copied successfully".to_string())
    }

    /// Saves the extracted code as `GenUI-Code.html` in `dir`.
    pub fn export_code(&mut self, dir: &Path) -> Result<PathBuf, ActionError> {
        let outcome = self
            .ready_code()
            .and_then(|code| export::export_code(dir, code).map_err(ActionError::Export));
        self.report(outcome, |path| format!("Saved {}", path.display()))
    }

    /// Writes the sandboxed preview into `dir` and hands it to `open`.
    pub fn open_preview(
        &mut self,
        dir: &Path,
        open: impl FnOnce(&Path) -> anyhow::Result<()>,
    ) -> Result<PathBuf, ActionError> {
        let outcome = self.ready_code().and_then(|code| {
            let path = preview::write_preview(dir, code).map_err(ActionError::Preview)?;
            open(&path).map_err(ActionError::Preview)?;
            Ok(path)
        });
        self.report(outcome, |_| "Preview opened in browser".to_string())
    }
}
