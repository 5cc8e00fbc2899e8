use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::config::{Config, WidgetConfig};
use crate::history::load_history;
use crate::message::{ChatMessage, SendState};
use crate::prompts;
use crate::session::SessionManager;
use crate::storage::SessionStore;
use crate::transcript::Transcript;
use crate::transport::{ChatTransport, SendOutcome, TransportError};

/// Controller behind the floating chat widget.
///
/// Owns the view state (open flag, transcript, input line, loading flag) and
/// allows at most one send in flight.
pub struct ChatWidget {
    copy: WidgetConfig,
    session: SessionManager,
    transport: ChatTransport,
    transcript: Transcript,
    input: String,
    is_open: bool,
    state: SendState,
    initialized: bool,
    pending: Option<oneshot::Receiver<SendOutcome>>,
}

impl ChatWidget {
    /// Build a closed widget. The tab's session id is resolved right away.
    pub fn new(config: &Config, store: Box<dyn SessionStore>) -> Result<Self, TransportError> {
        let transport = ChatTransport::new(config)?;
        Ok(Self::with_transport(config.widget.clone(), transport, store))
    }

    pub fn with_transport(
        copy: WidgetConfig,
        transport: ChatTransport,
        store: Box<dyn SessionStore>,
    ) -> Self {
        let mut session = SessionManager::new(store);
        session.get_or_create_session_id();

        Self {
            transcript: Transcript::new(copy.greeting.clone()),
            copy,
            session,
            transport,
            input: String::new(),
            is_open: false,
            state: SendState::Idle,
            initialized: false,
            pending: None,
        }
    }

    /// Restore earlier turns for this session. Runs once; later calls do nothing.
    ///
    /// Returns how many messages were restored.
    pub async fn initialize(&mut self) -> usize {
        if self.initialized {
            return 0;
        }
        self.initialized = true;

        let session_id = self.session.get_or_create_session_id();
        let restored = load_history(&self.transport, &session_id).await;
        let count = restored.len();
        if count > 0 {
            tracing::debug!(count, "restored chat history");
        }
        self.transcript.restore(restored);
        count
    }

    /// Start sending `text`.
    ///
    /// Returns false without touching the transcript when the trimmed text
    /// is empty or another send is still outstanding. The request runs as a
    /// task on the current tokio runtime; pick up the answer with
    /// [`ChatWidget::poll_reply`] or [`ChatWidget::wait_reply`].
    pub async fn submit(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.state == SendState::Sending {
            return false;
        }

        self.transcript.append(ChatMessage::user(text));
        self.state = SendState::Sending;

        let (tx, rx) = oneshot::channel();
        let transport = self.transport.clone();
        let session_id = self.session.get_or_create_session_id();
        let text = text.to_string();

        tokio::spawn(async move {
            let outcome = transport.send(&text, Some(&session_id)).await;
            let _ = tx.send(outcome);
        });

        self.pending = Some(rx);
        true
    }

    /// Send whatever is in the input line, clearing it when accepted
    pub async fn submit_input(&mut self) -> bool {
        let text = self.input.clone();
        let accepted = self.submit(&text).await;
        if accepted {
            self.input.clear();
        }
        accepted
    }

    /// Send one of the suggested questions
    pub async fn submit_suggestion(&mut self, index: usize) -> bool {
        let question = self.suggested_questions().get(index).cloned();
        match question {
            Some(question) => self.submit(&question).await,
            None => false,
        }
    }

    /// Apply a finished reply without waiting (called from the main loop)
    pub fn poll_reply(&mut self) -> Option<ChatMessage> {
        let rx = self.pending.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => Some(self.finish_send(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                tracing::warn!("reply task ended without an answer");
                Some(self.finish_send(SendOutcome::connectivity_failure()))
            }
        }
    }

    /// Wait for the outstanding reply and apply it. Cancel safe.
    pub async fn wait_reply(&mut self) -> Option<ChatMessage> {
        let rx = self.pending.as_mut()?;
        let outcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("reply task ended without an answer");
                SendOutcome::connectivity_failure()
            }
        };
        Some(self.finish_send(outcome))
    }

    fn finish_send(&mut self, outcome: SendOutcome) -> ChatMessage {
        self.pending = None;
        if let Some(id) = outcome.session_id.as_deref() {
            self.session.adopt(id);
        }
        self.transcript.append(outcome.message.clone());
        self.state = SendState::Idle;
        outcome.message
    }

    /// Questions offered while only the greeting is showing
    pub fn suggested_questions(&self) -> &[String] {
        if self.transcript.only_greeting() && !self.is_loading() {
            &self.copy.suggested_questions
        } else {
            &[]
        }
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn placeholder(&self) -> String {
        prompts::input_placeholder(&self.copy.owner_name)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn send_state(&self) -> SendState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SendState::Sending
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn widget() -> ChatWidget {
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        ChatWidget::new(&config, Box::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn starts_closed_idle_with_greeting() {
        let widget = widget();
        assert!(!widget.is_open());
        assert!(!widget.is_loading());
        assert!(widget.transcript().only_greeting());
        assert!(widget.session_id().is_some());
        assert_eq!(widget.suggested_questions().len(), 3);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut widget = widget();
        assert!(!widget.submit("").await);
        assert!(!widget.submit("   \n\t").await);
        widget.set_input("  ");
        assert!(!widget.submit_input().await);
        assert_eq!(widget.input(), "  ");
        assert_eq!(widget.transcript().len(), 1);
        assert_eq!(widget.send_state(), SendState::Idle);
    }

    #[test]
    fn open_close_toggle() {
        let mut widget = widget();
        widget.open();
        assert!(widget.is_open());
        widget.toggle();
        assert!(!widget.is_open());
        widget.toggle();
        widget.close();
        assert!(!widget.is_open());
    }

    #[tokio::test]
    async fn out_of_range_suggestion_is_ignored() {
        let mut widget = widget();
        assert!(!widget.submit_suggestion(42).await);
        assert!(widget.transcript().only_greeting());
    }

    #[tokio::test]
    async fn nothing_pending_means_no_reply() {
        let mut widget = widget();
        assert!(widget.poll_reply().is_none());
        assert!(widget.wait_reply().await.is_none());
    }

    #[tokio::test]
    async fn accepted_submit_clears_input_and_hides_suggestions() {
        let mut widget = widget();
        widget.set_input("  hello  ");
        assert!(widget.submit_input().await);
        assert_eq!(widget.input(), "");
        assert!(widget.is_loading());
        assert!(widget.suggested_questions().is_empty());
        assert_eq!(widget.transcript().last().unwrap().content, "hello");

        let reply = widget.wait_reply().await.unwrap();
        assert!(!reply.is_user());
        assert!(!widget.is_loading());
    }

    #[test]
    fn widget_built_outside_runtime_sends_once_driven() {
        let mut widget = widget();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let reply = runtime.block_on(async {
            assert!(widget.submit("hello").await);
            widget.wait_reply().await
        });

        assert!(!reply.unwrap().is_user());
        assert_eq!(widget.transcript().len(), 3);
        assert!(!widget.is_loading());
    }
}
