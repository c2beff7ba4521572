//! Triage app controller
//!
//! Owns the review queue, the top card's gesture and the toast, and turns
//! commits into gateway calls. One action may be in flight at a time; the
//! [`ActionGate`] enforces that for gestures and buttons alike.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use swipemail_protocol::{ApiError, FlagRequest};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::api::TriageApi;
use crate::card::CardView;
use crate::gesture::{CardGesture, CardPose, DraftAction, SwipeDirection};
use crate::queue::ReviewQueue;
use crate::toast::{Toast, ToastKind, ToastSlot};

/// Pause between a successful action and showing the next card.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(300);

pub const SENT_TOAST: &str = "✉️ Email sent!";
pub const FLAGGED_TOAST: &str = "🚩 Flagged for review";
pub const ACTION_FAILED_TOAST: &str = "Action failed. Please try again.";
pub const FETCH_FAILED_TOAST: &str = "Failed to fetch drafts";
pub const LOGIN_FAILED_TOAST: &str = "Failed to start login";

/// Query marker the gateway appends when sign-in succeeds.
pub const AUTH_SUCCESS_MARKER: &str = "auth=success";

/// Single-slot gate for backend actions.
#[derive(Debug, Default)]
pub struct ActionGate {
    busy: AtomicBool,
}

impl ActionGate {
    pub fn try_acquire(&self) -> Option<ActionPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActionPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct ActionPermit<'a> {
    gate: &'a ActionGate,
}

impl Drop for ActionPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    SignIn,
    Card(CardView),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeOutcome {
    Completed(DraftAction),
    Failed(DraftAction),
    /// Another action is still in flight
    Busy,
    /// No card on screen
    NoDraft,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub screen: Screen,
    pub remaining: usize,
    pub pose: CardPose,
    pub toast: Option<Toast>,
    pub busy: bool,
}

#[derive(Debug)]
struct ViewState {
    authenticated: bool,
    loading: bool,
    queue: ReviewQueue,
    gesture: CardGesture,
    toast: ToastSlot,
}

pub struct TriageApp<A> {
    api: A,
    state: Mutex<ViewState>,
    gate: ActionGate,
    advance_delay: Duration,
}

impl<A: TriageApi> TriageApp<A> {
    pub fn new(api: A) -> Self {
        Self::with_advance_delay(api, ADVANCE_DELAY)
    }

    pub fn with_advance_delay(api: A, advance_delay: Duration) -> Self {
        Self {
            api,
            state: Mutex::new(ViewState {
                authenticated: false,
                loading: true,
                queue: ReviewQueue::new(),
                gesture: CardGesture::new(),
                toast: ToastSlot::default(),
            }),
            gate: ActionGate::default(),
            advance_delay,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.authenticated
    }

    /// Ask the gateway whether this client is signed in, loading drafts if so.
    pub async fn check_auth(&self) -> bool {
        let authenticated = match self.api.auth_status().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                warn!("Auth check failed: {}", e);
                false
            }
        };

        {
            let mut state = self.state.lock().await;
            state.authenticated = authenticated;
            state.loading = false;
        }

        if authenticated {
            self.refresh().await;
        }
        authenticated
    }

    /// Consent URL to open in a browser.
    pub async fn login(&self) -> Result<String, ApiError> {
        match self.api.auth_url().await {
            Ok(url) => Ok(url),
            Err(e) => {
                error!("Login failed: {}", e);
                self.toast(LOGIN_FAILED_TOAST, ToastKind::Error).await;
                Err(e)
            }
        }
    }

    /// Handle a redirect back from the gateway. Returns true when `query`
    /// carries the success marker, in which case drafts are loaded.
    pub async fn handle_auth_marker(&self, query: &str) -> bool {
        let query = query.trim_start_matches('?');
        if !query.split('&').any(|pair| pair == AUTH_SUCCESS_MARKER) {
            return false;
        }

        info!("Sign-in confirmed");
        self.state.lock().await.authenticated = true;
        self.refresh().await;
        true
    }

    /// Reload the review queue from the gateway.
    pub async fn refresh(&self) {
        self.state.lock().await.loading = true;
        let result = self.api.list_drafts().await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(listing) => {
                debug!("Loaded {} drafts", listing.drafts.len());
                state.queue.replace(listing.drafts);
                state.gesture.reset();
                if let Some(message) = listing.message {
                    state.toast.show(message, ToastKind::Info);
                }
            }
            Err(e) => {
                error!("Failed to fetch drafts: {}", e);
                if matches!(e, ApiError::Unauthenticated) {
                    state.authenticated = false;
                }
                state.toast.show(FETCH_FAILED_TOAST, ToastKind::Error);
            }
        }
    }

    pub async fn logout(&self) {
        match self.api.logout().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                state.authenticated = false;
                state.queue.clear();
                state.gesture.reset();
                info!("Logged out");
            }
            Err(e) => error!("Logout failed: {}", e),
        }
    }

    /// Button press: commit the top card in `direction`.
    pub async fn swipe(&self, direction: SwipeDirection) -> SwipeOutcome {
        let Some(permit) = self.gate.try_acquire() else {
            debug!("Ignoring {:?} swipe while an action is in flight", direction);
            return SwipeOutcome::Busy;
        };

        {
            let mut state = self.state.lock().await;
            if state.queue.current().is_none() {
                return SwipeOutcome::NoDraft;
            }
            if !state.gesture.press(direction, false) {
                return SwipeOutcome::Busy;
            }
        }

        self.commit(direction, permit).await
    }

    /// Start dragging the top card. Refused while an action is in flight.
    pub async fn begin_drag(&self) -> bool {
        let disabled = self.gate.is_busy();
        let mut state = self.state.lock().await;
        if state.queue.current().is_none() {
            return false;
        }
        state.gesture.begin_drag(disabled)
    }

    pub async fn drag_to(&self, offset: f64) {
        self.state.lock().await.gesture.drag_to(offset);
    }

    /// Let go of the card. Returns the action outcome when the release
    /// committed, or `None` when the card springs back.
    pub async fn release_drag(&self) -> Option<SwipeOutcome> {
        let direction = self.state.lock().await.gesture.release()?;

        let Some(permit) = self.gate.try_acquire() else {
            self.state.lock().await.gesture.reset();
            return Some(SwipeOutcome::Busy);
        };
        Some(self.commit(direction, permit).await)
    }

    /// The spring-back animation finished.
    pub async fn settle(&self) {
        self.state.lock().await.gesture.settle();
    }

    /// Run the backend call for a committed card. The permit is held until
    /// the queue has advanced.
    async fn commit(&self, direction: SwipeDirection, _permit: ActionPermit<'_>) -> SwipeOutcome {
        let action = direction.action();
        let (draft, generation) = {
            let mut state = self.state.lock().await;
            match state.queue.current() {
                Some(draft) => (draft.clone(), state.queue.generation()),
                None => {
                    state.gesture.reset();
                    return SwipeOutcome::NoDraft;
                }
            }
        };

        let result = match action {
            DraftAction::Send => self.api.send_draft(&draft.id).await,
            DraftAction::Flag => {
                let request = FlagRequest {
                    message_id: draft.message_id.clone(),
                    review_label_id: None,
                };
                self.api.flag_draft(&draft.id, &request).await
            }
        };

        let result = match result {
            Ok(resp) if resp.success => Ok(()),
            Ok(resp) => Err(format!("gateway reported failure: {}", resp.message)),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                let (message, kind) = match action {
                    DraftAction::Send => (SENT_TOAST, ToastKind::Success),
                    DraftAction::Flag => (FLAGGED_TOAST, ToastKind::Warning),
                };
                self.toast(message, kind).await;

                if !self.advance_delay.is_zero() {
                    tokio::time::sleep(self.advance_delay).await;
                }

                let mut state = self.state.lock().await;
                state.queue.advance(generation);
                state.gesture.reset();
                info!("{:?} completed for draft {}", action, draft.id);
                SwipeOutcome::Completed(action)
            }
            Err(e) => {
                error!("{:?} failed for draft {}: {}", action, draft.id, e);
                let mut state = self.state.lock().await;
                state.toast.show(ACTION_FAILED_TOAST, ToastKind::Error);
                state.gesture.reset();
                SwipeOutcome::Failed(action)
            }
        }
    }

    async fn toast(&self, message: &str, kind: ToastKind) {
        self.state.lock().await.toast.show(message, kind);
    }

    pub async fn screen(&self) -> Screen {
        let state = self.state.lock().await;
        screen_for(&state)
    }

    pub async fn snapshot(&self) -> Snapshot {
        let mut state = self.state.lock().await;
        let toast = state.toast.visible().cloned();
        Snapshot {
            screen: screen_for(&state),
            remaining: state.queue.remaining(),
            pose: state.gesture.pose(),
            toast,
            busy: self.gate.is_busy(),
        }
    }
}

fn screen_for(state: &ViewState) -> Screen {
    if !state.authenticated {
        return if state.loading {
            Screen::Loading
        } else {
            Screen::SignIn
        };
    }
    if state.loading {
        return Screen::Loading;
    }
    match state.queue.current() {
        Some(draft) => Screen::Card(CardView::from(draft)),
        None => Screen::Empty,
    }
}
