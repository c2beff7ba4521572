//! SwipeMail triage client
//!
//! Review queue, card gestures and toasts for working through Gmail drafts
//! one at a time against a SwipeMail gateway. Rendering is left to the
//! front end; the terminal binary in this crate is one such front end.

pub mod api;
pub mod app;
pub mod card;
pub mod gesture;
pub mod queue;
pub mod toast;

pub use api::TriageApi;
pub use app::{Screen, Snapshot, SwipeOutcome, TriageApp};
pub use card::CardView;
pub use gesture::{CardGesture, CardPose, DraftAction, GestureState, SwipeDirection};
pub use queue::ReviewQueue;
pub use toast::{Toast, ToastKind};
