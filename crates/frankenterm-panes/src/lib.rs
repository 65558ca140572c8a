#![forbid(unsafe_code)]

//! Event coordination for multi-pane terminal hosts.
//!
//! A host window mounts one [`Pane`] per backend session. All panes share a
//! single topic-keyed [`EventChannel`], an [`ActivePane`] slot naming the
//! pane that last received keyboard focus, and a host-driven [`Clock`].
//!
//! # Module layout
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`channel`] | multicast topics, per-handler cancellation |
//! | [`router`] | session filtering of backend events |
//! | [`active_pane`] | recipient choice for pane-agnostic actions |
//! | [`paste`] | cross-path paste de-duplication |
//! | [`scroll`] | wheel normalization, accumulation, gesture reset |
//! | [`resize_guard`] | resize epochs and click-mode grace windows |
//! | [`pane`] / [`deck`] | per-pane wiring and the host entry point |
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use frankenterm_panes::{HostClock, PaneConfig, PaneDeck, RecordingSurface, SessionId};
//!
//! let clock = HostClock::new();
//! let mut deck = PaneDeck::new(PaneConfig::default(), Rc::new(clock.clone()));
//! let surface = RecordingSurface::new();
//! deck.mount(SessionId::new("s1"), Box::new(surface.clone()))
//!     .handle_focus(true);
//!
//! deck.dispatch_global_paste("echo hi");
//! assert_eq!(surface.pastes(), vec!["echo hi".to_string()]);
//! ```

pub mod active_pane;
pub mod channel;
pub mod clock;
pub mod config;
pub mod deck;
pub mod event_log;
pub mod events;
pub mod input;
pub mod logging;
pub mod pane;
pub mod paste;
pub mod picker;
pub mod resize_guard;
pub mod router;
pub mod scroll;
pub mod surface;
pub mod timer;

pub use active_pane::ActivePane;
pub use channel::{EventChannel, HandlerId, Subscription};
pub use clock::{Clock, HostClock, SystemClock};
pub use config::{ConfigError, PaneConfig};
pub use deck::PaneDeck;
pub use event_log::{LogOutcome, PaneEventLog, PaneLogEntry};
pub use events::{GlobalPaste, InitialViewport, Payload, ResizeEpoch, SessionId, topic};
pub use input::{DeltaMode, KeyInput, Modifiers, Platform, WheelInput, is_paste_chord};
pub use pane::{KeyDisposition, Pane, PaneContext};
pub use paste::PasteGuard;
pub use picker::{BackendError, FolderPicker, PickOutcome, PickTicket};
pub use resize_guard::{ClickMode, EpochUpdate, ResizeGraceGuard};
pub use router::{IgnoredReason, RouteDecision, route, session_filter};
pub use scroll::{ScrollAccumulator, WheelScroller};
pub use surface::{RecordingSurface, SurfaceOp, TerminalSurface};
pub use timer::SingleShotTimer;
