//! Event bus for linkplot.
//!
//! Callers can subscribe to selection, data and connection events via
//! [`EventController`]. Each event carries a set of [`EventKind`] flags so a
//! single occurrence can match several categories (an empty lasso is both a
//! `SELECTION_ENDED` and a `SELECTION_CLEARED` event).
//!
//! The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::protocol::{Action, RequestId};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Selection ───────────────────────────────────────────────────────
    /// A lasso gesture finished (every gesture produces exactly one).
    pub const SELECTION_ENDED: Self = Self(1 << 0);
    /// The finished gesture selected nothing.
    pub const SELECTION_CLEARED: Self = Self(1 << 1);

    // ── Data ────────────────────────────────────────────────────────────
    /// The dataset arrived and the point views were created.
    pub const DATASET_LOADED: Self = Self(1 << 2);
    /// The aggregate view received new means.
    pub const MEANS_UPDATED: Self = Self(1 << 3);
    /// The network view received layout positions.
    pub const LAYOUT_UPDATED: Self = Self(1 << 4);

    // ── Channel ─────────────────────────────────────────────────────────
    /// The backend channel opened.
    pub const CONNECTED: Self = Self(1 << 5);
    /// The backend channel closed or failed; terminal for the session.
    pub const DISCONNECTED: Self = Self(1 << 6);
    /// A request was written to the channel.
    pub const REQUEST_SENT: Self = Self(1 << 7);
    /// A reply could not be decoded; views were left unchanged.
    pub const DECODE_FAILED: Self = Self(1 << 8);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Combine two event kinds (bitwise OR).
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::SELECTION_ENDED, "SELECTION_ENDED"),
            (EventKind::SELECTION_CLEARED, "SELECTION_CLEARED"),
            (EventKind::DATASET_LOADED, "DATASET_LOADED"),
            (EventKind::MEANS_UPDATED, "MEANS_UPDATED"),
            (EventKind::LAYOUT_UPDATED, "LAYOUT_UPDATED"),
            (EventKind::CONNECTED, "CONNECTED"),
            (EventKind::DISCONNECTED, "DISCONNECTED"),
            (EventKind::REQUEST_SENT, "REQUEST_SENT"),
            (EventKind::DECODE_FAILED, "DECODE_FAILED"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for selection events.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionMeta {
    /// Title of the view the lasso was drawn on.
    pub view: String,
    /// Selected point indices (empty for a cleared selection).
    pub indices: Vec<usize>,
    /// Dataset size the selection is aligned to.
    pub total: usize,
}

/// Metadata for dataset / means / layout updates.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMeta {
    /// Number of points (dataset, layout) or points summarized (means).
    pub count: usize,
    /// Number of values delivered (features for means, positions for layouts).
    pub values: usize,
}

/// Metadata for channel events.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeta {
    pub action: Option<Action>,
    pub request_id: Option<RequestId>,
    /// Close reason or decode error text.
    pub detail: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ExplorerEvent
// ─────────────────────────────────────────────────────────────────────────────

/// An event emitted by the explorer.
#[derive(Debug, Clone)]
pub struct ExplorerEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created; set on emit.
    pub timestamp: f64,
    pub selection: Option<SelectionMeta>,
    pub data: Option<DataMeta>,
    pub channel: Option<ChannelMeta>,
}

impl ExplorerEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            selection: None,
            data: None,
            channel: None,
        }
    }

    pub fn with_selection(mut self, meta: SelectionMeta) -> Self {
        self.selection = Some(meta);
        self
    }

    pub fn with_data(mut self, meta: DataMeta) -> Self {
        self.data = Some(meta);
        self
    }

    pub fn with_channel(mut self, meta: ChannelMeta) -> Self {
        self.channel = Some(meta);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Selects which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &ExplorerEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<ExplorerEvent>,
}

/// Collects and distributes explorer events to subscribers.
///
/// Attach it to [`ExplorerConfig`](crate::config::ExplorerConfig) before
/// launching the UI, then call [`subscribe`](Self::subscribe) to receive events
/// on an `mpsc` channel.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<ExplorerEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.push(Subscriber { filter, sender: tx });
        }
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<ExplorerEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Deliver `event` to every matching subscriber and prune subscribers whose
    /// receiver was dropped.
    pub fn emit(&self, mut event: ExplorerEvent) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        log::trace!("event {}", event.kinds);
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }

    /// Number of live subscribers (as of the last emit).
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0)
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}
