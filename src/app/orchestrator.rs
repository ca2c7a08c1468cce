//! Application state and the reactions to gestures and backend replies.
//!
//! The orchestrator is UI-free: the window feeds it client notices and
//! finished lasso gestures, and it updates [`AppState`], the view registry
//! and the backend client in response. Everything runs on the UI thread, so a
//! selection is fully recolored before the next reply is looked at.

use std::sync::Arc;

use egui::Color32;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::client::{ClientError, ClientNotice, ConnectionState, MessageClient, SendOutcome};
use crate::color_scheme::{ColorParseError, LabelPalette};
use crate::config::ExplorerSettings;
use crate::data::dataset::Dataset;
use crate::data::lasso::SelectionEnded;
use crate::data::network::{Link, NetworkSpec};
use crate::data::selection::{derive_colors, Selection};
use crate::events::{
    ChannelMeta, DataMeta, EventController, EventKind, ExplorerEvent, SelectionMeta,
};
use crate::protocol::{Action, MeansReply, Reply, Request, RequestId};
use crate::views::{BarView, NetworkView, PointStyle, ScatterView, ViewRegistry};

pub const SCATTER_TITLE: &str = "t-SNE";
pub const NETWORK_TITLE: &str = "Network";
pub const BAR_TITLE: &str = "Feature means";

/// Everything the session knows. Views render from their own copies.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Option<Arc<Dataset>>,
    /// Palette colors per point.
    pub base_colors: Vec<Color32>,
    /// `None` until the first gesture finishes.
    pub selection: Option<Selection>,
    /// Colors currently pushed to the point views.
    pub colors: Vec<Color32>,
    /// Links sent with the layout request.
    pub links: Vec<Link>,
    pub status: String,
    pub connection: ConnectionState,
}

impl AppState {
    fn new(url: &str) -> Self {
        Self {
            dataset: None,
            base_colors: Vec::new(),
            selection: None,
            colors: Vec::new(),
            links: Vec::new(),
            status: format!("Connecting to {url}…"),
            connection: ConnectionState::Connecting,
        }
    }
}

/// The means request whose reply the bars are waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeansTicket {
    Sent(Action, RequestId),
    /// Waiting behind an older request of the same action.
    Queued(Action),
}

pub struct Orchestrator {
    state: AppState,
    views: ViewRegistry,
    client: MessageClient,
    settings: ExplorerSettings,
    palette: LabelPalette,
    unselected: Color32,
    style: PointStyle,
    events: Option<EventController>,
    rng: StdRng,
    awaited_means: Option<MeansTicket>,
}

impl Orchestrator {
    pub fn new(
        settings: ExplorerSettings,
        client: MessageClient,
        events: Option<EventController>,
    ) -> Result<Self, ColorParseError> {
        let palette = settings.palette()?;
        let unselected = settings.unselected()?;
        let style = PointStyle {
            min_vertex_distance: settings.lasso_min_distance,
            transition_secs: settings.transition_secs(),
            marker_stroke: settings.color_scheme.marker_stroke(),
        };
        Ok(Self {
            state: AppState::new(&settings.url),
            views: ViewRegistry::new(),
            client,
            settings,
            palette,
            unselected,
            style,
            events,
            rng: StdRng::from_os_rng(),
            awaited_means: None,
        })
    }

    /// Use a deterministic generator for sampled links.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    pub fn client(&self) -> &MessageClient {
        &self.client
    }

    pub fn settings(&self) -> &ExplorerSettings {
        &self.settings
    }

    /// Marker stroke follows the window theme, for new and registered views.
    pub fn set_marker_stroke(&mut self, stroke: Color32) {
        self.style.marker_stroke = stroke;
        if let Some(view) = self.views.get_mut::<ScatterView>() {
            view.set_marker_stroke(stroke);
        }
        if let Some(view) = self.views.get_mut::<NetworkView>() {
            view.set_marker_stroke(stroke);
        }
    }

    /// Process everything the client received since the last frame.
    pub fn poll(&mut self, now: f64) {
        for notice in self.client.poll() {
            self.on_notice(notice, now);
        }
    }

    pub fn on_notice(&mut self, notice: ClientNotice, now: f64) {
        match notice {
            ClientNotice::Opened => {
                self.state.connection = ConnectionState::Open;
                self.state.status = format!("Connected to {}. Loading dataset…", self.settings.url);
                self.emit(ExplorerEvent::new(EventKind::CONNECTED));
                self.request(Request::Data {
                    name: self.settings.dataset.clone(),
                });
            }
            ClientNotice::Sent { action, id } => {
                if self.awaited_means == Some(MeansTicket::Queued(action)) {
                    self.awaited_means = Some(MeansTicket::Sent(action, id));
                }
                self.emit(
                    ExplorerEvent::new(EventKind::REQUEST_SENT).with_channel(ChannelMeta {
                        action: Some(action),
                        request_id: Some(id),
                        detail: None,
                    }),
                );
            }
            ClientNotice::Reply { id, reply } => match reply {
                Reply::Data(dataset) => self.on_dataset(dataset, now),
                Reply::SelectionMeans(means) => {
                    self.on_means(Action::PassSelectionMeans, id, means, now)
                }
                Reply::OverallMeans(means) => self.on_means(Action::PassOverallMeans, id, means, now),
                Reply::NetworkLayout { positions } => self.on_layout(positions, now),
            },
            ClientNotice::DecodeFailed { action, error } => {
                self.on_decode_failure(action, error.to_string())
            }
            ClientNotice::Disconnected { reason } => {
                self.state.status = match &reason {
                    Some(r) => format!("Disconnected from backend: {r}"),
                    None => "Disconnected from backend.".to_string(),
                };
                self.state.connection = ConnectionState::Disconnected {
                    reason: reason.clone(),
                };
                self.emit(
                    ExplorerEvent::new(EventKind::DISCONNECTED).with_channel(ChannelMeta {
                        action: None,
                        request_id: None,
                        detail: reason,
                    }),
                );
            }
        }
    }

    fn on_dataset(&mut self, dataset: Dataset, now: f64) {
        if self.state.dataset.is_some() {
            log::warn!("ignoring second dataset reply");
            return;
        }
        let dataset = Arc::new(dataset);
        let n = dataset.len();
        log::info!(
            "dataset loaded: {n} points, {} features",
            dataset.feature_names.len()
        );

        self.state.base_colors = self.palette.base_colors(&dataset.labels());
        self.state.colors = self.state.base_colors.clone();
        self.state.selection = None;
        self.state.dataset = Some(dataset.clone());

        self.views.push(Box::new(ScatterView::new(
            SCATTER_TITLE,
            dataset.clone(),
            self.state.colors.clone(),
            &self.palette,
            self.style,
        )));
        if self.settings.aggregates {
            self.views.push(Box::new(BarView::new(
                BAR_TITLE,
                dataset.feature_names.clone(),
                self.style.transition_secs,
            )));
        }
        self.views.recolor(&self.state.colors, now);
        self.state.status = format!("Loaded {n} points. Select points in the scatterplot.");
        self.emit(ExplorerEvent::new(EventKind::DATASET_LOADED).with_data(DataMeta {
            count: n,
            values: dataset.feature_names.len(),
        }));

        if self.settings.aggregates {
            self.request_means(Request::OverallMeans);
        }
        if self.settings.network {
            let spec = NetworkSpec::sampled(&mut self.rng, n, self.settings.sample_link_count);
            self.state.links = spec.links.clone();
            self.request(Request::NetworkLayout {
                nodes: spec.nodes,
                links: spec.links,
            });
        }
    }

    /// A lasso gesture finished on the view titled `view`.
    pub fn on_selection_ended(&mut self, view: &str, ended: SelectionEnded, now: f64) {
        let Some(dataset) = &self.state.dataset else {
            return;
        };
        let total = dataset.len();
        let selection = if ended.selection.len() == total {
            ended.selection
        } else {
            log::warn!(
                "selection from `{view}` covers {} points, dataset has {total}",
                ended.selection.len()
            );
            Selection::none(total)
        };

        self.state.colors = derive_colors(&self.state.base_colors, &selection, self.unselected);
        self.views.recolor(&self.state.colors, now);

        let indices = selection.indices();
        let cleared = selection.is_empty();
        self.state.selection = Some(selection);

        let mut kinds = EventKind::SELECTION_ENDED;
        if cleared {
            kinds |= EventKind::SELECTION_CLEARED;
        }
        self.emit(ExplorerEvent::new(kinds).with_selection(SelectionMeta {
            view: view.to_string(),
            indices: indices.clone(),
            total,
        }));

        if self.settings.aggregates {
            if cleared {
                self.request_means(Request::OverallMeans);
            } else {
                self.request_means(Request::SelectionMeans { indices });
            }
        }
    }

    fn on_means(&mut self, action: Action, id: Option<RequestId>, means: MeansReply, now: f64) {
        // Only the reply to the latest means request describes the current colors.
        let awaited = id.map(|id| MeansTicket::Sent(action, id));
        if awaited.is_none() || awaited != self.awaited_means {
            log::debug!("dropping superseded {action} reply (id {id:?})");
            return;
        }
        let Some(expected) = self.views.get::<BarView>().map(|b| b.feature_names().len()) else {
            log::debug!("{action} reply without an aggregate view");
            return;
        };
        if means.means.len() != expected {
            self.on_decode_failure(
                Some(action),
                format!("expected {expected} means, got {}", means.means.len()),
            );
            return;
        }

        let overall = action == Action::PassOverallMeans;
        self.views.update_aggregates(&means.means, now);
        self.state.status = if overall {
            format!(
                "Showing overall mean of all {} points. Select points in the scatterplot.",
                means.count
            )
        } else {
            format!("Showing mean of {} selected point(s).", means.count)
        };
        self.emit(ExplorerEvent::new(EventKind::MEANS_UPDATED).with_data(DataMeta {
            count: means.count,
            values: means.means.len(),
        }));
    }

    fn on_layout(&mut self, positions: Vec<[f64; 2]>, _now: f64) {
        let Some(dataset) = self.state.dataset.clone() else {
            log::warn!("layout reply before the dataset");
            return;
        };
        if !self.settings.network || self.views.contains::<NetworkView>() {
            log::debug!("ignoring unrequested layout reply");
            return;
        }
        if positions.len() != dataset.len() {
            self.on_decode_failure(
                Some(Action::PassNetworkLayout),
                format!(
                    "expected {} positions, got {}",
                    dataset.len(),
                    positions.len()
                ),
            );
            return;
        }
        let count = positions.len();
        self.views.push(Box::new(NetworkView::new(
            NETWORK_TITLE,
            dataset,
            positions,
            self.state.links.clone(),
            self.state.colors.clone(),
            self.style,
        )));
        self.emit(ExplorerEvent::new(EventKind::LAYOUT_UPDATED).with_data(DataMeta {
            count,
            values: count,
        }));
    }

    fn on_decode_failure(&mut self, action: Option<Action>, detail: String) {
        let what = action.map_or("backend", Action::name);
        log::warn!("could not decode {what} reply: {detail}");
        self.state.status = format!("Could not decode {what} reply: {detail}");
        self.emit(
            ExplorerEvent::new(EventKind::DECODE_FAILED).with_channel(ChannelMeta {
                action,
                request_id: None,
                detail: Some(detail),
            }),
        );
    }

    fn request_means(&mut self, request: Request) {
        let action = request.action();
        self.awaited_means = match self.request(request) {
            Some(SendOutcome::Sent(id)) => Some(MeansTicket::Sent(action, id)),
            Some(SendOutcome::Deferred { .. }) => Some(MeansTicket::Queued(action)),
            None => None,
        };
    }

    fn request(&mut self, request: Request) -> Option<SendOutcome> {
        let action = request.action();
        match self.client.send(request) {
            Ok(outcome) => {
                if let SendOutcome::Sent(id) = outcome {
                    self.emit(
                        ExplorerEvent::new(EventKind::REQUEST_SENT).with_channel(ChannelMeta {
                            action: Some(action),
                            request_id: Some(id),
                            detail: None,
                        }),
                    );
                }
                Some(outcome)
            }
            Err(ClientError::Disconnected) => {
                log::warn!("{action} not sent: backend disconnected");
                None
            }
            Err(e) => {
                log::warn!("{action} not sent: {e}");
                None
            }
        }
    }

    fn emit(&self, event: ExplorerEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChannelEvent;
    use std::sync::mpsc::Sender;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn orchestrator(settings: ExplorerSettings) -> (Orchestrator, UnboundedReceiver<String>, Sender<ChannelEvent>) {
        let (out_tx, out_rx) = unbounded_channel();
        let (in_tx, in_rx) = std::sync::mpsc::channel();
        let client = MessageClient::from_channels(out_tx, in_rx);
        let orch = Orchestrator::new(settings, client, None).unwrap().with_rng_seed(3);
        (orch, out_rx, in_tx)
    }

    #[test]
    fn open_requests_the_configured_dataset() {
        let settings = ExplorerSettings {
            dataset: Some("wine_result.csv".into()),
            ..ExplorerSettings::default()
        };
        let (mut orch, mut out_rx, in_tx) = orchestrator(settings);
        in_tx.send(ChannelEvent::Opened).unwrap();
        orch.poll(0.0);
        let sent: serde_json::Value = serde_json::from_str(&out_rx.try_recv().unwrap()).unwrap();
        assert_eq!(sent["action"], 0);
        assert_eq!(sent["content"]["name"], "wine_result.csv");
        assert!(orch.state().connection.is_open());
    }

    #[test]
    fn gesture_before_dataset_is_ignored() {
        let (mut orch, _out_rx, _in_tx) = orchestrator(ExplorerSettings::default());
        orch.on_selection_ended(
            SCATTER_TITLE,
            SelectionEnded {
                selection: Selection::all(3),
                vertex_count: 4,
            },
            0.0,
        );
        assert!(orch.state().selection.is_none());
    }

    #[test]
    fn bad_palette_fails_construction() {
        let mut settings = ExplorerSettings::default();
        settings.unselected_color = "grey".into();
        let (out_tx, _out_rx) = unbounded_channel();
        let (_in_tx, in_rx) = std::sync::mpsc::channel();
        let client = MessageClient::from_channels(out_tx, in_rx);
        assert!(Orchestrator::new(settings, client, None).is_err());
    }
}
