use feed::HttpFeed;
use iced::{
    event, mouse, time,
    widget::{mouse_area, row, Canvas, Container},
    window, Element, Length, Point, Size, Subscription, Task, Theme,
};
use map::{MapCanvas, Tooltip};
use settings::ViewerConfig;
use std::{
    collections::VecDeque,
    path::PathBuf,
    time::{Duration, Instant},
};
use viewport::Viewport;
use vesselcore::geo::{MeasurementSystem, RangeTimeframe};
use vesselcore::interaction::{Debounced, PointerEvent, ScreenPoint, UiEffect};
use vesselcore::poll::{fetch_cycle, CycleFetch, CycleOutcome, PollLoop};
use vesselcore::render::{hit_test, RenderScene, SortOrder, TableColumn, ViewState, HIT_TOLERANCE_PX};
use vesselcore::state::{Anchor, Notice};
use vesselcore::wire::PathResponse;
use vesselcore::{Feed, LabelMode, MapSession, Mmsi, SyncResult};

mod feed;
mod map;
mod panel;
mod settings;
mod viewport;

const PANEL_WIDTH: f32 = 400.0;
const WINDOW_SIZE: (f32, f32) = (1280.0, 800.0);
const FRAME_TICK: Duration = Duration::from_millis(50);
/// Pointer travel below which a press and release count as a click.
const CLICK_SLOP: f32 = 4.0;
const MAX_NOTICES: usize = 4;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(VesselMap::boot, VesselMap::update, VesselMap::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .window_size(WINDOW_SIZE)
        .run()
}

fn application_title(state: &VesselMap) -> String {
    format!("Vessel Map - {}", state.feed.base())
}

fn application_subscription(state: &VesselMap) -> Subscription<Message> {
    Subscription::batch([
        time::every(state.session.settings().refresh_interval()).map(|_| Message::Poll),
        time::every(FRAME_TICK).map(|_| Message::Frame),
        event::listen_with(window_event),
    ])
}

fn window_event(event: iced::Event, _status: event::Status, _id: window::Id) -> Option<Message> {
    match event {
        iced::Event::Window(window::Event::Resized(size)) => Some(Message::Resized(size)),
        _ => None,
    }
}

fn application_theme(_: &VesselMap) -> Theme {
    Theme::Dark
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingToggle {
    TrackOnHover,
    TrackOnSelect,
    Fading,
    DistanceCircles,
    CircleOutline,
    ShortRange,
}

#[derive(Debug, Clone)]
enum Message {
    Poll,
    Frame,
    Fetched(CycleFetch),
    TracksFetched(SyncResult<PathResponse>),
    Resized(Size),
    PointerMoved(Point),
    PointerLeft,
    Pressed,
    Released,
    RightPressed,
    Scrolled(mouse::ScrollDelta),
    Select(Option<Mmsi>),
    Focus(Mmsi),
    ToggleTrack(Mmsi),
    ShowAllTracks,
    DeleteAllTracks,
    StartMeasurement,
    MeasureFrom(Mmsi),
    CancelMeasurement,
    ToggleMeasurement(usize),
    RemoveMeasurement(usize),
    ToggleRange,
    Timeframe(RangeTimeframe),
    Units(MeasurementSystem),
    Labels(LabelMode),
    Toggle(SettingToggle),
    SortBy(TableColumn),
    Search(String),
    DismissNotice(usize),
    Saved(Result<(), String>),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Point,
    last: Point,
    dragged: bool,
}

struct VesselMap {
    feed: HttpFeed,
    session: MapSession,
    poll: PollLoop,
    scene: RenderScene,
    viewport: Viewport,
    visible: bool,
    config: ViewerConfig,
    config_path: PathBuf,
    save: Debounced<()>,
    tooltip: Option<Tooltip>,
    card: Option<Mmsi>,
    notices: VecDeque<Notice>,
    search: String,
    pointer: Option<Point>,
    press: Option<Press>,
    crosshair: bool,
    /// Set once the map has been centered on the station, or when the
    /// saved configuration already carries a center.
    centered: bool,
}

impl VesselMap {
    fn boot() -> (Self, Task<Message>) {
        let config_path = settings::config_path();
        let centered = config_path.exists();
        let config = settings::load(&config_path).unwrap_or_else(|err| {
            log::warn!("using default configuration: {}", err);
            ViewerConfig::default()
        });
        let map_size = Size::new(WINDOW_SIZE.0 - PANEL_WIDTH, WINDOW_SIZE.1);

        (
            VesselMap {
                feed: HttpFeed::new(config.feed_url.clone()),
                session: MapSession::new(config.view.clone()),
                poll: PollLoop::new(),
                scene: RenderScene::default(),
                viewport: Viewport::new(config.center, config.zoom, map_size),
                visible: true,
                config,
                config_path,
                save: Debounced::new(settings::SAVE_DELAY),
                tooltip: None,
                card: None,
                notices: VecDeque::new(),
                search: String::new(),
                pointer: None,
                press: None,
                crosshair: false,
                centered,
            },
            Task::done(Message::Poll),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        let now = Instant::now();
        let task = match message {
            Message::Poll => state.start_cycle(now),
            Message::Fetched(fetch) => {
                state.finish_cycle(fetch, now);
                Task::none()
            }
            Message::Frame => {
                state.session.tick(now);
                if state.save.poll(now).is_some() {
                    Task::perform(
                        settings::save(state.config_path.clone(), state.config.clone()),
                        Message::Saved,
                    )
                } else {
                    Task::none()
                }
            }
            Message::TracksFetched(result) => {
                if let Err(err) = state.session.apply_paths(result) {
                    log::warn!("track fetch failed: {}", err);
                }
                Task::none()
            }
            Message::Resized(size) => {
                state.visible = size.width > 0.0 && size.height > 0.0;
                state.viewport.size =
                    Size::new((size.width - PANEL_WIDTH).max(1.0), size.height.max(1.0));
                Task::none()
            }
            Message::PointerMoved(point) => {
                state.pointer_moved(point, now);
                Task::none()
            }
            Message::PointerLeft => {
                state.pointer = None;
                state.press = None;
                state.session.stop_hover();
                Task::none()
            }
            Message::Pressed => {
                state.press = state.pointer.map(|origin| Press {
                    origin,
                    last: origin,
                    dragged: false,
                });
                Task::none()
            }
            Message::Released => {
                if let Some(press) = state.press.take() {
                    if press.dragged {
                        state.remember_view(now);
                    } else {
                        let event = state.pointer_event(press.origin, false);
                        state.session.click(now, event);
                    }
                }
                Task::none()
            }
            Message::RightPressed => {
                if let Some(point) = state.pointer {
                    let event = state.pointer_event(point, true);
                    state.session.click(now, event);
                }
                Task::none()
            }
            Message::Scrolled(delta) => {
                let steps = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => f64::from(y) * 0.5,
                    mouse::ScrollDelta::Pixels { y, .. } => f64::from(y) / 120.0,
                };
                let anchor = state.pointer.unwrap_or(Point::new(
                    state.viewport.size.width / 2.0,
                    state.viewport.size.height / 2.0,
                ));
                state.viewport.zoom_at(steps, anchor);
                state.rerender();
                state.remember_view(now);
                Task::none()
            }
            Message::Select(mmsi) => {
                state.session.select(mmsi);
                Task::none()
            }
            Message::Focus(mmsi) => {
                state.session.select(Some(mmsi));
                if let Some(position) = state.session.registry().position(mmsi) {
                    state.viewport.center = position;
                    state.remember_view(now);
                }
                Task::none()
            }
            Message::ToggleTrack(mmsi) => {
                state.session.toggle_track(mmsi);
                Task::none()
            }
            Message::ShowAllTracks => {
                state.session.show_all_tracks();
                Task::none()
            }
            Message::DeleteAllTracks => {
                state.session.delete_all_tracks();
                Task::none()
            }
            Message::StartMeasurement => {
                state.session.start_measurement();
                Task::none()
            }
            Message::MeasureFrom(mmsi) => {
                state.session.start_measurement_at(Anchor::Vessel(mmsi));
                Task::none()
            }
            Message::CancelMeasurement => {
                state.session.cancel_measurement();
                Task::none()
            }
            Message::ToggleMeasurement(index) => {
                state.session.toggle_measurement_visibility(index);
                Task::none()
            }
            Message::RemoveMeasurement(index) => {
                state.session.remove_measurement(index);
                Task::none()
            }
            Message::ToggleRange => {
                state.session.toggle_range();
                state.remember_view(now);
                // a fresh range needs a cycle to arrive
                state.start_cycle(now)
            }
            Message::Timeframe(timeframe) => {
                state.session.set_range_timeframe(timeframe);
                state.remember_view(now);
                state.start_cycle(now)
            }
            Message::Units(system) => {
                state.session.update_settings(|view| view.metric = system);
                state.remember_view(now);
                Task::none()
            }
            Message::Labels(mode) => {
                state.session.update_settings(|view| view.show_labels = mode);
                state.remember_view(now);
                Task::none()
            }
            Message::Toggle(toggle) => {
                state.session.update_settings(|view| {
                    let flag = match toggle {
                        SettingToggle::TrackOnHover => &mut view.show_track_on_hover,
                        SettingToggle::TrackOnSelect => &mut view.show_track_on_select,
                        SettingToggle::Fading => &mut view.fading,
                        SettingToggle::DistanceCircles => &mut view.distance_circles,
                        SettingToggle::CircleOutline => &mut view.show_circle_outline,
                        SettingToggle::ShortRange => &mut view.show_short_range,
                    };
                    *flag = !*flag;
                });
                state.remember_view(now);
                Task::none()
            }
            Message::SortBy(column) => {
                state.session.update_settings(|view| {
                    if view.table_column == column {
                        view.table_order = view.table_order.flipped();
                    } else {
                        view.table_column = column;
                        view.table_order = SortOrder::Ascending;
                    }
                });
                state.remember_view(now);
                Task::none()
            }
            Message::Search(query) => {
                state.search = query;
                Task::none()
            }
            Message::DismissNotice(index) => {
                state.notices.remove(index);
                Task::none()
            }
            Message::Saved(Ok(())) => {
                log::debug!("configuration saved to {}", state.config_path.display());
                Task::none()
            }
            Message::Saved(Err(err)) => {
                state.push_notice(Notice::error(format!("Could not save settings: {}", err)));
                Task::none()
            }
        };
        Task::batch([task, state.flush_effects()])
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let canvas = Canvas::new(MapCanvas {
            scene: &state.scene,
            viewport: state.viewport,
            tooltip: state.tooltip.as_ref(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let interaction = if state.crosshair {
            mouse::Interaction::Crosshair
        } else if state.press.map_or(false, |press| press.dragged) {
            mouse::Interaction::Grabbing
        } else {
            mouse::Interaction::Idle
        };

        let map_area = mouse_area(canvas)
            .on_move(Message::PointerMoved)
            .on_exit(Message::PointerLeft)
            .on_press(Message::Pressed)
            .on_release(Message::Released)
            .on_right_press(Message::RightPressed)
            .on_scroll(Message::Scrolled)
            .interaction(interaction);

        let layout = row![
            Container::new(map_area)
                .width(Length::Fill)
                .height(Length::Fill),
            panel::side_panel(state),
        ];

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_state(&self) -> ViewState {
        ViewState {
            zoom: self.viewport.zoom,
        }
    }

    fn rerender(&mut self) {
        let view = self.view_state();
        self.scene = self.session.render(&view);
    }

    fn start_cycle(&mut self, now: Instant) -> Task<Message> {
        match self.poll.begin(&self.session, self.visible, now) {
            Ok((token, plan)) => {
                let feed = self.feed.clone();
                Task::perform(
                    async move { fetch_cycle(&feed, plan, token).await },
                    Message::Fetched,
                )
            }
            Err(reason) => {
                log::debug!("poll skipped: {:?}", reason);
                Task::none()
            }
        }
    }

    fn finish_cycle(&mut self, fetch: CycleFetch, now: Instant) {
        let view = self.view_state();
        match self.poll.complete(&mut self.session, fetch, &view, now) {
            CycleOutcome::Completed { scene, .. } => {
                self.scene = scene;
                if !self.centered {
                    if let Some(station) = self.session.station_position() {
                        self.viewport.center = station;
                        self.centered = true;
                    }
                }
            }
            CycleOutcome::Failed(err) => log::warn!("feed unavailable: {}", err),
            CycleOutcome::Skipped(_) => {}
        }
    }

    fn fetch_tracks(&mut self) -> Task<Message> {
        match self.session.track_request() {
            Some(request) => {
                let feed = self.feed.clone();
                Task::perform(
                    async move { feed.fetch_paths(&request).await },
                    Message::TracksFetched,
                )
            }
            None => Task::none(),
        }
    }

    fn pointer_event(&self, point: Point, modifier: bool) -> PointerEvent {
        let at = ScreenPoint::new(point.x, point.y);
        let hit = hit_test(
            &self.scene,
            at,
            |position| self.viewport.screen(position),
            HIT_TOLERANCE_PX,
        );
        PointerEvent {
            at,
            position: Some(self.viewport.unproject(point)),
            hit,
            modifier,
        }
    }

    fn pointer_moved(&mut self, point: Point, now: Instant) {
        self.pointer = Some(point);
        if let Some(press) = &mut self.press {
            if !press.dragged && press.origin.distance(point) > CLICK_SLOP {
                press.dragged = true;
                self.session.stop_hover();
            }
            if press.dragged {
                self.viewport.pan(point.x - press.last.x, point.y - press.last.y);
                press.last = point;
                return;
            }
        }
        let event = self.pointer_event(point, false);
        self.session.pointer_move(now, event);
    }

    /// Copies the live view into the configuration and schedules a save.
    fn remember_view(&mut self, now: Instant) {
        self.config.view = self.session.settings().clone();
        self.config.center = self.viewport.center;
        self.config.zoom = self.viewport.zoom;
        self.save.schedule(now, ());
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push_front(notice);
        self.notices.truncate(MAX_NOTICES);
    }

    fn flush_effects(&mut self) -> Task<Message> {
        let mut tasks = Vec::new();
        let mut dirty = false;
        for effect in self.session.drain_effects() {
            match effect {
                UiEffect::ShowTooltip { text, at } => {
                    self.tooltip = Some(Tooltip {
                        text,
                        at: Point::new(at.x, at.y),
                    })
                }
                UiEffect::HideTooltip | UiEffect::CloseOverlays => self.tooltip = None,
                UiEffect::Invalidate(_) => dirty = true,
                UiEffect::OpenCard(mmsi) => self.card = Some(mmsi),
                UiEffect::CloseCard => self.card = None,
                UiEffect::FetchTracks => tasks.push(self.fetch_tracks()),
                UiEffect::Notify(notice) => self.push_notice(notice),
                UiEffect::Crosshair(on) => self.crosshair = on,
            }
        }
        if dirty {
            self.rerender();
        }
        Task::batch(tasks)
    }
}
