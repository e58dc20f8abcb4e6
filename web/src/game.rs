use crate::settings::{Settings, SettingsView};
use crate::utils::*;
use bitflags::bitflags;
use chrono::prelude::*;
use clap::Args;
use game::ToNdIndex;
use gloo::timers::callback::Interval;
use ndarray::Array2;
use parejitas_core as game;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use web_sys::HtmlAudioElement;
use yew::prelude::*;

/// Tick cadence of the host clock feeding the engine countdown.
const TICK_MS: u32 = 100;

/// How many ticks the cosmetic flip pulse lasts on a card.
const PULSE_TICKS: u8 = 3;

fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap()
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum ViewCellState {
    Hidden,
    FaceUp(game::CardValue),
    Matched(game::CardValue),
}

impl From<game::CellView> for ViewCellState {
    fn from(view: game::CellView) -> Self {
        match view.value {
            Some(value) if view.matched => Self::Matched(value),
            Some(value) => Self::FaceUp(value),
            None => Self::Hidden,
        }
    }
}

/// One dealt game plus the host-side garnish the engine does not track:
/// wall-clock timestamps and the per-card pulse decay driving the flip
/// animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct GameSession {
    pub engine: game::PairEngine,
    pulse: Array2<u8>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl GameSession {
    fn new(engine: game::PairEngine) -> Self {
        let size = engine.size();
        Self {
            engine,
            pulse: Array2::default((size, size).to_nd_index()),
            started_at: None,
            ended_at: None,
        }
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or(now) - started_at)
                .num_seconds()
                .max(0) as u32
        } else {
            0
        }
    }

    fn flip(&mut self, coords: game::Coord2, now: DateTime<Utc>) -> game::FlipOutcome {
        let outcome = self.engine.flip(coords);

        if let Some(event) = outcome.flip_event() {
            self.pulse[event.coords.to_nd_index()] = PULSE_TICKS;

            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
            if self.engine.is_finished() && self.ended_at.is_none() {
                self.ended_at = Some(now);
            }
        }

        outcome
    }

    /// Advance the engine countdown and the pulse decay by one host tick.
    /// Returns whether anything visible changed.
    fn advance(&mut self, elapsed: Duration) -> bool {
        let cards_hidden = self.engine.tick(elapsed).has_update();

        let mut pulse_decayed = false;
        for decay in self.pulse.iter_mut() {
            if *decay > 0 {
                *decay -= 1;
                pulse_decayed = true;
            }
        }

        cards_hidden || pulse_decayed
    }

    fn pulse_at(&self, coords: game::Coord2) -> u8 {
        self.pulse[coords.to_nd_index()]
    }

    fn view_cells(&self) -> Array2<ViewCellState> {
        self.engine.snapshot().map(|&view| ViewCellState::from(view))
    }
}

impl StorageKey for GameSession {
    const KEY: &'static str = "parejitas:game:v1";
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct CellPointerState {
    pos: game::Coord2,
    buttons: MouseButtons,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum CellMsg {
    Update(CellPointerState),
    Leave,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Msg {
    CellEvent(CellMsg),
    Tick,
    NewGame,
    ToggleSettings,
}

#[derive(Properties, Clone, PartialEq)]
struct CardCellProps {
    x: game::Coord,
    y: game::Coord,
    cell_state: ViewCellState,
    #[prop_or_default]
    pulsed: bool,
    #[prop_or_default]
    pressed: bool,
    #[prop_or_default]
    locked: bool,
    callback: Callback<CellMsg>,
}

#[function_component(CardCell)]
fn card_cell(props: &CardCellProps) -> Html {
    use ViewCellState::*;

    let CardCellProps {
        x,
        y,
        cell_state,
        pulsed,
        pressed,
        locked,
        callback,
    } = props.clone();

    let (face, value) = match cell_state {
        Hidden => (classes!(), None),
        FaceUp(value) => (classes!("open"), Some(value)),
        Matched(value) => (classes!("open", "matched"), Some(value)),
    };

    let mut class = classes!("card", face);
    if pressed {
        class.push("pressed");
    }
    if pulsed {
        class.push("pulse");
    }
    if locked {
        class.push("locked");
    }

    let pointer_update = move |e: MouseEvent| {
        let buttons = MouseButtons::from_bits_truncate(e.buttons());
        CellMsg::Update(CellPointerState {
            pos: (x, y),
            buttons,
        })
    };

    let onmousedown = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            log::trace!("({}, {}) mouse down", x, y);
            callback.emit(pointer_update(e));
        })
    };

    let onmouseup = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            log::trace!("({}, {}) mouse up", x, y);
            callback.emit(pointer_update(e));
        })
    };

    let onmouseenter = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            callback.emit(pointer_update(e));
        })
    };

    let onmouseleave = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| {
            callback.emit(CellMsg::Leave);
        })
    };

    html! {
        <td {class} {onmousedown} {onmouseup} {onmouseenter} {onmouseleave}>
            { for value.map(|value| html! { <span>{value}</span> }) }
        </td>
    }
}

#[derive(Args, Properties, Debug, Clone, PartialEq, Default)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Board side length (the dealt cell count must be even)
    #[arg(long)]
    pub size: Option<game::Coord>,

    /// Mismatch wait in milliseconds
    #[arg(long)]
    pub wait_ms: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct GameView {
    settings: Settings,
    game: Option<GameSession>,
    seed: u64,
    prev_time: u32,
    settings_open: bool,
    current_cell_state: Option<CellPointerState>,
    last_tick: DateTime<Utc>,
    flip_sound: Option<HtmlAudioElement>,
    _tick_interval: Interval,
}

impl GameView {
    /// Stored settings with the location-hash overrides layered on top.
    fn load_settings(overrides: &GameProps) -> Settings {
        let mut settings: Settings = LocalOrDefault::local_or_default();
        if let Some(size) = overrides.size {
            settings.board_size = size;
        }
        if let Some(wait_ms) = overrides.wait_ms {
            settings.mismatch_wait_ms = wait_ms;
        }
        settings
    }

    fn get_or_create_game(&mut self) -> &mut GameSession {
        let Self {
            game,
            settings,
            seed,
            ..
        } = self;

        game.get_or_insert_with(|| {
            use game::LayoutGenerator;

            let config = settings.game_config().unwrap_or_else(|err| {
                log::warn!("unplayable settings ({err}), falling back to defaults");
                game::GameConfig::default()
            });
            let layout = game::RandomLayoutGenerator::new(*seed)
                .generate(config)
                .expect("a validated config always deals");

            GameSession::new(game::PairEngine::new(layout, config.mismatch_wait))
        })
    }

    fn get_size(&self) -> game::Coord {
        self.game
            .as_ref()
            .map(|session| session.engine.size())
            .unwrap_or(self.settings.board_size)
    }

    fn get_time(&self) -> u32 {
        self.game
            .as_ref()
            .map(|session| session.elapsed_secs(utc_now()))
            .unwrap_or(0)
    }

    fn get_moves(&self) -> u32 {
        self.game
            .as_ref()
            .map_or(0, |session| session.engine.move_count())
    }

    fn is_won(&self) -> bool {
        self.game
            .as_ref()
            .is_some_and(|session| session.engine.is_finished())
    }

    fn is_mid_flip(&self) -> bool {
        matches!(
            self.current_cell_state,
            Some(CellPointerState {
                buttons: MouseButtons::LEFT,
                ..
            })
        )
    }

    fn get_status_class(&self) -> Classes {
        classes!(match &self.game {
            Some(session) if session.engine.is_finished() => "win",
            _ if self.is_mid_flip() => "mid-open",
            None => "not-started",
            Some(_) => "in-progress",
        })
    }

    fn flip_cell(&mut self, coords: game::Coord2) -> bool {
        let now = utc_now();
        let outcome = self.get_or_create_game().flip(coords, now);
        log::debug!("flip {:?}: {:?}", coords, outcome);

        if outcome.flip_event().is_some() {
            self.play_flip_sound();
        }

        outcome.has_update()
    }

    fn play_flip_sound(&self) {
        if let Some(sound) = &self.flip_sound {
            sound.set_current_time(0.0);
            let _ = sound.play();
        }
    }

    fn is_pressed(&self, coords: game::Coord2, cell_state: ViewCellState) -> bool {
        if !matches!(cell_state, ViewCellState::Hidden) {
            return false;
        }

        matches!(
            self.current_cell_state,
            Some(CellPointerState {
                pos,
                buttons: MouseButtons::LEFT,
            }) if pos == coords
        ) && self
            .game
            .as_ref()
            .is_none_or(|session| session.engine.can_interact_at(coords))
    }

    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(TICK_MS, move || link.send_message(Msg::Tick))
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let seed = props
            .seed
            .as_deref()
            .and_then(|seed| seed.parse().ok())
            .unwrap_or_else(js_random_seed);

        Self {
            settings: Self::load_settings(props),
            game: LocalOrDefault::local_or_default(),
            seed,
            prev_time: 0,
            settings_open: false,
            current_cell_state: None,
            last_tick: utc_now(),
            flip_sound: HtmlAudioElement::new_with_src("flip.ogg").ok(),
            _tick_interval: GameView::create_timer(ctx),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use CellMsg::*;
        use Msg::*;

        let updated = match msg {
            CellEvent(Leave) => {
                log::trace!("cell leave");
                self.current_cell_state.take().is_some()
            }
            CellEvent(Update(cell_state)) => {
                log::trace!("cell update: {:?}", cell_state);
                if cell_state.buttons.is_empty() {
                    // buttons released: the click lands on the cell the press
                    // started on
                    match self.current_cell_state.take() {
                        None => false,
                        Some(CellPointerState { pos, buttons }) => {
                            if buttons == MouseButtons::LEFT {
                                self.flip_cell(pos);
                            }
                            true
                        }
                    }
                } else {
                    match self.current_cell_state.replace(cell_state) {
                        None => true,
                        Some(prev) => prev != cell_state,
                    }
                }
            }
            Tick => {
                let now = utc_now();
                let elapsed = (now - self.last_tick).to_std().unwrap_or_default();
                self.last_tick = now;

                let mut updated = self
                    .game
                    .as_mut()
                    .is_some_and(|session| session.advance(elapsed));

                let time = self.get_time();
                if self.prev_time != time {
                    self.prev_time = time;
                    updated = true;
                }
                updated
            }
            NewGame => {
                self.seed = js_random_seed();
                self.game.take().is_some()
            }
            ToggleSettings => {
                self.settings_open = !self.settings_open;
                if !self.settings_open {
                    self.settings = Self::load_settings(ctx.props());
                }
                true
            }
        };

        self.game.local_save();
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let size = self.get_size();
        let status_class = self.get_status_class();
        let is_playable = !self.is_won();
        let moves = format_for_counter(self.get_moves() as i32);
        let elapsed_time = format_for_counter(self.get_time() as i32);
        let view_cells = self.game.as_ref().map(|session| session.view_cells());

        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            NewGame
        });
        let cb_show_settings = ctx.link().callback(|_| ToggleSettings);
        let cb_close_settings = ctx.link().callback(|()| ToggleSettings);

        html! {
            <div class="parejitas" oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}>
                <small onclick={cb_show_settings}>{"···"}</small>
                <nav>
                    <aside title="moves">{moves}</aside>
                    <span><button class={status_class} onclick={cb_new_game}/></span>
                    <aside title="seconds">{elapsed_time}</aside>
                </nav>
                <table class={is_playable.then_some("playable")}>
                    {
                        for (0..size).map(|y| html! {
                            <tr>
                                {
                                    for (0..size).map(|x| {
                                        let pos = (x, y);
                                        let cell_state = view_cells
                                            .as_ref()
                                            .map_or(ViewCellState::Hidden, |cells| cells[pos.to_nd_index()]);
                                        let pulsed = self
                                            .game
                                            .as_ref()
                                            .is_some_and(|session| session.pulse_at(pos) > 0);
                                        let locked = self
                                            .game
                                            .as_ref()
                                            .is_some_and(|session| !session.engine.can_interact_at(pos));
                                        let pressed = self.is_pressed(pos, cell_state);
                                        let callback = ctx.link().callback(Msg::CellEvent);
                                        html! {
                                            <CardCell {x} {y} {cell_state} {callback} {pulsed} {pressed} {locked}/>
                                        }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
                if self.is_won() {
                    <footer class="endgame">{format!("You win! {} moves.", self.get_moves())}</footer>
                }
                <SettingsView open={self.settings_open} on_close={cb_close_settings}/>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(0).unwrap()
    }

    // (0,0)=1 (1,0)=2 / (0,1)=2 (1,1)=1
    fn session_2x2() -> GameSession {
        let values = Array2::from_shape_vec((2, 2), vec![1, 2, 2, 1]).unwrap();
        let layout = game::PairLayout::from_values(values).unwrap();
        GameSession::new(game::PairEngine::new(layout, Duration::from_millis(1000)))
    }

    #[test]
    fn render_adapter_hides_face_down_values() {
        let mut session = session_2x2();
        session.flip((0, 0), t0());

        let cells = session.view_cells();

        assert_eq!(cells[(0, 0)], ViewCellState::FaceUp(1));
        assert_eq!(cells[(1, 0)], ViewCellState::Hidden);
        assert_eq!(cells[(0, 1)], ViewCellState::Hidden);
        assert_eq!(cells[(1, 1)], ViewCellState::Hidden);
    }

    #[test]
    fn render_adapter_marks_matched_pairs() {
        let mut session = session_2x2();
        session.flip((0, 0), t0());
        session.flip((1, 1), t0());

        let cells = session.view_cells();

        assert_eq!(cells[(0, 0)], ViewCellState::Matched(1));
        assert_eq!(cells[(1, 1)], ViewCellState::Matched(1));
    }

    #[test]
    fn flip_pulses_the_card_and_records_the_start_time() {
        let mut session = session_2x2();

        assert_eq!(session.elapsed_secs(t0()), 0);
        session.flip((0, 0), t0());

        assert_eq!(session.pulse_at((0, 0)), PULSE_TICKS);
        assert_eq!(session.started_at, Some(t0()));

        for _ in 0..PULSE_TICKS {
            session.advance(Duration::from_millis(TICK_MS.into()));
        }
        assert_eq!(session.pulse_at((0, 0)), 0);
    }

    #[test]
    fn ignored_flips_leave_the_session_untouched() {
        let mut session = session_2x2();

        let outcome = session.flip((9, 9), t0());

        assert_eq!(outcome, game::FlipOutcome::Ignored);
        assert_eq!(session.started_at, None);
        assert_eq!(session.pulse_at((0, 0)), 0);
    }

    #[test]
    fn mismatch_resolves_through_advance() {
        let mut session = session_2x2();
        session.flip((0, 0), t0());
        session.flip((1, 0), t0());

        assert!(session.engine.is_waiting());
        for _ in 0..10 {
            session.advance(Duration::from_millis(TICK_MS.into()));
        }

        assert!(!session.engine.is_waiting());
        assert_eq!(session.view_cells()[(0, 0)], ViewCellState::Hidden);
    }

    #[test]
    fn winning_flip_records_the_end_time() {
        let later = DateTime::<Utc>::from_timestamp_millis(5000).unwrap();
        let mut session = session_2x2();

        session.flip((0, 0), t0());
        session.flip((1, 1), t0());
        session.flip((1, 0), t0());
        session.flip((0, 1), later);

        assert!(session.engine.is_finished());
        assert_eq!(session.ended_at, Some(later));
        assert_eq!(session.elapsed_secs(later), 5);
    }

    #[test]
    fn storage_key_uses_a_versioned_namespace() {
        assert_eq!(<GameSession as StorageKey>::KEY, "parejitas:game:v1");
    }
}
