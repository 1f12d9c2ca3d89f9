use crate::flapping::{sprite_scale, FlapConfig, FlapController};
use crate::motion::{MotionConfig, MotionSimulator, MotionSnapshot, Vec2};
use crate::scroll::{scroll_progress, SceneFrame};
use crate::settings::{Settings, SettingsAction, Theme, THEME_KEY};
use js_sys::{Function, Reflect};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, Event, HtmlAudioElement, HtmlElement, MouseEvent, Storage};
use yew::prelude::*;

const AMBIENT_TRACK: &str = "/jungle.mp3";
const AMBIENT_VOLUME: f64 = 0.3;

fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

fn read_stored_theme() -> Option<Theme> {
    let value = local_storage()?.get_item(THEME_KEY).ok().flatten()?;
    Theme::from_str(&value)
}

fn system_prefers_dark() -> bool {
    window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn resolve_theme() -> Theme {
    read_stored_theme().unwrap_or_else(|| {
        if system_prefers_dark() {
            Theme::Dark
        } else {
            Theme::Light
        }
    })
}

fn apply_theme(theme: Theme) {
    if let Some(document) = window().and_then(|w| w.document()) {
        if let Some(root) = document.document_element() {
            let _ = root.set_attribute("data-theme", theme.as_str());
        }
    }
}

fn prefers_reduced_motion() -> bool {
    window()
        .and_then(|w| {
            w.match_media("(prefers-reduced-motion: reduce)")
                .ok()
                .flatten()
        })
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn apply_theme_with_transition(theme: Theme) {
    if prefers_reduced_motion() {
        apply_theme(theme);
        return;
    }

    let Some(document) = window().and_then(|w| w.document()) else {
        apply_theme(theme);
        return;
    };

    let document_js: JsValue = document.into();
    let Ok(start_view_transition) =
        Reflect::get(&document_js, &JsValue::from_str("startViewTransition"))
    else {
        apply_theme(theme);
        return;
    };

    let Some(start_view_transition) = start_view_transition.dyn_ref::<Function>() else {
        apply_theme(theme);
        return;
    };

    let callback = Closure::once_into_js(move || apply_theme(theme));

    if start_view_transition.call1(&document_js, &callback).is_err() {
        apply_theme(theme);
    }
}

fn persist_theme(theme: Theme) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(THEME_KEY, theme.as_str());
    }
}

fn viewport_height() -> f64 {
    window()
        .and_then(|w| w.inner_height().ok())
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0)
}

impl Reducible for Settings {
    type Action = SettingsAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new(self.apply(action))
    }
}

type SettingsContext = UseReducerHandle<Settings>;

/// A window event listener that unregisters itself when dropped.
struct WindowListener {
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl WindowListener {
    fn new(event: &'static str, handler: impl FnMut(Event) + 'static) -> Option<Self> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        window()?
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .ok()?;

        Some(Self { event, callback })
    }
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        if let Some(win) = window() {
            let _ = win.remove_event_listener_with_callback(
                self.event,
                self.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Self-rescheduling `requestAnimationFrame` chain, cancelled on drop.
struct AnimationLoop {
    pending: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl AnimationLoop {
    fn start(mut on_frame: impl FnMut(f64) + 'static) -> Self {
        let pending = Rc::new(Cell::new(None));
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        {
            let pending = pending.clone();
            let next = callback.clone();
            *callback.borrow_mut() = Some(Closure::new(move |timestamp_ms: f64| {
                on_frame(timestamp_ms);
                pending.set(request_frame(&next));
            }));
        }

        pending.set(request_frame(&callback));
        Self { pending, callback }
    }
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    let callback = callback.borrow();
    let callback = callback.as_ref()?;
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        if let (Some(handle), Some(win)) = (self.pending.take(), window()) {
            let _ = win.cancel_animation_frame(handle);
        }
        // The closure holds a handle to itself; releasing it breaks the cycle.
        self.callback.borrow_mut().take();
    }
}

#[hook]
fn use_cursor_position() -> Vec2 {
    let position = use_state(|| Vec2::ZERO);

    {
        let position = position.clone();
        use_effect_with((), move |_| {
            let listener = WindowListener::new("mousemove", move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    position.set(Vec2::new(
                        f64::from(event.client_x()),
                        f64::from(event.client_y()),
                    ));
                }
            });
            move || drop(listener)
        });
    }

    *position
}

#[derive(Clone, Copy, PartialEq, Default)]
struct MotionFrame {
    snapshot: MotionSnapshot,
    timestamp_ms: f64,
}

/// Follows `target` with the damped spring; the configuration is read on mount.
#[hook]
fn use_motion(target: Vec2, config: MotionConfig) -> MotionFrame {
    let frame = use_state(MotionFrame::default);
    let latest_target = use_mut_ref(|| target);
    *latest_target.borrow_mut() = target;

    {
        let frame = frame.clone();
        let latest_target = latest_target.clone();
        use_effect_with((), move |_| {
            let mut simulator = MotionSimulator::new(config.or_default());
            let animation = AnimationLoop::start(move |timestamp_ms| {
                let target = *latest_target.borrow();
                let snapshot = simulator.tick(target);
                frame.set(MotionFrame {
                    snapshot,
                    timestamp_ms,
                });
            });
            move || drop(animation)
        });
    }

    *frame
}

#[hook]
fn use_scene_frame(section: NodeRef) -> SceneFrame {
    let scene = use_state(SceneFrame::default);

    {
        let scene = scene.clone();
        use_effect_with(section, move |section| {
            let measure = {
                let section = section.clone();
                move || {
                    let Some(element) = section.cast::<HtmlElement>() else {
                        return;
                    };
                    let scroll_y = window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0);
                    let progress = scroll_progress(
                        scroll_y - f64::from(element.offset_top()),
                        f64::from(element.offset_height()),
                        viewport_height(),
                    );
                    scene.set(SceneFrame::at(progress));
                }
            };

            measure();
            let listener = WindowListener::new("scroll", move |_| measure());
            move || drop(listener)
        });
    }

    *scene
}

#[derive(Properties, PartialEq)]
struct BirdCursorProps {
    #[prop_or(0.08)]
    delay: f64,
    #[prop_or(1.5)]
    flapping_threshold: f64,
}

#[function_component(BirdCursor)]
fn bird_cursor(props: &BirdCursorProps) -> Html {
    let cursor = use_cursor_position();
    let frame = use_motion(
        cursor,
        MotionConfig {
            delay: props.delay,
            ..MotionConfig::default()
        },
    );
    let flap = use_mut_ref(|| {
        FlapController::new(FlapConfig {
            threshold: props.flapping_threshold,
            ..FlapConfig::default()
        })
    });

    let (state, wing_beat) = {
        let mut flap = flap.borrow_mut();
        let state = flap.update(frame.snapshot.speed, frame.timestamp_ms);
        (state, flap.wing_beat_seconds())
    };

    let MotionSnapshot {
        position,
        speed,
        facing,
        ..
    } = frame.snapshot;

    let anchor_style = format!("left: {:.2}px; top: {:.2}px;", position.x, position.y);
    let sprite_style = format!(
        "transform: scaleX({}) scale({:.4}); --wing-beat: {:.3}s;",
        facing.sign(),
        sprite_scale(speed),
        wing_beat
    );

    html! {
        <div class="bird-cursor" style={anchor_style} aria-hidden="true">
            <div class={classes!("bird-container", state.css_class())} style={sprite_style}>
                <div class="bird">
                    <div class="bird-body"></div>
                    <div class="bird-breast"></div>
                    <div class="bird-head"></div>
                    <div class="bird-eye"></div>
                    <div class="bird-beak"></div>
                    <div class="bird-wing left"></div>
                    <div class="bird-wing right"></div>
                    <div class="bird-tail"></div>
                </div>
            </div>
        </div>
    }
}

#[function_component(ThemeToggle)]
fn theme_toggle() -> Html {
    let Some(settings) = use_context::<SettingsContext>() else {
        return html! {};
    };
    let theme = settings.theme;

    let onclick = {
        let settings = settings.clone();
        Callback::from(move |_| {
            let next = settings.theme.toggled();
            persist_theme(next);
            apply_theme_with_transition(next);
            settings.dispatch(SettingsAction::ToggleTheme);
        })
    };

    html! {
        <button
            class="round-toggle theme-toggle"
            type="button"
            aria-label={theme.toggle_label()}
            aria-pressed={(theme == Theme::Dark).to_string()}
            onclick={onclick}
        >
            <span aria-hidden="true">{theme.icon()}</span>
        </button>
    }
}

#[function_component(AudioToggle)]
fn audio_toggle() -> Html {
    let Some(settings) = use_context::<SettingsContext>() else {
        return html! {};
    };

    let onclick = {
        let settings = settings.clone();
        Callback::from(move |_| settings.dispatch(SettingsAction::ToggleMute))
    };

    html! {
        <button
            class="round-toggle audio-toggle"
            type="button"
            aria-label={settings.mute_label()}
            aria-pressed={settings.muted.to_string()}
            onclick={onclick}
        >
            <span aria-hidden="true">{settings.mute_icon()}</span>
        </button>
    }
}

#[function_component(AmbientAudio)]
fn ambient_audio() -> Html {
    let audio_ref = use_node_ref();
    let muted = use_context::<SettingsContext>()
        .map(|settings| settings.muted)
        .unwrap_or(true);

    {
        let audio_ref = audio_ref.clone();
        use_effect_with(muted, move |muted| {
            if let Some(audio) = audio_ref.cast::<HtmlAudioElement>() {
                audio.set_volume(AMBIENT_VOLUME);
                if *muted {
                    let _ = audio.pause();
                } else if audio.paused() {
                    // Autoplay may be refused until the first user gesture.
                    let _ = audio.play();
                }
            }
            || ()
        });
    }

    html! {
        <audio ref={audio_ref} src={AMBIENT_TRACK} loop=true preload="auto" />
    }
}

#[function_component(HomeSection)]
fn home_section() -> Html {
    let section_ref = use_node_ref();
    let scene = use_scene_frame(section_ref.clone());

    let jungle_style = format!("opacity: {:.3};", scene.jungle_opacity);
    let canopy_style = format!(
        "opacity: {:.3}; transform: scale({:.4});",
        scene.canopy_opacity, scene.canopy_scale
    );
    let forest_style = format!(
        "opacity: {:.3}; pointer-events: {};",
        scene.forest_opacity,
        if scene.forest_interactive() { "auto" } else { "none" }
    );
    let content_style = format!(
        "opacity: {:.3}; transform: translate(-50%, -50%) translateY({:.2}px);",
        scene.content_opacity, scene.content_offset_y
    );

    html! {
        <section ref={section_ref} class="home-section" aria-labelledby="home-heading">
            <div class="scene">
                <img class="scene-layer mountain-layer" src="/mountain.png" alt="" />
                <img class="scene-layer jungle-layer" src="/jungle.png" alt="" style={jungle_style} />
                <img class="scene-layer canopy-layer" src="/jungle2.png" alt="" style={canopy_style} />
                <div class="scene-layer forest-layer" style={forest_style}></div>
                <div class="scene-content" style={content_style}>
                    <h1 id="home-heading">{"Your Name"}</h1>
                    <p>{"Web Developer & Digital Explorer"}</p>
                </div>
            </div>
        </section>
    }
}

#[function_component(App)]
fn app() -> Html {
    let settings = use_reducer(|| Settings::new(resolve_theme()));

    {
        let current = settings.theme;
        use_effect_with((), move |_| {
            apply_theme(current);
            || ()
        });
    }

    html! {
        <ContextProvider<SettingsContext> context={settings}>
            <div class="jungle-app">
                <AmbientAudio />
                <BirdCursor />
                <div class="toggle-bar">
                    <AudioToggle />
                    <ThemeToggle />
                </div>
                <main id="content">
                    <HomeSection />
                </main>
            </div>
        </ContextProvider<SettingsContext>>
    }
}

pub fn run() {
    yew::Renderer::<App>::with_root(
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("app"))
            .expect("missing #app mount point"),
    )
    .render();
}
