//! Flow control and the frame scheduler.
//!
//! A "flow" is a self-contained scene (target practice, breathing leaves,
//! plane visualisation, ...) that reacts to tracking events and advances its
//! own simulation each frame. The [`App`] owns all flows and drives them from
//! a single clock:
//!
//! 1. Tracking events are handed to every flow as they arrive
//!    ([`App::handle_tracking`]), each one processed to completion.
//! 2. Once per frame ([`App::frame`]) every flow gets `on_update`, and
//!    `on_tick` once `tick_duration_millis` has elapsed.
//! 3. Custom events produced by flows are dispatched to all flows.
//! 4. World transforms are propagated and the scene's render commands are
//!    returned for the rendering surface.
//!
//! # User-facing types
//!
//! - [`Flow<S, E>`] is the trait for scenes
//! - [`Out<S, E>`] is the output type for async event handling and context configuration

use std::{collections::VecDeque, fmt::Debug, pin::Pin};

use futures::executor::block_on;
use instant::{Duration, Instant};
use log::{debug, warn};

use crate::{
    config::EngineConfig,
    context::{Context, InitContext},
    render::Render,
    tracking::TrackingEvent,
};

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// resolved before the hook's caller continues.
///
/// `Out::FutEvent` resolves futures of custom events. The events are queued and dispatched to
/// all flows at the end of the current frame.
///
/// `Out::FutFn` resolves futures of state mutations and applies them directly.
///
/// `Out::Configure` can be used to modify the Context during runtime, for instance to change the
/// tick speed or the interaction tuning.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing a scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after construction; create scene nodes here
/// 2. `on_tracking()` is called for every tracking provider event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_custom_events()` is called for custom application events
///
pub trait Flow<S, E> {
    /// Initialize the flow and create its scene nodes.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Handle one add/update/remove event from the tracking provider.
    fn on_tracking(&mut self, _ctx: &mut Context, _state: &mut S, _event: &TrackingEvent) -> Out<S, E> {
        Out::Empty
    }

    /// Update state every frame.
    ///
    /// `dt` is the time since the previous frame; `ctx.now` is the frame clock.
    fn on_update(&mut self, ctx: &mut Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Update state periodically.
    ///
    /// Called every `config.tick_duration_millis` milliseconds (configurable via context).
    fn on_tick(&mut self, _ctx: &mut Context, _state: &mut S) -> Out<S, E> {
        Out::Empty
    }

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, _ctx: &mut Context, _state: &mut S, event: E) -> Option<E> {
        Some(event)
    }
}

impl<State, Event> Debug for dyn Flow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Flow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `Flow`. Construction may fail, e.g. on invalid mesh parameters.
pub type FlowConstructor<S, E> = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn Flow<S, E>>>>>>,
>;

/// Owns the flows, the shared [`Context`] and the application state.
pub struct App<State, Event> {
    ctx: Context,
    state: State,
    flows: Vec<Box<dyn Flow<State, Event>>>,
    events: VecDeque<Event>,
    last_time: Option<Instant>,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event> {
    /// Validates `config`, builds every flow and runs their `on_init`.
    pub fn new(
        config: EngineConfig,
        mut state: State,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let init_futures = constructors.into_iter().enumerate().map(|(flow_index, constructor)| {
            constructor(InitContext {
                config: config.clone(),
                flow_index,
            })
        });
        let mut flows = block_on(futures::future::join_all(init_futures))
            .into_iter()
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut ctx = Context::new(config, Instant::now());
        let mut events = VecDeque::new();
        for flow in flows.iter_mut() {
            let out = flow.on_init(&mut ctx, &mut state);
            handle_flow_output(&mut state, &mut ctx, &mut events, out);
        }
        debug!("Initialized {} flow(s)", flows.len());

        Ok(Self {
            ctx,
            state,
            flows,
            events,
            last_time: None,
            time_since_tick: Duration::from_millis(0),
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn into_state(self) -> State {
        self.state
    }

    /// Processes one tracking event to completion across all flows.
    pub fn handle_tracking(&mut self, event: &TrackingEvent, now: Instant) {
        self.ctx.now = now;
        for flow in self.flows.iter_mut() {
            let out = flow.on_tracking(&mut self.ctx, &mut self.state, event);
            handle_flow_output(&mut self.state, &mut self.ctx, &mut self.events, out);
        }
    }

    /// Advances all flows to `now` and returns this frame's render commands.
    pub fn frame(&mut self, now: Instant) -> Vec<Render> {
        let dt = self
            .last_time
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_time = Some(now);
        self.time_since_tick += dt;
        self.ctx.now = now;
        self.ctx.frame += 1;

        for flow in self.flows.iter_mut() {
            let out = flow.on_update(&mut self.ctx, &mut self.state, dt);
            handle_flow_output(&mut self.state, &mut self.ctx, &mut self.events, out);
        }

        if self.time_since_tick >= self.ctx.tick_duration() {
            for flow in self.flows.iter_mut() {
                let out = flow.on_tick(&mut self.ctx, &mut self.state);
                handle_flow_output(&mut self.state, &mut self.ctx, &mut self.events, out);
            }
            self.time_since_tick = Duration::from_millis(0);
        }

        self.dispatch_events();

        self.ctx.scene.update_world_transforms();
        self.ctx.scene.drain_render()
    }

    /// Events raised while dispatching are delivered in the next frame.
    fn dispatch_events(&mut self) {
        let pending: Vec<Event> = self.events.drain(..).collect();
        for event in pending {
            let mut event = Some(event);
            for flow in self.flows.iter_mut() {
                match event.take() {
                    Some(e) => event = flow.on_custom_events(&mut self.ctx, &mut self.state, e),
                    None => break,
                }
            }
            if event.is_some() {
                warn!("A custom event was not consumed by any flow");
            }
        }
    }

    /// Drives the app from a tracking stream until it ends.
    ///
    /// Tracking events are handled as they arrive; in between, a frame is run
    /// every `frame_interval_millis` and its render commands are flushed to
    /// `surface`. Returns the application state after a final frame.
    ///
    /// Tracking is polled first so a burst is applied before the next frame.
    /// A stream that never stalls still gets a frame once per interval.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn run<T, R>(mut self, tracking: T, surface: &mut R) -> State
    where
        T: futures::Stream<Item = TrackingEvent> + Unpin,
        R: crate::render::RenderSurface + ?Sized,
    {
        use futures::StreamExt;

        init_logging();
        let frame_interval = Duration::from_millis(self.ctx.config.frame_interval_millis);
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tracking = tracking.fuse();
        let mut last_frame = Instant::now();

        loop {
            tokio::select! {
                biased;
                event = tracking.next() => match event {
                    Some(event) => {
                        self.handle_tracking(&event, Instant::now());
                        if last_frame.elapsed() < frame_interval {
                            continue;
                        }
                        debug!("Tracking stream kept the frame timer waiting, forcing a frame");
                        interval.reset();
                    }
                    None => break,
                },
                _ = interval.tick() => {}
            }
            let commands = self.frame(Instant::now());
            crate::render::flush(&commands, &self.ctx.scene, surface);
            last_frame = Instant::now();
        }

        let commands = self.frame(Instant::now());
        crate::render::flush(&commands, &self.ctx.scene, surface);
        log::info!("Tracking stream ended after {} frame(s)", self.ctx.frame);
        self.state
    }
}

fn handle_flow_output<State, Event>(
    state: &mut State,
    ctx: &mut Context,
    events: &mut VecDeque<Event>,
    out: Out<State, Event>,
) {
    match out {
        Out::FutEvent(futures) => {
            let fut = futures::future::join_all(futures.into_iter().map(Pin::from));
            events.extend(block_on(fut));
        }
        Out::FutFn(futures) => {
            let fut = futures::future::join_all(futures.into_iter().map(Pin::from));
            let resolved: Vec<Box<dyn FnOnce(&mut State)>> = block_on(fut);
            resolved.into_iter().for_each(|mutation| {
                mutation(state);
            });
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Installs the platform logger: `env_logger` natively, `console_log` on wasm.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }
}
