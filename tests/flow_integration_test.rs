use cgmath::Vector3;
use instant::Duration;
use spatial_ngin::{
    context::Context,
    flow::{App, Flow, FlowConstructor, Out},
    flows::{
        anchors::PlaneMirror,
        breathing::BreathingLeaves,
        target_practice::{PracticeEvent, TargetPractice},
    },
    render::Render,
    tracking::{AnchorEventKind, PlaneClassification},
};

use crate::common::test_utils::{
    RecordingSurface, at, fired_hand, hand_event, plane_event, ready_hand, test_config,
};

mod common;

#[derive(Default)]
struct Score {
    inits: u32,
    updates: u32,
    ticks: u32,
    shots: usize,
    hits: Vec<usize>,
}

enum Event {
    Practice(PracticeEvent),
}

impl From<PracticeEvent> for Event {
    fn from(event: PracticeEvent) -> Self {
        Event::Practice(event)
    }
}

struct Scoreboard;

impl Flow<Score, Event> for Scoreboard {
    fn on_init(&mut self, _: &mut Context, _: &mut Score) -> Out<Score, Event> {
        let count_init: Box<dyn FnOnce(&mut Score)> = Box::new(|state: &mut Score| {
            state.inits += 1;
        });
        Out::FutFn(vec![Box::new(async move { count_init })])
    }

    fn on_update(&mut self, _: &mut Context, state: &mut Score, _: Duration) -> Out<Score, Event> {
        state.updates += 1;
        Out::Empty
    }

    fn on_tick(&mut self, _: &mut Context, state: &mut Score) -> Out<Score, Event> {
        state.ticks += 1;
        Out::Configure(Box::new(|ctx: &mut Context| ctx.config.tick_duration_millis = 50))
    }

    fn on_custom_events(&mut self, _: &mut Context, state: &mut Score, event: Event) -> Option<Event> {
        match event {
            Event::Practice(PracticeEvent::ShotFired { .. }) => state.shots += 1,
            Event::Practice(PracticeEvent::TargetHit { index, .. }) => state.hits.push(index),
        }
        None
    }
}

fn scoreboard() -> FlowConstructor<Score, Event> {
    let constructor: FlowConstructor<Score, Event> = Box::new(|_| {
        Box::pin(async move {
            let flow: Box<dyn Flow<Score, Event>> = Box::new(Scoreboard);
            anyhow::Ok(flow)
        })
    });
    constructor
}

fn failing() -> FlowConstructor<Score, Event> {
    let constructor: FlowConstructor<Score, Event> = Box::new(|_| {
        Box::pin(async move {
            let flow: anyhow::Result<Box<dyn Flow<Score, Event>>> = Err(anyhow::anyhow!("asset missing"));
            flow
        })
    });
    constructor
}

#[test]
fn lifecycle_hooks_follow_the_frame_clock() {
    let mut app = App::new(test_config(), Score::default(), vec![scoreboard()]).unwrap();
    assert_eq!(app.state().inits, 1);
    let t0 = app.context().now;

    app.frame(t0);
    app.frame(at(t0, 50));
    assert_eq!(app.state().ticks, 0);
    app.frame(at(t0, 120));
    assert_eq!(app.state().updates, 3);
    assert_eq!(app.state().ticks, 1);
    assert_eq!(app.context().config.tick_duration_millis, 50);
    assert_eq!(app.context().tick_duration(), Duration::from_millis(50));
    assert_eq!(app.context().frame, 3);

    app.frame(at(t0, 175));
    assert_eq!(app.state().ticks, 2);
}

#[test]
fn construction_failures_and_bad_config_are_reported() {
    assert!(App::new(test_config(), Score::default(), vec![scoreboard(), failing()]).is_err());

    let mut config = test_config();
    config.gesture.ready_threshold = 2.0;
    assert!(App::new(config, Score::default(), vec![scoreboard()]).is_err());
}

#[test]
fn shots_and_hits_reach_other_flows_at_the_end_of_the_frame() {
    let mut app = App::new(
        test_config(),
        Score::default(),
        vec![TargetPractice::constructor(), scoreboard()],
    )
    .unwrap();
    let t0 = app.context().now;

    let scene = &app.context().scene;
    let root = scene
        .roots()
        .find(|&id| scene.node(id).is_some_and(|n| n.name == "target-practice"))
        .unwrap();
    let target = scene.find_descendant(root, "target-0").unwrap();
    let wrist = scene.local_transform(target).unwrap().position + Vector3::new(0.0, 0.0, 2.0);

    app.handle_tracking(&hand_event(AnchorEventKind::Added, ready_hand(), wrist), t0);
    let commands = app.frame(t0);
    assert!(commands.iter().any(
        |c| matches!(c, Render::Opacity { opacity, .. } if (*opacity - 0.25).abs() < 1e-4)
    ));

    app.handle_tracking(&hand_event(AnchorEventKind::Updated, fired_hand(), wrist), at(t0, 20));
    assert_eq!(app.state().shots, 0);
    let commands = app.frame(at(t0, 20));
    assert_eq!(app.state().shots, 1);
    assert_eq!(app.state().hits, vec![0]);
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, Render::Transform { node, .. } if *node == target))
    );
}

#[test]
fn breathing_leaves_move_every_frame() {
    let mut app = App::new(
        test_config(),
        Score::default(),
        vec![BreathingLeaves::constructor(), scoreboard()],
    )
    .unwrap();
    let t0 = app.context().now;

    let commands = app.frame(t0);
    let transforms = commands
        .iter()
        .filter(|c| matches!(c, Render::Transform { .. }))
        .count();
    assert_eq!(transforms, 60);
    assert!(commands.iter().any(|c| matches!(c, Render::Mesh { .. })));

    let commands = app.frame(at(t0, 16));
    assert!(commands.iter().filter(|c| matches!(c, Render::Transform { .. })).count() > 60);
}

#[tokio::test]
async fn run_drains_the_tracking_stream() {
    let app = App::new(
        test_config(),
        Score::default(),
        vec![PlaneMirror::constructor(), scoreboard()],
    )
    .unwrap();
    let origin = Vector3::new(0.0, 0.0, 0.0);
    let events = futures::stream::iter(vec![
        plane_event(7, AnchorEventKind::Added, PlaneClassification::Seat, 1.0, 1.0, origin),
        plane_event(7, AnchorEventKind::Removed, PlaneClassification::Seat, 1.0, 1.0, origin),
    ]);
    let mut surface = RecordingSurface::default();

    let state = app.run(events, &mut surface).await;
    assert!(state.updates >= 1);
    assert!(
        surface
            .applied
            .iter()
            .any(|c| matches!(c, Render::Material { .. }))
    );
    assert!(matches!(surface.applied.last(), Some(Render::Detach { .. })));
}

#[tokio::test]
async fn a_stream_that_never_stalls_still_gets_frames() {
    let mut config = test_config();
    config.frame_interval_millis = 4;
    let app = App::new(config, Score::default(), vec![PlaneMirror::constructor(), scoreboard()])
        .unwrap();
    let origin = Vector3::new(0.0, 0.0, 0.0);
    let events = Box::pin(futures::stream::unfold(0u64, move |id| async move {
        if id == 20 {
            return None;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
        let event = plane_event(id, AnchorEventKind::Added, PlaneClassification::Floor, 1.0, 1.0, origin);
        Some((event, id + 1))
    }));
    let mut surface = RecordingSurface::default();

    let state = app.run(events, &mut surface).await;
    assert!(state.updates >= 3, "only {} frame(s) ran", state.updates);
}
