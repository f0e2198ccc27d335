//! Finger-gun gesture recognition.
//!
//! Two gates turn per-frame pose similarity scores into discrete gestures:
//!
//! - the ready gate ([`DebounceGate`]) goes active as soon as the ready score
//!   exceeds its threshold and only lets go after the score has stayed below it
//!   for a grace period, which absorbs tracking jitter;
//! - the trigger gate ([`TriggerGate`]) fires on a trigger score above its
//!   threshold while the hand is armed, then stays closed for a cooldown.
//!
//! There are no timers: the owner passes the frame clock into every call and
//! calls [`GestureRecognizer::tick`] once per frame to expire the cooldown.

use instant::{Duration, Instant};
use log::{debug, info};

use crate::config::GestureConfig;

/// Threshold gate with a trailing grace period.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    pub threshold: f32,
    pub grace: Duration,
    active: bool,
    last_above: Option<Instant>,
}

impl DebounceGate {
    pub fn new(threshold: f32, grace: Duration) -> Self {
        Self {
            threshold,
            grace,
            active: false,
            last_above: None,
        }
    }

    /// Feeds one score and returns whether the gate is active afterwards.
    pub fn update(&mut self, score: f32, now: Instant) -> bool {
        if score > self.threshold {
            self.last_above = Some(now);
            self.active = true;
        } else if self.active {
            let expired = self
                .last_above
                .is_none_or(|last| now.duration_since(last) >= self.grace);
            if expired {
                self.active = false;
            }
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last frame the score was above the threshold.
    pub fn last_above(&self) -> Option<Instant> {
        self.last_above
    }
}

/// Edge gate with a cooldown after every shot.
#[derive(Debug, Clone)]
pub struct TriggerGate {
    pub threshold: f32,
    pub cooldown: Duration,
    cooldown_until: Option<Instant>,
}

impl TriggerGate {
    pub fn new(threshold: f32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            cooldown_until: None,
        }
    }

    /// Returns `true` if this score fires. Only fires while `armed` and not
    /// cooling down; a shot starts the cooldown.
    pub fn update(&mut self, score: f32, armed: bool, now: Instant) -> bool {
        if score > self.threshold && armed && !self.in_cooldown() {
            self.cooldown_until = Some(now + self.cooldown);
            return true;
        }
        false
    }

    /// Ends the cooldown once its deadline has passed. Returns `true` on the
    /// frame it ends.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.cooldown_until {
            Some(until) if now >= until => {
                self.cooldown_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown_until.is_some()
    }
}

/// What the interaction step reads from gesture recognition each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandGestureState {
    pub last_detection: Option<Instant>,
    pub ready_to_fire: bool,
    pub in_cooldown: bool,
    /// Set on the frame a shot is fired, cleared by [`GestureRecognizer::begin_frame`].
    pub did_fire: bool,
    pub showing_aim: bool,
}

/// Result of one [`GestureRecognizer::evaluate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureSignal {
    pub fired: bool,
    /// `Some(true)` when the aim indicator should appear this frame,
    /// `Some(false)` when it should disappear.
    pub aim_shown: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    ready: DebounceGate,
    trigger: TriggerGate,
    state: HandGestureState,
}

impl GestureRecognizer {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            ready: DebounceGate::new(config.ready_threshold, config.debounce()),
            trigger: TriggerGate::new(config.trigger_threshold, config.cooldown()),
            state: HandGestureState::default(),
        }
    }

    pub fn state(&self) -> &HandGestureState {
        &self.state
    }

    pub fn begin_frame(&mut self) {
        self.state.did_fire = false;
    }

    /// Expires the cooldown.
    pub fn tick(&mut self, now: Instant) {
        if self.trigger.tick(now) {
            debug!("Trigger cooldown over");
        }
        self.state.in_cooldown = self.trigger.in_cooldown();
    }

    /// Evaluates one frame of pose scores.
    ///
    /// A `None` score means the pose could not be compared this frame; that
    /// gate is skipped and its state persists.
    pub fn evaluate(&mut self, ready: Option<f32>, trigger: Option<f32>, now: Instant) -> GestureSignal {
        let mut signal = GestureSignal::default();

        if let Some(score) = ready {
            let was_active = self.ready.is_active();
            let active = self.ready.update(score, now);
            if score > self.ready.threshold {
                self.state.last_detection = self.ready.last_above();
                if !self.state.ready_to_fire {
                    info!("Finger gun ready (score {:.3})", score);
                    self.state.ready_to_fire = true;
                }
            }
            if active && !self.state.showing_aim {
                self.state.showing_aim = true;
                signal.aim_shown = Some(true);
            } else if was_active && !active {
                info!("Finger gun lost (score {:.3})", score);
                self.state.showing_aim = false;
                self.state.ready_to_fire = false;
                signal.aim_shown = Some(false);
            }
        }

        if let Some(score) = trigger {
            if self.trigger.update(score, self.state.ready_to_fire, now) {
                info!("Trigger pulled (score {:.3})", score);
                self.state.ready_to_fire = false;
                self.state.did_fire = true;
                signal.fired = true;
            }
        }
        self.state.in_cooldown = self.trigger.in_cooldown();

        signal
    }

    /// Drops the hand: hides the aim and disarms, keeping any cooldown.
    pub fn reset(&mut self) -> GestureSignal {
        let was_showing = self.state.showing_aim;
        self.ready = DebounceGate::new(self.ready.threshold, self.ready.grace);
        self.state.showing_aim = false;
        self.state.ready_to_fire = false;
        self.state.did_fire = false;
        GestureSignal {
            fired: false,
            aim_shown: was_showing.then_some(false),
        }
    }
}
