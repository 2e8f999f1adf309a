//! Tap driven scripts
//!
//! Each tap advances `Stage` by one and queues that stage's script. Steps run
//! in order; `Wait`, `Jump` and `Ride` hold the queue until they finish, every
//! other step fires and moves on immediately.
use crate::engine::{Point, Size};
use crate::scene::{Channel, PropKind, Scene};
use crate::tween::{Ease, JumpArc, Tween};
use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

const JUMP_HEIGHT: f32 = 150.0;

/// How far the player has come, doubles as the click counter
/// - never moves backwards, never passes `OnClock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    OnShelf = 0,
    OnChair = 1,
    OnStart = 2,
    OnSkate = 3,
    OnClock = 4,
}

impl Stage {
    pub fn clicks(self) -> u8 {
        self as u8
    }

    fn next(self) -> Self {
        match self {
            Stage::OnShelf => Stage::OnChair,
            Stage::OnChair => Stage::OnStart,
            Stage::OnStart => Stage::OnSkate,
            Stage::OnSkate | Stage::OnClock => Stage::OnClock,
        }
    }

    /// Script played by the tap that leaves this stage, `None` once the
    /// only thing left is the store
    fn script(self) -> Option<Vec<Step>> {
        let steps = match self {
            Stage::OnShelf => vec![
                Step::Rings,
                Step::WindUp,
                Step::Wait(0.2),
                Step::Jump(Landing::on(PropKind::Ball, 15.0), 0.9),
                Step::Squash(Squash {
                    prop: PropKind::Ball,
                    squash: Point::new(1.1, 0.9),
                    squash_duration: 0.1,
                    settle: Point::new(1.0, 1.0),
                    settle_duration: 0.4,
                    settle_ease: Ease::Power1Out,
                }),
                Step::Wait(0.15),
                Step::Jump(Landing::on(PropKind::Chair, 10.0), 0.6),
                Step::Release,
                Step::RollBall,
            ],
            Stage::OnChair => vec![
                Step::Rings,
                Step::Sound,
                Step::Pan {
                    screens: 0.5,
                    duration: 0.8,
                },
                Step::Jump(
                    Landing {
                        dx: 12.0,
                        ..Landing::on(PropKind::Decor, 12.0)
                    },
                    0.7,
                ),
                Step::Squash(Squash {
                    prop: PropKind::Decor,
                    squash: Point::new(0.9, 0.9),
                    squash_duration: 0.08,
                    settle: Point::new(0.8, 0.8),
                    settle_duration: 0.5,
                    settle_ease: Ease::ElasticOut {
                        amplitude: 1.0,
                        period: 0.4,
                    },
                }),
                Step::Jump(
                    Landing {
                        top_fraction: 0.01,
                        ..Landing::on(PropKind::Start, 5.0)
                    },
                    0.7,
                ),
                Step::Release,
            ],
            Stage::OnStart => vec![
                Step::Rings,
                Step::Sound,
                Step::Jump(
                    Landing {
                        player_lift: 1.0 / 9.0,
                        ..Landing::on(PropKind::Skate, 30.0)
                    },
                    0.6,
                ),
                Step::Ride {
                    screens: 0.4,
                    duration: 1.2,
                },
                Step::Release,
            ],
            Stage::OnSkate => vec![
                Step::Jump(Landing::on(PropKind::Duck, 10.0), 0.6),
                Step::Jump(Landing::on(PropKind::Clock, 10.0), 0.6),
                Step::Release,
            ],
            Stage::OnClock => return None,
        };
        Some(steps)
    }

    /// Where the player belongs while idle at this stage
    pub fn rest_spot(self, scene: &Scene) -> Option<Point> {
        let offset = |kind: PropKind, dy: f32| {
            scene
                .standing_on(kind)
                .map(|spot| Point::new(spot.x, spot.y + dy))
        };
        match self {
            Stage::OnShelf => scene.shelf_spot(),
            Stage::OnChair => offset(PropKind::Chair, 0.0),
            Stage::OnStart => offset(PropKind::Start, 0.0),
            Stage::OnSkate => offset(PropKind::Skate, 10.0),
            Stage::OnClock => offset(PropKind::Clock, 0.0),
        }
    }
}

/// Where a jump ends, resolved against the scene when the jump starts
/// - y = prop.y - prop.h * top_fraction - player.h * player_lift + dy - player.h / 2
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub prop: PropKind,
    pub dx: f32,
    pub dy: f32,
    pub top_fraction: f32,
    pub player_lift: f32,
}

impl Landing {
    /// On the top edge of `prop`, `dy` pixels lower
    pub fn on(prop: PropKind, dy: f32) -> Self {
        Landing {
            prop,
            dx: 0.0,
            dy,
            top_fraction: 0.5,
            player_lift: 0.0,
        }
    }

    pub fn resolve(&self, scene: &Scene) -> Option<Point> {
        let prop = scene.prop(self.prop)?;
        let player = scene.player.size().height;
        Some(Point::new(
            prop.position.x + self.dx,
            prop.position.y - prop.size().height * self.top_fraction - player * self.player_lift
                + self.dy
                - player / 2.0,
        ))
    }
}

/// Press-and-spring on a prop after a landing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Squash {
    pub prop: PropKind,
    pub squash: Point,
    pub squash_duration: f32,
    pub settle: Point,
    pub settle_duration: f32,
    pub settle_ease: Ease,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// two expanding rings at the player's feet
    Rings,
    /// jump-up frames and sound without leaving the ground
    WindUp,
    Sound,
    Wait(f32),
    Jump(Landing, f32),
    Squash(Squash),
    /// camera to `-screens * width`
    Pan { screens: f32, duration: f32 },
    /// camera, skate and player travel together
    Ride { screens: f32, duration: f32 },
    RollBall,
    /// taps are accepted again from here on
    Release,
}

/// Browser side effects for the game layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    JumpSound,
    OpenStore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Blocker {
    Timer(f32),
    Airborne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Completion {
    Touchdown,
    RemoveRing(u32),
    RemoveProp(PropKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drive {
    Channel(Channel),
    /// tween value is the progress along the arc
    Arc(JumpArc),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Motion {
    drive: Drive,
    tween: Tween,
    on_done: Option<Completion>,
}

/// Runs the scripts and the tweens they start
#[derive(Debug, Clone)]
pub struct Director {
    stage: Stage,
    busy: bool,
    script: VecDeque<Step>,
    blocker: Option<Blocker>,
    motions: Vec<Motion>,
    cues: Vec<Cue>,
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}

impl Director {
    pub fn new() -> Self {
        Director {
            stage: Stage::OnShelf,
            busy: false,
            script: VecDeque::new(),
            blocker: None,
            motions: Vec::new(),
            cues: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Taps during a script are dropped
    pub fn tap(&mut self, scene: &mut Scene) {
        if self.busy {
            log::debug!("Tap ignored, {:?} script still running", self.stage);
            return;
        }
        match self.stage.script() {
            Some(steps) => {
                log::debug!("Tap {} : leaving {:?}", self.stage.clicks() + 1, self.stage);
                self.stage = self.stage.next();
                self.busy = true;
                self.script.extend(steps);
                self.run_steps(scene);
            }
            None => self.cues.push(Cue::OpenStore),
        }
    }

    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        let mut completions = Vec::new();
        for motion in self.motions.iter_mut() {
            if let Some(value) = motion.tween.advance(dt) {
                match motion.drive {
                    Drive::Channel(channel) => scene.set(channel, value),
                    Drive::Arc(arc) => scene.player.set_position(arc.at(value)),
                }
            }
            if motion.tween.is_finished() {
                completions.extend(motion.on_done);
            }
        }
        self.motions.retain(|motion| !motion.tween.is_finished());
        // after every write of this tick, so touchdown wins over the last rotation value
        for completion in completions {
            self.complete(completion, scene);
        }

        if let Some(Blocker::Timer(remaining)) = self.blocker.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.blocker = None;
            }
        }
        self.run_steps(scene);
        scene.tick();
    }

    /// Re-layout for a new screen; an idle player snaps to its stage's spot
    pub fn resize(&mut self, scene: &mut Scene, screen: Size) {
        scene.relayout(screen);
        if self.busy {
            return;
        }
        if let Some(spot) = self.stage.rest_spot(scene) {
            scene.player.set_position(spot);
        }
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    fn run_steps(&mut self, scene: &mut Scene) {
        while self.blocker.is_none() {
            let Some(step) = self.script.pop_front() else {
                break;
            };
            self.start(step, scene);
        }
    }

    fn start(&mut self, step: Step, scene: &mut Scene) {
        match step {
            Step::Rings => self.rings(scene),
            Step::WindUp => {
                scene.player.jump();
                self.cues.push(Cue::JumpSound);
            }
            Step::Sound => self.cues.push(Cue::JumpSound),
            Step::Wait(seconds) => self.blocker = Some(Blocker::Timer(seconds)),
            Step::Jump(landing, duration) => self.jump(landing, duration, scene),
            Step::Squash(squash) => self.squash(squash, scene),
            Step::Pan { screens, duration } => {
                let to = -screens * scene.screen().width;
                self.animate(scene, Channel::WorldX, to, duration, Ease::Power1InOut, None);
            }
            Step::Ride { screens, duration } => {
                let distance = screens * scene.screen().width;
                self.shift(scene, Channel::WorldX, -distance, duration);
                self.shift(scene, Channel::PropX(PropKind::Skate), distance, duration);
                self.shift(scene, Channel::PlayerX, distance, duration);
                self.blocker = Some(Blocker::Timer(duration));
            }
            Step::RollBall => {
                let Some(ball) = scene.prop(PropKind::Ball) else {
                    return;
                };
                let offscreen = -ball.size().width;
                let rotation = ball.rotation;
                self.animate(
                    scene,
                    Channel::PropX(PropKind::Ball),
                    offscreen,
                    1.2,
                    Ease::Power2In,
                    Some(Completion::RemoveProp(PropKind::Ball)),
                );
                self.motions.push(Motion {
                    drive: Drive::Channel(Channel::PropRotation(PropKind::Ball)),
                    tween: Tween::new(rotation, rotation - 4.0 * PI, 1.2, Ease::Power2In),
                    on_done: None,
                });
            }
            Step::Release => self.busy = false,
        }
    }

    fn jump(&mut self, landing: Landing, duration: f32, scene: &mut Scene) {
        let Some(end) = landing.resolve(scene) else {
            log::warn!("No {:?} to land on, jump skipped", landing.prop);
            return;
        };
        scene.player.jump();
        self.cues.push(Cue::JumpSound);

        let arc = JumpArc::between(scene.player.position(), end, JUMP_HEIGHT);
        self.motions.push(Motion {
            drive: Drive::Arc(arc),
            tween: Tween::new(0.0, 1.0, duration, Ease::Power1InOut),
            on_done: Some(Completion::Touchdown),
        });
        self.motions.push(Motion {
            drive: Drive::Channel(Channel::PlayerRotation),
            tween: Tween::new(scene.player.rotation(), TAU, duration, Ease::Power1Out),
            on_done: None,
        });
        self.blocker = Some(Blocker::Airborne);
    }

    fn squash(&mut self, squash: Squash, scene: &Scene) {
        let axes = [
            (Channel::PropScaleX(squash.prop), squash.squash.x, squash.settle.x),
            (Channel::PropScaleY(squash.prop), squash.squash.y, squash.settle.y),
        ];
        for (channel, pressed, settled) in axes {
            let Some(current) = scene.get(channel) else {
                return;
            };
            self.motions.push(Motion {
                drive: Drive::Channel(channel),
                tween: Tween::new(current, pressed, squash.squash_duration, Ease::Power1Out),
                on_done: None,
            });
            self.motions.push(Motion {
                drive: Drive::Channel(channel),
                tween: Tween::new(pressed, settled, squash.settle_duration, squash.settle_ease)
                    .with_delay(squash.squash_duration),
                on_done: None,
            });
        }
    }

    fn rings(&mut self, scene: &mut Scene) {
        let feet = scene.player.feet();
        for i in 0..2 {
            let i_f = i as f32;
            let id = scene.spawn_ring(feet);
            let duration = 0.4 + i_f * 0.15;
            self.motions.push(Motion {
                drive: Drive::Channel(Channel::RingScale(id)),
                tween: Tween::new(1.0, 2.0 + i_f * 0.3, duration, Ease::Power1Out),
                on_done: None,
            });
            self.motions.push(Motion {
                drive: Drive::Channel(Channel::RingAlpha(id)),
                tween: Tween::new(1.0, 0.0, duration, Ease::Power1Out).with_delay(i_f * 0.1),
                on_done: Some(Completion::RemoveRing(id)),
            });
        }
    }

    /// Tween `channel` from its current value to `to`
    fn animate(
        &mut self,
        scene: &Scene,
        channel: Channel,
        to: f32,
        duration: f32,
        ease: Ease,
        on_done: Option<Completion>,
    ) {
        let Some(from) = scene.get(channel) else {
            return;
        };
        self.motions.push(Motion {
            drive: Drive::Channel(channel),
            tween: Tween::new(from, to, duration, ease),
            on_done,
        });
    }

    /// Relative move used by the ride
    fn shift(&mut self, scene: &Scene, channel: Channel, by: f32, duration: f32) {
        if let Some(from) = scene.get(channel) {
            self.animate(scene, channel, from + by, duration, Ease::Power2Out, None);
        }
    }

    fn complete(&mut self, completion: Completion, scene: &mut Scene) {
        match completion {
            Completion::Touchdown => {
                scene.player.land();
                scene.spawn_puff(scene.player.feet());
                if self.blocker == Some(Blocker::Airborne) {
                    self.blocker = None;
                }
            }
            Completion::RemoveRing(id) => scene.remove_ring(id),
            Completion::RemoveProp(kind) => scene.remove_prop(kind),
        }
    }
}
