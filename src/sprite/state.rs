/// Player typestates. A transition can only be reached through the methods
/// below, so e.g. landing without a jump does not compile:
/// - PUBLIC  : PlayerState and PlayerContext
/// - PRIVATE : the fields that make up a state
use crate::engine::Point;
use crate::sprite::{FrameCursor, FrameStrip, JumpUp, Land, Strip};

/// Holding a single frame, waiting for the next jump
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Standing;

/// Jump-up strip playing, position is driven by a `JumpArc`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Jumping;

/// Land strip playing after touchdown
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landing;

pub enum IsLanding {
    Done(PlayerState<Standing>),
    InProgress(PlayerState<Landing>),
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// Shared data for :
/// - transform : position + rotation
/// - display   : strip + frame cursor
pub struct PlayerContext {
    pub position: Point,
    pub rotation: f32,
    pub strip: Strip,
    pub cursor: FrameCursor,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlayerState<S> {
    context: PlayerContext,
    // type-level tag only, never read
    _state: S,
}

impl<S> PlayerState<S> {
    pub fn context(&self) -> &PlayerContext {
        &self.context
    }

    /// Transform changes come from tweens, not from the state itself
    pub fn place(mut self, position: Point, rotation: f32) -> Self {
        self.context.position = position;
        self.context.rotation = rotation;
        self
    }
}

impl PlayerState<Standing> {
    /// First jump-up frame, stopped
    pub fn new(position: Point) -> Self {
        PlayerState {
            context: PlayerContext {
                position,
                rotation: 0.0,
                strip: Strip::JumpUp,
                cursor: FrameCursor::stopped(JumpUp::COUNT, JumpUp::SPEED),
            },
            _state: Standing,
        }
    }

    pub fn update(mut self) -> Self {
        self.context = self.context.tick();
        self
    }

    pub fn jump(self) -> PlayerState<Jumping> {
        PlayerState {
            context: self.context.play::<JumpUp>(),
            _state: Jumping,
        }
    }
}

impl PlayerState<Jumping> {
    /// wind-up straight into a jump replays the strip from frame 0
    pub fn restart(self) -> Self {
        PlayerState {
            context: self.context.play::<JumpUp>(),
            _state: Jumping,
        }
    }

    pub fn update(mut self) -> Self {
        self.context = self.context.tick();
        self
    }

    /// Touchdown : rotation snaps back upright
    pub fn land(self) -> PlayerState<Landing> {
        PlayerState {
            context: PlayerContext {
                rotation: 0.0,
                ..self.context.play::<Land>()
            },
            _state: Landing,
        }
    }
}

impl PlayerState<Landing> {
    /// Returns an enum because Landing can:
    /// - End      (Done)
    /// - Continue (InProgress)
    pub fn update(mut self) -> IsLanding {
        self.context = self.context.tick();
        if self.context.cursor.is_playing() {
            IsLanding::InProgress(self)
        } else {
            IsLanding::Done(self.stand())
        }
    }

    /// Chained hops start the next jump before the land strip finishes
    pub fn jump(self) -> PlayerState<Jumping> {
        PlayerState {
            context: self.context.play::<JumpUp>(),
            _state: Jumping,
        }
    }

    /// keeps showing the last land frame
    pub fn stand(self) -> PlayerState<Standing> {
        PlayerState {
            context: self.context,
            _state: Standing,
        }
    }
}

impl PlayerContext {
    fn tick(mut self) -> Self {
        self.cursor.tick(1.0);
        self
    }

    /// restart from frame 0 of `S`, strips have different lengths
    fn play<S: FrameStrip>(mut self) -> Self {
        log::trace!("player strip -> {}", S::name());
        self.strip = S::strip();
        self.cursor = S::cursor();
        self
    }

    pub fn frame_key(&self) -> String {
        self.strip.frame_key(self.cursor.frame())
    }
}
