use crate::engine::{Point, Size};
use crate::sprite::state::{IsLanding, Jumping, Landing, PlayerContext, PlayerState, Standing};

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event   →  To State                     │
/// ├─────────────────────────────────────────────────────────┤
/// │  Standing    →  Jump    →  Jumping                      │
/// │  Landing     →  Jump    →  Jumping                      │
/// │  Jumping     →  Jump    →  Jumping (strip restarts)     │
/// │  Jumping     →  Land    →  Landing                      │
/// │  -------        ------                                  │
/// │  Landing     →  Update  →  Standing (when strip ends)   │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Event {
    Jump,
    Land,
    Update,
    Place { position: Point, rotation: f32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum PlayerStateMachine {
    Standing(PlayerState<Standing>),
    Jumping(PlayerState<Jumping>),
    Landing(PlayerState<Landing>),
}

impl From<PlayerState<Standing>> for PlayerStateMachine {
    fn from(state: PlayerState<Standing>) -> Self {
        PlayerStateMachine::Standing(state)
    }
}

impl From<PlayerState<Jumping>> for PlayerStateMachine {
    fn from(state: PlayerState<Jumping>) -> Self {
        PlayerStateMachine::Jumping(state)
    }
}

impl From<PlayerState<Landing>> for PlayerStateMachine {
    fn from(state: PlayerState<Landing>) -> Self {
        PlayerStateMachine::Landing(state)
    }
}

impl From<IsLanding> for PlayerStateMachine {
    fn from(is_landing: IsLanding) -> Self {
        match is_landing {
            IsLanding::Done(standing_state) => standing_state.into(),
            IsLanding::InProgress(landing_state) => landing_state.into(),
        }
    }
}

impl PlayerStateMachine {
    // consumes self : the old state can't be reached after a transition
    fn transition(self, event: Event) -> Self {
        use PlayerStateMachine::*;
        match (self, event) {
            (Standing(state), Event::Jump) => state.jump().into(),
            (Landing(state), Event::Jump) => state.jump().into(),
            (Jumping(state), Event::Jump) => state.restart().into(),
            (Jumping(state), Event::Land) => state.land().into(),
            (Standing(state), Event::Update) => state.update().into(),
            (Jumping(state), Event::Update) => state.update().into(),
            (Landing(state), Event::Update) => state.update().into(),
            (Standing(state), Event::Place { position, rotation }) => {
                state.place(position, rotation).into()
            }
            (Jumping(state), Event::Place { position, rotation }) => {
                state.place(position, rotation).into()
            }
            (Landing(state), Event::Place { position, rotation }) => {
                state.place(position, rotation).into()
            }
            // e.g. Land while Standing : keep the current state
            _ => self,
        }
    }

    fn context(&self) -> &PlayerContext {
        use PlayerStateMachine::*;
        match self {
            Standing(state) => state.context(),
            Jumping(state) => state.context(),
            Landing(state) => state.context(),
        }
    }
}

/// The hopping character
/// - animation state : PlayerStateMachine
/// - size : first jump-up texture times `SCALE`, fixed for the whole ad
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    state: PlayerStateMachine,
    size: Size,
}

impl Player {
    pub const SCALE: f32 = 0.7;

    pub fn new(position: Point, texture_size: Size) -> Self {
        Player {
            state: PlayerState::new(position).into(),
            size: texture_size.scaled(Point::new(Self::SCALE, Self::SCALE)),
        }
    }

    pub fn update(&mut self) {
        self.state = self.state.transition(Event::Update);
    }

    pub fn jump(&mut self) {
        self.state = self.state.transition(Event::Jump);
    }

    pub fn land(&mut self) {
        self.state = self.state.transition(Event::Land);
    }

    pub fn set_position(&mut self, position: Point) {
        let rotation = self.rotation();
        self.state = self.state.transition(Event::Place { position, rotation });
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        let position = self.position();
        self.state = self.state.transition(Event::Place { position, rotation });
    }

    pub fn position(&self) -> Point {
        self.state.context().position
    }

    pub fn rotation(&self) -> f32 {
        self.state.context().rotation
    }

    /// Scaled on-screen size
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bottom centre, where rings and dust spawn
    pub fn feet(&self) -> Point {
        let position = self.position();
        Point::new(position.x, position.y + self.size.height / 2.0)
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.state, PlayerStateMachine::Jumping(_))
    }

    pub fn current_frame_name(&self) -> String {
        self.state.context().frame_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Point::new(10.0, 20.0), Size::new(100.0, 200.0))
    }

    #[test]
    fn starts_standing_on_first_jump_frame() {
        let player = player();
        assert_eq!(player.current_frame_name(), "imp_0");
        assert_eq!(player.size(), Size::new(70.0, 140.0));
        assert_eq!(player.feet(), Point::new(10.0, 90.0));
        assert!(!player.is_airborne());
    }

    #[test]
    fn jump_then_land_switches_strips() {
        let mut player = player();
        player.jump();
        assert!(player.is_airborne());
        for _ in 0..4 {
            player.update();
        }
        assert_eq!(player.current_frame_name(), "imp_2");

        player.set_rotation(1.5);
        player.land();
        assert!(!player.is_airborne());
        assert_eq!(player.rotation(), 0.0);
        assert_eq!(player.current_frame_name(), "imp_9");
    }

    #[test]
    fn land_strip_ends_holding_last_frame() {
        let mut player = player();
        player.jump();
        player.land();
        for _ in 0..60 {
            player.update();
        }
        assert_eq!(player.current_frame_name(), "imp_18");
        // standing again, so a fresh jump is allowed
        player.jump();
        assert!(player.is_airborne());
        assert_eq!(player.current_frame_name(), "imp_0");
    }

    #[test]
    fn landing_without_jump_is_ignored() {
        let mut player = player();
        player.land();
        assert_eq!(player.current_frame_name(), "imp_0");
        assert!(!player.is_airborne());
    }

    #[test]
    fn placement_survives_state_changes() {
        let mut player = player();
        player.set_position(Point::new(300.0, 40.0));
        player.jump();
        assert_eq!(player.position(), Point::new(300.0, 40.0));
    }
}
