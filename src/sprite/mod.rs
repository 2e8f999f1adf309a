// ┌──────────────────────────────────────────────────────────────────────────┐
// │                        sprite/ layout                                    │
// ├────────────────┬─────────────────────────────────────────────────────────┤
// │ mod.rs         │ FrameStrip trait, strips (JumpUp, Land, Dust),          │
// │                │ FrameCursor playback                                    │
// │ state.rs       │ PlayerState<S> typestates + PlayerContext               │
// │ player.rs      │ PlayerStateMachine + Player (what game.rs talks to)     │
// └────────────────┴─────────────────────────────────────────────────────────┘
pub mod player;
pub mod state;

/// Compile time description of a named frame sequence inside the asset bundle
/// - frames are stored as `{PREFIX}_{FIRST + i}`
pub trait FrameStrip {
    const PREFIX: &'static str;
    const FIRST: u8;
    const COUNT: u8;
    /// frames advanced per 60 Hz tick
    const SPEED: f32;

    fn name() -> &'static str;

    fn frame_key(index: u8) -> String {
        format!("{}_{}", Self::PREFIX, Self::FIRST + index.min(Self::COUNT - 1))
    }

    fn cursor() -> FrameCursor {
        FrameCursor::new(Self::COUNT, Self::SPEED)
    }

    fn strip() -> Strip;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JumpUp;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Land;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dust;

impl FrameStrip for JumpUp {
    const PREFIX: &'static str = "imp";
    const FIRST: u8 = 0;
    const COUNT: u8 = 9;
    const SPEED: f32 = 0.5;

    fn name() -> &'static str {
        "JumpUp"
    }

    fn strip() -> Strip {
        Strip::JumpUp
    }
}

impl FrameStrip for Land {
    const PREFIX: &'static str = "imp";
    const FIRST: u8 = 9;
    const COUNT: u8 = 10;
    const SPEED: f32 = 0.5;

    fn name() -> &'static str {
        "Land"
    }

    fn strip() -> Strip {
        Strip::Land
    }
}

impl FrameStrip for Dust {
    const PREFIX: &'static str = "dust";
    const FIRST: u8 = 0;
    const COUNT: u8 = 25;
    const SPEED: f32 = 0.6;

    fn name() -> &'static str {
        "Dust"
    }

    fn strip() -> Strip {
        Strip::Dust
    }
}

/// Runtime tag for a strip, lets a value remember which `FrameStrip` it plays
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strip {
    JumpUp,
    Land,
    Dust,
}

impl Strip {
    pub fn frame_key(self, index: u8) -> String {
        match self {
            Strip::JumpUp => JumpUp::frame_key(index),
            Strip::Land => Land::frame_key(index),
            Strip::Dust => Dust::frame_key(index),
        }
    }

    /// Every texture key the ad needs for player and dust animation
    pub fn all_keys() -> Vec<String> {
        let player = (0..JumpUp::COUNT + Land::COUNT).map(|i| format!("{}_{}", JumpUp::PREFIX, i));
        let dust = (0..Dust::COUNT).map(Dust::frame_key);
        player.chain(dust).collect()
    }
}

/// Non looping playback
/// - `time` advances by `speed` each tick, the shown frame is `floor(time)`
/// - once `time` reaches `total` the cursor stops on the last frame
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameCursor {
    time: f32,
    speed: f32,
    total: u8,
    playing: bool,
}

impl FrameCursor {
    pub fn new(total: u8, speed: f32) -> Self {
        FrameCursor {
            time: 0.0,
            speed,
            total: total.max(1),
            playing: true,
        }
    }

    /// Held on the first frame, never advances
    pub fn stopped(total: u8, speed: f32) -> Self {
        FrameCursor {
            playing: false,
            ..FrameCursor::new(total, speed)
        }
    }

    /// Returns `true` on the tick the strip completes
    pub fn tick(&mut self, ticks: f32) -> bool {
        if !self.playing {
            return false;
        }
        self.time += self.speed * ticks;
        if self.time >= self.total as f32 {
            self.time = (self.total - 1) as f32;
            self.playing = false;
            return true;
        }
        false
    }

    pub fn frame(&self) -> u8 {
        (self.time.floor() as u8).min(self.total - 1)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_strips_split_the_imp_frames() {
        assert_eq!(JumpUp::frame_key(0), "imp_0");
        assert_eq!(JumpUp::frame_key(8), "imp_8");
        assert_eq!(Land::frame_key(0), "imp_9");
        assert_eq!(Land::frame_key(9), "imp_18");
        // out of range indices clamp to the last frame
        assert_eq!(Land::frame_key(40), "imp_18");
        assert_eq!(Strip::Dust.frame_key(24), "dust_24");
    }

    #[test]
    fn all_keys_lists_player_then_dust() {
        let keys = Strip::all_keys();
        assert_eq!(keys.len(), 19 + 25);
        assert_eq!(keys.first().map(String::as_str), Some("imp_0"));
        assert_eq!(keys[18], "imp_18");
        assert_eq!(keys.last().map(String::as_str), Some("dust_24"));
    }

    #[test]
    fn cursor_plays_once_and_holds_last_frame() {
        let mut cursor = JumpUp::cursor();
        let mut completed_at = None;
        for tick in 1..=40 {
            if cursor.tick(1.0) {
                completed_at = Some(tick);
            }
        }
        // 9 frames at half a frame per tick
        assert_eq!(completed_at, Some(18));
        assert_eq!(cursor.frame(), 8);
        assert!(!cursor.is_playing());
    }

    #[test]
    fn stopped_cursor_stays_on_first_frame() {
        let mut cursor = FrameCursor::stopped(JumpUp::COUNT, JumpUp::SPEED);
        assert!(!cursor.tick(10.0));
        assert_eq!(cursor.frame(), 0);
    }
}
