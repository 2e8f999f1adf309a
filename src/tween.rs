use crate::engine::Point;
use std::f32::consts::PI;

/// Easing curves used by the choreography
///
/// ```text
///  value
///  1 ┤            ╭──── Power*Out    : fast start, soft landing
///    │        ╭──╯
///    │     ╭─╯  ╭────── Power1InOut  : soft at both ends
///    │   ╭╯   ╭╯
///    │  ╭╯  ╭╯  ╭────── Power2In     : slow start, hard stop
///  0 ┼──┴───┴───┴────► t
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    Power1Out,
    Power1InOut,
    Power2In,
    Power2Out,
    /// overshoots `1.0` and rings back, `amplitude >= 1` widens the swing
    ElasticOut { amplitude: f32, period: f32 },
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t).powi(2),
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::Power2In => t.powi(3),
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::ElasticOut { amplitude, period } => {
                if t >= 1.0 {
                    return 1.0;
                }
                let amplitude_clamped = amplitude.max(1.0);
                let period = period / amplitude.min(1.0);
                let phase = period / (2.0 * PI) * (1.0 / amplitude_clamped).asin();
                let frequency = 2.0 * PI / period;
                amplitude_clamped * 2f32.powf(-10.0 * t) * ((t - phase) * frequency).sin() + 1.0
            }
        }
    }
}

/// Single scalar animation from `from` to `to`
///
/// - `delay`    : seconds before the value starts moving
/// - `duration` : seconds spent moving once started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    delay: f32,
    duration: f32,
    ease: Ease,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Tween {
            from,
            to,
            delay: 0.0,
            duration: duration.max(0.0),
            ease,
            elapsed: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn to(&self) -> f32 {
        self.to
    }

    /// Steps the clock by `dt` seconds
    /// - `None` while still waiting out the delay
    /// - `Some(value)` once the tween is live (including the final frame)
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        let active = self.elapsed - self.delay;
        if active < 0.0 {
            return None;
        }
        if self.duration <= 0.0 {
            return Some(self.to);
        }
        let progress = (active / self.duration).min(1.0);
        Some(self.from + (self.to - self.from) * self.ease.apply(progress))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }

    /// Total seconds from spawn to the final value
    pub fn span(&self) -> f32 {
        self.delay + self.duration
    }
}

/// Three point hop used for every character jump
///
/// ```text
///            apex (t = 0.5)
///          ╭──●──╮
///        ╭╯       ╰╮
///  start ●          ● end
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpArc {
    pub start: Point,
    pub apex: Point,
    pub end: Point,
}

impl JumpArc {
    /// Apex sits at the horizontal midpoint, `height` pixels above the start
    pub fn between(start: Point, end: Point, height: f32) -> Self {
        JumpArc {
            start,
            apex: Point::new((start.x + end.x) / 2.0, start.y - height),
            end,
        }
    }

    pub fn at(&self, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        // quadratic bezier whose control point makes the curve cross the apex at t = 0.5
        let control = Point::new(
            2.0 * self.apex.x - (self.start.x + self.end.x) / 2.0,
            2.0 * self.apex.y - (self.start.y + self.end.y) / 2.0,
        );
        let u = 1.0 - t;
        Point::new(
            u * u * self.start.x + 2.0 * u * t * control.x + t * t * self.end.x,
            u * u * self.start.y + 2.0 * u * t * control.y + t * t * self.end.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL_EASES: [Ease; 6] = [
        Ease::Linear,
        Ease::Power1Out,
        Ease::Power1InOut,
        Ease::Power2In,
        Ease::Power2Out,
        Ease::ElasticOut {
            amplitude: 1.0,
            period: 0.4,
        },
    ];

    #[test]
    fn eases_pin_both_endpoints() {
        for ease in ALL_EASES {
            assert_abs_diff_eq!(ease.apply(0.0), 0.0, epsilon = 1e-3);
            assert_abs_diff_eq!(ease.apply(1.0), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn power_curves_bend_the_right_way() {
        assert!(Ease::Power1Out.apply(0.25) > 0.25);
        assert!(Ease::Power2Out.apply(0.25) > Ease::Power1Out.apply(0.25));
        assert!(Ease::Power2In.apply(0.25) < 0.25);
        assert_abs_diff_eq!(Ease::Power1InOut.apply(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn elastic_out_overshoots_before_settling() {
        let ease = Ease::ElasticOut {
            amplitude: 1.0,
            period: 0.4,
        };
        let peak = (1..100)
            .map(|i| ease.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn tween_holds_during_delay_then_moves() {
        let mut tween = Tween::new(1.0, 0.0, 0.4, Ease::Linear).with_delay(0.1);
        assert_eq!(tween.advance(0.05), None);
        let value = tween.advance(0.25).expect("tween should be live");
        assert_abs_diff_eq!(value, 0.5, epsilon = 1e-5);
        assert!(!tween.is_finished());
        assert_abs_diff_eq!(tween.advance(1.0).unwrap(), 0.0);
        assert!(tween.is_finished());
        assert_abs_diff_eq!(tween.span(), 0.5);
    }

    #[test]
    fn zero_duration_tween_snaps() {
        let mut tween = Tween::new(3.0, 7.0, 0.0, Ease::Power2In);
        assert_eq!(tween.advance(0.0), Some(7.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn jump_arc_crosses_apex_at_midpoint() {
        let arc = JumpArc::between(Point::new(0.0, 400.0), Point::new(200.0, 300.0), 150.0);
        assert_eq!(arc.apex, Point::new(100.0, 250.0));

        let mid = arc.at(0.5);
        assert_abs_diff_eq!(mid.x, 100.0, epsilon = 1e-4);
        assert_abs_diff_eq!(mid.y, 250.0, epsilon = 1e-4);
        assert_eq!(arc.at(0.0), arc.start);
        assert_eq!(arc.at(1.0), arc.end);
    }
}
