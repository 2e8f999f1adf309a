use crate::engine::{Color, Point, Rect, Size};
use crate::sprite::player::Player;
use crate::sprite::{Dust, FrameCursor, FrameStrip};
use std::collections::HashMap;

pub const SKY: Color = Color(0x9BD0FF);
pub const SKY_SHADE: Color = Color(0x8BC6FF);
const STRIPE_WIDTH: f32 = 60.0;
// stripes stop where the floor starts
const WALL_FRACTION: f32 = 0.68;

const SHADOW_OFFSET: Point = Point::new(-20.0, -10.0);
pub const SHADOW_COLOR: Color = Color(0x000000);
pub const SHADOW_ALPHA: f32 = 0.15;

pub const RING_RADIUS: f32 = 40.0;
pub const RING_LINE_WIDTH: f32 = 2.0;
pub const RING_COLOR: Color = Color(0xFFFFFF);

pub const PUFF_SCALE: f32 = 0.7;

// distance from the shelf centre to where the player waits
const SHELF_STANDING_OFFSET: Point = Point::new(130.0, 10.0);

/// Furniture and toys, declared in draw order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    Shelf,
    Ball,
    Chair,
    Decor,
    Start,
    Skate,
    UpperShelf,
    Duck,
    Clock,
    Arrow,
}

impl PropKind {
    pub const ALL: [PropKind; 10] = [
        PropKind::Shelf,
        PropKind::Ball,
        PropKind::Chair,
        PropKind::Decor,
        PropKind::Start,
        PropKind::Skate,
        PropKind::UpperShelf,
        PropKind::Duck,
        PropKind::Clock,
        PropKind::Arrow,
    ];

    pub fn texture_key(self) -> &'static str {
        match self {
            PropKind::Shelf | PropKind::UpperShelf => "shelf",
            PropKind::Ball => "ball",
            PropKind::Chair => "chair",
            PropKind::Decor => "decor1",
            PropKind::Start => "start",
            PropKind::Skate => "skate",
            PropKind::Duck => "duck",
            PropKind::Clock => "clock",
            PropKind::Arrow => "arr",
        }
    }

    /// Centre position as fractions of the screen, the world is two screens wide
    fn anchor(self) -> (f32, f32) {
        match self {
            PropKind::Shelf => (0.2, 0.5),
            PropKind::Ball => (0.4, 0.8),
            PropKind::Chair => (0.6, 0.7),
            PropKind::Decor => (0.8, 0.75),
            PropKind::Start => (1.0, 0.45),
            PropKind::Skate => (1.2, 0.78),
            PropKind::UpperShelf => (1.8, 0.5),
            PropKind::Duck => (1.8, 0.425),
            PropKind::Clock => (2.0, 0.6),
            PropKind::Arrow => (2.0, 0.2),
        }
    }

    pub fn rest_scale(self) -> f32 {
        match self {
            PropKind::Shelf | PropKind::Ball => 1.0,
            _ => 0.8,
        }
    }

    fn layout(self, screen: Size) -> Point {
        let (x, y) = self.anchor();
        Point::new(screen.width * x, screen.height * y)
    }
}

/// Centre-anchored sprite in the world layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    pub position: Point,
    pub scale: Point,
    pub rotation: f32,
    texture_size: Size,
}

impl Prop {
    fn new(kind: PropKind, screen: Size, texture_size: Size) -> Self {
        let scale = kind.rest_scale();
        Prop {
            position: kind.layout(screen),
            scale: Point::new(scale, scale),
            rotation: 0.0,
            texture_size,
        }
    }

    pub fn size(&self) -> Size {
        self.texture_size.scaled(self.scale)
    }

    pub fn top(&self) -> f32 {
        self.position.y - self.size().height / 2.0
    }
}

/// Ellipse under the ball, follows its x while it rolls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub position: Point,
    pub radii: Size,
}

impl Shadow {
    fn under(ball: &Prop) -> Self {
        let size = ball.size();
        Shadow {
            position: Point::new(
                ball.position.x + SHADOW_OFFSET.x,
                ball.position.y + size.height / 2.0 + SHADOW_OFFSET.y,
            ),
            radii: Size::new(size.width * 0.6, size.height * 0.15),
        }
    }
}

/// Expanding white circle shown where a tap lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub id: u32,
    pub position: Point,
    pub scale: f32,
    pub alpha: f32,
}

/// One-shot dust animation at a landing spot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Puff {
    pub position: Point,
    cursor: FrameCursor,
}

impl Puff {
    pub fn frame_key(&self) -> String {
        Dust::frame_key(self.cursor.frame())
    }
}

/// A scalar in the scene a tween can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    WorldX,
    PlayerX,
    PlayerRotation,
    PropX(PropKind),
    PropRotation(PropKind),
    PropScaleX(PropKind),
    PropScaleY(PropKind),
    RingScale(u32),
    RingAlpha(u32),
}

/// Everything that moves
/// - screen layer : background, wallpaper (derived from `screen`)
/// - world layer  : props, shadow, player, puffs, rings, shifted by `world_x`
#[derive(Debug, Clone)]
pub struct Scene {
    screen: Size,
    pub world_x: f32,
    props: HashMap<PropKind, Prop>,
    shadow: Option<Shadow>,
    pub player: Player,
    rings: Vec<Ring>,
    next_ring_id: u32,
    puffs: Vec<Puff>,
}

impl Scene {
    /// `texture_size` maps a texture key to its natural size
    pub fn new(screen: Size, texture_size: impl Fn(&str) -> Size, player_texture: Size) -> Self {
        let props: HashMap<PropKind, Prop> = PropKind::ALL
            .into_iter()
            .map(|kind| (kind, Prop::new(kind, screen, texture_size(kind.texture_key()))))
            .collect();
        let shadow = props.get(&PropKind::Ball).map(Shadow::under);

        let mut player = Player::new(Point::default(), player_texture);
        if let Some(shelf) = props.get(&PropKind::Shelf) {
            player.set_position(Point::new(
                shelf.position.x + SHELF_STANDING_OFFSET.x,
                shelf.top() - player.size().height / 2.0 + SHELF_STANDING_OFFSET.y,
            ));
        }

        Scene {
            screen,
            world_x: 0.0,
            props,
            shadow,
            player,
            rings: Vec::new(),
            next_ring_id: 0,
            puffs: Vec::new(),
        }
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    pub fn prop(&self, kind: PropKind) -> Option<&Prop> {
        self.props.get(&kind)
    }

    /// Props still in the world, in draw order
    pub fn props(&self) -> impl Iterator<Item = (PropKind, &Prop)> {
        PropKind::ALL
            .into_iter()
            .filter_map(move |kind| self.props.get(&kind).map(|prop| (kind, prop)))
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.shadow.as_ref()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn puffs(&self) -> &[Puff] {
        &self.puffs
    }

    /// Where the player stands on top of `kind`, before any per-jump offset
    pub fn standing_on(&self, kind: PropKind) -> Option<Point> {
        self.prop(kind).map(|prop| {
            Point::new(
                prop.position.x,
                prop.top() - self.player.size().height / 2.0,
            )
        })
    }

    /// The resting spot on the first shelf
    pub fn shelf_spot(&self) -> Option<Point> {
        self.standing_on(PropKind::Shelf)
            .map(|spot| Point::new(spot.x + SHELF_STANDING_OFFSET.x, spot.y + SHELF_STANDING_OFFSET.y))
    }

    pub fn remove_prop(&mut self, kind: PropKind) {
        self.props.remove(&kind);
        if kind == PropKind::Ball {
            self.shadow = None;
        }
    }

    pub fn spawn_ring(&mut self, position: Point) -> u32 {
        let id = self.next_ring_id;
        self.next_ring_id += 1;
        self.rings.push(Ring {
            id,
            position,
            scale: 1.0,
            alpha: 1.0,
        });
        id
    }

    pub fn remove_ring(&mut self, id: u32) {
        self.rings.retain(|ring| ring.id != id);
    }

    pub fn spawn_puff(&mut self, position: Point) {
        self.puffs.push(Puff {
            position,
            cursor: Dust::cursor(),
        });
    }

    pub fn get(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::WorldX => Some(self.world_x),
            Channel::PlayerX => Some(self.player.position().x),
            Channel::PlayerRotation => Some(self.player.rotation()),
            Channel::PropX(kind) => self.prop(kind).map(|prop| prop.position.x),
            Channel::PropRotation(kind) => self.prop(kind).map(|prop| prop.rotation),
            Channel::PropScaleX(kind) => self.prop(kind).map(|prop| prop.scale.x),
            Channel::PropScaleY(kind) => self.prop(kind).map(|prop| prop.scale.y),
            Channel::RingScale(id) => self.ring(id).map(|ring| ring.scale),
            Channel::RingAlpha(id) => self.ring(id).map(|ring| ring.alpha),
        }
    }

    /// Writes to an entity that is already gone are dropped
    pub fn set(&mut self, channel: Channel, value: f32) {
        match channel {
            Channel::WorldX => self.world_x = value,
            Channel::PlayerX => {
                let position = self.player.position();
                self.player.set_position(Point::new(value, position.y));
            }
            Channel::PlayerRotation => self.player.set_rotation(value),
            Channel::PropX(kind) => {
                if let Some(prop) = self.props.get_mut(&kind) {
                    prop.position.x = value;
                }
                if kind == PropKind::Ball {
                    if let Some(shadow) = self.shadow.as_mut() {
                        shadow.position.x = value + SHADOW_OFFSET.x;
                    }
                }
            }
            Channel::PropRotation(kind) => {
                if let Some(prop) = self.props.get_mut(&kind) {
                    prop.rotation = value;
                }
            }
            Channel::PropScaleX(kind) => {
                if let Some(prop) = self.props.get_mut(&kind) {
                    prop.scale.x = value;
                }
            }
            Channel::PropScaleY(kind) => {
                if let Some(prop) = self.props.get_mut(&kind) {
                    prop.scale.y = value;
                }
            }
            Channel::RingScale(id) => {
                if let Some(ring) = self.rings.iter_mut().find(|ring| ring.id == id) {
                    ring.scale = value;
                }
            }
            Channel::RingAlpha(id) => {
                if let Some(ring) = self.rings.iter_mut().find(|ring| ring.id == id) {
                    ring.alpha = value;
                }
            }
        }
    }

    /// One 60 Hz tick of sprite animation
    pub fn tick(&mut self) {
        self.player.update();
        for puff in self.puffs.iter_mut() {
            puff.cursor.tick(1.0);
        }
        self.puffs.retain(|puff| puff.cursor.is_playing());
    }

    /// Props go back to their layout positions for the new screen size,
    /// the player is left where it is
    pub fn relayout(&mut self, screen: Size) {
        self.screen = screen;
        for (kind, prop) in self.props.iter_mut() {
            prop.position = kind.layout(screen);
        }
        self.shadow = self.props.get(&PropKind::Ball).map(Shadow::under);
    }

    fn ring(&self, id: u32) -> Option<&Ring> {
        self.rings.iter().find(|ring| ring.id == id)
    }
}

/// Alternating vertical wallpaper stripes over the top of the screen
pub fn stripes(screen: Size) -> Vec<(Rect, Color)> {
    let height = screen.height * WALL_FRACTION;
    let count = (screen.width / STRIPE_WIDTH).ceil().max(0.0) as usize;
    (0..count)
        .map(|i| {
            let color = if i % 2 == 0 { SKY } else { SKY_SHADE };
            let rect = Rect::new(
                Point::new(i as f32 * STRIPE_WIDTH, 0.0),
                Size::new(STRIPE_WIDTH, height),
            );
            (rect, color)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scene() -> Scene {
        Scene::new(Size::new(800.0, 600.0), |_| Size::new(100.0, 100.0), Size::new(100.0, 100.0))
    }

    #[test]
    fn props_follow_screen_fractions() {
        let scene = scene();
        assert_eq!(scene.prop(PropKind::Shelf).unwrap().position, Point::new(160.0, 300.0));
        assert_eq!(scene.prop(PropKind::Ball).unwrap().position, Point::new(320.0, 480.0));
        assert_eq!(scene.prop(PropKind::Clock).unwrap().position, Point::new(1600.0, 360.0));
        assert_eq!(scene.prop(PropKind::Chair).unwrap().size(), Size::new(80.0, 80.0));
        assert_eq!(scene.props().count(), PropKind::ALL.len());
    }

    #[test]
    fn player_starts_on_the_shelf() {
        let scene = scene();
        // shelf top 250, player 70 tall
        assert_eq!(scene.player.position(), Point::new(290.0, 225.0));
        assert_eq!(scene.shelf_spot(), Some(scene.player.position()));
    }

    #[test]
    fn shadow_sits_under_ball_and_follows_it() {
        let mut scene = scene();
        let shadow = *scene.shadow().unwrap();
        assert_eq!(shadow.position, Point::new(300.0, 520.0));
        assert_abs_diff_eq!(shadow.radii.width, 60.0, epsilon = 1e-4);
        assert_abs_diff_eq!(shadow.radii.height, 15.0, epsilon = 1e-4);

        scene.set(Channel::PropX(PropKind::Ball), 100.0);
        assert_abs_diff_eq!(scene.shadow().unwrap().position.x, 80.0);

        scene.remove_prop(PropKind::Ball);
        assert!(scene.shadow().is_none());
        assert_eq!(scene.get(Channel::PropX(PropKind::Ball)), None);
        // writes to the removed ball are dropped
        scene.set(Channel::PropX(PropKind::Ball), 5.0);
        assert!(scene.prop(PropKind::Ball).is_none());
    }

    #[test]
    fn rings_are_addressed_by_id() {
        let mut scene = scene();
        let first = scene.spawn_ring(Point::new(1.0, 1.0));
        let second = scene.spawn_ring(Point::new(2.0, 2.0));
        assert_ne!(first, second);

        scene.set(Channel::RingAlpha(second), 0.25);
        assert_eq!(scene.get(Channel::RingAlpha(second)), Some(0.25));
        assert_eq!(scene.get(Channel::RingAlpha(first)), Some(1.0));

        scene.remove_ring(first);
        assert_eq!(scene.rings().len(), 1);
        assert_eq!(scene.get(Channel::RingScale(first)), None);
    }

    #[test]
    fn puffs_disappear_when_dust_strip_ends() {
        let mut scene = scene();
        scene.spawn_puff(Point::new(0.0, 0.0));
        assert_eq!(scene.puffs()[0].frame_key(), "dust_0");
        for _ in 0..41 {
            scene.tick();
        }
        assert_eq!(scene.puffs().len(), 1);
        scene.tick();
        assert!(scene.puffs().is_empty());
    }

    #[test]
    fn relayout_moves_props_but_not_player() {
        let mut scene = scene();
        let before = scene.player.position();
        scene.set(Channel::PropX(PropKind::Skate), 5.0);
        scene.relayout(Size::new(1000.0, 500.0));

        assert_eq!(scene.prop(PropKind::Skate).unwrap().position, Point::new(1200.0, 390.0));
        assert_eq!(scene.screen(), Size::new(1000.0, 500.0));
        assert_eq!(scene.player.position(), before);
    }

    #[test]
    fn stripes_alternate_and_cover_the_width() {
        let stripes = stripes(Size::new(130.0, 100.0));
        assert_eq!(stripes.len(), 3);
        assert_eq!(stripes[0].1, SKY);
        assert_eq!(stripes[1].1, SKY_SHADE);
        assert_eq!(stripes[2].0.position.x, 120.0);
        assert_abs_diff_eq!(stripes[0].0.size.height, 68.0, epsilon = 1e-4);
    }
}
