use crate::assets::{self, Bundle, Textures};
use crate::browser;
use crate::choreography::{Cue, Director};
use crate::engine::input::InputState;
use crate::engine::{Game, Point, Rect, Renderer, Size, Sound, Transform};
use crate::scene::{self, PropKind, Scene};
use crate::sprite::player::Player;
use crate::sprite::Strip;
use crate::store::bridge::WindowBridge;
use crate::store::{self, Platform, StoreConfig};
use anyhow::{anyhow, Result};
use async_trait::async_trait;

// ==================== Asset keys ====================
const BACKGROUND: &str = "BG_seg";
const MUSIC: &str = "bg";
const JUMP_SOUND: &str = "jump";

/// TABLE
/// ┌────────────────────── Playable Ad Overview ─────────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐  update   ┌─────────────┐  tap/resize ┌───────────┐  │
/// │    │  engine.rs  ├──────────►│   game.rs   ├────────────►│ Director  │  │
/// │    │  GameLoop   │           │ PlayableAd  │◄────────────┤ (scripts) │  │
/// │    └─────────────┘           └──────┬──────┘    cues     └─────┬─────┘  │
/// │                                     │                          │        │
/// │                               ┌─────┴──────┐             ┌─────┴─────┐  │
/// │                               │ Sound /    │             │   Scene   │  │
/// │                               │ store::*   │             │  (world)  │  │
/// │                               └────────────┘             └───────────┘  │
/// │                                                                         │
/// ├──────────────────────── Call Sequence ──────────────────────────────────┤
/// │  1. InputState : resize first, then every tap goes to the Director      │
/// │  2. Director.update : tweens write into the Scene, next steps start     │
/// │  3. Cues : jump sound, store redirect                                   │
/// │  4. draw : sky, background, stripes, then the world layer at world_x    │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum PlayableAd {
    /// Bundles are still being decoded
    Loading,
    Loaded(Box<Showcase>),
}

impl PlayableAd {
    pub fn new() -> Self {
        PlayableAd::Loading
    }
}

impl Default for PlayableAd {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for PlayableAd {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            PlayableAd::Loading => {
                let images = assets::read_bundle(assets::IMAGE_BUNDLE)?;
                let audio = assets::read_bundle(assets::AUDIO_BUNDLE)?;
                let textures = assets::load_textures(&images, &texture_keys()).await;
                log::info!("Decoded {} textures", textures.len());

                let (width, height) = browser::fit_canvas_to_window()?;
                let scene = Scene::new(
                    Size::new(width, height),
                    |key| textures.get(key).size(),
                    textures.get(&Strip::JumpUp.frame_key(0)).size(),
                );

                let music = optional_sound(&audio, MUSIC);
                if let Some(music) = &music {
                    music.play_looping();
                }

                Ok(Box::new(PlayableAd::Loaded(Box::new(Showcase {
                    scene,
                    director: Director::new(),
                    textures,
                    jump_sound: optional_sound(&audio, JUMP_SOUND),
                    _music: music,
                    store: StoreLink::detect()?,
                }))))
            }
            PlayableAd::Loaded(_) => Err(anyhow!("Playable ad is already initialized")),
        }
    }

    fn update(&mut self, input: &InputState, dt: f32) {
        if let PlayableAd::Loaded(ad) = self {
            ad.update(input, dt);
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let PlayableAd::Loaded(ad) = self {
            ad.draw(renderer);
        }
    }
}

/// Everything the running ad owns
pub struct Showcase {
    scene: Scene,
    director: Director,
    textures: Textures,
    jump_sound: Option<Sound>,
    // held so the looping element outlives initialize
    _music: Option<Sound>,
    store: StoreLink,
}

impl Showcase {
    fn update(&mut self, input: &InputState, dt: f32) {
        if let Some((width, height)) = input.resized() {
            self.director.resize(&mut self.scene, Size::new(width, height));
        }
        for _ in 0..input.taps() {
            self.director.tap(&mut self.scene);
        }
        self.director.update(&mut self.scene, dt);

        for cue in self.director.drain_cues() {
            match cue {
                Cue::JumpSound => {
                    if let Some(sound) = &self.jump_sound {
                        sound.play_from_start();
                    }
                }
                Cue::OpenStore => self.store.open(),
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let screen = self.scene.screen();
        let full_screen = Rect::new(Point::default(), screen);
        renderer.clear(&full_screen, scene::SKY);
        renderer.draw_stretched(self.textures.get(BACKGROUND), &full_screen);
        for (stripe, color) in scene::stripes(screen) {
            renderer.fill_rect(&stripe, color);
        }

        // Draw order matters : props -> player -> dust -> rings
        renderer.with_offset(self.scene.world_x, |world| {
            for (kind, prop) in self.scene.props() {
                if kind == PropKind::Ball {
                    if let Some(shadow) = self.scene.shadow() {
                        let transform = Transform {
                            alpha: scene::SHADOW_ALPHA,
                            ..Transform::at(shadow.position)
                        };
                        world.fill_ellipse(&transform, shadow.radii, scene::SHADOW_COLOR);
                    }
                }
                let transform = Transform {
                    scale: prop.scale,
                    rotation: prop.rotation,
                    ..Transform::at(prop.position)
                };
                world.draw_texture(self.textures.get(kind.texture_key()), &transform);
            }

            let player = &self.scene.player;
            let transform = Transform {
                scale: Point::new(Player::SCALE, Player::SCALE),
                rotation: player.rotation(),
                ..Transform::at(player.position())
            };
            world.draw_texture(self.textures.get(&player.current_frame_name()), &transform);

            for puff in self.scene.puffs() {
                let transform = Transform {
                    scale: Point::new(scene::PUFF_SCALE, scene::PUFF_SCALE),
                    ..Transform::at(puff.position)
                };
                world.draw_texture(self.textures.get(&puff.frame_key()), &transform);
            }

            for ring in self.scene.rings() {
                let transform = Transform {
                    scale: Point::new(ring.scale, ring.scale),
                    alpha: ring.alpha,
                    ..Transform::at(ring.position)
                };
                world.stroke_circle(
                    &transform,
                    scene::RING_RADIUS,
                    scene::RING_LINE_WIDTH,
                    scene::RING_COLOR,
                );
            }
        });
    }
}

/// Where the final tap sends the player, resolved once at start-up
struct StoreLink {
    url: String,
    moloco: bool,
    bridge: WindowBridge,
}

impl StoreLink {
    fn detect() -> Result<Self> {
        let user_agent = browser::user_agent().unwrap_or_default();
        let platform = Platform::detect(
            browser::user_agent_data_platform().as_deref(),
            &user_agent,
        );
        let url = StoreConfig::embedded().url_for(platform).to_string();
        log::info!("Platform {:?}, store link {}", platform, url);
        Ok(StoreLink {
            url,
            moloco: store::is_moloco(&user_agent),
            bridge: WindowBridge::new()?,
        })
    }

    fn open(&self) {
        log::info!("{}", moloco_notice(self.moloco, &self.url));
        match store::open_store(&self.bridge, &self.url) {
            Ok(outcome) => log::info!("Store redirect : {:?}", outcome),
            Err(err) => log::error!("Could not open the store : {:#}", err),
        }
    }
}

/// Logged on every final tap, whatever the flag
fn moloco_notice(moloco: bool, url: &str) -> String {
    format!("[Moloco] isMoloco: {}, redirecting to {}", moloco, url)
}

fn optional_sound(bundle: &Bundle, key: &str) -> Option<Sound> {
    assets::load_sound(bundle, key)
        .map_err(|err| log::warn!("Playing without '{}' : {:#}", key, err))
        .ok()
}

/// Background, every prop, then player and dust frames
fn texture_keys() -> Vec<String> {
    let mut keys = vec![BACKGROUND.to_string()];
    for kind in PropKind::ALL {
        let key = kind.texture_key().to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.extend(Strip::all_keys());
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_keys_cover_props_and_strips() {
        let keys = texture_keys();
        for expected in ["BG_seg", "shelf", "ball", "arr", "imp_0", "imp_18", "dust_24"] {
            assert!(keys.iter().any(|key| key == expected), "missing {}", expected);
        }
        // the upper shelf reuses the shelf texture
        assert_eq!(keys.iter().filter(|key| *key == "shelf").count(), 1);
        assert_eq!(keys.len(), 1 + 9 + 19 + 25);
    }

    #[test]
    fn moloco_flag_is_reported_both_ways() {
        assert_eq!(
            moloco_notice(true, "https://play"),
            "[Moloco] isMoloco: true, redirecting to https://play"
        );
        assert_eq!(
            moloco_notice(false, "https://apple"),
            "[Moloco] isMoloco: false, redirecting to https://apple"
        );
    }
}
