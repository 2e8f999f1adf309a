use crate::browser;
use anyhow::{anyhow, Error, Result};
// wasm is single threaded, so Rc RefCell over Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref : cast from Javascript type to Rust type
    // - we create the closures ourselves, so the expected type is known
    JsCast,
    JsValue,
};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

use self::input::InputState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &InputState, dt: f32);
    fn draw(&mut self, renderer: &Renderer);
}

// length of a frame in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// after a backgrounded tab resumes, drop the backlog instead of replaying it
const MAX_ACCUMULATED_DELTA: f32 = FRAME_SIZE * 15.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut game = game.initialize().await?;
        // taps before the assets are ready are not queued
        let mut events = input::prepare_input()?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer::new(browser::context()?);
        let mut input_state = InputState::default();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut input_state, &mut events);

            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            game_loop.accumulated_delta = game_loop.accumulated_delta.min(MAX_ACCUMULATED_DELTA);
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&input_state, FRAME_SIZE / 1000.0);
                // taps and resizes are consumed by the first fixed step
                input_state.clear();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    log::error!("GameLoop stopped : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }

    pub fn scaled(self, scale: Point) -> Self {
        Size {
            width: self.width * scale.x,
            height: self.height * scale.y,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }
}

/// 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub fn css(self) -> String {
        format!("#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

/// Placement of a centre-anchored drawable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point,
    pub scale: Point,
    pub rotation: f32,
    pub alpha: f32,
}

impl Transform {
    pub fn at(position: Point) -> Self {
        Transform {
            position,
            scale: Point::new(1.0, 1.0),
            rotation: 0.0,
            alpha: 1.0,
        }
    }
}

/// Decoded image, `None` when the source failed to decode
#[derive(Debug, Clone)]
pub struct Texture {
    element: Option<HtmlImageElement>,
}

impl Texture {
    pub fn new(element: HtmlImageElement) -> Self {
        Texture {
            element: Some(element),
        }
    }

    pub fn empty() -> Self {
        Texture { element: None }
    }

    pub fn size(&self) -> Size {
        self.element
            .as_ref()
            .map(|image| Size::new(image.natural_width() as f32, image.natural_height() as f32))
            .unwrap_or_default()
    }
}

impl Default for Texture {
    fn default() -> Self {
        Texture::empty()
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    pub fn clear(&self, rect: &Rect, color: Color) {
        self.context.clear_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
        self.fill_rect(rect, color);
    }

    pub fn fill_rect(&self, rect: &Rect, color: Color) {
        self.context.set_fill_style_str(&color.css());
        self.context.fill_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    /// Horizontal camera offset applied to everything drawn inside `f`
    pub fn with_offset(&self, offset_x: f32, f: impl FnOnce(&Renderer)) {
        self.context.save();
        match self.context.translate(offset_x.into(), 0.0) {
            Ok(()) => f(self),
            Err(err) => log::error!("Camera offset failed : {:#?}", err),
        }
        self.context.restore();
    }

    pub fn draw_stretched(&self, texture: &Texture, destination: &Rect) {
        let Some(image) = texture.element.as_ref() else {
            return;
        };
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                destination.position.x.into(),
                destination.position.y.into(),
                destination.size.width.into(),
                destination.size.height.into(),
            )
        {
            log::error!("draw_stretched failed : {:#?}", err);
        }
    }

    /// Draws `texture` centred on `transform.position`
    pub fn draw_texture(&self, texture: &Texture, transform: &Transform) {
        let Some(image) = texture.element.as_ref() else {
            return;
        };
        let size = texture.size();
        self.with_transform(transform, |context| {
            context.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                (-size.width / 2.0).into(),
                (-size.height / 2.0).into(),
                size.width.into(),
                size.height.into(),
            )
        });
    }

    pub fn fill_ellipse(&self, transform: &Transform, radii: Size, color: Color) {
        self.with_transform(transform, |context| {
            context.begin_path();
            context.ellipse(
                0.0,
                0.0,
                radii.width.into(),
                radii.height.into(),
                0.0,
                0.0,
                std::f64::consts::TAU,
            )?;
            context.set_fill_style_str(&color.css());
            context.fill();
            Ok(())
        });
    }

    pub fn stroke_circle(&self, transform: &Transform, radius: f32, line_width: f32, color: Color) {
        self.with_transform(transform, |context| {
            context.begin_path();
            context.arc(0.0, 0.0, radius.into(), 0.0, std::f64::consts::TAU)?;
            // keep the stroke width constant while the ring grows
            let scale = transform.scale.x.max(f32::EPSILON);
            context.set_line_width((line_width / scale).into());
            context.set_stroke_style_str(&color.css());
            context.stroke();
            Ok(())
        });
    }

    fn with_transform(
        &self,
        transform: &Transform,
        draw: impl FnOnce(&CanvasRenderingContext2d) -> Result<(), JsValue>,
    ) {
        let context = &self.context;
        context.save();
        context.set_global_alpha(transform.alpha.clamp(0.0, 1.0).into());
        let result = context
            .translate(transform.position.x.into(), transform.position.y.into())
            .and_then(|_| context.rotate(transform.rotation.into()))
            .and_then(|_| context.scale(transform.scale.x.into(), transform.scale.y.into()))
            .and_then(|_| draw(context));
        if let Err(err) = result {
            log::error!("Drawing failed : {:#?}", err);
        }
        context.restore();
    }
}

/// Asynchronously load an image from a given source path or data url
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // Result<Result<(), Error>, oneshot::Canceled>
    // - first ? : channel result
    // - second ? : image load result
    rx.await??;

    Ok(image)
}

/// HTMLAudioElement wrapper, every sound plays at the same volume
#[derive(Debug, Clone)]
pub struct Sound {
    element: HtmlAudioElement,
}

impl Sound {
    const VOLUME: f64 = 0.7;

    pub fn new(source: &str) -> Result<Self> {
        let element = HtmlAudioElement::new_with_src(source)
            .map_err(|err| anyhow!("Could not create audio element : {:#?}", err))?;
        element.set_volume(Self::VOLUME);
        Ok(Sound { element })
    }

    /// Rewinds and plays, used for one-shot effects
    pub fn play_from_start(&self) {
        self.element.set_current_time(0.0);
        self.play_detached();
    }

    /// Loops forever; if autoplay is blocked, retry on the first body click
    pub fn play_looping(&self) {
        self.element.set_loop(true);
        let element = self.element.clone();
        browser::spawn_local(async move {
            if Self::play(&element).await.is_ok() {
                return;
            }
            log::info!("Autoplay blocked, music waits for the first click");
            let retry = element.clone();
            let registered = browser::body().and_then(|body| {
                browser::add_listener_once(&body, "click", move || {
                    browser::spawn_local(async move {
                        if let Err(err) = Self::play(&retry).await {
                            log::warn!("Music still blocked : {:#}", err);
                        }
                    });
                })
            });
            if let Err(err) = registered {
                log::warn!("Could not schedule music retry : {:#}", err);
            }
        });
    }

    fn play_detached(&self) {
        let element = self.element.clone();
        browser::spawn_local(async move {
            if let Err(err) = Self::play(&element).await {
                log::debug!("Sound did not play : {:#}", err);
            }
        });
    }

    async fn play(element: &HtmlAudioElement) -> Result<()> {
        let promise = element
            .play()
            .map_err(|err| anyhow!("play() threw : {:#?}", err))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| anyhow!("play() rejected : {:#?}", err))
    }
}

pub mod input {
    //! Pointer and resize events, queued by DOM listeners and drained once per frame
    use crate::browser;
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use wasm_bindgen::JsCast;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum InputEvent {
        PointerDown { x: f32, y: f32 },
        Resize { width: f32, height: f32 },
    }

    /// Everything that happened since the last fixed update
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct InputState {
        taps: u32,
        resized: Option<(f32, f32)>,
    }

    impl InputState {
        pub fn record(&mut self, event: InputEvent) {
            match event {
                InputEvent::PointerDown { .. } => self.taps += 1,
                InputEvent::Resize { width, height } => self.resized = Some((width, height)),
            }
        }

        pub fn taps(&self) -> u32 {
            self.taps
        }

        /// Latest size wins when several resizes land in one frame
        pub fn resized(&self) -> Option<(f32, f32)> {
            self.resized
        }

        pub fn clear(&mut self) {
            *self = InputState::default();
        }
    }

    pub fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
        let (pointer_tx, rx) = unbounded();
        let resize_tx = pointer_tx.clone();

        let on_pointer_down = browser::closure_wrap(Box::new(move |event: web_sys::PointerEvent| {
            let _ = pointer_tx.unbounded_send(InputEvent::PointerDown {
                x: event.offset_x() as f32,
                y: event.offset_y() as f32,
            });
        }) as Box<dyn FnMut(web_sys::PointerEvent)>);

        let on_resize = browser::closure_wrap(Box::new(move |_event: web_sys::Event| {
            match browser::fit_canvas_to_window() {
                Ok((width, height)) => {
                    let _ = resize_tx.unbounded_send(InputEvent::Resize { width, height });
                }
                Err(err) => log::warn!("Resize ignored : {:#}", err),
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        browser::canvas()?
            .add_event_listener_with_callback("pointerdown", on_pointer_down.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for pointerdown : {:#?}", err))?;
        browser::window()?
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for resize : {:#?}", err))?;

        // listeners live as long as the page
        on_pointer_down.forget();
        on_resize.forget();

        Ok(rx)
    }

    pub fn process_input(state: &mut InputState, events: &mut UnboundedReceiver<InputEvent>) {
        // Ok(Some) : event waiting, Ok(None) : channel closed, Err : queue empty
        while let Ok(Some(event)) = events.try_next() {
            state.record(event);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_render_as_css_hex() {
        assert_eq!(Color(0x9BD0FF).css(), "#9BD0FF");
        assert_eq!(Color(0x000000).css(), "#000000");
    }

    #[test]
    fn size_scales_per_axis() {
        let size = Size::new(100.0, 40.0).scaled(Point::new(0.8, 0.5));
        assert_eq!(size, Size::new(80.0, 20.0));
    }
}
