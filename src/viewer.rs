//! The window: winit event loop, softbuffer presentation, input and frame pacing.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use rand::Rng;
use softbuffer::{Context as SoftContext, Surface};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::WindowConfig;
use crate::extract::ColorExtractor;
use crate::shell::{AppShell, Navigation};
use crate::ui::Renderer;
use crate::ui::layout::Layout;

type WindowHandle = Arc<Window>;

/// Opens the window and runs until it is closed.
pub fn run<E: ColorExtractor, R: Rng>(
    shell: AppShell<E, R>,
    renderer: Renderer,
    window: WindowConfig,
    frame_interval: Duration,
) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = ViewerApp::new(shell, renderer, window, frame_interval);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with an error")?;
    if let Some(err) = app.fatal.take() {
        return Err(err);
    }
    Ok(())
}

struct ViewerApp<E, R> {
    shell: AppShell<E, R>,
    renderer: Renderer,
    config: WindowConfig,
    frame_interval: Duration,
    window: Option<WindowHandle>,
    context: Option<SoftContext<WindowHandle>>,
    surface: Option<Surface<WindowHandle, WindowHandle>>,
    scale_factor: f32,
    cursor: Option<PhysicalPosition<f64>>,
    next_frame: Instant,
    mounted: bool,
    fatal: Option<anyhow::Error>,
}

impl<E: ColorExtractor, R: Rng> ViewerApp<E, R> {
    fn new(
        shell: AppShell<E, R>,
        renderer: Renderer,
        config: WindowConfig,
        frame_interval: Duration,
    ) -> Self {
        Self {
            shell,
            renderer,
            config,
            frame_interval,
            window: None,
            context: None,
            surface: None,
            scale_factor: 1.0,
            cursor: None,
            next_frame: Instant::now(),
            mounted: false,
            fatal: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_some() {
            return Ok(());
        }

        let mut attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_active(true);
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = WindowHandle::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let context = SoftContext::new(window.clone())
            .map_err(|err| anyhow!("{err}"))
            .context("failed to create softbuffer context")?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow!("{err}"))
            .context("failed to create softbuffer surface")?;

        self.context = Some(context);
        self.surface = Some(surface);
        self.scale_factor = window.scale_factor() as f32;
        let size = window.inner_size();
        self.window = Some(window);
        self.handle_resize(size);
        info!(
            width = size.width,
            height = size.height,
            scale = self.scale_factor,
            "window opened"
        );
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(surface) = self.surface.as_mut()
            && let (Some(width), Some(height)) = (
                NonZeroU32::new(size.width.max(1)),
                NonZeroU32::new(size.height.max(1)),
            )
        {
            if let Err(err) = surface.resize(width, height) {
                warn!(error = %err, "failed to resize surface");
            }
            self.request_redraw();
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn navigate(&mut self, direction: Navigation) {
        self.shell.navigate(direction, Instant::now());
        self.request_redraw();
    }

    fn handle_click(&mut self) {
        let (Some(window), Some(cursor)) = (self.window.as_ref(), self.cursor) else {
            return;
        };
        let layout = Layout::for_surface(window.inner_size().width, self.scale_factor);
        if let Some(direction) = layout.hit_test(cursor.x as f32, cursor.y as f32) {
            self.navigate(direction);
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::ArrowLeft) => self.navigate(Navigation::Backward),
            Key::Named(NamedKey::ArrowRight) => self.navigate(Navigation::Forward),
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character(c) if c.eq_ignore_ascii_case("q") => event_loop.exit(),
            _ => {}
        }
    }

    fn render(&mut self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let frame = self
            .renderer
            .render(&self.shell, width, height, self.scale_factor, Instant::now());

        match surface.buffer_mut() {
            Ok(mut buffer) => {
                if buffer.len() != frame.pixels().len() {
                    debug!("surface size changed mid-frame; skipping");
                    return;
                }
                buffer.copy_from_slice(frame.pixels());
                if let Err(err) = buffer.present() {
                    warn!(error = %err, "failed to present frame");
                }
            }
            Err(err) => warn!(error = %err, "failed to acquire frame buffer"),
        }
    }
}

impl<E: ColorExtractor, R: Rng> ApplicationHandler for ViewerApp<E, R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.ensure_window(event_loop) {
            error!(error = %err, "cannot open window");
            self.fatal = Some(err);
            event_loop.exit();
            return;
        }
        if !self.mounted {
            self.shell.mount(Instant::now());
            self.mounted = true;
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if self.mounted {
            self.shell.unmount(Instant::now());
            self.mounted = false;
            debug!("background paused");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => event_loop.exit(),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor as f32;
                self.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.render(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.shell.tick(now);
        if now >= self.next_frame {
            self.request_redraw();
            self.next_frame = now + self.frame_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}
