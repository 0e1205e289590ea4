use anyhow::{anyhow, Context, Result};
use glam::Mat4;
use glow::HasContext;
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{Display, GetGlDisplay, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{
    env,
    ffi::{c_void, CString},
    num::NonZeroU32,
    path::PathBuf,
    ptr,
    sync::Arc,
};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use playground::{
    config::{default_config_path, Backend, PlaygroundConfig},
    render::{load_shaders, Camera, GlDriver, GlowDriver, ShaderProgram, TriangleRenderer},
};

/// The linked program, for whichever backend the config selected.
enum LoadedProgram {
    Glow(ShaderProgram<GlowDriver>),
    Gl(ShaderProgram<GlDriver>),
}

impl LoadedProgram {
    fn load(config: &PlaygroundConfig, gl: &Arc<glow::Context>, display: &Display) -> Result<Self> {
        let vertex = config.shaders.vertex_for(config.render.transform);
        let fragment = &config.shaders.fragment;

        let program = match config.render.backend {
            Backend::Glow => {
                let driver = unsafe { GlowDriver::new(gl.clone()) };
                load_shaders(&driver, vertex, fragment).map(Self::Glow)
            }
            Backend::Gl => {
                let driver = unsafe { GlDriver::load_with(|symbol| proc_address(display, symbol)) };
                load_shaders(&driver, vertex, fragment).map(Self::Gl)
            }
        };

        program.with_context(|| format!("Failed to load shaders {} + {}", vertex, fragment))
    }

    fn draw(&mut self, triangle: &TriangleRenderer, mvp: Option<&Mat4>) {
        match self {
            Self::Glow(program) => triangle.draw(program, mvp),
            Self::Gl(program) => triangle.draw(program, mvp),
        }
    }
}

fn proc_address(display: &Display, symbol: &str) -> *const c_void {
    CString::new(symbol)
        .map(|symbol| display.get_proc_address(&symbol))
        .unwrap_or(ptr::null())
}

// Field order matters: GL objects are released before the context goes away.
struct App {
    program: LoadedProgram,
    triangle: TriangleRenderer,
    camera: Camera,
    transform: bool,
    gl: Arc<glow::Context>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

impl App {
    fn new(config: &PlaygroundConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoopBuilder::new()
            .build()
            .map_err(|e| anyhow!("Failed to create event loop: {}", e))?;
        let window_builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        let mut template = ConfigTemplateBuilder::new().with_depth_size(24);
        if config.window.samples > 0 {
            template = template.with_multisampling(config.window.samples);
        }

        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("glutin offers at least one config")
            })
            .map_err(|e| anyhow!("Failed to open window: {}", e))?;
        let window = window.context("Display builder returned no window")?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create an OpenGL 3.3 core context")?;

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("Failed to create GL surface")?;
        let gl_context = not_current
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        if config.window.vsync {
            let interval = SwapInterval::Wait(NonZeroU32::MIN);
            if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
                warn!("Could not enable vsync: {}", e);
            }
        }

        let gl = Arc::new(unsafe {
            glow::Context::from_loader_function(|symbol| proc_address(&gl_display, symbol))
        });
        info!("Renderer: {}", unsafe { gl.get_parameter_string(glow::RENDERER) });

        let [r, g, b, a] = config.render.clear_color;
        unsafe { gl.clear_color(r, g, b, a) };

        let triangle = TriangleRenderer::new(gl.clone())?;
        let program = LoadedProgram::load(config, &gl, &gl_display)?;
        let camera = Camera::from_config(&config.camera, config.window.aspect_ratio());

        Ok((
            Self {
                program,
                triangle,
                camera,
                transform: config.render.transform,
                gl,
                gl_surface,
                gl_context,
                window,
            },
            event_loop,
        ))
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.gl_surface.resize(&self.gl_context, w, h);
            unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
            self.camera.set_viewport(width, height);
        }
    }

    fn render(&mut self) {
        unsafe {
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        let mvp = self.transform.then(|| self.camera.mvp(Mat4::IDENTITY));
        self.program.draw(&self.triangle, mvp.as_ref());

        if let Err(e) = self.gl_surface.swap_buffers(&self.gl_context) {
            error!("Failed to swap buffers: {}", e);
        }
    }
}

fn is_quit_key(key: &Key) -> bool {
    match key {
        Key::Named(NamedKey::Escape) => true,
        Key::Character(c) => c.as_str() == ";",
        _ => false,
    }
}

fn load_config() -> Result<PlaygroundConfig> {
    match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => PlaygroundConfig::load(path),
        None => PlaygroundConfig::load_or_create(default_config_path()?),
    }
}

fn main() -> Result<()> {
    let config = load_config()?;
    SimpleLogger::new().with_level(config.log_level()?).init()?;
    info!("Initializing playground ({:?} backend)", config.render.backend);

    let (mut app, event_loop) = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } if is_quit_key(&logical_key) => elwt.exit(),
                WindowEvent::Resized(size) => app.resize(size.width, size.height),
                WindowEvent::RedrawRequested => app.render(),
                _ => (),
            },
            Event::AboutToWait => app.window.request_redraw(),
            _ => (),
        })
        .map_err(|e| anyhow!("Event loop failed: {}", e))?;

    info!("Bye");
    Ok(())
}
