use zap_canvas::{App, CanvasError, EntityId, InputEvent, InputQueue, RenderTarget, Surface};

/// Generic runner that wires an app to a surface and a render target.
///
/// Each concrete app creates a `thread_local!` SurfaceRunner and exports free
/// functions via `#[wasm_bindgen]` (see [`export_app!`](crate::export_app)),
/// because wasm-bindgen cannot export generic structs directly.
pub struct SurfaceRunner<A: App, T: RenderTarget> {
    app: A,
    surface: Surface,
    input: InputQueue,
    target: T,
    initialized: bool,
}

impl<A: App, T: RenderTarget> SurfaceRunner<A, T> {
    pub fn new(app: A, target: T) -> Self {
        let surface = Surface::new(app.config());
        Self {
            app,
            surface,
            input: InputQueue::new(),
            target,
            initialized: false,
        }
    }

    /// Let the app attach its initial entities. Call once after construction.
    pub fn init(&mut self) {
        self.app.init(&mut self.surface);
        self.surface.refresh();
        self.initialized = true;
        log::debug!(
            "runner initialized on {} ({:?})",
            self.target.backend(),
            self.surface
        );
    }

    /// Queue an input event for the next frame.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one host frame: dispatch queued input, let the app update, then
    /// fire timers, tick tweens and render. Returns whether the host should
    /// schedule another frame.
    pub fn frame(&mut self, now: f64) -> bool {
        if !self.initialized {
            return false;
        }
        for event in self.input.drain() {
            self.surface.dispatch(event, now);
        }
        self.app.update(&mut self.surface, now);
        self.surface.frame(now, &mut self.target)
    }

    /// Attach an entity described by a JSON attribute bag.
    pub fn attach_from_json(&mut self, json: &str) -> Result<EntityId, CanvasError> {
        self.surface.attach_from_json(json)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
