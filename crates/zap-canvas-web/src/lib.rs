pub mod canvas;
pub mod runner;

pub use canvas::CanvasTarget;
pub use runner::SurfaceRunner;
pub use zap_canvas::{InputEvent, MouseButton};

/// Generate all `#[wasm_bindgen]` exports for an app drawing on a canvas.
///
/// Generates:
/// - `thread_local!` storage for the SurfaceRunner
/// - `with_runner()` helper function
/// - wasm-bindgen exports: `app_init`, `app_frame`, pointer, touch and
///   resize handlers, and `app_attach` for JSON attribute bags
///
/// The host calls `app_frame(performance.now())` from
/// `requestAnimationFrame` and stops scheduling frames while it returns
/// `false`; any input handler returns `true` to ask for a frame again.
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use zap_canvas::*;
///
/// mod app;
/// use app::Board;
///
/// zap_canvas_web::export_app!(Board, "board");
/// ```
///
/// # Arguments
///
/// - `$app_type`: a type implementing `zap_canvas::App` with a `new()` constructor
/// - `$app_name`: a string literal used in log messages
#[macro_export]
macro_rules! export_app {
    ($app_type:ty, $app_name:literal) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::SurfaceRunner<$app_type, $crate::CanvasTarget>>> =
                RefCell::new(None);
        }

        fn with_runner<R>(
            f: impl FnOnce(&mut $crate::SurfaceRunner<$app_type, $crate::CanvasTarget>) -> R,
        ) -> Option<R> {
            RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
                Some(runner) => Some(f(runner)),
                None => {
                    log::warn!("{}: app_init() has not run", $app_name);
                    None
                }
            })
        }

        #[wasm_bindgen]
        pub fn app_init(canvas_id: &str) -> Result<(), JsValue> {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let target = $crate::CanvasTarget::from_id(canvas_id)?;
            let mut runner = $crate::SurfaceRunner::new(<$app_type>::new(), target);
            runner.init();

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });
            log::info!("{}: initialized on #{}", $app_name, canvas_id);
            Ok(())
        }

        /// Returns whether another frame is wanted.
        #[wasm_bindgen]
        pub fn app_frame(now: f64) -> bool {
            with_runner(|r| r.frame(now)).unwrap_or(false)
        }

        #[wasm_bindgen]
        pub fn app_pointer_down(x: f64, y: f64, button: u16) -> bool {
            let Some(button) = $crate::MouseButton::from_dom(button) else {
                return false;
            };
            with_runner(|r| r.push_input($crate::InputEvent::PointerDown { x, y, button }))
                .is_some()
        }

        #[wasm_bindgen]
        pub fn app_pointer_up(x: f64, y: f64, button: u16) -> bool {
            let Some(button) = $crate::MouseButton::from_dom(button) else {
                return false;
            };
            with_runner(|r| r.push_input($crate::InputEvent::PointerUp { x, y, button }))
                .is_some()
        }

        #[wasm_bindgen]
        pub fn app_pointer_move(x: f64, y: f64) -> bool {
            with_runner(|r| r.push_input($crate::InputEvent::PointerMove { x, y })).is_some()
        }

        #[wasm_bindgen]
        pub fn app_touch_start(x: f64, y: f64) -> bool {
            with_runner(|r| r.push_input($crate::InputEvent::TouchStart { x, y })).is_some()
        }

        #[wasm_bindgen]
        pub fn app_touch_move(x: f64, y: f64) -> bool {
            with_runner(|r| r.push_input($crate::InputEvent::TouchMove { x, y })).is_some()
        }

        #[wasm_bindgen]
        pub fn app_touch_end(x: f64, y: f64) -> bool {
            with_runner(|r| r.push_input($crate::InputEvent::TouchEnd { x, y })).is_some()
        }

        #[wasm_bindgen]
        pub fn app_resize(width: f64, height: f64) -> bool {
            with_runner(|r| r.push_input($crate::InputEvent::Resize { width, height })).is_some()
        }

        /// Attach an entity from a JSON attribute bag.
        #[wasm_bindgen]
        pub fn app_attach(json: &str) -> Result<(), JsValue> {
            match with_runner(|r| r.attach_from_json(json)) {
                Some(Ok(_)) => Ok(()),
                Some(Err(err)) => Err(JsValue::from_str(&err.to_string())),
                None => Err(JsValue::from_str(concat!($app_name, ": not initialized"))),
            }
        }
    };
}
