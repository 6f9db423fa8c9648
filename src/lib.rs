// evader_core: runaway prize button engine (Rust/WASM).
// All behaviour lives here; the page forwards clicks, transition ends and frame
// ticks with a geometry snapshot, and renders the frames it gets back.

mod animation;
mod error;
mod geometry;
mod interaction;
#[cfg(target_arch = "wasm32")]
mod logging;
mod placement;
mod reward;
mod schedule;
mod session;
mod types;

use wasm_bindgen::prelude::*;

pub use animation::{apply_easing, HelpApproach};
pub use error::EngineError;
pub use geometry::{forbidden_regions, GeometryProvider, GeometrySnapshot};
pub use interaction::{Directive, InteractionState, InteractionStateMachine, Sound};
pub use placement::{overlaps_any, PlacementEngine};
pub use reward::RewardLink;
pub use schedule::{Task, TaskQueue};
pub use session::{Frame, Session};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Main engine interface exposed to JavaScript.
/// Every call takes the current geometry snapshot and host time and returns a
/// JSON `Frame`.
#[wasm_bindgen]
pub struct Engine {
    session: Session,
}

#[wasm_bindgen]
impl Engine {
    /// `config_json` is an `EngineConfig`; `{}` gives the stock page.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, viewport_width: f64, viewport_height: f64) -> Result<Engine, JsValue> {
        let config: EngineConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;

        init_logging(&config);

        let session = Session::new(&config, Size::new(viewport_width, viewport_height))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("engine ready ({}x{})", viewport_width, viewport_height);

        Ok(Engine { session })
    }

    /// The prize button was clicked.
    pub fn relocate(&mut self, geometry_json: &str, now_ms: f64) -> Result<String, JsValue> {
        let geometry = parse_geometry(geometry_json).map_err(to_js)?;
        let frame = self.session.relocate(&geometry, host_time(now_ms));
        to_json(&frame).map_err(to_js)
    }

    /// The help button was clicked.
    pub fn request_help(&mut self, geometry_json: &str, now_ms: f64) -> Result<String, JsValue> {
        let geometry = parse_geometry(geometry_json).map_err(to_js)?;
        let frame = self.session.request_help(&geometry, host_time(now_ms));
        to_json(&frame).map_err(to_js)
    }

    /// The help group's position transition ended.
    pub fn approach_complete(&mut self, geometry_json: &str, now_ms: f64) -> Result<String, JsValue> {
        let geometry = parse_geometry(geometry_json).map_err(to_js)?;
        let frame = self.session.approach_complete(&geometry, host_time(now_ms));
        to_json(&frame).map_err(to_js)
    }

    /// Drive scheduled work; call from `requestAnimationFrame`.
    pub fn tick(&mut self, geometry_json: &str, now_ms: f64) -> Result<String, JsValue> {
        let geometry = parse_geometry(geometry_json).map_err(to_js)?;
        let frame = self.session.tick(&geometry, host_time(now_ms));
        to_json(&frame).map_err(to_js)
    }

    /// Current interaction state as JSON.
    pub fn state(&self) -> Result<String, JsValue> {
        to_json(self.session.state()).map_err(to_js)
    }
}

#[cfg(target_arch = "wasm32")]
fn init_logging(config: &EngineConfig) {
    if let Ok(level) = config.level_filter() {
        logging::init(level);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging(_config: &EngineConfig) {}

fn parse_geometry(geometry_json: &str) -> Result<GeometrySnapshot, EngineError> {
    Ok(serde_json::from_str(geometry_json)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, EngineError> {
    Ok(serde_json::to_string(value)?)
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// `performance.now()` is fractional and never negative in practice.
fn host_time(now_ms: f64) -> Millis {
    if now_ms.is_finite() && now_ms > 0.0 {
        Millis::from_millis(now_ms as u64)
    } else {
        Millis::default()
    }
}
