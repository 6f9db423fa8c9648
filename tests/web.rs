// Browser smoke test: run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use evader_core::Engine;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const GEOMETRY: &str = r#"{"viewport":{"width":1024,"height":768},"elements":{}}"#;

#[wasm_bindgen_test]
fn engine_runs_in_browser() {
    let mut engine = Engine::new(r#"{"log_level":"debug"}"#, 1024.0, 768.0).unwrap();
    let json = engine.relocate(GEOMETRY, 10.0).unwrap();
    assert!(json.contains(r#""move_count":1"#));
}

#[wasm_bindgen_test]
fn bad_geometry_is_an_error() {
    let mut engine = Engine::new("{}", 1024.0, 768.0).unwrap();
    assert!(engine.tick("not json", 0.0).is_err());
}
