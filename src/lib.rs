mod api;
mod app;
mod components;
mod models;
mod pages;
mod session;
mod state;
mod tree;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::EnvConfig;
    use crate::state::ConfirmPort;
    use leptos::prelude::Callback;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_env_config_defaults_without_window_env() {
        let cfg = EnvConfig::new();
        assert_eq!(cfg.api_url, "http://localhost:3000/api");
    }

    #[wasm_bindgen_test]
    fn test_confirm_port_is_injectable() {
        let always_no = ConfirmPort(Callback::new(|_msg: String| false));
        assert!(!always_no.ask("Delete menu \"Home\"?"));
    }
}
