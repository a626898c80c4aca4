pub mod behaviors;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod page;
pub mod pages;
pub mod web;

#[cfg(test)]
mod test_utils;

#[cfg_attr(not(test), wasm_bindgen::prelude::wasm_bindgen(start))]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Starting page behaviors...");

    if let Err(e) = web::install() {
        log::error!("Failed to start page behaviors: {}", e);
    }
}
