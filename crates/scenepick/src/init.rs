/// Installs `env_logger` as the `log` backend.
///
/// Filtering follows `RUST_LOG`, e.g. `RUST_LOG=scenepick_core=debug` prints
/// per-pass draw and eviction counts. Calling it again, or after the host
/// installed its own logger, does nothing.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
