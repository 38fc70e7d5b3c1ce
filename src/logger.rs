//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志（可重复调用，测试中安全）
///
/// 默认级别 `info`，可通过 `RUST_LOG` 覆盖。
pub fn init() {
    init_with(false);
}

/// 按配置初始化；`verbose` 为 true 时默认级别提升到 `debug`
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
