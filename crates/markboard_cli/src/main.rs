//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `markboard_core` linkage without any UI runtime.
//! - Print the effective ordering tuning in a stable `key=value` form.

use markboard_core::OrderingConfig;

fn main() {
    let config = OrderingConfig::default();
    println!("markboard_core ping={}", markboard_core::ping());
    println!("markboard_core version={}", markboard_core::core_version());
    println!(
        "ordering default_gap={} min_gap={} rebalance_gap={} first_position={}",
        config.default_gap(),
        config.min_gap(),
        config.rebalance_gap(),
        config.first_position()
    );
}
