// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
    std::env::remove_var("SWARM_VERBOSE");
}

#[test]
#[serial]
fn no_color_wins_over_color() {
    clear_env();
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    assert!(!color_enabled());
    clear_env();
}

#[test]
#[serial]
fn color_defaults_on() {
    clear_env();
    assert!(color_enabled());
}

#[test]
#[serial]
fn verbose_requires_exactly_one() {
    clear_env();
    assert!(!verbose_logging());
    std::env::set_var("SWARM_VERBOSE", "0");
    assert!(!verbose_logging());
    std::env::set_var("SWARM_VERBOSE", "1");
    assert!(verbose_logging());
    clear_env();
}
