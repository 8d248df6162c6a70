// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "swarm-1" },
    underscores = { "my_session" },
    digits = { "s123" },
)]
fn valid_session_names(name: &str) {
    assert!(validate_session_name(name).is_ok());
}

#[parameterized(
    empty = { "" },
    space = { "my session" },
    semicolon = { "x;rm -rf" },
    dots = { "a.b" },
    slash = { "a/b" },
    colon = { "a:b" },
)]
fn invalid_session_names(name: &str) {
    assert!(matches!(
        validate_session_name(name),
        Err(PaneError::InvalidName(_))
    ));
}

#[parameterized(
    semicolon = { "/tmp/x;y" },
    backtick = { "/tmp/`id`" },
    dollar = { "/tmp/$HOME" },
    pipe = { "/tmp/a|b" },
    newline = { "/tmp/a\nb" },
)]
fn metacharacter_paths_are_rejected(path: &str) {
    assert!(matches!(
        validate_cwd(Path::new(path)),
        Err(PaneError::InvalidPath(_))
    ));
}

#[test]
fn ordinary_paths_pass() {
    assert!(validate_cwd(Path::new("/home/user/.worktrees/reviewer")).is_ok());
    assert!(validate_cwd(Path::new("relative/path-with_underscores")).is_ok());
}

#[test]
fn ready_pattern_matches_shell_prompts() {
    let pattern = Regex::new(READY_PATTERN).unwrap();
    assert!(pattern.is_match("user@host:~/repo$ "));
    assert!(pattern.is_match("> "));
    assert!(pattern.is_match("zsh %"));
    assert!(!pattern.is_match("still working..."));
}

#[test]
fn pane_errors_map_to_taxonomy_codes() {
    let err: swarm_core::SwarmError = PaneError::InvalidName("x y".into()).into();
    assert_eq!(err.code, swarm_core::ErrorCode::InvalidArgs);

    let err: swarm_core::SwarmError = PaneError::Timeout("tmux".into()).into();
    assert_eq!(err.code, swarm_core::ErrorCode::SystemError);
}
