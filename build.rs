//! Build script for virtual-monitors
//!
//! Sets BUILD_DATE, BUILD_TIME and GIT_HASH for the startup banner. Any
//! value the host cannot provide (no `date`, not a git checkout) becomes
//! "unknown".

use std::process::Command;

fn capture(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!(
        "cargo:rustc-env=BUILD_DATE={}",
        capture("date", &["+%Y-%m-%d"])
    );
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        capture("date", &["+%H:%M:%S"])
    );
    println!(
        "cargo:rustc-env=GIT_HASH={}",
        capture("git", &["rev-parse", "--short", "HEAD"])
    );

    // Re-run if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
}
