use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=GIT_VERSION");

    println!("cargo:rustc-env=GIT_VERSION={}", git_version());
}

/// Version string shown on `/health` and the settings page.
///
/// An explicit `GIT_VERSION` (set by CI or container builds) wins over
/// `git describe`; outside a checkout the crate version is used.
fn git_version() -> String {
    if let Ok(version) = std::env::var("GIT_VERSION") {
        if !version.is_empty() && version != "dev" {
            return version;
        }
    }

    Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION")))
}
