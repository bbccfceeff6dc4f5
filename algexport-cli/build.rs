use std::env;
use std::path::PathBuf;
use std::process::Command;

// Stamps `--version` with the commit the binary was built from. Packagers
// building outside a checkout can set ALGEXPORT_BUILD_SHA themselves.
fn main() {
    println!("cargo:rerun-if-env-changed=ALGEXPORT_BUILD_SHA");

    let stamp = env::var("ALGEXPORT_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(git_describe)
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=ALGEXPORT_BUILD_SHA={stamp}");
}

fn git_describe() -> Option<String> {
    let workspace = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?).join("..");
    let head = workspace.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    let out = Command::new("git")
        .arg("-C")
        .arg(&workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let described = String::from_utf8(out.stdout).ok()?;
    Some(described.trim().to_string()).filter(|s| !s.is_empty())
}
