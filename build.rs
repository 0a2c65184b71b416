use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-changed=.git/index");

    // `abc1234567-dirty` when the tree has uncommitted changes; `unknown` outside git.
    let revision = git(&["describe", "--always", "--dirty", "--abbrev=10", "--exclude=*"])
        .unwrap_or_else(|| "unknown".into());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into());

    println!("cargo:rustc-env=NAVSPY_BUILD_GIT_HASH={revision}");
    println!("cargo:rustc-env=NAVSPY_BUILD_PROFILE={profile}");
}
