use std::process::Command;

/// Short hash of the checked out commit, if this is a git checkout
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}

fn main() {
    // Migrations are embedded into the binary
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let hash = git_short_hash().unwrap_or_else(|| "UNKNOWN".to_string());
    println!("cargo:rustc-env=GIT_SHORT_HASH={hash}");
}
