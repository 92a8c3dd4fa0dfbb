// Resolve the commit hash before the build and expose
// `BUILD_VERSION` (package version + short hash) to the crate.

use std::process::Command;

fn short_commit_hash() -> String {
    if let Some(hash) = option_env!("REGISTRY_COMMIT_HASH") {
        return hash.chars().take(7).collect();
    }

    // Git missing or not a checkout: fall back to "unknown"
    match Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
    {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => "unknown".to_string(),
    }
}

fn main() {
    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), short_commit_hash());
    println!("cargo:rerun-if-env-changed=REGISTRY_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
