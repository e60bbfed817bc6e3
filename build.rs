//! Build script for Persona Forge
//!
//! Stamps the binary with the git revision, build time and target, and
//! records which institution files under `config/institutions` were bundled.

use std::env;
use std::fs;
use std::process::Command;

const INSTITUTIONS_DIR: &str = "config/institutions";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed={}", INSTITUTIONS_DIR);

    let revision = match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) if worktree_dirty() => format!("{}-dirty", hash),
        Some(hash) => hash,
        None => "unknown".to_string(),
    };

    emit("GIT_REVISION", &revision);
    emit(
        "BUILD_TIMESTAMP",
        &chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    emit("TARGET", &env::var("TARGET").unwrap_or_else(|_| "unknown".to_string()));
    emit("PROFILE", &env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()));
    emit("BUNDLED_INSTITUTIONS", &bundled_institution_files().join(","));
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env=PERSONA_FORGE_{}={}", key, value);
}

/// Trimmed stdout of a successful git invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn worktree_dirty() -> bool {
    git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty())
}

/// Sorted `*.toml` file stems in the institutions directory
fn bundled_institution_files() -> Vec<String> {
    let mut stems: Vec<String> = fs::read_dir(INSTITUTIONS_DIR)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .collect()
        })
        .unwrap_or_default();
    stems.sort();
    stems
}
