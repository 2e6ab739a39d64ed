use std::{
    env,
    path::{Path, PathBuf},
};

use vergen_gix::{Emitter, GixBuilder};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Packagers can pin the SHA without any git probing.
    println!("cargo:rerun-if-env-changed=STOWAGE_BUILD_SHA_SHORT");

    if let Some(override_sha) = env::var("STOWAGE_BUILD_SHA_SHORT")
        .ok()
        .and_then(|s| normalize_sha_short(&s))
    {
        emit_fallbacks(Some(&override_sha));
        return;
    }

    // Best-effort git probing; never fail the build.
    let Some(repo_root) = find_repo_root(Path::new(
        &env::var("CARGO_MANIFEST_DIR").unwrap_or_default(),
    )) else {
        emit_fallbacks(None);
        return;
    };

    let git = match GixBuilder::default()
        .repo_path(Some(repo_root))
        .sha(true)
        .dirty(false)
        .build()
    {
        Ok(git) => git,
        Err(err) => {
            println!("cargo:warning=stowage-build-info: vergen-gix config failed: {err}");
            emit_fallbacks(None);
            return;
        }
    };

    if let Err(err) = Emitter::default()
        .add_instructions(&git)
        .and_then(|e| e.emit())
    {
        println!("cargo:warning=stowage-build-info: vergen-gix emit failed: {err}");
        emit_fallbacks(None);
    }
}

/// The crate reads these via `env!()`, so they must always be set.
fn emit_fallbacks(sha_short: Option<&str>) {
    let sha = sha_short.unwrap_or("unknown");
    println!("cargo:rustc-env=VERGEN_GIT_SHA={sha}");
    println!("cargo:rustc-env=VERGEN_GIT_DIRTY=false");
}

fn normalize_sha_short(raw: &str) -> Option<String> {
    let candidate: String = raw.trim().chars().take(7).collect();
    (candidate.len() == 7 && candidate.chars().all(|c| c.is_ascii_hexdigit()))
        .then_some(candidate)
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
