//! Locating the running JDK for the system module filesystem.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Find a JDK root that can back a module filesystem.
///
/// Sources are tried in this order:
/// 1. `JAVA_HOME`
/// 2. `java` on `PATH` (via `java -XshowSettings:properties -version`, then symlink resolution)
pub fn discover_jdk_root() -> Option<PathBuf> {
    let found = discover_from_java_home().or_else(discover_from_java_on_path);
    match &found {
        Some(root) => tracing::debug!(target: "sable.inputs", root = %root.display(), "discovered JDK"),
        None => tracing::debug!(target: "sable.inputs", "no JDK found via JAVA_HOME or PATH"),
    }
    found
}

/// Accept `candidate` or its parent if either looks like a JDK with module data.
///
/// Older layouts report `java.home` as `$JDK/jre`.
pub fn coerce_to_jdk_root(mut candidate: PathBuf) -> Option<PathBuf> {
    if has_module_data(&candidate) {
        return Some(candidate);
    }

    candidate.pop();
    if has_module_data(&candidate) {
        return Some(candidate);
    }

    None
}

pub(crate) fn has_module_data(root: &Path) -> bool {
    root.join("jmods").is_dir() || root.join("modules").is_dir()
}

fn discover_from_java_home() -> Option<PathBuf> {
    std::env::var_os("JAVA_HOME")
        .map(PathBuf::from)
        .and_then(coerce_to_jdk_root)
}

fn discover_from_java_on_path() -> Option<PathBuf> {
    discover_from_java_command().or_else(discover_from_java_symlink)
}

fn discover_from_java_command() -> Option<PathBuf> {
    let output = Command::new("java")
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;

    // HotSpot prints settings to stderr, but we accept both.
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    let java_home = combined.lines().find_map(|line| {
        let (key, value) = line.trim().split_once('=')?;
        (key.trim() == "java.home").then(|| value.trim().to_string())
    })?;

    coerce_to_jdk_root(PathBuf::from(java_home))
}

fn discover_from_java_symlink() -> Option<PathBuf> {
    let java_bin = find_java_on_path()?.canonicalize().ok()?;
    let root = java_bin.parent()?.parent()?.to_path_buf();
    coerce_to_jdk_root(root)
}

fn find_java_on_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let exe_name = if cfg!(windows) { "java.exe" } else { "java" };

    std::env::split_paths(&path_var)
        .map(|dir| dir.join(exe_name))
        .find(|candidate| candidate.is_file())
}
