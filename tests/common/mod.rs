//! Shared fixtures for end-to-end tests.
//!
//! Tests drive the real pipeline (provisioner, invoker, streamer) with a
//! shell script standing in for the downloader binary, so they only run
//! on unix.

#![allow(dead_code)]

use media_dl::Config;
use std::path::{Path, PathBuf};

/// Write an executable stand-in for the tool binary.
///
/// The script always answers `--version` (the provisioner's verify
/// step) and otherwise runs `body` with the original arguments.
#[cfg(unix)]
pub fn write_tool_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 2025.01.15; exit 0; fi\n{body}\n"
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shell snippet that resolves the `-o` template's directory into `$dir`.
pub const RESOLVE_TEMPLATE_DIR: &str = r#"
template=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then template="$a"; fi
  prev="$a"
done
dir=$(dirname "$template")
"#;

/// Config rooted in a temp directory, pointing at the fake binary.
pub fn test_config(root: &Path, script: &Path) -> Config {
    let mut config = Config::default();
    config.tool.binary_path = Some(script.to_path_buf());
    config.tool.search_path = false;
    config.download.download_dir = root.join("downloads");
    config
}

/// Count the job workspaces currently present under the download dir.
pub fn workspace_count(root: &Path) -> usize {
    match std::fs::read_dir(root.join("downloads")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
