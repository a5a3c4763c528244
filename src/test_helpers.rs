//! Shared test helpers for exercising jobs without a real tool binary.

use crate::config::Config;
use crate::coordinator::MediaDownloader;
use crate::invoker::ToolRunner;
use crate::types::InvocationResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the external tool.
///
/// Records every argument vector it receives and, when configured with
/// files, writes them into the directory of the `-o` template the way
/// the real tool would.
pub(crate) struct FakeRunner {
    stdout: String,
    stderr: String,
    error: bool,
    files: Vec<(&'static str, &'static [u8])>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    /// A runner that exits zero and leaves the given files behind.
    pub(crate) fn succeeding(files: Vec<(&'static str, &'static [u8])>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            error: false,
            files,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A runner that exits non-zero with the given stderr.
    pub(crate) fn failing(stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            error: true,
            files: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A runner that exits zero printing the given stdout (probe jobs).
    pub(crate) fn probing(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            error: false,
            files: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Argument vectors received so far.
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn invoke(&self, args: &[String]) -> crate::Result<InvocationResult> {
        self.calls.lock().unwrap().push(args.to_vec());

        // Honor the output template like the real tool would
        if let Some(template_pos) = args.iter().position(|a| a == "-o") {
            let template = Path::new(&args[template_pos + 1]);
            let dir = template.parent().expect("template has a parent dir");
            for (name, contents) in &self.files {
                std::fs::write(dir.join(name), contents).unwrap();
            }
        }

        Ok(InvocationResult {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            error: self.error,
        })
    }
}

/// Helper to create a test MediaDownloader wired to a fake runner.
/// Returns the downloader, the runner (for call assertions), and the
/// tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    runner: FakeRunner,
) -> (MediaDownloader, Arc<FakeRunner>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");

    let runner = Arc::new(runner);
    let downloader = MediaDownloader::with_runner(config, runner.clone());
    (downloader, runner, temp_dir)
}

/// Count the job workspaces currently present under the download dir.
pub(crate) fn workspace_count(temp_root: &Path) -> usize {
    match std::fs::read_dir(temp_root.join("downloads")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
