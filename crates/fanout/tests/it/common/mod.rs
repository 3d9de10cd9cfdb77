use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use insta::internals::SettingsBindDropGuard;
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

/// A scratch project directory plus insta filters for its paths and timings.
pub(crate) struct TestContext {
    _temp_dir: TempDir,
    project_dir: Utf8PathBuf,
    _settings_scope: SettingsBindDropGuard,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let project_dir = dunce::canonicalize(temp_dir.path())
            .expect("Failed to canonicalize project path");
        let project_dir = Utf8PathBuf::from_path_buf(project_dir)
            .expect("Project path is not valid UTF-8");

        let mut settings = insta::Settings::clone_current();
        settings.add_filter(&regex::escape(project_dir.as_str()), "[TEMP_DIR]");
        settings.add_filter(r"finished in (\d+m )?\d+(\.\d+)?s", "finished in [TIME]");
        let settings_scope = settings.bind_to_scope();

        Self {
            _temp_dir: temp_dir,
            project_dir,
            _settings_scope: settings_scope,
        }
    }

    pub(crate) fn with_file(path: impl AsRef<Utf8Path>, content: &str) -> Self {
        let context = Self::new();
        context.write_file(path, content);
        context
    }

    pub(crate) fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let context = Self::new();
        for (path, content) in files {
            context.write_file(path, content);
        }
        context
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        &self.project_dir
    }

    pub(crate) fn write_file(&self, path: impl AsRef<Utf8Path>, content: &str) {
        let path = self.project_dir.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, dedent(content)).expect("Failed to write file");
    }

    /// `fanout` without a subcommand.
    pub(crate) fn fanout(&self) -> Command {
        let mut command = Command::new(get_cargo_bin("fanout"));
        command
            .current_dir(&self.project_dir)
            .env("FANOUT_WORKER_BINARY", get_cargo_bin("fanout_worker"))
            .env_remove("FANOUT_LOG")
            .env_remove("FANOUT_CONFIG_FILE")
            .env_remove("FANOUT_MAX_PARALLELISM")
            .env_remove("CLICOLOR_FORCE");
        command
    }

    /// `fanout test`.
    pub(crate) fn command(&self) -> Command {
        let mut command = self.fanout();
        command.arg("test");
        command
    }
}

/// Strips the indentation shared by every non-blank line.
fn dedent(content: &str) -> String {
    let indent = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    content
        .lines()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
