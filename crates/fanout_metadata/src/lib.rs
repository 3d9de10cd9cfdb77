use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

mod combine;
pub mod filter;
mod options;
pub mod path;

pub use combine::Combine;
pub use options::{
    DiscoveryOptions, Options, OutputFormat, ReportOptions, RunOptions, TerminalOptions,
};

use crate::path::absolute;

const CONFIG_FILE_NAME: &str = "fanout.toml";
const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

pub const DEFAULT_PATTERN: &str = "test*.py";
pub const DEFAULT_CACHE_DIR: &str = ".fanout_cache";

/// The configuration of a project: where it lives and the layered options.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    root: Utf8PathBuf,
    options: Options,
    config_file: Option<Utf8PathBuf>,
}

impl ProjectMetadata {
    /// A project rooted at `root` with no configuration file.
    pub fn new(root: Utf8PathBuf) -> Self {
        Self {
            root,
            options: Options::default(),
            config_file: None,
        }
    }

    /// Walks up from `cwd` looking for `fanout.toml`, or a `pyproject.toml`
    /// with a `[tool.fanout]` table. The first directory that has either
    /// becomes the project root; without one, `cwd` is the root.
    pub fn discover(cwd: &Utf8Path) -> Result<Self, ProjectMetadataError> {
        for dir in cwd.ancestors() {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                tracing::debug!(path = %config_path, "Found configuration file");
                let options = parse_options(&config_path)?;
                return Ok(Self {
                    root: dir.to_path_buf(),
                    options,
                    config_file: Some(config_path),
                });
            }

            let pyproject_path = dir.join(PYPROJECT_FILE_NAME);
            if pyproject_path.is_file() {
                if let Some(options) = parse_pyproject(&pyproject_path)? {
                    tracing::debug!(path = %pyproject_path, "Found `[tool.fanout]`");
                    return Ok(Self {
                        root: dir.to_path_buf(),
                        options,
                        config_file: Some(pyproject_path),
                    });
                }
            }
        }

        Ok(Self::new(cwd.to_path_buf()))
    }

    /// Loads an explicitly requested configuration file. The project root is
    /// the current working directory.
    pub fn from_config_file(
        path: Utf8PathBuf,
        cwd: &Utf8Path,
    ) -> Result<Self, ProjectMetadataError> {
        if path.file_name() == Some(PYPROJECT_FILE_NAME) {
            return Err(ProjectMetadataError::PyprojectAsConfigFile(path));
        }

        let options = parse_options(&path)?;
        Ok(Self {
            root: cwd.to_path_buf(),
            options,
            config_file: Some(path),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub const fn options(&self) -> &Options {
        &self.options
    }

    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }

    /// Layers command-line options on top of the file options.
    pub fn apply_overrides(&mut self, overrides: Options) {
        self.options = overrides.combine(std::mem::take(&mut self.options));
    }

    /// Resolves the options into concrete settings.
    ///
    /// `start_dir` is the directory discovery begins in; relative paths from
    /// the configuration file are resolved against the project root.
    pub fn to_settings(&self, start_dir: Option<&Utf8Path>) -> Settings {
        let discovery = self.options.discovery.clone().unwrap_or_default();
        let run = self.options.run.clone().unwrap_or_default();
        let report = self.options.report.clone().unwrap_or_default();
        let terminal = self.options.terminal.clone().unwrap_or_default();

        let start_dir = start_dir.map_or_else(|| self.root.clone(), Utf8Path::to_path_buf);
        let top_level_dir = discovery
            .top_level_dir
            .map_or_else(|| start_dir.clone(), |dir| absolute(dir, &self.root));

        Settings {
            start_dir,
            top_level_dir,
            pattern: discovery
                .pattern
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
            worker_count: run
                .workers
                .unwrap_or_else(|| fanout_static::max_parallelism().get())
                .max(1),
            enable_coverage: run.coverage.unwrap_or(false),
            cache_dir: absolute(
                run.cache_dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR),
                &self.root,
            ),
            junit_xml: report.junit_xml.map(|path| absolute(path, &self.root)),
            name_patterns: report.name_patterns.unwrap_or_default(),
            attributes: report.attributes.unwrap_or_default(),
            output_format: terminal.output_format.unwrap_or_default(),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory discovery starts from.
    pub start_dir: Utf8PathBuf,

    /// Directory importable module names are relative to.
    pub top_level_dir: Utf8PathBuf,

    /// File-name glob for test modules.
    pub pattern: String,

    /// Number of worker processes, at least one.
    pub worker_count: usize,

    pub enable_coverage: bool,

    pub cache_dir: Utf8PathBuf,

    pub junit_xml: Option<Utf8PathBuf>,

    pub name_patterns: Vec<String>,

    /// Attribute names a test's class or method must set to a truthy value.
    pub attributes: Vec<String>,

    pub output_format: OutputFormat,
}

impl Settings {
    /// Settings for running the tests under `start_dir` with defaults.
    pub fn for_directory(start_dir: Utf8PathBuf) -> Self {
        ProjectMetadata::new(start_dir).to_settings(None)
    }
}

#[derive(Debug, Error)]
pub enum ProjectMetadataError {
    #[error("Failed to read `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse `{path}`")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "`{0}` is a `pyproject.toml`; configuration passed with `--config-file` must be a `fanout.toml`"
    )]
    PyprojectAsConfigFile(Utf8PathBuf),
}

fn read(path: &Utf8Path) -> Result<String, ProjectMetadataError> {
    std::fs::read_to_string(path).map_err(|source| ProjectMetadataError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_options(path: &Utf8Path) -> Result<Options, ProjectMetadataError> {
    toml::from_str(&read(path)?).map_err(|source| ProjectMetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Deserialize)]
struct PyProject {
    tool: Option<Tool>,
}

#[derive(Deserialize)]
struct Tool {
    fanout: Option<Options>,
}

fn parse_pyproject(path: &Utf8Path) -> Result<Option<Options>, ProjectMetadataError> {
    let pyproject: PyProject =
        toml::from_str(&read(path)?).map_err(|source| ProjectMetadataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(pyproject.tool.and_then(|tool| tool.fanout))
}
