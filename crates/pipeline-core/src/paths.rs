//! Fixed artifact locations relative to the project root

use crate::error::{PipelineError, Result};
use std::path::{Component, Path, PathBuf};

/// Environment variable that overrides the project root
pub const ROOT_ENV_VAR: &str = "HOTEL_PIPELINE_ROOT";

const ARTIFACTS_DIR: &str = "artifacts";
const RAW_DIR: &str = "raw";
const PROCESSED_DIR: &str = "processed";
const MODELS_DIR: &str = "models";

const RAW_FILE: &str = "raw.csv";
const TRAIN_FILE: &str = "train.csv";
const TEST_FILE: &str = "test.csv";
const PROCESSED_TRAIN_FILE: &str = "processed_train.csv";
const PROCESSED_TEST_FILE: &str = "processed_test.csv";
const MODEL_FILE: &str = "gbdt_model.bin";
const METRICS_FILE: &str = "metrics.json";

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.yaml";
const LOGS_DIR: &str = "logs";

const DATASET_DIR: &str = "DATASET";
const DATASET_FILE: &str = "Hotel Reservations.csv";

/// Every path the pipeline reads or writes, derived from one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// Paths anchored at an explicit root, with `.` and `..` resolved lexically
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }

    /// Root from `HOTEL_PIPELINE_ROOT`, falling back to the working directory.
    /// A relative override is taken from the working directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PipelineError::io("resolving current directory", e))?;
        match std::env::var_os(ROOT_ENV_VAR) {
            Some(root) => Ok(Self::new(cwd.join(root))),
            None => Ok(Self::new(cwd)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// External input: `<root>/../DATASET/Hotel Reservations.csv/Hotel Reservations.csv`
    pub fn source_dataset(&self) -> PathBuf {
        let parent = match self.root.components().next_back() {
            Some(Component::Normal(_)) => self.root.parent().map(Path::to_path_buf),
            _ => None,
        }
        .unwrap_or_else(|| self.root.join(".."));
        parent.join(DATASET_DIR).join(DATASET_FILE).join(DATASET_FILE)
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(RAW_DIR)
    }

    pub fn raw_file(&self) -> PathBuf {
        self.raw_dir().join(RAW_FILE)
    }

    pub fn train_file(&self) -> PathBuf {
        self.raw_dir().join(TRAIN_FILE)
    }

    pub fn test_file(&self) -> PathBuf {
        self.raw_dir().join(TEST_FILE)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(PROCESSED_DIR)
    }

    pub fn processed_train_file(&self) -> PathBuf {
        self.processed_dir().join(PROCESSED_TRAIN_FILE)
    }

    pub fn processed_test_file(&self) -> PathBuf {
        self.processed_dir().join(PROCESSED_TEST_FILE)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(MODELS_DIR)
    }

    /// Serialized classifier
    pub fn model_output(&self) -> PathBuf {
        self.models_dir().join(MODEL_FILE)
    }

    /// Evaluation report written alongside the model
    pub fn metrics_file(&self) -> PathBuf {
        self.models_dir().join(METRICS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// File names written by the preprocessing stage into a processed directory
    pub fn processed_file_names() -> (&'static str, &'static str) {
        (PROCESSED_TRAIN_FILE, PROCESSED_TEST_FILE)
    }

    /// Metrics file that sits next to a given model artifact
    pub fn metrics_for_model(model_path: &Path) -> PathBuf {
        model_path
            .parent()
            .map(|dir| dir.join(METRICS_FILE))
            .unwrap_or_else(|| PathBuf::from(METRICS_FILE))
    }
}

/// Drop `.` components and fold `..` into the preceding directory
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
