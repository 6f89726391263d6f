//! Where spotter keeps its files: game progress under the XDG state dir,
//! preferences under the platform config dir.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP: &str = "spotter";
const PROGRESS_DB: &str = "progress.db";
const CONFIG_FILE: &str = "config.json";

pub struct AppDirs;

impl AppDirs {
    /// Achievements, level ranks and finished games
    pub fn db_path() -> Option<PathBuf> {
        match std::env::var_os("HOME") {
            Some(home) => Some(Self::progress_db_in(Path::new(&home))),
            None => ProjectDirs::from("", "", APP)
                .map(|dirs| dirs.data_local_dir().join(PROGRESS_DB)),
        }
    }

    /// Saved mode, difficulty and annotation preferences
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn progress_db_in(home: &Path) -> PathBuf {
        home.join(".local").join("state").join(APP).join(PROGRESS_DB)
    }
}
