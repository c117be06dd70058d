use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "STAT_PLANNER_DIR";

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the per-user data directory holding profiles, run state, and exports.
///
/// `$STAT_PLANNER_DIR` if set, otherwise `<local data dir>/stat-planner/`.
pub fn get_data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stat-planner")
    })
}

/// Returns the logs directory: `<data_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Returns the profile store: `<data_dir>/profiles.json`
pub fn get_profiles_file() -> PathBuf {
    get_data_dir().join("profiles.json")
}

/// Returns the active run file: `<data_dir>/run_state.json`
pub fn get_run_state_file() -> PathBuf {
    get_data_dir().join("run_state.json")
}

/// Returns the trainee photo directory: `<data_dir>/assets/profiles/`
pub fn get_photos_dir() -> PathBuf {
    get_data_dir().join("assets").join("profiles")
}

/// Returns the export directory: `<data_dir>/exports/`
pub fn get_exports_dir() -> PathBuf {
    get_data_dir().join("exports")
}

/// Returns the debug image directory: `<data_dir>/debug/`
pub fn get_debug_dir() -> PathBuf {
    get_data_dir().join("debug")
}

/// Returns the stat label template directory: `<exe_dir>/resources/templates/`
pub fn get_label_template_dir() -> PathBuf {
    get_exe_dir().join("resources").join("templates")
}

/// Returns the digit template directory: `<exe_dir>/resources/digits/`
pub fn get_digit_template_dir() -> PathBuf {
    get_exe_dir().join("resources").join("digits")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_photos_dir())?;
    std::fs::create_dir_all(get_exports_dir())?;
    std::fs::create_dir_all(get_debug_dir())?;
    Ok(())
}
