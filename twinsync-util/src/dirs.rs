use std::path::PathBuf;

/// Directory holding the stored configs, `$XDG_CONFIG_HOME/twinsync` on Linux.
///
/// Falls back to `~/.config/twinsync` and then to a path relative to the
/// working directory when no home can be found.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(env!("TWINSYNC_PKG_NAME"))
}
