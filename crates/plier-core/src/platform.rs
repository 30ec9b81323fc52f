use std::path::{Path, PathBuf};

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/plier/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("plier")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plier")
    }
}

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/plier/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("plier")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plier")
    }
}

pub fn log_path() -> PathBuf {
    data_dir().join("plier.log")
}

/// Command that hands a path to the desktop's default application.
#[cfg(target_os = "macos")]
pub fn default_opener() -> &'static str {
    "open"
}

#[cfg(all(unix, not(target_os = "macos")))]
pub fn default_opener() -> &'static str {
    "xdg-open"
}

#[cfg(windows)]
pub fn default_opener() -> &'static str {
    "explorer"
}

#[cfg(unix)]
pub fn cec_client_binary_name() -> &'static str {
    "cec-client"
}

#[cfg(windows)]
pub fn cec_client_binary_name() -> &'static str {
    "cec-client.exe"
}

fn find_beside_exe(name: &str) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    let p = dir.join(name);
    if p.exists() {
        return Some(p);
    }
    None
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    #[cfg(unix)]
    let sep = ":";
    #[cfg(windows)]
    let sep = ";";
    for dir in path.split(sep) {
        let p = PathBuf::from(dir).join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

/// Resolve an executable the way a shell would: explicit paths are taken as
/// given, bare names are looked up beside the current exe and then on PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.exists().then(|| candidate.to_path_buf());
    }
    find_beside_exe(name).or_else(|| find_on_path(name))
}
