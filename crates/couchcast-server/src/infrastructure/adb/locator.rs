//! Finds the local `adb` executable.
//!
//! Search order:
//!
//! 1. `PATH` (via the `which` crate).
//! 2. Conventional SDK install locations for the current platform:
//!    - Windows: `%LOCALAPPDATA%\Android\Sdk\platform-tools\adb.exe`, and
//!      `platform-tools\adb.exe` under `%ANDROID_HOME%` / `%ANDROID_SDK_ROOT%`
//!      (plus the nested `Android\Sdk` layout some installers use).
//!    - POSIX: `$ANDROID_HOME` / `$ANDROID_SDK_ROOT` platform-tools, the
//!      Android Studio defaults under the home directory, then the
//!      package-manager locations.
//!
//! The result is computed once per [`BinaryLocator`] and reused; the
//! environment is not expected to change while the server runs.  Not finding
//! adb is a normal outcome, reported as `None`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, warn};

/// Which family of install locations to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    fn executable_name(self) -> &'static str {
        match self {
            Platform::Windows => "adb.exe",
            Platform::Posix => "adb",
        }
    }
}

/// Memoizing lookup of the adb executable.
#[derive(Debug, Default)]
pub struct BinaryLocator {
    resolved: OnceLock<Option<PathBuf>>,
}

impl BinaryLocator {
    /// A locator that searches `PATH` and the platform install locations on
    /// first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// A locator whose answer is fixed up front.  No search or file check is
    /// performed.
    pub fn fixed(path: Option<PathBuf>) -> Self {
        Self {
            resolved: OnceLock::from(path),
        }
    }

    /// A locator for a user-supplied path (`--adb-path`).  A path that is not
    /// an existing file is treated as adb not being installed.
    pub fn explicit(path: PathBuf) -> Self {
        if path.is_file() {
            info!("using adb at {}", path.display());
            Self::fixed(Some(path))
        } else {
            warn!("adb path {} is not a file", path.display());
            Self::fixed(None)
        }
    }

    /// Whether the answer is already known, i.e. [`locate`](Self::locate)
    /// will not touch the file system.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Returns the adb executable path, searching on the first call only.
    pub fn locate(&self) -> Option<&Path> {
        self.resolved.get_or_init(search).as_deref()
    }
}

fn search() -> Option<PathBuf> {
    let platform = Platform::current();

    if let Ok(path) = which::which(platform.executable_name()) {
        info!("using adb from PATH: {}", path.display());
        return Some(path);
    }

    let candidates = candidate_paths(
        platform,
        |key| std::env::var_os(key),
        dirs::home_dir(),
    );
    let found = candidates.into_iter().find(|p| {
        debug!("checking for adb at {}", p.display());
        p.is_file()
    });

    match &found {
        Some(path) => info!("using adb at {}", path.display()),
        None => info!("adb not found on PATH or in SDK install locations"),
    }
    found
}

/// Returns the install locations to probe, in order, for `platform`.
///
/// `env` reads an environment variable; unset or empty variables are
/// skipped.  `home` is the user's home directory, if known.
pub fn candidate_paths(
    platform: Platform,
    env: impl Fn(&str) -> Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let exe = platform.executable_name();
    let root = |key: &str| env(key).filter(|v| !v.is_empty()).map(PathBuf::from);
    let mut paths = Vec::new();

    match platform {
        Platform::Windows => {
            if let Some(local) = root("LOCALAPPDATA") {
                paths.push(local.join("Android").join("Sdk").join("platform-tools").join(exe));
            }
            for key in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
                if let Some(sdk) = root(key) {
                    paths.push(sdk.join("platform-tools").join(exe));
                    paths.push(sdk.join("Android").join("Sdk").join("platform-tools").join(exe));
                }
            }
        }
        Platform::Posix => {
            for key in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
                if let Some(sdk) = root(key) {
                    paths.push(sdk.join("platform-tools").join(exe));
                }
            }
            if let Some(home) = home {
                paths.push(home.join("Android").join("Sdk").join("platform-tools").join(exe));
                paths.push(
                    home.join("Library")
                        .join("Android")
                        .join("sdk")
                        .join("platform-tools")
                        .join(exe),
                );
            }
            for fixed in ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"] {
                paths.push(Path::new(fixed).join(exe));
            }
        }
    }

    paths
}

// ── Tests ─────────────────────────────────────────────────────────────────────
