//! The launch command sent to the device.
//!
//! A single shell line performs three steps so only one round trip through
//! the debug bridge is needed:
//!
//! ```text
//! input keyevent 224                       wake the display
//! monkey -p <package> -c <launcher> 1      raise the streaming app
//! am start -a VIEW -d "<deep link>" <pkg>  open the title from the beginning
//! ```
//!
//! Raising the app with a launcher intent also makes the TV's HDMI-CEC logic
//! switch its input to the streaming stick; the launch relies on that.

use std::fmt;

use super::content_id::ContentId;

/// Android key code for `KEYCODE_WAKEUP`.
pub const KEYCODE_WAKEUP: u16 = 224;

/// Package name of the streaming application on the device.
pub const TARGET_PACKAGE: &str = "com.disney.disneyplus";

/// Base URL of the streaming service's playback deep links.
pub const DEEP_LINK_BASE: &str = "https://www.disneyplus.com/play/";

/// Query string asking the player to start from the beginning.
///
/// Apps that do not understand it simply resume where the viewer left off.
pub const START_FROM_BEGINNING: &str = "startTime=0";

/// A fully rendered shell command line.
///
/// Only constructible from a validated [`ContentId`], so the interpolated
/// identifier never contains quotes or shell metacharacters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand(String);

impl ControlCommand {
    /// Renders the wake / raise / deep-link sequence for `id`.
    ///
    /// Pure: the same id always yields the same command string.
    pub fn launch(id: &ContentId) -> Self {
        let wake = format!("input keyevent {KEYCODE_WAKEUP}");
        let raise = format!("monkey -p {TARGET_PACKAGE} -c android.intent.category.LAUNCHER 1");
        let open = format!(
            "am start -a android.intent.action.VIEW -d \"{}\" {TARGET_PACKAGE}",
            deep_link(id)
        );
        Self(format!("{wake}; {raise}; {open}"))
    }

    /// Returns the command line as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the playback deep link for `id`.
pub fn deep_link(id: &ContentId) -> String {
    format!("{DEEP_LINK_BASE}{id}?{START_FROM_BEGINNING}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
