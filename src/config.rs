use std::env::var_os;

/// Whether captures may use the MIT-SHM fast path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ShmPolicy {
    /// Probe the extension and fall back to plain `GetImage` when missing.
    #[default]
    Auto,
    /// Always transfer pixels in the reply payload.
    Disabled,
}

/// Which Xinerama screen anchors public coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimarySelection {
    /// Xinerama screen 0. Xinerama itself has no notion of a primary screen,
    /// so this is whatever the server happens to list first.
    #[default]
    FirstScreen,
    /// The screen matching the RandR primary monitor, or screen 0 when RandR
    /// reports none.
    RandrPrimary,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub shm: ShmPolicy,
    pub primary: PrimarySelection,
}

impl CaptureConfig {
    /// Reads `XSHOT_NO_SHM` and `XSHOT_PRIMARY`.
    pub fn from_env() -> CaptureConfig {
        let no_shm = var_os("XSHOT_NO_SHM").map(|value| value.to_string_lossy().to_string());
        let primary = var_os("XSHOT_PRIMARY").map(|value| value.to_string_lossy().to_string());

        CaptureConfig::from_values(no_shm.as_deref(), primary.as_deref())
    }

    fn from_values(no_shm: Option<&str>, primary: Option<&str>) -> CaptureConfig {
        let shm = match no_shm {
            Some(value) if !value.is_empty() && value != "0" => ShmPolicy::Disabled,
            _ => ShmPolicy::Auto,
        };

        let primary = match primary {
            Some(value) if value.eq_ignore_ascii_case("randr") => PrimarySelection::RandrPrimary,
            _ => PrimarySelection::FirstScreen,
        };

        CaptureConfig { shm, primary }
    }
}
