use crate::entry::AppEntry;
use crate::error::LaunchError;
use crate::icons::is_url;
use log::{error, info};
use std::path::Path;

/// Opens a single path, folder or URL. Fire-and-forget: success means the
/// shell accepted the request, nothing more.
pub trait Launcher {
    fn launch(&self, target: &str) -> Result<(), LaunchError>;
}

/// Outcome for one leaf of a launched entry.
#[derive(Debug)]
pub struct LaunchReport {
    pub name: String,
    pub result: Result<(), LaunchError>,
}

impl LaunchReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Launches every leaf of `entry` in order. A failing member is reported and
/// the remaining members are still attempted.
pub fn launch_entry<L: Launcher + ?Sized>(launcher: &L, entry: &AppEntry) -> Vec<LaunchReport> {
    entry
        .leaves()
        .into_iter()
        .map(|leaf| {
            let result = match leaf.path() {
                Some(target) => launcher.launch(target),
                None => Err(LaunchError::NotLaunchable(leaf.name.clone())),
            };
            match &result {
                Ok(()) => info!("launched {}", leaf.name),
                Err(err) => error!("launch of {} failed: {err}", leaf.name),
            }
            LaunchReport {
                name: leaf.name.clone(),
                result,
            }
        })
        .collect()
}

/// Hands targets to the platform shell: URLs to the browser, folders to the
/// file manager, everything else as an open verb.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, target: &str) -> Result<(), LaunchError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(LaunchError::NotLaunchable(String::new()));
        }
        if !is_url(target) && !Path::new(target).exists() {
            return Err(LaunchError::Missing(target.to_string()));
        }
        shell_open(target)
    }
}

#[cfg(windows)]
fn shell_open(target: &str) -> Result<(), LaunchError> {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SHOW_WINDOW_CMD;

    let to_wide = |value: &str| -> Vec<u16> { value.encode_utf16().chain(std::iter::once(0)).collect() };
    let operation = to_wide("open");
    let target_wide = to_wide(target);
    let code = unsafe {
        ShellExecuteW(
            HWND(std::ptr::null_mut()),
            PCWSTR(operation.as_ptr()),
            PCWSTR(target_wide.as_ptr()),
            PCWSTR(std::ptr::null()),
            PCWSTR(std::ptr::null()),
            SHOW_WINDOW_CMD(1),
        )
    };
    // ShellExecuteW reports success with values above 32.
    if code.0 as isize > 32 {
        Ok(())
    } else {
        Err(LaunchError::Spawn {
            target: target.to_string(),
            reason: format!("ShellExecuteW returned {}", code.0 as isize),
        })
    }
}

#[cfg(not(windows))]
fn shell_open(target: &str) -> Result<(), LaunchError> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(opener)
        .arg(target)
        .spawn()
        .map(|_| ())
        .map_err(|err| LaunchError::Spawn {
            target: target.to_string(),
            reason: err.to_string(),
        })
}
