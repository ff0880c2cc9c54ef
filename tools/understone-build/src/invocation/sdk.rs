//! Vulkan SDK discovery
//!
//! An explicitly configured path always wins. Otherwise Windows scans the
//! default install root for versioned directories (`1.3.280.0`) and takes
//! the highest version. POSIX honors `VULKAN_SDK`, then a configured search
//! root, and falls back to the system-wide install found by the linker.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::UserConfiguration;
use crate::error::{BuildError, BuildResult};
use crate::platform::Platform;

/// Default install root of the LunarG installer on Windows
pub const WINDOWS_SDK_ROOT: &str = "C:/VulkanSDK";

/// Environment variable set by the SDK's setup script on POSIX
pub const SDK_ENV_VAR: &str = "VULKAN_SDK";

/// Where the Vulkan headers and libraries come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VulkanSdk {
    /// An SDK directory with `Include/` and `Lib/`
    Installed(PathBuf),
    /// Headers and loader installed system-wide
    System,
}

impl VulkanSdk {
    pub fn path(&self) -> Option<&Path> {
        match self {
            VulkanSdk::Installed(path) => Some(path),
            VulkanSdk::System => None,
        }
    }
}

/// Dotted SDK version; three-component names compare with a trailing zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SdkVersion([u32; 4]);

impl SdkVersion {
    /// Parse `major.minor.patch[.build]`
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if !(3..=4).contains(&parts.len()) {
            return None;
        }

        let mut version = [0u32; 4];
        for (slot, part) in version.iter_mut().zip(&parts) {
            *slot = part.parse().ok()?;
        }
        Some(Self(version))
    }
}

/// Highest versioned SDK directory directly below `search_root`
pub fn find_latest(search_root: &Path) -> BuildResult<PathBuf> {
    let entries = fs::read_dir(search_root).map_err(|_| {
        BuildError::SdkNotFound(format!(
            "Vulkan does not appear to be installed in {}",
            search_root.display()
        ))
    })?;

    let mut latest: Option<(SdkVersion, PathBuf)> = None;
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(version) = SdkVersion::parse(&name) else {
            tracing::warn!(
                "Skipping {}: not a #.#.#[.#] SDK version directory",
                entry.path().display()
            );
            continue;
        };

        if latest.as_ref().map_or(true, |(best, _)| version > *best) {
            latest = Some((version, entry.path()));
        }
    }

    let (_, path) = latest.ok_or_else(|| {
        BuildError::SdkNotFound(format!(
            "no versioned SDK directory found in {}",
            search_root.display()
        ))
    })?;

    if !path.is_dir() {
        return Err(BuildError::SdkNotFound(format!(
            "selected SDK path is invalid: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Resolve the SDK from configuration and the given `VULKAN_SDK` value
pub fn resolve(
    config: &UserConfiguration,
    platform: Platform,
    env_sdk: Option<&str>,
) -> BuildResult<VulkanSdk> {
    if let Some(explicit) = config.vulkan_sdk() {
        return Ok(VulkanSdk::Installed(PathBuf::from(explicit)));
    }

    match platform {
        Platform::Windows => {
            let search_root = config
                .sdk_search_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(WINDOWS_SDK_ROOT));
            find_latest(&search_root).map(VulkanSdk::Installed)
        }
        Platform::Posix => {
            if let Some(env_sdk) = env_sdk.filter(|s| !s.trim().is_empty()) {
                let path = PathBuf::from(env_sdk);
                if !path.is_dir() {
                    return Err(BuildError::SdkNotFound(format!(
                        "{SDK_ENV_VAR} points to a missing directory: {}",
                        path.display()
                    )));
                }
                return Ok(VulkanSdk::Installed(path));
            }
            match &config.sdk_search_root {
                Some(search_root) => find_latest(search_root).map(VulkanSdk::Installed),
                None => Ok(VulkanSdk::System),
            }
        }
    }
}

/// Resolve the SDK for this process, reading `VULKAN_SDK` from the environment
pub fn discover(config: &UserConfiguration, platform: Platform) -> BuildResult<VulkanSdk> {
    let env_sdk = std::env::var(SDK_ENV_VAR).ok();
    let sdk = resolve(config, platform, env_sdk.as_deref())?;
    match &sdk {
        VulkanSdk::Installed(path) => tracing::info!("Using Vulkan SDK at {}", path.display()),
        VulkanSdk::System => tracing::info!("Using the system Vulkan installation"),
    }
    Ok(sdk)
}
