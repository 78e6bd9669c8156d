//! Nix system detection.
//!
//! Nix names platforms with a `<arch>-<os>` double such as `x86_64-linux`.
//! The authoritative answer comes from `builtins.currentSystem`; this module
//! derives the same string from the Rust target when nix cannot be asked.
//!
//! ```
//! use storekit::platform;
//!
//! assert_eq!(platform::system_for("linux", "aarch64"), Some("aarch64-linux"));
//! ```

use crate::error::{Error, Result};

/// Map an OS/arch pair (as in [`std::env::consts`]) to a Nix system.
///
/// | OS      | Arch    | System          |
/// |---------|---------|-----------------|
/// | Linux   | x86_64  | x86_64-linux    |
/// | Linux   | ARM64   | aarch64-linux   |
/// | Linux   | x86     | i686-linux      |
/// | Linux   | RISC-V  | riscv64-linux   |
/// | macOS   | x86_64  | x86_64-darwin   |
/// | macOS   | ARM64   | aarch64-darwin  |
pub fn system_for(os: &str, arch: &str) -> Option<&'static str> {
    let system = match (os, arch) {
        ("linux", "x86_64") => "x86_64-linux",
        ("linux", "aarch64") => "aarch64-linux",
        ("linux", "x86") => "i686-linux",
        ("linux", "riscv64") => "riscv64-linux",
        ("macos", "x86_64") => "x86_64-darwin",
        ("macos", "aarch64") => "aarch64-darwin",
        _ => return None,
    };
    Some(system)
}

/// The Nix system of the running binary.
pub fn nix_system() -> Result<String> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    system_for(os, arch)
        .map(str::to_string)
        .ok_or_else(|| Error::UnsupportedSystem {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}
