//! Real nix CLI backend using `nix` commands.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{InstallArgs, NixOptions, ProfileItem, StorePath};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const EXPERIMENTAL_FEATURES: &str = "nix-command flakes";

/// Backend that executes real `nix` commands.
pub struct NixBackend {
    /// Path to the nix executable
    nix_path: PathBuf,
    options: NixOptions,
}

impl NixBackend {
    /// Create a new NixBackend.
    ///
    /// Returns an error if nix is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_program(find_nix()?))
    }

    /// Use an explicit nix executable.
    pub fn with_program(nix_path: impl Into<PathBuf>) -> Self {
        Self {
            nix_path: nix_path.into(),
            options: NixOptions::default(),
        }
    }

    /// Set invocation options.
    pub fn with_options(mut self, options: NixOptions) -> Self {
        self.options = options;
        self
    }

    /// Base command with experimental features and environment applied.
    fn nix(&self) -> Command {
        let mut cmd = Command::new(&self.nix_path);
        cmd.args(["--extra-experimental-features", EXPERIMENTAL_FEATURES]);
        if self.options.allow_unfree {
            cmd.env("NIXPKGS_ALLOW_UNFREE", "1");
        }
        if self.options.allow_insecure {
            cmd.env("NIXPKGS_ALLOW_INSECURE", "1");
        }
        cmd
    }

    fn eval_command(&self, installable: &str) -> Command {
        let mut cmd = self.nix();
        cmd.args(["eval", installable, "--json"]);
        if self.options.impure() {
            cmd.arg("--impure");
        }
        cmd
    }

    fn list_command(&self, profile: &Path) -> Command {
        let mut cmd = self.nix();
        cmd.args(["profile", "list", "--json", "--profile"]).arg(profile);
        cmd
    }

    fn remove_command(&self, profile: &Path, paths: &[StorePath]) -> Command {
        let mut cmd = self.nix();
        cmd.args(["profile", "remove", "--profile"]).arg(profile);
        cmd.args(paths);
        cmd
    }

    fn install_command(&self, profile: &Path, args: &InstallArgs) -> Command {
        let mut cmd = self.nix();
        cmd.args(["profile", "install", "--profile"]).arg(profile);
        if args.offline {
            cmd.arg("--offline");
        }
        if self.options.impure() {
            cmd.arg("--impure");
        }
        cmd.arg(&args.installable);
        cmd
    }

    /// Run a nix command and return its output, whatever the exit status.
    fn run(&self, mut cmd: Command, label: &str) -> Result<Output> {
        log::debug!("running {}", describe(&cmd));
        cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NixNotFound
            } else {
                Error::CommandFailed {
                    command: label.to_string(),
                    stderr: e.to_string(),
                }
            }
        })
    }

    /// Run a nix command and check for success, returning stdout.
    fn run_checked(&self, cmd: Command, label: &str) -> Result<Vec<u8>> {
        let output = self.run(cmd, label)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::debug!("{label} exited with {}: {}", output.status, stderr.trim());
            return Err(Error::from_nix_output(&stderr, label));
        }

        Ok(output.stdout)
    }
}

impl Backend for NixBackend {
    fn is_available(&self) -> bool {
        let mut cmd = Command::new(&self.nix_path);
        cmd.arg("--version");
        self.run(cmd, "nix --version")
            .is_ok_and(|o| o.status.success())
    }

    fn current_system(&self) -> Result<String> {
        let mut cmd = self.nix();
        cmd.args([
            "eval",
            "--impure",
            "--raw",
            "--expr",
            "builtins.currentSystem",
        ]);
        let stdout = self.run_checked(cmd, "nix eval builtins.currentSystem")?;
        let system = String::from_utf8_lossy(&stdout).trim().to_string();
        if system.is_empty() {
            return Err(Error::UnexpectedOutput {
                command: "nix eval builtins.currentSystem".to_string(),
                output: String::new(),
                message: "empty system".to_string(),
            });
        }
        Ok(system)
    }

    fn eval_json(&self, installable: &str) -> Result<Vec<u8>> {
        self.run_checked(self.eval_command(installable), "nix eval")
    }

    fn profile_list(&self, profile: &Path) -> Result<Vec<ProfileItem>> {
        // Only a path with no directory entry at all is a profile that was
        // never written to. Dangling links and unreadable parents go to nix.
        match std::fs::symlink_metadata(profile) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("profile {} does not exist yet", profile.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let stdout = self.run_checked(self.list_command(profile), "nix profile list")?;
        parse_profile_list(&stdout)
    }

    fn profile_remove(&self, profile: &Path, paths: &[StorePath]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run_checked(self.remove_command(profile, paths), "nix profile remove")?;
        Ok(())
    }

    fn profile_install(
        &self,
        profile: &Path,
        args: &InstallArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        progress(out, &args.step_message);
        log::info!(
            "installing {} ({}) into {}",
            args.package_name,
            args.installable,
            profile.display()
        );

        self.run_checked(self.install_command(profile, args), "nix profile install")?;

        progress(out, &format!("{}: done", args.step_message));
        Ok(())
    }
}

/// Write one progress line; a failed write never fails the operation.
fn progress(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        log::warn!("could not write progress output: {e}");
    }
}

/// Find the nix executable path.
fn find_nix() -> Result<PathBuf> {
    if let Ok(path) = which::which("nix") {
        return Ok(path);
    }

    let mut candidates = vec![
        PathBuf::from("/nix/var/nix/profiles/default/bin/nix"), // multi-user install
        PathBuf::from("/run/current-system/sw/bin/nix"),        // NixOS
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".nix-profile/bin/nix")); // single-user install
    }

    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or(Error::NixNotFound)
}

/// Render a command line for logs.
fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// `nix profile list --json`
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawProfileList {
    #[serde(default)]
    elements: RawElements,
}

/// Manifest v2 lists elements; v3 keys them by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawElements {
    List(Vec<RawElement>),
    Map(BTreeMap<String, RawElement>),
}

impl Default for RawElements {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    #[serde(default = "default_active")]
    active: bool,
    attr_path: Option<String>,
    original_url: Option<String>,
    url: Option<String>,
    #[serde(default)]
    store_paths: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// Parse the JSON printed by `nix profile list --json`.
///
/// Every store path must be valid; one malformed path fails the listing.
pub(crate) fn parse_profile_list(stdout: &[u8]) -> Result<Vec<ProfileItem>> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let raw: RawProfileList =
        serde_json::from_slice(stdout).map_err(|e| Error::UnexpectedOutput {
            command: "nix profile list".to_string(),
            output: String::from_utf8_lossy(stdout).trim().to_string(),
            message: e.to_string(),
        })?;

    let named: Vec<(Option<String>, RawElement)> = match raw.elements {
        RawElements::List(list) => list.into_iter().map(|e| (None, e)).collect(),
        RawElements::Map(map) => map.into_iter().map(|(k, e)| (Some(k), e)).collect(),
    };

    named
        .into_iter()
        .enumerate()
        .map(|(index, (name, element))| {
            let store_paths = element
                .store_paths
                .iter()
                .map(|p| StorePath::parse(p))
                .collect::<Result<Vec<_>>>()?;
            Ok(ProfileItem {
                index,
                name,
                active: element.active,
                attr_path: element.attr_path,
                original_url: element.original_url,
                url: element.url,
                store_paths,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    const HELLO: &str = "/nix/store/0c0ahfnlrxkwfsqzvdkdrfxwqz4rvf61-hello-2.12.1";
    const JQ_BIN: &str = "/nix/store/1c0ahfnlrxkwfsqzvdkdrfxwqz4rvf61-jq-1.7.1-bin";
    const JQ_MAN: &str = "/nix/store/2c0ahfnlrxkwfsqzvdkdrfxwqz4rvf61-jq-1.7.1-man";

    fn args_of(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_parse_profile_list_v2_array() {
        let json = format!(
            r#"{{"version":2,"elements":[
                {{"active":true,"attrPath":"packages.x86_64-linux.hello","originalUrl":"flake:nixpkgs","url":"github:NixOS/nixpkgs/abc","storePaths":["{HELLO}"]}},
                {{"active":true,"storePaths":["{JQ_BIN}","{JQ_MAN}"]}}
            ]}}"#
        );
        let items = parse_profile_list(json.as_bytes()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].name, None);
        assert_eq!(
            items[0].attr_path.as_deref(),
            Some("packages.x86_64-linux.hello")
        );
        assert_eq!(items[1].store_paths().len(), 2);
        assert_eq!(items[1].store_paths()[1].as_str(), JQ_MAN);
    }

    #[test]
    fn test_parse_profile_list_v3_map() {
        let json = format!(
            r#"{{"version":3,"elements":{{
                "jq":{{"active":true,"priority":5,"storePaths":["{JQ_BIN}"]}},
                "hello":{{"active":false,"storePaths":["{HELLO}"]}}
            }}}}"#
        );
        let items = parse_profile_list(json.as_bytes()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("hello"));
        assert!(!items[0].active);
        assert_eq!(items[1].name.as_deref(), Some("jq"));
    }

    #[test]
    fn test_parse_profile_list_empty() {
        assert!(parse_profile_list(b"").unwrap().is_empty());
        assert!(parse_profile_list(b"{\"version\":3,\"elements\":{}}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_profile_list_rejects_bad_store_path() {
        let json = r#"{"version":2,"elements":[{"storePaths":["/tmp/not-a-store-path"]}]}"#;
        let err = parse_profile_list(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidStorePath { .. }));
    }

    #[test]
    fn test_parse_profile_list_rejects_garbage() {
        let err = parse_profile_list(b"Name: hello\n").unwrap_err();
        assert!(matches!(err, Error::UnexpectedOutput { .. }));
    }

    #[test]
    fn test_install_command_offline() {
        let backend = NixBackend::with_program("/bin/nix");
        let args = InstallArgs::offline(StorePath::parse(HELLO).unwrap(), "[1/1] hello@2.12.1");
        let cmd = backend.install_command(Path::new("/tmp/profile"), &args);

        assert_eq!(cmd.get_program(), OsStr::new("/bin/nix"));
        assert_eq!(
            args_of(&cmd),
            [
                "--extra-experimental-features",
                "nix-command flakes",
                "profile",
                "install",
                "--profile",
                "/tmp/profile",
                "--offline",
                HELLO,
            ]
            .map(OsStr::new)
        );
    }

    #[test]
    fn test_install_command_impure_with_unfree() {
        let backend = NixBackend::with_program("nix").with_options(NixOptions {
            allow_unfree: true,
            allow_insecure: false,
        });
        let mut args = InstallArgs::offline(StorePath::parse(HELLO).unwrap(), "x");
        args.offline = false;
        let cmd = backend.install_command(Path::new("/p"), &args);

        let argv = args_of(&cmd);
        assert!(argv.contains(&OsStr::new("--impure")));
        assert!(!argv.contains(&OsStr::new("--offline")));
        assert!(
            cmd.get_envs()
                .any(|(k, v)| k == "NIXPKGS_ALLOW_UNFREE" && v == Some(OsStr::new("1")))
        );
    }

    #[test]
    fn test_remove_command_passes_all_paths() {
        let backend = NixBackend::with_program("nix");
        let paths = [
            StorePath::parse(HELLO).unwrap(),
            StorePath::parse(JQ_BIN).unwrap(),
        ];
        let cmd = backend.remove_command(Path::new("/p"), &paths);
        let argv = args_of(&cmd);

        assert_eq!(&argv[2..6], ["profile", "remove", "--profile", "/p"].map(OsStr::new));
        assert_eq!(&argv[6..], [HELLO, JQ_BIN].map(OsStr::new));
    }

    #[test]
    fn test_eval_command() {
        let backend = NixBackend::with_program("nix");
        let cmd = backend.eval_command("/f#devShells.x86_64-linux.default.buildInputs");
        assert_eq!(
            &args_of(&cmd)[2..],
            [
                "eval",
                "/f#devShells.x86_64-linux.default.buildInputs",
                "--json"
            ]
            .map(OsStr::new)
        );
    }

    #[test]
    fn test_profile_list_missing_profile_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        // The program is never run for a missing profile.
        let backend = NixBackend::with_program("/nonexistent/nix");
        let items = backend.profile_list(&dir.path().join("profile")).unwrap();
        assert!(items.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_list_dangling_link_asks_nix() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile");
        std::os::unix::fs::symlink(dir.path().join("profile-7-link"), &profile).unwrap();

        let backend = NixBackend::with_program(dir.path().join("no-nix-here"));
        let err = backend.profile_list(&profile).unwrap_err();
        assert!(matches!(err, Error::NixNotFound));
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_list_unreadable_parent_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();

        let backend = NixBackend::with_program(dir.path().join("no-nix-here"));
        let err = backend.profile_list(&file.join("profile")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    /// Writer whose every write fails.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_install_ignores_progress_write_failures() {
        // Any program that accepts arbitrary arguments and exits 0.
        let Ok(truth) = which::which("true") else {
            return;
        };
        let backend = NixBackend::with_program(truth);
        let args = InstallArgs::offline(StorePath::parse(HELLO).unwrap(), "[1/1] hello@2.12.1");

        backend
            .profile_install(Path::new("/p"), &args, &mut ClosedPipe)
            .unwrap();
    }

    #[test]
    fn test_missing_program_is_nix_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NixBackend::with_program(dir.path().join("no-nix-here"));
        let err = backend.eval_json("x").unwrap_err();
        assert!(matches!(err, Error::NixNotFound));
        assert!(!backend.is_available());
    }

    #[test]
    fn test_describe() {
        let mut cmd = Command::new("nix");
        cmd.args(["profile", "list"]);
        assert_eq!(describe(&cmd), "nix profile list");
    }
}
