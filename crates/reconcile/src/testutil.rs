//! In-memory nix backend that records every call

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use storekit::backend::Backend;
use storekit::{Client, Error, InstallArgs, ProfileItem, StorePath};

const HASH: &str = "0c0ahfnlrxkwfsqzvdkdrfxwqz4rvf61";

/// Store path for `<name>-<version>` with a fixed hash
pub fn sp(name_part: &str) -> StorePath {
    StorePath::parse(&format!("/nix/store/{HASH}-{name_part}")).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    System,
    Eval(String),
    List(PathBuf),
    Remove(Vec<String>),
    Install {
        path: String,
        step: String,
        offline: bool,
    },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Remove(_) | Call::Install { .. })
    }
}

/// Shared views into a [`FakeNix`] after it was boxed into a client
#[derive(Clone)]
pub struct Recorder {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub profile: Arc<Mutex<Vec<Vec<StorePath>>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn installed(&self) -> Vec<StorePath> {
        self.profile.lock().unwrap().iter().flatten().cloned().collect()
    }
}

pub struct FakeNix {
    recorder: Recorder,
    desired: Option<String>,
    fail_list: bool,
    fail_remove: bool,
    fail_install: Option<StorePath>,
}

impl FakeNix {
    /// Profile holding one element per path, flake evaluating to `desired`
    pub fn new(installed: &[StorePath], desired: &[StorePath]) -> Self {
        let json = serde_json::to_string(desired).unwrap();
        Self {
            recorder: Recorder {
                calls: Arc::default(),
                profile: Arc::new(Mutex::new(
                    installed.iter().map(|p| vec![p.clone()]).collect(),
                )),
            },
            desired: Some(json),
            fail_list: false,
            fail_remove: false,
            fail_install: None,
        }
    }

    /// Add one element that provides several outputs
    pub fn with_element(self, paths: &[StorePath]) -> Self {
        self.recorder.profile.lock().unwrap().push(paths.to_vec());
        self
    }

    pub fn with_raw_eval(mut self, json: &str) -> Self {
        self.desired = Some(json.to_string());
        self
    }

    pub fn failing_eval(mut self) -> Self {
        self.desired = None;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn failing_install(mut self, path: &StorePath) -> Self {
        self.fail_install = Some(path.clone());
        self
    }

    pub fn into_client(self) -> (Client, Recorder) {
        let recorder = self.recorder.clone();
        (Client::with_backend(Box::new(self)), recorder)
    }

    fn record(&self, call: Call) {
        self.recorder.calls.lock().unwrap().push(call);
    }
}

impl Backend for FakeNix {
    fn is_available(&self) -> bool {
        true
    }

    fn current_system(&self) -> storekit::Result<String> {
        self.record(Call::System);
        Ok("x86_64-linux".to_string())
    }

    fn eval_json(&self, installable: &str) -> storekit::Result<Vec<u8>> {
        self.record(Call::Eval(installable.to_string()));
        match &self.desired {
            Some(json) => Ok(json.clone().into_bytes()),
            None => Err(Error::from_nix_output(
                "error: flake does not provide attribute 'devShells'",
                "nix eval",
            )),
        }
    }

    fn profile_list(&self, profile: &Path) -> storekit::Result<Vec<ProfileItem>> {
        self.record(Call::List(profile.to_path_buf()));
        if self.fail_list {
            return Err(Error::from_nix_output("error: permission denied", "nix profile list"));
        }
        Ok(self
            .recorder
            .profile
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(index, paths)| ProfileItem {
                index,
                name: None,
                active: true,
                attr_path: None,
                original_url: None,
                url: None,
                store_paths: paths.clone(),
            })
            .collect())
    }

    fn profile_remove(&self, _profile: &Path, paths: &[StorePath]) -> storekit::Result<()> {
        self.record(Call::Remove(
            paths.iter().map(|p| p.as_str().to_string()).collect(),
        ));
        if self.fail_remove {
            return Err(Error::from_nix_output("error: something odd", "nix profile remove"));
        }
        let mut profile = self.recorder.profile.lock().unwrap();
        for element in profile.iter_mut() {
            element.retain(|p| !paths.contains(p));
        }
        profile.retain(|element| !element.is_empty());
        Ok(())
    }

    fn profile_install(
        &self,
        _profile: &Path,
        args: &InstallArgs,
        out: &mut dyn Write,
    ) -> storekit::Result<()> {
        self.record(Call::Install {
            path: args.installable.as_str().to_string(),
            step: args.step_message.clone(),
            offline: args.offline,
        });
        let _ = writeln!(out, "{}", args.step_message);
        if self.fail_install.as_ref() == Some(&args.installable) {
            return Err(Error::from_nix_output(
                &format!("error: path '{}' is not valid", args.installable),
                "nix profile install",
            ));
        }
        self.recorder
            .profile
            .lock()
            .unwrap()
            .push(vec![args.installable.clone()]);
        Ok(())
    }
}
