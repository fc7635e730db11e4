//! Explicit environment for child processes.
//!
//! Tools are never launched with the ambient environment. Only the
//! variables they need are set: `HOME`, `PATH`, `TMPDIR`, and on Termux
//! `LD_LIBRARY_PATH` pointing at the prefix's `lib` directory. A handful of
//! locale and certificate variables are passed through untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default Termux installation prefix.
pub const TERMUX_PREFIX: &str = "/data/data/com.termux/files/usr";

/// Variables copied verbatim from the parent when present.
const PASSTHROUGH: &[&str] = &["LANG", "LC_ALL", "SSL_CERT_FILE", "SYSTEMROOT"];

/// Variable set handed to every external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<String, String>,
}

impl ToolEnvironment {
    /// Build the environment from the current process.
    ///
    /// The Termux layout is used when `PREFIX` names a directory with a
    /// `bin/` inside, or when the default Termux prefix exists.
    pub fn from_host() -> Self {
        let prefix = std::env::var_os("PREFIX")
            .map(PathBuf::from)
            .filter(|p| p.join("bin").is_dir())
            .or_else(|| {
                let default = PathBuf::from(TERMUX_PREFIX);
                default.is_dir().then_some(default)
            });

        Self::build(|key| std::env::var(key).ok(), prefix.as_deref())
    }

    /// Build the environment from an arbitrary variable lookup.
    pub fn build<F>(lookup: F, termux_prefix: Option<&Path>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = BTreeMap::new();
        let ambient_path = lookup("PATH").unwrap_or_default();

        if let Some(home) = lookup("HOME") {
            vars.insert("HOME".to_string(), home);
        }

        match termux_prefix {
            Some(prefix) => {
                let prefix = prefix.display();
                vars.insert("LD_LIBRARY_PATH".to_string(), format!("{prefix}/lib"));
                vars.insert("TMPDIR".to_string(), format!("{prefix}/tmp"));
                let path = if ambient_path.is_empty() {
                    format!("{prefix}/bin")
                } else {
                    format!("{prefix}/bin:{ambient_path}")
                };
                vars.insert("PATH".to_string(), path);
            }
            None => {
                let tmp = lookup("TMPDIR")
                    .unwrap_or_else(|| std::env::temp_dir().to_string_lossy().into_owned());
                vars.insert("TMPDIR".to_string(), tmp);
                vars.insert("PATH".to_string(), ambient_path);
            }
        }

        for key in PASSTHROUGH {
            if let Some(value) = lookup(key) {
                vars.insert((*key).to_string(), value);
            }
        }

        Self { vars }
    }

    /// Look up a single variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn apply(&self, cmd: &mut tokio::process::Command) {
        cmd.env_clear();
        cmd.envs(self.iter());
    }
}
