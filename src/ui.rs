// UI layer: credential prompts via `dialoguer` and `indicatif` spinners
// around the slow network calls. Nothing here is needed when the binary
// runs non-interactively with credentials in the environment.

use crate::api::Uploader;
use crate::error::Result;
use anyhow::Context;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Username and password, asking on the terminal for whichever is missing.
pub fn resolve_credentials(
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<(String, String)> {
    let username = match username {
        Some(u) => u,
        None => Input::new()
            .with_prompt("SM.MS username")
            .interact_text()
            .context("Failed to read username")?,
    };
    // `Password` hides input in the terminal.
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("SM.MS password")
            .interact()
            .context("Failed to read password")?,
    };
    Ok((username, password))
}

/// A ticking spinner with `message`. Call `finish_and_clear` when done.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Shows a spinner for the duration of each upload of the wrapped client.
pub struct SpinnerUploader<U> {
    inner: U,
}

impl<U: Uploader> SpinnerUploader<U> {
    pub fn new(inner: U) -> Self {
        SpinnerUploader { inner }
    }
}

impl<U: Uploader> Uploader for SpinnerUploader<U> {
    fn upload(&self, path: &Path) -> Result<String> {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        let spinner = spinner(format!("Uploading {name}..."));
        let result = self.inner.upload(path);
        spinner.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Uploader for Echo {
        fn upload(&self, path: &Path) -> Result<String> {
            Ok(format!("https://host{}", path.display()))
        }
    }

    #[test]
    fn provided_credentials_skip_prompts() {
        let (u, p) = resolve_credentials(Some("alice".into()), Some("secret".into())).unwrap();
        assert_eq!((u.as_str(), p.as_str()), ("alice", "secret"));
    }

    #[test]
    fn spinner_uploader_passes_result_through() {
        let up = SpinnerUploader::new(Echo);
        assert_eq!(up.upload(Path::new("/a.png")).unwrap(), "https://host/a.png");
    }
}
