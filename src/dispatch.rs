//! URL dispatch
//!
//! The OS-level act of routing a URL to whichever app registered its scheme,
//! abstracted behind the [`Dispatcher`] capability so protocol code never sees
//! platform APIs.
//!
//! # Policy
//! `can_open` is advisory only. It is known to answer `false` for installed
//! apps when the URL carries a query, so [`open_with_deadline`] always
//! attempts `open` and treats its result as the only source of truth.
//! A successful `open` means the OS accepted the URL, nothing more: there is
//! no acknowledgement from the receiving app and no retry.

use crate::error::{HandoffError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Platform URL-dispatch capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Whether some app appears to handle `url` (advisory)
    async fn can_open(&self, url: &str) -> bool;

    /// Ask the OS to open `url`; resolves once the OS reports an outcome
    async fn open(&self, url: &str) -> Result<()>;
}

/// Longest wait for `can_open` before opening anyway
const CAN_OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Ask `can_open`, then open regardless of the answer, bounded by `deadline` if given
///
/// `can_open` gets its own short bound (never longer than `deadline`) and
/// silence there is only logged. `deadline` applies to `open` alone; timing
/// out is reported as a dispatch failure. The OS may still deliver the URL
/// later; that cannot be observed from here.
pub async fn open_with_deadline(
    dispatcher: &dyn Dispatcher,
    url: &str,
    deadline: Option<Duration>,
) -> Result<()> {
    let check_limit = deadline.map_or(CAN_OPEN_TIMEOUT, |limit| limit.min(CAN_OPEN_TIMEOUT));
    match tokio::time::timeout(check_limit, dispatcher.can_open(url)).await {
        Ok(advisory) => {
            debug!(advisory, "Capability probe for {} (not used to gate open)", url)
        }
        Err(_) => debug!(
            "can_open gave no answer for {} within {:?}, opening anyway",
            url, check_limit
        ),
    }

    match deadline {
        Some(limit) => tokio::time::timeout(limit, dispatcher.open(url))
            .await
            .map_err(|_| HandoffError::DispatchTimeout {
                url: url.to_string(),
                waited: limit,
            })?,
        None => dispatcher.open(url).await,
    }
}

/// Dispatches by spawning the platform's URL opener
#[derive(Debug, Clone)]
pub struct SystemDispatcher {
    program: String,
    args: Vec<String>,
}

impl SystemDispatcher {
    /// Opener for the current platform
    pub fn new() -> Self {
        if cfg!(target_os = "macos") {
            Self::with_program("open", Vec::new())
        } else if cfg!(target_os = "windows") {
            Self::with_program("rundll32", vec!["url.dll,FileProtocolHandler".to_string()])
        } else {
            Self::with_program("xdg-open", Vec::new())
        }
    }

    /// Use a specific opener; the URL is passed as the last argument
    ///
    /// An opener still running when the dispatch deadline expires is killed.
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn opener_available(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }

        std::env::var_os("PATH")
            .map(|paths| {
                std::env::split_paths(&paths).any(|dir| {
                    dir.join(&self.program).is_file()
                        || dir.join(format!("{}.exe", self.program)).is_file()
                })
            })
            .unwrap_or(false)
    }
}

impl Default for SystemDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatcher for SystemDispatcher {
    async fn can_open(&self, _url: &str) -> bool {
        self.opener_available()
    }

    async fn open(&self, url: &str) -> Result<()> {
        debug!("Spawning {} for {}", self.program, url);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HandoffError::Dispatch {
                url: url.to_string(),
                reason: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(HandoffError::Dispatch {
                url: url.to_string(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        info!("OS accepted {}", url);
        Ok(())
    }
}

/// Records URLs instead of opening them (dry runs)
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    opened: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every `open` fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// URLs passed to `open`, in order (failed attempts included)
    pub async fn opened(&self) -> Vec<String> {
        self.opened.lock().await.clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn can_open(&self, _url: &str) -> bool {
        self.fail_with.is_none()
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().await.push(url.to_string());
        match &self.fail_with {
            Some(reason) => Err(HandoffError::Dispatch {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            None => {
                info!("Dry run, would open {}", url);
                Ok(())
            }
        }
    }
}
