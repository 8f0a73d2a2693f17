//! Local notifier: shows a decoded event on this desktop

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::error::NotifierError;
use super::protocol::NotificationEvent;
use crate::app::ReceiverConfig;

/// Something that can present a notification event to the user
pub trait Notifier {
    /// Fire the side effects for `event`; failures are logged, not returned
    fn notify(&self, event: &NotificationEvent);
}

/// Launches a desktop notification tool and a sound player
///
/// Both processes are started without waiting for them. Their exit status is
/// collected in the background so failures still reach the log.
#[derive(Clone)]
pub struct DesktopNotifier {
    config: ReceiverConfig,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl DesktopNotifier {
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            config,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Arguments for the notification tool, e.g. `notify-send`
    pub fn notify_args(&self, event: &NotificationEvent) -> Vec<String> {
        vec![
            "-u".to_string(),
            event.urgency.to_string(),
            "-t".to_string(),
            event.display_time_ms.to_string(),
            "-c".to_string(),
            self.config.category.clone(),
            "-i".to_string(),
            event.icon.clone(),
            event.title(),
            event.body.clone(),
        ]
    }

    /// Arguments for the sound player, e.g. `play -V0 -q file.wav`
    pub fn sound_args(&self) -> Vec<String> {
        let mut args = self.config.sound_args.clone();
        args.push(self.config.sound_path.to_string_lossy().into_owned());
        args
    }

    /// Wait for every launched process to exit
    pub async fn settle(&self) {
        let handles: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Notifier task failed: {}", e);
            }
        }
    }

    fn launch(&self, program: &str, args: Vec<String>) {
        match spawn(program, &args) {
            Ok(child) => {
                let handle = tokio::spawn(reap(program.to_string(), child));
                if let Ok(mut pending) = self.pending.lock() {
                    pending.retain(|h| !h.is_finished());
                    pending.push(handle);
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, event: &NotificationEvent) {
        tracing::info!(
            "Notification from {} ({}): {}",
            event.title(),
            event.message_type,
            event.body
        );

        self.launch(&self.config.notify_command, self.notify_args(event));
        if self.config.sound_enabled {
            self.launch(&self.config.sound_command, self.sound_args());
        }
    }
}

fn spawn(program: &str, args: &[String]) -> Result<Child, NotifierError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| NotifierError::Spawn {
            command: program.to_string(),
            source,
        })
}

async fn reap(program: String, child: Child) {
    let result = match child.wait_with_output().await {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            Err(NotifierError::Failed {
                command: program.clone(),
                status: output.status,
                output: combined.trim().to_string(),
            })
        }
        Err(e) => {
            tracing::warn!("Failed to wait for `{}`: {}", program, e);
            return;
        }
    };

    match result {
        Ok(()) => tracing::debug!("`{}` finished", program),
        Err(e) => tracing::warn!("{}", e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notify::protocol::{MessageType, Urgency};
    use tempfile::tempdir;

    /// Records every event it is asked to show
    #[derive(Clone, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) events: Arc<Mutex<Vec<NotificationEvent>>>,
    }

    impl RecordingNotifier {
        pub(crate) fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &NotificationEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn sample() -> NotificationEvent {
        NotificationEvent {
            message_type: MessageType::Highlight,
            urgency: Urgency::Normal,
            icon: "utilities-terminal".to_string(),
            display_time_ms: 30000,
            sender: "alice".to_string(),
            channel: "#dev".to_string(),
            body: "hello there".to_string(),
        }
    }

    #[test]
    fn test_notify_args() {
        let notifier = DesktopNotifier::new(ReceiverConfig::default());
        assert_eq!(
            notifier.notify_args(&sample()),
            vec![
                "-u",
                "normal",
                "-t",
                "30000",
                "-c",
                "IRC",
                "-i",
                "utilities-terminal",
                "alice to #dev",
                "hello there",
            ]
        );
        assert_eq!(
            notifier.sound_args(),
            vec!["-V0", "-q", "/usr/share/sounds/purple/receive.wav"]
        );
    }

    fn write_script(path: &std::path::Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_launches_notify_and_sound_once_each() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("calls");
        let notify_script = dir.path().join("notify.sh");
        let sound_script = dir.path().join("sound.sh");
        write_script(
            &notify_script,
            &format!("printf 'notify|%s|%s\\n' \"$9\" \"${{10}}\" >> '{}'", log.display()),
        );
        write_script(
            &sound_script,
            &format!("printf 'sound|%s\\n' \"$1\" >> '{}'", log.display()),
        );

        let config = ReceiverConfig {
            notify_command: notify_script.to_string_lossy().into_owned(),
            sound_command: sound_script.to_string_lossy().into_owned(),
            sound_args: Vec::new(),
            sound_path: "/tmp/ping.wav".into(),
            ..ReceiverConfig::default()
        };
        let notifier = DesktopNotifier::new(config);

        notifier.notify(&sample());
        notifier.settle().await;

        let mut calls: Vec<String> = std::fs::read_to_string(&log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        calls.sort();
        assert_eq!(
            calls,
            vec!["notify|alice to #dev|hello there", "sound|/tmp/ping.wav"]
        );
    }

    #[tokio::test]
    async fn test_sound_can_be_disabled() {
        let config = ReceiverConfig {
            notify_command: "true".to_string(),
            sound_command: "/nonexistent/play".to_string(),
            sound_enabled: false,
            ..ReceiverConfig::default()
        };
        let notifier = DesktopNotifier::new(config);

        notifier.notify(&sample());
        assert_eq!(notifier.pending.lock().unwrap().len(), 1);
        notifier.settle().await;
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_fatal() {
        let config = ReceiverConfig {
            notify_command: "/nonexistent/notify-send".to_string(),
            sound_command: "false".to_string(),
            ..ReceiverConfig::default()
        };
        let notifier = DesktopNotifier::new(config);

        notifier.notify(&sample());
        notifier.notify(&sample());
        notifier.settle().await;
    }

    #[test]
    fn test_spawn_error_names_command() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        let err = spawn("/nonexistent/play", &[]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/play"));
    }
}
