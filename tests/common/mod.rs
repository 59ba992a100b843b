#![allow(dead_code)]

use async_trait::async_trait;
use obsctl::api::{ApiClient, CommandLogger, ProgressFactory, ProgressIndicator};
use obsctl::auth::{Login, LoginError};
use obsctl::config::{AuthMethod, ClientSettings, Profile, SharedProfile};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a progress indicator was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Start(String),
    Stop(bool),
    Hidden,
}

/// Progress factory whose indicators record every call into one shared log
#[derive(Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Start(_)))
            .count()
    }

    /// Stops of either kind, visible or hidden
    pub fn stops(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Stop(_) | ProgressEvent::Hidden))
            .count()
    }
}

struct RecordingIndicator {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressIndicator for RecordingIndicator {
    fn start(&mut self, label: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::Start(label.to_string()));
    }

    fn stop(&mut self, success: bool) {
        self.events.lock().unwrap().push(ProgressEvent::Stop(success));
    }

    fn stop_hidden(&mut self) {
        self.events.lock().unwrap().push(ProgressEvent::Hidden);
    }
}

impl ProgressFactory for RecordingProgress {
    fn create(&self) -> Box<dyn ProgressIndicator> {
        Box::new(RecordingIndicator {
            events: self.events.clone(),
        })
    }
}

/// Login that hands out the next scripted token, or fails
pub struct ScriptedLogin {
    tokens: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLogin {
    /// Each login pops the next token; once they run out, login fails
    pub fn new(tokens: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tokens: Mutex::new(tokens.iter().rev().map(|t| t.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(&[])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Login for ScriptedLogin {
    async fn login(&self, profile: &SharedProfile) -> Result<(), LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.tokens.lock().unwrap().pop();
        match next {
            Some(token) => {
                profile.write().await.token = token;
                Ok(())
            }
            None => Err(LoginError::InvalidResponse("no token scripted".to_string())),
        }
    }
}

/// Login that takes `delay` before handing out a token
pub struct SlowLogin {
    pub delay: Duration,
}

#[async_trait]
impl Login for SlowLogin {
    async fn login(&self, profile: &SharedProfile) -> Result<(), LoginError> {
        tokio::time::sleep(self.delay).await;
        profile.write().await.token = "late".to_string();
        Ok(())
    }
}

/// Collects curl commands instead of logging them
#[derive(Default)]
pub struct RecordingCommandLogger {
    pub commands: Mutex<Vec<String>>,
}

impl CommandLogger for RecordingCommandLogger {
    fn log_command(&self, command: &str) {
        self.commands.lock().unwrap().push(command.to_string());
    }
}

/// Service-principal profile pointing at `url` with a cached token
pub fn profile(url: &str, token: &str) -> SharedProfile {
    let mut profile = Profile::new(url, AuthMethod::ServicePrincipal);
    profile.token = token.to_string();
    profile.into_shared()
}

/// Client wired to test doubles
pub fn client(
    profile: SharedProfile,
    login: Arc<dyn Login>,
    progress: &RecordingProgress,
) -> ApiClient {
    ApiClient::builder(profile)
        .login(login)
        .progress(Arc::new(progress.clone()))
        .build()
        .unwrap()
}

/// Client that renders curl commands into `logger`
pub fn curlified_client(
    profile: SharedProfile,
    login: Arc<ScriptedLogin>,
    logger: Arc<RecordingCommandLogger>,
) -> ApiClient {
    ApiClient::builder(profile)
        .settings(ClientSettings {
            curlify: true,
            ..ClientSettings::default()
        })
        .login(login)
        .progress(Arc::new(RecordingProgress::default()))
        .command_logger(logger)
        .build()
        .unwrap()
}
