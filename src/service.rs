// src/service.rs

//! Daemon-facing notification service.
//!
//! Wraps the hub so that a failed watch setup disables notifications for the
//! process lifetime instead of aborting the daemon. This is the type the
//! daemon's streaming RPC surface calls into.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::errors::{CoreWatchError, Result};
use crate::hub::{HubStatus, NotificationHub, SubscriptionHandle};
use crate::refresh::Refresher;
use crate::session::{SessionOutcome, SubscriptionSession, Transport};
use crate::types::EventFilter;

#[derive(Debug)]
enum ServiceState {
    Enabled(NotificationHub),
    Disabled(String),
}

#[derive(Debug)]
pub struct NotificationService {
    state: ServiceState,
}

impl NotificationService {
    /// Start watching the configured hardware directory.
    ///
    /// Never fails: a setup error is logged and leaves the service disabled.
    /// A later change of the configured user directory is not picked up.
    pub fn start(config: &ConfigFile, refresher: Arc<dyn Refresher>) -> Self {
        let Some(user_dir) = config.user_dir() else {
            return Self::disabled("directories.user path is not set");
        };

        match NotificationHub::start(user_dir, refresher, config.hub_options()) {
            Ok(hub) => {
                info!(dir = ?hub.watched_dir(), "notifications enabled");
                Self {
                    state: ServiceState::Enabled(hub),
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot start hardware dir watcher; notifications disabled");
                Self::disabled(err.to_string())
            }
        }
    }

    /// Wrap an already constructed hub.
    pub fn from_hub(hub: NotificationHub) -> Self {
        Self {
            state: ServiceState::Enabled(hub),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Disabled(reason.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, ServiceState::Enabled(_))
    }

    pub fn hub(&self) -> Option<&NotificationHub> {
        match &self.state {
            ServiceState::Enabled(hub) => Some(hub),
            ServiceState::Disabled(_) => None,
        }
    }

    /// `None` while disabled.
    pub fn status(&self) -> Option<HubStatus> {
        self.hub().map(NotificationHub::status)
    }

    pub async fn subscribe(&self, filter: EventFilter) -> Result<SubscriptionHandle> {
        match &self.state {
            ServiceState::Enabled(hub) => hub.subscribe(filter).await,
            ServiceState::Disabled(reason) => {
                Err(CoreWatchError::NotificationsDisabled(reason.clone()))
            }
        }
    }

    /// Stream notifications matching `filter` to `transport` until the
    /// subscription ends or the transport fails.
    pub async fn get_notifications<T: Transport>(
        &self,
        filter: EventFilter,
        transport: T,
    ) -> Result<SessionOutcome> {
        let subscription = self.subscribe(filter).await?;
        Ok(SubscriptionSession::new(subscription, transport).run().await)
    }

    /// Like [`NotificationService::get_notifications`], also ending when
    /// `disconnected` resolves.
    pub async fn get_notifications_until<T, F>(
        &self,
        filter: EventFilter,
        transport: T,
        disconnected: F,
    ) -> Result<SessionOutcome>
    where
        T: Transport,
        F: Future<Output = ()>,
    {
        let subscription = self.subscribe(filter).await?;
        Ok(SubscriptionSession::new(subscription, transport)
            .run_until(disconnected)
            .await)
    }

    pub async fn shutdown(&mut self) {
        if let ServiceState::Enabled(hub) = &mut self.state {
            hub.shutdown().await;
        }
    }
}
