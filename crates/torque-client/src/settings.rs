//! # Settings Store
//!
//! Holds the shop's pricing settings for the session.
//!
//! ```text
//! ┌────────────┐  GET /api/settings   ┌───────────────┐  snapshot()  ┌─────────┐
//! │  server    │ ───────────────────► │ SettingsStore │ ───────────► │ billing │
//! │            │ ◄─────────────────── │ RwLock<...>   │              └─────────┘
//! └────────────┘  PUT /api/settings   └───────────────┘
//!                 (validated first,
//!                  local copy swapped
//!                  only on success)
//! ```
//!
//! A failed load keeps whatever the store already had (defaults or the
//! configured fallback); a shop that never saved settings gets a 404.
//!
//! Updates run one at a time but never hold the settings lock across the
//! network call, so `snapshot()` stays available while a write is pending.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use torque_core::{SettingsUpdate, ShopSettings};
use tracing::{debug, info, warn};

use crate::controller::RequestController;
use crate::error::{RequestError, SettingsError};
use crate::retry::RetryPolicy;
use crate::signal::AbortSignal;
use crate::transport::ApiTransport;

/// Remote location of the shop settings document.
pub const SETTINGS_PATH: &str = "/api/settings";

/// Session-wide shop settings.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<ShopSettings>,
    /// Serializes `update` calls.
    updating: Mutex<()>,
    policy: RetryPolicy,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(ShopSettings::default())
    }
}

impl SettingsStore {
    /// Creates a store seeded with `initial`, used until a load succeeds.
    pub fn new(initial: ShopSettings) -> Self {
        SettingsStore {
            settings: RwLock::new(initial),
            updating: Mutex::new(()),
            policy: RetryPolicy::default(),
        }
    }

    /// Retry policy for [`load`](Self::load). Updates are never retried.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current settings, for handing to the billing engine.
    pub async fn snapshot(&self) -> ShopSettings {
        self.settings.read().await.clone()
    }

    /// Fetches settings from the server.
    ///
    /// Never fails: on error the current settings are kept and returned.
    pub async fn load(&self, transport: Arc<dyn ApiTransport>) -> ShopSettings {
        let controller: RequestController<(), ShopSettings> =
            RequestController::builder(move |(), signal| {
                let transport = transport.clone();
                async move {
                    transport
                        .get(SETTINGS_PATH, signal)
                        .await
                        .map(|response| response.data)
                }
            })
            .name("settings")
            .retry_policy(self.policy)
            .build();

        match controller.execute(()).await {
            Ok(loaded) => {
                info!(
                    tax_rate = %loaded.tax_rate,
                    labor_rate = %loaded.labor_rate,
                    "Shop settings loaded"
                );
                *self.settings.write().await = loaded.clone();
                loaded
            }
            Err(err) => {
                if err.status_code() == Some(404) {
                    debug!("No saved shop settings, keeping defaults");
                } else {
                    warn!(error = %err, "Failed to load shop settings, keeping current values");
                }
                self.snapshot().await
            }
        }
    }

    /// Validates `update`, writes the merged settings to the server, then
    /// replaces the local copy.
    ///
    /// Nothing is sent when validation fails, and nothing changes locally
    /// when the server rejects the write.
    pub async fn update(
        &self,
        transport: &dyn ApiTransport,
        update: &SettingsUpdate,
    ) -> Result<ShopSettings, SettingsError> {
        let _updating = self.updating.lock().await;
        let next = self.settings.read().await.with_update(update)?;

        let body = serde_json::to_value(&next).map_err(RequestError::from)?;
        let response = transport
            .put(SETTINGS_PATH, body, AbortSignal::never())
            .await?;
        debug!(status = response.status, "Settings update accepted");

        *self.settings.write().await = next.clone();
        info!(update = ?update, "Shop settings updated");
        Ok(next)
    }
}
