//! Hiring domain services
//!
//! Services orchestrate the aggregate with its collaborators: the store,
//! the identity service and the clock. Every mutating operation runs under
//! the per-hiring lock, reloads the aggregate, applies one aggregate method
//! and saves with a version check.

use std::sync::Arc;

use tracing::{info, instrument};

use core_kernel::{Clock, EngineSettings, HiringId, KeyedLocks, ServiceId, UserId};
use domain_party::{ensure_active, Actor, IdentityPort, PartyRole};

use crate::error::HiringError;
use crate::events;
use crate::hiring::{DeliveryEvent, Hiring};
use crate::ports::HiringRepository;

/// Collaborators shared by every service that mutates hirings
#[derive(Clone)]
pub struct HiringContext {
    pub hirings: Arc<dyn HiringRepository>,
    pub identity: Arc<dyn IdentityPort>,
    pub clock: Arc<dyn Clock>,
    pub locks: Arc<KeyedLocks>,
    pub settings: EngineSettings,
}

impl HiringContext {
    pub fn new(
        hirings: Arc<dyn HiringRepository>,
        identity: Arc<dyn IdentityPort>,
        clock: Arc<dyn Clock>,
        locks: Arc<KeyedLocks>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            hirings,
            identity,
            clock,
            locks,
            settings,
        }
    }

    /// Loads a hiring, mapping a missing row to `HiringError::NotFound`
    pub async fn load(&self, id: HiringId) -> Result<Hiring, HiringError> {
        self.hirings
            .get(id)
            .await
            .map_err(|e| HiringError::from_lookup(id, e))
    }

    /// Saves the hiring and publishes the events it accumulated
    pub async fn commit(&self, hiring: &mut Hiring) -> Result<(), HiringError> {
        self.hirings.save(hiring).await?;
        events::publish(hiring.take_events());
        Ok(())
    }

    pub(crate) async fn require_active(
        &self,
        user_id: UserId,
        role: PartyRole,
        acting: bool,
    ) -> Result<(), HiringError> {
        ensure_active(self.identity.as_ref(), user_id, role, acting).await?;
        Ok(())
    }
}

/// Lifecycle operations outside quotation negotiation
pub struct HiringService {
    ctx: HiringContext,
}

impl HiringService {
    pub fn new(ctx: HiringContext) -> Self {
        Self { ctx }
    }

    /// Opens a hiring between the calling client and a provider
    ///
    /// # Errors
    ///
    /// - `Validation` when client and provider are the same user
    /// - `UserBannedOrDeleted` when either party cannot act
    /// - `DuplicateActiveHiring` when a non-terminal hiring already exists
    #[instrument(skip(self), fields(client_id = %actor.user_id))]
    pub async fn create_hiring(
        &self,
        actor: &Actor,
        provider_id: UserId,
        service_id: ServiceId,
    ) -> Result<Hiring, HiringError> {
        let client_id = actor.user_id;
        let _guard = self.ctx.locks.lock(client_id).await;

        let mut hiring = Hiring::new(client_id, provider_id, service_id, self.ctx.clock.now())?;
        self.ctx.require_active(client_id, PartyRole::Client, true).await?;
        self.ctx.require_active(provider_id, PartyRole::Provider, false).await?;

        let duplicate = || HiringError::DuplicateActiveHiring {
            client_id,
            provider_id,
            service_id,
        };
        if self
            .ctx
            .hirings
            .find_active_for(client_id, provider_id, service_id)
            .await?
            .is_some()
        {
            return Err(duplicate());
        }
        self.ctx.hirings.insert(&hiring).await.map_err(|e| {
            if e.is_conflict() {
                duplicate()
            } else {
                HiringError::Port(e)
            }
        })?;

        events::publish(hiring.take_events());
        info!(hiring_id = %hiring.id, "hiring created");
        Ok(hiring)
    }

    /// Reads a hiring
    pub async fn get(&self, hiring_id: HiringId) -> Result<Hiring, HiringError> {
        self.ctx.load(hiring_id).await
    }

    /// Client starts (or retries) checkout with a gateway preference
    #[instrument(skip(self, preference_id), fields(user_id = %actor.user_id))]
    pub async fn initiate_checkout(
        &self,
        hiring_id: HiringId,
        actor: &Actor,
        preference_id: String,
    ) -> Result<Hiring, HiringError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        if !hiring.is_client(actor.user_id) {
            return Err(HiringError::Forbidden {
                hiring_id,
                user_id: actor.user_id,
                action: "check out",
            });
        }
        self.ctx.require_active(actor.user_id, PartyRole::Client, true).await?;

        hiring.start_checkout(preference_id, self.ctx.clock.now())?;
        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, "checkout started");
        Ok(hiring)
    }

    /// Pass-through gate for delivery-subsystem progress
    #[instrument(skip(self))]
    pub async fn apply_delivery_event(
        &self,
        hiring_id: HiringId,
        event: DeliveryEvent,
    ) -> Result<Hiring, HiringError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        hiring.apply_delivery_event(event, self.ctx.clock.now())?;
        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, status = %hiring.status, "delivery event applied");
        Ok(hiring)
    }

    /// Either party abandons the hiring before payment
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub async fn cancel(&self, hiring_id: HiringId, actor: &Actor) -> Result<Hiring, HiringError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        if !hiring.is_party(actor.user_id) {
            return Err(HiringError::Forbidden {
                hiring_id,
                user_id: actor.user_id,
                action: "cancel",
            });
        }

        hiring.cancel(self.ctx.clock.now())?;
        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, "hiring cancelled");
        Ok(hiring)
    }
}
