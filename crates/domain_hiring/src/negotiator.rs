//! Quotation negotiation
//!
//! Providers quote, clients may ask for a new quotation once the current
//! one has lapsed. Re-quotes are bounded; after the limit the caller has to
//! cancel and start a new hiring. No payment side effects happen here.

use tracing::{info, instrument};

use core_kernel::HiringId;
use domain_party::{Actor, PartyRole};

use crate::error::HiringError;
use crate::hiring::Hiring;
use crate::quotation::{QuoteTerms, Quotation};
use crate::services::HiringContext;

pub struct QuotationNegotiator {
    ctx: HiringContext,
}

impl QuotationNegotiator {
    pub fn new(ctx: HiringContext) -> Self {
        Self { ctx }
    }

    /// Provider issues a quotation on a hiring awaiting one
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is the hiring's provider
    /// - `InvalidState` unless the hiring is `pending_quote`, including
    ///   while an unexpired quotation is current
    /// - `Validation` for non-positive price or effort, zero validity, or
    ///   deliverables that do not add up
    #[instrument(skip(self, terms), fields(user_id = %actor.user_id))]
    pub async fn create_quotation(
        &self,
        hiring_id: HiringId,
        actor: &Actor,
        terms: QuoteTerms,
    ) -> Result<Hiring, HiringError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        if !hiring.is_provider(actor.user_id) {
            return Err(HiringError::Forbidden {
                hiring_id,
                user_id: actor.user_id,
                action: "quote",
            });
        }
        self.ctx.require_active(actor.user_id, PartyRole::Provider, true).await?;

        let now = self.ctx.clock.now();
        let quotation = Quotation::issue(terms, now, self.ctx.settings.default_validity_days)?;
        let quotation_id = quotation.id;
        hiring.attach_quotation(quotation, now)?;

        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, quotation_id = %quotation_id, "quotation issued");
        Ok(hiring)
    }

    /// Client asks for a new quotation after the current one expired
    ///
    /// Checks, in order: the actor is the client, both parties are active,
    /// the current quotation is `quoted`, it has expired, and the re-quote
    /// counter is below the configured limit.
    #[instrument(skip(self), fields(user_id = %requested_by.user_id))]
    pub async fn request_requote(
        &self,
        hiring_id: HiringId,
        requested_by: &Actor,
    ) -> Result<Hiring, HiringError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        if !hiring.is_client(requested_by.user_id) {
            return Err(HiringError::Forbidden {
                hiring_id,
                user_id: requested_by.user_id,
                action: "request a re-quote",
            });
        }
        self.ctx.require_active(hiring.client_id, PartyRole::Client, true).await?;
        self.ctx.require_active(hiring.provider_id, PartyRole::Provider, false).await?;

        let limit = self.ctx.settings.requote_limit;
        let retry_count = hiring
            .request_requote(limit, self.ctx.clock.now())
            .inspect_err(|e| {
                if matches!(e, HiringError::RequoteLimitReached { .. }) {
                    tracing::warn!(hiring_id = %hiring_id, limit, "re-quote limit reached");
                }
            })?;

        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, retry_count, limit, "re-quote requested");
        Ok(hiring)
    }
}
