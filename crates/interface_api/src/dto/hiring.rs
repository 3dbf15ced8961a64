//! Hiring DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{Money, ServiceId, UserId};
use domain_hiring::{DeliverableTerms, DeliveryEvent, Hiring, Quotation, QuoteTerms, TimeUnit};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHiringRequest {
    pub provider_id: UserId,
    pub service_id: ServiceId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeliverableRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub price: Money,
    pub estimated_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    pub price: Money,
    pub estimated_hours: Decimal,
    pub estimated_time_unit: TimeUnit,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub validity_days: Option<u32>,
    #[serde(default)]
    #[validate(nested)]
    pub deliverables: Vec<DeliverableRequest>,
}

impl From<CreateQuotationRequest> for QuoteTerms {
    fn from(request: CreateQuotationRequest) -> Self {
        QuoteTerms {
            price: request.price,
            estimated_hours: request.estimated_hours,
            estimated_time_unit: request.estimated_time_unit,
            notes: request.notes,
            validity_days: request.validity_days,
            deliverables: request
                .deliverables
                .into_iter()
                .map(|d| DeliverableTerms {
                    title: d.title,
                    description: d.description,
                    price: d.price,
                    estimated_date: d.estimated_date,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 255))]
    pub preference_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryEventRequest {
    pub event: DeliveryEvent,
}

/// A hiring with its current quotation pulled out of the history
#[derive(Debug, Serialize)]
pub struct HiringResponse {
    #[serde(flatten)]
    pub hiring: Hiring,
    pub current_quotation: Option<Quotation>,
}

impl From<Hiring> for HiringResponse {
    fn from(hiring: Hiring) -> Self {
        let current_quotation = hiring.current_quotation().cloned();
        Self {
            hiring,
            current_quotation,
        }
    }
}
