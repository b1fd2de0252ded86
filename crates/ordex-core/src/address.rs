//! Delivery address resolution.
//!
//! Extracted `deliver_address` lines go through the address-validation
//! service; without extracted lines the customer's default address is used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AddressError;
use crate::extract::entities::{entity_types, GroupedEntities};
use crate::models::customer::{CustomerAddress, CustomerProfile};
use crate::models::order::{AddressResult, AddressSlots};

/// Components concatenated into the `r` slot, in order.
const R_COMPONENTS: [&str; 4] = ["subpremise", "premise", "locality", "route"];

/// `validateAddress` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressValidationRequest {
    pub address: PostalAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub region_code: String,
    pub address_lines: Vec<String>,
}

impl AddressValidationRequest {
    pub fn new(region_code: impl Into<String>, address_lines: Vec<String>) -> Self {
        Self {
            address: PostalAddress {
                region_code: region_code.into(),
                address_lines,
            },
        }
    }
}

/// `validateAddress` response body. Either `result` or `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AddressValidationResponse {
    pub result: Option<ValidationResult>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationResult {
    pub address: ValidatedAddress,
    pub verdict: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatedAddress {
    pub formatted_address: Option<String>,
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressComponent {
    pub component_type: String,
    pub component_name: ComponentName,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentName {
    pub text: String,
}

/// Trait for address-validation collaborators.
pub trait AddressValidator {
    /// Validate free-form address lines.
    ///
    /// A response carrying an `error` object is returned as `Ok`; the
    /// resolver decides what it means.
    fn validate(
        &self,
        request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse, AddressError>;
}

/// How the delivery address was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressOutcome {
    /// Built from validated extracted lines.
    Validated(AddressResult),
    /// Built from the customer's stored default address.
    CustomerDefault(AddressResult),
    /// No extracted lines and no default address.
    Unavailable,
    /// Extracted lines existed but validation failed.
    Failed(String),
}

impl AddressOutcome {
    /// Resolved address; blank for [`Unavailable`](Self::Unavailable) and
    /// [`Failed`](Self::Failed).
    pub fn result(&self) -> AddressResult {
        match self {
            AddressOutcome::Validated(result) | AddressOutcome::CustomerDefault(result) => {
                result.clone()
            }
            AddressOutcome::Unavailable | AddressOutcome::Failed(_) => AddressResult::default(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AddressOutcome::Failed(_))
    }
}

/// Resolves the six address slots for an order.
pub struct AddressResolver<'a> {
    validator: Option<&'a dyn AddressValidator>,
    region_code: String,
}

impl<'a> AddressResolver<'a> {
    /// Create a resolver. Without a validator, extracted address lines
    /// resolve to [`AddressOutcome::Failed`].
    pub fn new(validator: Option<&'a dyn AddressValidator>, region_code: impl Into<String>) -> Self {
        Self {
            validator,
            region_code: region_code.into(),
        }
    }

    pub fn resolve(&self, grouped: &GroupedEntities, customer: &CustomerProfile) -> AddressOutcome {
        let lines = delivery_lines(grouped);

        if lines.is_empty() {
            return match customer.default_address() {
                Some(address) => {
                    debug!(entity_id = address.entity_id, "Using customer default address");
                    AddressOutcome::CustomerDefault(from_customer_address(address))
                }
                None => {
                    warn!(customer = %customer.name, "No default address found for this customer");
                    AddressOutcome::Unavailable
                }
            };
        }

        let Some(validator) = self.validator else {
            warn!("Address validation is disabled; leaving address blank");
            return AddressOutcome::Failed("address validation disabled".to_string());
        };

        let request = AddressValidationRequest::new(self.region_code.clone(), lines.clone());
        let response = match validator.validate(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Address validation failed");
                return AddressOutcome::Failed(e.to_string());
            }
        };

        match from_response(&lines, response) {
            Ok(result) => {
                info!(postcode = %result.slots.v, "Validated delivery address");
                AddressOutcome::Validated(result)
            }
            Err(e) => {
                warn!(error = %e, "Address validation failed");
                AddressOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Extracted delivery address lines, first occurrence order, no duplicates.
/// Blank mentions are kept: they still mean the document named an address.
fn delivery_lines(grouped: &GroupedEntities) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in grouped.values(entity_types::DELIVER_ADDRESS) {
        if !lines.contains(line) {
            lines.push(line.clone());
        }
    }
    lines
}

/// Map a validation response onto address slots.
pub fn from_response(
    address_lines: &[String],
    response: AddressValidationResponse,
) -> Result<AddressResult, AddressError> {
    if let Some(error) = response.error {
        return Err(AddressError::Service(error.to_string()));
    }
    let result = response
        .result
        .ok_or_else(|| AddressError::Response("missing result".to_string()))?;

    let components: BTreeMap<String, String> = result
        .address
        .address_components
        .into_iter()
        .map(|c| (c.component_type, c.component_name.text))
        .collect();
    let component = |name: &str| components.get(name).cloned().unwrap_or_default();

    let poi = component("point_of_interest");
    let q = if poi.split_whitespace().count() >= 2 {
        poi
    } else {
        address_lines.first().cloned().unwrap_or_default()
    };

    let r = R_COMPONENTS
        .iter()
        .filter_map(|name| components.get(*name))
        .filter(|value| !value.is_empty() && !q.contains(value.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let slots = AddressSlots {
        r,
        s: String::new(),
        t: component("postal_town"),
        u: component("administrative_area_level_2"),
        v: component("postal_code"),
        q,
    };

    Ok(AddressResult {
        slots,
        formatted_address: result.address.formatted_address,
        verdict: result.verdict,
        components,
    })
}

/// Map a stored customer address onto address slots.
pub fn from_customer_address(address: &CustomerAddress) -> AddressResult {
    AddressResult::from_slots(AddressSlots {
        q: address.address_code.clone().unwrap_or_default(),
        r: address.street.clone(),
        s: String::new(),
        t: address.city.clone(),
        u: address.country.clone(),
        v: address.postcode.clone(),
    })
}
