//! Funding/receiving accounts.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::AccountId;
use crate::money::CurrencyCode;

/// A funding/receiving pool. Payments and costs must target an active
/// account whose currency matches the amount being moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub label: String,
    pub currency: CurrencyCode,
    pub is_active: bool,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
