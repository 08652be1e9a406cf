use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::account::{Role, UserId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("category name must not be empty")]
    EmptyCategoryName,
    #[error("category name `{0}` is used more than once")]
    DuplicateCategoryName(String),
    #[error("discount tiers share the {min_vms}-VM threshold")]
    DuplicateTierThreshold { min_vms: u32 },
    #[error("`{field}` must be {expected}, got {value}")]
    OutOfRange { field: String, expected: &'static str, value: Decimal },
    #[error("unknown account `{0}`")]
    UnknownAccount(UserId),
    #[error("account `{id}` with role {role:?} cannot have a parent reseller")]
    ParentNotAllowed { id: UserId, role: Role },
    #[error("parent `{parent}` of `{child}` must be a reseller, found {role:?}")]
    ParentNotReseller { child: UserId, parent: UserId, role: Role },
    #[error("assigning `{parent}` as parent of `{child}` would create a cycle")]
    CyclicParent { child: UserId, parent: UserId },
    #[error("account `{0}` has no margin semantics")]
    MarginNotApplicable(UserId),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}
