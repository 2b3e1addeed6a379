use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::CommerceError;

/// Lifecycle of an order: `pending -> confirmed -> shipped -> delivered`, with
/// `cancelled` reachable from `pending` and `confirmed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses whose totals are reported as revenue.
    pub const REVENUE: [OrderStatus; 3] = [Self::Confirmed, Self::Shipped, Self::Delivered];

    pub fn counts_as_revenue(self) -> bool {
        Self::REVENUE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Forward edges of the state machine.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                CommerceError::InvalidStatus(format!(
                    "Invalid status '{}'. Valid: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// How strictly administrative status changes are checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Only forward edges; terminal states cannot be left.
    #[default]
    Strict,
    /// Any status may follow any other.
    Permissive,
}

impl StatusPolicy {
    pub fn check(self, from: OrderStatus, to: OrderStatus) -> Result<(), CommerceError> {
        if from == to || self == Self::Permissive || from.can_advance_to(to) {
            return Ok(());
        }

        if from.is_terminal() {
            return Err(CommerceError::InvalidStatus(format!(
                "Order is already {} and cannot move to {}",
                from, to
            )));
        }

        Err(CommerceError::InvalidStatus(format!(
            "Cannot move order from {} to {}",
            from, to
        )))
    }
}

impl FromStr for StatusPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(anyhow::anyhow!("Unknown order status policy '{}'", other)),
        }
    }
}
