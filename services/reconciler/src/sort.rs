//! Listing sort contract
//!
//! Field names are matched case-insensitively; unrecognized fields fall back
//! to `id` and unrecognized orders to ascending. The sort itself is stable,
//! so rockets that compare equal keep their snapshot order.

use std::cmp::Ordering;

use types::rocket::RocketSummary;

/// Recognized sort fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Type,
    Speed,
    Mission,
    Status,
    UpdatedAt,
}

impl SortField {
    /// Parse a query value, falling back to `Id` for anything unrecognized.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "id" => SortField::Id,
            "type" => SortField::Type,
            "speed" => SortField::Speed,
            "mission" => SortField::Mission,
            "status" => SortField::Status,
            "updatedat" => SortField::UpdatedAt,
            _ => SortField::Id,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a query value, falling back to ascending.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Combined sort options for a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOptions {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortOptions {
    pub fn parse(field: &str, order: &str) -> Self {
        Self {
            field: SortField::parse(field),
            order: SortOrder::parse(order),
        }
    }
}

fn compare(a: &RocketSummary, b: &RocketSummary, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Type => a.rocket_type.cmp(&b.rocket_type),
        SortField::Speed => a.speed.cmp(&b.speed),
        SortField::Mission => a.mission.cmp(&b.mission),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// Stable sort of a listing snapshot.
pub fn sort_summaries(summaries: &mut [RocketSummary], options: SortOptions) {
    summaries.sort_by(|a, b| {
        let ordering = compare(a, b, options.field);
        match options.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
