use std::sync::Arc;

use geo::{Intersects, MultiPolygon, Point};

use crate::SpatialRelation;

/// Identifier assigned to a persisted [`County`].
pub type CountyId = i64;

/// An administrative boundary used for province filtering and point lookup.
///
/// Counties are not linked to venues or sessions; they are only consulted
/// through spatial predicates. The geometry is shared so filters can hold on
/// to it without copying the rings.
#[derive(Debug, Clone, PartialEq)]
pub struct County {
    pub id: CountyId,
    pub name: String,
    pub province: Option<String>,
    pub geometry: Arc<MultiPolygon<f64>>,
}

impl County {
    /// Whether the point lies inside the county or on its boundary.
    #[must_use]
    pub fn covers(&self, point: &Point<f64>) -> bool {
        SpatialRelation::CoveredBy.holds_for_area(&self.geometry, point)
    }

    /// Whether the point touches the county at all.
    #[must_use]
    pub fn intersects(&self, point: &Point<f64>) -> bool {
        self.geometry.intersects(point)
    }

    /// Case-insensitive comparison of the province label.
    ///
    /// Counties without a province never match.
    #[must_use]
    pub fn in_province(&self, province: &str) -> bool {
        self.province
            .as_deref()
            .is_some_and(|label| label.to_lowercase() == province.to_lowercase())
    }
}

/// A county boundary awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCounty {
    pub name: String,
    pub province: Option<String>,
    pub geometry: MultiPolygon<f64>,
}
