use geo::Point;

use crate::FieldErrors;

/// Identifier assigned to a persisted [`Venue`].
pub type VenueId = i64;

const NAME_MAX_CHARS: usize = 200;

/// A physical place where game sessions may be hosted.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub description: String,
    pub location: Option<Point<f64>>,
}

/// A venue that has not been persisted yet, or the replacement values for
/// an existing one.
///
/// # Examples
/// ```
/// use finder_core::NewVenue;
/// use geo::Point;
///
/// let venue = NewVenue::new("lower house").at(Point::new(-6.278249, 53.352439));
/// assert!(venue.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVenue {
    pub name: String,
    pub description: String,
    pub location: Option<Point<f64>>,
}

impl NewVenue {
    /// Start a venue draft with the given name and no location.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the venue's location.
    #[must_use]
    pub fn at(mut self, location: Point<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Draft carrying the current values of a stored venue.
    #[must_use]
    pub fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            description: venue.description.clone(),
            location: venue.location,
        }
    }

    /// Check field constraints, reporting every violation at once.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.require_text("name", &self.name, NAME_MAX_CHARS);
        errors.check_point("location", self.location.as_ref());
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn venue_requires_name() {
        let errors = NewVenue::new("").validate().expect_err("blank name");
        assert_eq!(errors.field_names().collect::<Vec<_>>(), ["name"]);
    }

    #[rstest]
    fn venue_name_is_limited() {
        let errors = NewVenue::new("x".repeat(201))
            .validate()
            .expect_err("long name");
        assert_eq!(errors.messages("name").len(), 1);
    }

    #[rstest]
    fn from_venue_copies_fields() {
        let venue = Venue {
            id: 3,
            name: "gamers world".into(),
            description: "shop".into(),
            location: Some(Point::new(-6.26, 53.34)),
        };
        let draft = NewVenue::from_venue(&venue);
        assert_eq!(draft.name, "gamers world");
        assert_eq!(draft.location, venue.location);
    }
}
