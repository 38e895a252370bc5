//! Composable predicates over [`SessionRecord`] values.
//!
//! Filters are built as a tree of [`Predicate`] nodes: categories combine
//! with logical AND while alternatives within a category (the text fields of
//! a free-text search, the geometry sources of a spatial test) combine with
//! OR. [`SessionFilter`] assembles the tree from request parameters and
//! skips categories whose parameter is blank.

use std::sync::Arc;

use crate::{County, Region, SessionRecord, SpatialRelation};

/// Text fields reachable by a free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    GameSystem,
    VenueName,
}

impl TextField {
    fn value(self, record: &SessionRecord) -> Option<&str> {
        match self {
            Self::Title => Some(record.session.title.as_str()),
            Self::Description => Some(record.session.description.as_str()),
            Self::GameSystem => Some(record.session.game_system.as_str()),
            Self::VenueName => record.venue_name(),
        }
    }
}

/// Where a spatial predicate reads its point from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// The session's own stored location.
    Session,
    /// The location of the venue the session references.
    Venue,
}

impl GeometrySource {
    fn point(self, record: &SessionRecord) -> Option<geo::Point<f64>> {
        match self {
            Self::Session => record.session.location,
            Self::Venue => record.venue.as_ref().and_then(|venue| venue.location),
        }
    }
}

/// A boolean condition over a session and its venue.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    Always,
    /// Matches when every child matches.
    All(Vec<Predicate>),
    /// Matches when at least one child matches.
    Any(Vec<Predicate>),
    /// Case-insensitive substring match. The needle is stored lowercased.
    Contains { field: TextField, needle: String },
    /// Exact game system label.
    GameSystemIs(String),
    /// Session accepts sign-ups.
    IsOpen,
    /// Session has a location of its own.
    HasOwnLocation,
    /// The point read from `source` relates to `region`. Records without
    /// that point never match.
    Located {
        source: GeometrySource,
        relation: SpatialRelation,
        region: Region,
    },
}

impl Predicate {
    /// Case-insensitive substring predicate on a single field.
    #[must_use]
    pub fn contains(field: TextField, needle: &str) -> Self {
        Self::Contains {
            field,
            needle: needle.to_lowercase(),
        }
    }

    /// Evaluate the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &SessionRecord) -> bool {
        match self {
            Self::Always => true,
            Self::All(children) => children.iter().all(|child| child.matches(record)),
            Self::Any(children) => children.iter().any(|child| child.matches(record)),
            Self::Contains { field, needle } => field
                .value(record)
                .is_some_and(|value| value.to_lowercase().contains(needle.as_str())),
            Self::GameSystemIs(system) => record.session.game_system == *system,
            Self::IsOpen => record.session.is_open,
            Self::HasOwnLocation => record.session.location.is_some(),
            Self::Located {
                source,
                relation,
                region,
            } => source
                .point(record)
                .is_some_and(|point| relation.holds(region, &point)),
        }
    }

    /// Conjunction, flattening nested `All` nodes and dropping `Always`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Always, other) | (other, Self::Always) => other,
            (Self::All(mut left), Self::All(right)) => {
                left.extend(right);
                Self::All(left)
            }
            (Self::All(mut left), other) => {
                left.push(other);
                Self::All(left)
            }
            (this, other) => Self::All(vec![this, other]),
        }
    }

    /// Disjunction, flattening nested `Any` nodes.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Any(mut left), Self::Any(right)) => {
                left.extend(right);
                Self::Any(left)
            }
            (Self::Any(mut left), other) => {
                left.push(other);
                Self::Any(left)
            }
            (this, other) => Self::Any(vec![this, other]),
        }
    }

    /// The session's point, or failing that its venue's point, relates to
    /// `region` under any of the given relations.
    #[must_use]
    pub fn either_location(region: &Region, relations: &[SpatialRelation]) -> Self {
        let alternatives = [GeometrySource::Session, GeometrySource::Venue]
            .into_iter()
            .flat_map(|source| {
                relations.iter().map(move |relation| Self::Located {
                    source,
                    relation: *relation,
                    region: region.clone(),
                })
            })
            .collect();
        Self::Any(alternatives)
    }
}

/// Builder translating request parameters into a [`Predicate`].
///
/// # Examples
/// ```
/// use finder_core::SessionFilter;
///
/// let filter = SessionFilter::new()
///     .text("  ")
///     .game_system("Kill Team")
///     .open_only(true);
/// // Blank text is ignored, so only the system and open checks remain.
/// assert_eq!(filter.predicate().to_string().matches("AND").count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFilter {
    predicate: Predicate,
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFilter {
    /// A filter accepting every session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicate: Predicate::Always,
        }
    }

    fn with(self, predicate: Predicate) -> Self {
        Self {
            predicate: self.predicate.and(predicate),
        }
    }

    /// Free-text search over title, description, game system and venue name.
    #[must_use]
    pub fn text(self, query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return self;
        }
        let any_field = [
            TextField::Title,
            TextField::Description,
            TextField::GameSystem,
            TextField::VenueName,
        ]
        .into_iter()
        .map(|field| Predicate::contains(field, query))
        .collect();
        self.with(Predicate::Any(any_field))
    }

    /// Exact game system match.
    #[must_use]
    pub fn game_system(self, system: &str) -> Self {
        let system = system.trim();
        if system.is_empty() {
            return self;
        }
        self.with(Predicate::GameSystemIs(system.to_owned()))
    }

    /// Keep only open sessions when `enabled`.
    #[must_use]
    pub fn open_only(self, enabled: bool) -> Self {
        if enabled {
            self.with(Predicate::IsOpen)
        } else {
            self
        }
    }

    /// Keep sessions located in any of the given counties.
    ///
    /// The counties are the province's members, already resolved by the
    /// caller. An empty slice leaves the filter unchanged, so an unknown
    /// province behaves as if no province had been requested. Boundary
    /// points are accepted.
    #[must_use]
    pub fn province(self, counties: &[County]) -> Self {
        if counties.is_empty() {
            return self;
        }
        let relations = [
            SpatialRelation::Within,
            SpatialRelation::CoveredBy,
            SpatialRelation::Intersects,
        ];
        let any_county = counties
            .iter()
            .map(|county| {
                Predicate::either_location(&Region::Area(Arc::clone(&county.geometry)), &relations)
            })
            .fold(Predicate::Any(Vec::new()), Predicate::or);
        self.with(any_county)
    }

    /// Keep sessions whose own point or venue point lies within `region`.
    #[must_use]
    pub fn within(self, region: &Region) -> Self {
        self.with(Predicate::either_location(region, &[SpatialRelation::Within]))
    }

    /// Keep sessions that have a location of their own.
    #[must_use]
    pub fn with_own_location(self) -> Self {
        self.with(Predicate::HasOwnLocation)
    }

    /// The assembled predicate.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Whether the record passes every category.
    #[must_use]
    pub fn matches(&self, record: &SessionRecord) -> bool {
        self.predicate.matches(record)
    }

    /// Retain matching records, preserving their order.
    #[must_use]
    pub fn apply(&self, records: Vec<SessionRecord>) -> Vec<SessionRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "TRUE"),
            Self::All(children) => write_joined(f, children, " AND "),
            Self::Any(children) => write_joined(f, children, " OR "),
            Self::Contains { field, needle } => write!(f, "{field:?} ~ {needle:?}"),
            Self::GameSystemIs(system) => write!(f, "GameSystem = {system:?}"),
            Self::IsOpen => write!(f, "IsOpen"),
            Self::HasOwnLocation => write!(f, "HasOwnLocation"),
            Self::Located {
                source, relation, ..
            } => write!(f, "{source:?} {relation:?} region"),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    children: &[Predicate],
    separator: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (position, child) in children.iter().enumerate() {
        if position > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}
