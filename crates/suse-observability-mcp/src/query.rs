//! STQL filter-query builder.
//!
//! Turns the loose, comma-separated filter arguments of the topology tools
//! into a single STQL expression understood by the snapshot API:
//!
//! ```text
//! name IN ("a", "b") AND type IN ("service")
//! name IN ("db") OR withNeighborsOf(components = (name IN ("db")), levels = "2", direction = "down")
//! ```
//!
//! Each recognized field becomes one `IN` clause, clauses are joined with
//! `AND` in a fixed field order, and the whole selection can optionally be
//! widened with `withNeighborsOf`.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum neighbor depth accepted by `withNeighborsOf`.
pub const MAX_NEIGHBOR_LEVELS: u8 = 14;

/// Filter arguments of the `getComponents` tool.
///
/// Every string field is optional and may hold several comma-separated
/// values. Blank tokens are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentFilter {
    /// Component names, matched exactly.
    pub names: String,

    /// Component types (e.g. `pod,service`).
    pub types: String,

    /// Health states (e.g. `CRITICAL,DEVIATING`).
    pub healthstates: String,

    /// Layers (e.g. `Services,Containers`).
    pub layers: String,

    /// Domains; in Kubernetes setups this is the cluster name.
    pub domains: String,

    /// Kubernetes namespaces, matched through the `namespace:<ns>` label.
    pub namespace: String,

    /// Widen the selection with connected components.
    pub with_neighbors: bool,

    /// Neighbor depth: 1-14 or `all` (default 1).
    pub with_neighbors_levels: Option<String>,

    /// Neighbor direction: `up`, `down` or `both` (default both).
    pub with_neighbors_direction: Option<String>,
}

impl ComponentFilter {
    /// Non-empty filter arguments as `(argument, raw value)` pairs, for echoing
    /// back to the caller.
    pub fn applied(&self) -> Vec<(&'static str, &str)> {
        [
            ("names", self.names.as_str()),
            ("types", self.types.as_str()),
            ("healthstates", self.healthstates.as_str()),
            ("layers", self.layers.as_str()),
            ("domains", self.domains.as_str()),
            ("namespace", self.namespace.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }
}

/// STQL fields the builder knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Type,
    HealthState,
    Layer,
    Domain,
    Label,
}

impl FilterField {
    /// Field name as written in STQL.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Type => "type",
            FilterField::HealthState => "healthstate",
            FilterField::Layer => "layer",
            FilterField::Domain => "domain",
            FilterField::Label => "label",
        }
    }
}

/// Depth of a `withNeighborsOf` expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborLevels {
    /// A fixed number of hops in `1..=14`.
    Count(u8),
    /// Every reachable component.
    All,
}

impl Default for NeighborLevels {
    fn default() -> Self {
        NeighborLevels::Count(1)
    }
}

impl NeighborLevels {
    /// Parse a levels argument; blank input yields the default of one level.
    pub fn parse(raw: Option<&str>) -> Result<Self, ToolError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        if raw.eq_ignore_ascii_case("all") {
            return Ok(NeighborLevels::All);
        }
        match raw.parse::<u8>() {
            Ok(n) if (1..=MAX_NEIGHBOR_LEVELS).contains(&n) => Ok(NeighborLevels::Count(n)),
            _ => Err(ToolError::InvalidLevels(raw.to_string())),
        }
    }
}

impl fmt::Display for NeighborLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborLevels::Count(n) => write!(f, "{}", n),
            NeighborLevels::All => f.write_str("all"),
        }
    }
}

/// Direction of a `withNeighborsOf` expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NeighborDirection {
    Up,
    Down,
    #[default]
    Both,
}

impl NeighborDirection {
    /// Parse a direction argument; blank input yields `both`.
    pub fn parse(raw: Option<&str>) -> Result<Self, ToolError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        match raw.to_ascii_lowercase().as_str() {
            "" | "both" => Ok(NeighborDirection::Both),
            "up" => Ok(NeighborDirection::Up),
            "down" => Ok(NeighborDirection::Down),
            _ => Err(ToolError::InvalidDirection(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NeighborDirection::Up => "up",
            NeighborDirection::Down => "down",
            NeighborDirection::Both => "both",
        }
    }
}

/// Split a comma-separated argument into trimmed, non-empty, unique values,
/// keeping first-occurrence order.
pub fn split_values(raw: &str) -> Vec<&str> {
    let mut values: Vec<&str> = Vec::new();
    for token in raw.split(',').map(str::trim) {
        if !token.is_empty() && !values.contains(&token) {
            values.push(token);
        }
    }
    values
}

/// Render `<field> IN ("v1", "v2")`, or `None` when there are no values.
pub fn in_clause<S: AsRef<str>>(field: FilterField, values: &[S]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let quoted: Vec<String> = values.iter().map(|v| quote(v.as_ref())).collect();
    Some(format!("{} IN ({})", field.as_str(), quoted.join(", ")))
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Build the STQL expression for a component filter.
///
/// # Errors
///
/// - [`ToolError::MissingBaseFilter`] when neighbors are requested without a base selection
/// - [`ToolError::InvalidDirection`] / [`ToolError::InvalidLevels`] for bad neighbor options
/// - [`ToolError::InvalidFilter`] when no field yields a clause
pub fn build_query(filter: &ComponentFilter) -> Result<String, ToolError> {
    let namespaces: Vec<String> = split_values(&filter.namespace)
        .into_iter()
        .map(|ns| format!("namespace:{}", ns))
        .collect();

    let clauses: Vec<String> = [
        in_clause(FilterField::Name, &split_values(&filter.names)),
        in_clause(FilterField::Type, &split_values(&filter.types)),
        in_clause(FilterField::HealthState, &split_values(&filter.healthstates)),
        in_clause(FilterField::Layer, &split_values(&filter.layers)),
        in_clause(FilterField::Domain, &split_values(&filter.domains)),
        in_clause(FilterField::Label, &namespaces),
    ]
    .into_iter()
    .flatten()
    .collect();

    let base = clauses.join(" AND ");

    let query = if filter.with_neighbors {
        if base.is_empty() {
            return Err(ToolError::MissingBaseFilter);
        }
        let levels = NeighborLevels::parse(filter.with_neighbors_levels.as_deref())?;
        let direction = NeighborDirection::parse(filter.with_neighbors_direction.as_deref())?;
        with_neighbors_of(&base, levels, direction)
    } else {
        base
    };

    if query.is_empty() {
        return Err(ToolError::InvalidFilter);
    }
    Ok(query)
}

/// Wrap a base selection so it also matches its neighbors.
pub fn with_neighbors_of(
    base: &str,
    levels: NeighborLevels,
    direction: NeighborDirection,
) -> String {
    format!(
        "{base} OR withNeighborsOf(components = ({base}), levels = \"{levels}\", \
         direction = \"{direction}\")",
        base = base,
        levels = levels,
        direction = direction.as_str()
    )
}
