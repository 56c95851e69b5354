//! Territories and move routes.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::unit::UnitId;

/// A territory and the units currently in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub name: String,
    #[serde(default)]
    pub owner: PlayerId,
    #[serde(default)]
    pub units: Vec<UnitId>,
}

impl Territory {
    pub fn new(name: &str, owner: &str) -> Self {
        Territory {
            name: name.to_string(),
            owner: PlayerId::new(owner),
            units: Vec::new(),
        }
    }

    /// A territory nobody owns.
    pub fn unowned(name: &str) -> Self {
        Territory {
            name: name.to_string(),
            owner: PlayerId::null(),
            units: Vec::new(),
        }
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }
}

/// An ordered path of territory names, start first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Route {
    steps: Vec<String>,
}

impl Route {
    /// Builds a route. Returns `None` for an empty path.
    pub fn new<I, S>(steps: I) -> Option<Route>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps: Vec<String> = steps.into_iter().map(Into::into).collect();
        if steps.is_empty() {
            None
        } else {
            Some(Route { steps })
        }
    }

    pub fn start(&self) -> &str {
        &self.steps[0]
    }

    pub fn end(&self) -> &str {
        &self.steps[self.steps.len() - 1]
    }

    /// Territories strictly between start and end.
    pub fn middle_steps(&self) -> &[String] {
        if self.steps.len() <= 2 {
            &[]
        } else {
            &self.steps[1..self.steps.len() - 1]
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl TryFrom<Vec<String>> for Route {
    type Error = &'static str;

    fn try_from(steps: Vec<String>) -> Result<Self, Self::Error> {
        Route::new(steps).ok_or("route must contain at least one territory")
    }
}

impl From<Route> for Vec<String> {
    fn from(route: Route) -> Self {
        route.steps
    }
}
