use std::collections::HashMap;

use crate::tracker::MIN_CYCLE_MEAN_DAYS;

/// Expected cycle length and dispersion for a product category, used to
/// seed a tracker before any history exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prior {
    pub mean_days: f64,
    pub mad_days: f64,
}

pub const DEFAULT_PRIOR: Prior = Prior {
    mean_days: 7.0,
    mad_days: 2.0,
};

/// Immutable category-to-prior lookup, built once at boot and passed around
/// as a read-only handle.
#[derive(Clone, Debug, Default)]
pub struct PriorTable {
    entries: HashMap<String, Prior>,
}

impl PriorTable {
    /// The builtin catalog, keyed by category id slug.
    pub fn builtin() -> Self {
        let mut table = Self::default();

        for (id, mean_days, mad_days) in [
            ("dairy-eggs", 5.0, 2.0),
            ("bread-bakery", 4.0, 1.5),
            ("meat-poultry", 4.0, 2.0),
            ("fish-seafood", 3.0, 1.5),
            ("fruits", 6.0, 2.5),
            ("vegetables", 5.0, 2.0),
            ("grains-pasta", 35.0, 10.0),
            ("canned-jarred", 75.0, 15.0),
            ("condiments-sauces", 45.0, 15.0),
            ("snacks", 10.0, 5.0),
            ("beverages", 7.0, 3.0),
            ("frozen-foods", 45.0, 15.0),
            ("spices-seasonings", 75.0, 20.0),
        ] {
            table.insert(id, Prior {
                mean_days,
                mad_days,
            });
        }

        table
    }

    pub fn insert(&mut self, category_id: impl Into<String>, prior: Prior) {
        self.entries.insert(category_id.into(), Prior {
            mean_days: prior.mean_days.max(MIN_CYCLE_MEAN_DAYS),
            mad_days: prior.mad_days.max(0.0),
        });
    }

    /// Unknown or absent categories fall back to the default prior.
    pub fn lookup(&self, category_id: Option<&str>) -> Prior {
        category_id
            .and_then(|id| self.entries.get(id).copied())
            .unwrap_or(DEFAULT_PRIOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_resolve() {
        let table = PriorTable::builtin();
        assert_eq!(table.lookup(Some("dairy-eggs")), Prior {
            mean_days: 5.0,
            mad_days: 2.0
        });
        assert_eq!(table.lookup(Some("spices-seasonings")), Prior {
            mean_days: 75.0,
            mad_days: 20.0
        });
    }

    #[test]
    fn unknown_and_missing_fall_back() {
        let table = PriorTable::builtin();
        assert_eq!(table.lookup(Some("exotic")), DEFAULT_PRIOR);
        assert_eq!(table.lookup(None), DEFAULT_PRIOR);
    }

    #[test]
    fn overrides_are_floored() {
        let mut table = PriorTable::builtin();
        table.insert("samples", Prior {
            mean_days: 0.1,
            mad_days: -3.0,
        });
        let prior = table.lookup(Some("samples"));
        assert_eq!(prior.mean_days, MIN_CYCLE_MEAN_DAYS);
        assert_eq!(prior.mad_days, 0.0);
    }
}
