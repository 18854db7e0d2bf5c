//! Table emission order.
//!
//! Tables must be emitted so that every foreign-key target precedes the
//! tables that reference it. Self-references do not constrain the order.

use std::collections::{BTreeSet, HashMap};

use crate::config::TableSpec;
use crate::error::ConfigError;

/// A validated order in which table blocks are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionOrder {
    tables: Vec<String>,
}

impl EmissionOrder {
    /// Accepts the declared order if it is a topological order of the
    /// foreign-key graph.
    pub fn validate(tables: &[TableSpec]) -> Result<Self, ConfigError> {
        let positions = index_by_name(tables)?;

        for (position, table) in tables.iter().enumerate() {
            for target in table.referenced_tables() {
                match positions.get(target) {
                    None => {
                        return Err(ConfigError::UnknownReference {
                            table: table.name().to_string(),
                            references: target.to_string(),
                        });
                    }
                    Some(&target_position) if target_position > position => {
                        return Err(ConfigError::OrderViolation {
                            table: table.name().to_string(),
                            references: target.to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self {
            tables: tables.iter().map(|t| t.name().to_string()).collect(),
        })
    }

    /// Derives an order with Kahn's algorithm.
    ///
    /// Ties are broken by declaration order, so an already valid order is
    /// returned unchanged.
    pub fn sorted(tables: &[TableSpec]) -> Result<Self, ConfigError> {
        let positions = index_by_name(tables)?;

        let mut in_degree = vec![0_usize; tables.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];

        for (index, table) in tables.iter().enumerate() {
            for target in table.referenced_tables() {
                let &target_index =
                    positions
                        .get(target)
                        .ok_or_else(|| ConfigError::UnknownReference {
                            table: table.name().to_string(),
                            references: target.to_string(),
                        })?;
                in_degree[index] += 1;
                dependents[target_index].push(index);
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(index, _)| index)
            .collect();
        let mut result = Vec::with_capacity(tables.len());

        while let Some(index) = ready.pop_first() {
            result.push(tables[index].name().to_string());
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if result.len() != tables.len() {
            let stuck = tables
                .iter()
                .zip(&in_degree)
                .filter(|(_, deg)| **deg > 0)
                .map(|(t, _)| t.name().to_string())
                .collect();
            return Err(ConfigError::CircularDependency(stuck));
        }

        Ok(Self { tables: result })
    }

    /// Returns table names in emission order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.tables
    }

    /// Returns the position of `table`, if present.
    #[must_use]
    pub fn position(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t == table)
    }
}

fn index_by_name(tables: &[TableSpec]) -> Result<HashMap<&str, usize>, ConfigError> {
    let mut positions = HashMap::with_capacity(tables.len());
    for (index, table) in tables.iter().enumerate() {
        if positions.insert(table.name(), index).is_some() {
            return Err(ConfigError::DuplicateTable(table.name().to_string()));
        }
    }
    Ok(positions)
}
