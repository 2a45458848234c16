//! Named transmission media and their refractive indices.

use crate::{Result, SceneError};

/// A transmission medium: a display name and an absolute refractive index.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    refractive_index: f64,
}

impl Material {
    /// The material's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The material's absolute refractive index.
    pub fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
}

/// An append-only table of materials addressed by index.
///
/// Indices are stable for the life of the table, so entities can hold a
/// material index rather than a copy of the material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    /// A table seeded with the common preset media, air first.
    pub fn with_presets() -> MaterialTable {
        let presets: [(&str, f64); 9] = [
            ("Air", 1.00),
            ("Water", 1.33),
            ("Typical glass (soda-lime)", 1.52),
            ("Human eye", 1.39),
            ("Ice", 1.31),
            ("Diamond", 2.42),
            ("Ethanol", 1.36),
            ("PLA plastic", 1.46),
            ("Sapphire", 1.77),
        ];
        MaterialTable {
            materials: presets
                .iter()
                .map(|&(name, refractive_index)| Material {
                    name: name.to_string(),
                    refractive_index,
                })
                .collect(),
        }
    }

    /// How many materials are defined.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the table holds no materials at all.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Whether `index` names a defined material.
    pub fn contains(&self, index: usize) -> bool {
        index < self.materials.len()
    }

    /// The material at `index`.
    pub fn get(&self, index: usize) -> Result<&Material> {
        self.materials
            .get(index)
            .ok_or(SceneError::UnknownMaterial(index))
    }

    /// The refractive index of the material at `index`.
    pub fn refractive_index(&self, index: usize) -> Result<f64> {
        Ok(self.get(index)?.refractive_index)
    }

    /// Define a new material at the end of the table and return its index.
    pub fn add(&mut self, name: &str, refractive_index: f64) -> usize {
        self.materials.push(Material {
            name: name.to_string(),
            refractive_index,
        });
        self.materials.len() - 1
    }

    /// The materials in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_in_order() {
        let table = MaterialTable::with_presets();
        assert_eq!(table.len(), 9);
        assert_eq!(table.get(0).unwrap().name(), "Air");
        assert_eq!(table.refractive_index(0).unwrap(), 1.00);
        assert_eq!(table.get(2).unwrap().name(), "Typical glass (soda-lime)");
        assert_eq!(table.refractive_index(2).unwrap(), 1.52);
        assert_eq!(table.refractive_index(5).unwrap(), 2.42);
        assert_eq!(table.get(8).unwrap().name(), "Sapphire");
    }

    #[test]
    fn test_add_appends() {
        let mut table = MaterialTable::with_presets();
        let index = table.add("Quartz", 1.54);
        assert_eq!(index, 9);
        assert_eq!(table.get(index).unwrap().name(), "Quartz");
        assert!((table.refractive_index(index).unwrap() - 1.54).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_index_is_an_error() {
        let table = MaterialTable::with_presets();
        assert!(matches!(
            table.get(9),
            Err(SceneError::UnknownMaterial(9))
        ));
        assert!(table.contains(8));
        assert!(!table.contains(9));
    }
}
