//! Flattened material snapshots used by the writers

use serde::{Deserialize, Serialize};

/// Orthotropic engineering constants
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthotropicConstants {
    pub e1: f64,
    pub e2: f64,
    pub e3: f64,
    pub nu12: f64,
    pub nu13: f64,
    pub nu23: f64,
    pub g12: f64,
    pub g13: f64,
    pub g23: f64,
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
}

/// Elastic behaviour of a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialModel {
    Isotropic {
        /// Young's modulus
        e: f64,
        /// Poisson's ratio
        nu: f64,
        /// Thermal expansion coefficient
        alpha: f64,
    },
    Orthotropic(OrthotropicConstants),
}

/// Export-ready copy of a material definition
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFeaMaterial {
    pub name: String,
    pub density: f64,
    pub model: MaterialModel,
}

impl SimpleFeaMaterial {
    /// Create an isotropic material from E, nu, density and expansion coefficient
    pub fn isotropic(name: impl Into<String>, e: f64, nu: f64, density: f64, alpha: f64) -> Self {
        Self {
            name: name.into(),
            density,
            model: MaterialModel::Isotropic { e, nu, alpha },
        }
    }

    pub fn orthotropic(name: impl Into<String>, density: f64, constants: OrthotropicConstants) -> Self {
        Self {
            name: name.into(),
            density,
            model: MaterialModel::Orthotropic(constants),
        }
    }

    pub fn is_orthotropic(&self) -> bool {
        matches!(self.model, MaterialModel::Orthotropic(_))
    }

    /// Isotropic shear modulus G = E / (2 * (1 + nu)); `None` for orthotropic materials
    pub fn shear_modulus(&self) -> Option<f64> {
        match self.model {
            MaterialModel::Isotropic { e, nu, .. } => Some(e / (2.0 * (1.0 + nu))),
            MaterialModel::Orthotropic(_) => None,
        }
    }

    /// Name usable as a solver keyword value (spaces replaced)
    pub fn keyword_name(&self) -> String {
        self.name.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_isotropic_shear_modulus() {
        let mat = SimpleFeaMaterial::isotropic("Aluminum 7075-T6", 71.7e9, 0.33, 2810.0, 2.36e-5);
        assert_relative_eq!(mat.shear_modulus().unwrap(), 71.7e9 / 2.66, max_relative = 1e-12);
        assert_eq!(mat.keyword_name(), "Aluminum_7075-T6");
        assert!(!mat.is_orthotropic());
    }

    #[test]
    fn test_orthotropic_has_no_single_shear_modulus() {
        let mat = SimpleFeaMaterial::orthotropic("CFRP", 1600.0, OrthotropicConstants::default());
        assert!(mat.shear_modulus().is_none());
        assert!(mat.is_orthotropic());
    }
}
