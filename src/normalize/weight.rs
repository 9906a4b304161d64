//! Weight and volume descriptors
//!
//! Product weights arrive as free text in a handful of encodings (`"3 x 100g"`,
//! `"1.2kg"`, `"400 ml"`, `"16oz"`). Each recognised encoding is parsed into a
//! [`WeightExpr`] variant which knows how to express itself in kilograms.

use thiserror::Error;

/// Grams per kilogram; millilitres are treated as grams of water.
const GRAMS_PER_KG: f64 = 1000.0;

/// Kilograms per avoirdupois ounce
pub const KG_PER_OUNCE: f64 = 0.0283495;

/// Errors raised while parsing a weight descriptor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightParseError {
    /// No known unit suffix was found
    #[error("Unrecognised weight unit in '{0}'")]
    UnrecognisedUnit(String),

    /// A unit was found but the quantity is not a number
    #[error("Invalid quantity '{quantity}' in weight '{input}'")]
    InvalidQuantity { input: String, quantity: String },
}

/// Recognised weight units, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    /// `<count> x <grams>g`
    MultiPackGrams,
    /// `<n>kg`
    Kilograms,
    /// `<n>g`
    Grams,
    /// `<n>ml`
    Millilitres,
    /// `<n>oz`
    Ounces,
}

impl WeightUnit {
    /// Classify a lower-cased descriptor; the first matching rule wins.
    pub fn classify(descriptor: &str) -> Option<Self> {
        if descriptor.contains('x') && descriptor.contains('g') {
            Some(WeightUnit::MultiPackGrams)
        } else if descriptor.contains("kg") {
            Some(WeightUnit::Kilograms)
        } else if descriptor.contains('g') {
            Some(WeightUnit::Grams)
        } else if descriptor.contains("ml") {
            Some(WeightUnit::Millilitres)
        } else if descriptor.contains("oz") {
            Some(WeightUnit::Ounces)
        } else {
            None
        }
    }
}

/// A parsed weight descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightExpr {
    MultiPackGrams { count: f64, grams: f64 },
    Kilograms(f64),
    Grams(f64),
    Millilitres(f64),
    Ounces(f64),
}

impl WeightExpr {
    /// Parse a raw descriptor
    ///
    /// Newlines become `", "` and surrounding dots are removed before the unit
    /// is classified. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, WeightParseError> {
        let flattened = super::flatten_address(raw);
        let descriptor = flattened.trim_matches('.').to_lowercase();

        let unit = WeightUnit::classify(&descriptor)
            .ok_or_else(|| WeightParseError::UnrecognisedUnit(raw.to_string()))?;

        let quantity = |text: &str| -> Result<f64, WeightParseError> {
            text.trim()
                .parse::<f64>()
                .map_err(|_| WeightParseError::InvalidQuantity {
                    input: raw.to_string(),
                    quantity: text.trim().to_string(),
                })
        };

        match unit {
            WeightUnit::MultiPackGrams => {
                let body = descriptor.trim_matches('g');
                let mut parts = body.split('x');
                let count = quantity(parts.next().unwrap_or_default())?;
                let grams = quantity(parts.next().unwrap_or_default())?;
                Ok(WeightExpr::MultiPackGrams { count, grams })
            }
            WeightUnit::Kilograms => Ok(WeightExpr::Kilograms(quantity(
                &descriptor.replace("kg", ""),
            )?)),
            WeightUnit::Grams => Ok(WeightExpr::Grams(quantity(&descriptor.replace('g', ""))?)),
            WeightUnit::Millilitres => Ok(WeightExpr::Millilitres(quantity(
                &descriptor.replace("ml", ""),
            )?)),
            WeightUnit::Ounces => Ok(WeightExpr::Ounces(quantity(&descriptor.replace("oz", ""))?)),
        }
    }

    /// The unit this descriptor was written in
    pub fn unit(&self) -> WeightUnit {
        match self {
            WeightExpr::MultiPackGrams { .. } => WeightUnit::MultiPackGrams,
            WeightExpr::Kilograms(_) => WeightUnit::Kilograms,
            WeightExpr::Grams(_) => WeightUnit::Grams,
            WeightExpr::Millilitres(_) => WeightUnit::Millilitres,
            WeightExpr::Ounces(_) => WeightUnit::Ounces,
        }
    }

    /// Mass in kilograms
    pub fn kilograms(&self) -> f64 {
        match *self {
            WeightExpr::MultiPackGrams { count, grams } => count * grams / GRAMS_PER_KG,
            WeightExpr::Kilograms(kg) => kg,
            WeightExpr::Grams(g) => g / GRAMS_PER_KG,
            WeightExpr::Millilitres(ml) => ml / GRAMS_PER_KG,
            WeightExpr::Ounces(oz) => oz * KG_PER_OUNCE,
        }
    }
}

/// Parse a descriptor straight to kilograms, `None` when it cannot be parsed
pub fn parse_weight_kg(raw: &str) -> Option<f64> {
    match WeightExpr::parse(raw) {
        Ok(expr) => Some(expr.kilograms()),
        Err(e) => {
            tracing::debug!(error = %e, "Weight left unparsed");
            None
        }
    }
}
