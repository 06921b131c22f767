use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest coefficient magnitude a genome can encode.
pub const MAX_COEFFICIENT: f64 = 15.75;

/// Smallest non-zero step between encodable coefficients.
pub const COEFFICIENT_RESOLUTION: f64 = 0.25;

/// Polynomial stored as its coefficient vector.
///
/// `coefficients()[i]` is the coefficient of `x^i`, so a polynomial of order `n`
/// has `n + 1` coefficients.
///
/// # Example
///
/// ```
/// use genepi_engine::Polynomial;
///
/// // x^2 - 2
/// let poly = Polynomial::new(vec![-2.0, 0.0, 1.0]);
/// assert_eq!(poly.order(), 2);
/// assert_eq!(poly.eval(3.0), 7.0);
/// assert_eq!(poly.to_string(), "1.00x^2 - 2.00");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients ordered from `x^0` upwards.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` is empty.
    #[must_use]
    pub fn new(coefficients: Vec<f64>) -> Self {
        assert!(
            !coefficients.is_empty(),
            "polynomial needs at least one coefficient"
        );
        Self { coefficients }
    }

    /// The zero polynomial of the given order.
    #[must_use]
    pub fn zero(order: usize) -> Self {
        Self::new(vec![0.0; order + 1])
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn into_coefficients(self) -> Vec<f64> {
        self.coefficients
    }

    /// Highest power of `x`, i.e. `coefficients().len() - 1`.
    #[must_use]
    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluates the polynomial at `x` using Horner's method.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc.mul_add(x, *c))
    }

    /// Snaps every coefficient onto the grid a genome can represent.
    ///
    /// Coefficients are rounded to the nearest multiple of
    /// [`COEFFICIENT_RESOLUTION`] and clamped to
    /// `[-MAX_COEFFICIENT, MAX_COEFFICIENT]`.
    ///
    /// ```
    /// use genepi_engine::Polynomial;
    ///
    /// let poly = Polynomial::new(vec![0.3, -20.0, 1.124]).quantized();
    /// assert_eq!(poly.coefficients(), &[0.25, -15.75, 1.0]);
    /// ```
    #[must_use]
    pub fn quantized(&self) -> Self {
        let steps = 1.0 / COEFFICIENT_RESOLUTION;
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| ((c * steps).round() / steps).clamp(-MAX_COEFFICIENT, MAX_COEFFICIENT))
            .collect();
        Self { coefficients }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("polynomial needs at least one coefficient")]
pub struct EmptyPolynomialError;

impl TryFrom<Vec<f64>> for Polynomial {
    type Error = EmptyPolynomialError;

    fn try_from(coefficients: Vec<f64>) -> Result<Self, Self::Error> {
        if coefficients.is_empty() {
            return Err(EmptyPolynomialError);
        }
        Ok(Self { coefficients })
    }
}

impl From<Polynomial> for Vec<f64> {
    fn from(poly: Polynomial) -> Self {
        poly.coefficients
    }
}

/// Human-readable form, highest power first: `1.00x^2 - 3.50x + 0.25`.
///
/// Zero terms are skipped; the zero polynomial prints as `0`.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut started = false;
        for (power, coeff) in self.coefficients.iter().enumerate().rev() {
            if *coeff == 0.0 {
                continue;
            }
            match (started, *coeff < 0.0) {
                (false, false) => {}
                (false, true) => f.write_str("-")?,
                (true, false) => f.write_str(" + ")?,
                (true, true) => f.write_str(" - ")?,
            }
            write!(f, "{:.2}", coeff.abs())?;
            match power {
                0 => {}
                1 => f.write_str("x")?,
                _ => write!(f, "x^{power}")?,
            }
            started = true;
        }
        if !started {
            f.write_str("0")?;
        }
        Ok(())
    }
}
