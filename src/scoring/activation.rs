use super::config::ActivationParameters;

/// Map a raw score onto `[0, scaling]` with an s-shaped curve centered on `shift`.
///
/// `scaling / (1 + e^(-steepness * (x - shift)))`. Raw scores above `shift`
/// land in the upper half of the range, so the default parameters favor
/// content rated slightly better than neutral.
pub fn activate(x: f64, params: &ActivationParameters) -> f64 {
    params.scaling / (1.0 + (-params.steepness * (x - params.shift)).exp())
}
