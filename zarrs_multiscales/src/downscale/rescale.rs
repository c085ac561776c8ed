use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use super::{Downscale, DownscaleError, InputRange};

/// The default per-axis scale factor.
const DEFAULT_SCALE: f64 = 0.5;

/// Gaussian kernels are truncated at this many standard deviations.
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// The interpolation order of a [`Rescale`] transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, derive_more::Display)]
pub enum InterpolationOrder {
    /// Nearest neighbour (order 0).
    #[default]
    #[display("0")]
    Nearest,
    /// Linear (order 1).
    #[display("1")]
    Linear,
}

impl InterpolationOrder {
    /// Return the numeric order.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
        }
    }
}

impl TryFrom<u8> for InterpolationOrder {
    type Error = DownscaleError;

    fn try_from(order: u8) -> Result<Self, Self::Error> {
        match order {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::Linear),
            _ => Err(DownscaleError::UnsupportedOrder(order)),
        }
    }
}

/// Rescale an array by per-axis scale factors.
///
/// The output length of an axis is its input length multiplied by the scale factor, rounded half to even, and at least one.
/// Output samples are pixel-centre aligned with the input: output index `o` samples the input at `(o + 0.5) * in / out - 0.5`.
/// Neighbours outside of the input are mirrored about the edge sample.
///
/// If anti-aliasing is enabled, each downsampled axis is smoothed with a Gaussian (`sigma = (factor - 1) / 2`) prior to sampling.
/// By default anti-aliasing is enabled unless the input is integer valued and the interpolation order is [`InterpolationOrder::Nearest`].
///
/// The default configuration halves every axis with nearest neighbour interpolation and preserves the value range of the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Rescale {
    scale: Option<Vec<f64>>,
    order: InterpolationOrder,
    preserve_range: bool,
    anti_aliasing: Option<bool>,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            scale: None,
            order: InterpolationOrder::Nearest,
            preserve_range: true,
            anti_aliasing: None,
        }
    }
}

impl Rescale {
    /// Create a rescale transform with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale factors.
    ///
    /// Either one factor per axis, or a single factor applied to all axes.
    #[must_use]
    pub fn with_scale(mut self, scale: impl Into<Vec<f64>>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    /// Set the interpolation order.
    #[must_use]
    pub fn with_order(mut self, order: InterpolationOrder) -> Self {
        self.order = order;
        self
    }

    /// Set whether the value range of integer input is preserved.
    ///
    /// If false, integer input is divided by the maximum of its element type, mapping unsigned input to `[0, 1]` and signed input to `[-1, 1]`.
    #[must_use]
    pub fn with_preserve_range(mut self, preserve_range: bool) -> Self {
        self.preserve_range = preserve_range;
        self
    }

    /// Explicitly enable or disable anti-aliasing. [`None`] selects it automatically.
    #[must_use]
    pub fn with_anti_aliasing(mut self, anti_aliasing: Option<bool>) -> Self {
        self.anti_aliasing = anti_aliasing;
        self
    }

    /// Return the interpolation order.
    #[must_use]
    pub const fn order(&self) -> InterpolationOrder {
        self.order
    }

    /// Return the scale factors for an input with `dimensionality` dimensions.
    ///
    /// # Errors
    /// Returns a [`DownscaleError`] if the number of scale factors is incompatible with `dimensionality` or a factor is not positive and finite.
    pub fn scale_factors(&self, dimensionality: usize) -> Result<Vec<f64>, DownscaleError> {
        let factors = match self.scale.as_deref() {
            None => vec![DEFAULT_SCALE; dimensionality],
            Some([factor]) => vec![*factor; dimensionality],
            Some(factors) if factors.len() == dimensionality => factors.to_vec(),
            Some(factors) => {
                return Err(DownscaleError::ScaleDimensionality {
                    expected: dimensionality,
                    found: factors.len(),
                });
            }
        };
        if let Some(&factor) = factors.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(DownscaleError::InvalidScale(factor));
        }
        Ok(factors)
    }

    /// Return the output shape for an input of `shape`.
    ///
    /// # Errors
    /// Returns a [`DownscaleError`] if the scale factors are invalid for `shape`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn output_shape(&self, shape: &[usize]) -> Result<Vec<usize>, DownscaleError> {
        Ok(std::iter::zip(shape, self.scale_factors(shape.len())?)
            .map(|(&length, factor)| (length as f64 * factor).round_ties_even().max(1.0) as usize)
            .collect())
    }

    fn anti_aliasing_enabled(&self, input_range: InputRange) -> bool {
        self.anti_aliasing.unwrap_or(
            !(input_range.is_integer() && self.order == InterpolationOrder::Nearest),
        )
    }
}

impl Downscale for Rescale {
    #[allow(clippy::cast_precision_loss)]
    fn downscale(
        &self,
        data: ArrayViewD<'_, f64>,
        input_range: InputRange,
    ) -> Result<ArrayD<f64>, DownscaleError> {
        let shape = data.shape().to_vec();
        if shape.contains(&0) {
            return Err(DownscaleError::EmptyInput(shape));
        }
        let output_shape = self.output_shape(&shape)?;

        let mut image = match input_range {
            InputRange::Integer { min, max } if !self.preserve_range => {
                let lower = if min < 0.0 { -1.0 } else { 0.0 };
                data.mapv(|v| (v / max).max(lower))
            }
            _ => data.to_owned(),
        };

        if self.anti_aliasing_enabled(input_range) {
            for (axis, (&input_length, &output_length)) in
                std::iter::zip(&shape, &output_shape).enumerate()
            {
                let sigma = ((input_length as f64 / output_length as f64 - 1.0) / 2.0).max(0.0);
                if sigma > 0.0 {
                    image = gaussian_filter_axis(&image, axis, sigma);
                }
            }
        }

        for (axis, &output_length) in output_shape.iter().enumerate() {
            if image.len_of(Axis(axis)) != output_length {
                image = resample_axis(&image, axis, output_length, self.order);
            }
        }
        Ok(image)
    }

    fn parameters(
        &self,
        dimensionality: usize,
    ) -> Option<serde_json::Map<String, serde_json::Value>> {
        let scale = self
            .scale_factors(dimensionality)
            .unwrap_or_else(|_| self.scale.clone().unwrap_or_default());
        let mut parameters = serde_json::Map::new();
        parameters.insert("scale".to_string(), scale.into());
        parameters.insert("order".to_string(), self.order.as_u8().into());
        parameters.insert("preserve_range".to_string(), self.preserve_range.into());
        if let Some(anti_aliasing) = self.anti_aliasing {
            parameters.insert("anti_aliasing".to_string(), anti_aliasing.into());
        }
        Some(parameters)
    }
}

/// Map an index outside of `0..length` into it by mirroring about the edge samples.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn mirror_index(index: isize, length: usize) -> usize {
    if length == 1 {
        return 0;
    }
    let period = 2 * (length as isize - 1);
    let index = index.rem_euclid(period);
    if index < length as isize {
        index as usize
    } else {
        (period - index) as usize
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as usize;
    let kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian smoothing along `axis`.
#[allow(clippy::cast_possible_wrap)]
fn gaussian_filter_axis(image: &ArrayD<f64>, axis: usize, sigma: f64) -> ArrayD<f64> {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let length = image.len_of(Axis(axis));
    let mut filtered = ArrayD::<f64>::zeros(image.raw_dim());
    for (input, mut output) in std::iter::zip(image.lanes(Axis(axis)), filtered.lanes_mut(Axis(axis)))
    {
        for (i, value) in output.iter_mut().enumerate() {
            *value = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    weight * input[mirror_index(i as isize + k as isize - radius, length)]
                })
                .sum();
        }
    }
    filtered
}

/// The input indices and weights contributing to output index `output_index`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
fn sample_taps(
    output_index: usize,
    input_length: usize,
    output_length: usize,
    order: InterpolationOrder,
) -> Vec<(usize, f64)> {
    let coordinate =
        (output_index as f64 + 0.5) * (input_length as f64 / output_length as f64) - 0.5;
    match order {
        InterpolationOrder::Nearest => {
            let nearest = (coordinate + 0.5).floor() as isize;
            vec![(mirror_index(nearest, input_length), 1.0)]
        }
        InterpolationOrder::Linear => {
            let lower = coordinate.floor();
            let t = coordinate - lower;
            let lower = lower as isize;
            vec![
                (mirror_index(lower, input_length), 1.0 - t),
                (mirror_index(lower + 1, input_length), t),
            ]
        }
    }
}

fn resample_axis(
    image: &ArrayD<f64>,
    axis: usize,
    output_length: usize,
    order: InterpolationOrder,
) -> ArrayD<f64> {
    let input_length = image.len_of(Axis(axis));
    let taps: Vec<_> = (0..output_length)
        .map(|o| sample_taps(o, input_length, output_length, order))
        .collect();
    let mut shape = image.shape().to_vec();
    shape[axis] = output_length;
    let mut resampled = ArrayD::<f64>::zeros(IxDyn(&shape));
    for (input, mut output) in
        std::iter::zip(image.lanes(Axis(axis)), resampled.lanes_mut(Axis(axis)))
    {
        for (value, taps) in std::iter::zip(output.iter_mut(), &taps) {
            *value = taps.iter().map(|&(i, weight)| weight * input[i]).sum();
        }
    }
    resampled
}
