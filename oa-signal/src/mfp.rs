//! Matched-field processing
//!
//! The processor evaluates an ambiguity value for a set of search parameters
//! by running a replica model once per frequency, beamforming each replica
//! against that frequency's covariance matrix and combining the responses.

use crate::beamforming::Beamformer;
use crate::error::{Result, SignalError};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Model parameters passed to a replica model
pub type Parameters = Map<String, Value>;

/// Forward model producing replica fields (sensors × candidates)
pub trait ReplicaModel: Send + Sync {
    /// Run the model for one parameter set
    fn replicas(&self, parameters: &Parameters) -> Result<Array2<Complex64>>;
}

impl<F> ReplicaModel for F
where
    F: Fn(&Parameters) -> Result<Array2<Complex64>> + Send + Sync,
{
    fn replicas(&self, parameters: &Parameters) -> Result<Array2<Complex64>> {
        self(parameters)
    }
}

/// Maps (frequency, title, fixed parameters, search parameters) to model parameters
pub type ParameterFormatter =
    Box<dyn Fn(f64, &str, Parameters, &Parameters) -> Parameters + Send + Sync>;

/// Fixed parameters, then `freq` and `title`, then the search parameters;
/// later keys win
pub fn default_parameter_formatter(
    freq: f64,
    title: &str,
    fixed: Parameters,
    search: &Parameters,
) -> Parameters {
    let mut parameters = fixed;
    parameters.insert("freq".to_string(), Value::from(freq));
    parameters.insert("title".to_string(), Value::from(title));
    for (key, value) in search {
        parameters.insert(key.clone(), value.clone());
    }
    parameters
}

/// How responses at several frequencies are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiFrequencyMethod {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Sum
    Sum,
    /// Product
    Product,
}

impl FromStr for MultiFrequencyMethod {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "product" => Ok(Self::Product),
            other => Err(SignalError::InvalidArgument(format!(
                "unknown multi-frequency method `{other}`"
            ))),
        }
    }
}

impl MultiFrequencyMethod {
    /// Combine equally sized responses element-wise
    pub fn combine(&self, responses: &[Array1<f64>]) -> Result<Array1<f64>> {
        let first = responses
            .first()
            .ok_or_else(|| SignalError::InvalidArgument("no responses to combine".to_string()))?;
        if let Some(bad) = responses.iter().find(|r| r.len() != first.len()) {
            return Err(SignalError::DimensionMismatch {
                context: "frequency responses",
                expected: first.len(),
                got: bad.len(),
            });
        }
        let combined = match self {
            Self::Mean | Self::Sum => {
                let sum = responses
                    .iter()
                    .skip(1)
                    .fold(first.clone(), |acc, r| acc + r);
                if *self == Self::Mean {
                    sum / responses.len() as f64
                } else {
                    sum
                }
            }
            Self::Product => responses
                .iter()
                .skip(1)
                .fold(first.clone(), |acc, r| acc * r),
        };
        Ok(combined)
    }
}

/// Matched-field processor
pub struct MatchedFieldProcessor<M: ReplicaModel> {
    model: M,
    covariance: Vec<Array2<Complex64>>,
    frequencies: Vec<f64>,
    parameters: Parameters,
    formatter: ParameterFormatter,
    beamformer: Beamformer,
    method: MultiFrequencyMethod,
    pool: rayon::ThreadPool,
}

impl<M: ReplicaModel> MatchedFieldProcessor<M> {
    /// Create a processor; one covariance matrix per frequency
    ///
    /// The worker pool defaults to one thread per frequency.
    pub fn new(
        model: M,
        covariance: Vec<Array2<Complex64>>,
        frequencies: Vec<f64>,
    ) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(SignalError::InvalidArgument(
                "at least one frequency is required".to_string(),
            ));
        }
        if covariance.len() != frequencies.len() {
            return Err(SignalError::DimensionMismatch {
                context: "covariance matrices per frequency",
                expected: frequencies.len(),
                got: covariance.len(),
            });
        }
        let pool = build_pool(frequencies.len())?;
        Ok(Self {
            model,
            covariance,
            frequencies,
            parameters: Parameters::new(),
            formatter: Box::new(default_parameter_formatter),
            beamformer: Beamformer::default(),
            method: MultiFrequencyMethod::default(),
            pool,
        })
    }

    /// Fixed parameters; several maps are merged in order, later keys win
    pub fn with_parameters<I>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = Parameters>,
    {
        self.parameters = parameters.into_iter().fold(Parameters::new(), |mut acc, p| {
            acc.extend(p);
            acc
        });
        self
    }

    /// Replace the parameter formatter
    pub fn with_formatter(mut self, formatter: ParameterFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Select the beamformer
    pub fn with_beamformer(mut self, beamformer: Beamformer) -> Self {
        self.beamformer = beamformer;
        self
    }

    /// Select how frequencies are combined
    pub fn with_method(mut self, method: MultiFrequencyMethod) -> Self {
        self.method = method;
        self
    }

    /// Limit the number of worker threads
    pub fn with_max_workers(mut self, max_workers: usize) -> Result<Self> {
        self.pool = build_pool(max_workers)?;
        Ok(self)
    }

    /// Frequencies processed
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Ambiguity for one set of search parameters
    pub fn evaluate(&self, search: &Parameters) -> Result<Array1<f64>> {
        let responses: Vec<Array1<f64>> = self.pool.install(|| {
            self.frequencies
                .par_iter()
                .zip(self.covariance.par_iter())
                .map(|(&freq, k)| {
                    let title = format!("{freq:.0}Hz");
                    let parameters = (self.formatter)(freq, &title, self.parameters.clone(), search);
                    log::debug!("{title}: running replica model");
                    let replicas = self.model.replicas(&parameters)?;
                    self.beamformer.evaluate(k, &replicas)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        self.method.combine(&responses)
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| SignalError::InvalidArgument(format!("failed to build worker pool: {e}")))
}
