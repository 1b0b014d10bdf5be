//! Artifact records: run configurations and per-epoch model snapshots.
//!
//! Both records carry provenance (`name`, `bucket_name`) that is filled in from
//! the object's location on read and never written into the payload.

use crate::error::{RetrievalError, RetrievalResult};
use serde::{Deserialize, Serialize};

/// Object name of a run configuration inside its instance directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory (relative to an instance) holding epoch snapshots.
pub const SNAPSHOT_DIR: &str = "states/test/production";

/// Extension used for epoch snapshot objects unless configured otherwise.
pub const DEFAULT_SNAPSHOT_EXTENSION: &str = "pkl";

/// Configuration of one training run instance, stored at
/// `<run_name>/<wandb_id>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Run-instance identifier (experiment tracker id).
    pub wandb_id: String,
    /// Epoch at which the simulated lesion begins; cross-run sort key.
    pub lesion_start_epoch: i64,
    pub lesion_type: String,
    pub model_type: String,
    pub run_name: String,
    pub train_data: String,
    pub test_data: String,
    pub mask_value: f64,
    pub lstm_units: u32,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub frequency_scale_k: f64,
    pub epochs: u32,
    pub seed: u64,
    pub orth_features: u32,
    pub phon_features: u32,
    pub phon_max_length: u32,

    /// Bucket-relative object name.
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub bucket_name: String,
}

impl RunConfiguration {
    /// Object name this configuration is stored under.
    pub fn object_name(&self) -> String {
        format!("{}/{}/{}", self.run_name, self.wandb_id, CONFIG_FILE_NAME)
    }
}

/// Dense `f32` buffer with a row-major shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Builds a tensor, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> RetrievalResult<Self> {
        let expected = element_count(&shape)
            .ok_or_else(|| RetrievalError::Schema(format!("tensor shape {shape:?} overflows")))?;
        if expected != data.len() {
            return Err(RetrievalError::Schema(format!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> RetrievalResult<Self> {
        let len = element_count(&shape)
            .ok_or_else(|| RetrievalError::Schema(format!("tensor shape {shape:?} overflows")))?;
        Self::new(shape, vec![0.0; len])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Internal model state after one training epoch, stored at
/// `<run_name>/<wandb_id>/states/test/production/epoch_<NNNN>.<ext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSnapshot {
    pub encoder_cell_state: Tensor,
    pub encoder_hidden_state: Tensor,
    pub decoder_cell_state: Tensor,
    pub decoder_hidden_state: Tensor,
    pub output: Tensor,

    /// Bucket-relative object name.
    pub name: String,
    pub bucket_name: String,
}

impl EpochSnapshot {
    /// Number of test items (leading dimension of the encoder cell state).
    pub fn nitems(&self) -> Option<usize> {
        self.encoder_cell_state.shape().first().copied()
    }

    /// Number of recurrent units (trailing dimension of the encoder cell state).
    pub fn nunits(&self) -> Option<usize> {
        self.encoder_cell_state.shape().last().copied()
    }

    /// Length of the phonological output sequence.
    pub fn phon_max_length(&self) -> Option<usize> {
        self.output.shape().get(1).copied()
    }

    /// Buffers in their fixed storage order.
    pub(crate) fn buffers(&self) -> [(&'static str, &Tensor); 5] {
        [
            ("encoder_cell_state", &self.encoder_cell_state),
            ("encoder_hidden_state", &self.encoder_hidden_state),
            ("decoder_cell_state", &self.decoder_cell_state),
            ("decoder_hidden_state", &self.decoder_hidden_state),
            ("output", &self.output),
        ]
    }
}

/// Buffer names of an [`EpochSnapshot`] in storage order.
pub const SNAPSHOT_BUFFERS: [&str; 5] = [
    "encoder_cell_state",
    "encoder_hidden_state",
    "decoder_cell_state",
    "decoder_hidden_state",
    "output",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_shape_must_match_data() {
        assert!(Tensor::new(vec![2, 3], vec![0.0; 6]).is_ok());
        let err = Tensor::new(vec![2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, RetrievalError::Schema(_)));
        assert!(Tensor::new(vec![usize::MAX, 2], vec![]).is_err());
    }

    #[test]
    fn test_scalar_tensor() {
        let t = Tensor::new(vec![], vec![1.5]).unwrap();
        assert_eq!(t.rank(), 0);
        assert_eq!(t.data(), &[1.5]);
    }

    #[test]
    fn test_snapshot_dimensions() {
        let snapshot = EpochSnapshot {
            encoder_cell_state: Tensor::zeros(vec![10, 7, 32]).unwrap(),
            encoder_hidden_state: Tensor::zeros(vec![10, 7, 32]).unwrap(),
            decoder_cell_state: Tensor::zeros(vec![10, 9, 32]).unwrap(),
            decoder_hidden_state: Tensor::zeros(vec![10, 9, 32]).unwrap(),
            output: Tensor::zeros(vec![10, 9, 25]).unwrap(),
            name: "r/i/states/test/production/epoch_0001.pkl".to_string(),
            bucket_name: "b".to_string(),
        };
        assert_eq!(snapshot.nitems(), Some(10));
        assert_eq!(snapshot.nunits(), Some(32));
        assert_eq!(snapshot.phon_max_length(), Some(9));
        let names: Vec<_> = snapshot.buffers().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, SNAPSHOT_BUFFERS);
    }
}
