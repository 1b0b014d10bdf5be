//! Shared test records.

use crate::artifacts::{EpochSnapshot, RunConfiguration, Tensor};

/// Configuration of run `run`, instance `wandb_id`, without provenance.
pub(crate) fn sample_config(wandb_id: &str, lesion_start_epoch: i64) -> RunConfiguration {
    RunConfiguration {
        wandb_id: wandb_id.to_string(),
        lesion_start_epoch,
        lesion_type: "semantic".to_string(),
        model_type: "lstm".to_string(),
        run_name: "run".to_string(),
        train_data: "train_a".to_string(),
        test_data: "test_a".to_string(),
        mask_value: -1.0,
        lstm_units: 32,
        learning_rate: 0.005,
        batch_size: 64,
        frequency_scale_k: 0.3,
        epochs: 400,
        seed: 1234,
        orth_features: 26,
        phon_features: 25,
        phon_max_length: 9,
        name: String::new(),
        bucket_name: String::new(),
    }
}

/// Small snapshot with distinguishable values in every buffer.
pub(crate) fn sample_snapshot(bucket_name: &str, name: &str) -> EpochSnapshot {
    let tensor = |shape: Vec<usize>, offset: f32| {
        let len = shape.iter().product::<usize>();
        let data = (0..len).map(|i| offset + i as f32 * 0.25).collect();
        Tensor::new(shape, data).unwrap()
    };
    EpochSnapshot {
        encoder_cell_state: tensor(vec![2, 3, 4], 0.0),
        encoder_hidden_state: tensor(vec![2, 3, 4], 10.0),
        decoder_cell_state: tensor(vec![2, 5, 4], 20.0),
        decoder_hidden_state: tensor(vec![2, 5, 4], 30.0),
        output: tensor(vec![2, 5, 3], -1.5),
        name: name.to_string(),
        bucket_name: bucket_name.to_string(),
    }
}
