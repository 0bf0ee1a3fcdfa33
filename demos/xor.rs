use rand::{rngs::StdRng, SeedableRng};
use strata_nn::{train_sgd, LayerParams, LayerType, LossType, Network, TrainConfig};

fn main() -> strata_nn::Result<()> {
    let mut network = Network::from_params(&[
        LayerParams::new(LayerType::FullyConnected, 1, 2, 10),
        LayerParams::new(LayerType::Sigmoid, 0, 0, 0),
        LayerParams::new(LayerType::FullyConnected, 0, 0, 1),
        LayerParams::new(LayerType::Sigmoid, 0, 0, 0),
    ]);
    network.init_with_rng(&mut StdRng::seed_from_u64(42))?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let mut config = TrainConfig::new(0.5, 10000, 1, LossType::Mse);
    config.shuffle = true;
    config.seed = Some(7);

    let history = train_sgd(&mut network, &inputs, &expected_outputs, &config)?;
    for stats in history.iter().step_by(1000) {
        println!("Epoch {}: loss = {:.6}", stats.epoch, stats.train_loss);
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.predict(input)?[0]);
    }
    Ok(())
}
