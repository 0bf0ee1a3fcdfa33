use log::debug;
use rand::{rngs::StdRng, SeedableRng};

use crate::error::{NnError, Result};
use crate::layers::layer::{self, Layer, LayerParams};

/// An ordered chain of layers, driven forward left to right and backward
/// right to left. The network exclusively owns its layers.
#[derive(Debug, Default)]
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    pub fn new() -> Network {
        Network { layers: Vec::new() }
    }

    /// Builds an un-initialised network by appending each record in order.
    pub fn from_params(params: &[LayerParams]) -> Network {
        let mut net = Network::new();
        for p in params {
            net.append(*p);
        }
        net
    }

    /// Allocates a layer from `params` and appends it.
    ///
    /// When the network is not empty, the previous layer's output size becomes
    /// this layer's input size, and its batch size is inherited if `params`
    /// leaves it at 0. Only sizes are linked; buffers are never shared.
    pub fn append(&mut self, mut params: LayerParams) -> &mut dyn Layer {
        if let Some(prev) = self.layers.last() {
            params.input_size = prev.output_size();
            if params.batch_size == 0 {
                params.batch_size = prev.params().batch_size;
            }
        }
        self.layers.push(layer::alloc(params));
        let last = self.layers.len() - 1;
        self.layers[last].as_mut()
    }

    /// Initialises every layer in order with an entropy-seeded rng.
    pub fn init(&mut self) -> Result<()> {
        self.init_with_rng(&mut StdRng::from_entropy())
    }

    /// Initialises every layer in order.
    ///
    /// Not atomic: if a layer fails, the layers before it stay initialised and
    /// the ones after it are left untouched.
    pub fn init_with_rng(&mut self, rng: &mut StdRng) -> Result<()> {
        if self.layers.is_empty() {
            return Err(NnError::null("network has no layers"));
        }
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.init(rng).map_err(|e| {
                debug!("network init stopped at layer {i}: {e}");
                e
            })?;
        }
        debug!("network initialised with {} layers", self.layers.len());
        Ok(())
    }

    /// Folds `x` through every layer and returns the last layer's output.
    pub fn forward(&mut self, x: &[f64]) -> Result<&[f64]> {
        if x.is_empty() {
            return Err(NnError::null("network input"));
        }
        let (first, rest) = self.layers.split_first_mut()
            .ok_or(NnError::null("network has no layers"))?;
        let mut y = first.forward(x)?;
        for layer in rest {
            y = layer.forward(y)?;
        }
        Ok(y)
    }

    /// Folds `dy` through every layer in reverse and returns the gradient
    /// with respect to the network input.
    pub fn backward(&mut self, dy: &[f64]) -> Result<&[f64]> {
        if dy.is_empty() {
            return Err(NnError::null("network gradient"));
        }
        let (last, rest) = self.layers.split_last_mut()
            .ok_or(NnError::null("network has no layers"))?;
        let mut dx = last.backward(dy)?;
        for layer in rest.iter_mut().rev() {
            dx = layer.backward(dx)?;
        }
        Ok(dx)
    }

    pub fn update(&mut self, rate: f64) -> Result<()> {
        for layer in self.layers.iter_mut() {
            layer.update(rate)?;
        }
        Ok(())
    }

    pub fn clear_grad(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.clear_grad();
        }
    }

    /// Runs a forward pass and copies the output out of the last layer.
    pub fn predict(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        self.forward(x).map(|y| y.to_vec())
    }

    /// Releases every layer's buffers, then the layers themselves.
    pub fn free(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.free();
        }
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut dyn Layer> {
        match self.layers.get_mut(index) {
            Some(layer) => Some(layer.as_mut()),
            None => None,
        }
    }

    pub fn input(&self) -> Option<&dyn Layer> {
        self.layers.first().map(|l| l.as_ref())
    }

    pub fn output(&self) -> Option<&dyn Layer> {
        self.layers.last().map(|l| l.as_ref())
    }

    /// Batch size of the input layer, 0 for an empty network.
    pub fn batch_size(&self) -> usize {
        self.input().map_or(0, |l| l.params().batch_size)
    }
}
