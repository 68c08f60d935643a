//! Fixed 2-2-1 feed-forward network with sigmoid units
//!
//! ```text
//!  x0 --w00--\             /--v0--\
//!             >-- h0 (b0) <        \
//!  x1 --w01--/                      >-- y (c)
//!  x0 --w10--\                     /
//!             >-- h1 (b1) ---v1---/
//!  x1 --w11--/
//! ```
//!
//! All functions here are pure: they take the parameters by reference and hand back new values.

use rand::Rng;

/// Number of network inputs
pub const N_INPUTS: usize = 2;
/// Number of hidden units
pub const N_HIDDEN: usize = 2;

/// Logistic activation, `1 / (1 + e^-x)`
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid expressed through its own output `y = sigmoid(x)`
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Squared distance between the network output and the target
pub fn squared_error(output: f64, target: f64) -> f64 {
    (target - output).powi(2)
}

/// Weights and biases of the network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkParameters {
    /// row = hidden unit, column = input index
    pub weights_input_hidden: [[f64; N_INPUTS]; N_HIDDEN],
    pub bias_hidden: [f64; N_HIDDEN],
    pub weights_hidden_output: [f64; N_HIDDEN],
    pub bias_output: f64,
}

impl NetworkParameters {
    /// The hand-picked parameter set used in walkthroughs and tests
    pub fn demo() -> Self {
        Self {
            weights_input_hidden: [[0.5, -0.5], [0.3, 0.8]],
            bias_hidden: [0.0, 0.0],
            weights_hidden_output: [0.6, -0.2],
            bias_output: 0.0,
        }
    }

    /// Iterates over every scalar, input->hidden weights first and the output bias last
    pub fn scalars(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights_input_hidden
            .iter()
            .flatten()
            .chain(self.bias_hidden.iter())
            .chain(self.weights_hidden_output.iter())
            .chain(std::iter::once(&self.bias_output))
            .copied()
    }
}

/// A single input/target pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingExample {
    pub input: [f64; N_INPUTS],
    pub target: f64,
}

impl Default for TrainingExample {
    fn default() -> Self {
        Self {
            input: [1.0, 0.0],
            target: 1.0,
        }
    }
}

/// Unit activations of one forward pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivationSnapshot {
    /// weighted sums before the sigmoid
    pub net_hidden: [f64; N_HIDDEN],
    pub hidden: [f64; N_HIDDEN],
    pub net_output: f64,
    pub output: f64,
}

/// Error signals of a backward pass plus the deltas they imply for each parameter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradientProposal {
    /// `target - output`
    pub error: f64,
    pub delta_output: f64,
    pub delta_hidden: [f64; N_HIDDEN],
    pub d_weights_hidden_output: [f64; N_HIDDEN],
    pub d_bias_output: f64,
    pub d_weights_input_hidden: [[f64; N_INPUTS]; N_HIDDEN],
    pub d_bias_hidden: [f64; N_HIDDEN],
}

/// Computes the activations of every unit for `input`
pub fn forward(params: &NetworkParameters, input: &[f64; N_INPUTS]) -> ActivationSnapshot {
    let mut net_hidden = [0.0; N_HIDDEN];
    for (net, (weights, bias)) in net_hidden.iter_mut().zip(
        params
            .weights_input_hidden
            .iter()
            .zip(params.bias_hidden.iter()),
    ) {
        *net = weights.iter().zip(input.iter()).map(|(w, x)| w * x).sum::<f64>() + bias;
    }
    let hidden = net_hidden.map(sigmoid);

    let net_output = params
        .weights_hidden_output
        .iter()
        .zip(hidden.iter())
        .map(|(w, h)| w * h)
        .sum::<f64>()
        + params.bias_output;

    ActivationSnapshot {
        net_hidden,
        hidden,
        net_output,
        output: sigmoid(net_output),
    }
}

/// Delta rule for the 2-2-1 network. The error is `target - output`, so the
/// returned deltas already point towards a smaller error and are meant to be added.
pub fn backward(
    params: &NetworkParameters,
    activations: &ActivationSnapshot,
    example: &TrainingExample,
    learning_rate: f64,
) -> GradientProposal {
    let error = example.target - activations.output;
    let delta_output = error * sigmoid_derivative(activations.output);

    let mut delta_hidden = [0.0; N_HIDDEN];
    for (i, delta) in delta_hidden.iter_mut().enumerate() {
        *delta = sigmoid_derivative(activations.hidden[i])
            * params.weights_hidden_output[i]
            * delta_output;
    }

    let d_weights_hidden_output = activations.hidden.map(|h| learning_rate * delta_output * h);
    let d_weights_input_hidden =
        delta_hidden.map(|delta| example.input.map(|x| learning_rate * delta * x));

    GradientProposal {
        error,
        delta_output,
        delta_hidden,
        d_weights_hidden_output,
        d_bias_output: learning_rate * delta_output,
        d_weights_input_hidden,
        d_bias_hidden: delta_hidden.map(|delta| learning_rate * delta),
    }
}

/// Adds the proposed deltas to `params`, producing the next parameter set
pub fn apply_gradient(params: &NetworkParameters, proposal: &GradientProposal) -> NetworkParameters {
    let mut next = *params;
    for (row, d_row) in next
        .weights_input_hidden
        .iter_mut()
        .zip(proposal.d_weights_input_hidden.iter())
    {
        for (w, dw) in row.iter_mut().zip(d_row.iter()) {
            *w += dw;
        }
    }
    for (b, db) in next.bias_hidden.iter_mut().zip(proposal.d_bias_hidden.iter()) {
        *b += db;
    }
    for (w, dw) in next
        .weights_hidden_output
        .iter_mut()
        .zip(proposal.d_weights_hidden_output.iter())
    {
        *w += dw;
    }
    next.bias_output += proposal.d_bias_output;
    next
}

/// Draws every weight and bias uniformly from `[-1, 1]`
pub fn randomize_parameters<R: Rng>(rng: &mut R) -> NetworkParameters {
    let mut draw = || -> f64 { rng.random_range(-1.0..=1.0) };
    NetworkParameters {
        weights_input_hidden: [[draw(), draw()], [draw(), draw()]],
        bias_hidden: [draw(), draw()],
        weights_hidden_output: [draw(), draw()],
        bias_output: draw(),
    }
}

#[cfg(test)]
pub mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[macro_export]
    macro_rules! assert_close {
        ($a:expr, $b:expr) => {
            $crate::assert_close!($a, $b, 1e-9)
        };
        ($a:expr, $b:expr, $tol:expr) => {
            assert!(
                (($a) - ($b)).abs() < $tol,
                "{} is not within {} of {}",
                $a,
                $tol,
                $b
            );
        };
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        for i in -300..=300 {
            let y = sigmoid(i as f64 / 10.0);
            assert!(y > 0.0 && y < 1.0);
        }
        assert!(sigmoid(f64::NAN).is_nan());
    }

    #[test]
    fn test_forward_demo() {
        let a = forward(&NetworkParameters::demo(), &[1.0, 0.0]);
        assert_close!(a.net_hidden[0], 0.5);
        assert_close!(a.net_hidden[1], 0.3);
        assert_close!(a.hidden[0], 0.6225, 1e-4);
        assert_close!(a.hidden[1], 0.5744, 1e-4);
        assert_close!(a.net_output, 0.6 * a.hidden[0] - 0.2 * a.hidden[1]);
        assert_close!(a.net_output, 0.25859, 1e-4);
        assert_close!(a.output, 0.5643, 1e-4);
    }

    #[test]
    fn test_forward_is_deterministic() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let params = randomize_parameters(&mut rng);
        let input = [0.25, -0.75];
        assert_eq!(forward(&params, &input), forward(&params, &input));
    }

    #[test]
    fn test_backward_demo() {
        let params = NetworkParameters::demo();
        let example = TrainingExample::default();
        let a = forward(&params, &example.input);
        let g = backward(&params, &a, &example, 0.8);
        assert_close!(g.error, 0.4357, 1e-4);
        assert_close!(g.delta_output, 0.1071, 1e-4);

        // dh_i = h_i (1 - h_i) v_i dO
        assert_close!(g.delta_hidden[0], 0.6225 * 0.3775 * 0.6 * 0.1071, 1e-4);
        assert_close!(g.delta_hidden[1], 0.5744 * 0.4256 * -0.2 * 0.1071, 1e-4);
        assert!(g.delta_hidden[0] > 0.0 && g.delta_hidden[1] < 0.0);

        assert_close!(g.d_bias_output, 0.8 * g.delta_output);
        assert_close!(g.d_weights_hidden_output[1], 0.8 * g.delta_output * a.hidden[1]);
        // the second input is 0, so its weights get no update
        assert_eq!(g.d_weights_input_hidden[0][1], 0.0);
        assert_eq!(g.d_weights_input_hidden[1][1], 0.0);
        assert_close!(g.d_weights_input_hidden[0][0], 0.8 * g.delta_hidden[0]);
        assert_close!(g.d_bias_hidden[1], 0.8 * g.delta_hidden[1]);
    }

    #[test]
    fn test_apply_gradient() {
        let params = NetworkParameters::demo();
        let example = TrainingExample::default();
        let a = forward(&params, &example.input);
        let g = backward(&params, &a, &example, 0.8);
        let next = apply_gradient(&params, &g);

        assert_close!(next.bias_output, g.d_bias_output);
        assert_close!(next.weights_hidden_output[0], 0.6 + g.d_weights_hidden_output[0]);
        assert_close!(next.weights_input_hidden[1][0], 0.3 + g.d_weights_input_hidden[1][0]);
        assert_eq!(next.weights_input_hidden[0][1], -0.5);
        assert_close!(next.bias_hidden[0], g.d_bias_hidden[0]);
        // the input parameters are left untouched
        assert_eq!(params, NetworkParameters::demo());
    }

    #[test]
    fn test_zero_learning_rate_is_identity() {
        let params = NetworkParameters::demo();
        let example = TrainingExample::default();
        let g = backward(&params, &forward(&params, &example.input), &example, 0.0);
        assert_eq!(apply_gradient(&params, &g), params);
    }

    #[test]
    fn test_step_reduces_error() {
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        for _ in 0..500 {
            let params = randomize_parameters(&mut rng);
            let example = TrainingExample {
                input: [rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0)],
                target: if rng.random_bool(0.5) { 1.0 } else { 0.0 },
            };
            let lr = rng.random_range(0.01..=1.0);

            let before = forward(&params, &example.input);
            let g = backward(&params, &before, &example, lr);
            let after = forward(&apply_gradient(&params, &g), &example.input);
            assert!(
                squared_error(after.output, example.target)
                    <= squared_error(before.output, example.target) + 1e-12
            );
        }
    }

    #[test]
    fn test_nan_propagates() {
        let a = forward(&NetworkParameters::demo(), &[f64::NAN, 0.0]);
        assert!(a.output.is_nan());
    }

    #[test]
    fn test_randomize_parameters_range() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let first = randomize_parameters(&mut rng);
        let second = randomize_parameters(&mut rng);
        assert_eq!(first.scalars().count(), 9);
        assert!(first.scalars().chain(second.scalars()).all(|v| (-1.0..=1.0).contains(&v)));
        assert_ne!(first, second);
    }
}
