//! Terminal front end for `mlp_stepper`: renders every phase of each training step
//!
//! # Usage
//! Runnable via
//! ```sh
//! cargo run -- -h
//! cargo run -- --demo-weights --steps 3
//! cargo run -- --auto-run-secs 10 --time-scale 0.5 --plot error.png
//! ```

use std::{
    sync::Arc,
    thread,
    time::{Duration, TryFromFloatSecsError},
};

use mlp_stepper::{
    input::parse_finite,
    network::{NetworkParameters, TrainingExample},
    plot::plot_error_history,
    sequencer::{DEFAULT_LEARNING_RATE, Phase, Sequencer},
    trainer::{Observer, Timings, Trainer},
    tween::frames,
};

use clap::Parser;

#[derive(Parser)]
struct Args {
    #[clap(short, long, default_value_t = DEFAULT_LEARNING_RATE, value_parser = parse_number, allow_negative_numbers = true)]
    lr: f64,
    #[clap(short, long, num_args = 2, default_values_t = [1.0, 0.0], value_parser = parse_number, allow_negative_numbers = true)]
    input: Vec<f64>,
    #[clap(short, long, default_value_t = 1.0, value_parser = parse_number, allow_negative_numbers = true)]
    target: f64,
    /// number of manual steps, ignored with --auto-run-secs
    #[clap(short, long, default_value_t = 1)]
    steps: usize,
    /// keep stepping automatically for this many seconds
    #[clap(short, long, value_parser = parse_number)]
    auto_run_secs: Option<f64>,
    #[clap(long)]
    seed: Option<u64>,
    /// multiplies every animation pause, 0 runs without pauses
    #[clap(long, default_value_t = 1.0, value_parser = parse_number)]
    time_scale: f64,
    /// start from the fixed walkthrough weights instead of random ones
    #[clap(long, default_value_t = false)]
    demo_weights: bool,
    #[clap(short, long)]
    plot: Option<String>,
}

fn parse_number(text: &str) -> Result<f64, String> {
    parse_finite(text).map_err(|e| e.to_string())
}

/// Negative durations run no auto-run time at all
fn auto_run_duration(secs: f64) -> Result<Duration, TryFromFloatSecsError> {
    Duration::try_from_secs_f64(secs.max(0.0))
}

fn fmt_pair(v: &[f64; 2]) -> String {
    format!("[{:.3}, {:.3}]", v[0], v[1])
}

fn render_parameters(p: &NetworkParameters) {
    println!(
        "  weights in->hidden [{}, {}], bias hidden {}",
        fmt_pair(&p.weights_input_hidden[0]),
        fmt_pair(&p.weights_input_hidden[1]),
        fmt_pair(&p.bias_hidden)
    );
    println!(
        "  weights hidden->out {}, bias out {:.3}",
        fmt_pair(&p.weights_hidden_output),
        p.bias_output
    );
}

fn render(state: &Sequencer) {
    match state.phase() {
        Phase::Forward => {
            let (before, after) = state.activation_transition();
            let trace = frames(before, after, 5)
                .iter()
                .map(|a| format!("{:.3}", a.output))
                .collect::<Vec<_>>()
                .join(" > ");
            println!("[forward]  hidden {}, output {}", fmt_pair(&after.hidden), trace);
        }
        Phase::Backward => {
            let p = &state.pulse().proposal;
            let sign = |d: f64| if d >= 0.0 { '+' } else { '-' };
            println!(
                "[backward] error {:.3}, deltaO {:.3}, deltaH {}",
                p.error,
                p.delta_output,
                fmt_pair(&p.delta_hidden)
            );
            println!(
                "  proposed dW hidden->out [{}{:.4}, {}{:.4}], db out {}{:.4}",
                sign(p.d_weights_hidden_output[0]),
                p.d_weights_hidden_output[0].abs(),
                sign(p.d_weights_hidden_output[1]),
                p.d_weights_hidden_output[1].abs(),
                sign(p.d_bias_output),
                p.d_bias_output.abs()
            );
        }
        Phase::Applied => {
            println!("[applied]");
            render_parameters(state.parameters());
        }
        Phase::Idle => {
            if let Some(entry) = state.journal().latest() {
                println!("[idle]     {}", entry);
            }
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    // random weights are drawn through the trainer so --seed applies to them
    let sequencer = Sequencer::new(NetworkParameters::demo());
    let timings = Timings::scaled(args.time_scale);
    let observer: Observer = Arc::new(render);
    let mut trainer = match args.seed {
        Some(seed) => Trainer::seeded(sequencer, timings, seed),
        None => Trainer::new(sequencer, timings),
    }
    .with_observer(observer);

    if !args.demo_weights {
        trainer.randomize();
    }
    trainer.set_learning_rate(args.lr);
    trainer.set_example(TrainingExample {
        input: [args.input[0], args.input[1]],
        target: args.target,
    });
    println!("initial parameters:");
    render_parameters(trainer.snapshot().parameters());

    match args.auto_run_secs {
        Some(secs) => match auto_run_duration(secs) {
            Ok(duration) => {
                trainer.set_auto_run(true);
                thread::sleep(duration);
                trainer.set_auto_run(false);
                trainer.join_auto_run();
            }
            Err(e) => log::error!("invalid auto-run duration {}: {}", secs, e),
        },
        None => {
            for _ in 0..args.steps {
                trainer.step();
            }
        }
    }

    let state = trainer.snapshot();
    log::info!("completed {} steps", state.steps_completed());
    println!("log:");
    for entry in state.journal().iter() {
        println!("  {}", entry);
    }

    if let Some(file_name) = args.plot {
        if let Err(e) = plot_error_history(state.error_history(), &file_name) {
            log::error!("could not plot error history: {}", e);
        }
    }
}
