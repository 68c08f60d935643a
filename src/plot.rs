//! Chart of the training error over the steps taken so far

use std::error::Error;

use plotters::{
    chart::ChartBuilder,
    prelude::{BitMapBackend, Circle, IntoDrawingArea},
    series::LineSeries,
    style::{BLUE, Color, WHITE},
};

/// Plots the squared error of each step and saves it as an image
pub fn plot_error_history(history: &[f64], file_name: &str) -> Result<(), Box<dyn Error>> {
    let root_area = BitMapBackend::new(file_name, (640, 480)).into_drawing_area();
    root_area.fill(&WHITE)?;

    // NaN errors are left out, they would break the axis range
    let points: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_finite())
        .map(|(i, e)| ((i + 1) as f64, *e))
        .collect();
    let x_max = (history.len().max(1) + 1) as f64;
    let y_max = points.iter().map(|(_, e)| *e).fold(0.0f64, f64::max).max(1e-3) * 1.1;

    let mut chart = ChartBuilder::on(&root_area)
        .caption("Squared error per step", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("step")
        .y_desc("error")
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;

    root_area.present()?;
    log::info!("Error plot has been saved to '{}'.", file_name);

    Ok(())
}
