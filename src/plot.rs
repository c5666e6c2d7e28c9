use std::error::Error;

use crate::types::Float;
use plotters::prelude::*;

/// Smallest residual drawn on the log axis
const RESIDUAL_FLOOR: Float = 1e-16;

/// Plot residual histories of several solvers against iteration count, on a
/// log scale, into a PNG at file_path.
pub fn plot_residuals(
    histories: &[(&str, Vec<Float>)],
    file_path: &str,
) -> Result<(), Box<dyn Error>> {
    let values: Vec<Float> = histories
        .iter()
        .flat_map(|(_, history)| history.iter().map(|r| r.max(RESIDUAL_FLOOR)))
        .collect();
    let min_y = values.iter().cloned().fold(1.0, Float::min);
    let max_y = values.iter().cloned().fold(RESIDUAL_FLOOR * 10., Float::max);
    let num_iterations = histories.iter().map(|(_, h)| h.len()).max().unwrap_or(1);

    let root = BitMapBackend::new(file_path, (800, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Signorini residual vs. iteration", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..num_iterations + 1, (min_y..max_y * 2.).log_scale())?;

    chart
        .configure_mesh()
        .x_desc("iteration")
        .y_desc("residual")
        .draw()?;

    for (i, (label, history)) in histories.iter().enumerate() {
        let style = Palette99::pick(i).stroke_width(2);
        chart
            .draw_series(LineSeries::new(
                history
                    .iter()
                    .enumerate()
                    .map(|(k, r)| (k + 1, r.max(RESIDUAL_FLOOR))),
                style,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Plot time series sampled every dt into a PNG at file_path
pub fn plot_trajectories(
    series: &[(&str, Vec<Float>)],
    dt: Float,
    caption: &str,
    file_path: &str,
) -> Result<(), Box<dyn Error>> {
    let num_steps = series.iter().map(|(_, s)| s.len()).max().unwrap_or(1);
    let final_time = (num_steps.max(2) - 1) as Float * dt;

    // Determine y-axis limits based on the minimum and maximum values in the data
    let min_y = series
        .iter()
        .flat_map(|(_, s)| s.iter().cloned())
        .fold(Float::INFINITY, Float::min);
    let max_y = series
        .iter()
        .flat_map(|(_, s)| s.iter().cloned())
        .fold(Float::NEG_INFINITY, Float::max);
    let (min_y, max_y) = if min_y < max_y {
        (min_y, max_y)
    } else {
        (min_y.min(0.) - 1., max_y.max(0.) + 1.)
    };

    let root = BitMapBackend::new(file_path, (800, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..final_time, min_y..max_y)?;

    chart.configure_mesh().x_desc("time (s)").draw()?;

    for (i, (label, values)) in series.iter().enumerate() {
        let style = Palette99::pick(i).stroke_width(2);
        chart
            .draw_series(LineSeries::new(
                values.iter().enumerate().map(|(k, x)| (k as Float * dt, *x)),
                style,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
