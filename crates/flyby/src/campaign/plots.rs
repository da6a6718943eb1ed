//! SVG plots of a finished campaign

use super::{CampaignError, FrameResult, RecordPair};
use crate::physics::math::{ASTRONOMICAL_UNIT, Scalar, Vector};
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const PLOT_SIZE: (u32, u32) = (1024, 768);

fn plot_error(e: impl std::fmt::Display) -> CampaignError {
    CampaignError::Plot(e.to_string())
}

/// Range covering `values` with a small margin, never empty
fn padded_range(values: impl Iterator<Item = Scalar>) -> Range<Scalar> {
    let (min, max) = values.fold((Scalar::INFINITY, Scalar::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return -1.0..1.0;
    }

    let margin = ((max - min) * 0.05).max(1e-9 * max.abs().max(1.0));
    (min - margin)..(max + margin)
}

/// 3D heliocentric paths of both bodies, in astronomical units
pub fn draw_trajectories(path: &Path, pairs: &[RecordPair]) -> Result<(), CampaignError> {
    let to_au = |v: Vector| {
        let au = v / ASTRONOMICAL_UNIT;
        (au.x, au.y, au.z)
    };
    let asteroid = pairs.iter().map(|p| to_au(p.asteroid.position)).collect();
    let spacecraft = pairs.iter().map(|p| to_au(p.spacecraft.position)).collect();

    draw_paths(path, "Baseline trajectories (AU)", asteroid, spacecraft)
}

/// 3D paths of both bodies over the emitted frames, in kilometres from the
/// asteroid's position at the first frame
pub fn draw_encounter(path: &Path, frames: &[FrameResult]) -> Result<(), CampaignError> {
    let origin = frames
        .first()
        .map_or(Vector::ZERO, |frame| frame.body_a_position);
    let to_km = |v: Vector| {
        let km = (v - origin) / 1000.0;
        (km.x, km.y, km.z)
    };
    let asteroid = frames.iter().map(|f| to_km(f.body_a_position)).collect();
    let spacecraft = frames.iter().map(|f| to_km(f.body_b_position)).collect();

    draw_paths(path, "Encounter positions (km)", asteroid, spacecraft)
}

fn draw_paths(
    path: &Path,
    caption: &str,
    asteroid: Vec<(Scalar, Scalar, Scalar)>,
    spacecraft: Vec<(Scalar, Scalar, Scalar)>,
) -> Result<(), CampaignError> {
    let all = || asteroid.iter().chain(spacecraft.iter());
    let x_range = padded_range(all().map(|p| p.0));
    let y_range = padded_range(all().map(|p| p.1));
    let z_range = padded_range(all().map(|p| p.2));

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(20)
        .build_cartesian_3d(x_range, y_range, z_range)
        .map_err(plot_error)?;

    chart.configure_axes().draw().map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(asteroid, &BLUE))
        .map_err(plot_error)?
        .label("asteroid")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(spacecraft, &RED))
        .map_err(plot_error)?
        .label("spacecraft")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Separation against time from the start of the encounter window
pub fn draw_distance_history(path: &Path, history: &[(Scalar, Scalar)]) -> Result<(), CampaignError> {
    let time_range = padded_range(history.iter().map(|(t, _)| *t));
    let distance_range = padded_range(history.iter().map(|(_, d)| *d));

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Spacecraft to asteroid distance", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(time_range, distance_range)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Time from window start (s)")
        .y_desc("Distance (m)")
        .x_label_formatter(&|x| format!("{x:.1}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(history.iter().copied(), &BLUE))
        .map_err(plot_error)?;

    chart
        .draw_series(
            history
                .iter()
                .map(|&(t, d)| Circle::new((t, d), 3, BLUE.filled())),
        )
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}
