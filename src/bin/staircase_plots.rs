// Offline plots for a recorded titration session: the per-trial estimate
// trace plus the final posterior, reconstructed by replaying the trials.
use std::error::Error;
use std::fs::create_dir_all;
use std::path::Path;

use plotters::prelude::*;

use staircase::core::quest::ThresholdEstimator;
use staircase::session::report::SessionRecord;

fn main() -> Result<(), Box<dyn Error>> {
    let record_path = std::env::args()
        .nth(1)
        .ok_or("usage: staircase_plots <session_record.json>")?;
    let record = SessionRecord::read_json(Path::new(&record_path))?;

    let out_dir = Path::new("target/plots");
    create_dir_all(out_dir)?;

    let out_path = out_dir.join(format!(
        "titration_pair{}_chamber{}.png",
        record.pair_id, record.chamber
    ));
    plot_session(&out_path, &record)?;

    println!("Saved titration plot to {}", out_path.display());
    Ok(())
}

fn plot_session(out_path: &Path, record: &SessionRecord) -> Result<(), Box<dyn Error>> {
    // Replay the recorded trials to recover the final posterior; degenerate
    // trials were skipped at acquisition time as well.
    let mut estimator = ThresholdEstimator::new(record.config.clone())?;
    for t in &record.trials {
        let _ = estimator.add_response(t.intensity, t.detected);
    }

    let root = BitMapBackend::new(out_path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));

    // Top panel: running estimate and probe intensities over trials.
    let n = record.threshold_list.len().max(record.trials.len());
    let x_max = n.max(1) as f64;

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &v in record
        .threshold_list
        .iter()
        .chain(record.trials.iter().map(|t| &t.intensity))
    {
        y_min = y_min.min(v);
        y_max = y_max.max(v);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = record.config.min_val;
        y_max = record.config.max_val;
    }
    let pad = ((y_max - y_min) * 0.1).max(1e-3);

    let mut chart_trace = ChartBuilder::on(&panels[0])
        .caption(
            format!(
                "Pair {} chamber {} | titration {} | final mean {:.4}",
                record.pair_id,
                record.chamber,
                record.titration_counter,
                record.final_threshold_mean
            ),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..x_max, (y_min - pad)..(y_max + pad))?;

    chart_trace
        .configure_mesh()
        .x_desc("trial")
        .y_desc("intensity")
        .draw()?;

    chart_trace.draw_series(std::iter::once(PathElement::new(
        vec![
            (0.0, record.final_threshold_mean),
            (x_max, record.final_threshold_mean),
        ],
        BLACK.mix(0.3),
    )))?;

    let trace: Vec<(f64, f64)> = record
        .threshold_list
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    chart_trace
        .draw_series(LineSeries::new(trace, &BLUE))?
        .label("estimate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart_trace
        .draw_series(record.trials.iter().map(|t| {
            let color = if t.detected {
                GREEN.filled()
            } else {
                RED.filled()
            };
            Circle::new((t.trial as f64, t.intensity), 3, color)
        }))?
        .label("probe (green = detected)")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, GREEN.filled()));

    chart_trace
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    // Bottom panel: the posterior after every recorded trial.
    let posterior = estimator.posterior();
    let points: Vec<(f64, f64)> = posterior
        .grid()
        .values
        .iter()
        .copied()
        .zip(posterior.pmf().iter().copied())
        .collect();
    let p_max = points.iter().map(|&(_, p)| p).fold(1e-12f64, f64::max) * 1.1;

    let mut chart_post = ChartBuilder::on(&panels[1])
        .caption(
            format!(
                "Posterior after {} trials | mean {:.4} sd {:.4}",
                record.trials.len(),
                estimator.mean(),
                estimator.sd()
            ),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(record.config.min_val..record.config.max_val, 0.0f64..p_max)?;

    chart_post
        .configure_mesh()
        .x_desc("threshold intensity")
        .y_desc("posterior mass")
        .draw()?;

    chart_post.draw_series(std::iter::once(PathElement::new(
        vec![
            (record.final_threshold_mean, 0.0),
            (record.final_threshold_mean, p_max),
        ],
        BLACK.mix(0.3),
    )))?;

    chart_post.draw_series(LineSeries::new(points, &BLUE))?;

    root.present()?;
    Ok(())
}
