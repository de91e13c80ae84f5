mod args;

use anyhow::Result;
use tracing::warn;

use args::{Args, SelectionArg};
use thermal_series::{
    cli::{init_logging, load_session},
    export,
};

fn main() -> Result<()> {
    init_logging();
    let Args {
        paths,
        config,
        selection,
        delta,
        output,
    } = Args::from_cmd_line()?;

    let mut session = load_session(paths, &config)?;
    let summary = *session.summary();
    eprintln!(
        "Loaded {} frames ({}, camera {})",
        summary.frames, summary.shape, summary.camera
    );
    eprintln!(
        "Temperature range: {}°C to {}°C",
        summary.range.low, summary.range.high
    );

    match selection {
        SelectionArg::None => {
            serde_json::to_writer(std::io::stdout().lock(), &summary)?;
            println!();
            return Ok(());
        }
        SelectionArg::Points(points) => {
            for p in points {
                session.add_point(p);
            }
        }
        SelectionArg::Polygon(vertices) => session.set_polygon(vertices)?,
    }

    if delta {
        config.check_window(session.frames().len())?;
    }

    let report = session.series()?;
    if !report.warnings.is_empty() {
        warn!(
            count = report.warnings.len(),
            "some samples could not be read and were left empty"
        );
    }

    let table = if delta {
        report.series.delta(config.window)?
    } else {
        report.series
    };

    match output {
        Some(path) => {
            export::save_csv(&table, &path)?;
            eprintln!("Wrote {}", path.display());
        }
        None => export::write_csv(&table, std::io::stdout().lock())?,
    }
    Ok(())
}
