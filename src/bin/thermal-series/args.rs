use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::value_t_or_exit;
use thermal_series::{
    arg, args_parser,
    cli::{parse_coord, parse_polygon},
    opt, AnalysisConfig, CameraType, Coord,
};

pub enum SelectionArg {
    None,
    Points(Vec<Coord>),
    Polygon(Vec<Coord>),
}

pub struct Args {
    pub paths: Vec<String>,
    pub config: AnalysisConfig,
    pub selection: SelectionArg,
    pub delta: bool,
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-series")
            .setting(clap::AppSettings::AllowLeadingHyphen)
            .about("Extract temperature time series from thermal CSV frames.")
            .arg(opt!("config").short("c").help("JSON config file"))
            .arg(
                opt!("camera")
                    .possible_values(&["mobotix", "generic"])
                    .case_insensitive(true)
                    .help("Camera type of the CSV exports (default: mobotix)"),
            )
            .arg(opt!("low percentile").help("Percentile for the display range low bound (default: 15)"))
            .arg(opt!("high percentile").help("Percentile for the display range high bound (default: 95)"))
            .arg(
                opt!("point")
                    .short("p")
                    .multiple(true)
                    .number_of_values(1)
                    .conflicts_with("polygon")
                    .help("Probe point as X,Y (column, row); repeatable"),
            )
            .arg(
                opt!("polygon")
                    .short("P")
                    .help("Region as space separated X,Y vertices"),
            )
            .arg(
                opt!("delta")
                    .short("d")
                    .takes_value(false)
                    .help("Output fixed-lag differences instead of the series"),
            )
            .arg(
                opt!("window")
                    .short("w")
                    .help("Delta window in frames (default: 2)"),
            )
            .arg(opt!("output").short("o").help("Output CSV (default: stdout)"))
            .arg(
                arg!("paths")
                    .required(true)
                    .multiple(true)
                    .help("Frame CSV paths; timestamps are read from the file names"),
            )
            .get_matches();

        let mut config = match matches.value_of("config") {
            Some(path) => AnalysisConfig::from_json_path(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(camera) = matches.value_of("camera") {
            config.camera = camera.parse::<CameraType>()?;
        }
        if matches.is_present("low percentile") {
            config.low_percentile = value_t_or_exit!(matches, "low percentile", f64);
        }
        if matches.is_present("high percentile") {
            config.high_percentile = value_t_or_exit!(matches, "high percentile", f64);
        }
        if matches.is_present("window") {
            config.window = value_t_or_exit!(matches, "window", usize);
        }
        config.validate()?;

        let selection = if let Some(points) = matches.values_of("point") {
            SelectionArg::Points(points.map(parse_coord).collect::<Result<_>>()?)
        } else if let Some(polygon) = matches.value_of("polygon") {
            SelectionArg::Polygon(parse_polygon(polygon)?)
        } else {
            SelectionArg::None
        };

        let delta = matches.is_present("delta");
        if delta && matches!(selection, SelectionArg::None) {
            bail!("--delta needs a --point or --polygon selection");
        }

        let paths = matches
            .values_of("paths")
            .map(|v| v.map(String::from).collect())
            .unwrap_or_default();
        let output = matches.value_of("output").map(PathBuf::from);

        Ok(Args {
            paths,
            config,
            selection,
            delta,
            output,
        })
    }
}
