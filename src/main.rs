use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use chanscope::distance::Unit;
use chanscope::export::{Format, DEFAULT_OUTPUT};
use chanscope::map::{self, MapStyle, DEFAULT_MAP_OUTPUT};
use chanscope::profile::SystemProfile;
use chanscope::select::CancelToken;
use chanscope::Session;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Closest-point WiFi channel analysis", long_about = None)]
struct Args {
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Clone, Debug)]
enum Mode {
    /// Find the three closest points to every point and write them out
    Closest {
        /// Points table with Lat, Lon and WiFi Channel columns
        #[clap(long)]
        input: PathBuf,

        #[clap(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        #[clap(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        #[clap(long, value_enum, default_value_t = Unit::Miles)]
        unit: Unit,

        /// Worker threads (defaults to the detected core count)
        #[clap(long)]
        threads: Option<usize>,
    },
    /// Render sites and a drive path to a PNG map
    Map {
        /// Site table with SiteName, Lat and Long columns
        #[clap(long)]
        sites: PathBuf,

        /// Path table with Latitude and Longitude columns
        #[clap(long)]
        paths: PathBuf,

        #[clap(long, default_value = DEFAULT_MAP_OUTPUT)]
        output: PathBuf,

        #[clap(long, default_value = "red")]
        site_color: String,

        #[clap(long, default_value = "black")]
        path_color: String,

        #[clap(long, default_value = "1200")]
        width: u32,

        #[clap(long, default_value = "900")]
        height: u32,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,chanscope=info");
    }
    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_target(false)
    .with_level(true)
    .init();

    let args = Args::parse();

    match args.mode {
        Mode::Closest { input, output, format, unit, threads } => {
            let profile = SystemProfile::detect().with_threads(threads);
            profile.install()?;

            println!("--- [Chanscope] ---");
            println!("Detected Cores: {}", profile.logical_cores);
            println!("Worker Threads: {}", profile.worker_threads);
            println!("Distance Unit:  {:?}", unit);
            println!("-------------------");

            let mut session = Session::new(unit);
            let count = session.import(&input)?;
            println!("Imported {} points from {}", count, input.display());

            let rows = session.run(&output, format, &CancelToken::new())?;
            println!("Closest points calculated and saved to {} ({} rows).", output.display(), rows);
        }
        Mode::Map { sites, paths, output, site_color, path_color, width, height } => {
            let style = MapStyle {
                site_color: map::parse_color(&site_color)?,
                path_color: map::parse_color(&path_color)?,
                width,
                height,
            };

            let site_list = map::read_sites(&sites)?;
            let path_list = map::read_path(&paths)?;
            let bounds = map::render(&site_list, &path_list, &style, &output)?;

            let (lat, lon) = bounds.center();
            println!("Map centred on ({:.5}, {:.5}) saved as {}", lat, lon, output.display());
        }
    }

    Ok(())
}
