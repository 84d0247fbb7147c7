use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chanscope::export::DEFAULT_OUTPUT;
use chanscope::map::{self, MapStyle, DEFAULT_MAP_OUTPUT};
use chanscope::parser::{self, Command};
use chanscope::profile::SystemProfile;
use chanscope::select::CancelToken;
use chanscope::Session;
use tracing_subscriber::EnvFilter;

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn,chanscope=warn");
    }
    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_target(false)
    .with_level(true)
    .init();

    if let Err(e) = SystemProfile::detect().install() {
        println!("[\u{26a0}\u{fe0f}] Could not size worker pool: {}", e);
    }

    print_banner();
    println!("Type 'HELP' for supported commands or 'EXIT' to quit.\n");

    let mut session = Session::default();
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("chanscope> ");
        if io::stdout().flush().is_err() { break; }
        buffer.clear();

        match stdin.read_line(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if buffer.trim().is_empty() { continue; }

        match parser::parse_command(&buffer) {
            Ok(Command::Exit) => break,
            Ok(cmd) => {
                if let Err(e) = execute_command(&mut session, cmd) {
                    println!("[\u{26a0}\u{fe0f} Error] {}", e);
                }
            }
            Err(e) => {
                println!("[\u{2717} Syntax Error] {}", e);
                if !buffer.contains('"') && buffer.trim_start().to_uppercase().starts_with("IMPORT") {
                    println!("    \u{2139}\u{fe0f}  Hint: Paths must be quoted: IMPORT \"points.csv\"");
                }
            }
        }
    }
}

fn print_banner() {
    println!("\n==================================================");
    println!("   Chanscope - Closest Point Channel Analysis");
    println!("==================================================\n");
}

fn print_help() {
    println!("\n--- Available Commands ---");
    println!("1. IMPORT:    IMPORT \"points.csv\"");
    println!("2. CALCULATE: CALCULATE [INTO \"{}\"] [AS CSV|JSON]", DEFAULT_OUTPUT);
    println!("3. SHOW:      SHOW 0");
    println!("4. MAP:       MAP SITES \"sites.csv\" PATHS \"path.csv\" [SITE COLOR red] [PATH COLOR #000000] [INTO \"{}\"]", DEFAULT_MAP_OUTPUT);
    println!("5. STATUS:    Show what is loaded");
    println!("6. EXIT:      Quit\n");
}

fn execute_command(session: &mut Session, cmd: Command) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Status => print_status(session),
        Command::Import { path } => {
            let count = session.import(Path::new(&path))?;
            println!("[\u{2713} OK] Imported {} points from {}", count, path);
        }
        Command::Calculate { output, format } => {
            let output = PathBuf::from(output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));
            let rows = session.run(&output, format.unwrap_or_default(), &CancelToken::new())?;
            println!("[\u{2713} OK] Closest points calculated and saved to {} ({} rows)", output.display(), rows);
        }
        Command::Show { index } => print_neighbors(session, index),
        Command::Map { sites, paths, site_color, path_color, output } => {
            let mut style = MapStyle::default();
            if let Some(c) = site_color { style.site_color = map::parse_color(&c)?; }
            if let Some(c) = path_color { style.path_color = map::parse_color(&c)?; }

            let output = PathBuf::from(output.unwrap_or_else(|| DEFAULT_MAP_OUTPUT.to_string()));
            let site_list = map::read_sites(Path::new(&sites))?;
            let path_list = map::read_path(Path::new(&paths))?;
            map::render(&site_list, &path_list, &style, &output)?;
            println!("[\u{2713} OK] Map has been saved as {}", output.display());
        }
        Command::Exit => {}
    }
    Ok(())
}

fn print_status(session: &Session) {
    println!("Session {}", session.id());
    match session.source() {
        Some(path) => println!("  Points:     {} from {}", session.records().len(), path.display()),
        None => println!("  Points:     none imported"),
    }
    match session.result() {
        Some(result) => println!("  Calculated: {} subjects", result.len()),
        None => println!("  Calculated: no"),
    }
}

fn print_neighbors(session: &Session, index: usize) {
    let Some(subject) = session.records().get(index) else {
        println!("[\u{2717}] No point with index {}.", index);
        return;
    };
    let Some(entries) = session.neighbors_of(index) else {
        println!("[\u{2717}] Run CALCULATE first.");
        return;
    };

    let unit = session.unit().label();
    println!("\nPoint {} ({}, {}) channel {}:", index, subject.latitude, subject.longitude, subject.channel);
    for (rank, entry) in entries.iter().enumerate() {
        let neighbor = &session.records()[entry.neighbor];
        println!(
            "  {}. #{} ({}, {}) {:.4} {} | same channel: {}",
            rank + 1,
            neighbor.index,
            neighbor.latitude,
            neighbor.longitude,
            entry.distance,
            unit,
            if entry.same_channel { "yes" } else { "no" }
        );
    }
    if entries.is_empty() {
        println!("  (no other points)");
    }
    println!();
}
