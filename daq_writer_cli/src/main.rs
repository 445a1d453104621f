//! # daq_writer_cli
//!
//! Command-line front end for the daq_writer library.
//!
//! ## Use
//!
//! To run a writer use the following command
//!
//! ```bash
//! daq_writer_cli -p/--path <your_configuration.yaml>
//! ```
//!
//! To generate a configuration template file use
//!
//! ```bash
//! daq_writer_cli -p/--path <your_configuration.yaml> new
//! ```
//!
//! The run directory subtree (`hdf5/`, `pids/`, `logs/`) is created if
//! missing. The process exits non-zero on any fatal error; an absent
//! `<group>-s<id>.finished` marker in `logs/` signals an incomplete run.
//!
//! ## Configuration
//!
//! See the `libdaq_writer` crate documentation for the meaning of every
//! configuration field. The `verbose` field controls terminal output:
//! 0 prints warnings only, 1 adds run milestones, 2 or more adds a
//! per-fiducial trace.

use clap::{Arg, Command};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use libdaq_writer::config::DaqWriterConfig;
use libdaq_writer::writer::DaqWriter;

fn make_template_config(path: &Path) {
    let config = DaqWriterConfig::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could not create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

fn set_log_level(verbose: i32) {
    let filter = match verbose {
        i32::MIN..=0 => spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Warn),
        1 => spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Info),
        _ => spdlog::LevelFilter::All,
    };
    spdlog::default_logger().set_level_filter(filter);
}

fn main() -> ExitCode {
    // Create a cli
    let matches = Command::new("daq_writer_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
        .get_matches();

    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!(
            "Making a template config at {}...",
            config_path.display()
        );
        make_template_config(&config_path);
        spdlog::info!("Done.");
        return ExitCode::SUCCESS;
    }

    // Load and check the config before anything touches the disk.
    let config = match DaqWriterConfig::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    set_log_level(config.verbose);
    if let Err(e) = config.validate() {
        spdlog::error!("{e}");
        return ExitCode::FAILURE;
    }

    // Provision the run directory subtree the writer expects.
    for sub in ["hdf5", "pids", "logs"] {
        if let Err(e) = std::fs::create_dir_all(config.rundir.join(sub)) {
            spdlog::error!(
                "Could not create {} directory under {}: {}",
                sub,
                config.rundir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let h5_path = config.h5_path();
    let writer = match DaqWriter::new(config) {
        Ok(w) => w,
        Err(e) => {
            spdlog::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Run the writer on a worker thread and monitor its progress here.
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || writer.run(&tx));

    for status in rx {
        spdlog::info!(
            "progress: {:3.0}% (fiducial {})",
            status.progress * 100.0,
            status.fiducial
        );
    }

    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            spdlog::error!("Writer failed with error: {e}");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            spdlog::error!("Failed to join writer thread!");
            return ExitCode::FAILURE;
        }
    }

    if let Ok(meta) = std::fs::metadata(&h5_path) {
        spdlog::info!(
            "Wrote {} to {}",
            human_bytes::human_bytes(meta.len() as f64),
            h5_path.display()
        );
    }
    spdlog::info!("Done.");
    ExitCode::SUCCESS
}
