use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// The three data families a writer produces. A family groups channels
/// that share a payload shape: per-shot scalars, variable-length blobs,
/// or fixed-size 2D frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Small,
    Vlen,
    Detector,
}

impl Family {
    /// Name of the family's top-level group in the file.
    ///
    /// "detctor" keeps the historical spelling; existing readers key on it.
    pub fn group_name(&self) -> &'static str {
        match self {
            Family::Small => "small",
            Family::Vlen => "vlen",
            Family::Detector => "detctor",
        }
    }
}

/// Scheduling and layout parameters of one family, extracted from the
/// flat configuration record.
#[derive(Debug, Clone, Copy)]
pub struct FamilyParams {
    pub name_first: u32,
    pub name_count: u32,
    pub shot_first: i64,
    pub shot_stride: i64,
    pub chunksize: usize,
}

impl FamilyParams {
    /// Channel ids of this family, ascending.
    pub fn channel_ids(&self) -> Range<u32> {
        self.name_first..self.name_first + self.name_count
    }
}

/// Structure representing the writer configuration. Contains naming, run
/// length, per-family channel ranges, scheduling and chunking parameters.
/// Configs are serializable and deserializable to YAML using serde and
/// serde_yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaqWriterConfig {
    pub verbose: i32,
    pub rundir: PathBuf,
    pub group: String,
    pub id: i32,
    pub num_shots: i64,
    pub small_name_first: u32,
    pub vlen_name_first: u32,
    pub detector_name_first: u32,
    pub small_name_count: u32,
    pub vlen_name_count: u32,
    pub detector_name_count: u32,
    pub small_shot_first: i64,
    pub vlen_shot_first: i64,
    pub detector_shot_first: i64,
    pub small_shot_stride: i64,
    pub vlen_shot_stride: i64,
    pub detector_shot_stride: i64,
    pub small_chunksize: usize,
    pub vlen_chunksize: usize,
    pub detector_chunksize: usize,
    pub vlen_min_per_shot: usize,
    pub vlen_max_per_shot: usize,
    pub detector_rows: usize,
    pub detector_columns: usize,
    pub flush_interval: i64,
    pub writers_hang: bool,
}

impl Default for DaqWriterConfig {
    /// Generate a small self-contained demo configuration, used by the
    /// CLI to emit a template file.
    fn default() -> Self {
        Self {
            verbose: 1,
            rundir: PathBuf::from("daq_run"),
            group: String::from("daq"),
            id: 0,
            num_shots: 120,
            small_name_first: 0,
            vlen_name_first: 0,
            detector_name_first: 0,
            small_name_count: 4,
            vlen_name_count: 2,
            detector_name_count: 1,
            small_shot_first: 0,
            vlen_shot_first: 0,
            detector_shot_first: 0,
            small_shot_stride: 1,
            vlen_shot_stride: 1,
            detector_shot_stride: 4,
            small_chunksize: 100,
            vlen_chunksize: 400,
            detector_chunksize: 10,
            vlen_min_per_shot: 4,
            vlen_max_per_shot: 8,
            detector_rows: 32,
            detector_columns: 32,
            flush_interval: 20,
            writers_hang: false,
        }
    }
}

impl DaqWriterConfig {
    /// Read the configuration in a YAML file.
    /// Returns a DaqWriterConfig if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check the validity rules the writer relies on. Must pass before
    /// any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval <= 0 {
            return Err(ConfigError::BadFlushInterval(self.flush_interval));
        }
        if self.vlen_min_per_shot >= self.vlen_max_per_shot {
            return Err(ConfigError::BadVlenBounds {
                min: self.vlen_min_per_shot,
                max: self.vlen_max_per_shot,
            });
        }
        if self.small_chunksize == 0 {
            return Err(ConfigError::BadChunkSize("small"));
        }
        if self.vlen_chunksize == 0 {
            return Err(ConfigError::BadChunkSize("vlen"));
        }
        if self.detector_chunksize == 0 {
            return Err(ConfigError::BadChunkSize("detector"));
        }
        if self.detector_name_count > 0 && (self.detector_rows == 0 || self.detector_columns == 0) {
            return Err(ConfigError::BadFrameDims {
                rows: self.detector_rows,
                columns: self.detector_columns,
            });
        }
        Ok(())
    }

    /// Scheduling and layout parameters of the given family.
    pub fn family(&self, family: Family) -> FamilyParams {
        match family {
            Family::Small => FamilyParams {
                name_first: self.small_name_first,
                name_count: self.small_name_count,
                shot_first: self.small_shot_first,
                shot_stride: self.small_shot_stride,
                chunksize: self.small_chunksize,
            },
            Family::Vlen => FamilyParams {
                name_first: self.vlen_name_first,
                name_count: self.vlen_name_count,
                shot_first: self.vlen_shot_first,
                shot_stride: self.vlen_shot_stride,
                chunksize: self.vlen_chunksize,
            },
            Family::Detector => FamilyParams {
                name_first: self.detector_name_first,
                name_count: self.detector_name_count,
                shot_first: self.detector_shot_first,
                shot_stride: self.detector_shot_stride,
                chunksize: self.detector_chunksize,
            },
        }
    }

    /// Construct the writer basename using the DAQ naming convention.
    pub fn basename(&self) -> String {
        format!("{}-s{:0>4}", self.group, self.id)
    }

    /// Path of the output HDF5 file.
    pub fn h5_path(&self) -> PathBuf {
        self.rundir
            .join("hdf5")
            .join(format!("{}.h5", self.basename()))
    }

    /// Path of the pid file advertising this writer.
    pub fn pid_path(&self) -> PathBuf {
        self.rundir
            .join("pids")
            .join(format!("{}.pid", self.basename()))
    }

    /// Path of the marker created when the writer is done with the run.
    pub fn finished_path(&self) -> PathBuf {
        self.rundir
            .join("logs")
            .join(format!("{}.finished", self.basename()))
    }

    /// Log every configuration field, one line each, at info level.
    pub fn dump(&self) {
        spdlog::info!("DaqWriterConfig:");
        spdlog::info!("    verbose={}", self.verbose);
        spdlog::info!("    rundir={}", self.rundir.display());
        spdlog::info!("    group={}", self.group);
        spdlog::info!("    id={}", self.id);
        spdlog::info!("    num_shots={}", self.num_shots);
        spdlog::info!("    small_name_first={}", self.small_name_first);
        spdlog::info!("    vlen_name_first={}", self.vlen_name_first);
        spdlog::info!("    detector_name_first={}", self.detector_name_first);
        spdlog::info!("    small_name_count={}", self.small_name_count);
        spdlog::info!("    vlen_name_count={}", self.vlen_name_count);
        spdlog::info!("    detector_name_count={}", self.detector_name_count);
        spdlog::info!("    small_shot_first={}", self.small_shot_first);
        spdlog::info!("    vlen_shot_first={}", self.vlen_shot_first);
        spdlog::info!("    detector_shot_first={}", self.detector_shot_first);
        spdlog::info!("    small_shot_stride={}", self.small_shot_stride);
        spdlog::info!("    vlen_shot_stride={}", self.vlen_shot_stride);
        spdlog::info!("    detector_shot_stride={}", self.detector_shot_stride);
        spdlog::info!("    small_chunksize={}", self.small_chunksize);
        spdlog::info!("    vlen_chunksize={}", self.vlen_chunksize);
        spdlog::info!("    detector_chunksize={}", self.detector_chunksize);
        spdlog::info!("    vlen_min_per_shot={}", self.vlen_min_per_shot);
        spdlog::info!("    vlen_max_per_shot={}", self.vlen_max_per_shot);
        spdlog::info!("    detector_rows={}", self.detector_rows);
        spdlog::info!("    detector_columns={}", self.detector_columns);
        spdlog::info!("    flush_interval={}", self.flush_interval);
        spdlog::info!("    writers_hang={}", self.writers_hang);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DaqWriterConfig {
        DaqWriterConfig::default()
    }

    #[test]
    fn test_default_config_is_valid() {
        valid_config().validate().expect("default config must pass");
    }

    #[test]
    fn test_flush_interval_must_be_positive() {
        let mut config = valid_config();
        config.flush_interval = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadFlushInterval(0))
        ));
    }

    #[test]
    fn test_vlen_bounds_must_be_ordered() {
        let mut config = valid_config();
        config.vlen_min_per_shot = 8;
        config.vlen_max_per_shot = 8;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadVlenBounds { min: 8, max: 8 })
        ));
    }

    #[test]
    fn test_chunksizes_must_be_positive() {
        let mut config = valid_config();
        config.vlen_chunksize = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadChunkSize("vlen"))
        ));
    }

    #[test]
    fn test_frame_dims_checked_only_with_detector_channels() {
        let mut config = valid_config();
        config.detector_rows = 0;
        assert!(config.validate().is_err());
        config.detector_name_count = 0;
        config.validate().expect("no detector channels, dims unused");
    }

    #[test]
    fn test_basename_and_paths() {
        let mut config = valid_config();
        config.rundir = PathBuf::from("/data/run7");
        config.group = String::from("daq");
        config.id = 3;
        assert_eq!(config.basename(), "daq-s0003");
        assert_eq!(config.h5_path(), PathBuf::from("/data/run7/hdf5/daq-s0003.h5"));
        assert_eq!(config.pid_path(), PathBuf::from("/data/run7/pids/daq-s0003.pid"));
        assert_eq!(
            config.finished_path(),
            PathBuf::from("/data/run7/logs/daq-s0003.finished")
        );
    }

    #[test]
    fn test_channel_ids_are_contiguous() {
        let mut config = valid_config();
        config.small_name_first = 7;
        config.small_name_count = 3;
        let ids: Vec<u32> = config.family(Family::Small).channel_ids().collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = valid_config();
        let yaml_str = serde_yaml::to_string(&config).unwrap();
        let parsed = serde_yaml::from_str::<DaqWriterConfig>(&yaml_str).unwrap();
        assert_eq!(parsed.num_shots, config.num_shots);
        assert_eq!(parsed.group, config.group);
        assert_eq!(parsed.vlen_max_per_shot, config.vlen_max_per_shot);
        assert_eq!(parsed.writers_hang, config.writers_hang);
    }
}
