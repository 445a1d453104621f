use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config requires flush_interval > 0, got {0}")]
    BadFlushInterval(i64),
    #[error("Config requires a positive {0} chunksize")]
    BadChunkSize(&'static str),
    #[error("Config requires vlen_min_per_shot < vlen_max_per_shot, got min={min} max={max}")]
    BadVlenBounds { min: usize, max: usize },
    #[error("Config requires positive detector frame dimensions, got {rows}x{columns}")]
    BadFrameDims { rows: usize, columns: usize },
}

#[derive(Debug, Error)]
pub enum DsetError {
    #[error("Dataset {0} requires a positive chunk extent")]
    InvalidChunk(String),
    #[error("Frame shape {rows}x{columns} does not match extents {expected_rows}x{expected_columns} of dataset {name}")]
    FrameShapeMismatch {
        name: String,
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
    #[error("Appending a frame to rank-1 dataset {0} is not possible")]
    WrongRank(String),
    #[error("Dataset operation failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("H5Dflush failed with status {0}")]
    FlushFailed(i32),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Channel id {0} appears twice in the layout")]
    DuplicateChannel(u32),
    #[error("Layout creation failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Layout failed due to dataset error: {0}")]
    DsetError(#[from] DsetError),
    #[error("H5Fstart_swmr_write failed with status {0}")]
    SwmrStart(i32),
}

#[derive(Debug, Error)]
pub enum DaqWriterError {
    #[error("DaqWriter failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("DaqWriter failed due to layout error: {0}")]
    LayoutError(#[from] LayoutError),
    #[error("DaqWriter failed due to dataset error: {0}")]
    DsetError(#[from] DsetError),
    #[error("DaqWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("DaqWriter failed due to send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
