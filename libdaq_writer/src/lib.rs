//! # daq_writer
//!
//! daq_writer is a single-writer/multiple-reader (SWMR) HDF5 writer for
//! shot-indexed DAQ streams, written in Rust. It turns a sequence of
//! acquisition events (shots, identified by a monotonically increasing
//! *fiducial* counter) into chunked, appendable datasets organized by
//! data family and logical channel, flushing on a periodic boundary so
//! concurrent readers observe new data with bounded staleness.
//!
//! Each writer owns exactly one file. The full group/dataset tree is
//! created up front, SWMR access is enabled, and only then does the shot
//! loop start appending; readers may attach at any point after that.
//!
//! ## HDF5 Data Format
//!
//! The layout of the output file is as follows:
//!
//! ```text
//! group-s0000.h5
//! small
//! |---- 00000
//! |    |---- fiducials(dset, int64)
//! |    |---- nano(dset, int64)
//! |    |---- data(dset, int64)
//! vlen
//! |---- 00000
//! |    |---- fiducials(dset, int64)
//! |    |---- nano(dset, int64)
//! |    |---- blob(dset, int64)
//! |    |---- blobstart(dset, int64)
//! |    |---- blobcount(dset, int64)
//! detctor
//! |---- 00000
//! |    |---- fiducials(dset, int64)
//! |    |---- nano(dset, int64)
//! |    |---- data(dset, int16, N x rows x columns)
//! ```
//!
//! Channel subgroups are 5-digit zero-padded decimals covering the
//! configured contiguous id range of each family. Every 1D dataset is
//! extensible along axis 0; the detector `data` dataset is 3D and
//! extensible along the frame axis. `blobstart`/`blobcount` index into
//! `blob` so a reader can slice out the variable-length payload of any
//! shot.
//!
//! ## Configuration
//!
//! Writers are driven by a YAML configuration file. A template can be
//! generated with the `new` subcommand of `daq_writer_cli`. The fields
//! are:
//!
//! - verbose: 0 = warnings only, 1 = run milestones, 2 or more adds a
//!   per-fiducial trace
//! - rundir: base directory holding the `hdf5/`, `pids/` and `logs/`
//!   subdirectories
//! - group: group name used in file and pid naming
//! - id: this writer's id within the group; the (group, id) pair must be
//!   unique among live writers, which is the caller's responsibility
//! - num_shots: how many fiducials the run covers
//! - small/vlen/detector_name_first and _name_count: the contiguous
//!   channel id range of each family
//! - small/vlen/detector_shot_first and _shot_stride: which fiducials a
//!   family writes on (first, then every stride-th)
//! - small/vlen/detector_chunksize: chunk extents; the small chunk size
//!   governs every per-shot scalar dataset, the vlen chunk size the blob
//!   payload, and the detector chunk size the frame axis
//! - vlen_min_per_shot / vlen_max_per_shot: bounds of the per-shot vlen
//!   element count
//! - detector_rows / detector_columns: frame dimensions
//! - flush_interval: fiducials between durability flushes
//! - writers_hang: debugging aid, hang instead of closing the file
pub mod config;
pub mod dset;
pub mod error;
pub mod layout;
pub mod markers;
pub mod schedule;
pub mod worker_status;
pub mod writer;

mod swmr;
