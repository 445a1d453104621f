use std::sync::mpsc::Sender;
use std::time::Instant;

use ndarray::Array2;

use super::config::DaqWriterConfig;
use super::error::DaqWriterError;
use super::layout::FileLayout;
use super::markers::{self, FinishedMarker};
use super::schedule::{ShotCursor, VlenCounter};
use super::worker_status::WorkerStatus;

/// The write engine. Owns the full file layout, the per-family shot
/// cursors, the vlen element counter and the reusable payload buffers,
/// and drives the fiducial loop to completion.
///
/// Construction writes the pid file, builds the complete tree and
/// enables SWMR; [`DaqWriter::run`] then appends shot data and flushes
/// on the configured cadence. The writer is consumed by the run: when it
/// drops, every HDF5 handle closes in reverse creation order and the
/// finished marker is written, on the clean and the unwinding path alike.
#[derive(Debug)]
pub struct DaqWriter {
    config: DaqWriterConfig,
    layout: FileLayout,
    small_cursor: ShotCursor,
    vlen_cursor: ShotCursor,
    detector_cursor: ShotCursor,
    vlen_count: VlenCounter,
    vlen_buf: Vec<i64>,
    frame_buf: Array2<i16>,
    t0: Instant,
    // Last field: every handle above must close before the marker appears.
    _finished: FinishedMarker,
}

impl DaqWriter {
    /// Validate the configuration, write the pid file, create the file
    /// and the full tree, and enable SWMR. Readers may attach as soon as
    /// this returns.
    pub fn new(config: DaqWriterConfig) -> Result<Self, DaqWriterError> {
        config.validate()?;
        markers::write_pid_file(&config.pid_path(), &config.group, config.id);

        let h5_path = config.h5_path();
        let layout = FileLayout::build(&h5_path, &config)?;
        spdlog::info!("created all groups and datasets: {}", h5_path.display());
        layout.enable_swmr()?;
        spdlog::info!("started SWMR access: {}", h5_path.display());

        Ok(Self {
            small_cursor: ShotCursor::new(config.small_shot_first, config.small_shot_stride),
            vlen_cursor: ShotCursor::new(config.vlen_shot_first, config.vlen_shot_stride),
            detector_cursor: ShotCursor::new(config.detector_shot_first, config.detector_shot_stride),
            vlen_count: VlenCounter::new(config.vlen_min_per_shot, config.vlen_max_per_shot),
            vlen_buf: vec![0; config.vlen_max_per_shot],
            frame_buf: Array2::zeros((config.detector_rows, config.detector_columns)),
            t0: Instant::now(),
            _finished: FinishedMarker::new(config.finished_path()),
            layout,
            config,
        })
    }

    /// Drive the shot loop over fiducials `0..num_shots`, reporting
    /// progress on `tx` at flush boundaries. Consumes the writer: on
    /// return (clean or not) the file closes and the finished marker is
    /// written. With `writers_hang` set the loop epilogue never runs and
    /// the file stays open.
    pub fn run(mut self, tx: &Sender<WorkerStatus>) -> Result<(), DaqWriterError> {
        self.config.dump();
        let num_shots = self.config.num_shots;
        self.t0 = Instant::now();
        tx.send(WorkerStatus::new(0.0, 0, self.config.id))?;

        for fiducial in 0..num_shots {
            self.write(fiducial)?;
            if fiducial > 0 && fiducial % self.config.flush_interval == 0 {
                self.flush_data(fiducial)?;
                tx.send(WorkerStatus::new(
                    fiducial as f32 / num_shots as f32,
                    fiducial,
                    self.config.id,
                ))?;
            }
        }

        if self.config.writers_hang {
            spdlog::warn!("{}: hanging before close, as configured", self.config.basename());
            loop {
                std::thread::park();
            }
        }

        tx.send(WorkerStatus::new(
            1.0,
            (num_shots - 1).max(0),
            self.config.id,
        ))?;
        spdlog::info!(
            "{}: num seconds={} num shots={}",
            self.config.basename(),
            self.t0.elapsed().as_secs(),
            num_shots
        );
        Ok(())
    }

    /// Write one fiducial across the families that participate, in
    /// small, vlen, detector order.
    fn write(&mut self, fiducial: i64) -> Result<(), DaqWriterError> {
        spdlog::debug!("entering write({})", fiducial);
        self.write_small(fiducial)?;
        self.write_vlen(fiducial)?;
        self.write_detector(fiducial)?;
        Ok(())
    }

    /// Nanoseconds since run start. Sampled once per family per
    /// fiducial; all channels of a family share the sample.
    fn elapsed_nanos(&self) -> i64 {
        self.t0.elapsed().as_nanos() as i64
    }

    fn write_small(&mut self, fiducial: i64) -> Result<(), DaqWriterError> {
        if !self.small_cursor.participates(fiducial) {
            return Ok(());
        }
        self.small_cursor.advance();
        let nano = self.elapsed_nanos();
        for channel in self.layout.small.values_mut() {
            channel.fiducials.append_scalar(fiducial)?;
            channel.nano.append_scalar(nano)?;
            channel.data.append_scalar(fiducial)?;
        }
        Ok(())
    }

    fn write_vlen(&mut self, fiducial: i64) -> Result<(), DaqWriterError> {
        if !self.vlen_cursor.participates(fiducial) {
            return Ok(());
        }
        self.vlen_cursor.advance();
        let nano = self.elapsed_nanos();
        let count = self.vlen_count.current();
        self.vlen_buf[..count].fill(fiducial);
        for channel in self.layout.vlen.values_mut() {
            channel.fiducials.append_scalar(fiducial)?;
            channel.nano.append_scalar(nano)?;
            let start = channel.blob.append_many(&self.vlen_buf[..count])?;
            channel.blobstart.append_scalar(start as i64)?;
            channel.blobcount.append_scalar(count as i64)?;
        }
        self.vlen_count.advance();
        Ok(())
    }

    fn write_detector(&mut self, fiducial: i64) -> Result<(), DaqWriterError> {
        if !self.detector_cursor.participates(fiducial) {
            return Ok(());
        }
        self.detector_cursor.advance();
        let nano = self.elapsed_nanos();
        // The synthetic frame payload keeps only the low 16 bits of the fiducial.
        self.frame_buf.fill(fiducial as i16);
        for channel in self.layout.detector.values_mut() {
            channel.fiducials.append_scalar(fiducial)?;
            channel.nano.append_scalar(nano)?;
            channel.data.append_frame(&self.frame_buf)?;
        }
        Ok(())
    }

    /// Flush every leaf dataset of every family, in a fixed order, so
    /// readers catch up to the current tails.
    fn flush_data(&self, fiducial: i64) -> Result<(), DaqWriterError> {
        spdlog::info!("flush_data: fiducial={}", fiducial);
        for channel in self.layout.small.values() {
            channel.fiducials.flush()?;
        }
        for channel in self.layout.small.values() {
            channel.nano.flush()?;
        }
        for channel in self.layout.small.values() {
            channel.data.flush()?;
        }

        for channel in self.layout.vlen.values() {
            channel.fiducials.flush()?;
        }
        for channel in self.layout.vlen.values() {
            channel.nano.flush()?;
        }
        for channel in self.layout.vlen.values() {
            channel.blob.flush()?;
        }
        for channel in self.layout.vlen.values() {
            channel.blobcount.flush()?;
        }
        for channel in self.layout.vlen.values() {
            channel.blobstart.flush()?;
        }

        for channel in self.layout.detector.values() {
            channel.fiducials.flush()?;
        }
        for channel in self.layout.detector.values() {
            channel.nano.flush()?;
        }
        for channel in self.layout.detector.values() {
            channel.data.flush()?;
        }
        Ok(())
    }
}
