/// Progress snapshot sent from the run loop to a supervising front end.
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub fiducial: i64,
    pub writer_id: i32,
}

impl WorkerStatus {
    pub fn new(progress: f32, fiducial: i64, writer_id: i32) -> Self {
        Self {
            progress,
            fiducial,
            writer_id,
        }
    }
}
