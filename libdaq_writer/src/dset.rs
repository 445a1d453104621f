use hdf5::types::H5Type;
use hdf5::{Dataset, Group};
use ndarray::{s, Array2, ArrayView1, Axis};

use super::error::DsetError;
use super::swmr;

/// Thin bookkeeping over one extensible chunked dataset: the underlying
/// HDF5 dataset, the logical length along the extensible axis, the chunk
/// extent along that axis and the element size in bytes.
///
/// Appends are O(1) amortized and mutate only the tail; nothing already
/// written moves. All operations are fatal on error, there is no retry.
#[derive(Debug)]
pub struct DsetHandle {
    dset: Dataset,
    len: usize,
    chunk_len: usize,
    elem_bytes: usize,
    frame_dims: Option<(usize, usize)>,
}

impl DsetHandle {
    /// Create an extensible 1D dataset with initial length 0, unbounded
    /// maximum length and a single chunk dimension of `chunk_len`.
    pub fn create_1d<T: H5Type>(
        parent: &Group,
        name: &str,
        chunk_len: usize,
    ) -> Result<Self, DsetError> {
        if chunk_len == 0 {
            return Err(DsetError::InvalidChunk(name.to_string()));
        }
        let dset = parent
            .new_dataset::<T>()
            .shape((0..,))
            .chunk((chunk_len,))
            .create(name)?;
        Ok(Self {
            dset,
            len: 0,
            chunk_len,
            elem_bytes: std::mem::size_of::<T>(),
            frame_dims: None,
        })
    }

    /// Create an extensible 3D dataset with shape `(0, rows, columns)`,
    /// maximum `(unbounded, rows, columns)` and chunk
    /// `(chunk_frames, rows, columns)`.
    pub fn create_3d<T: H5Type>(
        parent: &Group,
        name: &str,
        rows: usize,
        columns: usize,
        chunk_frames: usize,
    ) -> Result<Self, DsetError> {
        if chunk_frames == 0 {
            return Err(DsetError::InvalidChunk(name.to_string()));
        }
        let dset = parent
            .new_dataset::<T>()
            .shape((0.., rows, columns))
            .chunk((chunk_frames, rows, columns))
            .create(name)?;
        Ok(Self {
            dset,
            len: 0,
            chunk_len: chunk_frames,
            elem_bytes: std::mem::size_of::<T>(),
            frame_dims: Some((rows, columns)),
        })
    }

    /// Number of elements (or frames) written along the extensible axis.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Chunk extent along the extensible axis.
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Element size in bytes.
    pub fn elem_bytes(&self) -> usize {
        self.elem_bytes
    }

    /// Extend the length by one and write a single element at the new tail.
    pub fn append_scalar(&mut self, value: i64) -> Result<(), DsetError> {
        let tail = self.len;
        self.dset.resize((tail + 1,))?;
        self.dset
            .write_slice(ArrayView1::from(&[value][..]), s![tail..tail + 1])?;
        self.len = tail + 1;
        Ok(())
    }

    /// Extend the length by `values.len()` and write the elements at the
    /// previous tail. Returns the index where the first appended element
    /// landed, which is what the vlen `blobstart` dataset records.
    pub fn append_many(&mut self, values: &[i64]) -> Result<usize, DsetError> {
        let start = self.len;
        if values.is_empty() {
            return Ok(start);
        }
        let new_len = start + values.len();
        self.dset.resize((new_len,))?;
        self.dset
            .write_slice(ArrayView1::from(values), s![start..new_len])?;
        self.len = new_len;
        Ok(start)
    }

    /// Extend the frame axis by one and write a full `rows x columns`
    /// plane at the new tail. The frame must match the fixed extents the
    /// dataset was created with.
    pub fn append_frame(&mut self, frame: &Array2<i16>) -> Result<(), DsetError> {
        let (rows, columns) = frame.dim();
        match self.frame_dims {
            Some((r, c)) if r == rows && c == columns => {}
            Some((r, c)) => {
                return Err(DsetError::FrameShapeMismatch {
                    name: self.dset.name(),
                    rows,
                    columns,
                    expected_rows: r,
                    expected_columns: c,
                })
            }
            None => return Err(DsetError::WrongRank(self.dset.name())),
        }
        let tail = self.len;
        self.dset.resize((tail + 1, rows, columns))?;
        self.dset
            .write_slice(frame.view().insert_axis(Axis(0)), s![tail..tail + 1, .., ..])?;
        self.len = tail + 1;
        Ok(())
    }

    /// Force durability of this dataset so readers can observe it.
    pub fn flush(&self) -> Result<(), DsetError> {
        swmr::flush_dataset(&self.dset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn scratch_file(dir: &TempDir) -> hdf5::File {
        hdf5::File::create(dir.path().join("scratch.h5")).unwrap()
    }

    #[test]
    fn test_append_scalars() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        let mut handle = DsetHandle::create_1d::<i64>(&group, "x", 2).unwrap();
        assert!(handle.is_empty());
        for value in 0..5_i64 {
            handle.append_scalar(value).unwrap();
        }
        assert_eq!(handle.len(), 5);
        assert_eq!(handle.elem_bytes(), 8);
        assert_eq!(handle.chunk_len(), 2);
        let read = handle.dset.read_raw::<i64>().unwrap();
        assert_eq!(read, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_append_many_returns_previous_tail() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        let mut handle = DsetHandle::create_1d::<i64>(&group, "blob", 4).unwrap();
        assert_eq!(handle.append_many(&[7, 7]).unwrap(), 0);
        assert_eq!(handle.append_many(&[8, 8, 8]).unwrap(), 2);
        assert_eq!(handle.append_many(&[]).unwrap(), 5);
        assert_eq!(handle.len(), 5);
        let read = handle.dset.read_raw::<i64>().unwrap();
        assert_eq!(read, vec![7, 7, 8, 8, 8]);
    }

    #[test]
    fn test_append_frames() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        let mut handle = DsetHandle::create_3d::<i16>(&group, "data", 2, 3, 2).unwrap();
        assert_eq!(handle.elem_bytes(), 2);
        let mut frame = Array2::<i16>::zeros((2, 3));
        for value in 0..3_i16 {
            frame.fill(value);
            handle.append_frame(&frame).unwrap();
        }
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.dset.shape(), vec![3, 2, 3]);
        let read = handle.dset.read_raw::<i16>().unwrap();
        assert_eq!(read[..6], [0; 6]);
        assert_eq!(read[6..12], [1; 6]);
        assert_eq!(read[12..], [2; 6]);
    }

    #[test]
    fn test_frame_shape_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        let mut handle = DsetHandle::create_3d::<i16>(&group, "data", 2, 3, 1).unwrap();
        let frame = Array2::<i16>::zeros((3, 2));
        assert!(matches!(
            handle.append_frame(&frame),
            Err(DsetError::FrameShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_append_frame_requires_rank_3() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        let mut handle = DsetHandle::create_1d::<i64>(&group, "x", 1).unwrap();
        let frame = Array2::<i16>::zeros((1, 1));
        assert!(matches!(
            handle.append_frame(&frame),
            Err(DsetError::WrongRank(_))
        ));
    }

    #[test]
    fn test_zero_chunk_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = scratch_file(&dir);
        let group = file.create_group("g").unwrap();
        assert!(matches!(
            DsetHandle::create_1d::<i64>(&group, "x", 0),
            Err(DsetError::InvalidChunk(_))
        ));
        assert!(matches!(
            DsetHandle::create_3d::<i16>(&group, "y", 2, 2, 0),
            Err(DsetError::InvalidChunk(_))
        ));
    }
}
