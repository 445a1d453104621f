//! The two 1.10-era calls the safe `hdf5` crate does not wrap. Both go
//! through `hdf5-sys` and map a negative status into the error taxonomy.

use hdf5::{Dataset, File};

use super::error::{DsetError, LayoutError};

/// Switch the file into single-writer/multiple-reader mode. Requires the
/// latest libver bounds and a fully built object tree; no group or
/// dataset may be created afterwards.
pub(crate) fn start_swmr_write(file: &File) -> Result<(), LayoutError> {
    let status = unsafe { hdf5_sys::h5f::H5Fstart_swmr_write(file.id()) };
    if status < 0 {
        return Err(LayoutError::SwmrStart(status));
    }
    Ok(())
}

/// Flush one dataset so attached readers can observe its new extent.
pub(crate) fn flush_dataset(dset: &Dataset) -> Result<(), DsetError> {
    let status = unsafe { hdf5_sys::h5d::H5Dflush(dset.id()) };
    if status < 0 {
        return Err(DsetError::FlushFailed(status));
    }
    Ok(())
}
