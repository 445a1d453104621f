use std::collections::BTreeMap;
use std::path::Path;

use hdf5::{File, FileBuilder, Group};

use super::config::{DaqWriterConfig, Family, FamilyParams};
use super::dset::DsetHandle;
use super::error::LayoutError;
use super::swmr;

pub const FIDUCIALS_NAME: &str = "fiducials";
pub const NANO_NAME: &str = "nano";
pub const DATA_NAME: &str = "data";
pub const BLOB_NAME: &str = "blob";
pub const BLOB_START_NAME: &str = "blobstart";
pub const BLOB_COUNT_NAME: &str = "blobcount";

/// 5-digit zero-padded channel subgroup name.
pub fn channel_name(id: u32) -> String {
    format!("{id:0>5}")
}

/// Leaf datasets of one small channel.
#[derive(Debug)]
pub struct SmallChannel {
    pub fiducials: DsetHandle,
    pub nano: DsetHandle,
    pub data: DsetHandle,
}

/// Leaf datasets of one vlen channel. `blobstart`/`blobcount` index into
/// `blob`: the k-th participating shot occupies
/// `blob[blobstart[k]..blobstart[k] + blobcount[k]]`.
#[derive(Debug)]
pub struct VlenChannel {
    pub fiducials: DsetHandle,
    pub nano: DsetHandle,
    pub blob: DsetHandle,
    pub blobstart: DsetHandle,
    pub blobcount: DsetHandle,
}

/// Leaf datasets of one detector channel.
#[derive(Debug)]
pub struct DetectorChannel {
    pub fiducials: DsetHandle,
    pub nano: DsetHandle,
    pub data: DsetHandle,
}

/// The full object tree of one writer's file: the file itself, the three
/// family groups, the numbered channel subgroups and every leaf dataset,
/// all created before SWMR is enabled so readers see the complete tree
/// the moment they can attach.
///
/// Channel tables are BTreeMaps so iteration is always ascending-id.
/// Field order puts leaves before their parents: Drop releases handles in
/// reverse creation order.
#[allow(dead_code)] // group handles are held only to control close order
#[derive(Debug)]
pub struct FileLayout {
    pub small: BTreeMap<u32, SmallChannel>,
    pub vlen: BTreeMap<u32, VlenChannel>,
    pub detector: BTreeMap<u32, DetectorChannel>,
    small_channel_groups: BTreeMap<u32, Group>,
    vlen_channel_groups: BTreeMap<u32, Group>,
    detector_channel_groups: BTreeMap<u32, Group>,
    small_group: Group,
    vlen_group: Group,
    detector_group: Group,
    file: File,
}

impl FileLayout {
    /// Create the file with the newest on-disk format bounds, truncating
    /// anything already at the path, and build the complete tree. The
    /// file is not yet in SWMR mode; call [`FileLayout::enable_swmr`]
    /// once, after which no structural change is possible.
    pub fn build(path: &Path, config: &DaqWriterConfig) -> Result<Self, LayoutError> {
        // SWMR requires the latest file format bounds.
        let file = FileBuilder::new()
            .with_fapl(|p| p.libver_latest())
            .create(path)?;

        let small_group = file.create_group(Family::Small.group_name())?;
        let vlen_group = file.create_group(Family::Vlen.group_name())?;
        let detector_group = file.create_group(Family::Detector.group_name())?;

        let small_params = config.family(Family::Small);
        let vlen_params = config.family(Family::Vlen);
        let detector_params = config.family(Family::Detector);

        let small_channel_groups = create_channel_groups(&small_group, &small_params)?;
        let vlen_channel_groups = create_channel_groups(&vlen_group, &vlen_params)?;
        let detector_channel_groups = create_channel_groups(&detector_group, &detector_params)?;

        // The small chunk size governs every per-shot scalar dataset in
        // every family; the vlen/detector chunk sizes govern the payload
        // datasets of their own family.
        let mut small = BTreeMap::new();
        for (&id, group) in &small_channel_groups {
            let channel = SmallChannel {
                fiducials: DsetHandle::create_1d::<i64>(group, FIDUCIALS_NAME, config.small_chunksize)?,
                nano: DsetHandle::create_1d::<i64>(group, NANO_NAME, config.small_chunksize)?,
                data: DsetHandle::create_1d::<i64>(group, DATA_NAME, small_params.chunksize)?,
            };
            small.insert(id, channel);
        }

        let mut vlen = BTreeMap::new();
        for (&id, group) in &vlen_channel_groups {
            let channel = VlenChannel {
                fiducials: DsetHandle::create_1d::<i64>(group, FIDUCIALS_NAME, config.small_chunksize)?,
                nano: DsetHandle::create_1d::<i64>(group, NANO_NAME, config.small_chunksize)?,
                blob: DsetHandle::create_1d::<i64>(group, BLOB_NAME, vlen_params.chunksize)?,
                blobstart: DsetHandle::create_1d::<i64>(group, BLOB_START_NAME, config.small_chunksize)?,
                blobcount: DsetHandle::create_1d::<i64>(group, BLOB_COUNT_NAME, config.small_chunksize)?,
            };
            vlen.insert(id, channel);
        }

        let mut detector = BTreeMap::new();
        for (&id, group) in &detector_channel_groups {
            let channel = DetectorChannel {
                fiducials: DsetHandle::create_1d::<i64>(group, FIDUCIALS_NAME, config.small_chunksize)?,
                nano: DsetHandle::create_1d::<i64>(group, NANO_NAME, config.small_chunksize)?,
                data: DsetHandle::create_3d::<i16>(
                    group,
                    DATA_NAME,
                    config.detector_rows,
                    config.detector_columns,
                    detector_params.chunksize,
                )?,
            };
            detector.insert(id, channel);
        }

        Ok(Self {
            small,
            vlen,
            detector,
            small_channel_groups,
            vlen_channel_groups,
            detector_channel_groups,
            small_group,
            vlen_group,
            detector_group,
            file,
        })
    }

    /// Enable single-writer/multiple-reader access. Readers may attach
    /// from here on; the tree is frozen.
    pub fn enable_swmr(&self) -> Result<(), LayoutError> {
        swmr::start_swmr_write(&self.file)
    }
}

fn create_channel_groups(
    parent: &Group,
    params: &FamilyParams,
) -> Result<BTreeMap<u32, Group>, LayoutError> {
    let mut groups = BTreeMap::new();
    for id in params.channel_ids() {
        let group = parent.create_group(&channel_name(id))?;
        if groups.insert(id, group).is_some() {
            return Err(LayoutError::DuplicateChannel(id));
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_config() -> DaqWriterConfig {
        DaqWriterConfig {
            small_name_first: 7,
            small_name_count: 3,
            vlen_name_first: 0,
            vlen_name_count: 1,
            detector_name_first: 2,
            detector_name_count: 1,
            small_chunksize: 10,
            vlen_chunksize: 40,
            detector_chunksize: 5,
            detector_rows: 4,
            detector_columns: 6,
            ..DaqWriterConfig::default()
        }
    }

    #[test]
    fn test_structure_exists_before_swmr() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.h5");
        let config = layout_config();
        {
            let layout = FileLayout::build(&path, &config).unwrap();
            layout.enable_swmr().unwrap();
        }

        let file = hdf5::File::open(&path).unwrap();
        let mut roots = file.member_names().unwrap();
        roots.sort();
        assert_eq!(roots, vec!["detctor", "small", "vlen"]);

        let small = file.group("small").unwrap();
        let mut channels = small.member_names().unwrap();
        channels.sort();
        assert_eq!(channels, vec!["00007", "00008", "00009"]);

        let channel = small.group("00007").unwrap();
        let mut leaves = channel.member_names().unwrap();
        leaves.sort();
        assert_eq!(leaves, vec!["data", "fiducials", "nano"]);

        let mut vlen_leaves = file.group("vlen/00000").unwrap().member_names().unwrap();
        vlen_leaves.sort();
        assert_eq!(
            vlen_leaves,
            vec!["blob", "blobcount", "blobstart", "fiducials", "nano"]
        );

        let frames = file.dataset("detctor/00002/data").unwrap();
        assert_eq!(frames.shape(), vec![0, 4, 6]);
        assert_eq!(frames.chunk(), Some(vec![5, 4, 6]));
    }

    #[test]
    fn test_chunk_extents_follow_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.h5");
        let config = layout_config();
        let layout = FileLayout::build(&path, &config).unwrap();

        let small = layout.small.get(&7).unwrap();
        assert_eq!(small.fiducials.chunk_len(), 10);
        assert_eq!(small.data.chunk_len(), 10);

        let vlen = layout.vlen.get(&0).unwrap();
        assert_eq!(vlen.blob.chunk_len(), 40);
        assert_eq!(vlen.blobstart.chunk_len(), 10);

        let detector = layout.detector.get(&2).unwrap();
        assert_eq!(detector.data.chunk_len(), 5);
        assert_eq!(detector.data.elem_bytes(), 2);
    }

    #[test]
    fn test_channel_name_padding() {
        assert_eq!(channel_name(0), "00000");
        assert_eq!(channel_name(42), "00042");
        assert_eq!(channel_name(99999), "99999");
    }
}
