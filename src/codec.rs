// Persistence codec
// Bit-exact little-endian layout, shared by every index kind:
//
//   magic   4 bytes  "VGDB"
//   version u32      = 1
//   dim     u32
//   count   u64
//   data    count * dim * f32   (row-major)
//   kind    u8       0=Flat 1=IVF 2=Annoy
//   body    kind-specific payload
//
// Save goes through a temp file in the same directory, fsync, rename, so a
// crash never leaves a half-written database behind. Load parses into a
// fresh value and only swaps it in once the whole payload validated.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::db::VegamDb;
use crate::error::{CodecError, Result};
use crate::index::annoy::tree::{Node, Tree};
use crate::index::{ActiveIndex, AnnoyConfig, AnnoyIndex, IvfConfig, IvfIndex, KMeansModel};
use crate::store::VectorStore;

const MAGIC: &[u8; 4] = b"VGDB";
const VERSION: u32 = 1;

const KIND_FLAT: u8 = 0;
const KIND_IVF: u8 = 1;
const KIND_ANNOY: u8 = 2;

const TAG_LEAF: u8 = 0x00;
const TAG_INNER: u8 = 0x01;

// ---------------------------------------------------------------- save

pub(crate) fn save(db: &VegamDb, path: &Path) -> Result<()> {
    let tmp = temp_path(path);
    let file = File::create(&tmp)?;
    let mut w = BufWriter::new(file);

    write_db(db, &mut w)?;

    w.flush()?;
    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), count = db.store.len(), "database_saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_db(db: &VegamDb, w: &mut impl Write) -> io::Result<()> {
    w.write_all(MAGIC)?;
    write_u32(w, VERSION)?;
    write_u32(w, db.store.dim() as u32)?;
    write_u64(w, db.store.len() as u64)?;
    write_f32s(w, db.store.as_flat())?;

    // A configured-but-unbuilt index has no trained structure to persist;
    // it searches as Flat, so it saves as Flat.
    match &db.index {
        ActiveIndex::Ivf(idx) if idx.is_built() => {
            w.write_all(&[KIND_IVF])?;
            write_ivf(idx, w)
        }
        ActiveIndex::Annoy(idx) if idx.is_built() => {
            w.write_all(&[KIND_ANNOY])?;
            write_annoy(idx, w)
        }
        _ => w.write_all(&[KIND_FLAT]),
    }
}

fn write_ivf(idx: &IvfIndex, w: &mut impl Write) -> io::Result<()> {
    let config = idx.config();
    let Some(model) = idx.model() else {
        // Unreachable through write_db, which only routes built indexes here
        return Ok(());
    };

    write_u32(w, config.n_clusters as u32)?;
    write_u32(w, config.max_iters as u32)?;
    write_u32(w, config.n_probe as u32)?;
    write_f32s(w, model.centroids_flat())?;
    for bucket in model.buckets() {
        write_u32(w, bucket.len() as u32)?;
        for &id in bucket {
            write_u32(w, id as u32)?;
        }
    }
    Ok(())
}

fn write_annoy(idx: &AnnoyIndex, w: &mut impl Write) -> io::Result<()> {
    let config = idx.config();
    write_u32(w, config.num_trees as u32)?;
    write_u32(w, config.k_leaf as u32)?;
    w.write_all(&[config.use_priority_queue as u8])?;
    for tree in idx.trees() {
        write_node(&tree.root, w)?;
    }
    Ok(())
}

fn write_node(node: &Node, w: &mut impl Write) -> io::Result<()> {
    match node {
        Node::Leaf(ids) => {
            w.write_all(&[TAG_LEAF])?;
            write_u32(w, ids.len() as u32)?;
            for &id in ids {
                write_u32(w, id as u32)?;
            }
            Ok(())
        }
        Node::Split {
            normal,
            offset,
            left,
            right,
        } => {
            w.write_all(&[TAG_INNER])?;
            write_f32s(w, normal)?;
            write_f32(w, *offset)?;
            write_node(left, w)?;
            write_node(right, w)
        }
    }
}

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f32(w: &mut impl Write, v: f32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f32s(w: &mut impl Write, vs: &[f32]) -> io::Result<()> {
    for v in vs {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

// ---------------------------------------------------------------- load

pub(crate) fn load(path: &Path) -> Result<VegamDb> {
    let buf = fs::read(path)?;
    let db = parse(&buf)?;
    debug!(path = %path.display(), count = db.store.len(), "database_loaded");
    Ok(db)
}

fn parse(buf: &[u8]) -> std::result::Result<VegamDb, CodecError> {
    let mut r = Reader::new(buf);

    if r.take(4)? != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = r.read_u32()?;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let dim = r.read_u32()? as usize;
    let count = r.read_u64()?;
    let data = r.read_f32s(count.checked_mul(dim as u64).unwrap_or(u64::MAX))?;
    let store = VectorStore::from_parts(data, dim);

    let kind = r.read_u8()?;
    let index = match kind {
        KIND_FLAT => ActiveIndex::Flat,
        KIND_IVF => ActiveIndex::Ivf(read_ivf(&mut r, dim, count)?),
        KIND_ANNOY => ActiveIndex::Annoy(read_annoy(&mut r, dim, count)?),
        other => return Err(CodecError::UnknownIndexKind(other)),
    };

    if r.remaining() > 0 {
        return Err(CodecError::TrailingBytes {
            extra: r.remaining(),
        });
    }

    Ok(VegamDb::from_parts(store, index))
}

fn read_ivf(r: &mut Reader<'_>, dim: usize, count: u64) -> std::result::Result<IvfIndex, CodecError> {
    let n_clusters = r.read_u32()? as usize;
    let max_iters = r.read_u32()? as usize;
    let n_probe = r.read_u32()? as usize;

    let centroids = r.read_f32s((n_clusters as u64).checked_mul(dim as u64).unwrap_or(u64::MAX))?;

    let mut buckets = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        let len = r.read_u32()?;
        let mut bucket = Vec::with_capacity(len as usize);
        for _ in 0..len {
            bucket.push(r.read_id(count)?);
        }
        buckets.push(bucket);
    }

    let config = IvfConfig {
        n_clusters,
        max_iters,
        n_probe,
        seed: None,
    };
    let model = KMeansModel::from_parts(centroids, dim, buckets);
    Ok(IvfIndex::from_parts(config, model))
}

fn read_annoy(
    r: &mut Reader<'_>,
    dim: usize,
    count: u64,
) -> std::result::Result<AnnoyIndex, CodecError> {
    let num_trees = r.read_u32()? as usize;
    let k_leaf = r.read_u32()? as usize;
    let use_priority_queue = r.read_u8()? != 0;

    let mut trees = Vec::with_capacity(num_trees);
    for _ in 0..num_trees {
        trees.push(Tree {
            root: read_node(r, dim, count)?,
        });
    }

    let config = AnnoyConfig {
        num_trees,
        k_leaf,
        use_priority_queue,
        seed: None,
    };
    Ok(AnnoyIndex::from_parts(config, trees))
}

fn read_node(r: &mut Reader<'_>, dim: usize, count: u64) -> std::result::Result<Node, CodecError> {
    match r.read_u8()? {
        TAG_LEAF => {
            let len = r.read_u32()?;
            let mut ids = Vec::with_capacity(len as usize);
            for _ in 0..len {
                ids.push(r.read_id(count)?);
            }
            Ok(Node::Leaf(ids))
        }
        TAG_INNER => {
            let normal = r.read_f32s(dim as u64)?;
            let offset = r.read_f32()?;
            let left = Box::new(read_node(r, dim, count)?);
            let right = Box::new(read_node(r, dim, count)?);
            Ok(Node::Split {
                normal,
                offset,
                left,
                right,
            })
        }
        other => Err(CodecError::UnknownNodeTag(other)),
    }
}

// Cursor over the raw file bytes; every read is length-checked so a
// truncated file fails with an exact offset instead of a panic.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> std::result::Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> std::result::Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    fn read_u64(&mut self) -> std::result::Result<u64, CodecError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    fn read_f32(&mut self) -> std::result::Result<f32, CodecError> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    // Length is validated against the remaining bytes before anything is
    // allocated, so a corrupt header cannot trigger a giant allocation.
    fn read_f32s(&mut self, n: u64) -> std::result::Result<Vec<f32>, CodecError> {
        let byte_len = n.checked_mul(4).unwrap_or(u64::MAX);
        if byte_len > self.remaining() as u64 {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: (byte_len - self.remaining() as u64).min(usize::MAX as u64) as usize,
            });
        }
        let bytes = self.take(byte_len as usize)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().expect("chunked by 4")))
            .collect())
    }

    fn read_id(&mut self, count: u64) -> std::result::Result<usize, CodecError> {
        let id = self.read_u32()? as u64;
        if id >= count {
            return Err(CodecError::IdOutOfRange { id, count });
        }
        Ok(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_reports_truncation_offset() {
        let mut r = Reader::new(&[1, 2, 3]);
        r.take(2).unwrap();
        let err = r.take(4).unwrap_err();
        match err {
            CodecError::Truncated { offset, needed } => {
                assert_eq!(offset, 2);
                assert_eq!(needed, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reader_roundtrips_scalars() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 7).unwrap();
        write_u64(&mut buf, u64::MAX - 1).unwrap();
        write_f32(&mut buf, -0.5).unwrap();

        let mut r = Reader::new(&buf);
        assert_eq!(r.read_u32().unwrap(), 7);
        assert_eq!(r.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(r.read_f32().unwrap(), -0.5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn bogus_magic_is_rejected() {
        let err = parse(b"NOPE").unwrap_err();
        assert!(matches!(err, CodecError::BadMagic));
    }

    #[test]
    fn id_out_of_range_is_rejected() {
        let mut r = Reader::new(&[9, 0, 0, 0]);
        let err = r.read_id(5).unwrap_err();
        assert!(matches!(err, CodecError::IdOutOfRange { id: 9, count: 5 }));
    }
}
