//! Streaming SHA-256 helpers.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::domain::{ByteReader, Digest, DigestHasher};
use crate::ports::{CacheError, CacheResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Content that has been hashed into an anonymous spill file.
pub struct Spilled {
    pub digest: Digest,
    pub size: u64,
    /// Reads the spilled bytes from the start. The file is removed on drop.
    pub reader: ByteReader,
}

/// Copy `reader` into `writer`, feeding every chunk to `hasher`.
pub async fn copy_hashing<W>(
    reader: &mut ByteReader,
    writer: &mut W,
    hasher: &mut DigestHasher,
    context: &'static str,
) -> CacheResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await.map_err(CacheError::Stream)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|source| CacheError::Io { context, source })?;
    }
    writer
        .flush()
        .await
        .map_err(|source| CacheError::Io { context, source })
}

async fn create_spill_file(spill_dir: Option<PathBuf>) -> CacheResult<tokio::fs::File> {
    let created = tokio::task::spawn_blocking(move || match spill_dir {
        Some(dir) => tempfile::tempfile_in(dir),
        None => tempfile::tempfile(),
    })
    .await
    .map_err(io::Error::other)
    .and_then(|result| result)
    .map_err(|source| CacheError::Io {
        context: "create spill file",
        source,
    })?;
    Ok(tokio::fs::File::from_std(created))
}

/// Hash a stream of unknown address by spilling it to a temporary file.
///
/// The size comes from the bytes actually read; zero bytes is `EmptyContent`.
pub async fn spill_and_hash(mut reader: ByteReader, spill_dir: Option<&Path>) -> CacheResult<Spilled> {
    let mut file = create_spill_file(spill_dir.map(Path::to_path_buf)).await?;

    let mut hasher = DigestHasher::new();
    copy_hashing(&mut reader, &mut file, &mut hasher, "write spill file").await?;

    let size = hasher.bytes();
    if size == 0 {
        return Err(CacheError::EmptyContent);
    }

    file.rewind().await.map_err(|source| CacheError::Io {
        context: "rewind spill file",
        source,
    })?;

    Ok(Spilled {
        digest: hasher.finish(),
        size,
        reader: Box::new(file),
    })
}
