//! Pulls a single file out of a tar stream as it arrives.

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_tar::Archive;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Reads tar entries from `reader` until one is named exactly `name` and
/// returns its content as text.
///
/// Entries are visited in stream order. Every entry before the match is
/// drained without being buffered; nothing after the match is read. Names
/// are compared byte for byte, so `./a.txt` does not match `a.txt`.
pub async fn extract<R>(reader: R, name: &str) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut archive = Archive::new(reader);
    let mut entries = archive.entries().map_err(Error::Archive)?;

    while let Some(entry) = entries.next().await {
        let mut entry = entry.map_err(Error::Archive)?;
        let matches = entry.path_bytes().as_ref() == name.as_bytes();

        if matches {
            let size = entry.header().size().unwrap_or(0);
            debug!(entry = name, size, "found archive entry");
            // The header size is untrusted; let the buffer grow with real data.
            let mut content = Vec::with_capacity(size.min(64 * 1024) as usize);
            entry
                .read_to_end(&mut content)
                .await
                .map_err(Error::Archive)?;
            return String::from_utf8(content).map_err(|_| Error::NonUtf8 {
                what: format!("archive entry `{}`", name),
            });
        }

        trace!(entry = %String::from_utf8_lossy(&entry.path_bytes()), "skipping archive entry");
        tokio::io::copy(&mut entry, &mut tokio::io::sink())
            .await
            .map_err(Error::Archive)?;
    }

    Err(Error::EntryNotFound {
        name: name.to_string(),
    })
}
