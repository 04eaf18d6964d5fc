use crate::descriptor::{descriptor_reference, ManifestDescriptor, PartRef};
use crate::error::{ManifestError, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 90 MiB keeps every part under the common 100 MB single-file hosting cap.
pub const DEFAULT_PART_SIZE: u64 = 90 * 1024 * 1024;

/// Name of part `index` for `logical_name` (`<name>.part_00`, `<name>.part_01`, …).
#[must_use]
pub fn part_name(logical_name: &str, index: usize) -> String {
    format!("{logical_name}.part_{index:02}")
}

/// Cut `input` into consecutive parts of at most `part_size` bytes under
/// `out_dir`, and write the matching descriptor next to them.
pub fn split_file(
    input: &Path,
    out_dir: &Path,
    logical_name: &str,
    part_size: u64,
) -> Result<ManifestDescriptor> {
    if part_size == 0 {
        return Err(ManifestError::InvalidPartSize(part_size));
    }
    std::fs::create_dir_all(out_dir)?;

    let mut reader = BufReader::new(File::open(input)?);
    let mut hasher = blake3::Hasher::new();
    let mut parts = Vec::new();
    let mut total: u64 = 0;

    loop {
        let name = part_name(logical_name, parts.len());
        let path = out_dir.join(&name);
        let written = {
            let mut writer = Digesting {
                inner: BufWriter::new(File::create(&path)?),
                hasher: &mut hasher,
            };
            let written = io::copy(&mut (&mut reader).take(part_size), &mut writer)?;
            writer.flush()?;
            written
        };
        if written == 0 {
            std::fs::remove_file(&path)?;
            break;
        }
        log::debug!("Wrote {} ({written} bytes)", path.display());
        total += written;
        parts.push(PartRef::new(name));
        if written < part_size {
            break;
        }
    }

    if parts.is_empty() {
        return Err(ManifestError::EmptyInput(input.display().to_string()));
    }

    let descriptor = ManifestDescriptor::new(logical_name, parts, Some(total))?
        .with_part_size(part_size)
        .with_digest(hasher.finalize().to_hex().as_str());
    let json = descriptor
        .to_json_pretty()
        .map_err(|err| ManifestError::IoError(io::Error::other(err)))?;
    std::fs::write(
        out_dir.join(descriptor_reference(logical_name).as_str()),
        json,
    )?;

    log::info!(
        "Split {} into {} parts ({total} bytes)",
        input.display(),
        descriptor.parts().len()
    );
    Ok(descriptor)
}

/// Writer that feeds everything it writes into a running digest.
struct Digesting<'h, W> {
    inner: W,
    hasher: &'h mut blake3::Hasher,
}

impl<W: Write> Write for Digesting<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
