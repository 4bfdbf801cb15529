// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-02

//! Image Transfer Engine.
//!
//! Streams a firmware binary into a mapped destination window in
//! 4-byte units (the natural width of the 32-bit targets) and
//! mirrors the two boot words (initial stack pointer, reset vector)
//! into TCM when the bulk image was placed elsewhere. The boot ROM
//! reads those two words from TCM offset 0 regardless of where the
//! image actually lives.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{fence, Ordering};

use log::{debug, info};
use thiserror::Error;

use crate::mem::{MapError, MemoryArea};

/// Words at the start of TCM the boot ROM consumes: initial SP and
/// reset vector.
pub const BOOT_WORDS: usize = 2;

const WORD: usize = std::mem::size_of::<u32>();

/// Errors from opening or transferring a firmware image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to open firmware image {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read firmware image {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("firmware image {} ({size} bytes) exceeds the {len}-byte destination window", .path.display())]
    TooLarge { path: PathBuf, size: u64, len: usize },

    #[error(transparent)]
    Mem(#[from] MapError),
}

/// Copy `path` into `dst` starting at its base, in file order.
///
/// The copy is bracketed by synchronization barriers so the
/// coprocessor observes the full image once reset is released and no
/// stale cached view of the file is read mid-copy. A trailing partial
/// word is zero-padded to width. Returns the number of bytes written.
pub fn transfer(path: &Path, dst: &mut MemoryArea) -> Result<usize, ImageError> {
    let file = File::open(path).map_err(|source| ImageError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let size = file
        .metadata()
        .map_err(|source| ImageError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > dst.len() as u64 {
        return Err(ImageError::TooLarge {
            path: path.to_path_buf(),
            size,
            len: dst.len(),
        });
    }

    info!(
        "transferring {} ({size} bytes) to physical {:#x}",
        path.display(),
        dst.base()
    );

    barrier();

    let mut reader = BufReader::new(file);
    let mut offset = 0usize;
    let mut word = [0u8; WORD];
    loop {
        let filled = fill_word(&mut reader, &mut word).map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if filled == 0 {
            break;
        }
        word[filled..].fill(0);
        dst.write_u32(offset, u32::from_ne_bytes(word))?;
        offset += WORD;
        if filled < WORD {
            break;
        }
    }

    barrier();

    debug!("transfer complete, {offset} bytes written");
    Ok(offset)
}

/// Mirror the boot words from `dst` into the start of `tcm`.
///
/// Required whenever the bulk image was not placed in TCM: the values
/// are read back from the actual load destination so the TCM copy is
/// exactly what was written.
pub fn mirror_boot_words(dst: &MemoryArea, tcm: &mut MemoryArea) -> Result<(), ImageError> {
    for word in 0..BOOT_WORDS {
        let value = dst.read_u32(word * WORD)?;
        tcm.write_u32(word * WORD, value)?;
    }
    debug!(
        "mirrored {BOOT_WORDS} boot words from {:#x} into TCM at {:#x}",
        dst.base(),
        tcm.base()
    );
    Ok(())
}

// Partial reads at end-of-file are expected; only a read error aborts.
fn fill_word(reader: &mut impl Read, word: &mut [u8; WORD]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < WORD {
        match reader.read(&mut word[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn barrier() {
    fence(Ordering::SeqCst);
    // SAFETY: sync(2) takes no arguments and cannot fail.
    unsafe { libc::sync() };
}
