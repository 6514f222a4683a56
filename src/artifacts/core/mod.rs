//! Core utilities and shared types

use derive_new::new;
use minus::Pager;
use std::io::{self, Write};

/// Wrapper that implements `Write` for the minus pager
///
/// Lets `chisel log` hand a branch's history to the pager through the same
/// writer the repository prints to.
///
/// ```ignore
/// let pager = Pager::new();
/// let repository = Repository::new(".", Box::new(PagerWriter::new(pager.clone())))?;
/// repository.log(&LogOptions::default())?;
/// page_all(pager)?;
/// ```
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
