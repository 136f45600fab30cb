//! Block channel over a byte stream, for workers in separate processes.
//!
//! Each item is one line of JSON. Any `Read`/`Write` pair works: child
//! process pipes, Unix sockets, TCP streams.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};
use std::marker::PhantomData;
use std::sync::Mutex;

use super::{BlockSink, BlockSource};
use crate::error::{Error, Result};

pub struct WireSink<W, T> {
    writer: Mutex<W>,
    _item: PhantomData<fn(T)>,
}

impl<W: Write, T> WireSink<W, T> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            _item: PhantomData,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W, T> BlockSink<T> for WireSink<W, T>
where
    W: Write + Send,
    T: Serialize,
{
    fn push(&self, item: T) -> Result<()> {
        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');

        // One locked write per item keeps concurrent pushers from interleaving
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match writer.write_all(&line).and_then(|_| writer.flush()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(Error::Disconnected),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct WireSource<R, T> {
    reader: Mutex<BufReader<R>>,
    _item: PhantomData<fn() -> T>,
}

impl<R: Read, T> WireSource<R, T> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            _item: PhantomData,
        }
    }
}

impl<R, T> BlockSource<T> for WireSource<R, T>
where
    R: Read + Send,
    T: DeserializeOwned,
{
    fn pull(&self) -> Result<T> {
        let mut reader = self
            .reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(Error::Disconnected);
            }
            if !line.trim().is_empty() {
                return Ok(serde_json::from_str(&line)?);
            }
        }
    }
}
