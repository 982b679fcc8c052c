//! A simple sequential reader over several segment files, so the decoder
//! never has to know where one segment ends and the next begins — each
//! segment's own leading `crc` record rekeys the chain (§9).

use std::fs::File;
use std::io::{self, Read};

pub struct ChainReader {
    files: std::vec::IntoIter<File>,
    current: Option<File>,
}

impl ChainReader {
    pub fn new(files: Vec<File>) -> Self {
        let mut files = files.into_iter();
        let current = files.next();
        Self { files, current }
    }
}

impl Read for ChainReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let Some(file) = self.current.as_mut() else {
                return Ok(0);
            };
            let n = file.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.current = self.files.next();
        }
    }
}
