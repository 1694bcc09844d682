//! Synthetic SIO recordings

#![allow(dead_code)]

use byteorder::ByteOrder;
use oa_sio::{BYTE_SWAP, HEADER_BYTES};

/// Layout of a synthetic recording
pub struct Recording {
    pub channels: usize,
    pub samples_per_record: usize,
    pub bytes_per_sample: usize,
    pub samples_per_channel: usize,
}

impl Recording {
    /// Four channels of 200 16-bit samples in 128-byte records
    pub fn int16() -> Self {
        Self {
            channels: 4,
            samples_per_record: 64,
            bytes_per_sample: 2,
            samples_per_channel: 200,
        }
    }

    /// Three channels of 100 float samples in 128-byte records
    pub fn float32() -> Self {
        Self {
            channels: 3,
            samples_per_record: 32,
            bytes_per_sample: 4,
            samples_per_channel: 100,
        }
    }

    pub fn bytes_per_record(&self) -> usize {
        self.samples_per_record * self.bytes_per_sample
    }

    pub fn blocks(&self) -> usize {
        self.samples_per_channel.div_ceil(self.samples_per_record)
    }

    /// File contents; sample `i` of channel `ch` is `1000 ch + i`, plus 0.5
    /// for float recordings
    pub fn bytes<E: ByteOrder>(&self) -> Vec<u8> {
        let bpr = self.bytes_per_record();
        let num_records = 1 + self.blocks() * self.channels;
        let mut out = vec![0u8; num_records * bpr];

        let words = [
            42,
            num_records as u32,
            bpr as u32,
            self.channels as u32,
            self.bytes_per_sample as u32,
            u32::from(self.bytes_per_sample == 4),
            self.samples_per_channel as u32,
            BYTE_SWAP,
        ];
        for (i, w) in words.iter().enumerate() {
            E::write_u32(&mut out[4 * i..4 * i + 4], *w);
        }
        out[32..44].copy_from_slice(b"synthetic.da");
        out[56..64].copy_from_slice(b"test run");
        assert!(bpr >= HEADER_BYTES);

        for block in 0..self.blocks() {
            for ch in 0..self.channels {
                let record = 1 + block * self.channels + ch;
                for j in 0..self.samples_per_record {
                    let i = block * self.samples_per_record + j;
                    let at = record * bpr + j * self.bytes_per_sample;
                    let value = 1000 * ch + i;
                    if self.bytes_per_sample == 2 {
                        E::write_i16(&mut out[at..at + 2], value as i16);
                    } else {
                        E::write_f32(&mut out[at..at + 4], value as f32 + 0.5);
                    }
                }
            }
        }
        out
    }
}

/// Expected value of sample `i` (0-based) of channel `ch`
pub fn expected(ch: usize, i: usize, real: bool) -> f64 {
    let v = (1000 * ch + i) as f64;
    if real { v + 0.5 } else { v }
}
