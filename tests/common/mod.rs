// Shared fixtures for the integration tests.
//
// `DeltaBuilder` assembles VCDIFF streams instruction by instruction so
// tests can reach shapes an encoder never emits (VCD_TARGET windows,
// compressed sections, bad checksums). `xdelta` produces real deltas.

#![allow(dead_code)]

use vcdelta::vcdiff::decoder::adler32;
use vcdelta::vcdiff::header::{
    DeltaIndicator, FileHeader, HeaderIndicator, WindowHeader, WindowIndicator,
};
use vcdelta::vcdiff::varint;

/// Delta turning `base` into `target`, produced by xdelta3.
pub fn xdelta(base: &[u8], target: &[u8]) -> Vec<u8> {
    xdelta3::encode(target, base).expect("xdelta3 encode failed")
}

/// Deterministic pseudo-random bytes.
pub fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// A JSON-ish document whose `seq` field changes between versions.
pub fn document(seq: u32) -> Vec<u8> {
    format!(
        "{{\"seq\":{seq},\"symbol\":\"ABC\",\"bid\":{},\"ask\":{},\"levels\":[1,2,3,4,5,6,7,8]}}",
        100 + seq,
        101 + seq
    )
    .into_bytes()
}

pub type Compressor = fn(&[u8]) -> Vec<u8>;

/// One hand-assembled window.
#[derive(Clone)]
pub struct Window {
    indicator: WindowIndicator,
    copy: (u64, u64),
    target: Vec<u8>,
    data: Vec<u8>,
    inst: Vec<u8>,
    addr: Vec<u8>,
    compressed: DeltaIndicator,
    checksum: Option<u32>,
}

impl Window {
    /// Window producing `target`; instructions must add up to it.
    pub fn new(target: &[u8]) -> Self {
        Self {
            indicator: WindowIndicator::empty(),
            copy: (0, 0),
            target: target.to_vec(),
            data: Vec::new(),
            inst: Vec::new(),
            addr: Vec::new(),
            compressed: DeltaIndicator::empty(),
            checksum: Some(adler32(target)),
        }
    }

    pub fn source(mut self, offset: u64, len: u64) -> Self {
        self.indicator |= WindowIndicator::SOURCE;
        self.copy = (offset, len);
        self
    }

    pub fn target_window(mut self, offset: u64, len: u64) -> Self {
        self.indicator |= WindowIndicator::TARGET;
        self.copy = (offset, len);
        self
    }

    pub fn add(mut self, bytes: &[u8]) -> Self {
        self.inst.push(1);
        varint::write_usize(&mut self.inst, bytes.len()).unwrap();
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn run(mut self, byte: u8, len: usize) -> Self {
        self.inst.push(0);
        varint::write_usize(&mut self.inst, len).unwrap();
        self.data.push(byte);
        self
    }

    /// COPY in VCD_SELF mode with an explicit size.
    pub fn copy(mut self, addr: u64, len: usize) -> Self {
        self.inst.push(19);
        varint::write_usize(&mut self.inst, len).unwrap();
        varint::write_u64(&mut self.addr, addr).unwrap();
        self
    }

    /// Run the given sections through the file's secondary compressor.
    pub fn compress(mut self, sections: DeltaIndicator) -> Self {
        self.compressed = sections;
        self
    }

    pub fn checksum(mut self, sum: Option<u32>) -> Self {
        self.checksum = sum;
        self
    }

    fn write(&self, out: &mut Vec<u8>, compressor: Option<Compressor>) {
        let section = |flag: DeltaIndicator, raw: &[u8]| match compressor {
            Some(f) if self.compressed.contains(flag) => f(raw),
            _ => raw.to_vec(),
        };
        let data = section(DeltaIndicator::DATACOMP, &self.data);
        let inst = section(DeltaIndicator::INSTCOMP, &self.inst);
        let addr = section(DeltaIndicator::ADDRCOMP, &self.addr);

        let mut indicator = self.indicator;
        if self.checksum.is_some() {
            indicator |= WindowIndicator::ADLER32;
        }
        let mut hdr = WindowHeader {
            indicator,
            copy_window_offset: self.copy.0,
            copy_window_len: self.copy.1,
            target_window_len: self.target.len() as u64,
            delta_indicator: self.compressed,
            data_len: data.len() as u64,
            inst_len: inst.len() as u64,
            addr_len: addr.len() as u64,
            adler32: self.checksum,
            ..Default::default()
        };
        hdr.enc_len = hdr.compute_enc_len();
        hdr.encode(out).unwrap();
        out.extend_from_slice(&data);
        out.extend_from_slice(&inst);
        out.extend_from_slice(&addr);
    }
}

/// Assembles a complete VCDIFF stream.
#[derive(Default)]
pub struct DeltaBuilder {
    header: FileHeader,
    compressor: Option<Compressor>,
    windows: Vec<Window>,
}

impl DeltaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secondary(mut self, id: u8, compressor: Compressor) -> Self {
        self.header.indicator |= HeaderIndicator::SECONDARY;
        self.header.secondary_id = Some(id);
        self.compressor = Some(compressor);
        self
    }

    pub fn app_header(mut self, bytes: &[u8]) -> Self {
        self.header.indicator |= HeaderIndicator::APPHEADER;
        self.header.app_header = Some(bytes.to_vec());
        self
    }

    pub fn window(mut self, window: Window) -> Self {
        self.windows.push(window);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header.encode(&mut out).unwrap();
        for w in &self.windows {
            w.write(&mut out, self.compressor);
        }
        out
    }
}

pub fn lzma(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    lzma_rs::lzma_compress(&mut std::io::Cursor::new(raw), &mut out).unwrap();
    out
}

pub fn zlib(raw: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(raw).unwrap();
    enc.finish().unwrap()
}
