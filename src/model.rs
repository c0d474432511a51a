use std::io::{self, Write};

use bstr::ByteSlice;
use cqdb::CQDB;

use crate::dictionary::Dictionary;
use crate::feature::{Feature, FeatureType};
use crate::ngram::NGramDictionary;
use crate::params::{Algorithm, TrainingParameters};
use crate::tag_dictionary::FrozenTagDictionary;
use crate::tagger::Tagger;
use crate::train::model_writer::ModelWriter;

pub(crate) const MAGIC: &[u8; 4] = b"lPOS";
pub(crate) const VERSION: u32 = 1;
pub(crate) const HEADER_SIZE: usize = 52;
pub(crate) const CHUNK_SIZE: usize = 12;
pub(crate) const FEATURE_SIZE: usize = 20;

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

#[inline]
pub(crate) fn unpack_u32(buf: &[u8]) -> io::Result<u32> {
    if buf.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "not enough data for unpacking u32",
        ));
    }
    Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

#[inline]
fn unpack_f64(buf: &[u8]) -> io::Result<f64> {
    if buf.len() < 8 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "not enough data for unpacking f64",
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[..8]);
    Ok(f64::from_le_bytes(bytes))
}

/// Sequential little-endian reader over a model buffer
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn at(buf: &'a [u8], pos: usize) -> io::Result<Self> {
        if pos > buf.len() {
            return Err(invalid("chunk offset out of range"));
        }
        Ok(Self { buf, pos })
    }

    fn bytes(&mut self, len: usize) -> io::Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| invalid("truncated model"))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u32(&mut self) -> io::Result<u32> {
        unpack_u32(self.bytes(4)?)
    }

    fn f64(&mut self) -> io::Result<f64> {
        unpack_f64(self.bytes(8)?)
    }

    fn str(&mut self) -> io::Result<&'a str> {
        let len = self.u32()? as usize;
        self.bytes(len)?
            .to_str()
            .map_err(|_| invalid("string is not valid UTF-8"))
    }

    /// Check a chunk header, returning its item count
    fn chunk(&mut self, magic: &[u8; 4]) -> io::Result<u32> {
        if self.bytes(4)? != magic {
            return Err(invalid("chunk magic mismatch"));
        }
        let _size = self.u32()?;
        self.u32()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub size: u32,
    pub version: u32,
    pub algorithm: u32,
    pub num_features: u32,
    pub num_state_features: u32,
    pub num_tags: u32,
    pub num_preds: u32,
    pub off_features: u32,
    pub off_tags: u32,
    pub off_preds: u32,
    pub off_pred_refs: u32,
    pub off_manifest: u32,
}

impl Header {
    fn read(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(invalid("invalid model format"));
        }
        let mut r = Reader::at(buf, 0)?;
        if r.bytes(4)? != MAGIC {
            return Err(invalid("invalid file format, magic mismatch"));
        }
        Ok(Self {
            size: r.u32()?,
            version: r.u32()?,
            algorithm: r.u32()?,
            num_features: r.u32()?,
            num_state_features: r.u32()?,
            num_tags: r.u32()?,
            num_preds: r.u32()?,
            off_features: r.u32()?,
            off_tags: r.u32()?,
            off_preds: r.u32()?,
            off_pred_refs: r.u32()?,
            off_manifest: r.u32()?,
        })
    }
}

/// A trained part-of-speech model
///
/// State features are grouped by predicate: the features of predicate `p`
/// are `features[pred_offsets[p]..pred_offsets[p + 1]]`. Transition features
/// follow the last group.
#[derive(Debug, Clone, PartialEq)]
pub struct PosModel {
    pub(crate) language: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) manifest: TrainingParameters,
    pub(crate) tags: Dictionary,
    pub(crate) predicates: Dictionary,
    pub(crate) features: Vec<Feature>,
    pub(crate) pred_offsets: Vec<u32>,
    pub(crate) ngram_dictionary: Option<NGramDictionary>,
    pub(crate) tag_dictionary: Option<FrozenTagDictionary>,
}

impl PosModel {
    /// Read a model from its binary form
    pub fn from_bytes(buf: &[u8]) -> io::Result<Self> {
        let header = Header::read(buf)?;
        if header.version != VERSION {
            return Err(invalid("unsupported model version"));
        }
        if header.size as usize != buf.len() {
            return Err(invalid("model size mismatch"));
        }
        let algorithm =
            Algorithm::from_u32(header.algorithm).ok_or_else(|| invalid("unknown algorithm"))?;

        let features = read_features(buf, &header)?;
        let tags = read_cqdb(buf, header.off_tags, header.num_tags)?;
        let predicates = read_cqdb(buf, header.off_preds, header.num_preds)?;

        let mut r = Reader::at(buf, header.off_pred_refs as usize)?;
        let count = r.chunk(b"PRNG")?;
        if count != header.num_preds + 1 {
            return Err(invalid("predicate reference count mismatch"));
        }
        let pred_offsets = (0..count).map(|_| r.u32()).collect::<io::Result<Vec<_>>>()?;
        let ordered = pred_offsets.windows(2).all(|w| w[0] <= w[1]);
        if !ordered || pred_offsets.last() != Some(&header.num_state_features) {
            return Err(invalid("corrupted predicate references"));
        }

        let mut r = Reader::at(buf, header.off_manifest as usize)?;
        r.chunk(b"MNFT")?;
        let language = r.str()?.to_string();
        let mut manifest = TrainingParameters::new();
        for _ in 0..r.u32()? {
            let key = r.str()?;
            let value = r.str()?;
            manifest.put(key, value);
        }
        let ngram_dictionary = if r.u32()? != 0 {
            let mut dict = NGramDictionary::new();
            for _ in 0..r.u32()? {
                let len = r.u32()?;
                let tokens = (0..len).map(|_| r.str()).collect::<io::Result<Vec<_>>>()?;
                dict.insert(&tokens);
            }
            Some(dict)
        } else {
            None
        };
        let tag_dictionary = if r.u32()? != 0 {
            let case_sensitive = r.u32()? != 0;
            let mut entries = Vec::new();
            for _ in 0..r.u32()? {
                let word = r.str()?.to_string();
                let len = r.u32()?;
                let tags = (0..len)
                    .map(|_| r.str().map(str::to_string))
                    .collect::<io::Result<Vec<_>>>()?;
                entries.push((word, tags));
            }
            Some(FrozenTagDictionary::from_entries(entries, case_sensitive))
        } else {
            None
        };

        let model = Self {
            language,
            algorithm,
            manifest,
            tags,
            predicates,
            features,
            pred_offsets,
            ngram_dictionary,
            tag_dictionary,
        };
        model.check_references()?;
        Ok(model)
    }

    /// Binary form of the model
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        ModelWriter::to_bytes(self)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.to_bytes()?)
    }

    fn check_references(&self) -> io::Result<()> {
        let num_tags = self.tags.len() as u32;
        let num_preds = self.predicates.len() as u32;
        let num_state = self.num_state_features();
        for (fid, feature) in self.features.iter().enumerate() {
            let expected = if fid < num_state {
                FeatureType::State
            } else {
                FeatureType::Transition
            };
            let src_limit = match feature.ftype {
                FeatureType::State => num_preds,
                FeatureType::Transition => num_tags,
            };
            if feature.ftype != expected || feature.src >= src_limit || feature.dst >= num_tags {
                return Err(invalid("feature references out of range"));
            }
        }
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Training parameters the model was built with
    pub fn manifest(&self) -> &TrainingParameters {
        &self.manifest
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn num_predicates(&self) -> usize {
        self.predicates.len()
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    fn num_state_features(&self) -> usize {
        self.pred_offsets.last().copied().unwrap_or(0) as usize
    }

    /// Convert a tag ID to its name
    pub fn tag(&self, id: u32) -> Option<&str> {
        self.tags.get_name(id)
    }

    pub fn tag_id(&self, tag: &str) -> Option<u32> {
        self.tags.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(|(tag, _)| tag)
    }

    pub fn predicate_id(&self, pred: &str) -> Option<u32> {
        self.predicates.get(pred)
    }

    /// State features of predicate `pid`
    pub fn state_features(&self, pid: u32) -> &[Feature] {
        let pid = pid as usize;
        match (self.pred_offsets.get(pid), self.pred_offsets.get(pid + 1)) {
            (Some(&start), Some(&end)) => &self.features[start as usize..end as usize],
            _ => &[],
        }
    }

    pub fn transition_features(&self) -> &[Feature] {
        &self.features[self.num_state_features()..]
    }

    /// `[L][L]` transition score matrix
    pub fn transition_matrix(&self) -> Vec<f64> {
        let l = self.tags.len();
        let mut trans = vec![0.0; l * l];
        for feature in self.transition_features() {
            trans[feature.src as usize * l + feature.dst as usize] = feature.weight;
        }
        trans
    }

    pub fn ngram_dictionary(&self) -> Option<&NGramDictionary> {
        self.ngram_dictionary.as_ref()
    }

    pub fn tag_dictionary(&self) -> Option<&FrozenTagDictionary> {
        self.tag_dictionary.as_ref()
    }

    /// Get a new tagger
    pub fn tagger(&self) -> Tagger<'_> {
        Tagger::new(self)
    }

    /// Print the model in human-readable format
    pub fn dump<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "MODEL = {{")?;
        writeln!(w, "  language: {}", self.language)?;
        writeln!(w, "  algorithm: {}", self.algorithm)?;
        writeln!(w, "  num_features: {}", self.num_features())?;
        writeln!(w, "  num_tags: {}", self.num_tags())?;
        writeln!(w, "  num_predicates: {}", self.num_predicates())?;
        writeln!(w, "}}\n")?;
        writeln!(w, "MANIFEST = {{")?;
        for (key, value) in self.manifest.settings() {
            writeln!(w, "  {}={}", key, value)?;
        }
        writeln!(w, "}}\n")?;
        writeln!(w, "TAGS = {{")?;
        for (tag, id) in self.tags.iter() {
            writeln!(w, "  {:>5}: {}", id, tag)?;
        }
        writeln!(w, "}}\n")?;
        writeln!(w, "TRANSITIONS = {{")?;
        for feature in self.transition_features() {
            let src = self.tag(feature.src).unwrap_or("?");
            let dst = self.tag(feature.dst).unwrap_or("?");
            writeln!(w, "  {} --> {}: {:.6}", src, dst, feature.weight)?;
        }
        writeln!(w, "}}\n")?;
        writeln!(w, "STATE_FEATURES = {{")?;
        for (pred, pid) in self.predicates.iter() {
            for feature in self.state_features(pid) {
                let dst = self.tag(feature.dst).unwrap_or("?");
                writeln!(w, "  {} --> {}: {:.6}", pred, dst, feature.weight)?;
            }
        }
        writeln!(w, "}}\n")?;
        Ok(())
    }
}

fn read_features(buf: &[u8], header: &Header) -> io::Result<Vec<Feature>> {
    let mut r = Reader::at(buf, header.off_features as usize)?;
    let count = r.chunk(b"FEAT")?;
    if count != header.num_features || header.num_state_features > count {
        return Err(invalid("feature count mismatch"));
    }
    // Guard the allocation against a corrupted count
    if (count as usize).saturating_mul(FEATURE_SIZE) > buf.len() {
        return Err(invalid("truncated model"));
    }
    let mut features = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let ftype = FeatureType::from_u32(r.u32()?).ok_or_else(|| invalid("unknown feature type"))?;
        features.push(Feature {
            ftype,
            src: r.u32()?,
            dst: r.u32()?,
            weight: r.f64()?,
        });
    }
    Ok(features)
}

fn read_cqdb(buf: &[u8], offset: u32, count: u32) -> io::Result<Dictionary> {
    let offset = offset as usize;
    if offset > buf.len() {
        return Err(invalid("chunk offset out of range"));
    }
    let db = CQDB::new(&buf[offset..])?;
    let mut dict = Dictionary::new();
    for id in 0..count {
        let name = db
            .to_str(id)
            .and_then(|s| s.to_str().ok())
            .ok_or_else(|| invalid("missing dictionary entry"))?;
        if dict.get_or_insert(name) != id {
            return Err(invalid("duplicate dictionary entry"));
        }
    }
    Ok(dict)
}
