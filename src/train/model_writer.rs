use std::io::{self, Cursor, Seek, SeekFrom, Write};

use cqdb::CQDBWriter;

use crate::dictionary::Dictionary;
use crate::model::{PosModel, CHUNK_SIZE, FEATURE_SIZE, HEADER_SIZE, MAGIC, VERSION};
use crate::ngram::NGramDictionary;
use crate::tag_dictionary::{FrozenTagDictionary, TagDictionary};

fn to_u32(value: usize, what: &str) -> io::Result<u32> {
    u32::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} does not fit into u32", what),
        )
    })
}

fn position(buf: &mut Cursor<Vec<u8>>) -> io::Result<u32> {
    to_u32(buf.stream_position()? as usize, "model size")
}

fn write_u32<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

fn write_str<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_u32(w, to_u32(s.len(), "string length")?)?;
    w.write_all(s.as_bytes())
}

/// Chunk offsets recorded in the file header
#[derive(Debug, Default)]
struct Offsets {
    features: u32,
    tags: u32,
    preds: u32,
    pred_refs: u32,
    manifest: u32,
}

/// Serializes a trained model
pub struct ModelWriter;

impl ModelWriter {
    /// Binary form of `model`
    pub fn to_bytes(model: &PosModel) -> io::Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());

        // Placeholder header, rewritten once the offsets are known
        buf.write_all(&[0u8; HEADER_SIZE])?;

        let mut offsets = Offsets {
            features: position(&mut buf)?,
            ..Offsets::default()
        };
        Self::write_features(&mut buf, model)?;

        offsets.tags = position(&mut buf)?;
        Self::write_cqdb(&mut buf, &model.tags)?;

        offsets.preds = position(&mut buf)?;
        Self::write_cqdb(&mut buf, &model.predicates)?;

        Self::align_to_u32(&mut buf)?;
        offsets.pred_refs = position(&mut buf)?;
        Self::write_pred_refs(&mut buf, model)?;

        offsets.manifest = position(&mut buf)?;
        Self::write_manifest(&mut buf, model)?;

        let size = position(&mut buf)?;
        buf.seek(SeekFrom::Start(0))?;
        Self::write_header(&mut buf, model, &offsets, size)?;

        Ok(buf.into_inner())
    }

    /// Align the position to a 4-byte boundary with zero padding.
    fn align_to_u32(buf: &mut Cursor<Vec<u8>>) -> io::Result<()> {
        let mut pos = buf.stream_position()?;
        while pos % 4 != 0 {
            buf.write_all(&[0])?;
            pos += 1;
        }
        Ok(())
    }

    fn write_header(
        buf: &mut Cursor<Vec<u8>>,
        model: &PosModel,
        offsets: &Offsets,
        size: u32,
    ) -> io::Result<()> {
        buf.write_all(MAGIC)?;
        write_u32(buf, size)?;
        write_u32(buf, VERSION)?;
        write_u32(buf, model.algorithm.to_u32())?;
        write_u32(buf, to_u32(model.features.len(), "number of features")?)?;
        write_u32(buf, model.pred_offsets.last().copied().unwrap_or(0))?;
        write_u32(buf, to_u32(model.tags.len(), "number of tags")?)?;
        write_u32(buf, to_u32(model.predicates.len(), "number of predicates")?)?;
        write_u32(buf, offsets.features)?;
        write_u32(buf, offsets.tags)?;
        write_u32(buf, offsets.preds)?;
        write_u32(buf, offsets.pred_refs)?;
        write_u32(buf, offsets.manifest)?;
        Ok(())
    }

    fn write_features(buf: &mut Cursor<Vec<u8>>, model: &PosModel) -> io::Result<()> {
        let count = model.features.len();
        buf.write_all(b"FEAT")?;
        write_u32(buf, to_u32(CHUNK_SIZE + count * FEATURE_SIZE, "feature chunk size")?)?;
        write_u32(buf, to_u32(count, "number of features")?)?;
        for feature in &model.features {
            write_u32(buf, feature.ftype as u32)?;
            write_u32(buf, feature.src)?;
            write_u32(buf, feature.dst)?;
            buf.write_all(&feature.weight.to_le_bytes())?;
        }
        Ok(())
    }

    /// Write CQDB dictionary
    fn write_cqdb(buf: &mut Cursor<Vec<u8>>, dict: &Dictionary) -> io::Result<()> {
        // The database is flushed when the writer drops
        let mut writer = CQDBWriter::new(buf)?;
        for (s, id) in dict.iter() {
            writer.put(s, id)?;
        }
        Ok(())
    }

    fn write_pred_refs(buf: &mut Cursor<Vec<u8>>, model: &PosModel) -> io::Result<()> {
        let count = model.pred_offsets.len();
        buf.write_all(b"PRNG")?;
        write_u32(buf, to_u32(CHUNK_SIZE + 4 * count, "reference chunk size")?)?;
        write_u32(buf, to_u32(count, "number of predicate references")?)?;
        for &offset in &model.pred_offsets {
            write_u32(buf, offset)?;
        }
        Ok(())
    }

    /// Language, training parameters and the embedded dictionaries
    fn write_manifest(buf: &mut Cursor<Vec<u8>>, model: &PosModel) -> io::Result<()> {
        let mut body = Vec::new();
        write_str(&mut body, &model.language)?;

        let settings = model.manifest.settings();
        write_u32(&mut body, to_u32(settings.len(), "number of settings")?)?;
        for (key, value) in settings {
            write_str(&mut body, key)?;
            write_str(&mut body, value)?;
        }

        match &model.ngram_dictionary {
            Some(dict) => {
                write_u32(&mut body, 1)?;
                Self::write_ngrams(&mut body, dict)?;
            }
            None => write_u32(&mut body, 0)?,
        }
        match &model.tag_dictionary {
            Some(dict) => {
                write_u32(&mut body, 1)?;
                Self::write_tag_dictionary(&mut body, dict)?;
            }
            None => write_u32(&mut body, 0)?,
        }

        buf.write_all(b"MNFT")?;
        write_u32(buf, to_u32(CHUNK_SIZE + body.len(), "manifest size")?)?;
        // sections: language, settings, n-grams, tag dictionary
        write_u32(buf, 4)?;
        buf.write_all(&body)
    }

    fn write_ngrams(body: &mut Vec<u8>, dict: &NGramDictionary) -> io::Result<()> {
        write_u32(body, to_u32(dict.len(), "number of n-grams")?)?;
        for tokens in dict.iter() {
            write_u32(body, to_u32(tokens.len(), "n-gram length")?)?;
            for token in tokens {
                write_str(body, token)?;
            }
        }
        Ok(())
    }

    fn write_tag_dictionary(body: &mut Vec<u8>, dict: &FrozenTagDictionary) -> io::Result<()> {
        write_u32(body, u32::from(dict.is_case_sensitive()))?;
        let entries = dict.entries();
        write_u32(body, to_u32(entries.len(), "number of dictionary entries")?)?;
        for (word, tags) in entries {
            write_str(body, word)?;
            write_u32(body, to_u32(tags.len(), "number of tags")?)?;
            for tag in tags {
                write_str(body, tag)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unpack_u32;
    use crate::params::{Algorithm, TrainingParameters};

    fn empty_model() -> PosModel {
        let mut tags = Dictionary::new();
        tags.get_or_insert("NN");
        PosModel {
            language: "x-unk".to_string(),
            algorithm: Algorithm::Maxent,
            manifest: TrainingParameters::new(),
            tags,
            predicates: Dictionary::new(),
            features: Vec::new(),
            pred_offsets: vec![0],
            ngram_dictionary: None,
            tag_dictionary: None,
        }
    }

    #[test]
    fn test_header_layout() {
        let buf = ModelWriter::to_bytes(&empty_model()).unwrap();
        assert_eq!(&buf[..4], b"lPOS");
        assert_eq!(unpack_u32(&buf[8..]).unwrap(), VERSION);
        let off_features = unpack_u32(&buf[32..]).unwrap() as usize;
        assert_eq!(off_features, HEADER_SIZE);
        assert_eq!(&buf[off_features..off_features + 4], b"FEAT");
        let off_pred_refs = unpack_u32(&buf[44..]).unwrap() as usize;
        assert_eq!(off_pred_refs % 4, 0);
        assert_eq!(&buf[off_pred_refs..off_pred_refs + 4], b"PRNG");
    }

    #[test]
    fn test_model_without_predicates_reads_back() {
        let model = empty_model();
        let buf = ModelWriter::to_bytes(&model).unwrap();
        assert_eq!(PosModel::from_bytes(&buf).unwrap(), model);
    }
}
