//! GPIF decoding: unzip the container, build an indexed DOM, and walk the
//! MasterBar × Track structure into the [`crate::ir`] model.

pub mod container;
pub mod errors;
pub mod note;
pub mod parser;
pub mod rhythm;
pub mod xml;

pub use errors::{DecodeContext, DecodeError, DecodeWarning};

use crate::ir::Song;
use xml::Dom;

/// Decode a `.gp`/`.gpx` container's bytes into a [`Song`], plus any
/// non-fatal warnings recovered along the way.
///
/// Fails only on structural problems: not a ZIP, no `score.gpif` entry, or
/// malformed XML. Missing references and unparsable field values are
/// recovered in place and reported through the returned warning list
/// instead of aborting the decode.
pub fn parse(bytes: &[u8]) -> Result<(Song, Vec<DecodeWarning>), DecodeError> {
    let xml = container::load_score_document(bytes)?;
    let dom = Dom::parse(&xml)?;

    let mut ctx = DecodeContext::new();
    let song = parser::decode_song(&dom, &mut ctx);

    Ok((song, ctx.warnings()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zipped_gpif(xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            writer.start_file("score.gpif", FileOptions::default()).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn parses_a_zipped_container_end_to_end() {
        let xml = r#"<GPIF>
            <Title>Container Song</Title>
            <MasterTrack><Tracks>0</Tracks></MasterTrack>
            <Tracks><Track id="0"><Name>Lead</Name></Track></Tracks>
            <MasterBars><MasterBar><Time>4/4</Time></MasterBar></MasterBars>
        </GPIF>"#;
        let bytes = zipped_gpif(xml);
        let (song, warnings) = parse(&bytes).unwrap();
        assert_eq!(song.title, "Container Song");
        assert_eq!(song.tracks.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn non_zip_input_is_a_decode_error() {
        let err = parse(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DecodeError::Zip(_)));
    }
}
