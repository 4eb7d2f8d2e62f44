//! Streaming reader for the ClinVar full-release XML.
//!
//! The release is a single `ReleaseSet` holding hundreds of thousands of
//! `ClinVarSet` elements. Only the pieces of each set's
//! `ReferenceClinVarAssertion` needed for indexing are kept; submitter
//! assertions are skipped.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use clinidx_core::utils::get_dynamic_reader;

const REFERENCE_ASSERTION: &str = "ReferenceClinVarAssertion";
const CLINVAR_SET: &str = "ClinVarSet";
const MODE_OF_INHERITANCE: &str = "ModeOfInheritance";

/// One `ObservedIn` block: where the variant was seen and what cites it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub origin: Option<String>,
    /// PubMed ids, without prefix.
    pub pubmed_ids: Vec<String>,
}

impl Observation {
    pub fn is_somatic(&self) -> bool {
        self.origin
            .as_deref()
            .is_some_and(|o| o.trim().eq_ignore_ascii_case("somatic"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClinVarTrait {
    pub preferred_name: Option<String>,
    /// First non-preferred name, in document order.
    pub fallback_name: Option<String>,
    pub inheritance: Vec<String>,
}

impl ClinVarTrait {
    /// Preferred name, else the first other name listed.
    pub fn name(&self) -> Option<&str> {
        self.preferred_name
            .as_deref()
            .or(self.fallback_name.as_deref())
    }
}

/// Raw `Measure/SequenceLocation` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlLocation {
    pub assembly: Option<String>,
    pub chromosome: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub reference: Option<String>,
    pub alternate: Option<String>,
}

/// Indexing-relevant content of one `ReferenceClinVarAssertion`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClinVarRecord {
    pub accession: Option<String>,
    pub clinical_significance: Option<String>,
    pub review_status: Option<String>,
    pub observations: Vec<Observation>,
    pub traits: Vec<ClinVarTrait>,
    /// Mode-of-inheritance attributes attached to the assertion itself.
    pub inheritance: Vec<String>,
    pub gene_symbols: Vec<String>,
    pub locations: Vec<XmlLocation>,
}

/// Element whose text content is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    ClinicalSignificance,
    ReviewStatus,
    Origin,
    PubMedId,
    TraitName,
    TraitAltName,
    AssertionInheritance,
    TraitInheritance,
    GeneSymbol,
}

fn attribute(element: &BytesStart, key: &str) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.context("Malformed XML attribute")?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .context("Malformed XML attribute value")?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn attribute_is(element: &BytesStart, key: &str, expected: &str) -> Result<bool> {
    Ok(attribute(element, key)?.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected)))
}

pub struct ClinVarReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    path: Vec<String>,
    record: Option<ClinVarRecord>,
    capture: Option<Capture>,
    text: String,
}

impl ClinVarReader<BufReader<Box<dyn Read>>> {
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(ClinVarReader::new(get_dynamic_reader(path)?))
    }
}

impl<R: BufRead> ClinVarReader<R> {
    pub fn new(reader: R) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);
        ClinVarReader {
            reader,
            buf: Vec::new(),
            path: Vec::new(),
            record: None,
            capture: None,
            text: String::new(),
        }
    }

    fn ends_with(&self, suffix: &[&str]) -> bool {
        self.path.len() >= suffix.len()
            && self.path[self.path.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| a == b)
    }

    fn in_reference_assertion(&self) -> bool {
        self.path.iter().any(|p| p == REFERENCE_ASSERTION)
    }

    fn start_capture(&mut self, capture: Capture) {
        self.capture = Some(capture);
        self.text.clear();
    }

    fn with_record(&mut self, update: impl FnOnce(&mut ClinVarRecord)) {
        if let Some(record) = self.record.as_mut() {
            update(record);
        }
    }

    /// Handle an opening (or self-closing) tag. The element is already on the path.
    fn open(&mut self, element: &BytesStart) -> Result<()> {
        if self.ends_with(&[CLINVAR_SET]) {
            self.record = Some(ClinVarRecord::default());
            return Ok(());
        }
        if self.record.is_none() || !self.in_reference_assertion() {
            return Ok(());
        }

        if self.ends_with(&[REFERENCE_ASSERTION, "ClinVarAccession"]) {
            let accession = attribute(element, "Acc")?;
            self.with_record(|r| r.accession = accession);
        } else if self.ends_with(&[REFERENCE_ASSERTION, "ClinicalSignificance", "Description"]) {
            self.start_capture(Capture::ClinicalSignificance);
        } else if self.ends_with(&[REFERENCE_ASSERTION, "ClinicalSignificance", "ReviewStatus"]) {
            self.start_capture(Capture::ReviewStatus);
        } else if self.ends_with(&[REFERENCE_ASSERTION, "ObservedIn"]) {
            self.with_record(|r| r.observations.push(Observation::default()));
        } else if self.ends_with(&["ObservedIn", "Sample", "Origin"]) {
            self.start_capture(Capture::Origin);
        } else if self.ends_with(&["ObservedIn", "ObservedData", "Citation", "ID"]) {
            if attribute_is(element, "Source", "PubMed")? {
                self.start_capture(Capture::PubMedId);
            }
        } else if self.ends_with(&[REFERENCE_ASSERTION, "TraitSet", "Trait"]) {
            self.with_record(|r| r.traits.push(ClinVarTrait::default()));
        } else if self.ends_with(&["TraitSet", "Trait", "Name", "ElementValue"]) {
            if attribute_is(element, "Type", "Preferred")? {
                self.start_capture(Capture::TraitName);
            } else {
                self.start_capture(Capture::TraitAltName);
            }
        } else if self.ends_with(&[REFERENCE_ASSERTION, "AttributeSet", "Attribute"]) {
            if attribute_is(element, "Type", MODE_OF_INHERITANCE)? {
                self.start_capture(Capture::AssertionInheritance);
            }
        } else if self.ends_with(&["TraitSet", "Trait", "AttributeSet", "Attribute"]) {
            if attribute_is(element, "Type", MODE_OF_INHERITANCE)? {
                self.start_capture(Capture::TraitInheritance);
            }
        } else if self.ends_with(&["MeasureRelationship", "Symbol", "ElementValue"]) {
            self.start_capture(Capture::GeneSymbol);
        } else if self.ends_with(&["MeasureSet", "Measure", "SequenceLocation"]) {
            let location = XmlLocation {
                assembly: attribute(element, "Assembly")?,
                chromosome: attribute(element, "Chr")?,
                start: attribute(element, "start")?,
                stop: attribute(element, "stop")?,
                reference: attribute(element, "referenceAllele")?,
                alternate: attribute(element, "alternateAllele")?,
            };
            self.with_record(|r| r.locations.push(location));
        }
        Ok(())
    }

    /// Store collected text when the captured element closes.
    fn close(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        let Some(record) = self.record.as_mut() else {
            return;
        };
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return;
        }

        match capture {
            Capture::ClinicalSignificance => record.clinical_significance = Some(text),
            Capture::ReviewStatus => record.review_status = Some(text),
            Capture::Origin => {
                if let Some(observation) = record.observations.last_mut() {
                    observation.origin = Some(text);
                }
            }
            Capture::PubMedId => {
                if let Some(observation) = record.observations.last_mut() {
                    observation.pubmed_ids.push(text);
                }
            }
            Capture::TraitName => {
                if let Some(t) = record.traits.last_mut() {
                    t.preferred_name.get_or_insert(text);
                }
            }
            Capture::TraitAltName => {
                if let Some(t) = record.traits.last_mut() {
                    t.fallback_name.get_or_insert(text);
                }
            }
            Capture::AssertionInheritance => record.inheritance.push(text),
            Capture::TraitInheritance => {
                if let Some(t) = record.traits.last_mut() {
                    t.inheritance.push(text);
                }
            }
            Capture::GeneSymbol => record.gene_symbols.push(text),
        }
    }

    /// Next `ClinVarSet`, or `None` once the release is exhausted.
    pub fn next_record(&mut self) -> Result<Option<ClinVarRecord>> {
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| {
                    format!("Malformed ClinVar XML at byte {}", self.reader.buffer_position())
                })?
                .into_owned();

            match event {
                Event::Start(e) => {
                    self.path
                        .push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    self.open(&e)?;
                }
                Event::Empty(e) => {
                    self.path
                        .push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    self.open(&e)?;
                    self.close();
                    self.path.pop();
                }
                Event::Text(t) => {
                    if self.capture.is_some() {
                        let text = t.unescape().context("Malformed XML text")?;
                        self.text.push_str(&text);
                    }
                }
                Event::CData(t) => {
                    if self.capture.is_some() {
                        self.text.push_str(&String::from_utf8_lossy(&t));
                    }
                }
                Event::End(_) => {
                    self.close();
                    let closed = self.path.pop();
                    if closed.as_deref() == Some(CLINVAR_SET) {
                        if let Some(record) = self.record.take() {
                            return Ok(Some(record));
                        }
                    }
                }
                Event::Eof => {
                    if self.record.is_some() {
                        bail!("ClinVar XML ended inside a ClinVarSet");
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    const RELEASE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ReleaseSet Dated="2017-01-05" Type="full">
  <ClinVarSet ID="1">
    <ReferenceClinVarAssertion ID="57">
      <ClinVarAccession Acc="RCV000000012" Version="5" Type="RCV"/>
      <ClinicalSignificance>
        <ReviewStatus>no assertion criteria provided</ReviewStatus>
        <Description>Pathogenic</Description>
      </ClinicalSignificance>
      <AttributeSet><Attribute Type="ModeOfInheritance">Autosomal recessive inheritance</Attribute></AttributeSet>
      <ObservedIn>
        <Sample><Origin>germline</Origin><Species>human</Species></Sample>
        <ObservedData>
          <Citation Type="general"><ID Source="PubMed">20301571</ID></Citation>
        </ObservedData>
      </ObservedIn>
      <ObservedIn>
        <Sample><Origin>Somatic</Origin></Sample>
        <ObservedData>
          <Citation><ID Source="pubmed">111</ID><ID Source="PubMedCentral">PMC1</ID></Citation>
        </ObservedData>
      </ObservedIn>
      <MeasureSet Type="Variant">
        <Measure Type="single nucleotide variant">
          <SequenceLocation Assembly="GRCh38" Chr="7" start="140753336" stop="140753336" referenceAllele="A" alternateAllele="T"/>
          <SequenceLocation Assembly="GRCh37" Chr="7" start="140453136" stop="140453136" referenceAllele="A" alternateAllele="T"/>
          <MeasureRelationship Type="variant in gene">
            <Symbol><ElementValue Type="Preferred">BRAF</ElementValue></Symbol>
            <SequenceLocation Assembly="GRCh37" Chr="7" start="140419127" stop="140624564"/>
          </MeasureRelationship>
        </Measure>
      </MeasureSet>
      <TraitSet Type="Disease">
        <Trait Type="Disease">
          <Name><ElementValue Type="Alternate">CFC</ElementValue></Name>
          <Name><ElementValue Type="Preferred">Cardiofaciocutaneous syndrome</ElementValue></Name>
          <AttributeSet><Attribute Type="modeofinheritance">Autosomal dominant inheritance</Attribute></AttributeSet>
        </Trait>
      </TraitSet>
    </ReferenceClinVarAssertion>
    <ClinVarAssertion ID="20155">
      <ClinVarAccession Acc="SCV000020155" Type="SCV"/>
      <MeasureSet Type="Variant">
        <Measure Type="single nucleotide variant">
          <SequenceLocation Assembly="GRCh37" Chr="1" start="1" stop="1" referenceAllele="C" alternateAllele="G"/>
        </Measure>
      </MeasureSet>
    </ClinVarAssertion>
  </ClinVarSet>
  <ClinVarSet ID="2">
    <ReferenceClinVarAssertion ID="58">
      <ClinVarAccession Acc="RCV000000013" Type="RCV"/>
      <ClinicalSignificance><Description>Benign &amp; other</Description></ClinicalSignificance>
    </ReferenceClinVarAssertion>
  </ClinVarSet>
</ReleaseSet>
"#;

    #[rstest]
    fn test_reads_reference_assertion() {
        let mut reader = ClinVarReader::new(Cursor::new(RELEASE));
        let record = reader.next_record().unwrap().unwrap();

        assert_eq!(record.accession.as_deref(), Some("RCV000000012"));
        assert_eq!(record.clinical_significance.as_deref(), Some("Pathogenic"));
        assert_eq!(record.review_status.as_deref(), Some("no assertion criteria provided"));
        assert_eq!(record.inheritance, vec!["Autosomal recessive inheritance".to_string()]);
        assert_eq!(record.gene_symbols, vec!["BRAF".to_string()]);

        assert_eq!(record.observations.len(), 2);
        assert!(!record.observations[0].is_somatic());
        assert_eq!(record.observations[0].pubmed_ids, vec!["20301571".to_string()]);
        assert!(record.observations[1].is_somatic());
        assert_eq!(record.observations[1].pubmed_ids, vec!["111".to_string()]);

        assert_eq!(record.traits.len(), 1);
        assert_eq!(
            record.traits[0].preferred_name.as_deref(),
            Some("Cardiofaciocutaneous syndrome")
        );
        assert_eq!(record.traits[0].fallback_name.as_deref(), Some("CFC"));
        assert_eq!(record.traits[0].name(), Some("Cardiofaciocutaneous syndrome"));
        assert_eq!(
            record.traits[0].inheritance,
            vec!["Autosomal dominant inheritance".to_string()]
        );

        // gene-level and submitter locations are not variant locations
        assert_eq!(record.locations.len(), 2);
        assert_eq!(record.locations[1].assembly.as_deref(), Some("GRCh37"));
        assert_eq!(record.locations[1].start.as_deref(), Some("140453136"));
        assert_eq!(record.locations[1].reference.as_deref(), Some("A"));
    }

    #[rstest]
    fn test_reads_every_set_then_stops() {
        let mut reader = ClinVarReader::new(Cursor::new(RELEASE));
        reader.next_record().unwrap().unwrap();
        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.accession.as_deref(), Some("RCV000000013"));
        assert_eq!(second.clinical_significance.as_deref(), Some("Benign & other"));
        assert!(second.locations.is_empty());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[rstest]
    fn test_truncated_release_is_an_error() {
        let truncated = "<ReleaseSet><ClinVarSet><ReferenceClinVarAssertion>";
        let mut reader = ClinVarReader::new(Cursor::new(truncated));
        assert!(reader.next_record().is_err());
    }
}
