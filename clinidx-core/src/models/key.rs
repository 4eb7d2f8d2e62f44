use std::fmt::{self, Display};

use crate::consts::VARIANT_KEY_SEPARATOR;
use crate::errors::ClinidxError;
use crate::models::location::SequenceLocation;

///
/// Store key for a normalized variant: `chromosome:start:reference:alternate`
/// as UTF-8 bytes. The end coordinate and strand are not part of the identity.
///
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantKey(Vec<u8>);

/// Decoded parts of a [`VariantKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantKeyParts {
    pub chromosome: String,
    pub start: i64,
    pub reference: String,
    pub alternate: String,
}

impl VariantKey {
    pub fn new(chromosome: &str, start: i64, reference: &str, alternate: &str) -> Self {
        let encoded = format!(
            "{chromosome}{sep}{start}{sep}{reference}{sep}{alternate}",
            sep = VARIANT_KEY_SEPARATOR
        );
        VariantKey(encoded.into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    ///
    /// Split the key back into its four components.
    ///
    pub fn parts(&self) -> Result<VariantKeyParts, ClinidxError> {
        let text = std::str::from_utf8(&self.0)
            .map_err(|_| ClinidxError::InvalidVariantKey(format!("{:?}", self.0)))?;
        let fields: Vec<&str> = text.split(VARIANT_KEY_SEPARATOR).collect();
        if fields.len() != 4 || fields[0].is_empty() {
            return Err(ClinidxError::InvalidVariantKey(text.to_string()));
        }
        let start = fields[1]
            .parse::<i64>()
            .map_err(|_| ClinidxError::InvalidVariantKey(text.to_string()))?;

        Ok(VariantKeyParts {
            chromosome: fields[0].to_string(),
            start,
            reference: fields[2].to_string(),
            alternate: fields[3].to_string(),
        })
    }
}

impl From<&SequenceLocation> for VariantKey {
    fn from(location: &SequenceLocation) -> Self {
        VariantKey::new(
            &location.chromosome,
            location.start,
            &location.reference,
            &location.alternate,
        )
    }
}

impl From<Vec<u8>> for VariantKey {
    fn from(bytes: Vec<u8>) -> Self {
        VariantKey(bytes)
    }
}

impl TryFrom<&str> for VariantKey {
    type Error = ClinidxError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let key = VariantKey(value.as_bytes().to_vec());
        key.parts()?;
        Ok(key)
    }
}

impl Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::Strand;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_key_encoding() {
        let key = VariantKey::new("7", 140453136, "A", "T");
        assert_eq!(key.as_bytes(), b"7:140453136:A:T");
    }

    #[rstest]
    fn test_key_ignores_end_and_strand() {
        let mut a = SequenceLocation::new("X", 100, 101, "AC", "");
        let mut b = a.clone();
        a.strand = Strand::Negative;
        b.end = 200;
        assert_eq!(VariantKey::from(&a), VariantKey::from(&b));
    }

    #[rstest]
    fn test_parts_with_empty_allele() {
        let key = VariantKey::new("MT", 73, "", "G");
        let parts = key.parts().unwrap();
        assert_eq!(parts.chromosome, "MT");
        assert_eq!(parts.start, 73);
        assert_eq!(parts.reference, "");
        assert_eq!(parts.alternate, "G");
    }

    #[rstest]
    #[case("1:abc:A:T")]
    #[case("1:10:A")]
    #[case(":10:A:T")]
    fn test_try_from_rejects_malformed(#[case] text: &str) {
        assert!(VariantKey::try_from(text).is_err());
    }
}
