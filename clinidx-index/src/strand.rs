//! Strand normalization of allele strings.

use clinidx_core::Strand;

fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        other => other,
    }
}

/// Reverse complement of a nucleotide string. Non-ACGT characters are kept as is.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement).collect()
}

///
/// Orient an allele on the positive strand: unchanged for `+`, reverse
/// complemented for `-`.
///
pub fn normalize_strand(allele: &str, strand: Strand) -> String {
    match strand {
        Strand::Positive => allele.to_string(),
        Strand::Negative => reverse_complement(allele),
    }
}
