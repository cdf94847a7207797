//! The record view the filtering engine works through.
//!
//! Filters never touch a concrete record type directly: they ask an [`AlignmentRecord`]
//! for the handful of fields a keep/drop decision needs. The trait is implemented for
//! noodles' [`RecordBuf`], which is what the SAM and BAM readers produce.

use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;

/// Read-only accessors used by filters to decide whether a record is kept.
///
/// Coordinates are 1-based and inclusive.
pub trait AlignmentRecord {
    /// The read name shared by every record of a template.
    fn read_name(&self) -> Option<&[u8]>;

    /// Index of the reference sequence in the header, if placed.
    fn reference_sequence_id(&self) -> Option<usize>;

    /// First reference base covered by the alignment.
    fn alignment_start(&self) -> Option<usize>;

    /// Last reference base covered by the alignment.
    fn alignment_end(&self) -> Option<usize>;

    fn is_unmapped(&self) -> bool;

    /// True if the template has more than one segment (a read pair).
    fn is_paired(&self) -> bool;

    fn is_secondary(&self) -> bool;

    fn is_supplementary(&self) -> bool;

    fn is_reverse_strand(&self) -> bool;

    fn mate_reference_sequence_id(&self) -> Option<usize>;

    fn mate_alignment_start(&self) -> Option<usize>;

    fn leading_soft_clips(&self) -> usize;

    fn trailing_soft_clips(&self) -> usize;

    /// The value of an optional field rendered as a string, or `None` if the tag is
    /// absent or holds an array.
    fn tag_value(&self, tag: [u8; 2]) -> Option<String>;

    /// True for the one primary line of each read.
    fn is_primary(&self) -> bool {
        !self.is_secondary() && !self.is_supplementary()
    }

    /// The mapped span of the record as `(reference id, start, end)`.
    ///
    /// Unmapped records have no span even when their position fields are populated,
    /// as is conventional for an unmapped read placed next to its mate.
    fn aligned_span(&self) -> Option<(usize, usize, usize)> {
        if self.is_unmapped() {
            return None;
        }
        Some((self.reference_sequence_id()?, self.alignment_start()?, self.alignment_end()?))
    }

    /// Read name for messages, lossily decoded.
    fn display_name(&self) -> String {
        self.read_name()
            .map_or_else(|| "*".to_string(), |n| String::from_utf8_lossy(n).into_owned())
    }
}

impl AlignmentRecord for RecordBuf {
    fn read_name(&self) -> Option<&[u8]> {
        self.name().map(|n| n.as_ref())
    }

    fn reference_sequence_id(&self) -> Option<usize> {
        RecordBuf::reference_sequence_id(self)
    }

    fn alignment_start(&self) -> Option<usize> {
        RecordBuf::alignment_start(self).map(usize::from)
    }

    fn alignment_end(&self) -> Option<usize> {
        RecordBuf::alignment_end(self).map(usize::from)
    }

    fn is_unmapped(&self) -> bool {
        self.flags().is_unmapped()
    }

    fn is_paired(&self) -> bool {
        self.flags().is_segmented()
    }

    fn is_secondary(&self) -> bool {
        self.flags().is_secondary()
    }

    fn is_supplementary(&self) -> bool {
        self.flags().is_supplementary()
    }

    fn is_reverse_strand(&self) -> bool {
        self.flags().is_reverse_complemented()
    }

    fn mate_reference_sequence_id(&self) -> Option<usize> {
        RecordBuf::mate_reference_sequence_id(self)
    }

    fn mate_alignment_start(&self) -> Option<usize> {
        RecordBuf::mate_alignment_start(self).map(usize::from)
    }

    fn leading_soft_clips(&self) -> usize {
        self.cigar()
            .as_ref()
            .iter()
            .skip_while(|op| op.kind() == Kind::HardClip)
            .take_while(|op| op.kind() == Kind::SoftClip)
            .map(|op| op.len())
            .sum()
    }

    fn trailing_soft_clips(&self) -> usize {
        self.cigar()
            .as_ref()
            .iter()
            .rev()
            .skip_while(|op| op.kind() == Kind::HardClip)
            .take_while(|op| op.kind() == Kind::SoftClip)
            .map(|op| op.len())
            .sum()
    }

    fn tag_value(&self, tag: [u8; 2]) -> Option<String> {
        let value = self.data().get(&Tag::from(tag))?;
        match value {
            Value::Character(c) => Some(char::from(*c).to_string()),
            Value::Int8(v) => Some(v.to_string()),
            Value::UInt8(v) => Some(v.to_string()),
            Value::Int16(v) => Some(v.to_string()),
            Value::UInt16(v) => Some(v.to_string()),
            Value::Int32(v) => Some(v.to_string()),
            Value::UInt32(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(s) | Value::Hex(s) => Some(s.to_string()),
            Value::Array(_) => None,
        }
    }
}
